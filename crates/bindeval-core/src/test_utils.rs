//! Test utilities for bindeval-core.
//!
//! Deterministic synthetic datasets shared by unit tests. Only compiled when
//! running tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Truths spread over a typical affinity range with predictions equal to
/// the truth plus uniform noise in `[-noise, noise]`.
pub fn noisy_linear(n: usize, noise: f64, seed: u64) -> (Vec<f64>, Vec<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let truths: Vec<f64> = (0..n).map(|_| rng.gen_range(2.0..11.0)).collect();
    let predictions = truths
        .iter()
        .map(|t| t + rng.gen_range(-noise..=noise))
        .collect();
    (predictions, truths)
}

/// Like [`noisy_linear`], with samples laid out group by group.
///
/// Group `i` has `sizes[i]` members labelled `"g{i}"`.
pub fn grouped_dataset(
    sizes: &[usize],
    noise: f64,
    seed: u64,
) -> (Vec<f64>, Vec<f64>, Vec<Option<String>>) {
    let total = sizes.iter().sum();
    let (predictions, truths) = noisy_linear(total, noise, seed);
    let groups = sizes
        .iter()
        .enumerate()
        .flat_map(|(i, &n)| std::iter::repeat(Some(format!("g{}", i))).take(n))
        .collect();
    (predictions, truths, groups)
}
