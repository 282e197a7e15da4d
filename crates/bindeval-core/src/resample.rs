//! Bootstrap resampling plans.
//!
//! A [`ResamplingPlan`] decides which sample indices a bootstrap round may
//! draw and how many it draws:
//!
//! | Plan | Population | Draws per round |
//! |------|------------|-----------------|
//! | `Unstratified` | all N samples | N, with replacement |
//! | `Stratified` | members of retained groups | per group, its own size, with replacement from that group |
//!
//! Stratification keeps relative group sizes fixed in every resample, so a
//! numerically dominant group cannot swamp the metrics in some rounds and
//! vanish in others.
//!
//! # Reproducibility
//!
//! Every round owns an independent random stream derived from the run seed
//! and the round number ([`round_rng`]). A round's draws are therefore the
//! same whether it runs first or last, on the calling thread or a worker.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::{debug, warn};

/// Returns the random source for bootstrap round `round` of a run seeded
/// with `seed`.
pub fn round_rng(seed: u64, round: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(round as u64);
    rng
}

/// How bootstrap rounds draw sample indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResamplingPlan {
    /// Draw N indices uniformly from all N samples.
    Unstratified { population: usize },
    /// Draw each retained group's size from that group's own members.
    Stratified { strata: Vec<Vec<usize>> },
}

/// Summary of how a group labelling was turned into strata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrataSummary {
    /// Groups with at least `n_min` members
    pub retained_groups: usize,
    /// Groups with fewer than `n_min` members
    pub sparse_groups: usize,
    /// Samples belonging to retained groups
    pub retained_samples: usize,
    /// Samples in sparse groups
    pub sparse_samples: usize,
    /// Samples with no group label
    pub unlabelled_samples: usize,
}

impl ResamplingPlan {
    /// Plan that resamples the full population.
    pub fn unstratified(population: usize) -> Self {
        ResamplingPlan::Unstratified { population }
    }

    /// Builds a stratified plan from per-sample group labels.
    ///
    /// Groups with fewer than `n_min` members and unlabelled samples are
    /// left out of the strata. Strata are ordered by first appearance of
    /// their label, and members keep their original index order, so the
    /// plan depends only on the labelling and not on hashing.
    ///
    /// If no group reaches `n_min`, falls back to an unstratified plan over
    /// all samples.
    pub fn stratified<G: Hash + Eq>(groups: &[Option<G>], n_min: usize) -> (Self, StrataSummary) {
        let mut slot_of: HashMap<&G, usize> = HashMap::new();
        let mut members: Vec<Vec<usize>> = Vec::new();
        let mut summary = StrataSummary::default();

        for (idx, label) in groups.iter().enumerate() {
            match label {
                Some(g) => {
                    let slot = *slot_of.entry(g).or_insert_with(|| {
                        members.push(Vec::new());
                        members.len() - 1
                    });
                    members[slot].push(idx);
                }
                None => summary.unlabelled_samples += 1,
            }
        }

        let mut strata = Vec::with_capacity(members.len());
        for group in members {
            if group.len() >= n_min {
                summary.retained_groups += 1;
                summary.retained_samples += group.len();
                strata.push(group);
            } else {
                summary.sparse_groups += 1;
                summary.sparse_samples += group.len();
            }
        }

        debug!(
            retained_groups = summary.retained_groups,
            sparse_groups = summary.sparse_groups,
            unlabelled = summary.unlabelled_samples,
            "Built bootstrap strata"
        );

        if strata.is_empty() {
            warn!(
                n_min,
                sparse_groups = summary.sparse_groups,
                "No group reaches the minimum size; resampling all samples without stratification"
            );
            return (Self::unstratified(groups.len()), summary);
        }

        (ResamplingPlan::Stratified { strata }, summary)
    }

    /// Number of indices drawn per round.
    pub fn draws_per_round(&self) -> usize {
        match self {
            ResamplingPlan::Unstratified { population } => *population,
            ResamplingPlan::Stratified { strata } => strata.iter().map(Vec::len).sum(),
        }
    }

    pub fn is_stratified(&self) -> bool {
        matches!(self, ResamplingPlan::Stratified { .. })
    }

    /// Draws one bootstrap resample into `out`, replacing its contents.
    pub fn draw_into<R: Rng>(&self, rng: &mut R, out: &mut Vec<usize>) {
        out.clear();
        match self {
            ResamplingPlan::Unstratified { population } => {
                out.extend((0..*population).map(|_| rng.gen_range(0..*population)));
            }
            ResamplingPlan::Stratified { strata } => {
                for stratum in strata {
                    let size = stratum.len();
                    out.extend((0..size).map(|_| stratum[rng.gen_range(0..size)]));
                }
            }
        }
    }

    /// Draws one bootstrap resample.
    pub fn draw<R: Rng>(&self, rng: &mut R) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.draws_per_round());
        self.draw_into(rng, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn labels(sizes: &[(&'static str, usize)]) -> Vec<Option<&'static str>> {
        sizes
            .iter()
            .flat_map(|&(name, n)| std::iter::repeat(Some(name)).take(n))
            .collect()
    }

    #[test]
    fn test_round_rng_reproducible() {
        let mut a = round_rng(42, 3);
        let mut b = round_rng(42, 3);
        for _ in 0..100 {
            assert_eq!(a.gen::<u64>(), b.gen::<u64>());
        }
    }

    #[test]
    fn test_round_rng_streams_differ() {
        let mut a = round_rng(42, 0);
        let mut b = round_rng(42, 1);
        let xs: Vec<u64> = (0..8).map(|_| a.gen()).collect();
        let ys: Vec<u64> = (0..8).map(|_| b.gen()).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn test_unstratified_draw_size_and_range() {
        let plan = ResamplingPlan::unstratified(25);
        let mut rng = round_rng(1, 0);
        let draw = plan.draw(&mut rng);
        assert_eq!(draw.len(), 25);
        assert!(draw.iter().all(|&i| i < 25));
    }

    #[test]
    fn test_stratified_excludes_sparse_and_unlabelled() {
        let mut groups = labels(&[("a", 12), ("b", 3), ("c", 10)]);
        groups.push(None);
        groups.push(None);

        let (plan, summary) = ResamplingPlan::stratified(&groups, 10);
        assert!(plan.is_stratified());
        assert_eq!(summary.retained_groups, 2);
        assert_eq!(summary.sparse_groups, 1);
        assert_eq!(summary.sparse_samples, 3);
        assert_eq!(summary.unlabelled_samples, 2);
        assert_eq!(plan.draws_per_round(), 22);

        let excluded: HashSet<usize> = (12..15).chain(25..27).collect();
        let mut rng = round_rng(7, 0);
        for _ in 0..200 {
            let draw = plan.draw(&mut rng);
            assert_eq!(draw.len(), 22);
            assert!(draw.iter().all(|i| !excluded.contains(i)));
        }
    }

    #[test]
    fn test_stratified_preserves_group_sizes() {
        let groups = labels(&[("x", 10), ("y", 20)]);
        let (plan, _) = ResamplingPlan::stratified(&groups, 5);
        let mut rng = round_rng(3, 0);
        for _ in 0..50 {
            let draw = plan.draw(&mut rng);
            let from_x = draw.iter().filter(|&&i| i < 10).count();
            let from_y = draw.iter().filter(|&&i| i >= 10).count();
            assert_eq!(from_x, 10);
            assert_eq!(from_y, 20);
        }
    }

    #[test]
    fn test_stratified_interleaved_labels() {
        let groups = vec![Some(1), Some(2), Some(1), Some(2), Some(1)];
        let (plan, _) = ResamplingPlan::stratified(&groups, 2);
        assert_eq!(
            plan,
            ResamplingPlan::Stratified {
                strata: vec![vec![0, 2, 4], vec![1, 3]]
            }
        );
    }

    #[test]
    fn test_stratified_falls_back_when_all_groups_sparse() {
        let groups = labels(&[("a", 3), ("b", 4)]);
        let (plan, summary) = ResamplingPlan::stratified(&groups, 10);
        assert_eq!(plan, ResamplingPlan::unstratified(7));
        assert_eq!(summary.retained_groups, 0);
        assert_eq!(summary.sparse_groups, 2);
    }

    #[test]
    fn test_draw_into_reuses_buffer() {
        let plan = ResamplingPlan::unstratified(5);
        let mut rng = round_rng(9, 0);
        let mut buf = vec![99; 40];
        plan.draw_into(&mut rng, &mut buf);
        assert_eq!(buf.len(), 5);
    }
}
