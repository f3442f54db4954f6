//! Reviewer selection.
//!
//! Pure functions over a candidate pool. Randomness comes from the caller so
//! a seeded generator makes selection reproducible.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::User;

/// Number of reviewers assigned when a pull request is created.
pub const REVIEWER_QUOTA: usize = 2;

/// Pick up to `quota` distinct reviewer ids from `pool`.
///
/// Returns every id when the pool is no larger than the quota; otherwise a
/// uniformly random `quota`-subset (each subset equally likely).
pub fn select_reviewers<R: Rng + ?Sized>(pool: &[User], quota: usize, rng: &mut R) -> Vec<String> {
    if pool.len() <= quota {
        return pool.iter().map(|u| u.user_id.clone()).collect();
    }

    pool.choose_multiple(rng, quota)
        .map(|u| u.user_id.clone())
        .collect()
}

/// Pick a single candidate uniformly, or `None` for an empty pool.
pub fn pick_one<'a, R: Rng + ?Sized>(pool: &'a [User], rng: &mut R) -> Option<&'a User> {
    pool.choose(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;
    use std::collections::{HashMap, HashSet};

    fn pool(n: usize) -> Vec<User> {
        (0..n)
            .map(|i| User::new(format!("u{}", i), format!("user {}", i), "backend", true))
            .collect()
    }

    #[rstest]
    #[case::empty_pool(0, 2, 0)]
    #[case::smaller_than_quota(1, 2, 1)]
    #[case::equal_to_quota(2, 2, 2)]
    #[case::larger_than_quota(5, 2, 2)]
    #[case::zero_quota(4, 0, 0)]
    #[case::large_quota(10, 7, 7)]
    fn selection_size_is_min_of_pool_and_quota(
        #[case] pool_size: usize,
        #[case] quota: usize,
        #[case] expected: usize,
    ) {
        let candidates = pool(pool_size);
        let mut rng = StdRng::seed_from_u64(7);

        let selected = select_reviewers(&candidates, quota, &mut rng);

        assert_eq!(selected.len(), expected);

        let unique: HashSet<&String> = selected.iter().collect();
        assert_eq!(unique.len(), selected.len(), "no duplicates");

        let ids: HashSet<&String> = candidates.iter().map(|u| &u.user_id).collect();
        assert!(selected.iter().all(|id| ids.contains(id)), "subset of pool");
    }

    #[test]
    fn small_pool_returns_everyone() {
        let candidates = pool(2);
        let mut rng = StdRng::seed_from_u64(1);

        let mut selected = select_reviewers(&candidates, REVIEWER_QUOTA, &mut rng);
        selected.sort();

        assert_eq!(selected, vec!["u0", "u1"]);
    }

    #[test]
    fn same_seed_same_selection() {
        let candidates = pool(6);

        let a = select_reviewers(&candidates, 3, &mut StdRng::seed_from_u64(42));
        let b = select_reviewers(&candidates, 3, &mut StdRng::seed_from_u64(42));

        assert_eq!(a, b);
    }

    #[test]
    fn every_candidate_gets_picked_eventually() {
        // With 4 candidates and quota 2 each id is in half of all subsets;
        // over many draws every id must show up in a healthy share.
        let candidates = pool(4);
        let mut rng = StdRng::seed_from_u64(2024);
        let mut hits: HashMap<String, usize> = HashMap::new();

        for _ in 0..4000 {
            for id in select_reviewers(&candidates, 2, &mut rng) {
                *hits.entry(id).or_default() += 1;
            }
        }

        assert_eq!(hits.len(), 4);
        for count in hits.values() {
            assert!((1700..=2300).contains(count), "skewed count {}", count);
        }
    }

    #[test]
    fn pick_one_from_empty_pool_is_none() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(pick_one(&[], &mut rng).is_none());
    }

    #[test]
    fn pick_one_returns_pool_member() {
        let candidates = pool(3);
        let mut rng = StdRng::seed_from_u64(3);

        let picked = pick_one(&candidates, &mut rng).unwrap();
        assert!(candidates.contains(picked));
    }
}
