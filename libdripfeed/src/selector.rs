//! Deduplicated random selection
//!
//! Selection is a pure function of the candidate pool, the posted history
//! and a randomness source. Recording a selection as used is the
//! publisher's job, and only after the post went out.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Candidates from `pool` that are not in `history`, in pool order.
///
/// Duplicate pool lines are kept, so a line listed twice is twice as likely
/// to be picked until it is posted.
pub fn eligible<'a>(pool: &'a [String], history: &HashSet<String>) -> Vec<&'a str> {
    pool.iter()
        .filter(|candidate| !history.contains(candidate.as_str()))
        .map(String::as_str)
        .collect()
}

/// Pick one eligible candidate uniformly at random.
///
/// Returns `None` when every candidate has already been posted. That is a
/// normal outcome, not an error.
pub fn select<R>(pool: &[String], history: &HashSet<String>, rng: &mut R) -> Option<String>
where
    R: Rng + ?Sized,
{
    let candidates = eligible(pool, history);
    candidates.choose(rng).map(|c| (*c).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_index_rng_picks_first_eligible() {
        let pool = lines(&["hello", "world"]);
        let mut rng = StepRng::new(0, 0);
        assert_eq!(select(&pool, &HashSet::new(), &mut rng), Some("hello".to_string()));
    }

    #[test]
    fn test_exhausted_pool_returns_none() {
        let pool = lines(&["hello"]);
        let history = set(&["hello"]);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(select(&pool, &history, &mut rng), None);
    }

    #[test]
    fn test_empty_pool_returns_none() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(select(&[], &HashSet::new(), &mut rng), None);
    }

    #[test]
    fn test_never_selects_posted_line() {
        let pool = lines(&["a", "b", "c", "d"]);
        let history = set(&["a", "c", "d"]);
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(select(&pool, &history, &mut rng), Some("b".to_string()));
        }
    }

    #[test]
    fn test_selection_is_member_of_pool_minus_history() {
        let pool = lines(&["one", "two", "three", "four", "five"]);
        let history = set(&["two", "four", "not-in-pool"]);
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = select(&pool, &history, &mut rng).unwrap();
            assert!(pool.contains(&picked));
            assert!(!history.contains(&picked));
        }
    }

    #[test]
    fn test_seeded_selection_is_reproducible() {
        let pool: Vec<String> = (0..50).map(|i| format!("line {}", i)).collect();
        let history = set(&["line 3", "line 17"]);

        let first = select(&pool, &history, &mut StdRng::seed_from_u64(42));
        let second = select(&pool, &history, &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn test_every_eligible_candidate_reachable() {
        let pool = lines(&["a", "b", "c"]);
        let mut seen = HashSet::new();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..300 {
            seen.insert(select(&pool, &HashSet::new(), &mut rng).unwrap());
        }
        assert_eq!(seen, set(&["a", "b", "c"]));
    }

    #[test]
    fn test_eligible_preserves_order_and_duplicates() {
        let pool = lines(&["x", "y", "x", "z"]);
        let history = set(&["y"]);
        assert_eq!(eligible(&pool, &history), vec!["x", "x", "z"]);
    }

    #[test]
    fn test_inputs_not_mutated() {
        let pool = lines(&["a", "b"]);
        let history = set(&["a"]);
        let mut rng = StdRng::seed_from_u64(3);
        let _ = select(&pool, &history, &mut rng);
        assert_eq!(pool, lines(&["a", "b"]));
        assert_eq!(history, set(&["a"]));
    }
}
