//! Per-key merging of partial counts
//!
//! The same `merge` serves the map-side combine and the final reduce, so it
//! must give the same answer however the values were split into calls.

use crate::types::{Count, MetricCategory, MetricKey};

/// How values sharing a key collapse into one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Arithmetic sum of all values
    Sum,
    /// Always 1: the key occurred at least once
    Presence,
}

impl MetricCategory {
    pub fn merge_policy(&self) -> MergePolicy {
        match self {
            MetricCategory::Session => MergePolicy::Presence,
            MetricCategory::Action
            | MetricCategory::Page
            | MetricCategory::Hour
            | MetricCategory::ActionPage
            | MetricCategory::HourAction => MergePolicy::Sum,
        }
    }
}

impl MergePolicy {
    pub fn apply<I>(&self, values: I) -> Count
    where
        I: IntoIterator<Item = Count>,
    {
        match self {
            MergePolicy::Sum => values.into_iter().fold(0, Count::saturating_add),
            // Presence ignores the values entirely, raw units and merged 1s alike
            MergePolicy::Presence => 1,
        }
    }
}

/// Merge a key's values. Only ever called for keys that occurred, so
/// `values` is never empty in practice.
pub fn merge<I>(key: &MetricKey, values: I) -> Count
where
    I: IntoIterator<Item = Count>,
{
    key.category().merge_policy().apply(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> MetricKey {
        MetricKey::Session {
            session_id: "s1".to_string(),
        }
    }

    fn action() -> MetricKey {
        MetricKey::Action {
            action: "click".to_string(),
        }
    }

    fn sum_keys() -> Vec<MetricKey> {
        vec![
            action(),
            MetricKey::Page {
                page: "/".to_string(),
            },
            MetricKey::Hour {
                hour: "09".to_string(),
            },
            MetricKey::ActionPage {
                action: "click".to_string(),
                page: "/".to_string(),
            },
            MetricKey::HourAction {
                hour: "09".to_string(),
                action: "click".to_string(),
            },
        ]
    }

    #[test]
    fn test_session_presence_is_idempotent() {
        let key = session();
        let once = merge(&key, [1]);
        assert_eq!(once, 1);
        assert_eq!(merge(&key, [1, 1, 1]), 1);
        assert_eq!(merge(&key, [once, 1]), 1);
        assert_eq!(merge(&key, [merge(&key, [1, 1]), merge(&key, [1])]), 1);
    }

    #[test]
    fn test_session_masks_foreign_values() {
        // A mis-grouped partial sum is still forced to 1
        assert_eq!(merge(&session(), [7, 3]), 1);
    }

    #[test]
    fn test_sum_categories_add() {
        for key in sum_keys() {
            assert_eq!(merge(&key, [1]), 1);
            assert_eq!(merge(&key, [1, 1, 1]), 3);
            assert_eq!(merge(&key, [4, 0, 2]), 6);
        }
    }

    #[test]
    fn test_sum_is_associative_over_any_split() {
        let values: Vec<Count> = vec![1, 1, 3, 1, 5, 1, 1, 2];
        for key in sum_keys() {
            let whole = merge(&key, values.iter().copied());
            for split in 0..=values.len() {
                let (left, right) = values.split_at(split);
                let partial = merge(
                    &key,
                    [merge(&key, left.iter().copied()), merge(&key, right.iter().copied())],
                );
                assert_eq!(partial, whole, "split at {split}");
            }
        }
    }

    #[test]
    fn test_sum_is_commutative() {
        let key = action();
        let forward = merge(&key, [1, 2, 3, 4]);
        let backward = merge(&key, [4, 3, 2, 1]);
        let shuffled = merge(&key, [3, 1, 4, 2]);
        assert_eq!(forward, 10);
        assert_eq!(forward, backward);
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn test_sum_saturates() {
        assert_eq!(merge(&action(), [Count::MAX, 1]), Count::MAX);
    }

    #[test]
    fn test_policy_per_category() {
        for category in MetricCategory::ALL {
            let expected = if category == MetricCategory::Session {
                MergePolicy::Presence
            } else {
                MergePolicy::Sum
            };
            assert_eq!(category.merge_policy(), expected);
        }
    }
}
