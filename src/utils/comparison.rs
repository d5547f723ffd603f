//! Utilities to compare custom types

use std::cmp::Ordering;

/// Compare two summaries alphabetically, ignoring case first and falling back to an exact comparison
pub fn compare_summaries_alpha(left: &str, right: &str) -> Ordering {
    Ord::cmp(&left.to_lowercase(), &right.to_lowercase())
        .then_with(|| Ord::cmp(left, right))
}
