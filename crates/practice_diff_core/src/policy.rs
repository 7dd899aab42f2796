//! crates/practice_diff_core/src/policy.rs
//!
//! Display policies applied identically to both read paths.

/// Drops the last entry of an insertion-ordered sequence.
///
/// The most recent suggestion is the story the student is currently working
/// on, so it is left out of the history shown to the operator. Sequences of
/// zero or one element come back empty.
pub fn drop_most_recent<T>(mut items: Vec<T>) -> Vec<T> {
    items.pop();
    items
}
