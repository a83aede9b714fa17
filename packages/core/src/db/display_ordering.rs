/// Gap between consecutive siblings; leaves slack for manual insertion
pub const ORDER_STEP: i64 = 10;

/// Integer sibling ordering with gaps of [`ORDER_STEP`]
///
/// No renumbering happens implicitly: values are only rewritten by an
/// explicit reorder.
pub struct DisplayOrderCalculator;

impl DisplayOrderCalculator {
    /// Order for a node appended after the current last sibling
    ///
    /// # Examples
    /// ```
    /// # use completionist_core::db::DisplayOrderCalculator;
    /// assert_eq!(DisplayOrderCalculator::next_order(None), 10);
    /// assert_eq!(DisplayOrderCalculator::next_order(Some(30)), 40);
    /// ```
    pub fn next_order(existing_max: Option<i64>) -> i64 {
        existing_max.unwrap_or(0).saturating_add(ORDER_STEP)
    }

    /// Pair each id with `start + index * step`
    pub fn sequence_from<S: AsRef<str>>(ids: &[S], start: i64, step: i64) -> Vec<(String, i64)> {
        ids.iter()
            .zip(0i64..)
            .map(|(id, i)| (id.as_ref().to_string(), start + i * step))
            .collect()
    }

    /// `sequence_from(ids, 0, ORDER_STEP)`
    pub fn sequence<S: AsRef<str>>(ids: &[S]) -> Vec<(String, i64)> {
        Self::sequence_from(ids, 0, ORDER_STEP)
    }

    /// Orders for `count` appended siblings following `existing_max`
    pub fn append_run(existing_max: Option<i64>, count: usize) -> Vec<i64> {
        let first = Self::next_order(existing_max);
        (0..count as i64).map(|i| first + i * ORDER_STEP).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_order_without_siblings() {
        assert_eq!(DisplayOrderCalculator::next_order(None), 10);
    }

    #[test]
    fn test_next_order_after_max() {
        assert_eq!(DisplayOrderCalculator::next_order(Some(0)), 10);
        assert_eq!(DisplayOrderCalculator::next_order(Some(25)), 35);
    }

    #[test]
    fn test_sequence_defaults() {
        let seq = DisplayOrderCalculator::sequence(&["a", "b", "c"]);
        assert_eq!(
            seq,
            vec![
                ("a".to_string(), 0),
                ("b".to_string(), 10),
                ("c".to_string(), 20)
            ]
        );
    }

    #[test]
    fn test_sequence_custom_start_and_step() {
        let seq = DisplayOrderCalculator::sequence_from(&["x", "y"], 100, 5);
        assert_eq!(seq, vec![("x".to_string(), 100), ("y".to_string(), 105)]);
    }

    #[test]
    fn test_sequence_empty() {
        let ids: [&str; 0] = [];
        assert!(DisplayOrderCalculator::sequence(&ids).is_empty());
    }

    #[test]
    fn test_append_run_continues_after_max() {
        assert_eq!(DisplayOrderCalculator::append_run(Some(20), 3), vec![30, 40, 50]);
        assert_eq!(DisplayOrderCalculator::append_run(None, 2), vec![10, 20]);
    }
}
