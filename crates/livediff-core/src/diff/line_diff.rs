//! Line-based text diff

use super::model::{Delta, DiffRecord, DiffType};
use difference::{Changeset, Difference};

/// Diff `old` against `new` line by line
///
/// An empty side contributes no lines, so diffing against an absent node
/// yields only `RightOnly` (or only `LeftOnly`) records.
pub fn diff_lines(old: &str, new: &str) -> Vec<DiffRecord> {
    let old = old.strip_suffix('\n').unwrap_or(old);
    let new = new.strip_suffix('\n').unwrap_or(new);

    if old.is_empty() && new.is_empty() {
        return Vec::new();
    }
    if old.is_empty() {
        return records(Delta::RightOnly, new);
    }
    if new.is_empty() {
        return records(Delta::LeftOnly, old);
    }

    let changeset = Changeset::new(old, new, "\n");
    let mut out = Vec::new();
    for chunk in &changeset.diffs {
        match chunk {
            Difference::Same(text) => out.extend(records(Delta::Common, text)),
            Difference::Add(text) => out.extend(records(Delta::RightOnly, text)),
            Difference::Rem(text) => out.extend(records(Delta::LeftOnly, text)),
        }
    }
    out
}

fn records(delta: Delta, text: &str) -> Vec<DiffRecord> {
    text.split('\n').map(|line| DiffRecord::new(delta, line)).collect()
}

/// ADD if only additions, REMOVE if only removals, MODIFY if both
pub fn calc_diff_type(records: &[DiffRecord]) -> DiffType {
    let has_add = records.iter().any(|r| r.delta == Delta::RightOnly);
    let has_remove = records.iter().any(|r| r.delta == Delta::LeftOnly);
    match (has_add, has_remove) {
        (true, true) => DiffType::Modify,
        (true, false) => DiffType::Add,
        (false, true) => DiffType::Remove,
        (false, false) => DiffType::NoChange,
    }
}

pub fn has_changes(records: &[DiffRecord]) -> bool {
    records.iter().any(|r| r.delta != Delta::Common)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn deltas(records: &[DiffRecord]) -> Vec<(Delta, &str)> {
        records.iter().map(|r| (r.delta, r.payload.as_str())).collect()
    }

    #[test]
    fn test_identical_is_all_common() {
        let out = diff_lines("a: 1\nb: 2\n", "a: 1\nb: 2\n");
        assert_eq!(deltas(&out), vec![(Delta::Common, "a: 1"), (Delta::Common, "b: 2")]);
        assert!(!has_changes(&out));
    }

    #[test]
    fn test_modified_line() {
        let out = diff_lines("a: 1\nb: 2\nc: 3\n", "a: 1\nb: 5\nc: 3\n");
        assert_eq!(
            deltas(&out),
            vec![
                (Delta::Common, "a: 1"),
                (Delta::LeftOnly, "b: 2"),
                (Delta::RightOnly, "b: 5"),
                (Delta::Common, "c: 3"),
            ]
        );
        assert_eq!(calc_diff_type(&out), DiffType::Modify);
    }

    #[test]
    fn test_against_empty() {
        let added = diff_lines("", "a: 1\nb: 2\n");
        assert_eq!(calc_diff_type(&added), DiffType::Add);
        assert_eq!(added.len(), 2);

        let removed = diff_lines("a: 1\nb: 2\n", "");
        assert_eq!(calc_diff_type(&removed), DiffType::Remove);
        assert_eq!(removed.len(), 2);

        assert!(diff_lines("", "").is_empty());
    }

    fn delta_strategy() -> impl Strategy<Value = Delta> {
        prop_oneof![Just(Delta::LeftOnly), Just(Delta::RightOnly), Just(Delta::Common)]
    }

    proptest! {
        #[test]
        fn prop_classification(deltas in proptest::collection::vec(delta_strategy(), 0..20)) {
            let records: Vec<DiffRecord> =
                deltas.iter().map(|d| DiffRecord::new(*d, "x")).collect();
            let left = deltas.contains(&Delta::LeftOnly);
            let right = deltas.contains(&Delta::RightOnly);

            let expected = match (right, left) {
                (true, true) => DiffType::Modify,
                (true, false) => DiffType::Add,
                (false, true) => DiffType::Remove,
                (false, false) => DiffType::NoChange,
            };
            prop_assert_eq!(calc_diff_type(&records), expected);
            prop_assert_eq!(has_changes(&records), left || right);
        }

        #[test]
        fn prop_add_remove_symmetry(lines in proptest::collection::vec("[a-z: 0-9]{1,12}", 1..10)) {
            let text = lines.join("\n");
            let removed = diff_lines(&text, "");
            let added = diff_lines("", &text);

            prop_assert!(removed.iter().all(|r| r.delta == Delta::LeftOnly));
            prop_assert!(added.iter().all(|r| r.delta == Delta::RightOnly));
            prop_assert_eq!(removed.len(), added.len());
        }
    }
}
