use serde::Serialize;
use uuid::Uuid;

use crate::models::comments::CommentRecord;

/// Richest threading shape present in a comment collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadingMode {
    /// Level and path are known: unlimited nesting.
    Advanced,
    /// Only `parent_id` is known: root and direct replies.
    Basic,
    /// No threading information at all.
    Flat,
}

impl ThreadingMode {
    /// Picks the mode for a whole collection, first match wins.
    pub fn detect(records: &[CommentRecord]) -> Self {
        if records.iter().any(CommentRecord::has_thread_metadata) {
            ThreadingMode::Advanced
        } else if records.iter().any(|record| record.parent_id.is_some()) {
            ThreadingMode::Basic
        } else {
            ThreadingMode::Flat
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThreadingMode::Advanced => "advanced",
            ThreadingMode::Basic => "basic",
            ThreadingMode::Flat => "flat",
        }
    }
}

/// Record viewed through the advanced shape. `level` is the stored level
/// clamped to zero, or zero when missing; the record itself is untouched.
#[derive(Debug, Clone, Copy)]
pub struct AdvancedComment<'a> {
    pub record: &'a CommentRecord,
    pub level: u32,
}

/// Record viewed through the basic shape.
#[derive(Debug, Clone, Copy)]
pub struct BasicComment<'a> {
    pub record: &'a CommentRecord,
    pub parent_id: Option<Uuid>,
    pub level: Option<u32>,
}

/// The input collection tagged with its detected mode. The mode is decided
/// once for the whole collection and every record is read through it.
#[derive(Debug)]
pub enum ThreadedInput<'a> {
    Advanced(Vec<AdvancedComment<'a>>),
    Basic(Vec<BasicComment<'a>>),
    Flat(&'a [CommentRecord]),
}

impl<'a> ThreadedInput<'a> {
    pub fn classify(records: &'a [CommentRecord]) -> Self {
        match ThreadingMode::detect(records) {
            ThreadingMode::Advanced => ThreadedInput::Advanced(
                records
                    .iter()
                    .map(|record| AdvancedComment {
                        record,
                        level: non_negative(record.thread_level).unwrap_or(0),
                    })
                    .collect(),
            ),
            ThreadingMode::Basic => ThreadedInput::Basic(
                records
                    .iter()
                    .map(|record| BasicComment {
                        record,
                        parent_id: record.parent_id,
                        level: non_negative(record.thread_level),
                    })
                    .collect(),
            ),
            ThreadingMode::Flat => ThreadedInput::Flat(records),
        }
    }

    pub fn mode(&self) -> ThreadingMode {
        match self {
            ThreadedInput::Advanced(_) => ThreadingMode::Advanced,
            ThreadedInput::Basic(_) => ThreadingMode::Basic,
            ThreadedInput::Flat(_) => ThreadingMode::Flat,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ThreadedInput::Advanced(items) => items.len(),
            ThreadedInput::Basic(items) => items.len(),
            ThreadedInput::Flat(items) => items.len(),
        }
    }
}

// Negative levels coming from the store are clamped rather than rejected.
fn non_negative(level: Option<i32>) -> Option<u32> {
    level.map(|value| u32::try_from(value).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::comments::fixtures::{record, threaded};

    #[test]
    fn empty_collection_is_flat() {
        assert_eq!(ThreadingMode::detect(&[]), ThreadingMode::Flat);
    }

    #[test]
    fn single_fully_threaded_record_wins() {
        let records = vec![
            record(1, None, 0),
            record(2, Some(1), 1),
            threaded(3, None, 0, "2"),
        ];
        assert_eq!(ThreadingMode::detect(&records), ThreadingMode::Advanced);
    }

    #[test]
    fn level_without_path_is_not_advanced() {
        let mut only_level = record(2, Some(1), 1);
        only_level.thread_level = Some(1);
        let records = vec![record(1, None, 0), only_level];
        assert_eq!(ThreadingMode::detect(&records), ThreadingMode::Basic);
    }

    #[test]
    fn path_without_level_and_no_parent_is_flat() {
        let mut only_path = record(1, None, 0);
        only_path.thread_path = Some("1".to_string());
        assert_eq!(ThreadingMode::detect(&[only_path]), ThreadingMode::Flat);
    }

    #[test]
    fn any_parent_reference_selects_basic() {
        let records = vec![record(1, None, 0), record(2, None, 1), record(3, Some(9), 2)];
        assert_eq!(ThreadingMode::detect(&records), ThreadingMode::Basic);
    }

    #[test]
    fn classify_defaults_missing_advanced_fields() {
        let mut negative = threaded(1, None, -3, "1");
        negative.thread_path = Some("1".to_string());
        let records = vec![negative, record(2, Some(1), 1)];
        let input = ThreadedInput::classify(&records);
        assert_eq!(input.mode(), ThreadingMode::Advanced);
        assert_eq!(input.len(), 2);
        let ThreadedInput::Advanced(items) = input else {
            panic!("expected advanced input");
        };
        assert_eq!(items[0].level, 0);
        assert_eq!(items[0].record.thread_level, Some(-3));
        assert_eq!(items[1].level, 0);
        assert_eq!(items[1].record.thread_path, None);
    }
}
