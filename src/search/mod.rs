use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::dream::DreamRecord;
use crate::timefmt::parse_timestamp;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortKey {
    Time,
    Type,
    Length,
}

impl SortKey {
    pub fn next(self) -> Self {
        match self {
            SortKey::Time => SortKey::Type,
            SortKey::Type => SortKey::Length,
            SortKey::Length => SortKey::Time,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Time => "Time",
            SortKey::Type => "Type",
            SortKey::Length => "Length",
        }
    }
}

impl Default for SortKey {
    fn default() -> Self {
        SortKey::Time
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortOrder::Asc => "↑",
            SortOrder::Desc => "↓",
        }
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Desc
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SortSpec {
    pub field: SortKey,
    pub direction: SortOrder,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionQuery {
    pub keyword: String,
    pub sort: SortSpec,
}

impl CollectionQuery {
    pub fn new(keyword: impl Into<String>, field: SortKey, direction: SortOrder) -> Self {
        Self {
            keyword: keyword.into(),
            sort: SortSpec { field, direction },
        }
    }

    pub fn needle(&self) -> Option<String> {
        normalize_keyword(&self.keyword)
    }
}

/// Trimmed, lowercased keyword, or `None` when nothing is left to match.
pub fn normalize_keyword(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Derives the collection view: collected records only, keyword-filtered, sorted.
///
/// Ties under the selected key come out in no particular order.
pub fn filter_collection(records: &[DreamRecord], query: &CollectionQuery) -> Vec<DreamRecord> {
    let needle = query.needle();
    let mut view: Vec<DreamRecord> = records
        .iter()
        .filter(|record| record.is_collected)
        .filter(|record| match needle.as_deref() {
            Some(needle) => record.matches_keyword(needle),
            None => true,
        })
        .cloned()
        .collect();

    let SortSpec { field, direction } = query.sort;
    view.sort_unstable_by(|a, b| {
        let ordering = compare_records(a, b, field);
        match direction {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
    view
}

pub fn compare_records(a: &DreamRecord, b: &DreamRecord, key: SortKey) -> Ordering {
    match key {
        // Unparseable timestamps order before every parseable one.
        SortKey::Time => parse_timestamp(a.sort_time()).cmp(&parse_timestamp(b.sort_time())),
        SortKey::Type => a.type_tag().cmp(b.type_tag()),
        SortKey::Length => a.content_length().cmp(&b.content_length()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collected(id: &str, content: &str, kind: &str, time: &str) -> DreamRecord {
        DreamRecord::new(id, content, kind, "2024-01-01T00:00:00Z").collected_at(time)
    }

    fn ids(records: &[DreamRecord]) -> Vec<&str> {
        records.iter().map(|record| record.id.as_str()).collect()
    }

    #[test]
    fn keeps_only_collected_records() {
        let records = vec![
            collected("a", "ocean", "poetic", "2024-01-02T00:00:00Z"),
            DreamRecord::new("b", "forest", "fantasy", "2024-01-03T00:00:00Z"),
        ];
        let view = filter_collection(&records, &CollectionQuery::default());
        assert_eq!(ids(&view), vec!["a"]);
    }

    #[test]
    fn keyword_matches_content_or_type_case_insensitively() {
        let records = vec![
            collected("a", "Swimming with WHALES", "poetic", "2024-01-02T00:00:00Z"),
            collected("b", "a library of clocks", "philosophical", "2024-01-03T00:00:00Z"),
            collected("c", "a talking cat", "humorous", "2024-01-04T00:00:00Z"),
        ];
        let query = CollectionQuery::new("  whales ", SortKey::Time, SortOrder::Asc);
        assert_eq!(ids(&filter_collection(&records, &query)), vec!["a"]);

        let query = CollectionQuery::new("PHILO", SortKey::Time, SortOrder::Asc);
        assert_eq!(ids(&filter_collection(&records, &query)), vec!["b"]);

        let query = CollectionQuery::new("a", SortKey::Time, SortOrder::Asc);
        let view = filter_collection(&records, &query);
        assert_eq!(view.len(), 3);
        for record in &view {
            assert!(record.matches_keyword("a"));
        }

        let query = CollectionQuery::new("dragon", SortKey::Time, SortOrder::Asc);
        assert!(filter_collection(&records, &query).is_empty());
    }

    #[test]
    fn whitespace_keyword_does_not_filter() {
        let records = vec![
            collected("a", "one", "poetic", "2024-01-02T00:00:00Z"),
            collected("b", "two", "fantasy", "2024-01-03T00:00:00Z"),
        ];
        let query = CollectionQuery::new("   ", SortKey::Time, SortOrder::Asc);
        assert_eq!(filter_collection(&records, &query).len(), 2);
    }

    #[test]
    fn sorts_by_length_in_both_directions() {
        let records = vec![
            collected("five", "abcde", "poetic", "2024-01-02T00:00:00Z"),
            collected("one", "a", "poetic", "2024-01-03T00:00:00Z"),
            collected("three", "abc", "poetic", "2024-01-04T00:00:00Z"),
        ];
        let asc = CollectionQuery::new("", SortKey::Length, SortOrder::Asc);
        let lengths: Vec<usize> = filter_collection(&records, &asc)
            .iter()
            .map(DreamRecord::content_length)
            .collect();
        assert_eq!(lengths, vec![1, 3, 5]);

        let desc = CollectionQuery::new("", SortKey::Length, SortOrder::Desc);
        let lengths: Vec<usize> = filter_collection(&records, &desc)
            .iter()
            .map(DreamRecord::content_length)
            .collect();
        assert_eq!(lengths, vec![5, 3, 1]);
    }

    #[test]
    fn sorts_by_collect_time_with_create_time_fallback() {
        let mut fallback = DreamRecord::new("fallback", "x", "poetic", "2024-02-15 09:00:00");
        fallback.is_collected = true;
        let records = vec![
            collected("late", "x", "poetic", "2024-03-01T00:00:00Z"),
            fallback,
            collected("early", "x", "poetic", "2024-01-10T00:00:00Z"),
        ];
        let asc = CollectionQuery::new("", SortKey::Time, SortOrder::Asc);
        assert_eq!(
            ids(&filter_collection(&records, &asc)),
            vec!["early", "fallback", "late"]
        );
        let desc = CollectionQuery::new("", SortKey::Time, SortOrder::Desc);
        assert_eq!(
            ids(&filter_collection(&records, &desc)),
            vec!["late", "fallback", "early"]
        );
    }

    #[test]
    fn sorts_by_type_tag_as_string() {
        let records = vec![
            collected("p", "x", "prophetic", "2024-01-02T00:00:00Z"),
            collected("f", "x", "fantasy", "2024-01-03T00:00:00Z"),
            collected("h", "x", "humorous", "2024-01-04T00:00:00Z"),
        ];
        let asc = CollectionQuery::new("", SortKey::Type, SortOrder::Asc);
        assert_eq!(ids(&filter_collection(&records, &asc)), vec!["f", "h", "p"]);
    }

    #[test]
    fn reapplying_the_pipeline_is_idempotent() {
        let records = vec![
            collected("a", "abcd", "poetic", "2024-01-05T00:00:00Z"),
            collected("b", "ab", "fantasy", "2024-01-02T00:00:00Z"),
            DreamRecord::new("c", "abc", "humorous", "2024-01-03T00:00:00Z"),
            collected("d", "abcdef", "prophetic", "2024-01-09T00:00:00Z"),
        ];
        for field in [SortKey::Time, SortKey::Type, SortKey::Length] {
            for direction in [SortOrder::Asc, SortOrder::Desc] {
                let query = CollectionQuery::new("ab", field, direction);
                let once = filter_collection(&records, &query);
                let twice = filter_collection(&once, &query);
                assert_eq!(once, twice, "{field} {direction}");
                assert_eq!(once, filter_collection(&records, &query));
            }
        }
    }

    #[test]
    fn pipeline_leaves_input_untouched() {
        let records = vec![
            collected("b", "bb", "poetic", "2024-01-02T00:00:00Z"),
            collected("a", "a", "poetic", "2024-01-01T00:00:00Z"),
        ];
        let before = records.clone();
        let _ = filter_collection(
            &records,
            &CollectionQuery::new("", SortKey::Length, SortOrder::Asc),
        );
        assert_eq!(records, before);
    }

    #[test]
    fn parses_sort_options_from_lowercase_names() {
        assert_eq!("length".parse::<SortKey>().ok(), Some(SortKey::Length));
        assert_eq!("asc".parse::<SortOrder>().ok(), Some(SortOrder::Asc));
        assert!("size".parse::<SortKey>().is_err());
        assert_eq!(SortKey::Length.next(), SortKey::Time);
    }
}
