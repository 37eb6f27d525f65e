use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use serde_with::skip_serializing_none;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::timefmt;

pub const UNKNOWN_TYPE_NAME: &str = "Unknown";
pub const UNKNOWN_TYPE_ICON: &str = "❔";

/// Category tags a captured dream can carry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum DreamType {
    Fantasy,
    Poetic,
    Humorous,
    Philosophical,
    Prophetic,
}

impl DreamType {
    pub fn from_tag(tag: &str) -> Option<Self> {
        tag.trim().parse().ok()
    }

    pub fn display_name(self) -> &'static str {
        match self {
            DreamType::Fantasy => "Fantasy",
            DreamType::Poetic => "Poetic",
            DreamType::Humorous => "Humorous",
            DreamType::Philosophical => "Philosophical",
            DreamType::Prophetic => "Prophetic",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            DreamType::Fantasy => "🦄",
            DreamType::Poetic => "🌸",
            DreamType::Humorous => "😄",
            DreamType::Philosophical => "🤔",
            DreamType::Prophetic => "🔮",
        }
    }
}

pub fn type_display_name(tag: &str) -> &'static str {
    DreamType::from_tag(tag)
        .map(DreamType::display_name)
        .unwrap_or(UNKNOWN_TYPE_NAME)
}

pub fn type_icon(tag: &str) -> &'static str {
    DreamType::from_tag(tag)
        .map(DreamType::icon)
        .unwrap_or(UNKNOWN_TYPE_ICON)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamParams {
    #[serde(default)]
    pub dream_type: String,
    /// Capture-flow parameters this crate does not interpret; kept so saves are lossless.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One saved dream as stored under the history key.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamRecord {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub params: DreamParams,
    #[serde(default)]
    pub create_time: String,
    pub collect_time: Option<String>,
    #[serde(default)]
    pub is_collected: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DreamRecord {
    pub fn new(
        id: impl Into<RecordId>,
        content: impl Into<String>,
        dream_type: impl Into<String>,
        create_time: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            params: DreamParams {
                dream_type: dream_type.into(),
                extra: Map::new(),
            },
            create_time: create_time.into(),
            collect_time: None,
            is_collected: false,
            extra: Map::new(),
        }
    }

    pub fn collected_at(mut self, collect_time: impl Into<String>) -> Self {
        self.collect_time = Some(collect_time.into());
        self.is_collected = true;
        self
    }

    pub fn type_tag(&self) -> &str {
        &self.params.dream_type
    }

    pub fn dream_type(&self) -> Option<DreamType> {
        DreamType::from_tag(&self.params.dream_type)
    }

    pub fn type_name(&self) -> &'static str {
        type_display_name(&self.params.dream_type)
    }

    pub fn type_icon(&self) -> &'static str {
        type_icon(&self.params.dream_type)
    }

    /// `collectTime` when present and non-empty, otherwise `createTime`.
    pub fn sort_time(&self) -> &str {
        self.collect_time
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or(&self.create_time)
    }

    pub fn content_length(&self) -> usize {
        self.content.chars().count()
    }

    /// `needle` must already be trimmed and lowercased.
    pub fn matches_keyword(&self, needle: &str) -> bool {
        self.content.to_lowercase().contains(needle)
            || self.params.dream_type.to_lowercase().contains(needle)
    }

    /// Whole-record replacement with the collected flag set to `collected`.
    ///
    /// Collecting stamps `collectTime` with `now`; uncollecting clears it again, so a
    /// collect followed by an uncollect yields the record it started from.
    pub fn with_collected(&self, collected: bool, now: &str) -> Self {
        let mut next = self.clone();
        if next.is_collected == collected {
            return next;
        }
        next.is_collected = collected;
        next.collect_time = if collected {
            Some(now.to_string())
        } else {
            None
        };
        next
    }

    pub fn display_time(&self) -> String {
        timefmt::format_display(self.sort_time(), time::OffsetDateTime::now_utc())
    }
}

/// Record identifier as the capture flow wrote it. Numeric ids are written back as
/// JSON numbers; equality and lookups go through the text form.
#[derive(Debug, Clone, Default)]
pub struct RecordId {
    text: String,
    numeric: bool,
}

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl PartialEq for RecordId {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for RecordId {}

impl std::hash::Hash for RecordId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl PartialEq<str> for RecordId {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

impl PartialEq<&str> for RecordId {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for RecordId {
    fn from(text: &str) -> Self {
        Self::from(text.to_string())
    }
}

impl From<String> for RecordId {
    fn from(text: String) -> Self {
        Self {
            text,
            numeric: false,
        }
    }
}

impl From<Number> for RecordId {
    fn from(number: Number) -> Self {
        Self {
            text: number.to_string(),
            numeric: true,
        }
    }
}

impl Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.text.parse::<Number>() {
            Ok(number) if self.numeric => number.serialize(serializer),
            _ => serializer.serialize_str(&self.text),
        }
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => RecordId::from(text),
            RawId::Number(number) => RecordId::from(number),
        })
    }
}
