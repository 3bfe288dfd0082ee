use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Loosely-typed field value as produced by an extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Null,
    Text(String),
    List(Vec<RawValue>),
    /// Rendered form of a number, boolean or nested object.
    Other(String),
}

impl RawValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::String(text) => Self::Text(text.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            other => Self::Other(other.to_string()),
        }
    }

    /// Scalar coercion used for `url`, `title` and `description`.
    pub fn as_text(&self) -> &str {
        match self {
            Self::Text(text) | Self::Other(text) => text,
            Self::Null | Self::List(_) => "",
        }
    }

    /// Sequence coercion used for `tags`. Scalars yield nothing.
    pub fn to_tags(&self) -> Vec<String> {
        let Self::List(items) = self else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| match item {
                Self::Text(text) | Self::Other(text) => Some(text.clone()),
                Self::Null | Self::List(_) => None,
            })
            .collect()
    }
}

/// One input row, line or link match before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub url: Option<RawValue>,
    pub title: Option<RawValue>,
    pub description: Option<RawValue>,
    pub tags: Option<RawValue>,
}

impl RawRecord {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(RawValue::text(url)),
            ..Self::default()
        }
    }

    pub fn with_link(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: Some(RawValue::text(url)),
            title: Some(RawValue::text(title)),
            ..Self::default()
        }
    }

    /// Assign a named field. Returns `false` for keys outside the canonical set.
    pub fn set(&mut self, key: &str, value: RawValue) -> bool {
        let slot = match key {
            "url" => &mut self.url,
            "title" => &mut self.title,
            "description" => &mut self.description,
            "tags" => &mut self.tags,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    pub fn url_text(&self) -> &str {
        field_text(self.url.as_ref())
    }

    pub fn title_text(&self) -> &str {
        field_text(self.title.as_ref())
    }

    pub fn description_text(&self) -> &str {
        field_text(self.description.as_ref())
    }

    pub fn tag_list(&self) -> Vec<String> {
        self.tags.as_ref().map(RawValue::to_tags).unwrap_or_default()
    }
}

fn field_text(value: Option<&RawValue>) -> &str {
    value.map(RawValue::as_text).unwrap_or("")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub url: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub list: String,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

/// Persisted layout consumed by the bookmark service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub bookmarks: Vec<NormalizedRecord>,
}
