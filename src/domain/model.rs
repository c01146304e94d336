use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A validated bill. Only the validator creates new ones; the store may
/// rebuild one from its own pointer file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Bill {
    #[serde(alias = "description")]
    description: String,
    #[serde(alias = "price", with = "rust_decimal::serde::arbitrary_precision")]
    price: Decimal,
    #[serde(alias = "items")]
    items: u8,
    #[serde(alias = "createdAt", deserialize_with = "deserialize_created_at")]
    created_at: DateTime<Local>,
}

impl Bill {
    pub(crate) fn new(
        description: String,
        price: Decimal,
        items: u8,
        created_at: DateTime<Local>,
    ) -> Self {
        Self {
            description,
            price,
            items,
            created_at,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn items(&self) -> u8 {
        self.items
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    /// Four `Label: value` lines; only the timestamp layout varies by caller.
    pub fn render(&self, created_format: &str) -> String {
        format!(
            "Description: {}\nPrice: {:.2}\nItems: {}\nCreated: {}\n",
            self.description,
            self.price,
            self.items,
            self.created_at.format(created_format)
        )
    }
}

const NAIVE_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// RFC 3339 timestamps keep their instant; offset-less ones are read as local time.
fn parse_created_at(text: &str) -> Option<DateTime<Local>> {
    let text = text.trim();
    if let Ok(timestamp) = text.parse::<DateTime<FixedOffset>>() {
        return Some(timestamp.with_timezone(&Local));
    }

    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
}

fn deserialize_created_at<'de, D>(deserializer: D) -> Result<DateTime<Local>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_created_at(&text)
        .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", text)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum BillFormat {
    #[default]
    Json,
    Text,
}

impl BillFormat {
    /// Names other than `json` (any case) fall back to `Text`, the same
    /// fallback the extension lookup has always had.
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }

    /// Numeric codes as written by enum-as-integer serializers: 0 is JSON,
    /// anything else takes the same `Text` fallback as unknown names.
    pub fn from_code(code: Option<u64>) -> Self {
        match code {
            Some(0) => Self::Json,
            _ => Self::Text,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => ".json",
            Self::Text => ".txt",
        }
    }
}

impl<'de> Deserialize<'de> for BillFormat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(name) => Ok(Self::from_name(&name)),
            serde_json::Value::Number(code) => Ok(Self::from_code(code.as_u64())),
            other => Err(de::Error::custom(format!(
                "expected a format name or code, found {}",
                other
            ))),
        }
    }
}

impl fmt::Display for BillFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("JSON"),
            Self::Text => f.write_str("TEXT"),
        }
    }
}

/// What a save produced, or what the last-bill pointer says was saved.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBill {
    pub bill: Bill,
    pub file_path: PathBuf,
    pub format: BillFormat,
}

impl StoredBill {
    pub fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_path.display().to_string())
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

/// Raw form input, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillForm {
    pub description: String,
    pub price: String,
    pub items: String,
    pub filename: String,
}

impl BillForm {
    pub fn new(
        description: impl Into<String>,
        price: impl Into<String>,
        items: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            price: price.into(),
            items: items.into(),
            filename: filename.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBill {
    pub bill: Bill,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid(ValidatedBill),
    /// Never empty; messages are ordered description, price, items, filename.
    Invalid(Vec<String>),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn errors(&self) -> &[String] {
        match self {
            Self::Valid(_) => &[],
            Self::Invalid(errors) => errors,
        }
    }

    pub fn into_result(self) -> Result<ValidatedBill, Vec<String>> {
        match self {
            Self::Valid(validated) => Ok(validated),
            Self::Invalid(errors) => Err(errors),
        }
    }
}
