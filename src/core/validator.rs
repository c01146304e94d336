use crate::domain::model::{Bill, BillForm, ValidatedBill, ValidationOutcome};
use crate::domain::ports::BillValidator;
use crate::utils::validation::{char_count_between, in_range};
use chrono::{DateTime, Local};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

pub const DESCRIPTION_ERROR: &str = "Description must be between 3 and 20 characters.";
pub const PRICE_ERROR: &str = "Price must be a valid number greater than 0.";
pub const ITEMS_ERROR: &str = "Items must be an integer between 0 and 5.";
pub const FILENAME_ERROR: &str =
    "Filename must be 1-10 characters long and contain only letters, numbers, or underscores.";

const DESCRIPTION_MIN_CHARS: usize = 3;
const DESCRIPTION_MAX_CHARS: usize = 20;
const ITEMS_MIN: i64 = 0;
const ITEMS_MAX: i64 = 5;
const PRICE_DECIMAL_PLACES: u32 = 2;

static FILE_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_]{1,10}$").expect("file name pattern is a valid regex")
});

// Languages whose conventions use a comma as the decimal separator.
const DOT_GROUPED: &[&str] = &[
    "da", "de", "el", "es", "hr", "id", "it", "nl", "pt", "ro", "sl", "sr", "tr", "vi",
];
const SPACE_GROUPED: &[&str] = &[
    "bg", "cs", "et", "fi", "fr", "hu", "lt", "lv", "nb", "no", "pl", "ru", "sk", "sv", "uk",
];

/// Decimal and digit-grouping separators used to read a typed price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberLocale {
    pub decimal_separator: char,
    pub group_separator: char,
}

impl NumberLocale {
    pub const INVARIANT: Self = Self {
        decimal_separator: '.',
        group_separator: ',',
    };

    /// Resolves the locale from `LC_ALL`, `LC_NUMERIC`, then `LANG`.
    pub fn from_env() -> Self {
        ["LC_ALL", "LC_NUMERIC", "LANG"]
            .iter()
            .filter_map(|key| std::env::var(key).ok())
            .find(|value| !value.trim().is_empty())
            .map(|tag| Self::for_language_tag(&tag))
            .unwrap_or(Self::INVARIANT)
    }

    /// Accepts POSIX (`de_DE.UTF-8`) and BCP 47 (`de-DE`) tags.
    pub fn for_language_tag(tag: &str) -> Self {
        let language = tag
            .split(['_', '-', '.', '@'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        if DOT_GROUPED.contains(&language.as_str()) {
            Self {
                decimal_separator: ',',
                group_separator: '.',
            }
        } else if SPACE_GROUPED.contains(&language.as_str()) {
            Self {
                decimal_separator: ',',
                group_separator: ' ',
            }
        } else {
            Self::INVARIANT
        }
    }

    /// Replaces the decimal separator, moving the group separator out of
    /// its way when the two would collide.
    pub fn with_decimal_separator(self, decimal_separator: char) -> Self {
        let group_separator = if self.group_separator != decimal_separator {
            self.group_separator
        } else if decimal_separator == ',' {
            '.'
        } else {
            ','
        };
        Self {
            decimal_separator,
            group_separator,
        }
    }

    pub fn with_group_separator(self, group_separator: char) -> Self {
        let decimal_separator = if self.decimal_separator != group_separator {
            self.decimal_separator
        } else if group_separator == '.' {
            ','
        } else {
            '.'
        };
        Self {
            decimal_separator,
            group_separator,
        }
    }

    /// Parses an optionally signed number with grouped integer digits and
    /// at most one decimal separator.
    pub fn parse_decimal(&self, text: &str) -> Option<Decimal> {
        let text = text.trim();
        let (negative, body) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };

        let mut normalized = String::with_capacity(body.len() + 1);
        let mut seen_digit = false;
        let mut seen_decimal = false;

        for ch in body.chars() {
            if ch.is_ascii_digit() {
                normalized.push(ch);
                seen_digit = true;
            } else if ch == self.decimal_separator && !seen_decimal {
                if normalized.is_empty() {
                    normalized.push('0');
                }
                normalized.push('.');
                seen_decimal = true;
            } else if ch == self.group_separator && seen_digit && !seen_decimal {
                continue;
            } else {
                return None;
            }
        }

        if !seen_digit {
            return None;
        }

        let value = Decimal::from_str(normalized.trim_end_matches('.')).ok()?;
        Some(if negative { -value } else { value })
    }
}

impl Default for NumberLocale {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Turns raw form text into a [`Bill`] or the list of everything wrong with it.
#[derive(Debug, Clone)]
pub struct BillValidationService {
    locale: NumberLocale,
}

impl BillValidationService {
    pub fn new(locale: NumberLocale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> NumberLocale {
        self.locale
    }

    /// Same as [`BillValidator::validate`] with an explicit creation time.
    pub fn validate_at(&self, form: &BillForm, now: DateTime<Local>) -> ValidationOutcome {
        let description = form.description.trim();
        let price_text = form.price.trim();
        let items_text = form.items.trim();
        let file_name = form.filename.trim();

        let mut errors = Vec::new();

        if !char_count_between(description, DESCRIPTION_MIN_CHARS, DESCRIPTION_MAX_CHARS) {
            errors.push(DESCRIPTION_ERROR.to_string());
        }

        let price = self.parse_price(price_text).filter(|price| *price > Decimal::ZERO);
        if price.is_none() {
            errors.push(PRICE_ERROR.to_string());
        }

        let items = parse_items(items_text);
        if items.is_none() {
            errors.push(ITEMS_ERROR.to_string());
        }

        if !FILE_NAME_PATTERN.is_match(file_name) {
            errors.push(FILENAME_ERROR.to_string());
        }

        match (price, items) {
            (Some(price), Some(items)) if errors.is_empty() => {
                let bill = Bill::new(
                    description.to_string(),
                    price.round_dp(PRICE_DECIMAL_PLACES),
                    items,
                    now,
                );
                tracing::debug!("Validated bill '{}' for file '{}'", description, file_name);
                ValidationOutcome::Valid(ValidatedBill {
                    bill,
                    file_name: file_name.to_string(),
                })
            }
            _ => {
                tracing::debug!("Bill form rejected with {} error(s)", errors.len());
                ValidationOutcome::Invalid(errors)
            }
        }
    }

    fn parse_price(&self, text: &str) -> Option<Decimal> {
        self.locale
            .parse_decimal(text)
            .or_else(|| NumberLocale::INVARIANT.parse_decimal(text))
    }
}

impl Default for BillValidationService {
    fn default() -> Self {
        Self::new(NumberLocale::from_env())
    }
}

impl BillValidator for BillValidationService {
    fn validate(&self, form: &BillForm) -> ValidationOutcome {
        self.validate_at(form, Local::now())
    }
}

fn parse_items(text: &str) -> Option<u8> {
    text.parse::<i64>()
        .ok()
        .filter(|items| in_range(*items, ITEMS_MIN, ITEMS_MAX))
        .and_then(|items| u8::try_from(items).ok())
}
