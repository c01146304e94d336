use crate::utils::error::ConfigError;

pub trait Validate {
    fn validate(&self) -> Result<(), ConfigError>;
}

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<(), ConfigError> {
    if path.trim().is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }

    Ok(())
}

/// Separators must be printable and must not be confused with digits or signs.
pub fn validate_separator(field_name: &str, separator: char) -> Result<(), ConfigError> {
    if separator.is_ascii_digit() || separator == '+' || separator == '-' {
        return Err(invalid(
            field_name,
            separator,
            "Separator cannot be a digit or a sign",
        ));
    }

    if separator.is_control() {
        return Err(invalid(
            field_name,
            separator.escape_default(),
            "Separator cannot be a control character",
        ));
    }

    Ok(())
}

pub fn validate_distinct(
    field_name: &str,
    first: char,
    second: char,
) -> Result<(), ConfigError> {
    if first == second {
        return Err(invalid(
            field_name,
            first,
            "Decimal and group separators must differ",
        ));
    }
    Ok(())
}

/// Counts characters, not bytes, so multi-byte descriptions measure like typed text.
pub fn char_count_between(value: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&value.chars().count())
}

pub fn in_range<T: PartialOrd>(value: T, min: T, max: T) -> bool {
    value >= min && value <= max
}
