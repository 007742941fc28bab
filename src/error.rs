// Copyright (c) 2026 rezky_nightky

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid color: {0} (expected #rrggbb or #rgb)")]
    InvalidColor(String),

    #[error("invalid date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("failed to apply {name} {value} (min {min} max {max})")]
    OutOfRange {
        name: &'static str,
        value: String,
        min: String,
        max: String,
    },

    #[error("invalid {name}: {reason}")]
    InvalidOption { name: &'static str, reason: String },
}

impl Error {
    pub fn out_of_range(
        name: &'static str,
        value: impl ToString,
        min: impl ToString,
        max: impl ToString,
    ) -> Self {
        Self::OutOfRange {
            name,
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }

    pub fn invalid_option(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            name,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_errors_keep_the_cli_wording() {
        let e = Error::out_of_range("--fps", 500, 1, 240);
        assert_eq!(e.to_string(), "failed to apply --fps 500 (min 1 max 240)");
    }

    #[test]
    fn option_errors_name_the_flag() {
        let e = Error::invalid_option("--colormode", "allowed: 0,16,8,24");
        assert!(e.to_string().starts_with("invalid --colormode"));
    }
}
