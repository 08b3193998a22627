use std::env;
use std::str::FromStr;

use crate::error::ConfigError;

/// Reads an environment variable, falling back to `default` when unset.
#[must_use]
pub fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Reads an optional environment variable, returning `None` when unset or empty.
#[must_use]
pub fn var_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

/// Reads and parses an environment variable, falling back to `default` when
/// unset. Returns [`ConfigError::InvalidValue`] if the variable is set but
/// fails to parse.
pub fn var_parsed<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Reads a boolean-valued environment variable (`true`/`false`, `1`/`0`,
/// `yes`/`no`, case-insensitive), falling back to `default` when unset.
pub fn var_bool(key: &str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                reason: format!("expected a boolean, found {other:?}"),
            }),
        },
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn var_or_falls_back_when_unset() {
        env::remove_var("ALMWORK_TEST_VAR_OR");
        assert_eq!(var_or("ALMWORK_TEST_VAR_OR", "fallback"), "fallback");
    }

    #[test]
    #[serial]
    fn var_parsed_reports_invalid_value() {
        env::set_var("ALMWORK_TEST_VAR_PARSED", "not-a-number");
        let result = var_parsed::<u16>("ALMWORK_TEST_VAR_PARSED", 0);
        env::remove_var("ALMWORK_TEST_VAR_PARSED");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    #[serial]
    fn var_bool_accepts_common_spellings() {
        env::set_var("ALMWORK_TEST_VAR_BOOL", "Yes");
        assert!(var_bool("ALMWORK_TEST_VAR_BOOL", false).unwrap());
        env::remove_var("ALMWORK_TEST_VAR_BOOL");
    }
}
