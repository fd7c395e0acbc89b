//! Session configuration.
//!
//! Options can be built in code, deserialized with serde, or parsed from a
//! connection-string style `key=value&key=value` list:
//!
//! ```
//! use rowbridge_rs::SessionConfig;
//!
//! let config: SessionConfig = "prepared_statements=true&statement_limit=50".parse().unwrap();
//! assert_eq!(config.effective_capacity(), 50);
//! ```

use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

/// Statement cache size used when no limit is configured.
pub const DEFAULT_STATEMENT_LIMIT: i64 = 1000;

/// Options of a [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cache prepared statements between executions.
    pub prepared_statements: bool,
    /// Maximum number of cached statements. `None` means
    /// [`DEFAULT_STATEMENT_LIMIT`]; zero or less disables the cache.
    pub statement_limit: Option<i64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            prepared_statements: true,
            statement_limit: None,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn with_prepared_statements(mut self, enabled: bool) -> Self {
        self.prepared_statements = enabled;
        self
    }

    #[must_use]
    pub fn with_statement_limit(mut self, limit: i64) -> Self {
        self.statement_limit = Some(limit);
        self
    }

    /// Statement cache capacity these options resolve to.
    ///
    /// 0 when prepared statements are off, otherwise the configured limit or
    /// [`DEFAULT_STATEMENT_LIMIT`].
    pub fn effective_capacity(&self) -> i64 {
        if !self.prepared_statements {
            return 0;
        }
        self.statement_limit.unwrap_or(DEFAULT_STATEMENT_LIMIT)
    }
}

impl FromStr for SessionConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut config = SessionConfig::default();

        for pair in s.split('&').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| ConfigError::Malformed(pair.to_string()))?;
            let (key, value) = (key.trim(), value.trim());
            let invalid = || ConfigError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
            };

            match key {
                "prepared_statements" => {
                    config.prepared_statements = parse_bool(value).ok_or_else(invalid)?;
                }
                "statement_limit" => {
                    config.statement_limit = Some(value.parse::<i64>().map_err(|_| invalid())?);
                }
                other => return Err(ConfigError::UnknownOption(other.to_string())),
            }
        }

        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert!(config.prepared_statements);
        assert_eq!(config.statement_limit, None);
        assert_eq!(config.effective_capacity(), DEFAULT_STATEMENT_LIMIT);
    }

    #[test]
    fn test_prepared_statements_off_disables_cache() {
        let config = SessionConfig::default()
            .with_statement_limit(20)
            .with_prepared_statements(false);
        assert_eq!(config.effective_capacity(), 0);
    }

    #[test]
    fn test_parse_options() {
        let config: SessionConfig = "statement_limit=25 & prepared_statements=on".parse().unwrap();
        assert_eq!(config.effective_capacity(), 25);

        let config: SessionConfig = "prepared_statements=0".parse().unwrap();
        assert!(!config.prepared_statements);

        let config: SessionConfig = "statement_limit=-1".parse().unwrap();
        assert_eq!(config.effective_capacity(), -1);

        assert_eq!("".parse::<SessionConfig>().unwrap(), SessionConfig::default());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "statement_limit".parse::<SessionConfig>(),
            Err(ConfigError::Malformed("statement_limit".to_string()))
        );
        assert_eq!(
            "pool_size=4".parse::<SessionConfig>(),
            Err(ConfigError::UnknownOption("pool_size".to_string()))
        );
        assert_eq!(
            "statement_limit=lots".parse::<SessionConfig>(),
            Err(ConfigError::InvalidValue {
                key: "statement_limit".to_string(),
                value: "lots".to_string(),
            })
        );
        assert!(matches!(
            "prepared_statements=maybe".parse::<SessionConfig>(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_deserialize() {
        let config: SessionConfig = serde_json::from_str(r#"{"statement_limit": 3}"#).unwrap();
        assert!(config.prepared_statements);
        assert_eq!(config.effective_capacity(), 3);

        let config: SessionConfig =
            serde_json::from_str(r#"{"prepared_statements": false}"#).unwrap();
        assert_eq!(config.effective_capacity(), 0);
    }
}
