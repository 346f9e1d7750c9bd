use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Validation bounds for the metrics resource.
///
/// Every field falls back to [`MetricsConfig::default`] when absent, and
/// unknown keys are rejected so that operator typos surface at startup.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsConfig {
    /// Resource types that metrics may be recorded against.
    pub allowed_types: Vec<String>,
    /// Maximum key length, in characters.
    pub max_key_length: usize,
    /// Reject negative values when set.
    pub only_positive_values: bool,
    /// Default page size for list requests.
    pub pagination_limit: usize,
    /// Upper bound for the `limit` query parameter.
    pub max_pagination_limit: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            allowed_types: vec!["post".to_string()],
            max_key_length: 255,
            only_positive_values: false,
            pagination_limit: 50,
            max_pagination_limit: 200,
        }
    }
}

impl MetricsConfig {
    /// Checks every bound and reports the first one violated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_types.is_empty() {
            return Err(ConfigError::new("allowed_types cannot be empty"));
        }

        let mut seen = HashSet::new();
        for resource_type in &self.allowed_types {
            if resource_type.is_empty() {
                return Err(ConfigError::new(
                    "allowed_types cannot contain empty strings",
                ));
            }
            if !seen.insert(resource_type.as_str()) {
                return Err(ConfigError::new(format!(
                    "duplicate type in allowed_types: {}",
                    resource_type
                )));
            }
        }

        if !(1..=255).contains(&self.max_key_length) {
            return Err(ConfigError::new("max_key_length must be between 1 and 255"));
        }

        if self.pagination_limit < 1 || self.pagination_limit > self.max_pagination_limit {
            return Err(ConfigError::new(
                "pagination_limit must be between 1 and max_pagination_limit",
            ));
        }

        if !(1..=1000).contains(&self.max_pagination_limit) {
            return Err(ConfigError::new(
                "max_pagination_limit must be between 1 and 1000",
            ));
        }

        Ok(())
    }

    /// Exact, case-sensitive membership test against `allowed_types`.
    pub fn is_allowed_type(&self, resource_type: &str) -> bool {
        self.allowed_types.iter().any(|allowed| allowed == resource_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_types(types: &[&str]) -> MetricsConfig {
        MetricsConfig {
            allowed_types: types.iter().map(|t| t.to_string()).collect(),
            ..MetricsConfig::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = MetricsConfig::default();
        assert_eq!(config.allowed_types, vec!["post".to_string()]);
        assert_eq!(config.max_key_length, 255);
        assert!(!config.only_positive_values);
        assert_eq!(config.pagination_limit, 50);
        assert_eq!(config.max_pagination_limit, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_allowed_types_rejected() {
        let err = config_with_types(&[]).validate().unwrap_err();
        assert_eq!(err.to_string(), "allowed_types cannot be empty");
    }

    #[test]
    fn test_empty_string_type_rejected() {
        let err = config_with_types(&["post", ""]).validate().unwrap_err();
        assert_eq!(err.to_string(), "allowed_types cannot contain empty strings");
    }

    #[test]
    fn test_duplicate_type_names_first_duplicate() {
        let err = config_with_types(&["post", "user", "user", "post"])
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "duplicate type in allowed_types: user");
    }

    #[test]
    fn test_max_key_length_bounds() {
        for bad in [0, 256] {
            let config = MetricsConfig {
                max_key_length: bad,
                ..MetricsConfig::default()
            };
            assert_eq!(
                config.validate().unwrap_err().to_string(),
                "max_key_length must be between 1 and 255"
            );
        }
        let config = MetricsConfig {
            max_key_length: 1,
            ..MetricsConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pagination_limit_above_max_rejected() {
        let config = MetricsConfig {
            pagination_limit: 100,
            max_pagination_limit: 50,
            ..MetricsConfig::default()
        };
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "pagination_limit must be between 1 and max_pagination_limit"
        );
    }

    #[test]
    fn test_zero_pagination_limit_rejected() {
        let config = MetricsConfig {
            pagination_limit: 0,
            ..MetricsConfig::default()
        };
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "pagination_limit must be between 1 and max_pagination_limit"
        );
    }

    #[test]
    fn test_max_pagination_limit_ceiling() {
        let config = MetricsConfig {
            pagination_limit: 50,
            max_pagination_limit: 1001,
            ..MetricsConfig::default()
        };
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "max_pagination_limit must be between 1 and 1000"
        );
    }

    #[test]
    fn test_only_first_violation_reported() {
        let config = MetricsConfig {
            allowed_types: vec![],
            max_key_length: 0,
            pagination_limit: 0,
            max_pagination_limit: 0,
            only_positive_values: true,
        };
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "allowed_types cannot be empty"
        );
    }

    #[test]
    fn test_is_allowed_type_is_exact() {
        let config = config_with_types(&["post", "user"]);
        assert!(config.is_allowed_type("post"));
        assert!(config.is_allowed_type("user"));
        assert!(!config.is_allowed_type("Post"));
        assert!(!config.is_allowed_type("post "));
        assert!(!config.is_allowed_type(""));
        assert!(!config.is_allowed_type("comment"));
    }

    #[test]
    fn test_decode_partial_settings_uses_defaults() {
        let config: MetricsConfig = serde_json::from_value(serde_json::json!({
            "allowed_types": ["post", "product"],
            "max_key_length": 100,
        }))
        .unwrap();
        assert_eq!(config.allowed_types, vec!["post", "product"]);
        assert_eq!(config.max_key_length, 100);
        assert_eq!(config.pagination_limit, 50);
    }

    #[test]
    fn test_decode_rejects_unknown_and_mistyped_keys() {
        let unknown = serde_json::from_value::<MetricsConfig>(serde_json::json!({
            "allowed_type": ["post"],
        }));
        assert!(unknown.is_err());

        let mistyped = serde_json::from_value::<MetricsConfig>(serde_json::json!({
            "max_key_length": "long",
        }));
        assert!(mistyped.is_err());
    }
}
