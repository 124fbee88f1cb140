//! Configuration types for servicenow-connect
//!
//! One adapter instance targets exactly one ServiceNow instance and one
//! table. Configuration is loaded from YAML with `${VAR}` environment
//! expansion, validated once at adapter construction, and immutable after.

use crate::error::{ConnectorError, Result};
use schemars::JsonSchema;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use validator::Validate;

/// Pre-compiled regex for environment variable expansion
/// Pattern: ${VAR} or ${VAR:-default}
static ENV_VAR_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_]*)(?::-([^}]*))?\}")
        .expect("env var regex pattern is invalid - this is a bug")
});

/// Connection options for one ServiceNow instance and one table
#[derive(Debug, Clone, Deserialize, Serialize, Validate, JsonSchema)]
pub struct ServiceNowConfig {
    /// Instance base URL (e.g., `https://dev12345.service-now.com`)
    #[validate(url)]
    pub url: String,

    /// Basic auth credentials
    #[validate(nested)]
    pub auth: AuthConfig,

    /// Target table of the table API (e.g., `change_request`)
    #[serde(rename = "serviceNowTable")]
    #[validate(length(min = 1))]
    pub service_now_table: String,

    /// Request timeout in seconds (default: 30). Enforced by the HTTP
    /// client; the connector itself imposes no bound.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

/// Basic auth credentials for the instance
#[derive(Debug, Clone, Deserialize, Serialize, Validate, JsonSchema)]
pub struct AuthConfig {
    /// Login username
    #[validate(length(min = 1))]
    pub username: String,

    /// Login password, redacted everywhere except at authentication
    pub password: Secret,
}

impl ServiceNowConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        // Expand environment variables
        let expanded = Self::expand_env_vars(&content);

        let config: Self = serde_yaml::from_str(&expanded)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;

        config.validate_required()?;
        Ok(config)
    }

    /// Expand environment variables in the format ${VAR} or ${VAR:-default}
    fn expand_env_vars(content: &str) -> String {
        ENV_VAR_REGEX
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                let default = caps.get(2).map(|m| m.as_str());

                std::env::var(var_name).unwrap_or_else(|_| default.unwrap_or("").to_string())
            })
            .to_string()
    }

    /// Reject any empty required property, naming it.
    ///
    /// Serde already rejects structurally absent keys at deserialization;
    /// this catches properties that are present but empty, which the adapter
    /// treats the same as absent.
    pub fn validate_required(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Self::missing("url"));
        }
        if self.auth.username.trim().is_empty() {
            return Err(Self::missing("auth.username"));
        }
        if self.auth.password.expose().is_empty() {
            return Err(Self::missing("auth.password"));
        }
        if self.service_now_table.trim().is_empty() {
            return Err(Self::missing("serviceNowTable"));
        }
        Ok(())
    }

    fn missing(field: &str) -> ConnectorError {
        ConnectorError::config(format!("adapter property \"{}\" required", field))
    }
}

/// A wrapper around `SecretString` for the instance password.
///
/// Redacts the value in `Debug`, `Display`, and serialized output so
/// credentials never leak into logs or config dumps. Call [`Secret::expose`]
/// at the point of authentication only.
#[derive(Clone)]
pub struct Secret(SecretString);

impl Secret {
    /// Create a new secret from any string-like value
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::new(value.into().into_boxed_str()))
    }

    /// Expose the secret value
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[redacted]")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[redacted]")
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Serialize for Secret {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str("[redacted]")
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::new(value))
    }
}

impl JsonSchema for Secret {
    fn schema_name() -> String {
        "Secret".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        // Schema looks like a normal string but with format hint
        let mut schema = gen.subschema_for::<String>();
        if let schemars::schema::Schema::Object(obj) = &mut schema {
            obj.format = Some("password".to_string());
            obj.metadata().description =
                Some("Sensitive value. Redacted in logs and config dumps.".to_string());
        }
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ServiceNowConfig {
        ServiceNowConfig {
            url: "https://dev12345.service-now.com".to_string(),
            auth: AuthConfig {
                username: "admin".to_string(),
                password: Secret::new("hunter2"),
            },
            service_now_table: "change_request".to_string(),
            timeout_secs: 30,
        }
    }

    #[test]
    fn test_deserialize_yaml() {
        let yaml = r#"
            url: https://dev12345.service-now.com
            auth:
              username: admin
              password: hunter2
            serviceNowTable: change_request
        "#;

        let config: ServiceNowConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.url, "https://dev12345.service-now.com");
        assert_eq!(config.auth.username, "admin");
        assert_eq!(config.auth.password.expose(), "hunter2");
        assert_eq!(config.service_now_table, "change_request");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_deserialize_missing_key_names_key() {
        let yaml = r#"
            url: https://dev12345.service-now.com
            serviceNowTable: change_request
        "#;

        let err = serde_yaml::from_str::<ServiceNowConfig>(yaml)
            .unwrap_err()
            .to_string();
        assert!(err.contains("auth"), "error should name the key: {}", err);
    }

    #[test]
    fn test_validate_required_passes_on_complete_config() {
        assert!(valid_config().validate_required().is_ok());
    }

    #[test]
    fn test_validate_required_names_empty_field() {
        let cases = [
            ("url", {
                let mut c = valid_config();
                c.url = String::new();
                c
            }),
            ("auth.username", {
                let mut c = valid_config();
                c.auth.username = String::new();
                c
            }),
            ("auth.password", {
                let mut c = valid_config();
                c.auth.password = Secret::new("");
                c
            }),
            ("serviceNowTable", {
                let mut c = valid_config();
                c.service_now_table = String::new();
                c
            }),
        ];

        for (field, config) in cases {
            let err = config.validate_required().unwrap_err();
            assert!(err.is_config());
            assert_eq!(
                err.to_string(),
                format!("configuration error: adapter property \"{}\" required", field)
            );
        }
    }

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("SNC_TEST_PASSWORD", "from-env");

        let expanded = ServiceNowConfig::expand_env_vars(
            "password: ${SNC_TEST_PASSWORD}\ntable: ${SNC_TEST_UNSET:-change_request}",
        );
        assert_eq!(expanded, "password: from-env\ntable: change_request");

        std::env::remove_var("SNC_TEST_PASSWORD");
    }

    #[test]
    fn test_secret_redacted_everywhere() {
        let secret = Secret::new("hunter2");

        assert_eq!(format!("{:?}", secret), "[redacted]");
        assert_eq!(format!("{}", secret), "[redacted]");
        assert_eq!(
            serde_json::to_string(&secret).unwrap(),
            "\"[redacted]\""
        );
        assert_eq!(secret.expose(), "hunter2");
    }

    #[test]
    fn test_config_serialization_redacts_password() {
        let dumped = serde_yaml::to_string(&valid_config()).unwrap();
        assert!(!dumped.contains("hunter2"));
        assert!(dumped.contains("[redacted]"));
    }

    #[test]
    fn test_validator_derive() {
        assert!(valid_config().validate().is_ok());

        let mut bad = valid_config();
        bad.url = "not a url".to_string();
        assert!(bad.validate().is_err());
    }
}
