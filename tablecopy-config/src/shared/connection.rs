use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sqlx::mysql::{MySqlConnectOptions, MySqlSslMode};

use crate::shared::ValidationError;

/// Connection settings for one MySQL database.
#[derive(Debug, Clone, Deserialize)]
pub struct MySqlConnectionConfig {
    pub host: String,
    pub port: u16,
    /// Database (schema) name used as the connection default.
    pub name: String,
    pub username: String,
    pub password: Option<SecretString>,
    #[serde(default = "TlsConfig::disabled")]
    pub tls: TlsConfig,
}

impl MySqlConnectionConfig {
    /// Connection options without a default database.
    ///
    /// Used to create or drop databases before connecting to them.
    pub fn without_db(&self) -> MySqlConnectOptions {
        let ssl_mode = if self.tls.enabled {
            MySqlSslMode::VerifyIdentity
        } else {
            MySqlSslMode::Preferred
        };

        let mut options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .ssl_mode(ssl_mode);

        if self.tls.enabled {
            options = options.ssl_ca_from_pem(self.tls.trusted_root_certs.clone().into_bytes());
        }

        if let Some(password) = &self.password {
            options = options.password(password.expose_secret());
        }

        options
    }

    /// Connection options with [`MySqlConnectionConfig::name`] as the default database.
    pub fn with_db(&self) -> MySqlConnectOptions {
        self.without_db().database(&self.name)
    }

    pub(crate) fn validate(&self, section: &'static str) -> Result<(), ValidationError> {
        self.tls.validate(section)
    }
}

/// [`MySqlConnectionConfig`] with the password removed, safe to log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MySqlConnectionConfigWithoutSecrets {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub username: String,
    pub tls: TlsConfig,
}

impl From<MySqlConnectionConfig> for MySqlConnectionConfigWithoutSecrets {
    fn from(value: MySqlConnectionConfig) -> Self {
        MySqlConnectionConfigWithoutSecrets {
            host: value.host,
            port: value.port,
            name: value.name,
            username: value.username,
            tls: value.tls,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    #[serde(default)]
    pub trusted_root_certs: String,
    pub enabled: bool,
}

impl TlsConfig {
    pub fn disabled() -> Self {
        Self {
            trusted_root_certs: "".to_string(),
            enabled: false,
        }
    }

    fn validate(&self, section: &'static str) -> Result<(), ValidationError> {
        if self.enabled && self.trusted_root_certs.trim().is_empty() {
            return Err(ValidationError::MissingTrustedRootCerts(section));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(tls: TlsConfig) -> MySqlConnectionConfig {
        MySqlConnectionConfig {
            host: "localhost".to_string(),
            port: 3306,
            name: "sakila".to_string(),
            username: "root".to_string(),
            password: Some(SecretString::new("secret".to_string())),
            tls,
        }
    }

    #[test]
    fn enabled_tls_requires_root_certs() {
        let err = config(TlsConfig {
            trusted_root_certs: " ".to_string(),
            enabled: true,
        })
        .validate("source")
        .unwrap_err();

        assert!(matches!(err, ValidationError::MissingTrustedRootCerts("source")));
    }

    #[test]
    fn disabled_tls_is_valid() {
        assert!(config(TlsConfig::disabled()).validate("target").is_ok());
    }

    #[test]
    fn options_carry_database_name() {
        let options = config(TlsConfig::disabled()).with_db();

        assert_eq!(options.get_host(), "localhost");
        assert_eq!(options.get_port(), 3306);
        assert_eq!(options.get_database(), Some("sakila"));
        assert_eq!(options.get_username(), "root");
    }

    #[test]
    fn without_secrets_drops_password() {
        let without: MySqlConnectionConfigWithoutSecrets = config(TlsConfig::disabled()).into();
        let json = serde_json::to_string(&without).unwrap();

        assert!(!json.contains("secret"));
        assert!(json.contains("sakila"));
    }
}
