//! # configs
//!
//! Layered settings: built-in defaults, then `config/default.toml`, then
//! `config/local.toml`, then `GATEPOST__*` environment variables (a `.env`
//! file is loaded into the environment first). Later layers win.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub log: LogSettings,
    pub admin: AdminSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// A `sqlite:` URL, or `memory` for the in-process store.
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseSettings {
    pub fn is_memory(&self) -> bool {
        self.url.eq_ignore_ascii_case("memory")
    }
}

#[derive(Debug, Deserialize)]
pub struct JwtSettings {
    #[serde(deserialize_with = "secret")]
    pub secret: SecretString,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directives, used when `RUST_LOG` is unset.
    pub filter: String,
    pub json: bool,
}

/// The administrator guaranteed at startup. Seeding is skipped while
/// `password` is unset.
#[derive(Debug, Deserialize)]
pub struct AdminSettings {
    pub username: String,
    pub email: String,
    #[serde(default, deserialize_with = "optional_secret")]
    pub password: Option<SecretString>,
    pub age_group: String,
}

fn secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

fn optional_secret<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<SecretString>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|s| !s.is_empty())
        .map(SecretString::from))
}

/// Built-in defaults, suitable for local development apart from the JWT
/// secret, which must always be supplied.
pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("database.url", "sqlite:gatepost.db")?
        .set_default("database.max_connections", 5)?
        .set_default("jwt.secret", "")?
        .set_default("jwt.issuer", "gatepost")?
        .set_default("jwt.audience", "gatepost-clients")?
        .set_default("jwt.ttl_minutes", 30)?
        .set_default("log.filter", "info,gatepost=debug")?
        .set_default("log.json", false)?
        .set_default("admin.username", "admin")?
        .set_default("admin.email", "admin@gatepost.local")?
        .set_default("admin.age_group", "Adult")?)
}

impl Settings {
    /// Loads settings from every layer.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "ignoring unreadable .env file");
            }
        }

        Self::from_builder(
            defaults()?
                .add_source(File::with_name("config/default").required(false))
                .add_source(File::with_name("config/local").required(false))
                .add_source(
                    Environment::with_prefix("GATEPOST")
                        .prefix_separator("__")
                        .separator("__")
                        .try_parsing(true),
                ),
        )
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.expose_secret().trim().is_empty() {
            return Err(ConfigError::Invalid(
                "jwt.secret must be set (GATEPOST__JWT__SECRET)".into(),
            ));
        }
        if self.jwt.ttl_minutes <= 0 {
            return Err(ConfigError::Invalid("jwt.ttl_minutes must be positive".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn with_toml(toml: &str) -> Result<Settings, ConfigError> {
        Settings::from_builder(defaults().unwrap().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    #[test]
    fn test_defaults_with_secret() {
        let settings = with_toml("[jwt]\nsecret = \"s3cret\"").unwrap();
        assert_eq!(settings.server.bind_addr(), "127.0.0.1:8080");
        assert_eq!(settings.jwt.ttl_minutes, 30);
        assert_eq!(settings.jwt.secret.expose_secret(), "s3cret");
        assert!(!settings.database.is_memory());
        assert!(settings.admin.password.is_none());
        assert!(!settings.log.json);
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        assert!(matches!(with_toml(""), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_non_positive_ttl_is_rejected() {
        let err = with_toml("[jwt]\nsecret = \"x\"\nttl_minutes = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_overrides_apply() {
        let settings = with_toml(
            "[server]\nport = 9000\n[database]\nurl = \"memory\"\n[jwt]\nsecret = \"x\"\n[admin]\npassword = \"Admin123\"",
        )
        .unwrap();
        assert_eq!(settings.server.port, 9000);
        assert!(settings.database.is_memory());
        assert_eq!(
            settings.admin.password.as_ref().map(|p| p.expose_secret().to_string()),
            Some("Admin123".to_string())
        );
    }

    #[test]
    fn test_secrets_are_redacted_in_debug_output() {
        let settings = with_toml("[jwt]\nsecret = \"do-not-print\"").unwrap();
        assert!(!format!("{settings:?}").contains("do-not-print"));
    }
}
