//! Handles settings for the application.
//!
//! Values come from an optional `settings.toml` in the working directory,
//! overridden by `MOMONO__<SECTION>__<KEY>` environment variables.
use config::{Config, ConfigError, Environment, File, builder::DefaultState};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Self::Sqlite("momono.sqlite".to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct Server {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub database: Database,
    pub auth: Auth,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    6543
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_token_ttl_hours() -> i64 {
    1
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(
                Environment::with_prefix("MOMONO")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins"),
            );
        Self::from_builder(builder)
    }

    fn from_builder(builder: config::ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "auth.jwt_secret must not be empty".to_string(),
            ));
        }
        if !(1..=server::MAX_TOKEN_TTL_HOURS).contains(&self.auth.token_ttl_hours) {
            return Err(ConfigError::Message(format!(
                "auth.token_ttl_hours must be between 1 and {}",
                server::MAX_TOKEN_TTL_HOURS
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(toml: &str) -> Result<Settings, ConfigError> {
        Settings::from_builder(
            Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
        )
    }

    #[test]
    fn only_the_secret_is_mandatory() {
        let settings = parse("[auth]\njwt_secret = \"s3cret\"\n").unwrap();
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.server.bind, "127.0.0.1");
        assert_eq!(settings.server.port, 6543);
        assert_eq!(settings.server.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(
            settings.database,
            Database::Sqlite("momono.sqlite".to_string())
        );
        assert_eq!(settings.auth.token_ttl_hours, 1);
    }

    #[test]
    fn full_file_is_read() {
        let settings = parse(
            r#"
database = "memory"

[app]
level = "debug"

[server]
bind = "0.0.0.0"
port = 8080
cors_origins = ["https://momono.example"]

[auth]
jwt_secret = "s3cret"
token_ttl_hours = 12
"#,
        )
        .unwrap();
        assert_eq!(settings.app.level, "debug");
        assert_eq!(settings.server.bind, "0.0.0.0");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.cors_origins, vec!["https://momono.example"]);
        assert_eq!(settings.database, Database::Memory);
        assert_eq!(settings.auth.token_ttl_hours, 12);
    }

    #[test]
    fn sqlite_path_is_read() {
        let settings = parse(
            "[database]\nsqlite = \"/var/lib/momono/db.sqlite\"\n\n[auth]\njwt_secret = \"x\"\n",
        )
        .unwrap();
        assert_eq!(
            settings.database,
            Database::Sqlite("/var/lib/momono/db.sqlite".to_string())
        );
    }

    #[test]
    fn missing_or_empty_secret_is_an_error() {
        assert!(parse("[app]\nlevel = \"info\"\n").is_err());
        assert!(parse("[auth]\njwt_secret = \"  \"\n").is_err());
        assert!(parse("[auth]\njwt_secret = \"x\"\ntoken_ttl_hours = 0\n").is_err());
    }

    #[test]
    fn token_ttl_is_bounded_to_a_year() {
        assert!(parse("[auth]\njwt_secret = \"x\"\ntoken_ttl_hours = 8760\n").is_ok());
        assert!(parse("[auth]\njwt_secret = \"x\"\ntoken_ttl_hours = 8761\n").is_err());
        assert!(
            parse("[auth]\njwt_secret = \"x\"\ntoken_ttl_hours = 9223372036854775807\n")
                .is_err()
        );
    }
}
