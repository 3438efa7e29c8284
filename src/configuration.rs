use crate::error::ConfigError;

const DEFAULT_CONFIG_FILE: &str = "configuration";

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    #[serde(default)]
    pub http: HttpSettings,
    pub jwt: JwtSettings,
    /// Postgres user store; the in-memory store is used when absent
    #[serde(default)]
    pub database: Option<DatabaseSettings>,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    #[serde(default = "default_hash_cost")]
    pub password_hash_cost: u32,
}

/// Cookie names and route prefix used by the HTTP adapter
#[derive(serde::Deserialize, Clone, Debug)]
pub struct HttpSettings {
    pub api_version: String,
    pub access_cookie_name: String,
    pub refresh_cookie_name: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            api_version: "/auth/v1".to_string(),
            access_cookie_name: "access".to_string(),
            refresh_cookie_name: "refresh".to_string(),
        }
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_seconds)
    }
}

/// JWT signing settings
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_ttl: i64,  // seconds (e.g., 900 for 15 minutes)
    pub refresh_token_ttl: i64, // seconds (e.g., 604800 for 7 days)
}

/// Longest token lifetime accepted from configuration (100 years)
const MAX_TOKEN_TTL_SECONDS: i64 = 100 * 365 * 24 * 60 * 60;

impl JwtSettings {
    pub fn access_ttl(&self) -> chrono::Duration {
        ttl_from_seconds(self.access_token_ttl)
    }

    pub fn refresh_ttl(&self) -> chrono::Duration {
        ttl_from_seconds(self.refresh_token_ttl)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()));
        }
        validate_ttl("jwt.access_token_ttl", self.access_token_ttl)?;
        validate_ttl("jwt.refresh_token_ttl", self.refresh_token_ttl)?;
        Ok(())
    }
}

/// Seconds past what a `Duration` can hold clamp to its bounds, so token
/// issuance reports them instead of panicking here.
fn ttl_from_seconds(seconds: i64) -> chrono::Duration {
    chrono::Duration::try_seconds(seconds).unwrap_or(if seconds < 0 {
        chrono::Duration::MIN
    } else {
        chrono::Duration::MAX
    })
}

fn validate_ttl(name: &str, seconds: i64) -> Result<(), ConfigError> {
    if seconds <= 0 {
        return Err(ConfigError::InvalidValue(format!(
            "{} must be greater than zero",
            name
        )));
    }
    if seconds > MAX_TOKEN_TTL_SECONDS {
        return Err(ConfigError::InvalidValue(format!(
            "{} must not exceed {} seconds",
            name, MAX_TOKEN_TTL_SECONDS
        )));
    }
    Ok(())
}

// The secret stays out of logs
impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"<redacted>")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .finish()
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jwt.validate()?;
        if !self.http.api_version.is_empty() && !self.http.api_version.starts_with('/') {
            return Err(ConfigError::InvalidValue(
                "http.api_version must start with '/'".to_string(),
            ));
        }
        if self.http.access_cookie_name == self.http.refresh_cookie_name {
            return Err(ConfigError::InvalidValue(
                "access and refresh cookie names must differ".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_hash_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_timeout_seconds() -> u64 {
    3
}

/// Load settings once at startup.
///
/// Sources, later ones winning:
/// 1. `configuration.{yaml,toml,json}` (or the file named by `CFG_PATH`)
/// 2. `APP_*` environment variables, `__` separating sections
///    (e.g. `APP_JWT__SECRET`)
/// 3. `JWT_SECRET`
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let config_path =
        std::env::var("CFG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

    let mut builder = config::Config::builder()
        .add_source(config::File::with_name(&config_path).required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        );

    if let Ok(secret) = std::env::var("JWT_SECRET") {
        builder = builder.set_override("jwt.secret", secret)?;
    }

    let settings = builder.build()?.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt(secret: &str, access: i64, refresh: i64) -> JwtSettings {
        JwtSettings {
            secret: secret.to_string(),
            access_token_ttl: access,
            refresh_token_ttl: refresh,
        }
    }

    #[test]
    fn test_valid_jwt_settings() {
        assert!(jwt("secret", 60, 3600).validate().is_ok());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            jwt("", 60, 3600).validate(),
            Err(ConfigError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_non_positive_ttls_rejected() {
        assert!(matches!(
            jwt("secret", 0, 3600).validate(),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            jwt("secret", 60, -5).validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_ttl_conversion() {
        let settings = jwt("secret", 900, 604800);
        assert_eq!(settings.access_ttl(), chrono::Duration::minutes(15));
        assert_eq!(settings.refresh_ttl(), chrono::Duration::days(7));
    }

    #[test]
    fn test_out_of_range_ttls_rejected() {
        assert!(matches!(
            jwt("secret", i64::MAX, 3600).validate(),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            jwt("secret", 60, MAX_TOKEN_TTL_SECONDS + 1).validate(),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(jwt("secret", 60, MAX_TOKEN_TTL_SECONDS).validate().is_ok());
    }

    #[test]
    fn test_unrepresentable_ttl_clamps() {
        let settings = jwt("secret", i64::MAX, i64::MIN);
        assert_eq!(settings.access_ttl(), chrono::Duration::MAX);
        assert_eq!(settings.refresh_ttl(), chrono::Duration::MIN);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", jwt("super-secret", 60, 3600));
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn test_settings_deserialize_with_defaults() {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                application:
                  port: 8080
                jwt:
                  secret: "test"
                  access_token_ttl: 60
                  refresh_token_ttl: 3600
                "#,
                config::FileFormat::Yaml,
            ))
            .build()
            .unwrap()
            .try_deserialize::<Settings>()
            .unwrap();

        assert_eq!(settings.application.host, "127.0.0.1");
        assert_eq!(settings.application.password_hash_cost, bcrypt::DEFAULT_COST);
        assert_eq!(settings.http.api_version, "/auth/v1");
        assert!(settings.database.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_same_cookie_names_rejected() {
        let settings = Settings {
            application: ApplicationSettings {
                host: default_host(),
                port: 0,
                password_hash_cost: 4,
            },
            http: HttpSettings {
                api_version: "/auth/v1".to_string(),
                access_cookie_name: "token".to_string(),
                refresh_cookie_name: "token".to_string(),
            },
            jwt: jwt("secret", 60, 3600),
            database: None,
        };
        assert!(settings.validate().is_err());
    }
}
