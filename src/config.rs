use std::env;

use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    /// School name reported by `/v1/check`.
    pub tenant_name: String,
    /// Exposes upstream error text in responses and enables request logging.
    pub debug_mode: bool,
    pub auth: AuthScheme,
    pub zermelo: ZermeloConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// How kiosk devices prove they belong to this installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthScheme {
    /// Devices present `API_TOKEN` verbatim.
    StaticToken(String),
    /// Devices present the hex HMAC of `CONNECT_CODE` keyed with `AUTH_TOKEN_SECRET`.
    ConnectCode { code: String, secret: String },
}

#[derive(Debug, Clone)]
pub struct ZermeloConfig {
    /// Portal root, e.g. `https://school.zportal.nl`.
    pub portal_url: Url,
    pub api_token: String,
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require =
            |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnv(key.to_string()));

        let auth = match (get("CONNECT_CODE"), get("API_TOKEN")) {
            (Some(code), _) => AuthScheme::ConnectCode {
                code,
                secret: require("AUTH_TOKEN_SECRET")?,
            },
            (None, Some(token)) => AuthScheme::StaticToken(token),
            (None, None) => return Err(ConfigError::MissingEnv("CONNECT_CODE".to_string())),
        };

        let portal_url = require("ZERMELO_PORTAL_URL")?;

        Ok(Config {
            server: ServerConfig {
                host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: get("PORT")
                    .unwrap_or_else(|| "8080".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,
            },
            tenant_name: require("TENANT_NAME")?,
            debug_mode: parse_bool(&require("DEBUG_MODE")?)
                .ok_or_else(|| ConfigError::InvalidValue("DEBUG_MODE".to_string()))?,
            auth,
            zermelo: ZermeloConfig {
                portal_url: Url::parse(portal_url.trim())
                    .map_err(|_| ConfigError::InvalidValue("ZERMELO_PORTAL_URL".to_string()))?,
                api_token: require("ZERMELO_API_TOKEN")?,
                timeout_secs: get("ZERMELO_TIMEOUT_SECS")
                    .unwrap_or_else(|| "10".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("ZERMELO_TIMEOUT_SECS".to_string()))?,
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}
