/*
 * Responsibility
 * - Load environment / .env configuration (listen address, trust anchor, defaults)
 * - Validate configuration at startup (fail fast on missing or invalid values)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Trust anchor for bearer-token validation plus the fixed fallback principal
/// used by the signed-request / invocation-context schemes.
///
/// Loaded once at startup and passed by reference into the auth factory;
/// nothing here is mutated after construction.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub issuer: String,
    /// Audience check is skipped entirely when unset. Some upstream issuers
    /// do not emit an `aud` claim.
    pub audience: Option<String>,
    pub validate_issuer: bool,
    pub validate_lifetime: bool,
    pub token_leeway_seconds: u64,
    /// Ed25519 public key (PKCS#8 PEM) used to verify access tokens.
    pub jwt_public_key_pem: String,
    /// Upper bound on a single remote key-set fetch. No retry at this layer.
    pub key_refresh_timeout_seconds: u64,
    /// Principal substituted when a signature/context identity payload is
    /// present but unparsable and `context_fail_open` is set.
    pub default_role_arn: String,
    pub default_account_id: String,
    /// When true (the historical behavior), a malformed auxiliary identity
    /// header still authenticates as the default principal. When false the
    /// request proceeds as anonymous instead.
    pub context_fail_open: bool,
}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub auth: AuthConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let issuer =
            std::env::var("AUTH_ISSUER").map_err(|_| ConfigError::Missing("AUTH_ISSUER"))?;
        // Issuer is compared verbatim against `iss`, but it must at least be a URL.
        url::Url::parse(&issuer).map_err(|_| ConfigError::Invalid("AUTH_ISSUER"))?;

        let audience = std::env::var("AUTH_AUDIENCE")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let validate_issuer = env_bool("AUTH_VALIDATE_ISSUER", true)?;
        let validate_lifetime = env_bool("AUTH_VALIDATE_LIFETIME", true)?;

        let token_leeway_seconds = std::env::var("AUTH_TOKEN_LEEWAY_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        let jwt_public_key_pem = std::env::var("AUTH_JWT_PUBLIC_KEY_PEM")
            .map_err(|_| ConfigError::Missing("AUTH_JWT_PUBLIC_KEY_PEM"))?
            .replace("\\n", "\n");

        let key_refresh_timeout_seconds = std::env::var("AUTH_KEY_REFRESH_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(5);

        let default_role_arn = std::env::var("AUTH_DEFAULT_ROLE_ARN")
            .unwrap_or_else(|_| "arn:aws:iam::000000000000:role/metrics-api-default".to_string());

        let default_account_id =
            std::env::var("AUTH_DEFAULT_ACCOUNT_ID").unwrap_or_else(|_| "000000000000".to_string());

        let context_fail_open = env_bool("AUTH_CONTEXT_FAIL_OPEN", true)?;

        Ok(Self {
            addr,
            app_env,
            auth: AuthConfig {
                issuer,
                audience,
                validate_issuer,
                validate_lifetime,
                token_leeway_seconds,
                jwt_public_key_pem,
                key_refresh_timeout_seconds,
                default_role_arn,
                default_account_id,
                context_fail_open,
            },
        })
    }
}

fn env_bool(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(v) => match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid(key)),
        },
    }
}
