use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub cookie_secure: bool,
    pub media_root: PathBuf,
    pub media_url: String,
    pub static_root: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = get("HOST").unwrap_or_else(|| "127.0.0.1".into());
        let port = parse_or(&get, "PORT", 8080)?;
        let database_url = get("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let database_max_connections = parse_or(&get, "DATABASE_MAX_CONNECTIONS", 20)?;
        let jwt_secret = get("JWT_SECRET")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set"))?;
        let session_ttl_hours = parse_or(&get, "SESSION_TTL_HOURS", 24)?;
        if session_ttl_hours <= 0 {
            anyhow::bail!("SESSION_TTL_HOURS must be positive");
        }
        let cookie_secure = parse_bool(&get, "COOKIE_SECURE", false)?;
        let media_root = PathBuf::from(get("MEDIA_ROOT").unwrap_or_else(|| "media".into()));
        let media_url = get("MEDIA_URL").unwrap_or_else(|| "/media".into());
        let media_url = format!("/{}", media_url.trim_matches('/'));
        let static_root = PathBuf::from(get("STATIC_ROOT").unwrap_or_else(|| "static".into()));
        let max_upload_bytes = parse_or(&get, "MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?;

        Ok(Self {
            host,
            port,
            database_url,
            database_max_connections,
            jwt_secret,
            session_ttl_hours,
            cookie_secure,
            media_root,
            media_url,
            static_root,
            max_upload_bytes,
        })
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_max_connections", &self.database_max_connections)
            .field("jwt_secret", &"<redacted>")
            .field("session_ttl_hours", &self.session_ttl_hours)
            .field("cookie_secure", &self.cookie_secure)
            .field("media_root", &self.media_root)
            .field("media_url", &self.media_url)
            .field("static_root", &self.static_root)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {}: {}", key, e)),
        None => Ok(default),
    }
}

fn parse_bool(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: bool,
) -> anyhow::Result<bool> {
    match get(key).as_deref().map(str::trim) {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(anyhow::anyhow!("invalid {}: {}", key, other)),
    }
}
