use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Longest accepted token lifetime, ten years.
const MAX_TOKEN_TTL_DAYS: i64 = 3650;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "blaxgram-secret-key-2024",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub token_ttl_days: i64,
    /// Directory served for non-API paths (the web client), if any.
    pub static_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("BLAXGRAM_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("BLAXGRAM_JWT_SECRET is unset or still a placeholder; set it in your .env file");
        }

        let db_path = get("BLAXGRAM_DB_PATH").unwrap_or_else(|| "blaxgram.db".into()).into();
        let host = get("BLAXGRAM_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("BLAXGRAM_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("BLAXGRAM_PORT must be a port number")?;
        let addr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        let token_ttl_days: i64 = match get("BLAXGRAM_TOKEN_TTL_DAYS") {
            Some(v) => v.parse().context("BLAXGRAM_TOKEN_TTL_DAYS must be an integer")?,
            None => 30,
        };
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&token_ttl_days) {
            bail!("BLAXGRAM_TOKEN_TTL_DAYS must be between 1 and {}", MAX_TOKEN_TTL_DAYS);
        }

        let static_dir = get("BLAXGRAM_STATIC_DIR").filter(|d| !d.is_empty()).map(PathBuf::from);

        Ok(Self {
            jwt_secret,
            db_path,
            addr,
            token_ttl_days,
            static_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&[("BLAXGRAM_JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.db_path, PathBuf::from("blaxgram.db"));
        assert_eq!(config.addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.token_ttl_days, 30);
        assert!(config.static_dir.is_none());
    }

    #[test]
    fn placeholder_secret_rejected() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
        assert!(Config::from_lookup(lookup(&[("BLAXGRAM_JWT_SECRET", "dev-secret-change-me")])).is_err());
    }

    #[test]
    fn overrides_parse() {
        let config = Config::from_lookup(lookup(&[
            ("BLAXGRAM_JWT_SECRET", "s3cret"),
            ("BLAXGRAM_HOST", "127.0.0.1"),
            ("BLAXGRAM_PORT", "8080"),
            ("BLAXGRAM_TOKEN_TTL_DAYS", "7"),
            ("BLAXGRAM_STATIC_DIR", "./public"),
        ]))
        .unwrap();
        assert_eq!(config.addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.token_ttl_days, 7);
        assert_eq!(config.static_dir, Some(PathBuf::from("./public")));

        let bad = Config::from_lookup(lookup(&[("BLAXGRAM_JWT_SECRET", "s"), ("BLAXGRAM_PORT", "http")]));
        assert!(bad.is_err());
    }

    #[test]
    fn token_ttl_bounded() {
        for ttl in ["0", "-3", "3651", "200000000"] {
            let result = Config::from_lookup(lookup(&[
                ("BLAXGRAM_JWT_SECRET", "s3cret"),
                ("BLAXGRAM_TOKEN_TTL_DAYS", ttl),
            ]));
            assert!(result.is_err(), "ttl {ttl} accepted");
        }

        let config = Config::from_lookup(lookup(&[
            ("BLAXGRAM_JWT_SECRET", "s3cret"),
            ("BLAXGRAM_TOKEN_TTL_DAYS", "3650"),
        ]))
        .unwrap();
        assert_eq!(config.token_ttl_days, 3650);
    }
}
