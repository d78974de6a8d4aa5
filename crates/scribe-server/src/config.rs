use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use scribe_core::pagination::DEFAULT_PAGE_SIZE;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub media_dir: PathBuf,
    pub page_size: usize,
    pub jwt_secret: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = var("SCRIBE_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("SCRIBE_JWT_SECRET is unset or still a placeholder");
        }

        let host = var("SCRIBE_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = var("SCRIBE_PORT")
            .unwrap_or_else(|| "8000".into())
            .parse()
            .context("SCRIBE_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

        let page_size: usize = match var("SCRIBE_PAGE_SIZE") {
            Some(raw) => raw.parse().context("SCRIBE_PAGE_SIZE must be a positive integer")?,
            None => DEFAULT_PAGE_SIZE,
        };
        if page_size == 0 {
            bail!("SCRIBE_PAGE_SIZE must be at least 1");
        }

        Ok(Self {
            addr,
            db_path: var("SCRIBE_DB_PATH").unwrap_or_else(|| "scribe.db".into()).into(),
            media_dir: var("SCRIBE_MEDIA_DIR").unwrap_or_else(|| "./media".into()).into(),
            page_size,
            jwt_secret,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&[("SCRIBE_JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.addr.port(), 8000);
        assert_eq!(config.page_size, 10);
        assert_eq!(config.db_path, PathBuf::from("scribe.db"));
    }

    #[test]
    fn refuses_placeholder_secret() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
        assert!(
            Config::from_lookup(lookup(&[("SCRIBE_JWT_SECRET", "dev-secret-change-me")])).is_err()
        );
    }

    #[test]
    fn page_size_override() {
        let config = Config::from_lookup(lookup(&[
            ("SCRIBE_JWT_SECRET", "s3cret"),
            ("SCRIBE_PAGE_SIZE", "25"),
        ]))
        .unwrap();
        assert_eq!(config.page_size, 25);

        assert!(
            Config::from_lookup(lookup(&[
                ("SCRIBE_JWT_SECRET", "s3cret"),
                ("SCRIBE_PAGE_SIZE", "0"),
            ]))
            .is_err()
        );
    }
}
