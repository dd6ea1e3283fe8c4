use std::{env, net::SocketAddr, path::PathBuf, str::FromStr};

use thiserror::Error;

use crate::storage::Backend;

const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 8000);
const DEFAULT_MAX_BODY_BYTES: usize = 256 * 1024 * 1024;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Storage backend for each upload bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    pub root: PathBuf,
    pub media: Backend,
    pub order_proofs: Backend,
    pub payment_proofs: Backend,
    pub qrcodes: Backend,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmtpConfig {
    pub host: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_body_bytes: usize,
    pub run_migrations: bool,
    pub storage: StorageConfig,
    pub smtp: SmtpConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let storage = StorageConfig {
            root: get("UPLOAD_ROOT").map(PathBuf::from).unwrap_or_else(|| PathBuf::from(".")),
            media: parse_or(get("MEDIA_STORAGE"), "MEDIA_STORAGE", Backend::Disk)?,
            order_proofs: parse_or(get("ORDER_PROOF_STORAGE"), "ORDER_PROOF_STORAGE", Backend::Disk)?,
            payment_proofs: parse_or(
                get("PAYMENT_PROOF_STORAGE"),
                "PAYMENT_PROOF_STORAGE",
                Backend::Inline,
            )?,
            qrcodes: parse_or(get("QRCODE_STORAGE"), "QRCODE_STORAGE", Backend::Disk)?,
        };

        let username = get("SMTP_USERNAME");
        let smtp = SmtpConfig {
            host: get("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_owned()),
            from: get("MAIL_FROM")
                .or_else(|| username.clone())
                .unwrap_or_else(|| "no-reply@localhost".to_owned()),
            password: get("SMTP_PASSWORD"),
            username,
        };

        Ok(Config {
            database_url,
            bind_addr: parse_or(get("BIND_ADDR"), "BIND_ADDR", DEFAULT_BIND_ADDR.into())?,
            max_body_bytes: parse_or(get("MAX_BODY_BYTES"), "MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?,
            run_migrations: parse_or(get("RUN_MIGRATIONS"), "RUN_MIGRATIONS", true)?,
            storage,
            smtp,
        })
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(value) => match value.trim().parse() {
            Ok(parsed) => Ok(parsed),
            Err(_) => Err(ConfigError::Invalid { key, value }),
        },
        None => Ok(default),
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
    fn defaults_apply_when_only_database_url_is_set() {
        let cfg = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/shop")])).unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:8000".parse().unwrap());
        assert_eq!(cfg.storage.payment_proofs, Backend::Inline);
        assert_eq!(cfg.storage.media, Backend::Disk);
        assert_eq!(cfg.storage.root, PathBuf::from("."));
        assert_eq!(cfg.smtp.host, "smtp.gmail.com");
        assert!(cfg.smtp.username.is_none());
        assert!(cfg.run_migrations);
    }

    #[test]
    fn database_url_is_required() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn storage_backends_are_configurable() {
        let cfg = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("PAYMENT_PROOF_STORAGE", "disk"),
            ("ORDER_PROOF_STORAGE", "inline"),
        ]))
        .unwrap();
        assert_eq!(cfg.storage.payment_proofs, Backend::Disk);
        assert_eq!(cfg.storage.order_proofs, Backend::Inline);
    }

    #[test]
    fn bad_values_are_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("MEDIA_STORAGE", "s3"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "MEDIA_STORAGE", .. }));
    }

    #[test]
    fn mail_from_falls_back_to_smtp_username() {
        let cfg = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("SMTP_USERNAME", "shop@example.com"),
        ]))
        .unwrap();
        assert_eq!(cfg.smtp.from, "shop@example.com");
    }
}
