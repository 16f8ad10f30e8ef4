//! Runtime settings read from the environment.

use std::path::PathBuf;

use crate::reputation::{CountedReviews, FetchStrategy, ReputationPolicy};

pub const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSettings {
    /// In-process store; snapshots to `data_dir` when set.
    Memory { data_dir: Option<PathBuf> },
    Postgres { url: String, max_connections: u32 },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub frontend_url: String,
    pub jwt_secret: String,
    pub store: StoreSettings,
    pub reputation: ReputationPolicy,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable source.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                name: "JWT_SECRET",
                reason: format!("must be at least {MIN_JWT_SECRET_LEN} characters"),
            });
        }

        let store = match get("NAYMER_STORE").as_deref().map(str::trim) {
            None | Some("") | Some("memory") => StoreSettings::Memory {
                data_dir: get("NAYMER_DATA_DIR").filter(|d| !d.trim().is_empty()).map(PathBuf::from),
            },
            Some("postgres") => StoreSettings::Postgres {
                url: get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                max_connections: match get("DATABASE_MAX_CONNECTIONS") {
                    Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
                        name: "DATABASE_MAX_CONNECTIONS",
                        reason: format!("'{v}' is not a positive integer"),
                    })?,
                    None => 5,
                },
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "NAYMER_STORE",
                    reason: format!("'{other}' (expected memory or postgres)"),
                })
            }
        };

        let mut reputation = ReputationPolicy::default();
        if let Some(v) = get("NAYMER_REPUTATION_COUNTS") {
            reputation.counted = v.parse::<CountedReviews>().map_err(|e| ConfigError::Invalid {
                name: "NAYMER_REPUTATION_COUNTS",
                reason: e.to_string(),
            })?;
        }
        if let Some(v) = get("NAYMER_REPUTATION_FETCH") {
            reputation.fetch = v.parse::<FetchStrategy>().map_err(|e| ConfigError::Invalid {
                name: "NAYMER_REPUTATION_FETCH",
                reason: e.to_string(),
            })?;
        }

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".into()),
            frontend_url: get("FRONTEND_URL").unwrap_or_else(|| "http://localhost:5173".into()),
            jwt_secret,
            store,
            reputation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-must-be-32-bytes-long!!";

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_to_memory_store() {
        let s = settings(&[("JWT_SECRET", SECRET)]).unwrap();
        assert_eq!(s.store, StoreSettings::Memory { data_dir: None });
        assert_eq!(s.bind_addr, "0.0.0.0:8080");
        assert_eq!(s.reputation, ReputationPolicy::default());
    }

    #[test]
    fn short_or_missing_secret_rejected() {
        assert!(matches!(settings(&[]), Err(ConfigError::Missing("JWT_SECRET"))));
        assert!(matches!(settings(&[("JWT_SECRET", "short")]), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn postgres_requires_url() {
        let err = settings(&[("JWT_SECRET", SECRET), ("NAYMER_STORE", "postgres")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
        let s = settings(&[
            ("JWT_SECRET", SECRET),
            ("NAYMER_STORE", "postgres"),
            ("DATABASE_URL", "postgres://localhost/naymer"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
        ])
        .unwrap();
        assert_eq!(s.store, StoreSettings::Postgres { url: "postgres://localhost/naymer".into(), max_connections: 12 });
    }

    #[test]
    fn reputation_policy_from_env() {
        let s = settings(&[
            ("JWT_SECRET", SECRET),
            ("NAYMER_REPUTATION_COUNTS", "active"),
            ("NAYMER_REPUTATION_FETCH", "per_listing"),
        ])
        .unwrap();
        assert_eq!(s.reputation.counted, CountedReviews::Active);
        assert_eq!(s.reputation.fetch, FetchStrategy::PerListing);
        assert!(settings(&[("JWT_SECRET", SECRET), ("NAYMER_REPUTATION_COUNTS", "most")]).is_err());
    }
}
