// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup. Invalid values
//! fall back to their default with a warning, except the enclave seed,
//! which is fatal when malformed.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `IDGRAPH_MAX_LEN` | Maximum entries per identity graph, prime included | `64` |
//! | `WEB2_LOOKUP_TIMEOUT_MS` | Bound on a Web2 evidence lookup | `5000` |
//! | `ALLOW_PRIME_DEACTIVATION` | Allow deactivating the prime identity | `false` |
//! | `SHARD` | Hex 32-byte shard served by this enclave | all zeroes |
//! | `ENCLAVE_SEED` | Hex 32-byte enclave key seed | Required (random with `dev` feature) |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::identity::{GraphPolicy, DEFAULT_MAX_ID_GRAPH_LEN};
use crate::rpc::{ShardIdentifier, H256};
use crate::verify::DEFAULT_WEB2_LOOKUP_TIMEOUT;

/// Environment variable name for the identity graph bound.
pub const IDGRAPH_MAX_LEN_ENV: &str = "IDGRAPH_MAX_LEN";

/// Environment variable name for the Web2 lookup timeout, in milliseconds.
pub const WEB2_LOOKUP_TIMEOUT_MS_ENV: &str = "WEB2_LOOKUP_TIMEOUT_MS";

/// Environment variable name for the prime deactivation policy.
pub const ALLOW_PRIME_DEACTIVATION_ENV: &str = "ALLOW_PRIME_DEACTIVATION";

/// Environment variable name for the served shard.
pub const SHARD_ENV: &str = "SHARD";

/// Environment variable name for the enclave key seed.
///
/// Provisioned by the host after attestation. Never logged.
pub const ENCLAVE_SEED_ENV: &str = "ENCLAVE_SEED";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    /// Read the log format alone, before the subscriber is installed.
    pub fn from_env() -> Self {
        env::var(LOG_FORMAT_ENV)
            .ok()
            .and_then(|v| parse_log_format(v.trim()))
            .unwrap_or_default()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("ENCLAVE_SEED must be 32 hex-encoded bytes")]
    InvalidEnclaveSeed,
}

/// Settings of the identity core.
#[derive(Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub policy: GraphPolicy,
    pub web2_lookup_timeout: Duration,
    pub shard: ShardIdentifier,
    pub enclave_seed: Option<[u8; 32]>,
    pub log_format: LogFormat,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            policy: GraphPolicy::default(),
            web2_lookup_timeout: DEFAULT_WEB2_LOOKUP_TIMEOUT,
            shard: H256::default(),
            enclave_seed: None,
            log_format: LogFormat::default(),
        }
    }
}

impl CoreConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let max_len = parsed(&lookup, IDGRAPH_MAX_LEN_ENV, DEFAULT_MAX_ID_GRAPH_LEN, |v| {
            v.parse::<usize>().ok().filter(|n| *n > 0)
        });
        let allow_prime_deactivation =
            parsed(&lookup, ALLOW_PRIME_DEACTIVATION_ENV, false, parse_bool);
        let timeout_ms = parsed(
            &lookup,
            WEB2_LOOKUP_TIMEOUT_MS_ENV,
            defaults.web2_lookup_timeout.as_millis() as u64,
            |v| v.parse::<u64>().ok().filter(|n| *n > 0),
        );
        let shard = parsed(&lookup, SHARD_ENV, defaults.shard, |v| {
            decode_hex32(v).map(H256)
        });
        let log_format = parsed(&lookup, LOG_FORMAT_ENV, defaults.log_format, parse_log_format);

        let enclave_seed = match lookup(ENCLAVE_SEED_ENV) {
            Some(raw) => Some(decode_hex32(&raw).ok_or(ConfigError::InvalidEnclaveSeed)?),
            None => None,
        };

        Ok(Self {
            policy: GraphPolicy {
                max_len,
                allow_prime_deactivation,
            },
            web2_lookup_timeout: Duration::from_millis(timeout_ms),
            shard,
            enclave_seed,
            log_format,
        })
    }
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("policy", &self.policy)
            .field("web2_lookup_timeout", &self.web2_lookup_timeout)
            .field("shard", &self.shard)
            .field("enclave_seed", &self.enclave_seed.map(|_| "[REDACTED]"))
            .field("log_format", &self.log_format)
            .finish()
    }
}

/// Read `name` through `parse`, falling back to `default` when it is unset
/// or invalid.
fn parsed<T, F, P>(lookup: &F, name: &str, default: T, parse: P) -> T
where
    F: Fn(&str) -> Option<String>,
    P: FnOnce(&str) -> Option<T>,
{
    let Some(raw) = lookup(name) else {
        return default;
    };
    match parse(raw.trim()) {
        Some(value) => value,
        None => {
            warn!(variable = name, value = %raw, "invalid configuration value, using default");
            default
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn parse_log_format(value: &str) -> Option<LogFormat> {
    match value.to_ascii_lowercase().as_str() {
        "json" => Some(LogFormat::Json),
        "pretty" => Some(LogFormat::Pretty),
        _ => None,
    }
}

fn decode_hex32(value: &str) -> Option<[u8; 32]> {
    let raw = value.trim().strip_prefix("0x").unwrap_or(value.trim());
    hex::decode(raw).ok()?.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<CoreConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CoreConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.policy.max_len, 64);
        assert_eq!(config.web2_lookup_timeout, Duration::from_millis(5000));
        assert!(!config.policy.allow_prime_deactivation);
    }

    #[test]
    fn values_are_parsed() {
        let seed = "ab".repeat(32);
        let shard = format!("0x{}", "01".repeat(32));
        let config = load(&[
            (IDGRAPH_MAX_LEN_ENV, "8"),
            (WEB2_LOOKUP_TIMEOUT_MS_ENV, "250"),
            (ALLOW_PRIME_DEACTIVATION_ENV, "true"),
            (SHARD_ENV, &shard),
            (ENCLAVE_SEED_ENV, &seed),
            (LOG_FORMAT_ENV, "JSON"),
        ])
        .unwrap();

        assert_eq!(config.policy.max_len, 8);
        assert_eq!(config.web2_lookup_timeout, Duration::from_millis(250));
        assert!(config.policy.allow_prime_deactivation);
        assert_eq!(config.shard, H256([1u8; 32]));
        assert_eq!(config.enclave_seed, Some([0xab; 32]));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = load(&[
            (IDGRAPH_MAX_LEN_ENV, "0"),
            (WEB2_LOOKUP_TIMEOUT_MS_ENV, "soon"),
            (ALLOW_PRIME_DEACTIVATION_ENV, "maybe"),
            (SHARD_ENV, "abcd"),
            (LOG_FORMAT_ENV, "xml"),
        ])
        .unwrap();
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn malformed_seed_is_fatal() {
        assert!(matches!(
            load(&[(ENCLAVE_SEED_ENV, "beef")]),
            Err(ConfigError::InvalidEnclaveSeed)
        ));
    }

    #[test]
    fn debug_redacts_seed() {
        let config = load(&[(ENCLAVE_SEED_ENV, &"cd".repeat(32))]).unwrap();
        let rendered = format!("{config:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("cdcd"));
    }
}
