//! Demo configuration loaded from environment variables.
//!
//! All settings come from environment variables (or a `.env` file via
//! `dotenvy`). The library never reads the environment itself; only the
//! demo binary calls [`RaceConfig::from_env`].

use std::time::Duration;

use crate::domain::{RegistryVariant, Username};
use crate::error::RaceError;
use crate::harness::PausePolicy;

/// Settings for one demo run.
#[derive(Debug, Clone)]
pub struct RaceConfig {
    /// Username every contender tries to claim.
    pub username: Username,

    /// Number of concurrent request handlers.
    pub contenders: usize,

    /// Pause injected between check and insert.
    pub pause: PausePolicy,

    /// Registry variants to race, in order.
    pub variants: Vec<RegistryVariant>,

    /// Emit logs as JSON lines instead of human-readable text.
    pub log_json: bool,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,
}

impl RaceConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`RaceError::InvalidConfig`] if `RACE_USERNAME`,
    /// `RACE_PAUSE` or `RACE_VARIANTS` is set to a value that cannot be
    /// interpreted.
    pub fn from_env() -> Result<Self, RaceError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Missing keys and unparseable numbers fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RaceError::InvalidConfig`] if the username, pause kind or
    /// variant list is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RaceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = Username::new(lookup("RACE_USERNAME").unwrap_or_else(|| "gugu".to_string()))
            .map_err(|e| RaceError::InvalidConfig(format!("RACE_USERNAME: {e}")))?;

        let contenders = parse_var(&lookup, "RACE_CONTENDERS", 2);
        let pause_ms = parse_var(&lookup, "RACE_PAUSE_MS", 100);
        let pause = parse_pause(
            lookup("RACE_PAUSE").as_deref().unwrap_or("rendezvous"),
            Duration::from_millis(pause_ms),
        )?;
        let variants = parse_variants(lookup("RACE_VARIANTS").as_deref().unwrap_or("both"))?;

        let log_json = parse_var_bool(&lookup, "RACE_LOG_JSON", false);
        let event_bus_capacity = parse_var(&lookup, "EVENT_BUS_CAPACITY", 64);

        Ok(Self {
            username,
            contenders,
            pause,
            variants,
            log_json,
            event_bus_capacity,
        })
    }
}

/// Parses `key` as `T`, returning `default` on missing or invalid values.
fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Parses `key` as a boolean. Accepts `"true"`, `"1"`, `"false"`, `"0"`
/// (case-insensitive). Returns `default` otherwise.
fn parse_var_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}

fn parse_pause(kind: &str, duration: Duration) -> Result<PausePolicy, RaceError> {
    match kind.trim().to_ascii_lowercase().as_str() {
        "none" => Ok(PausePolicy::None),
        "delay" => Ok(PausePolicy::Delay(duration)),
        "rendezvous" => Ok(PausePolicy::Rendezvous(duration)),
        other => Err(RaceError::InvalidConfig(format!(
            "RACE_PAUSE: unknown pause kind {other:?}"
        ))),
    }
}

fn parse_variants(list: &str) -> Result<Vec<RegistryVariant>, RaceError> {
    if list.trim().eq_ignore_ascii_case("both") {
        return Ok(vec![
            RegistryVariant::Unsynchronized,
            RegistryVariant::Synchronized,
        ]);
    }
    list.split(',')
        .map(str::parse::<RegistryVariant>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| RaceError::InvalidConfig(format!("RACE_VARIANTS: {e}")))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<RaceConfig, RaceError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        RaceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_race_gugu_on_both_variants() {
        let Ok(config) = load(&[]) else {
            panic!("defaults must load");
        };
        assert_eq!(config.username.as_str(), "gugu");
        assert_eq!(config.contenders, 2);
        assert_eq!(
            config.pause,
            PausePolicy::Rendezvous(Duration::from_millis(100))
        );
        assert_eq!(
            config.variants,
            vec![
                RegistryVariant::Unsynchronized,
                RegistryVariant::Synchronized
            ]
        );
        assert!(!config.log_json);
        assert_eq!(config.event_bus_capacity, 64);
    }

    #[test]
    fn overrides_are_applied() {
        let Ok(config) = load(&[
            ("RACE_USERNAME", "neo"),
            ("RACE_CONTENDERS", "3"),
            ("RACE_PAUSE", "Delay"),
            ("RACE_PAUSE_MS", "15"),
            ("RACE_VARIANTS", "synchronized"),
            ("RACE_LOG_JSON", "TRUE"),
        ]) else {
            panic!("valid overrides");
        };
        assert_eq!(config.username.as_str(), "neo");
        assert_eq!(config.contenders, 3);
        assert_eq!(config.pause, PausePolicy::Delay(Duration::from_millis(15)));
        assert_eq!(config.variants, vec![RegistryVariant::Synchronized]);
        assert!(config.log_json);
    }

    #[test]
    fn bad_numbers_fall_back_to_defaults() {
        let Ok(config) = load(&[("RACE_CONTENDERS", "many"), ("RACE_PAUSE_MS", "-1")]) else {
            panic!("numbers fall back");
        };
        assert_eq!(config.contenders, 2);
        assert_eq!(
            config.pause,
            PausePolicy::Rendezvous(Duration::from_millis(100))
        );
    }

    #[test]
    fn invalid_text_values_are_rejected() {
        assert!(matches!(
            load(&[("RACE_USERNAME", "  ")]),
            Err(RaceError::InvalidConfig(_))
        ));
        assert!(matches!(
            load(&[("RACE_PAUSE", "breakpoint")]),
            Err(RaceError::InvalidConfig(_))
        ));
        assert!(matches!(
            load(&[("RACE_VARIANTS", "sync,lockfree")]),
            Err(RaceError::InvalidConfig(_))
        ));
    }

    #[test]
    fn variant_list_keeps_order() {
        let Ok(config) = load(&[("RACE_VARIANTS", "sync, unsync")]) else {
            panic!("valid list");
        };
        assert_eq!(
            config.variants,
            vec![
                RegistryVariant::Synchronized,
                RegistryVariant::Unsynchronized
            ]
        );
    }
}
