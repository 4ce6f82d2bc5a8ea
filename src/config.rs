//! Configuration module for PipeWatch.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::feed::RetentionPolicy;

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the web server (default: 4000)
    pub http_port: u16,
    /// JSON seed file; a fleet is generated when unset
    pub seed_path: Option<String>,
    /// Size of the generated fleet (default: 12)
    pub segments: u32,
    /// Seconds between feed ticks (default: 7)
    pub tick_secs: u64,
    /// Seconds of history kept for insights and playback (default: 60)
    pub history_secs: u64,
    /// Hard cap on retained snapshots (default: 1800)
    pub history_points: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 4000,
            seed_path: None,
            segments: 12,
            tick_secs: 7,
            history_secs: 60,
            history_points: 1800,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PIPEWATCH_HTTP_PORT`: HTTP port (default: 4000)
    /// - `PIPEWATCH_SEED_PATH`: seed JSON file (default: generated fleet)
    /// - `PIPEWATCH_SEGMENTS`: generated fleet size (default: 12)
    /// - `PIPEWATCH_TICK_SECS`: feed interval (default: 7)
    /// - `PIPEWATCH_HISTORY_SECS`: history window (default: 60)
    /// - `PIPEWATCH_HISTORY_POINTS`: history cap (default: 1800)
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. Unparsable values keep the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        set_parsed(&lookup, "PIPEWATCH_HTTP_PORT", &mut cfg.http_port);
        set_parsed(&lookup, "PIPEWATCH_SEGMENTS", &mut cfg.segments);
        set_parsed(&lookup, "PIPEWATCH_TICK_SECS", &mut cfg.tick_secs);
        set_parsed(&lookup, "PIPEWATCH_HISTORY_SECS", &mut cfg.history_secs);
        set_parsed(&lookup, "PIPEWATCH_HISTORY_POINTS", &mut cfg.history_points);

        if let Some(path) = lookup("PIPEWATCH_SEED_PATH") {
            if !path.trim().is_empty() {
                cfg.seed_path = Some(path);
            }
        }

        cfg
    }

    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_secs.max(1))
    }

    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy {
            max_age_secs: self.history_secs,
            max_points: self.history_points,
        }
    }
}

fn set_parsed<F, T>(lookup: &F, key: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        if let Ok(value) = raw.trim().parse() {
            *slot = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.http_port, 4000);
        assert_eq!(cfg.seed_path, None);
        assert_eq!(cfg.segments, 12);
        assert_eq!(cfg.tick(), Duration::from_secs(7));
        assert_eq!(cfg.retention(), RetentionPolicy::default());
    }

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PIPEWATCH_HTTP_PORT", "8088"),
            ("PIPEWATCH_SEED_PATH", "seed.json"),
            ("PIPEWATCH_SEGMENTS", "lots"),
            ("PIPEWATCH_TICK_SECS", "0"),
            ("PIPEWATCH_HISTORY_POINTS", " 50 "),
        ]
        .into_iter()
        .collect();

        let cfg = ServerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.http_port, 8088);
        assert_eq!(cfg.seed_path.as_deref(), Some("seed.json"));
        // Unparsable values keep the default.
        assert_eq!(cfg.segments, 12);
        // A zero tick is raised to one second.
        assert_eq!(cfg.tick(), Duration::from_secs(1));
        assert_eq!(cfg.history_points, 50);
        assert_eq!(cfg.history_secs, 60);
    }
}
