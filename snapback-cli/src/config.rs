//! Configuration file loading.
//!
//! Targets live in a TOML file, one table per target:
//!
//! ```toml
//! [targets.home]
//! source = "/home"
//! backups = "/backup/home"
//! ignore = ["/home/*/.cache"]
//! retain_all = "2 days"
//! retain_daily = "1 month"
//! decay = "1 year"
//! autoprune = true
//! notify_remote = "user@desktop"
//! ```
//!
//! Retention durations are human-readable strings, parsed and validated at
//! load time; a value that does not parse is a configuration error here,
//! never a deferred failure at retention time.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use serde::Deserialize;
use thiserror::Error;

use snapback_retention::RetentionParams;

/// Default config file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/snapback.toml";

/// Default all-retention window.
pub const DEFAULT_RETAIN_ALL: &str = "1 day";

/// Default daily-retention window.
pub const DEFAULT_RETAIN_DAILY: &str = "1 month";

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("cannot read `{path}`: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no such target: {0}")]
    UnknownTarget(String),

    #[error("invalid duration `{value}` for `{key}`")]
    InvalidDuration { key: &'static str, value: String },
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    targets: BTreeMap<String, RawTarget>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTarget {
    source: String,
    backups: PathBuf,
    #[serde(default)]
    ignore: Vec<String>,
    retain_all: Option<String>,
    retain_daily: Option<String>,
    decay: Option<String>,
    #[serde(default)]
    autoprune: bool,
    #[serde(default)]
    autodecay: bool,
    notify_remote: Option<String>,
}

/// One validated backup target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    pub name: String,
    pub source: String,
    pub backups: PathBuf,
    pub ignore: Vec<String>,
    pub retain_all: TimeDelta,
    pub retain_daily: TimeDelta,
    pub decay: Option<TimeDelta>,
    pub autoprune: bool,
    pub autodecay: bool,
    pub notify_remote: Option<String>,
}

impl TargetConfig {
    /// The prune retention windows of this target.
    pub fn retention(&self) -> RetentionParams {
        RetentionParams {
            retain_all: self.retain_all,
            retain_daily: self.retain_daily,
        }
    }
}

/// Load and validate one target from the config file at `path`.
pub fn load_target(path: &Path, name: &str) -> Result<TargetConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    target_from_str(&content, name)
}

/// Parse one target out of config file contents.
pub fn target_from_str(content: &str, name: &str) -> Result<TargetConfig, ConfigError> {
    let mut file: ConfigFile = toml::from_str(content)?;
    let raw = file
        .targets
        .remove(name)
        .ok_or_else(|| ConfigError::UnknownTarget(name.to_string()))?;

    Ok(TargetConfig {
        name: name.to_string(),
        retain_all: parse_duration_field(
            "retain_all",
            raw.retain_all.as_deref().unwrap_or(DEFAULT_RETAIN_ALL),
        )?,
        retain_daily: parse_duration_field(
            "retain_daily",
            raw.retain_daily.as_deref().unwrap_or(DEFAULT_RETAIN_DAILY),
        )?,
        decay: raw
            .decay
            .as_deref()
            .map(|value| parse_duration_field("decay", value))
            .transpose()?,
        source: raw.source,
        backups: raw.backups,
        ignore: raw.ignore,
        autoprune: raw.autoprune,
        autodecay: raw.autodecay,
        notify_remote: raw.notify_remote,
    })
}

/// Parse a human-readable duration such as `"1 week"` or `"36h"`.
///
/// Whitespace between amount and unit is tolerated.
fn parse_duration_field(key: &'static str, value: &str) -> Result<TimeDelta, ConfigError> {
    let invalid = || ConfigError::InvalidDuration {
        key,
        value: value.to_string(),
    };
    let compact: String = value.split_whitespace().collect();
    let parsed = humantime::parse_duration(&compact).map_err(|_| invalid())?;
    TimeDelta::from_std(parsed).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[targets.home]
source = "/home"
backups = "/backup/home"
ignore = ["/home/*/.cache", "*.tmp"]
retain_all = "2 days"
retain_daily = "2 weeks"
decay = "1 year"
autoprune = true
notify_remote = "user@desktop"

[targets.srv]
source = "backup@nas:/srv"
backups = "/backup/srv"
"#;

    #[test]
    fn test_load_full_target() {
        let target = target_from_str(SAMPLE, "home").expect("parse");
        assert_eq!(target.name, "home");
        assert_eq!(target.source, "/home");
        assert_eq!(target.backups, PathBuf::from("/backup/home"));
        assert_eq!(target.ignore, vec!["/home/*/.cache", "*.tmp"]);
        assert_eq!(target.retain_all, TimeDelta::days(2));
        assert_eq!(target.retain_daily, TimeDelta::days(14));
        assert!(target.decay.is_some());
        assert!(target.autoprune);
        assert!(!target.autodecay);
        assert_eq!(target.notify_remote, Some("user@desktop".to_string()));
    }

    #[test]
    fn test_load_minimal_target_uses_defaults() {
        let target = target_from_str(SAMPLE, "srv").expect("parse");
        assert_eq!(target.source, "backup@nas:/srv");
        assert!(target.ignore.is_empty());
        assert_eq!(target.retain_all, TimeDelta::days(1));
        // "1 month" in humantime is 30.44 days.
        assert!(target.retain_daily > TimeDelta::days(30));
        assert!(target.retain_daily < TimeDelta::days(31));
        assert!(target.decay.is_none());
        assert!(!target.autoprune);
        assert!(target.notify_remote.is_none());
    }

    #[test]
    fn test_unknown_target() {
        let result = target_from_str(SAMPLE, "nope");
        assert!(matches!(result, Err(ConfigError::UnknownTarget(_))));
    }

    #[test]
    fn test_missing_required_field() {
        let content = r#"
[targets.broken]
source = "/data"
"#;
        assert!(matches!(
            target_from_str(content, "broken"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let content = r#"
[targets.broken]
source = "/data"
backups = "/backup/data"
retain_weekly = "1 week"
"#;
        assert!(matches!(
            target_from_str(content, "broken"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_duration_is_load_time_error() {
        let content = r#"
[targets.broken]
source = "/data"
backups = "/backup/data"
retain_all = "sometime soon"
"#;
        match target_from_str(content, "broken") {
            Err(ConfigError::InvalidDuration { key, value }) => {
                assert_eq!(key, "retain_all");
                assert_eq!(value, "sometime soon");
            }
            other => panic!("expected InvalidDuration, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_decay_duration() {
        let content = r#"
[targets.broken]
source = "/data"
backups = "/backup/data"
decay = "eventually"
"#;
        assert!(matches!(
            target_from_str(content, "broken"),
            Err(ConfigError::InvalidDuration { key: "decay", .. })
        ));
    }

    #[test]
    fn test_duration_spacing_variants() {
        for value in ["1 day", "1day", "1d", "24h", "  1   day  "] {
            let delta = parse_duration_field("retain_all", value).expect(value);
            assert_eq!(delta, TimeDelta::days(1), "value `{value}`");
        }
    }

    #[test]
    fn test_retention_params() {
        let target = target_from_str(SAMPLE, "home").expect("parse");
        let params = target.retention();
        assert_eq!(params.retain_all, TimeDelta::days(2));
        assert_eq!(params.retain_daily, TimeDelta::days(14));
    }

    #[test]
    fn test_load_target_missing_file() {
        let result = load_target(Path::new("/does/not/exist.toml"), "home");
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_target_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("snapback.toml");
        std::fs::write(&path, SAMPLE).expect("write");

        let target = load_target(&path, "home").expect("load");
        assert_eq!(target.name, "home");
    }
}
