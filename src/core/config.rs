//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{AvatarError, Result};
use crate::resolver::DEFAULT_SIDE;
use crate::resolver::color::ColorRule;

/// Full avatar-badge configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub widget: WidgetConfig,
    pub resolver: ResolverConfig,
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

/// Default widget props applied when a prop is not supplied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WidgetConfig {
    pub width: f64,
    pub height: f64,
    pub is_round: bool,
}

/// Resolution knobs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Avatars whose shorter side is below this many pixels show one character.
    pub small_size_threshold: f64,
    /// How the background class is chosen.
    pub color_rule: ColorRule,
}

/// JSONL activity log settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub jsonl_log: PathBuf,
    pub fallback_path: Option<PathBuf>,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
}

/// Filesystem paths used by avatar-badge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_SIDE,
            height: DEFAULT_SIDE,
            is_round: true,
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            small_size_threshold: 30.0,
            color_rule: ColorRule::CharParity,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let data = home_dir().join(".local").join("share").join("avatar-badge");
        Self {
            enabled: false,
            jsonl_log: data.join("activity.jsonl"),
            fallback_path: Some(env::temp_dir().join("avatar-badge.jsonl")),
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_file: home_dir()
                .join(".config")
                .join("avatar-badge")
                .join("config.toml"),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| AvatarError::Io {
                path: path_buf.clone(),
                source,
            })?;
            Self::from_toml_str(&raw)?
        } else if is_explicit_path {
            return Err(AvatarError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a TOML document without env overrides or validation.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Deterministic hash of the effective config for logging.
    ///
    /// FNV-1a over the canonical JSON form, stable across processes.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        // widget
        if let Some(raw) = lookup("AVB_WIDGET_WIDTH") {
            self.widget.width = parse_env_f64("AVB_WIDGET_WIDTH", &raw)?;
        }
        if let Some(raw) = lookup("AVB_WIDGET_HEIGHT") {
            self.widget.height = parse_env_f64("AVB_WIDGET_HEIGHT", &raw)?;
        }
        if let Some(raw) = lookup("AVB_WIDGET_IS_ROUND") {
            self.widget.is_round = parse_env_bool("AVB_WIDGET_IS_ROUND", &raw)?;
        }

        // resolver
        if let Some(raw) = lookup("AVB_RESOLVER_SMALL_SIZE_THRESHOLD") {
            self.resolver.small_size_threshold =
                parse_env_f64("AVB_RESOLVER_SMALL_SIZE_THRESHOLD", &raw)?;
        }
        if let Some(raw) = lookup("AVB_RESOLVER_COLOR_RULE") {
            self.resolver.color_rule = raw.parse().map_err(|_| AvatarError::ConfigParse {
                context: "env",
                details: format!("AVB_RESOLVER_COLOR_RULE={raw:?}: unknown color rule"),
            })?;
        }

        // logging
        if let Some(raw) = lookup("AVB_LOG_ENABLED") {
            self.logging.enabled = parse_env_bool("AVB_LOG_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("AVB_LOG_PATH") {
            self.logging.jsonl_log = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("AVB_LOG_MAX_SIZE_BYTES") {
            self.logging.max_size_bytes = parse_env_u64("AVB_LOG_MAX_SIZE_BYTES", &raw)?;
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        for (name, val) in [
            ("widget.width", self.widget.width),
            ("widget.height", self.widget.height),
        ] {
            if !val.is_finite() || val <= 0.0 {
                return Err(AvatarError::InvalidConfig {
                    details: format!("{name} must be a positive number, got {val}"),
                });
            }
        }

        let threshold = self.resolver.small_size_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(AvatarError::InvalidConfig {
                details: format!(
                    "resolver.small_size_threshold must be a non-negative number, got {threshold}"
                ),
            });
        }

        if self.logging.max_size_bytes == 0 {
            return Err(AvatarError::InvalidConfig {
                details: "logging.max_size_bytes must be > 0".to_string(),
            });
        }
        if self.logging.max_rotated_files == 0 {
            return Err(AvatarError::InvalidConfig {
                details: "logging.max_rotated_files must be >= 1".to_string(),
            });
        }
        if self.logging.enabled && self.logging.jsonl_log.as_os_str().is_empty() {
            return Err(AvatarError::InvalidConfig {
                details: "logging.jsonl_log must be set when logging is enabled".to_string(),
            });
        }

        Ok(())
    }
}

fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || {
            eprintln!("[AVB-CONFIG] WARNING: HOME not set, falling back to the temp dir");
            env::temp_dir()
        },
        PathBuf::from,
    )
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_f64(name: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|error| AvatarError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn parse_env_u64(name: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|error| AvatarError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    raw.trim()
        .parse::<bool>()
        .map_err(|error| AvatarError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

#[cfg(test)]
mod tests {
    use super::{AvatarError, ColorRule, Config};
    use std::collections::HashMap;
    use std::path::Path;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    fn apply(cfg: &mut Config, pairs: &[(&str, &str)]) -> super::Result<()> {
        let env = vars(pairs);
        cfg.apply_env_overrides_from(|name| env.get(name).cloned())
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert!((cfg.widget.width - 36.0).abs() < f64::EPSILON);
        assert!(cfg.widget.is_round);
        assert_eq!(cfg.resolver.color_rule, ColorRule::CharParity);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = Config::from_toml_str(
            r#"
            [widget]
            width = 48.0

            [resolver]
            color_rule = "gender_preferred"
            "#,
        )
        .expect("parse");
        assert!((cfg.widget.width - 48.0).abs() < f64::EPSILON);
        assert!((cfg.widget.height - 36.0).abs() < f64::EPSILON);
        assert_eq!(cfg.resolver.color_rule, ColorRule::GenderPreferred);
        assert!((cfg.resolver.small_size_threshold - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = Config::from_toml_str("[widget\nwidth = ").expect_err("expected parse error");
        assert_eq!(err.code(), "AVB-1003");
    }

    #[test]
    fn non_positive_width_rejected() {
        let mut cfg = Config::default();
        cfg.widget.width = 0.0;
        let err = cfg.validate().expect_err("expected invalid width");
        match err {
            AvatarError::InvalidConfig { details } => assert!(details.contains("widget.width")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn negative_threshold_rejected() {
        let mut cfg = Config::default();
        cfg.resolver.small_size_threshold = -1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_rotation_rejected() {
        let mut cfg = Config::default();
        cfg.logging.max_rotated_files = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let mut cfg = Config::default();
        apply(
            &mut cfg,
            &[
                ("AVB_WIDGET_WIDTH", "64"),
                ("AVB_WIDGET_IS_ROUND", "false"),
                ("AVB_RESOLVER_SMALL_SIZE_THRESHOLD", "40.5"),
                ("AVB_RESOLVER_COLOR_RULE", "gender-preferred"),
                ("AVB_LOG_ENABLED", "true"),
                ("AVB_LOG_PATH", "/tmp/avb-test.jsonl"),
            ],
        )
        .expect("overrides");
        assert!((cfg.widget.width - 64.0).abs() < f64::EPSILON);
        assert!(!cfg.widget.is_round);
        assert!((cfg.resolver.small_size_threshold - 40.5).abs() < f64::EPSILON);
        assert_eq!(cfg.resolver.color_rule, ColorRule::GenderPreferred);
        assert!(cfg.logging.enabled);
        assert_eq!(cfg.logging.jsonl_log, Path::new("/tmp/avb-test.jsonl"));
    }

    #[test]
    fn env_invalid_number_rejected() {
        let mut cfg = Config::default();
        let err = apply(&mut cfg, &[("AVB_WIDGET_HEIGHT", "tall")]).expect_err("expected error");
        assert_eq!(err.code(), "AVB-1003");
        assert!(err.to_string().contains("AVB_WIDGET_HEIGHT"));
    }

    #[test]
    fn env_invalid_color_rule_rejected() {
        let mut cfg = Config::default();
        assert!(apply(&mut cfg, &[("AVB_RESOLVER_COLOR_RULE", "rainbow")]).is_err());
    }

    #[test]
    fn load_returns_error_for_explicit_missing_path() {
        let err = Config::load(Some(Path::new("/nonexistent/avatar-badge/config.toml")))
            .expect_err("expected missing config");
        assert_eq!(err.code(), "AVB-1002");
    }

    #[test]
    fn load_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[widget]\nheight = 24.0\n").unwrap();
        let cfg = Config::load(Some(&path)).expect("load");
        assert!((cfg.widget.height - 24.0).abs() < f64::EPSILON);
        assert_eq!(cfg.paths.config_file, path);
    }

    #[test]
    fn stable_hash_changes_when_config_changes() {
        let cfg = Config::default();
        let before = cfg.stable_hash().expect("hash should compute");
        let mut modified = Config::default();
        modified.widget.width += 1.0;
        let after = modified.stable_hash().expect("hash should compute");
        assert_ne!(before, after);
        assert_eq!(before, Config::default().stable_hash().unwrap());
    }
}
