use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming an explicit settings file.
pub const CONFIG_ENV: &str = "PIXELPET_CONFIG";

/// Top-level settings schema loaded from `config.toml`.
///
/// Every section is optional; anything left out keeps its default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub paths: PathSettings,
    pub sprite: SpriteSettings,
    pub lifecycle: LifecycleSettings,
    pub generator: GeneratorSettings,
}

/// Where the save file, atlas and generated images live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathSettings {
    pub save_file: PathBuf,
    pub atlas_file: PathBuf,
    pub animations_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            save_file: PathBuf::from("save_file.txt"),
            atlas_file: PathBuf::from("utils/data/animation_mapping.atlas"),
            animations_dir: PathBuf::from("assets/pet_animations"),
        }
    }
}

/// Sprite-sheet segmentation and playback tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpriteSettings {
    /// Pixels with luminance strictly above this value are foreground.
    pub luminance_threshold: u8,
    /// Frames must have a bounding-box area strictly above this.
    pub min_frame_area: u64,
    /// Frames must have a bounding-box area strictly below this.
    pub max_frame_area: u64,
    pub frame_interval_ms: u64,
}

impl Default for SpriteSettings {
    fn default() -> Self {
        Self {
            luminance_threshold: 20,
            min_frame_area: 25_000,
            max_frame_area: 230_000,
            frame_interval_ms: 300,
        }
    }
}

/// Decay rates and status thresholds for the pet lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LifecycleSettings {
    pub hunger_per_minute: u8,
    pub health_loss_per_block: u8,
    pub health_block_minutes: u32,
    pub hungry_above: u8,
    pub healthy_above: u8,
    pub sick_below: u8,
    pub starvation_hours: u32,
    pub boredom_hours: u32,
    pub loneliness_hours: u32,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            hunger_per_minute: 10,
            health_loss_per_block: 10,
            health_block_minutes: 10,
            hungry_above: 11,
            healthy_above: 70,
            sick_below: 50,
            starvation_hours: 48,
            boredom_hours: 4,
            loneliness_hours: 4,
        }
    }
}

/// External text/image generator process.
///
/// With no `command` the app falls back to the built-in offline generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorSettings {
    pub command: Option<String>,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            timeout_secs: 60,
        }
    }
}

impl Settings {
    /// Parse and validate settings TOML.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let settings: Self = toml::from_str(input).context("failed to parse settings TOML")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings at {}", path.display()))?;

        Self::from_toml_str(&raw)
            .with_context(|| format!("invalid settings at {}", path.display()))
    }

    /// Resolve and load settings.
    ///
    /// Precedence: `explicit` path > `PIXELPET_CONFIG` > platform config dir.
    /// An explicit path must exist; the implicit locations fall back to
    /// defaults when no file is present. Returns the file actually read.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::from_path(path)?, Some(path.to_path_buf())));
        }

        match config_path() {
            Some(path) if path.exists() => {
                let settings = Self::from_path(&path)?;
                Ok((settings, Some(path)))
            }
            _ => Ok((Self::default(), None)),
        }
    }

    /// Validate required fields and semantic constraints.
    pub fn validate(&self) -> Result<()> {
        validate_path("paths.save_file", &self.paths.save_file)?;
        validate_path("paths.atlas_file", &self.paths.atlas_file)?;
        validate_path("paths.animations_dir", &self.paths.animations_dir)?;

        if self.sprite.min_frame_area >= self.sprite.max_frame_area {
            bail!(
                "sprite.min_frame_area ({}) must be below sprite.max_frame_area ({})",
                self.sprite.min_frame_area,
                self.sprite.max_frame_area
            );
        }
        validate_positive("sprite.frame_interval_ms", self.sprite.frame_interval_ms)?;

        let lifecycle = &self.lifecycle;
        validate_positive(
            "lifecycle.health_block_minutes",
            lifecycle.health_block_minutes as u64,
        )?;
        for (field, value) in [
            ("lifecycle.hungry_above", lifecycle.hungry_above),
            ("lifecycle.healthy_above", lifecycle.healthy_above),
            ("lifecycle.sick_below", lifecycle.sick_below),
        ] {
            if value > 100 {
                bail!("{field} must be within 0..=100, got {value}");
            }
        }

        if let Some(command) = &self.generator.command {
            if command.trim().is_empty() {
                bail!("generator.command must not be empty");
            }
        }
        for arg in &self.generator.args {
            if arg.trim().is_empty() {
                bail!("generator.args entries must not be empty");
            }
        }
        validate_positive("generator.timeout_secs", self.generator.timeout_secs)?;

        Ok(())
    }
}

/// Return the implicit settings file location.
///
/// Precedence: `PIXELPET_CONFIG` env var > `<config_dir>/pixelpet/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::config_dir().map(|dir| dir.join("pixelpet").join("config.toml"))
}

fn validate_path(field: &str, value: &Path) -> Result<()> {
    if value.as_os_str().is_empty() {
        bail!("{field} must not be empty")
    }
    Ok(())
}

fn validate_positive(field: &str, value: u64) -> Result<()> {
    if value == 0 {
        bail!("{field} must be greater than zero")
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serialize env-mutating tests to avoid data races.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const FULL_SETTINGS: &str = r#"
[paths]
save_file = "/tmp/pet/save.json"
atlas_file = "/tmp/pet/mapping.atlas"
animations_dir = "/tmp/pet/sheets"

[sprite]
luminance_threshold = 32
min_frame_area = 1000
max_frame_area = 9000
frame_interval_ms = 120

[lifecycle]
starvation_hours = 24

[generator]
command = "python3"
args = ["backend.py", "--model", "fast"]
timeout_secs = 5
"#;

    #[test]
    fn empty_document_yields_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.sprite.luminance_threshold, 20);
        assert_eq!(settings.lifecycle.starvation_hours, 48);
        assert!(settings.generator.command.is_none());
    }

    #[test]
    fn parses_full_settings() {
        let settings = Settings::from_toml_str(FULL_SETTINGS).unwrap();
        assert_eq!(settings.paths.save_file, PathBuf::from("/tmp/pet/save.json"));
        assert_eq!(settings.sprite.min_frame_area, 1000);
        assert_eq!(settings.sprite.frame_interval_ms, 120);
        assert_eq!(settings.lifecycle.starvation_hours, 24);
        // Unlisted lifecycle keys keep their defaults.
        assert_eq!(settings.lifecycle.hunger_per_minute, 10);
        assert_eq!(settings.generator.command.as_deref(), Some("python3"));
        assert_eq!(settings.generator.args.len(), 3);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Settings::from_toml_str("[sprite]\nthreshold = 3\n")
            .unwrap_err()
            .to_string();
        assert!(err.contains("failed to parse settings TOML"));
    }

    #[test]
    fn inverted_area_window_is_rejected() {
        let raw = FULL_SETTINGS.replace("min_frame_area = 1000", "min_frame_area = 9000");
        let err = Settings::from_toml_str(&raw).unwrap_err().to_string();
        assert!(err.contains("sprite.min_frame_area"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let raw = FULL_SETTINGS.replace("timeout_secs = 5", "timeout_secs = 0");
        let err = Settings::from_toml_str(&raw).unwrap_err().to_string();
        assert!(err.contains("generator.timeout_secs must be greater than zero"));
    }

    #[test]
    fn blank_generator_command_is_rejected() {
        let raw = FULL_SETTINGS.replace("command = \"python3\"", "command = \"  \"");
        let err = Settings::from_toml_str(&raw).unwrap_err().to_string();
        assert!(err.contains("generator.command must not be empty"));
    }

    #[test]
    fn threshold_above_hundred_is_rejected() {
        let err = Settings::from_toml_str("[lifecycle]\nsick_below = 150\n")
            .unwrap_err()
            .to_string();
        assert!(err.contains("lifecycle.sick_below"));
    }

    #[test]
    fn load_explicit_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, FULL_SETTINGS).unwrap();

        let (settings, source) = Settings::load(Some(&path)).unwrap();
        assert_eq!(source.as_deref(), Some(path.as_path()));
        assert_eq!(settings.sprite.luminance_threshold, 32);
    }

    #[test]
    fn load_explicit_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("nope.toml")))
            .unwrap_err()
            .to_string();
        assert!(err.contains("failed to read settings"));
    }

    #[test]
    fn config_path_respects_env_override() {
        let _guard = ENV_LOCK.lock().unwrap();
        let original = std::env::var(CONFIG_ENV).ok();

        unsafe { std::env::set_var(CONFIG_ENV, "/tmp/pixelpet-test/config.toml") };
        assert_eq!(
            config_path(),
            Some(PathBuf::from("/tmp/pixelpet-test/config.toml"))
        );

        match original {
            Some(v) => unsafe { std::env::set_var(CONFIG_ENV, v) },
            None => unsafe { std::env::remove_var(CONFIG_ENV) },
        }
    }

    #[test]
    fn load_implicit_missing_file_falls_back_to_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        let original = std::env::var(CONFIG_ENV).ok();
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("absent.toml");
        unsafe { std::env::set_var(CONFIG_ENV, &missing) };
        let (settings, source) = Settings::load(None).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(source.is_none());

        match original {
            Some(v) => unsafe { std::env::set_var(CONFIG_ENV, v) },
            None => unsafe { std::env::remove_var(CONFIG_ENV) },
        }
    }
}
