use std::{
    env, fs,
    path::{Path, PathBuf},
};

use log::LevelFilter;
use serde::Deserialize;

use crate::error::{Result, ViewerError};

const CONFIG_ENV_VAR: &str = "POKE_SCENE_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "viewer.ron";

/// Window, camera and asset settings. Every field is optional in the file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub fov_degrees: f32,
    pub near_clip: f32,
    pub far_clip: f32,
    pub asset_root: PathBuf,
    pub uncapped_fps: bool,
    pub log_level: String,
    pub scatter_seed: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            title: "Pokemon 3D".into(),
            width: 1600,
            height: 900,
            fullscreen: false,
            fov_degrees: 45.0,
            near_clip: 0.1,
            far_clip: 500.0,
            asset_root: PathBuf::from("models"),
            uncapped_fps: true,
            log_level: "info".into(),
            scatter_seed: 42,
        }
    }
}

impl ViewerConfig {
    /// Reads the file named by `POKE_SCENE_CONFIG`, falling back to `viewer.ron`.
    /// A missing file is not an error.
    pub fn load() -> Result<Self> {
        let path = env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(ViewerConfig::default());
        }

        let source = fs::read_to_string(path).map_err(|source| ViewerError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&source)
    }

    pub fn parse(source: &str) -> Result<Self> {
        let config: ViewerConfig =
            ron::from_str(source).map_err(|e| ViewerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ViewerError::Config("window size must be non-zero".into()));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ViewerError::Config(format!(
                "fov_degrees must be within (0, 180), got {}",
                self.fov_degrees
            )));
        }
        if self.near_clip <= 0.0 || self.far_clip <= self.near_clip {
            return Err(ViewerError::Config(
                "clip planes must satisfy 0 < near_clip < far_clip".into(),
            ));
        }
        self.level_filter()?;
        Ok(())
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.log_level
            .parse()
            .map_err(|_| ViewerError::Config(format!("unknown log level {:?}", self.log_level)))
    }

    pub fn asset(&self, relative: &str) -> PathBuf {
        self.asset_root.join(relative)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ViewerConfig::load_from(&dir.path().join("nope.ron")).unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(width: 800, height: 600, log_level: \"debug\")").unwrap();

        let config = ViewerConfig::load_from(file.path()).unwrap();
        assert_eq!(config.width, 800);
        assert_eq!(config.height, 600);
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Debug);
        assert_eq!(config.title, "Pokemon 3D");
        assert_eq!(config.far_clip, 500.0);
    }

    #[test]
    fn rejects_bad_clip_planes() {
        let err = ViewerConfig::parse("(near_clip: 10.0, far_clip: 1.0)").unwrap_err();
        assert!(matches!(err, ViewerError::Config(_)));
    }

    #[test]
    fn rejects_unknown_log_level() {
        assert!(ViewerConfig::parse("(log_level: \"loud\")").is_err());
    }

    #[test]
    fn rejects_malformed_ron() {
        assert!(ViewerConfig::parse("(width: ").is_err());
    }

    #[test]
    fn assets_resolve_under_root() {
        let config = ViewerConfig::default();
        assert_eq!(
            config.asset("objects/Trainer.obj"),
            PathBuf::from("models/objects/Trainer.obj")
        );
    }
}
