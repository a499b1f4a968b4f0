use std::fs;
use std::path::{Path, PathBuf};

use iso_engine::{Camera, LoopConfig, ViewOptions, Viewport};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "view.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    pub map_file: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub field_of_view_degrees: f32,
    pub view: ViewOptions,
    /// Scroll speed in map pixels per second.
    pub scroll_speed: f32,
    /// Seed for the scroll heading; `None` draws one from the OS.
    pub random_seed: Option<u64>,
    pub target_tps: u32,
    pub max_render_fps: Option<u32>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            map_file: "demo.tmx".to_string(),
            screen_width: 1280,
            screen_height: 720,
            field_of_view_degrees: Camera::default().field_of_view_degrees,
            view: ViewOptions::default(),
            scroll_speed: 96.0,
            random_seed: None,
            target_tps: 60,
            max_render_fps: None,
        }
    }
}

impl DemoConfig {
    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.screen_width,
            height: self.screen_height,
        }
    }

    pub fn camera(&self) -> Camera {
        Camera {
            field_of_view_degrees: self.field_of_view_degrees,
        }
    }

    pub fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            target_tps: self.target_tps,
            max_render_fps: self.max_render_fps,
            ..LoopConfig::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path} at {json_path}: {message}")]
    Parse {
        path: PathBuf,
        json_path: String,
        message: String,
    },
}

/// Reads the config if present; a missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<DemoConfig, ConfigError> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "config_missing_using_defaults");
        return Ok(DemoConfig::default());
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(path, &raw)
}

fn parse_config(path: &Path, raw: &str) -> Result<DemoConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, DemoConfig>(&mut deserializer).map_err(|error| {
        let json_path = error.path().to_string();
        ConfigError::Parse {
            path: path.to_path_buf(),
            json_path,
            message: error.into_inner().to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use iso_engine::FillScreenType;

    #[test]
    fn partial_config_keeps_defaults() {
        let raw = r#"{ "view": { "fill_screen_type": "FILL_CUSTOM_WIDTH", "visible_tiles": 12 } }"#;
        let config = parse_config(Path::new("view.json"), raw).expect("config");
        assert_eq!(config.view.fill_screen_type, FillScreenType::FillCustomWidth);
        assert_eq!(config.view.visible_tiles, 12);
        assert_eq!(config.view.visible_percentage, 1.0);
        assert_eq!(config.viewport().width, 1280);
    }

    #[test]
    fn parse_error_reports_json_path() {
        let raw = r#"{ "view": { "fill_screen_type": "FILL_EVERYTHING" } }"#;
        let err = parse_config(Path::new("view.json"), raw).expect_err("bad policy");
        match err {
            ConfigError::Parse { json_path, .. } => {
                assert_eq!(json_path, "view.fill_screen_type")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = parse_config(Path::new("view.json"), r#"{ "zoom": 2 }"#).expect_err("unknown");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_config_reads_file_or_falls_back() {
        let temp = tempfile::tempdir().expect("tempdir");
        let missing = load_config(&temp.path().join(CONFIG_FILE_NAME)).expect("defaults");
        assert_eq!(missing, DemoConfig::default());

        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r#"{ "screen_width": 800, "screen_height": 600, "random_seed": 7 }"#,
        )
        .expect("write");
        let config = load_config(&path).expect("config");
        assert_eq!((config.screen_width, config.screen_height), (800, 600));
        assert_eq!(config.random_seed, Some(7));
        assert_eq!(config.loop_config().target_tps, 60);
    }
}
