use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod map;
pub mod math;
pub mod mesh;

pub use app::{
    overlay_transform, run_frames, AlwaysReady, FrameLogic, FrameLoop, FrameMetricsSnapshot,
    FramePhase, FrameProtocolError, FrameReport, LoopConfig, LoopSummary, MetricsHandle,
    RenderBackend, SharedData, SharedValue, StateManager, UpdateReadiness, Viewport,
};
pub use map::{
    compute_view_window, load_tmx_file, map_to_tile, Camera, FillScreenType, GridError,
    MapHandler, MapSpace, TileGridSpec, TileIndexOffset, TileResolution, TmxError, ViewError,
    ViewOptions, ViewWindow,
};
pub use mesh::{create_sprite, create_wireframe, Mesh, Primitive, VertexBuffer};

pub const ROOT_ENV_VAR: &str = "ISO_ENGINE_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub maps_dir: PathBuf,
    pub config_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "ISO_ENGINE_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/iso-engine\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    Ok(paths_under(root))
}

fn paths_under(root: PathBuf) -> AppPaths {
    let assets = root.join("assets");
    AppPaths {
        maps_dir: assets.join("maps"),
        config_dir: assets.join("config"),
        root,
    }
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => root_from_env(Path::new(&value)),
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;
            find_root_above(&exe_dir)
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn root_from_env(raw: &Path) -> Result<PathBuf, StartupError> {
    let normalized = normalize_path(raw);
    if is_repo_marker(&normalized) {
        Ok(normalized)
    } else {
        Err(StartupError::InvalidEnvRoot { path: normalized })
    }
}

fn find_root_above(start_dir: &Path) -> Result<PathBuf, StartupError> {
    start_dir
        .ancestors()
        .find(|candidate| is_repo_marker(candidate))
        .map(normalize_path)
        .ok_or_else(|| StartupError::RootNotFound {
            start_dir: normalize_path(start_dir),
            env_var: ROOT_ENV_VAR,
        })
}

fn is_repo_marker(path: &Path) -> bool {
    path.join("Cargo.toml").is_file() && path.join("assets").is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_root(dir: &Path) {
        fs::write(dir.join("Cargo.toml"), "[workspace]\n").expect("cargo toml");
        fs::create_dir_all(dir.join("assets")).expect("assets");
    }

    #[test]
    fn repo_marker_requires_cargo_toml_and_assets() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert!(!is_repo_marker(temp.path()));
        fs::create_dir_all(temp.path().join("assets")).expect("assets");
        assert!(!is_repo_marker(temp.path()));
        fs::write(temp.path().join("Cargo.toml"), "").expect("cargo toml");
        assert!(is_repo_marker(temp.path()));
    }

    #[test]
    fn walks_upward_to_project_root() {
        let temp = tempfile::tempdir().expect("tempdir");
        make_root(temp.path());
        let nested = temp.path().join("target").join("debug");
        fs::create_dir_all(&nested).expect("nested");

        let root = find_root_above(&nested).expect("root");
        assert_eq!(root, normalize_path(temp.path()));

        let paths = paths_under(root);
        assert!(paths.maps_dir.ends_with("assets/maps"));
        assert!(paths.config_dir.ends_with("assets/config"));
    }

    #[test]
    fn missing_root_is_reported() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = find_root_above(temp.path()).expect_err("no root");
        assert!(matches!(err, StartupError::RootNotFound { .. }));
    }

    #[test]
    fn env_root_must_be_a_project_root() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            root_from_env(temp.path()),
            Err(StartupError::InvalidEnvRoot { .. })
        ));
        make_root(temp.path());
        assert_eq!(
            root_from_env(temp.path()).expect("root"),
            normalize_path(temp.path())
        );
    }
}
