mod backend;
mod config;
mod scroll;

use std::env;

use iso_engine::math::MathRandom;
use iso_engine::{
    load_tmx_file, resolve_app_paths, run_frames, AlwaysReady, FrameProtocolError, MapHandler,
    MetricsHandle, StartupError, TmxError, ViewError,
};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use backend::TracingBackend;
use config::{load_config, ConfigError, CONFIG_FILE_NAME};
use scroll::{initial_velocity, ScrollLogic};

const FRAMES_ENV_VAR: &str = "ISO_DEMO_FRAMES";
const DEFAULT_FRAMES: u64 = 120;

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Map(#[from] TmxError),
    #[error(transparent)]
    View(#[from] ViewError),
    #[error(transparent)]
    Frame(#[from] FrameProtocolError),
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidFrameCount { var: &'static str, value: String },
}

fn main() {
    init_tracing();
    info!("=== Iso Engine Demo ===");

    if let Err(err) = run() {
        error!(error = %err, "demo_failed");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let frames = frame_count(env::var(FRAMES_ENV_VAR).ok())?;
    let paths = resolve_app_paths()?;
    let config = load_config(&paths.config_dir.join(CONFIG_FILE_NAME))?;

    let map_path = paths.maps_dir.join(&config.map_file);
    let grid = load_tmx_file(&map_path)?;
    info!(
        path = %map_path.display(),
        columns = grid.columns(),
        rows = grid.rows(),
        tile_width = grid.tile_width(),
        tile_height = grid.tile_height(),
        "map_loaded"
    );

    let mut handler = MapHandler::new(grid);
    handler.build_view(config.viewport(), &config.camera(), &config.view)?;

    let mut rng = config
        .random_seed
        .map_or_else(MathRandom::from_entropy, MathRandom::seeded);
    let velocity = initial_velocity(config.scroll_speed, &mut rng);
    let mut logic = ScrollLogic::new(handler, velocity);
    let mut backend = TracingBackend::default();
    let metrics = MetricsHandle::default();

    let summary = run_frames(
        &config.loop_config(),
        frames,
        &mut logic,
        &mut backend,
        &AlwaysReady,
        metrics.clone(),
    )?;

    let snapshot = metrics.snapshot();
    let scroll = logic.scroll();
    info!(
        frames = summary.frames,
        ticks = summary.ticks,
        draws = backend.total_draws(),
        fps = snapshot.fps,
        scroll_x = scroll.offset.x,
        scroll_y = scroll.offset.y,
        tile = ?logic.last_tile().map(|tile| (tile.column, tile.row)),
        "demo_finished"
    );
    Ok(())
}

fn frame_count(raw: Option<String>) -> Result<u64, AppError> {
    match raw {
        None => Ok(DEFAULT_FRAMES),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map_err(|_| AppError::InvalidFrameCount {
                var: FRAMES_ENV_VAR,
                value,
            }),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use iso_engine::{Camera, TileGridSpec, ViewOptions, Viewport};

    #[test]
    fn frame_count_defaults_and_parses() {
        assert_eq!(frame_count(None).expect("default"), DEFAULT_FRAMES);
        assert_eq!(frame_count(Some(" 30 ".to_string())).expect("parsed"), 30);
        assert!(matches!(
            frame_count(Some("many".to_string())),
            Err(AppError::InvalidFrameCount { .. })
        ));
    }

    #[test]
    fn scrolling_demo_runs_headless() {
        let grid = TileGridSpec::new(64, 32, 40, 80).expect("grid");
        let mut handler = MapHandler::new(grid);
        handler
            .build_view(
                Viewport {
                    width: 1280,
                    height: 720,
                },
                &Camera::default(),
                &ViewOptions {
                    visible_tiles: 20,
                    fill_screen_type: iso_engine::FillScreenType::FillCustomWidth,
                    ..ViewOptions::default()
                },
            )
            .expect("view");
        let mut logic = ScrollLogic::new(handler, Vec2::new(500.0, 500.0));
        let mut backend = TracingBackend::default();

        let summary = run_frames(
            &iso_engine::LoopConfig::default(),
            4,
            &mut logic,
            &mut backend,
            &AlwaysReady,
            MetricsHandle::default(),
        )
        .expect("run");

        assert_eq!(summary.frames, 4);
        assert_eq!(backend.frames(), 4);
        assert!(logic.last_tile().is_some());
        // One tile mesh per frame plus the overlay on the first frame.
        assert_eq!(backend.total_draws(), 4 + 3);
    }
}
