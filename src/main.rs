pub mod app;
pub mod camera;
pub mod config;
pub mod entities;
pub mod error;
pub mod gui;
pub mod input;
pub mod obj_loader;
pub mod render_system;
pub mod renderer;
pub mod scenes;
pub mod shaders;
pub mod texture;

use std::process::ExitCode;

use log::{error, info};

use crate::config::ViewerConfig;

fn main() -> ExitCode {
    let config = match ViewerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let level = match config.level_filter() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = fast_log::init(fast_log::Config::new().console().level(level)) {
        eprintln!("Failed to start logging: {e}");
    }

    info!("Starting {} at {}x{}", config.title, config.width, config.height);
    match app::run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            log::logger().flush();
            ExitCode::FAILURE
        }
    }
}
