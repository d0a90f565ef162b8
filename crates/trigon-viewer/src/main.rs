use std::process::ExitCode;

use trigon_engine::device::GpuInit;
use trigon_engine::logging::{init_logging, LoggingConfig};
use trigon_engine::window::{Runtime, RuntimeConfig};
use winit::dpi::PhysicalSize;

mod triangle;

use triangle::TriangleApp;

const WINDOW_TITLE: &str = "graphics-engine";
const WINDOW_WIDTH: u32 = 800;
const WINDOW_HEIGHT: u32 = 600;

fn main() -> ExitCode {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: WINDOW_TITLE.to_string(),
        initial_size: PhysicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT),
    };

    match Runtime::run(config, GpuInit::default(), TriangleApp::default()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("graphics-engine: {e:#}");
            ExitCode::FAILURE
        }
    }
}
