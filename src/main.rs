//! # Voxel World Headless Driver
//!
//! Streams a world around a moving focus without a renderer and logs the
//! result. An optional argument names a JSON configuration file.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- config.json
//! ```

use std::{path::PathBuf, process::ExitCode};

fn main() -> ExitCode {
    voxel_world::init_logger();
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);

    match voxel_world::run(config_path.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
