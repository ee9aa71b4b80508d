// src/utils/env.rs - .env loading

use log::{debug, warn};

/// Load environment variables from a .env file when one exists. Missing
/// files are fine; the process environment is used as-is.
pub fn load_env() {
    match dotenv::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(dotenv::Error::Io(_)) => debug!("No .env file found, using process environment"),
        Err(e) => warn!("Failed to load .env file: {}", e),
    }
}
