//! Configuration and document loading.
//!
//! This module handles:
//! - Tool settings from `plancheck.yaml` and the environment
//! - The stack configuration map recorded in plans
//! - Reading and writing plan and run documents

mod loader;
mod map;
mod settings;

pub use loader::{load_document, parse_document, render_document, save_document, DocumentFormat};
pub use map::{ConfigMap, ConfigValue};
pub use settings::{find_settings_file, load_dotenv, OutputFormat, Settings, DEFAULT_SETTINGS_FILES};
