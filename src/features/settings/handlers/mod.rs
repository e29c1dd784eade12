pub mod config_handler;

pub use config_handler::{__path_get_config, get_config};
