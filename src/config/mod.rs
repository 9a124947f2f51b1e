mod settings;

pub use settings::{ClientConfig, LogConfig, MessageDefaults, Settings};
