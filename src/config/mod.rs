pub mod settings;

pub use settings::{ConfigError, LogSettings, Settings, ShellSettings};
