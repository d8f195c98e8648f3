pub mod error;
pub mod load;
pub mod settings;

pub use error::ConfigError;
pub use load::{load_settings, load_settings_with, CONFIG_PATH_ENV};
pub use settings::{
    GithubSettings, LockSettings, LogSettings, OutputSettings, Settings, SlackSettings,
    StoreBackend, StoreSettings, DEFAULT_STORAGE_PATH,
};
