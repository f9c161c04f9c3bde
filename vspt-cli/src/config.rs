//! Standard configuration module.

use serde_derive::Deserialize;
use vspt_util::{ConfigExt, crate_name};

fn default_history_days() -> i64 {
    30
}

/// `vspt-cli` configuration.
#[derive(Deserialize, Debug)]
pub struct Config {
    /// Path to SQLite history database.
    pub database_path: String,
    /// Path to the serialized model artifact.
    pub model_path: String,
    /// How many days of history to keep, and to train on.
    #[serde(default = "default_history_days")]
    pub history_days: i64
}

impl ConfigExt for Config {
    fn crate_name() -> &'static str {
        crate_name!()
    }
}
