mod database;
mod logging;

pub use database::init_database;
pub use logging::init_logging;

use ferrous_analytics_domain::{CliOverrides, Config};

pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    let config = Config::load(path, overrides)?;
    config.validate()?;
    Ok(config)
}
