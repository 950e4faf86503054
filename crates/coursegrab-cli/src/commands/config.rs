//! Configuration commands.

use clap::Subcommand;
use coursegrab_core::Config;

use super::common::CliResult;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the active configuration and its file path
    Show,
    /// Set a configuration value (api_root, page_size, refresh_secs)
    Set { key: String, value: String },
}

pub fn run(config: &Config, action: ConfigAction) -> CliResult {
    match action {
        ConfigAction::Show => {
            println!("path:         {}", Config::path()?.display());
            println!("api_root:     {}", config.api_root);
            println!("page_size:    {}", config.page_size);
            println!("refresh_secs: {}", config.refresh_secs);
        }
        ConfigAction::Set { key, value } => {
            let mut updated = Config::load()?;
            match key.as_str() {
                "api_root" => updated.api_root = value,
                "page_size" => updated.page_size = value.parse()?,
                "refresh_secs" => updated.refresh_secs = value.parse()?,
                other => return Err(format!("unknown configuration key '{other}'").into()),
            }
            updated.save()?;
            println!("saved {}", Config::path()?.display());
        }
    }
    Ok(())
}
