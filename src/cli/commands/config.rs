use anyhow::Result;
use std::path::PathBuf;

use super::Command;
use crate::config::CheckoutConfig;

pub struct ConfigCommand {
    pub config: CheckoutConfig,
    pub write: Option<PathBuf>,
}

impl Command for ConfigCommand {
    async fn execute(&self) -> Result<()> {
        match &self.write {
            Some(path) => {
                self.config.save_to_file(path)?;
                println!("📝 Configuration written to {}", path.display());
            }
            None => print!("{}", toml::to_string_pretty(&self.config)?),
        }
        Ok(())
    }
}
