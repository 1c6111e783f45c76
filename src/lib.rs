pub mod cli;
pub mod core;
pub mod providers;

use crate::core::RateService;
use crate::core::config::AppConfig;
use crate::providers::FrankfurterClient;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Form,
    Convert {
        amount: String,
        from: String,
        to: String,
    },
    Currencies {
        filter: Option<String>,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxconv starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let service: Arc<dyn RateService> = Arc::new(FrankfurterClient::new(&config.api.base_url)?);

    match command {
        AppCommand::Form => cli::form::run(service, &config.converter).await,
        AppCommand::Convert { amount, from, to } => {
            cli::convert::run(service.as_ref(), &amount, &from, &to).await
        }
        AppCommand::Currencies { filter } => {
            cli::currencies::run(service.as_ref(), filter.as_deref()).await
        }
    }
}
