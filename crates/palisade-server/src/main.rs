//! Palisade server binary.

use palisade_config::ConfigLoader;
use palisade_server::{init_logging, AppState, LogConfig, Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::new().with_dotenv().load()?;

    let log_config = if config.is_production() {
        LogConfig::default()
    } else {
        LogConfig::development()
    };
    init_logging(&log_config)?;

    let state = AppState::builder(config).build()?;
    Server::new(state).run().await
}
