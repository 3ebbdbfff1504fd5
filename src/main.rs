use deskpilot::registry::{self, Registry};
use deskpilot::server;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    registry::load_dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let data_dir = registry::resolve_data_dir();
    log::info!("data directory: {}", data_dir.display());

    let registry = Arc::new(Registry::build(&data_dir)?);
    registry.start_pollers();
    server::run(registry).await
}
