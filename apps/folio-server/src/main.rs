mod config;
mod error_status;
mod server;

use folio_logger::init_logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logger();

    let config = config::Config::from_env()?;
    server::start_server(config).await
}
