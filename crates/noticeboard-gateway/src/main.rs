mod auth;
mod config;
mod error;
mod routes;
mod service;

use anyhow::Result;
use config::Config;
use service::GatewayService;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    let gateway = GatewayService::new(config);
    gateway.run().await
}
