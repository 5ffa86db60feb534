use anyhow::Context;

use logjack::config::Config;
use logjack::qr;
use logjack::server::Server;

const CONFIG_FILE: &str = "logjack.toml";

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config = Config::load_or_create(CONFIG_FILE)?;
    config.ensure_directories()?;

    let server = Server::start(&config)?;
    log::info!("Serving on {}", server.url());

    match qr::render_terminal(server.url()) {
        Ok(code) => println!("{}\n{}", code, server.url()),
        Err(err) => {
            log::warn!("Could not render QR code: {}", err);
            println!("{}", server.url());
        }
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to wait for shutdown signal")?;

    log::info!("Shutting down");
    server.stop().await;

    Ok(())
}
