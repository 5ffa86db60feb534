pub mod error;
pub mod handlers;
pub mod listing;
pub mod paths;
pub mod registry;

use std::sync::Arc;

use actix_web::dev::ServerHandle;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use tera::Tera;

use crate::config::Config;
use crate::net;
use registry::DirectoryRegistry;

pub const SERVER_PORT: u16 = 8080;
pub const SHUTDOWN_GRACE_SECS: u64 = 5;

/// Read-only per-worker state: the directory registry and the compiled
/// templates. Cloning is cheap, both sit behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<DirectoryRegistry>,
    pub tera: Arc<Tera>,
}

impl AppState {
    pub fn new(registry: DirectoryRegistry) -> Result<Self> {
        Ok(AppState {
            registry: Arc::new(registry),
            tera: Arc::new(build_templates()?),
        })
    }
}

fn build_templates() -> Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("index.html", include_str!("../../templates/index.html")),
        ("view.html", include_str!("../../templates/view.html")),
    ])
    .context("Failed to load templates")?;
    Ok(tera)
}

/// Route table. Delete is registered as a resource with a single POST
/// route: the method guard stays on the route, so any other method on a
/// matching path hits the resource default and gets 405 instead of falling
/// through to the browse catch-alls. The catch-alls come last.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::root))
        .route("/view/{name}/{tail:.*}", web::get().to(handlers::view))
        .route(
            "/download/{name}/{tail:.*}",
            web::get().to(handlers::download),
        )
        .service(
            web::resource("/delete/{name}/{tail:.*}").route(web::post().to(handlers::delete)),
        )
        .route("/{name}", web::get().to(handlers::browse_root))
        .route("/{name}/{tail:.*}", web::get().to(handlers::browse));
}

/// A running HTTP server. `start` returns once the listener is bound;
/// serving continues on the actix runtime until `stop` is called.
pub struct Server {
    handle: ServerHandle,
    url: String,
}

impl Server {
    pub fn start(config: &Config) -> Result<Server> {
        Self::start_on(config, SERVER_PORT)
    }

    /// Binds `port` (0 picks a free one) and begins serving in the
    /// background. The advertised URL carries the actually bound port.
    pub fn start_on(config: &Config, port: u16) -> Result<Server> {
        let state = AppState::new(DirectoryRegistry::from_config(config))?;

        let http = HttpServer::new(move || {
            App::new()
                .wrap(Logger::default())
                .app_data(web::Data::new(state.clone()))
                .configure(routes)
        })
        .shutdown_timeout(SHUTDOWN_GRACE_SECS)
        // Shutdown goes through `stop`, driven by the bootstrap.
        .disable_signals()
        .bind(("0.0.0.0", port))
        .with_context(|| format!("Failed to bind port {}", port))?;

        let bound_port = http.addrs().first().map(|addr| addr.port()).unwrap_or(port);
        let url = format!("http://{}:{}", net::local_ip(), bound_port);

        let server = http.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        Ok(Server { handle, url })
    }

    /// Graceful shutdown, bounded by [`SHUTDOWN_GRACE_SECS`]. Connections
    /// still open when the grace period elapses are aborted.
    pub async fn stop(&self) {
        self.handle.stop(true).await;
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}
