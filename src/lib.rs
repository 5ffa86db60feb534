pub mod config;
pub mod net;
pub mod qr;
pub mod server;

pub use config::Config;
pub use server::Server;
