//! mcd library interface

pub mod config;
pub mod connection;
pub mod handlers;
pub mod server;
pub mod state;
pub mod storage;

pub use config::Config;
pub use server::Server;
pub use state::ServerState;
