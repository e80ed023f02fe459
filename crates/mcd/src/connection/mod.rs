//! Connection handling

pub mod handler;
pub mod session;

pub use handler::{handle_connection, run_session};
pub use session::{Request, Session};
