pub mod error;
pub mod server;
mod session;
