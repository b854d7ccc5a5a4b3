pub mod api;
pub mod cancel;
pub mod config;
pub mod connection;
pub mod database;
pub mod error;
pub mod types;
pub mod utils;

pub use api::*;
pub use error::FetchError;
pub use types::*;
