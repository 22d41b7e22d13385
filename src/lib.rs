// Mercado Pago client - Library root

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod resources;
pub mod rest_client;

pub use auth::{AccessData, Credentials};
pub use client::{ClientMetadata, MpClient};
pub use error::{ApiError, Result};
pub use rest_client::{RequestResult, RestClient};
