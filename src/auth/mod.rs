// Authentication module
// Resolves credentials and manages the cached access token

mod credentials;
mod exchange;
mod manager;
mod types;

pub use manager::AuthManager;
pub use types::{AccessData, Credentials};
