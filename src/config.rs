use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::auth::Credentials;
use crate::client::ClientMetadata;
use crate::error::ApiError;
use crate::rest_client::{DEFAULT_BASE_URL, DEFAULT_SANDBOX_BASE_URL};

/// Mercado Pago API client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Long-lived access token
    #[arg(short = 't', long, env = "MP_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Application client ID (requires --client-secret)
    #[arg(long, env = "MP_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Application client secret (requires --client-id)
    #[arg(long, env = "MP_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Target the sandbox environment
    #[arg(long, env = "MP_SANDBOX")]
    pub sandbox: bool,

    /// Production API root
    #[arg(long, env = "MP_API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub api_base_url: String,

    /// Sandbox API root
    #[arg(long, env = "MP_SANDBOX_BASE_URL", default_value = DEFAULT_SANDBOX_BASE_URL)]
    pub sandbox_base_url: String,

    /// Integration platform reported in metadata headers
    #[arg(long, env = "MP_PLATFORM")]
    pub platform: Option<String>,

    /// Source OS reported in metadata headers
    #[arg(long, env = "MP_SOURCE_OS")]
    pub source_os: Option<String>,

    /// Integration type reported in metadata headers
    #[arg(long, env = "MP_INTEGRATION_TYPE")]
    pub integration_type: Option<String>,

    /// HTTP connect timeout in seconds
    #[arg(long, env = "HTTP_CONNECT_TIMEOUT", default_value = "30")]
    pub http_connect_timeout: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "60")]
    pub http_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Obtain an access token and print its prefix
    Token,

    /// Check whether the access token is accepted by the API
    Validate,

    /// Issue a GET against an arbitrary API path
    Get {
        uri: String,

        /// Query parameters as key=value
        #[arg(value_parser = parse_key_value)]
        params: Vec<(String, String)>,

        /// Do not send the access token
        #[arg(long)]
        no_auth: bool,
    },

    /// Fetch a payment
    Payment { id: String },

    /// Fetch a checkout preference
    Preference { id: String },

    /// Fetch a merchant order
    MerchantOrder { id: String },

    /// Find a customer by email, creating it when missing
    Customer { email: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    // Credentials
    pub access_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,

    // Environment
    pub sandbox: bool,
    pub api_base_url: String,
    pub sandbox_base_url: String,

    // Integration metadata
    pub platform: Option<String>,
    pub source_os: Option<String>,
    pub integration_type: Option<String>,

    // HTTP client
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,

    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with priority: CLI > ENV > defaults
    pub fn load() -> Result<(Self, Command)> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let args = CliArgs::parse();
        let command = args.command.clone();

        Ok((Self::from_args(args), command))
    }

    pub fn from_args(args: CliArgs) -> Self {
        Config {
            access_token: non_empty(args.access_token),
            client_id: non_empty(args.client_id),
            client_secret: non_empty(args.client_secret),
            sandbox: args.sandbox,
            api_base_url: args.api_base_url,
            sandbox_base_url: args.sandbox_base_url,
            platform: args.platform,
            source_os: args.source_os,
            integration_type: args.integration_type,
            http_connect_timeout: args.http_connect_timeout,
            http_request_timeout: args.http_timeout,
            log_level: args.log_level,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            anyhow::bail!("MP_API_BASE_URL cannot be empty");
        }
        if self.sandbox_base_url.trim().is_empty() {
            anyhow::bail!("MP_SANDBOX_BASE_URL cannot be empty");
        }
        if self.http_connect_timeout == 0 {
            anyhow::bail!("HTTP_CONNECT_TIMEOUT must be greater than zero");
        }
        if self.http_request_timeout == 0 {
            anyhow::bail!("HTTP_REQUEST_TIMEOUT must be greater than zero");
        }
        if self.client_id.is_some() != self.client_secret.is_some() {
            anyhow::bail!("MP_CLIENT_ID and MP_CLIENT_SECRET must be provided together");
        }

        self.credentials()?;
        Ok(())
    }

    /// Resolve the configured credential values
    ///
    /// Exactly one of an access token or a client id/secret pair is accepted.
    pub fn credentials(&self) -> crate::error::Result<Credentials> {
        if self.client_id.is_some() != self.client_secret.is_some() {
            return Err(ApiError::ConfigError(
                "client id and client secret must be provided together".to_string(),
            ));
        }

        let values: Vec<&str> = [&self.access_token, &self.client_id, &self.client_secret]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect();

        Credentials::from_args(&values)
    }

    pub fn metadata(&self) -> ClientMetadata {
        ClientMetadata {
            platform: self.platform.clone(),
            source_os: self.source_os.clone(),
            integration_type: self.integration_type.clone(),
        }
    }
}

/// Treat blank values as unset
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Parse a `key=value` query parameter
fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid parameter `{}`: expected key=value", s))?;
    if key.is_empty() {
        return Err(format!("invalid parameter `{}`: empty key", s));
    }
    Ok((key.to_string(), value.to_string()))
}
