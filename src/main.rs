use anyhow::{Context, Result};

use mercadopago_client::config::{Command, Config};
use mercadopago_client::{MpClient, RequestResult};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (for log level)
    let (config, command) = Config::load()?;

    // Initialize logging with a configured level
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .init();

    config.validate()?;

    let client = MpClient::from_config(&config).context("Failed to create API client")?;
    tracing::debug!(
        credentials = ?client.credentials(),
        sandbox = client.sandbox_mode(),
        "Client initialized"
    );

    match command {
        Command::Token => {
            let token = client
                .get_access_token()
                .await
                .context("Failed to obtain access token")?;
            println!("{}...", token.chars().take(20).collect::<String>());
        }
        Command::Validate => {
            if client.is_valid_token().await {
                println!("valid");
            } else {
                println!("invalid");
                std::process::exit(1);
            }
        }
        Command::Get {
            uri,
            params,
            no_auth,
        } => {
            let params: Vec<(&str, &str)> = params
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            print_result(&client.get(&uri, &params, !no_auth).await?)?;
        }
        Command::Payment { id } => print_result(&client.get_payment(&id).await?)?,
        Command::Preference { id } => print_result(&client.get_preference(&id).await?)?,
        Command::MerchantOrder { id } => print_result(&client.get_merchant_order(&id).await?)?,
        Command::Customer { email } => {
            let customer = client.get_or_create_customer(&email).await?;
            println!("{}", serde_json::to_string_pretty(&customer)?);
        }
    }

    Ok(())
}

/// Print the response envelope as pretty JSON
fn print_result(result: &RequestResult) -> Result<()> {
    if !result.is_success() {
        tracing::warn!(status = result.status, "API returned an error status");
    }
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}
