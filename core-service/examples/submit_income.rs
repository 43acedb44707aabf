//! Register a single income and print the receipt links.
//!
//! ```text
//! MYTAX_USERNAME=79001234567 MYTAX_PASSWORD=... \
//!     cargo run -p core-service --example submit_income -- "Consulting" 1 1000
//! ```

use anyhow::{bail, Context, Result};
use bridge_traits::time::LogLevel;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_service::{AuthClient, ClientConfig, IncomeItem, IncomeRequest};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Info),
    )?;

    let username = env::var("MYTAX_USERNAME").context("MYTAX_USERNAME is not set")?;
    let password = env::var("MYTAX_PASSWORD").context("MYTAX_PASSWORD is not set")?;

    let args: Vec<String> = env::args().skip(1).collect();
    let [name, quantity, amount] = args.as_slice() else {
        bail!("usage: submit_income <service name> <quantity> <unit amount>");
    };
    let quantity: u32 = quantity.parse().context("quantity must be a whole number")?;
    let amount: f64 = amount.parse().context("unit amount must be a number")?;

    let mut config = ClientConfig::builder();
    if let Ok(offset) = env::var("MYTAX_ZONE_OFFSET") {
        config = config.zone_offset(offset);
    }
    let client = AuthClient::new(config.build()?)?;
    tracing::info!(device_id = %client.device_id(), "Client ready");

    let profile = client.authenticate(&username, &password).await?;
    tracing::info!(
        name = profile.display_name.as_deref().unwrap_or("-"),
        "Signed in"
    );

    let request = IncomeRequest::new().with_item(IncomeItem::new(name.as_str(), quantity, amount));
    let receipt = client.submit_async(request)?.await?;

    println!("Receipt {}", receipt.id);
    println!("  json:  {}", receipt.json_url);
    println!("  print: {}", receipt.print_url);

    client.sign_out().await;
    Ok(())
}
