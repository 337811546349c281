//! One-shot CLI entry point: runs a single scan against a URL and prints
//! the decision as JSON. Grounded on `bin/dataset_inspect.rs`'s
//! clap-derive CLI shape.

use anyhow::Result;
use clap::Parser;
use kyc_screen::config::Config;
use kyc_screen::model::MerchantKYCInput;
use kyc_screen::ScanEngine;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Run a single KYC site scan and print the decision as JSON.
#[derive(Parser, Debug)]
#[command(name = "kyc-scan")]
#[command(about = "Scan a merchant website and print a PASS/FAIL/ESCALATE decision")]
struct Cli {
    /// Website URL to scan
    #[arg(long)]
    url: String,

    /// Declared merchant legal name
    #[arg(long, default_value = "Unknown Merchant")]
    legal_name: String,

    /// Declared merchant display name
    #[arg(long)]
    display_name: Option<String>,

    /// Registered business address
    #[arg(long, default_value = "Not provided Not provided Not provided")]
    address: String,

    /// Declared business type
    #[arg(long, default_value = "Unknown")]
    business_type: String,

    /// Declared products or services, comma separated
    #[arg(long, value_delimiter = ',', default_value = "general merchandise")]
    products: Vec<String>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kyc_screen=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let engine = ScanEngine::new(config).with_browser().await;

    let display_name = cli.display_name.clone().unwrap_or_else(|| cli.legal_name.clone());
    let input = MerchantKYCInput {
        merchant_legal_name: cli.legal_name,
        registered_address: cli.address,
        declared_business_type: cli.business_type,
        declared_products_services: cli.products,
        website_url: cli.url,
        merchant_display_name: display_name,
        optional_data: None,
    };

    let decision = engine.scan(input).await?;

    let json = if cli.pretty {
        serde_json::to_string_pretty(&decision)?
    } else {
        serde_json::to_string(&decision)?
    };
    println!("{json}");

    Ok(())
}
