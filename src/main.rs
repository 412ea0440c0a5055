//! igloo-client command-line entry point.
//!
//! Runs `IGLOO_QUERY` once over HTTP if set, then streams `IGLOO_SUBSCRIPTION`
//! if set, printing each event as JSON until Ctrl-C or the end of the stream.

use igloo_client::{Client, ClientConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = ClientConfig::from_env()?;
    tracing::info!(
        query_endpoint = %config.query_endpoint,
        subscription_endpoint = %config.subscription_endpoint,
        "starting igloo-client"
    );
    let client = Client::new(config)?;

    if let Ok(query) = std::env::var("IGLOO_QUERY") {
        let data = client.query(&query).await?;
        println!("{}", serde_json::Value::Object(data));
    }

    let Ok(subscription) = std::env::var("IGLOO_SUBSCRIPTION") else {
        return Ok(());
    };

    let mut sub = client.subscribe(&subscription).await?;
    let stop = sub.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping subscription");
            stop.stop();
        }
    });

    while let Some(message) = sub.next().await {
        let payload = message?;
        println!("{}", serde_json::Value::Object(payload));
    }

    tracing::info!("subscription finished");
    Ok(())
}
