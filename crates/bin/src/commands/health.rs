//! Health command - probes `/health` on a running Tessera server.

use std::time::Duration;

use serde_json::Value;
use tessera::constants::HEALTH_PATH;
use url::Url;

use crate::cli::HealthArgs;

/// Resolve the probe URL, accepting either a base URL or the health URL itself.
fn health_url(raw: &str) -> Result<Url, url::ParseError> {
    let base = Url::parse(raw)?;
    if base.path().trim_end_matches('/') == HEALTH_PATH {
        return Ok(base);
    }
    base.join(HEALTH_PATH)
}

/// Run the health command. Exits with status 1 when the server is not healthy.
pub async fn run(args: &HealthArgs) -> Result<(), Box<dyn std::error::Error>> {
    let url = health_url(&args.url)?;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()?;

    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            eprintln!("unhealthy: cannot reach {url}: {e}");
            std::process::exit(1);
        }
    };

    let status = response.status();
    if !status.is_success() {
        eprintln!("unhealthy: {url} answered HTTP {status}");
        std::process::exit(1);
    }

    let body: Value = response.json().await?;
    match body.get("status").and_then(Value::as_str) {
        Some("healthy") => {
            println!("healthy: {body}");
            Ok(())
        }
        other => {
            eprintln!("unhealthy: reported status {}", other.unwrap_or("<missing>"));
            std::process::exit(1);
        }
    }
}
