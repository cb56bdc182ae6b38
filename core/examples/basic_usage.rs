//! Browse a community, look up a package and walk the category pages.
//!
//! Reads `THUNDERSTORE_BASE_URL`, `THUNDERSTORE_API_TOKEN` and
//! `THUNDERSTORE_TIMEOUT_SECS`; point the base URL at the mock server to run
//! offline. Set `RUST_LOG=thunderstore_sdk=debug` to see each request.

use thunderstore_sdk::{ApiError, PackageQuery, ThunderstoreClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut client = ThunderstoreClient::from_env()?;

    let communities = client.list_communities()?;
    println!("{} communities", communities.len());
    for community in communities.iter().take(5) {
        println!("  {} ({})", community.name, community.identifier);
    }

    let packages = client.list_packages(
        &PackageQuery::new()
            .community("riskofrain2")
            .ordering("-rating_score"),
    )?;
    println!("\ntop rated in riskofrain2:");
    for package in packages.iter().take(5) {
        let latest = package
            .latest_version()
            .map(|v| v.version_number.as_str())
            .unwrap_or("-");
        println!("  {} {} (rating {})", package.full_name, latest, package.rating_score);
    }

    match client.get_package_metrics("ebkr", "r2modman") {
        Ok(Some(metrics)) => println!("\nr2modman: {} downloads", metrics.downloads),
        Ok(None) => println!("\nr2modman is not listed"),
        Err(ApiError::RateLimited { .. }) => println!("\nthrottled, try again later"),
        Err(e) => return Err(e.into()),
    }

    let mut cursor = None;
    loop {
        let page = client.list_community_categories("riskofrain2", cursor.as_deref())?;
        for category in &page.results {
            println!("  category: {}", category.name);
        }
        match page.next_cursor() {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    client.close();
    Ok(())
}
