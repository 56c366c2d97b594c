use crate::clients::CustomSearchClient;
use crate::config::Config;
use crate::services::{LinkSearch, build_query};

pub async fn cmd_search(config: &Config, label: &str) -> anyhow::Result<()> {
    config.validate_search()?;

    let query = build_query(label);
    println!("Searching for: {query}");

    let client = CustomSearchClient::new(&config.search)?;
    let hits = client.search(&query, config.search.max_results).await?;

    if hits.is_empty() {
        println!("No purchase links found for '{label}'");
        return Ok(());
    }

    println!();
    println!("Search Results:");
    println!("{:-<60}", "");

    for hit in &hits {
        println!("• {}", hit.title);
        println!("  {}", hit.link);
    }

    Ok(())
}
