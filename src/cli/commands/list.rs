//! List stored results command handler

use super::open_store;
use crate::config::Config;
use crate::models::SearchResult;

pub async fn cmd_list(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let results: Vec<SearchResult> = store
        .results()
        .list_by_creation()
        .await?
        .into_iter()
        .map(SearchResult::from)
        .collect();

    if results.is_empty() {
        println!("No results stored.");
        println!();
        println!("Upload an image to the server, or run: snapshop detect <image>");
        return Ok(());
    }

    println!("Stored Results ({} total)", results.len());
    println!("{:-<70}", "");

    for result in results {
        println!("• {}", result.title);
        println!("  {}", result.link);
        println!("  Added: {}", result.created_at.format("%Y-%m-%d %H:%M:%S"));
    }

    Ok(())
}
