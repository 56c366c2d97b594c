use super::open_store;
use crate::config::Config;

pub async fn cmd_clear(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let removed = store.results().clear().await?;

    println!("✓ Removed {removed} stored result(s)");

    Ok(())
}
