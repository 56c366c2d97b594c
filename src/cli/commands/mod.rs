mod clear;
mod detect;
mod list;
mod search;

pub use clear::cmd_clear;
pub use detect::cmd_detect;
pub use list::cmd_list;
pub use search::cmd_search;

use crate::config::Config;
use crate::db::Store;

async fn open_store(config: &Config) -> anyhow::Result<Store> {
    config.validate_database()?;
    Store::with_pool_options(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await
}
