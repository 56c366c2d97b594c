use anyhow::Context;
use snapshop::{Config, run};

fn main() -> anyhow::Result<()> {
    // Worker count has to be known before the runtime exists.
    let worker_threads = Config::load()
        .context("Failed to load configuration")?
        .general
        .worker_threads;

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all().thread_name("snapshop-worker");

    if worker_threads > 0 {
        builder.worker_threads(worker_threads);
    }

    let runtime = builder.build()?;
    runtime.block_on(run())
}
