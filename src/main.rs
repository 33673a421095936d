use std::sync::Arc;

use apimap::config::{AppState, Config};
use apimap::dispatch::Registry;
use apimap::{logger, schema, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional config file path (without extension) as the first argument
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let cfg = Config::load_from(&config_path)?;

    logger::init(&cfg)?;

    let map = schema::load_map(&cfg.functions.map_file)?;
    let mut registry = Registry::new(map);

    // Built-in echo function; only takes effect when the map declares it
    registry.register_function(
        "echo",
        Arc::new(|body, _key, done, _req| {
            done.complete(Some(serde_json::json!({"status": "OK", "echo": body})), None);
        }),
        None,
    );

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        println!("[CONFIG] Using {workers} worker threads");
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(cfg, registry))
}

async fn async_main(cfg: Config, registry: Registry) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::new(cfg, registry));

    // Use LocalSet for spawn_local support
    let local = tokio::task::LocalSet::new();
    local.run_until(server::run(state)).await
}
