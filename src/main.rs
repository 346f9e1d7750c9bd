use std::sync::Arc;

use resource_metrics::config::{load_config, print_schema};
use resource_metrics::migrations::Dialect;
use resource_metrics::startup::{plugin_host, run};
use resource_metrics::store::memory_store::MemoryStore;
use resource_metrics::utils::logger::init_logging;

/// Print the up migrations of every plugin, in dependency order.
fn print_sql(dialect: &str) -> Result<(), Box<dyn std::error::Error>> {
    let dialect: Dialect = dialect.parse()?;
    // Rendering migrations never touches the store.
    let host = plugin_host(Arc::new(MemoryStore::new()))?;
    for source in host.migrations()? {
        for migration in source.migrations {
            println!("-- {} {} {}", source.name, migration.version, migration.name);
            for statement in migration.up(dialect) {
                println!("{};", statement);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("--schema") => {
            print_schema();
            return;
        }
        Some("--sql") => {
            let dialect = args.get(2).map(String::as_str).unwrap_or("postgres");
            if let Err(e) = print_sql(dialect) {
                eprintln!("{}", e);
                std::process::exit(2);
            }
            return;
        }
        _ => {}
    }

    let config = Arc::new(load_config());

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
