use horse_racing_admin::infra::{config, store};
use horse_racing_admin::RacingStore;

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight -- [--migrate]\n\
         \n\
         Requires env vars:\n\
           DATABASE_URL\n\
         Optional:\n\
           DB_MAX_CONNECTIONS, ID_ALLOCATION_ATTEMPTS, API_BIND_ADDR\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    let migrate = args.iter().any(|a| a == "--migrate");

    // Force-read config (nice error messages if missing)
    let _ = config::database_url()?;
    let max_connections = config::db_max_connections()?;
    let attempts = config::id_allocation_attempts()?;

    println!("> Preflight:");
    println!("  DB_MAX_CONNECTIONS={}", max_connections);
    println!("  ID_ALLOCATION_ATTEMPTS={}", attempts);
    println!("  API_BIND_ADDR={}", config::api_bind_addr());

    let store = store::connect_postgres().await?;
    store
        .ping()
        .await
        .map_err(|e| anyhow::anyhow!("Database is not reachable: {}", e))?;
    println!("  Database reachable.");

    if migrate {
        println!("  Applying migrations...");
        store.migrate().await?;
        println!("  Migrations applied.");
    }

    let missing = store.missing_tables().await?;
    if !missing.is_empty() {
        return Err(anyhow::anyhow!(
            "Missing tables: {}. Re-run with --migrate",
            missing.join(", ")
        ));
    }
    println!("  All racing tables present.");

    println!("> Preflight OK.");
    Ok(())
}
