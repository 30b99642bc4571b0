use clap::Parser;
use dotenvy::dotenv;
use log::*;
use vending_syncd::{cli::Arguments, config::SyncdConfig, orchestrator::run_sync_daemon};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let args = Arguments::parse();
    let config = SyncdConfig::from_env_or_default();

    info!("🚀️ Starting the vending order sync daemon");
    match run_sync_daemon(config, args).await {
        Ok(()) => println!("Bye!"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        },
    }
}
