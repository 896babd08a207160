use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nestegg::api::{MemoryRepository, run_http_server};
use nestegg::cli::{Cli, Command, build_inputs, render_projection, run_scenario_command};
use nestegg::core::project;

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Command::Serve { bind, port } => {
            init_tracing("info");
            run_http_server(
                SocketAddr::new(*bind, *port),
                Arc::new(MemoryRepository::default()),
            )
            .await
            .map_err(anyhow::Error::from)
        }
        Command::Project(args) => {
            init_tracing("warn");
            build_inputs(args.clone())
                .map(|inputs| print!("{}", render_projection(&project(&inputs))))
                .map_err(anyhow::Error::from)
        }
        Command::Scenarios(command) => {
            init_tracing("warn");
            run_scenario_command(&cli, command).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
