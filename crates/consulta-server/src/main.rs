//! Consulta: temporal-context chat assistant service.

use std::path::PathBuf;
use std::sync::Arc;

use consulta_core::{ConsultaConfig, SystemClock};
use consulta_prompt::{contextualize_query, AssistantScope, TemporalClass};
use consulta_server::{build_router, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn resolve_data_dir() -> PathBuf {
    std::env::var("CONSULTA_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

fn print_help() {
    println!("Consulta: temporal-context chat assistant service");
    println!();
    println!("Usage: consulta [command]");
    println!();
    println!("Commands:");
    println!("  (none)                        Start the server");
    println!("  context <query> [assistant]   Print the temporal context and prompt for a query");
    println!("  help                          Show this help message");
}

/// Offline smoke test: run extractor and contextualizer for one query.
fn print_context(config: &ConsultaConfig, query: &str, assistant: Option<&str>) -> anyhow::Result<()> {
    let clock = SystemClock::new(config.timezone);
    let scope = assistant
        .map(AssistantScope::resolve)
        .unwrap_or_else(AssistantScope::general);
    let contextualized = contextualize_query(query, &clock, config.timezone_name(), &scope);

    println!("{}", serde_json::to_string_pretty(&contextualized.context)?);
    println!("Classification: {}", TemporalClass::of(&contextualized.context).label());
    println!();
    println!("{}", contextualized.prompt);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let data_dir = resolve_data_dir();
    let config = ConsultaConfig::from_env(&data_dir)?;

    // Handle CLI subcommands
    if args.len() > 1 {
        match args[1].as_str() {
            "context" | "--context" => {
                let Some(query) = args.get(2) else {
                    eprintln!("Usage: consulta context <query> [assistant]");
                    std::process::exit(1);
                };
                return print_context(&config, query, args.get(3).map(String::as_str));
            }
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'consulta help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    info!("Data directory: {}", data_dir.display());
    info!("Civil timezone: {}", config.timezone_name());

    let port = config.port;
    let state = Arc::new(AppState::new(config));

    if state.llm_config.read().resolve().is_none() {
        info!("No API key configured; /api/chat will return 503 until one is set");
    }

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Consulta server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
