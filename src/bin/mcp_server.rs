// Entry point for the MCP server binary
// Spawned by an MCP client; speaks JSON-RPC over stdin/stdout

use clap::Parser;
use data_analysis_mcp::config::Config;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mcp_server", version, about = "Data analysis MCP server (stdio)")]
struct Cli {
    /// Directory for generated histogram images [env: DATA_ANALYSIS_OUTPUT_DIR]
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Tracing filter directives [env: RUST_LOG]
    #[arg(long)]
    log_filter: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Keep stdout clean for JSON-RPC; a panic still answers the client
    std::panic::set_hook(Box::new(|panic_info| {
        let panic_msg = if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else {
            "Unknown panic occurred".to_string()
        };

        let location = panic_info
            .location()
            .map(|l| format!(" at {}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| " at unknown location".to_string());

        tracing::error!("Panic occurred{}: {}", location, panic_msg);

        let error_response = serde_json::json!({
            "jsonrpc": "2.0",
            "id": null,
            "error": {
                "code": -32603,
                "message": format!("Internal server error: {}", panic_msg),
                "data": format!("Panic occurred{}", location)
            }
        });

        if let Ok(error_json) = serde_json::to_string(&error_response) {
            println!("{}", error_json);
            let _ = std::io::stdout().flush();
        }

        std::process::exit(1);
    }));

    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(dir) = cli.output_dir {
        config.output_dir = Some(dir);
    }
    if let Some(filter) = cli.log_filter {
        config.log_filter = filter;
    }

    // Logs go to stderr so they don't interfere with stdout JSON-RPC
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| EnvFilter::new(data_analysis_mcp::config::DEFAULT_LOG_FILTER)),
        )
        .init();

    config.validate()?;

    data_analysis_mcp::core::mcp::run(config).await
}
