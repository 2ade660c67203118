use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jyotish_mcp::{
    CALCULATIONS_DIR_ENV, InvocationRequest, PYTHON_ENV, WORKER_TIMEOUT_ENV, WorkerConfig,
    create_server, init_tracing, jyotish_catalog, parse_timeout_secs, start_mcp_http,
};
use std::path::PathBuf;
use tracing::{error, info};

// rmcp imports for MCP stdio server mode
use rmcp::service::ServiceExt;
use rmcp::transport::stdio;

#[derive(Parser)]
#[command(name = "jyotish-mcp")]
#[command(about = "Vedic astrology MCP server backed by calculation workers")]
#[command(version)]
struct Cli {
    /// Directory holding the worker scripts (default: located next to the executable)
    #[arg(long, global = true, env = CALCULATIONS_DIR_ENV)]
    calculations_dir: Option<PathBuf>,
    /// Interpreter used when the calculations directory has no venv
    #[arg(long, global = true, env = PYTHON_ENV)]
    python: Option<String>,
    /// Per-call worker deadline in seconds
    #[arg(long, global = true, env = WORKER_TIMEOUT_ENV)]
    worker_timeout_secs: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run as an MCP stdio server (for use in mcp.json)
    McpStdio,
    /// Run as an MCP HTTP server
    McpHttp {
        /// Bind address, e.g. 127.0.0.1:3942
        #[arg(long, env = "JYOTISH_MCP_BIND", default_value = "127.0.0.1:3942")]
        bind: String,
    },
    /// Print the tool catalog as JSON
    ListTools,
    /// Run a single tool call and print the response
    Call {
        /// Tool name, e.g. chart_list
        tool: String,
        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
}

impl Cli {
    fn worker_config(&self) -> Result<WorkerConfig> {
        let mut config = match &self.calculations_dir {
            Some(dir) => WorkerConfig::new(dir),
            None => WorkerConfig::from_env()?,
        };
        if let Some(python) = &self.python {
            config = config.with_fallback_interpreter(python);
        }
        if let Some(raw) = &self.worker_timeout_secs {
            config = config.with_timeout(
                parse_timeout_secs(raw).context("invalid --worker-timeout-secs")?,
            );
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    run(cli).await.inspect_err(|e| error!("{:#}", e))
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command.as_ref().unwrap_or(&Commands::McpStdio) {
        Commands::McpStdio => {
            let config = cli.worker_config()?;
            info!(
                calculations_dir = %config.calculations_dir.display(),
                "Starting MCP stdio server (rmcp)"
            );

            let server = create_server(config)?;
            info!(
                "Jyotish MCP Server v{} running on stdio",
                env!("CARGO_PKG_VERSION")
            );

            // Run as an MCP stdio server. McpServer implements ServerHandler.
            let service = server
                .as_ref()
                .clone()
                .serve(stdio())
                .await
                .inspect_err(|e| error!("serving error: {:?}", e))?;

            // Block until the MCP session ends.
            service.waiting().await?;
            info!("MCP stdio server session ended");
        }
        Commands::McpHttp { bind } => {
            let config = cli.worker_config()?;
            info!(
                calculations_dir = %config.calculations_dir.display(),
                "Starting MCP HTTP server (rmcp) on {}", bind
            );

            let server = create_server(config)?;

            info!(
                "Jyotish MCP Server v{} running on http://{}/mcp",
                env!("CARGO_PKG_VERSION"),
                bind
            );
            start_mcp_http(server, bind).await?;
        }
        Commands::ListTools => {
            let registry = jyotish_catalog()?;
            let tools = serde_json::to_string_pretty(&registry.list_tools())?;
            println!("{}", tools);
        }
        Commands::Call { tool, args } => {
            let arguments = match serde_json::from_str(args)
                .with_context(|| format!("--args is not valid JSON: {}", args))?
            {
                serde_json::Value::Object(map) => map,
                other => anyhow::bail!("--args must be a JSON object, got {}", other),
            };

            let server = create_server(cli.worker_config()?)?;
            let envelope = server
                .dispatcher()
                .dispatch(InvocationRequest::new(tool.clone(), arguments))
                .await;

            println!("{}", serde_json::to_string_pretty(&envelope)?);
            if envelope.is_error() {
                anyhow::bail!("tool {} returned an error", tool);
            }
        }
    }

    Ok(())
}
