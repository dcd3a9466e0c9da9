use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use docs_assistant::agent::Orchestrator;
use docs_assistant::config::Config;
use docs_assistant::console::{self, render::Renderer};
use docs_assistant::llm::{ChatModel, LlmPool};
use docs_assistant::retrieval::process::ProcessLookup;
use docs_assistant::retrieval::query::QueryExtractor;
use docs_assistant::retrieval::RetrievalBridge;
use docs_assistant::tools::documentation::DocumentationTool;
use docs_assistant::tools::ToolDispatcher;

#[derive(Parser)]
#[command(name = "docs-assistant", about = "Ask questions about your documentation")]
struct Cli {
    /// YAML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model identifier (overrides OPENAI_MODEL and the config file).
    #[arg(short, long)]
    model: Option<String>,

    /// Disable colored output.
    #[arg(long)]
    no_color: bool,

    /// Log debug output to stderr.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("FATAL ERROR: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref(), cli.model)?;
    info!(model = %config.model, base_url = %config.base_url, "starting");

    let model: Arc<dyn ChatModel> = Arc::new(
        LlmPool::with_base_url(
            config.api_key.clone(),
            &config.model,
            config.base_url.clone(),
            config.request_timeout,
        )
        .context("building HTTP client")?
        .with_temperature(config.temperature),
    );

    let lookup = ProcessLookup::new(
        config.retriever.program.clone(),
        config.retriever.args.clone(),
        config.retriever.timeout(),
    )
    .with_working_dir(config.retriever.working_dir.clone());

    let bridge = RetrievalBridge::new(QueryExtractor::new(model.clone()), Arc::new(lookup))
        .with_documents_root(config.documents_root.clone());
    let dispatcher =
        ToolDispatcher::new().register(Arc::new(DocumentationTool::new(Arc::new(bridge))));

    let mut orchestrator = Orchestrator::new(model, dispatcher, &config.system_prompt)
        .with_max_tool_rounds(config.max_tool_rounds);

    let color = !cli.no_color && std::io::stdout().is_terminal();
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    console::run(&mut orchestrator, stdin, &mut stdout, Renderer::new(color)).await
}
