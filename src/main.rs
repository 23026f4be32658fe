use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use symgraph::{
    CallDirection, FsDocuments, HierarchyProvider, Position, Settings, StdioEngine, TypeDirection,
};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "symgraph")]
#[command(about = "Call and type hierarchy synthesis over a source-analysis engine")]
struct Cli {
    /// Path to a settings file (default: discover .symgraph/settings.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration file
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration
    Config,

    /// Compute a call hierarchy at a position
    Calls {
        /// File to query
        file: String,

        /// Zero-based line of the position
        #[arg(short, long)]
        line: u32,

        /// Zero-based column of the position
        #[arg(short, long)]
        column: u32,

        /// incoming (callers) or outgoing (callees)
        #[arg(short, long, default_value = "incoming")]
        direction: String,

        /// How many edge layers to expand eagerly
        #[arg(short = 'r', long, default_value_t = 1)]
        depth: u32,
    },

    /// Compute a type hierarchy at a position
    Types {
        /// File to query
        file: String,

        /// Zero-based line of the position
        #[arg(short, long)]
        line: u32,

        /// Zero-based column of the position
        #[arg(short, long)]
        column: u32,

        /// supertypes, subtypes, or both
        #[arg(short, long, default_value = "both")]
        direction: String,

        /// How many edge layers to expand eagerly
        #[arg(short = 'r', long, default_value_t = 1)]
        depth: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .map_err(|e| anyhow::anyhow!(e))
    .context("failed to load configuration")?;

    symgraph::logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Init { force } => {
            let path = Settings::init_config_file(force)
                .map_err(|e| anyhow::anyhow!(e.to_string()))?;
            println!("Created {}", path.display());
        }

        Commands::Config => {
            print!("{}", toml::to_string_pretty(&settings)?);
        }

        Commands::Calls {
            file,
            line,
            column,
            direction,
            depth,
        } => {
            let direction: CallDirection = direction.parse().map_err(anyhow::Error::msg)?;
            let provider = build_provider(&settings).await?;
            let cancel = cancel_on_ctrl_c();

            let item = provider
                .call_hierarchy(&file, Position::new(line, column), direction, depth, &cancel)
                .await;
            println!("{}", serde_json::to_string_pretty(&item)?);
        }

        Commands::Types {
            file,
            line,
            column,
            direction,
            depth,
        } => {
            let direction: TypeDirection = direction.parse().map_err(anyhow::Error::msg)?;
            let provider = build_provider(&settings).await?;
            let cancel = cancel_on_ctrl_c();

            let item = provider
                .type_hierarchy(&file, Position::new(line, column), direction, depth, &cancel)
                .await;
            println!("{}", serde_json::to_string_pretty(&item)?);
        }
    }

    Ok(())
}

async fn build_provider(
    settings: &Settings,
) -> Result<HierarchyProvider<StdioEngine, FsDocuments>> {
    let engine = StdioEngine::spawn(
        &settings.engine.command,
        &settings.engine.args,
        settings.engine.timeout(),
    )
    .await
    .with_context(|| format!("failed to start engine `{}`", settings.engine.command))?;

    let docs = match Settings::workspace_root() {
        Some(root) => FsDocuments::with_root(root),
        None => FsDocuments::new(),
    };

    Ok(HierarchyProvider::new(engine, docs).with_max_depth(settings.hierarchy.max_resolve_depth))
}

/// A token cancelled by Ctrl-C, so an interrupted query prints nothing
/// partial.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal.cancel();
        }
    });
    token
}
