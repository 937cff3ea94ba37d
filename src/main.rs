//! jumpline - jump to the same file and line in an external IDE.
//!
//! This binary is the host-side surface for the jump core. It provides
//! commands for:
//!
//! - Triggering a jump (`jumpline open`)
//! - Managing the editor registry (`jumpline editors ...`)
//! - Inspecting cache/execution diagnostics (`jumpline stats`)
//!
//! See `jumpline --help` for full usage information.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jumpline::config::Config;
use jumpline::context::ProjectContext;
use jumpline::editors::{EditorRegistry, EditorUpdate, NewEditor, TomlSettings};
use jumpline::service::JumpService;

const AFTER_HELP: &str = "\
COMMON WORKFLOWS:
  # Register your IDE once
  jumpline editors add --name idea --path /usr/local/bin/idea --default

  # Jump to a file position from the host editor
  jumpline open src/main.rs --line 42

EXAMPLES:
  jumpline editors list                 Show configured editors
  jumpline editors set-default <id>     Change the default editor
  jumpline open a.kt --line 7 -e idea   Jump with a specific editor
  jumpline stats                        Dump diagnostics as JSON

For more help, see: https://github.com/dufeutech/jumpline";

#[derive(Parser)]
#[command(name = "jumpline")]
#[command(version)]
#[command(about = "Open the current file and line in an external IDE")]
#[command(after_help = AFTER_HELP)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose/debug output for any command
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to an alternate config file
    #[arg(long, global = true, env = "JUMPLINE_CONFIG")]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the configured editor at a file position
    Open {
        /// File to open
        file: String,
        /// 1-based line number
        #[arg(short, long, default_value = "1")]
        line: u32,
        /// 1-based column number
        #[arg(short, long, default_value = "1")]
        column: u32,
        /// Editor to use (id, id prefix, or name); default editor otherwise
        #[arg(short, long)]
        editor: Option<String>,
        /// Project root (defaults to the current directory)
        #[arg(short, long)]
        root: Option<String>,
    },
    /// Manage the editor registry
    Editors {
        #[command(subcommand)]
        command: EditorCommands,
    },
    /// Dump cache and execution diagnostics as JSON
    Stats,
}

#[derive(Subcommand)]
enum EditorCommands {
    /// Register an editor
    Add {
        #[arg(short, long)]
        name: String,
        /// Path to the editor executable
        #[arg(short, long)]
        path: String,
        /// Editor family hint (intellij, webstorm, ...)
        #[arg(short, long)]
        kind: Option<String>,
        /// Make this the default editor
        #[arg(short, long)]
        default: bool,
    },
    /// List configured editors
    List,
    /// Remove an editor by id
    Rm { id: String },
    /// Make an editor the default
    SetDefault { id: String },
    /// Change an editor's name, path, or kind
    Update {
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        path: Option<String>,
        #[arg(short, long)]
        kind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    match cli.command {
        Commands::Open {
            file,
            line,
            column,
            editor,
            root,
        } => open(config, file, line, column, editor, root).await,
        Commands::Editors { command } => editors(command),
        Commands::Stats => stats(config).await,
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn settings() -> Result<TomlSettings> {
    TomlSettings::default_location().context("could not resolve the user config directory")
}

fn registry() -> Result<EditorRegistry> {
    EditorRegistry::open(Box::new(settings()?)).context("failed to load editor settings")
}

async fn open(
    config: Config,
    file: String,
    line: u32,
    column: u32,
    editor: Option<String>,
    root: Option<String>,
) -> Result<()> {
    let root = match root {
        Some(root) => root,
        None => std::env::current_dir()
            .context("could not determine the current directory")?
            .to_string_lossy()
            .into_owned(),
    };
    let context = ProjectContext::new(root, file, line, column)?;

    let service = JumpService::start(config, Box::new(settings()?))?;
    let result = service.jump_with(editor.as_deref(), &context).await;
    service.dispose().await;

    if result.success {
        println!(
            "Launched: {} ({}ms{})",
            result.command,
            result.execution_time.as_millis(),
            result
                .process_id
                .map(|pid| format!(", pid {pid}"))
                .unwrap_or_default()
        );
        Ok(())
    } else {
        bail!(
            "jump failed: {}",
            result.error.unwrap_or_else(|| "unknown error".to_string())
        );
    }
}

fn editors(command: EditorCommands) -> Result<()> {
    let mut registry = registry()?;
    match command {
        EditorCommands::Add {
            name,
            path,
            kind,
            default,
        } => {
            let added = registry.add(NewEditor {
                name,
                path,
                kind,
                make_default: default,
            })?;
            println!("Added {} ({})", added.name, added.id);
        }
        EditorCommands::List => {
            if registry.is_empty() {
                println!("No editors configured. Add one with `jumpline editors add`.");
                return Ok(());
            }
            for editor in registry.list() {
                let marker = if editor.is_default { "*" } else { " " };
                let kind = editor.kind.as_deref().unwrap_or("-");
                println!("{marker} {}  {}  [{}]  {}", editor.id, editor.name, kind, editor.path);
            }
        }
        EditorCommands::Rm { id } => {
            let removed = registry.remove(&id)?;
            println!("Removed {} ({})", removed.name, removed.id);
        }
        EditorCommands::SetDefault { id } => {
            registry.set_default(&id)?;
            println!("Default editor set");
        }
        EditorCommands::Update {
            id,
            name,
            path,
            kind,
        } => {
            let updated = registry.update(&id, EditorUpdate { name, path, kind })?;
            println!("Updated {} ({})", updated.name, updated.id);
        }
    }
    Ok(())
}

async fn stats(config: Config) -> Result<()> {
    let service = JumpService::start(config, Box::new(settings()?))?;
    let diagnostics = service.diagnostics();
    println!("{}", serde_json::to_string_pretty(&diagnostics)?);
    service.dispose().await;
    Ok(())
}
