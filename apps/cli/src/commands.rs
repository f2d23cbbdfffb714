//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use contentkit_core::{
    construct_content_paths, construct_nested_structure, generate_category_nodes_from_paths,
    validate_structure,
};
use contentkit_extractor::{SchemaExtractor, WidgetRegistry, error_chain};
use contentkit_shared::{AppConfig, ContentNode, ExtractorOptions, Schema, init_config, load_config};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// contentkit — assemble content trees and extract collection schemas.
#[derive(Parser)]
#[command(
    name = "contentkit",
    version,
    about = "Assemble content trees and extract collection schemas from module files.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build the nested content tree from a JSON list of content nodes.
    Tree {
        /// JSON file holding an array of content nodes.
        input: PathBuf,

        /// Print the flat path index instead of the nested tree.
        #[arg(long)]
        flat: bool,

        /// Skip structural validation even if the config enables it.
        #[arg(long)]
        no_validate: bool,
    },

    /// Derive category nodes from a JSON list of schemas with paths.
    Categories {
        /// JSON file holding an array of schemas.
        input: PathBuf,
    },

    /// Extract the schema from a single collection module.
    Extract {
        /// Module file (e.g. `posts.ts`).
        file: PathBuf,
    },

    /// Extract every collection module under a directory.
    Ingest {
        /// Root directory of collection modules.
        dir: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries JSON output.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "contentkit=info",
        1 => "contentkit=debug",
        _ => "contentkit=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Tree {
            input,
            flat,
            no_validate,
        } => cmd_tree(&input, flat, no_validate).await,
        Command::Categories { input } => cmd_categories(&input).await,
        Command::Extract { file } => cmd_extract(&file).await,
        Command::Ingest { dir } => cmd_ingest(&dir).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_tree(input: &Path, flat: bool, no_validate: bool) -> Result<()> {
    let config = load_config()?;
    let nodes: Vec<ContentNode> = read_json(input).await?;

    info!(path = %input.display(), nodes = nodes.len(), flat, "assembling content tree");

    if config.tree.validate_input && !no_validate {
        if let Err(issues) = validate_structure(&nodes) {
            for issue in &issues {
                warn!(%issue, "structural issue");
            }
            return Err(eyre!(
                "{} structural issue(s) in {} (pass --no-validate to assemble anyway)",
                issues.len(),
                input.display()
            ));
        }
    }

    let output = if flat {
        serde_json::to_string_pretty(&construct_content_paths(&nodes))?
    } else {
        serde_json::to_string_pretty(&construct_nested_structure(&nodes))?
    };
    println!("{output}");
    Ok(())
}

async fn cmd_categories(input: &Path) -> Result<()> {
    let schemas: Vec<Schema> = read_json(input).await?;
    let categories = generate_category_nodes_from_paths(&schemas);

    info!(schemas = schemas.len(), categories = categories.len(), "derived category nodes");
    println!("{}", serde_json::to_string_pretty(&categories)?);
    Ok(())
}

async fn cmd_extract(file: &Path) -> Result<()> {
    let config = load_config()?;
    let extractor = build_extractor(&config);

    let source = read_text(file).await?;
    let schema = extractor
        .extract(&source)
        .map_err(|e| eyre!("no schema extracted from {}: {}", file.display(), error_chain(&e)))?;

    info!(uuid = %schema.id, file = %file.display(), "schema extracted");
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

async fn cmd_ingest(dir: &Path) -> Result<()> {
    let config = load_config()?;
    let extractor = build_extractor(&config);

    let files = collect_module_files(dir, &config.extractor.module_extensions).await?;
    info!(dir = %dir.display(), files = files.len(), "ingesting collection modules");

    let bar = ProgressBar::new(files.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {msg}")?
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    let schemas = extract_modules(dir, &files, &extractor, &bar).await;
    bar.finish_and_clear();

    let categories = generate_category_nodes_from_paths(&schemas);
    info!(
        schemas = schemas.len(),
        skipped = files.len() - schemas.len(),
        categories = categories.len(),
        "ingest complete"
    );

    let output = json!({ "schemas": schemas, "categories": categories });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Extract each file's schema with `path` set relative to `root`.
///
/// Unreadable files and modules without a schema are logged and skipped.
async fn extract_modules(
    root: &Path,
    files: &[PathBuf],
    extractor: &SchemaExtractor<WidgetRegistry>,
    bar: &ProgressBar,
) -> Vec<Schema> {
    let mut schemas = Vec::new();
    for file in files {
        let relative = relative_path(root, file);
        bar.set_message(relative.clone());

        let source = match tokio::fs::read_to_string(file).await {
            Ok(source) => source,
            Err(e) => {
                warn!(path = %relative, error = %e, "skipping unreadable module");
                bar.inc(1);
                continue;
            }
        };
        if let Some(mut schema) = extractor.process_module(&source) {
            debug!(uuid = %schema.id, path = %relative, "schema extracted");
            schema.path = Some(relative);
            schemas.push(schema);
        }
        bar.inc(1);
    }
    schemas
}

fn build_extractor(config: &AppConfig) -> SchemaExtractor<WidgetRegistry> {
    SchemaExtractor::with_options(
        WidgetRegistry::with_builtin_widgets(),
        ExtractorOptions::from(config),
    )
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("cannot read {}", path.display()))
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = read_text(path).await?;
    serde_json::from_str(&content).wrap_err_with(|| format!("invalid JSON in {}", path.display()))
}

/// Walk `root` without recursion and return matching files, sorted.
async fn collect_module_files(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .wrap_err_with(|| format!("cannot list {}", dir.display()))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() && has_extension(&path, extensions) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|wanted| wanted == ext))
}

/// `root/a/b/c.ts` → `a/b/c.ts`, always `/`-separated.
fn relative_path(root: &Path, file: &Path) -> String {
    file.strip_prefix(root)
        .unwrap_or(file)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
