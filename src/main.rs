use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sandfs::{
    Extensions, QueryOptions, Sandbox, SandboxBuilder, SandboxConfig, SearchOptions, SizeUnit,
    SortKey, SortOptions, SortOrder, INVALID_PATTERN,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sandfs", version, about = "Sandboxed filesystem toolkit")]
struct Cli {
    /// Confine every path under this directory (created if missing)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// JSON settings file; --root overrides its basePath
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a directory and its missing parents
    Mkdir { path: String },
    /// Delete a file or directory; missing paths succeed
    Remove { path: String },
    /// Print the filtered directory tree
    Tree {
        #[arg(default_value = ".")]
        path: String,
        /// Append size and modification time to files
        #[arg(long)]
        detail: bool,
        /// Keep directories without matching files
        #[arg(long)]
        empty: bool,
        /// Case-insensitive substring of the file name
        #[arg(long)]
        name: Option<String>,
        /// Regex over the file name
        #[arg(long)]
        regex: Option<String>,
        /// Extension filter, repeatable
        #[arg(long = "ext")]
        extensions: Vec<String>,
        /// Substring of the file content
        #[arg(long)]
        content: Option<String>,
        /// Regex over the file content
        #[arg(long)]
        content_regex: Option<String>,
        #[arg(long, value_enum, default_value_t = SortArg::Name)]
        sort: SortArg,
        /// Reverse the sort order (directories still come first)
        #[arg(long)]
        desc: bool,
    },
    /// Print metadata as JSON
    Stat { path: String },
    /// Print the recursive size
    Size {
        path: String,
        /// b, kb, mb, gb or tb; anything else means mb
        #[arg(long)]
        unit: Option<String>,
    },
    /// Copy a file or directory
    Copy { source: String, destination: String },
    /// Move a file or directory
    Move { source: String, destination: String },
    /// Pack a file or directory into a ZIP archive
    Zip {
        source: String,
        archive: Option<String>,
    },
    /// Extract a ZIP archive
    Unzip {
        archive: String,
        destination: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Name,
    Date,
    Size,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => SortKey::Name,
            SortArg::Date => SortKey::Date,
            SortArg::Size => SortKey::Size,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_sandbox(cli: &Cli) -> Result<Sandbox> {
    let config = match &cli.config {
        Some(path) => SandboxConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SandboxConfig::default(),
    };

    let mut builder = SandboxBuilder::from_config(config);
    if let Some(root) = &cli.root {
        builder = builder.base_path(root);
    }
    builder.build().context("Failed to initialize sandbox")
}

/// Run one command; `Ok(false)` means the operation reported failure
fn run(sandbox: &Sandbox, command: Command) -> Result<bool> {
    let succeeded = match command {
        Command::Mkdir { path } => sandbox.create_directory(&path),
        Command::Remove { path } => sandbox.remove(&path),
        Command::Tree {
            path,
            detail,
            empty,
            name,
            regex,
            extensions,
            content,
            content_regex,
            sort,
            desc,
        } => {
            let options = QueryOptions {
                detail,
                show_empty_folders: empty,
                search: SearchOptions {
                    name,
                    regex,
                    extension: (!extensions.is_empty()).then(|| Extensions::from(extensions)),
                    content,
                    content_regex,
                },
                sort: SortOptions {
                    by: sort.into(),
                    order: if desc { SortOrder::Desc } else { SortOrder::Asc },
                },
            };
            match sandbox.get_directory_tree(&path, &options) {
                Some(tree) if tree == INVALID_PATTERN => {
                    eprintln!("Invalid search pattern");
                    false
                }
                Some(tree) => {
                    println!("{}", tree);
                    true
                }
                None => false,
            }
        }
        Command::Stat { path } => match sandbox.get_metadata(&path) {
            Some(entry) => {
                let json = serde_json::to_string_pretty(&entry).context("Failed to encode metadata")?;
                println!("{}", json);
                true
            }
            None => false,
        },
        Command::Size { path, unit } => {
            let unit = SizeUnit::from_name_or_default(unit.as_deref());
            match sandbox.storage_size(&path, unit) {
                Some(size) => {
                    println!("{:.2} {}", size, unit);
                    true
                }
                None => false,
            }
        }
        Command::Copy { source, destination } => sandbox.copy(&source, &destination),
        Command::Move { source, destination } => sandbox.move_path(&source, &destination),
        Command::Zip { source, archive } => match sandbox.zip(&source, archive.as_deref()) {
            Some(path) => {
                println!("{}", path.display());
                true
            }
            None => false,
        },
        Command::Unzip { archive, destination } => {
            match sandbox.unzip(&archive, destination.as_deref()) {
                Some(path) => {
                    println!("{}", path.display());
                    true
                }
                None => false,
            }
        }
    };
    Ok(succeeded)
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    let sandbox = build_sandbox(&cli)?;

    if run(&sandbox, cli.command)? {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("Operation failed (set RUST_LOG=debug for details)");
        Ok(ExitCode::FAILURE)
    }
}
