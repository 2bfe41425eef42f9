//! assetfs - Query an overlaying asset filesystem
//!
//! Usage:
//!   assetfs init --root <dir>...     - Write a configuration file
//!   assetfs resolve <path>          - Show which root supplies a path
//!   assetfs cat <path>              - Print a resolved file
//!   assetfs walk [dir]              - List the merged sub-tree
//!   assetfs ls [dir]                - List one directory level
//!   assetfs glob <pattern>          - Match paths, first root wins
//!   assetfs status                  - Show roots and namespaces

use anyhow::{Context as _, Result};
use assetfs::{
    config::Config,
    fs::{AssetFileSystem, FileInfo, FsNode, GlobPattern, WalkMode},
    Context,
};
use chrono::{DateTime, Local};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "assetfs")]
#[command(author = "assetfs Contributors")]
#[command(version)]
#[command(about = "Overlaying asset filesystem with namespaces and parent fallback")]
struct Cli {
    /// Configuration file path (JSON or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Extra root directories, searched before the configured ones
    #[arg(short, long = "root")]
    roots: Vec<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LookupFlags {
    /// Namespace path to query from, e.g. `admin/theme`
    #[arg(long)]
    ns: Option<String>,

    /// Probe roots last-registered first
    #[arg(long)]
    reverse: bool,

    /// Do not descend into namespaces
    #[arg(long)]
    no_namespaces: bool,

    /// Do not fall back to parent nodes
    #[arg(long)]
    no_parent: bool,
}

impl LookupFlags {
    /// Command-line flags can only narrow the configured lookup
    fn apply(&self, mode: WalkMode) -> WalkMode {
        mode.with_reverse(mode.reverse || self.reverse)
            .with_namespaces(mode.namespaces && !self.no_namespaces)
            .with_parent(mode.parent && !self.no_parent)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write a configuration file listing the given roots
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show which physical file a virtual path resolves to
    Resolve {
        path: String,

        #[command(flatten)]
        lookup: LookupFlags,
    },

    /// Print the content of a resolved file
    Cat {
        path: String,

        #[command(flatten)]
        lookup: LookupFlags,
    },

    /// Walk the merged sub-tree below a directory
    Walk {
        #[arg(default_value = ".")]
        dir: String,

        /// Report directories only
        #[arg(long, conflicts_with = "files_only")]
        dirs_only: bool,

        /// Report files only
        #[arg(long)]
        files_only: bool,

        #[command(flatten)]
        lookup: LookupFlags,
    },

    /// List one directory level across all roots
    Ls {
        #[arg(default_value = ".")]
        dir: String,

        #[command(flatten)]
        lookup: LookupFlags,
    },

    /// Match a glob pattern, each virtual path reported once
    Glob {
        pattern: String,

        /// Match directories as well as files
        #[arg(long)]
        dirs: bool,

        #[arg(long)]
        ns: Option<String>,
    },

    /// Show configured roots and namespaces
    Status,
}

fn main() {
    let cli = Cli::parse();

    // Setup logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    let config_path = cli
        .config
        .as_deref()
        .map(expand_tilde)
        .unwrap_or_else(Config::default_path);

    if let Err(e) = run_command(cli.command, &config_path, cli.roots) {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run_command(command: Commands, config_path: &Path, roots: Vec<PathBuf>) -> Result<()> {
    match command {
        Commands::Init { force } => cmd_init(config_path, roots, force),

        Commands::Resolve { path, lookup } => {
            let (fs, mode) = open_overlay(config_path, roots)?;
            cmd_resolve(&fs, &path, &lookup, mode)
        }

        Commands::Cat { path, lookup } => {
            let (fs, mode) = open_overlay(config_path, roots)?;
            cmd_cat(&fs, &path, &lookup, mode)
        }

        Commands::Walk {
            dir,
            dirs_only,
            files_only,
            lookup,
        } => {
            let (fs, mode) = open_overlay(config_path, roots)?;
            let mode = lookup
                .apply(mode)
                .with_files(!dirs_only)
                .with_dirs(!files_only);
            let node = select_node(&fs, lookup.ns.as_deref())?;
            node.walk(&dir, print_entry, mode)?;
            Ok(())
        }

        Commands::Ls { dir, lookup } => {
            let (fs, mode) = open_overlay(config_path, roots)?;
            let node = select_node(&fs, lookup.ns.as_deref())?;
            node.read_dir(&dir, print_entry, lookup.apply(mode))?;
            Ok(())
        }

        Commands::Glob { pattern, dirs, ns } => {
            let (fs, _) = open_overlay(config_path, roots)?;
            cmd_glob(&fs, &pattern, dirs, ns.as_deref())
        }

        Commands::Status => cmd_status(config_path, roots),
    }
}

fn cmd_resolve(fs: &AssetFileSystem, path: &str, lookup: &LookupFlags, mode: WalkMode) -> Result<()> {
    let node = select_node(fs, lookup.ns.as_deref())?;
    let info = node.resolve_with(&Context::new(), path, lookup.apply(mode))?;
    println!("{}", info.real_path().display());
    Ok(())
}

fn cmd_cat(fs: &AssetFileSystem, path: &str, lookup: &LookupFlags, mode: WalkMode) -> Result<()> {
    let node = select_node(fs, lookup.ns.as_deref())?;
    let info = node.resolve_with(&Context::new(), path, lookup.apply(mode))?;
    let mut file = info.open()?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    std::io::copy(&mut file, &mut out)
        .with_context(|| format!("Failed to copy {:?}", info.real_path()))?;
    out.flush()?;
    Ok(())
}

fn cmd_glob(fs: &AssetFileSystem, pattern: &str, dirs: bool, ns: Option<&str>) -> Result<()> {
    let node = select_node(fs, ns)?;
    let mut pattern = GlobPattern::parse(pattern)?;
    if dirs {
        pattern = pattern.with_dirs(true);
    }
    debug!("glob pattern: {:?}", pattern);
    node.glob(&pattern, print_entry)?;
    Ok(())
}

fn cmd_init(config_path: &Path, roots: Vec<PathBuf>, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "{:?} already exists (use --force to overwrite)",
            config_path
        );
    }

    let mut config = Config::default();
    for root in roots {
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(root)
        };
        config.roots.push(root);
    }
    config.validate()?;

    // Ensure config directory exists
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    config.save(config_path)?;

    info!("Configuration saved to {:?}", config_path);
    info!("Roots: {}", config.roots.len());
    Ok(())
}

fn cmd_status(config_path: &Path, roots: Vec<PathBuf>) -> Result<()> {
    let config = load_config(config_path, roots)?;
    let fs = config.build()?;

    println!("assetfs Status");
    println!("==============");
    println!();
    println!("Configuration: {:?}", config_path);
    println!(
        "Lookup: reverse={} namespaces={} parent={}",
        config.lookup.reverse, config.lookup.namespaces, config.lookup.parent
    );
    println!();
    print_node(fs.root_node(), 0);
    Ok(())
}

fn print_node(node: FsNode<'_>, depth: usize) {
    let indent = "  ".repeat(depth);
    let label = if node.path().is_empty() { "/" } else { node.path() };
    println!("{}{}", indent, label);
    for root in node.roots().iter(false) {
        let state = if root.is_dir() { "" } else { " (missing)" };
        println!("{}  - {}{}", indent, root.display(), state);
    }
    for ns in node.namespaces() {
        print_node(ns, depth + 1);
    }
}

/// Build the overlay and its default walk mode
fn open_overlay(config_path: &Path, roots: Vec<PathBuf>) -> Result<(AssetFileSystem, WalkMode)> {
    let config = load_config(config_path, roots)?;
    let fs = config.build().context("Failed to build overlay")?;
    Ok((fs, config.walk_mode()))
}

/// Load the config file if present, otherwise start from defaults
fn load_config(config_path: &Path, roots: Vec<PathBuf>) -> Result<Config> {
    let mut config = if config_path.exists() {
        Config::load(config_path)
            .with_context(|| format!("Failed to load {:?}", config_path))?
    } else {
        debug!("{:?} not found, using defaults", config_path);
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    };

    config.prepend_roots(roots);
    config.validate()?;
    Ok(config)
}

fn select_node<'a>(fs: &'a AssetFileSystem, ns: Option<&str>) -> Result<FsNode<'a>> {
    let mut node = fs.root_node();
    if let Some(path) = ns {
        for name in path.split('/').filter(|s| !s.is_empty()) {
            node = node
                .namespace(name)
                .ok_or_else(|| assetfs::Error::NamespaceNotFound(path.to_string()))?;
        }
    }
    Ok(node)
}

fn print_entry(info: FileInfo) -> assetfs::Result<()> {
    let kind = if info.is_dir() { 'd' } else { '-' };
    let mtime: DateTime<Local> = info.modified().into();
    println!(
        "{} {:>10} {} {}  ({})",
        kind,
        info.size(),
        mtime.format("%Y-%m-%d %H:%M"),
        info.path(),
        info.real_path().display()
    );
    Ok(())
}

/// Expand ~ to home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
