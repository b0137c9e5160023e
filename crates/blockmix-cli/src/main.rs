//! blockmix CLI
//!
//! Command-line front end for:
//! - Synthesizing weighted `//replace` commands from saved projects
//! - Editing the block catalog (`blocks.json`)
//! - Inspecting archetypes and existing commands

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

use blockmix_core::{
    naming::readable_name, parse_replace_command, Archetype, BlockCatalog, ExactNameResolver,
    PropertyMap, ReplacementSet, StructureType,
};
use blockmix_storage::{export_command, CatalogStore, ProjectSnapshot, StorageConfig};

#[derive(Parser)]
#[command(name = "blockmix")]
#[command(
    author,
    version,
    about = "blockmix: weighted //replace commands for world editors"
)]
struct Cli {
    /// Block catalog file [default: blocks.json].
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
    /// More log output on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize the `//replace` command for a saved project.
    Generate {
        /// Project file (`project.json`).
        project: PathBuf,
        /// Write the command to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Inspect and edit the block catalog.
    Blocks {
        #[command(subcommand)]
        command: BlockCommands,
    },

    /// Print the traits an archetype composes and their legal values.
    ///
    /// Accepts archetype names (`Stair`) and structure labels
    /// (`Upside Down Stair`).
    Archetype { name: String },

    /// Create and manage project files.
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Parse a `//replace` command and print its entries.
    Parse {
        /// Command text; several arguments are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
}

#[derive(Subcommand)]
enum BlockCommands {
    /// List catalog blocks, optionally only those a structure type may use.
    #[command(aliases = ["ls"])]
    List {
        #[arg(long)]
        structure: Option<StructureType>,
    },
    /// Show one block's state properties.
    Show { id: String },
    /// Add a new block.
    Add {
        id: String,
        /// State property and its legal values, e.g. `--prop half=bottom,top`.
        #[arg(long = "prop", value_name = "KEY=V1,V2")]
        props: Vec<String>,
    },
    /// Replace all state properties of an existing block.
    Edit {
        id: String,
        #[arg(long = "prop", value_name = "KEY=V1,V2")]
        props: Vec<String>,
    },
    /// Remove a block (no error if it is absent).
    #[command(aliases = ["rm"])]
    Remove { id: String },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// Write a new project using the first candidate blocks of a structure.
    Init {
        out: PathBuf,
        #[arg(long)]
        structure: StructureType,
        #[arg(long)]
        base: String,
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = StorageConfig::default();
    if let Some(path) = cli.catalog {
        config.catalog_path = path;
    }

    match cli.command {
        Commands::Generate { project, out } => cmd_generate(&config, &project, out.as_deref()),
        Commands::Blocks { command } => match command {
            BlockCommands::List { structure } => cmd_blocks_list(&config, structure),
            BlockCommands::Show { id } => cmd_blocks_show(&config, &id),
            BlockCommands::Add { id, props } => cmd_blocks_add(&config, &id, &props),
            BlockCommands::Edit { id, props } => cmd_blocks_edit(&config, &id, &props),
            BlockCommands::Remove { id } => cmd_blocks_remove(&config, &id),
        },
        Commands::Archetype { name } => cmd_archetype(&name),
        Commands::Project { command } => match command {
            ProjectCommands::Init {
                out,
                structure,
                base,
                count,
            } => cmd_project_init(&config, &out, structure, &base, count),
        },
        Commands::Parse { text } => cmd_parse(&text.join(" ")),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

// ============================================================================
// Catalog helpers
// ============================================================================

/// Catalog for read-only commands. A broken file is reported and treated as
/// empty.
fn read_catalog(config: &StorageConfig) -> CatalogStore {
    let (store, err) = CatalogStore::open_or_empty(config);
    if let Some(err) = err {
        if !err.is_not_found() {
            eprintln!("{} {err}", "warning:".yellow().bold());
        }
    }
    store
}

/// Catalog for editing commands. A missing file starts empty; a malformed one
/// is an error so it is never overwritten.
fn edit_catalog(config: &StorageConfig) -> Result<CatalogStore> {
    match CatalogStore::open(config) {
        Ok(store) => Ok(store),
        Err(err) if err.is_not_found() => Ok(CatalogStore::empty(config)),
        Err(err) => Err(err).with_context(|| {
            format!(
                "refusing to edit {}; fix or move it first",
                config.catalog_path.display()
            )
        }),
    }
}

/// `["half=bottom,top", "facing=north"]` -> property map.
fn parse_props(specs: &[String]) -> Result<PropertyMap> {
    let mut map = PropertyMap::new();
    for spec in specs {
        let (key, values) = spec
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=V1,V2, got `{spec}`"))?;
        let key = key.trim();
        if key.is_empty() {
            bail!("missing property name in `{spec}`");
        }
        map.entry(key.to_string()).or_default().extend(
            values
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
        );
    }
    Ok(map)
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_generate(config: &StorageConfig, project: &Path, out: Option<&Path>) -> Result<()> {
    let store = read_catalog(config);
    let snapshot = ProjectSnapshot::load(project)
        .with_context(|| format!("failed to load project {}", project.display()))?;
    let set = snapshot
        .restore(store.catalog(), &ExactNameResolver)
        .context("failed to restore project")?;
    let command = set.synthesize().context("failed to synthesize command")?;

    match out {
        Some(out) => {
            export_command(out, &command)?;
            eprintln!("{} {}", "wrote".green().bold(), out.display().to_string().bold());
        }
        None => println!("{command}"),
    }
    Ok(())
}

fn cmd_blocks_list(config: &StorageConfig, structure: Option<StructureType>) -> Result<()> {
    let store = read_catalog(config);
    let catalog = store.catalog();
    let ids: Vec<String> = match structure {
        Some(structure) => catalog.filter_by_structure(structure),
        None => catalog.ids().map(str::to_string).collect(),
    };

    if ids.is_empty() {
        eprintln!("{} no blocks", "info:".yellow().bold());
        return Ok(());
    }
    for id in &ids {
        let keys: Vec<&str> = catalog
            .get(id)
            .map(|def| def.keys().collect())
            .unwrap_or_default();
        if keys.is_empty() {
            println!("{}  {}", id.bold(), readable_name(id).dimmed());
        } else {
            println!(
                "{}  {}  [{}]",
                id.bold(),
                readable_name(id).dimmed(),
                keys.join(", ").cyan()
            );
        }
    }
    Ok(())
}

fn cmd_blocks_show(config: &StorageConfig, id: &str) -> Result<()> {
    let store = read_catalog(config);
    let def = store
        .catalog()
        .get(id.trim())
        .ok_or_else(|| anyhow!("block `{}` is not in the catalog", id.trim()))?;

    println!("{} ({})", id.trim().bold(), readable_name(id.trim()));
    if def.is_empty() {
        println!("  {}", "no state properties".dimmed());
    }
    for (key, values) in def.properties() {
        println!("  {} {} {}", key.cyan(), "→".cyan(), values.join(", "));
    }
    Ok(())
}

fn cmd_blocks_add(config: &StorageConfig, id: &str, props: &[String]) -> Result<()> {
    let properties = parse_props(props)?;
    let mut store = edit_catalog(config)?;
    store
        .add(id, properties)
        .with_context(|| format!("failed to add `{id}`"))?;
    eprintln!("{} {}", "added".green().bold(), id.trim().bold());
    Ok(())
}

fn cmd_blocks_edit(config: &StorageConfig, id: &str, props: &[String]) -> Result<()> {
    let properties = parse_props(props)?;
    let mut store = edit_catalog(config)?;
    store
        .update(id, properties)
        .with_context(|| format!("failed to update `{id}`"))?;
    eprintln!("{} {}", "updated".green().bold(), id.trim().bold());
    Ok(())
}

fn cmd_blocks_remove(config: &StorageConfig, id: &str) -> Result<()> {
    let mut store = edit_catalog(config)?;
    if store.remove(id)? {
        eprintln!("{} {}", "removed".green().bold(), id.trim().bold());
    } else {
        eprintln!("{} `{}` was not in the catalog", "info:".yellow().bold(), id.trim());
    }
    Ok(())
}

fn cmd_archetype(name: &str) -> Result<()> {
    let archetype = match name.parse::<Archetype>() {
        Ok(archetype) => archetype,
        Err(err) => name
            .parse::<StructureType>()
            .map(StructureType::archetype)
            .map_err(|_| err)?,
    };

    println!("{}", archetype.name().bold());
    let traits = archetype.properties();
    if traits.is_empty() {
        println!("  {}", "no state properties".dimmed());
    }
    for t in traits {
        println!("  {} {} {}", t.name.cyan(), "→".cyan(), t.values.join(", "));
    }
    Ok(())
}

fn cmd_project_init(
    config: &StorageConfig,
    out: &Path,
    structure: StructureType,
    base: &str,
    count: usize,
) -> Result<()> {
    if base.trim().is_empty() {
        bail!("--base must name a block");
    }
    let store = read_catalog(config);
    let catalog: &BlockCatalog = store.catalog();

    let mut set = ReplacementSet::new(catalog, structure);
    set.set_base_text(catalog, base, &ExactNameResolver);
    set.set_entry_count(catalog, count)?;
    if set.candidates().is_empty() {
        eprintln!(
            "{} the catalog has no {} blocks; entries are left empty",
            "warning:".yellow().bold(),
            structure
        );
    }

    let mut snapshot = ProjectSnapshot::capture(&set);
    snapshot
        .save(out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    eprintln!("{} {}", "wrote".green().bold(), out.display().to_string().bold());

    match set.synthesize() {
        Ok(command) => println!("{command}"),
        Err(err) => eprintln!("{} {err}", "warning:".yellow().bold()),
    }
    Ok(())
}

fn cmd_parse(text: &str) -> Result<()> {
    let command = parse_replace_command(text)?;
    println!("{} {}", "base".bold(), command.base);
    for entry in &command.entries {
        let props: Vec<String> = entry
            .properties
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        println!(
            "  {:>3}%  {}  {}",
            entry.percent,
            entry.block.bold(),
            props.join(" ").cyan()
        );
    }

    let total = format!("{}%", command.total_percent());
    if command.total_percent() == 100 {
        println!("{} {}", "total".bold(), total.green());
    } else {
        println!("{} {}", "total".bold(), total.yellow());
    }
    Ok(())
}
