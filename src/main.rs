//! # Oracc CLI (`oracc`)
//!
//! Command-line front end for the resolver: list projects, load catalogues,
//! texts and glossaries, and manage the local cache.
//!
//! ## Usage
//!
//! ```bash
//! oracc [--config ./oracc.toml] [--direct] [-v] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `oracc projects` | List projects in the Oracc directory |
//! | `oracc catalogue <project>` | Load a project catalogue |
//! | `oracc text <project> <key>` | Load one text edition |
//! | `oracc glossary <project> <type>` | Load a project glossary |
//! | `oracc members <project>` | List the files in a project archive |
//! | `oracc cache dir\|list\|clear` | Inspect or clear the cache |

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use oracc_resolver::config::{load_config, validate, Config};
use oracc_resolver::direct::DirectSiteResolver;
use oracc_resolver::models::{project_path_for_label, GlossaryType, Project, Provenance};
use oracc_resolver::{ArtifactSource, Resolver};

/// Oracc CLI: resolve and cache Oracc catalogues, texts and glossaries.
#[derive(Parser)]
#[command(
    name = "oracc",
    about = "Resolve and cache Oracc project catalogues, text editions and glossaries",
    version
)]
struct Cli {
    /// Path to a TOML configuration file. Built-in defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Query the live Oracc site instead of the cached archives. Only one
    /// project is served this way.
    #[arg(long, global = true)]
    direct: bool,

    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List projects.
    ///
    /// By default every project in the Oracc directory is listed. With
    /// `--available` only projects with a downloadable archive are shown.
    Projects {
        #[arg(long)]
        available: bool,
    },

    /// Load a project catalogue.
    Catalogue {
        /// Project path, e.g. `saao/saa13`.
        project: String,

        /// Print the decoded catalogue as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Load a text edition.
    Text {
        /// Project path, or a catalogue project label.
        project: String,

        /// Text identifier, e.g. `P285574`.
        key: String,

        #[arg(long)]
        json: bool,
    },

    /// Load a project glossary.
    Glossary {
        project: String,

        /// Glossary file stem, e.g. `gloss-akk`.
        glossary: GlossaryType,

        #[arg(long)]
        json: bool,
    },

    /// List the files inside a project archive, downloading it if needed.
    Members { project: String },

    /// Inspect or clear the local cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Print the cache directory.
    Dir,
    /// List cached archives and extracted files.
    List,
    /// Delete everything in the cache.
    Clear,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => {
            let config = Config::default();
            validate(&config)?;
            config
        }
    };

    match cli.command {
        Commands::Projects { available } => {
            let source = open_source(&config, cli.direct)?;
            let projects = if available {
                source.available_projects()
            } else {
                source
                    .fetch_projects()
                    .context("Failed to fetch the project directory")?
            };
            print_projects(&projects);
            Ok(())
        }
        Commands::Catalogue { project, json } => {
            run_catalogue(open_source(&config, cli.direct)?.as_ref(), &project, json)
        }
        Commands::Text { project, key, json } => {
            run_text(open_source(&config, cli.direct)?.as_ref(), &project, &key, json)
        }
        Commands::Glossary {
            project,
            glossary,
            json,
        } => run_glossary(
            open_source(&config, cli.direct)?.as_ref(),
            &project,
            glossary,
            json,
        ),
        Commands::Members { project } => {
            let resolver = Resolver::from_config(&config)?;
            for member in resolver
                .archive_members(&project)
                .with_context(|| format!("Failed to read archive for {}", project))?
            {
                println!("{}", member);
            }
            Ok(())
        }
        Commands::Cache { action } => run_cache(&config, action),
    }
}

fn open_source(config: &Config, direct: bool) -> Result<Box<dyn ArtifactSource>> {
    Ok(if direct {
        Box::new(DirectSiteResolver::from_config(config)?)
    } else {
        Box::new(Resolver::from_config(config)?)
    })
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "oracc_resolver=warn",
        1 => "oracc_resolver=info",
        _ => "oracc_resolver=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_catalogue(source: &dyn ArtifactSource, project: &str, json: bool) -> Result<()> {
    let catalogue = source
        .load_catalogue_at(project)
        .with_context(|| format!("Failed to load catalogue for {}", project))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&catalogue)?);
        return Ok(());
    }
    println!("project: {}", catalogue.project);
    println!("texts:   {}", catalogue.members.len());
    print_source(catalogue.loaded_from.as_ref());
    for (id, entry) in &catalogue.members {
        let title = entry
            .designation
            .as_deref()
            .or(entry.display_name.as_deref())
            .unwrap_or("");
        println!("  {:<10} {}", id, title);
    }
    Ok(())
}

fn run_text(source: &dyn ArtifactSource, project: &str, key: &str, json: bool) -> Result<()> {
    let path = project_path_for_label(project);
    let text = source
        .load_text_at(path, key)
        .with_context(|| format!("Failed to load text {} from {}", key, path))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&text)?);
        return Ok(());
    }
    println!("text:    {}", text.text_id);
    println!("project: {}", text.project);
    println!("nodes:   {}", text.cdl.len());
    print_source(text.loaded_from.as_ref());
    Ok(())
}

fn run_glossary(
    source: &dyn ArtifactSource,
    project: &str,
    glossary: GlossaryType,
    json: bool,
) -> Result<()> {
    let loaded = source
        .load_glossary_at(project, glossary)
        .with_context(|| format!("Failed to load {} for {}", glossary, project))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&loaded)?);
        return Ok(());
    }
    println!("glossary: {}", glossary);
    println!("lang:     {}", loaded.lang);
    println!("entries:  {}", loaded.entries.len());
    print_source(loaded.loaded_from.as_ref());
    Ok(())
}

fn run_cache(config: &Config, action: CacheAction) -> Result<()> {
    let resolver = Resolver::from_config(config)?;
    let cache = resolver.cache();
    match action {
        CacheAction::Dir => println!("{}", cache.root().display()),
        CacheAction::List => {
            let entries = cache.entries()?;
            if entries.is_empty() {
                println!("Cache is empty: {}", cache.root().display());
                return Ok(());
            }
            println!("{:<48} {:>12}  MODIFIED", "PATH", "BYTES");
            for entry in entries {
                let modified = entry
                    .modified
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{:<48} {:>12}  {}", entry.relative_path, entry.size, modified);
            }
        }
        CacheAction::Clear => {
            resolver.clear_cache()?;
            println!("Cleared cache at {}", cache.root().display());
        }
    }
    Ok(())
}

fn print_projects(projects: &[Project]) {
    println!("{:<28} {:<20} NAME", "PATH", "ABBREV");
    for project in projects {
        println!(
            "{:<28} {:<20} {}",
            project.path, project.abbreviation, project.name
        );
    }
    println!("{} projects", projects.len());
}

fn print_source(provenance: Option<&Provenance>) {
    match provenance {
        Some(Provenance::LocalFile(path)) => println!("source:  cache {}", path.display()),
        Some(p @ Provenance::Archive { .. }) => println!("source:  archive {}", p),
        None => println!("source:  live site"),
    }
}
