//! Main CLI application structure

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;

use super::output::{Output, OutputFormat};
use crate::delegate::DynPreference;
use crate::domain::{PrefValue, StorageKind};
use crate::storage::{Backend, Config, Editor, PreferenceStore};

#[derive(Parser)]
#[command(name = "prefs")]
#[command(author, version, about = "Inspect and edit typed preference stores")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the preference store (overrides the config file)
    #[arg(long, short = 's', global = true, env = "PREFS_STORE")]
    pub store: Option<PathBuf>,

    /// Store backend (overrides the config file)
    #[arg(long, short = 'b', global = true)]
    pub backend: Option<Backend>,

    /// Path to the config file
    #[arg(long, global = true, env = "PREFS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read a preference
    Get {
        /// Preference key
        key: String,

        /// Value type (string, string_set, int, long, float, boolean)
        #[arg(long = "type", short = 't')]
        kind: Option<String>,

        /// Value returned when the key is absent (requires --type)
        #[arg(long, requires = "kind")]
        default: Option<String>,
    },

    /// Write a preference
    Set {
        /// Preference key
        key: String,

        /// New value (string sets are comma separated; use --item for items
        /// containing commas)
        #[arg(required_unless_present = "items")]
        value: Option<String>,

        /// One string set item, taken verbatim (repeatable)
        #[arg(long = "item", conflicts_with = "value")]
        items: Vec<String>,

        /// Value type (string, string_set, int, long, float, boolean)
        #[arg(long = "type", short = 't')]
        kind: String,
    },

    /// List all preferences (use --format json when set items contain commas)
    List,

    /// Remove a preference
    Remove {
        /// Preference key
        key: String,
    },

    /// Remove all preferences
    Clear,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let output = Output::new(cli.format);

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(path) = cli.store {
        config.path = Some(path);
    }

    let store = config.open_store()?;

    match cli.command {
        Commands::Get { key, kind, default } => {
            get(store, &output, &key, kind.as_deref(), default.as_deref())?
        }
        Commands::Set {
            key,
            value,
            items,
            kind,
        } => set(store, &output, &key, value.as_deref(), items, &kind)?,
        Commands::List => list(&*store, &output)?,
        Commands::Remove { key } => remove(&*store, &output, &key)?,
        Commands::Clear => clear(&*store, &output)?,
    }

    log::debug!("Command completed successfully");
    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    // A second initialization only happens in tests; ignore it
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_env("PREFS_LOG")
        .format_timestamp(None)
        .try_init();
}

fn get(
    store: Arc<dyn PreferenceStore>,
    output: &Output,
    key: &str,
    type_name: Option<&str>,
    default: Option<&str>,
) -> Result<()> {
    let value = match type_name {
        Some(type_name) => {
            let mut preference = DynPreference::resolve(type_name, store)?;
            if let Some(raw) = default {
                let default = PrefValue::parse(preference.kind(), raw)?;
                preference = preference.with_default(default)?;
            }
            Some(preference.get(key)?)
        }
        None => store.read(key)?,
    };

    match value {
        Some(value) => output.value(key, &value),
        None => anyhow::bail!("Preference '{}' not found", key),
    }

    Ok(())
}

fn set(
    store: Arc<dyn PreferenceStore>,
    output: &Output,
    key: &str,
    raw: Option<&str>,
    items: Vec<String>,
    type_name: &str,
) -> Result<()> {
    let preference = DynPreference::resolve(type_name, store)?;
    let value = match raw {
        Some(raw) => PrefValue::parse(preference.kind(), raw)?,
        None if preference.kind() == StorageKind::StringSet => {
            PrefValue::StringSet(items.into_iter().collect())
        }
        None => anyhow::bail!("--item is only valid for string_set, not {}", preference.kind()),
    };

    preference
        .set(key, value.clone())
        .with_context(|| format!("Failed to set preference '{}'", key))?;

    output.success(&format!("Set {} = {} ({})", key, value, preference.kind()));
    Ok(())
}

fn list(store: &dyn PreferenceStore, output: &Output) -> Result<()> {
    let entries = store.all()?;

    if output.is_json() {
        output.data(&entries);
    } else if entries.is_empty() {
        println!("No preferences stored");
    } else {
        for (key, value) in &entries {
            let rendered = value.to_string();
            output.row(&[key.as_str(), value.kind().as_str(), &rendered]);
        }
    }

    Ok(())
}

fn remove(store: &dyn PreferenceStore, output: &Output, key: &str) -> Result<()> {
    if !store.contains(key)? {
        anyhow::bail!("Preference '{}' not found", key);
    }

    Editor::new(store).remove(key).commit()?;
    output.success(&format!("Removed '{}'", key));
    Ok(())
}

fn clear(store: &dyn PreferenceStore, output: &Output) -> Result<()> {
    let count = store.all()?.len();

    Editor::new(store).clear().commit()?;
    output.success(&format!("Cleared {} preference(s)", count));
    Ok(())
}
