//! # Command-Line Interface
//!
//! The `prefs` tool for inspecting and editing a preference store.
//!
//! ## Commands
//!
//! | Command | Purpose | Example |
//! |---------|---------|---------|
//! | `get` | Read one entry | `prefs get volume --type int --default 5` |
//! | `set` | Write one entry | `prefs set tags a,b --type string_set` |
//! | `list` | Show every entry | `prefs list --format json` |
//! | `remove` | Delete one entry | `prefs remove volume` |
//! | `clear` | Delete every entry | `prefs clear` |
//!
//! ## Store Selection
//!
//! The store comes from the config file, overridden by `--backend` and
//! `--store` (or `PREFS_STORE`).
//!
//! ## Logging
//!
//! Warnings only by default; `--verbose` enables debug logs. `PREFS_LOG`
//! accepts `env_logger` filter syntax.
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;

pub use app::{Cli, Commands, run};
pub use output::{Output, OutputFormat};
