//! `codepraise cache`.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::cache::LocalCache;
use crate::config::Settings;

/// Cache operations.
#[derive(Parser)]
pub struct CacheCommand {
    /// Cache subcommand to execute.
    #[command(subcommand)]
    pub command: CacheSubcommands,
}

/// Cache subcommands.
#[derive(Subcommand)]
pub enum CacheSubcommands {
    /// Lists cached files.
    Keys(KeysCommand),
    /// Removes every cached file.
    Wipe(WipeCommand),
}

/// Keys command options.
#[derive(Parser)]
pub struct KeysCommand {}

/// Wipe command options.
#[derive(Parser)]
pub struct WipeCommand {}

impl CacheCommand {
    /// Executes the cache command.
    pub fn execute(self) -> Result<()> {
        let cache = LocalCache::new(Settings::load()?.cache_dir()?)?;
        match self.command {
            CacheSubcommands::Keys(keys_cmd) => keys_cmd.execute(&cache),
            CacheSubcommands::Wipe(wipe_cmd) => wipe_cmd.execute(&cache),
        }
    }
}

impl KeysCommand {
    /// Executes the keys command.
    pub fn execute(self, cache: &LocalCache) -> Result<()> {
        for key in cache.keys()? {
            println!("{}", key.display());
        }
        Ok(())
    }
}

impl WipeCommand {
    /// Executes the wipe command.
    pub fn execute(self, cache: &LocalCache) -> Result<()> {
        // Count first so the summary reflects what was removed
        let count = cache.keys()?.len();
        cache.wipe()?;
        println!("Removed {count} cached files from {}", cache.dir().display());
        Ok(())
    }
}
