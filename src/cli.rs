//! CLI interface for codepraise.

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod appraise;
pub mod cache;
pub mod languages;

/// codepraise: attribute a project's code to the people who wrote it.
#[derive(Parser)]
#[command(name = "codepraise")]
#[command(about = "Attributes lines of code to their contributors", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Appraises a folder of a catalogued project.
    Appraise(appraise::AppraiseCommand),
    /// Lists the languages whose lines earn credit.
    Languages(languages::LanguagesCommand),
    /// Inspects or clears the result cache.
    Cache(cache::CacheCommand),
}

impl Cli {
    /// Executes the CLI command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Appraise(appraise_cmd) => appraise_cmd.execute().await,
            Commands::Languages(languages_cmd) => languages_cmd.execute(),
            Commands::Cache(cache_cmd) => cache_cmd.execute(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_appraise_with_refresh() {
        let cli = Cli::try_parse_from(["codepraise", "appraise", "octo/hello/app", "--refresh"])
            .unwrap();

        match cli.command {
            Commands::Appraise(cmd) => {
                assert_eq!(cmd.path, "octo/hello/app");
                assert!(cmd.refresh);
            }
            _ => panic!("expected appraise"),
        }
    }

    #[test]
    fn parses_cache_subcommands() {
        let cli = Cli::try_parse_from(["codepraise", "cache", "wipe"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Cache(cache::CacheCommand {
                command: cache::CacheSubcommands::Wipe(_)
            })
        ));
    }

    #[test]
    fn rejects_missing_project_path() {
        assert!(Cli::try_parse_from(["codepraise", "appraise"]).is_err());
    }
}
