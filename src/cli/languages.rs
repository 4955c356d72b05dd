//! `codepraise languages`.

use anyhow::Result;
use clap::Parser;

use crate::config::Settings;
use crate::contributions::LanguageRegistry;

/// Languages command options.
#[derive(Parser)]
pub struct LanguagesCommand {}

impl LanguagesCommand {
    /// Executes the languages command.
    pub fn execute(self) -> Result<()> {
        let registry = Settings::load()?.language_registry()?;
        println!("{}", render_languages(&registry));
        Ok(())
    }
}

/// One line per registered extension: extension, name, comment pattern.
pub fn render_languages(registry: &LanguageRegistry) -> String {
    registry
        .wanted_extensions()
        .into_iter()
        .map(|extension| {
            let language = registry.resolve(extension);
            format!(
                "{:<6}{:<12}{}",
                extension,
                language.name(),
                language.comment().unwrap_or("-")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
