//! Profiles command - inspect manufacturer profiles and try them on a line.

use clap::{Args, Subcommand};
use console::style;

use quotr_core::{Extractor, OUTPUT_COLUMNS};

use super::config::load_config;

/// Arguments for the profiles command.
#[derive(Args)]
pub struct ProfilesArgs {
    #[command(subcommand)]
    command: ProfilesCommand,
}

#[derive(Subcommand)]
enum ProfilesCommand {
    /// List profiles in the order they are tried
    List {
        /// Also print every pattern
        #[arg(long)]
        patterns: bool,
    },

    /// Show which profile recognizes a line, and what is extracted from it
    Detect {
        /// A line of document text
        line: String,
    },
}

pub async fn run(args: ProfilesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let extractor = Extractor::new(load_config(config_path)?)?;
    match args.command {
        ProfilesCommand::List { patterns } => list(&extractor, patterns),
        ProfilesCommand::Detect { line } => detect(&extractor, &line),
    }
}

fn list(extractor: &Extractor, show_patterns: bool) -> anyhow::Result<()> {
    for profile in extractor.library().profiles() {
        let trigger = if profile.is_generic() {
            style("generic".to_string()).dim()
        } else {
            style(profile.keywords().join(", ")).cyan()
        };
        println!(
            "{:<12} {} ({} patterns)",
            style(profile.name()).bold(),
            trigger,
            profile.patterns().count()
        );
        if let Some(default) = profile.quantity_default() {
            println!("             quantity default: {:?}", default);
        }
        if let Some(fallback) = profile.description_fallback() {
            println!("             description fallback: {:?}", fallback);
        }
        if show_patterns {
            for pattern in profile.patterns() {
                println!("             {}", pattern);
            }
        }
    }
    Ok(())
}

fn detect(extractor: &Extractor, line: &str) -> anyhow::Result<()> {
    match extractor.library().detect_manufacturer(line) {
        Some(found) => {
            println!("Profile:    {}", style(&found.profile).green());
            println!("Identifier: {}", found.identifier());
            println!("Matched:    {:?}", found.matched_span());
        }
        None => println!("{} No profile matched", style("⚠").yellow()),
    }

    let result = extractor.extract_text(line);
    for record in &result.records {
        println!();
        for (field, cell) in OUTPUT_COLUMNS.iter().zip(record.cells()) {
            if !cell.is_empty() {
                println!("  {:<20} {}", format!("{}:", field.header()), cell);
            }
        }
    }
    Ok(())
}
