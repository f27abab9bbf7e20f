mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use colored::Colorize;
use ont2wb::config::Config;
use ont2wb::graph::{self, Node};
use ont2wb::mapping::IdentifierMap;
use ont2wb::sync::draft::DraftOptions;
use ont2wb::sync::{ClaimPolicy, SyncEngine, SyncOptions};
use ont2wb::wikibase::StoreRouter;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().as_str()));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    cli.validate()?;

    // Load config file (CLI args take precedence)
    let config = Config::load(cli.config.as_deref())?;
    let source = cli.source.clone().unwrap_or_else(|| config.source());
    let api_url = cli.api_url.clone().unwrap_or_else(|| config.api_url().to_string());
    let link_file = cli.links.clone().unwrap_or_else(|| config.link_file());
    let base_uri = cli.base_uri.clone().unwrap_or_else(|| config.base_uri().to_string());

    let defaults = DraftOptions::default();
    let options = SyncOptions {
        draft: DraftOptions {
            default_language: cli
                .language
                .clone()
                .or_else(|| config.default_language.clone())
                .unwrap_or(defaults.default_language),
            label_separator: config
                .label_separator
                .clone()
                .unwrap_or(defaults.label_separator),
            description_separator: config
                .description_separator
                .clone()
                .unwrap_or(defaults.description_separator),
            description_limit: config
                .description_limit
                .unwrap_or(defaults.description_limit),
        },
        root: Some(Node::iri(base_uri)),
        claim_policy: if cli.skip_existing_claims {
            ClaimPolicy::SkipExisting
        } else {
            ClaimPolicy::Append
        },
        entities_only: cli.entities_only,
        persist_links: !cli.dry_run,
        quiet: cli.quiet || cli.json,
        json: cli.json,
    };

    // Print header (skip if JSON mode)
    if !cli.quiet && !cli.json {
        println!("ont2wb v{}", env!("CARGO_PKG_VERSION"));
        println!("Syncing {} → {}", source, api_url);

        if cli.dry_run {
            println!("Mode: Dry-run (in-memory store, nothing is written)\n");
        }
    }

    let graph = graph::load_source(&source)
        .await
        .with_context(|| format!("Failed to load ontology from {}", source))?;
    let mut links = IdentifierMap::load(&link_file)?;

    let store = if cli.dry_run {
        StoreRouter::dry_run(&links)
    } else {
        // Presence checked by validate()
        let user = cli.user.as_deref().unwrap_or_default();
        let password = cli.password.as_deref().unwrap_or_default();
        StoreRouter::connect(&api_url, user, password).await?
    };

    let engine = SyncEngine::new(store, options, config.seeds());
    let stats = engine.run(&graph, &mut links).await?;

    // Print summary (skip if JSON mode - already emitted JSON summary)
    if !cli.quiet && !cli.json {
        if cli.dry_run {
            println!("\n{}\n", "✓ Dry-run complete (nothing written)".green().bold());
        } else {
            println!("\n{}\n", "✓ Sync complete".green().bold());
        }

        println!("  Triples:           {}", graph.len().to_string().blue());
        if stats.seeds_created > 0 {
            println!("  Seeds created:     {}", stats.seeds_created.to_string().green());
        }
        if stats.entities_created > 0 {
            println!("  Entities created:  {}", stats.entities_created.to_string().green());
        } else {
            println!("  Entities created:  {}", stats.entities_created.to_string().bright_black());
        }
        println!("  Entities reused:   {}", stats.entities_reused.to_string().bright_black());
        if stats.collisions_recovered > 0 {
            println!("  Collisions:        {}", stats.collisions_recovered.to_string().yellow());
        }

        println!();
        if cli.entities_only {
            println!("  Claims:            {}", "skipped (--entities-only)".bright_black());
        } else {
            if stats.claims_added > 0 {
                println!("  Claims added:      {}", stats.claims_added.to_string().green());
            } else {
                println!("  Claims added:      {}", stats.claims_added.to_string().bright_black());
            }
            if stats.claims_duplicate > 0 {
                println!("  Claims existing:   {}", stats.claims_duplicate.to_string().bright_black());
            }
            if stats.claims_unhandled > 0 {
                println!("  Claims unhandled:  {}", stats.claims_unhandled.to_string().yellow());
            }
            if stats.claims_excluded > 0 {
                println!("  Claims excluded:   {}", stats.claims_excluded.to_string().yellow());
            }
        }

        println!();
        if cli.dry_run {
            println!("  Links:             {} (not saved)", links.len().to_string().cyan());
        } else {
            println!(
                "  Links:             {} → {}",
                links.len().to_string().cyan(),
                links.path().display()
            );
        }
        println!("  Duration:          {}", format_duration(stats.duration).cyan());
    }

    Ok(())
}

fn format_duration(duration: std::time::Duration) -> String {
    let total = duration.as_secs();
    let (hours, mins, secs) = (total / 3600, total / 60 % 60, total % 60);

    match (hours, mins, secs) {
        (0, 0, 0) => format!("{}ms", duration.subsec_millis()),
        (0, 0, _) => format!("{}.{:03}s", secs, duration.subsec_millis()),
        (0, _, _) => format!("{}m {}s", mins, secs),
        _ => format!("{}h {}m {}s", hours, mins, secs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(12_500)), "12.500s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3_725)), "1h 2m 5s");
    }
}
