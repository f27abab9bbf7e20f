use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ont2wb")]
#[command(about = "Synchronize an RDF/OWL ontology into a Wikibase instance", long_about = None)]
#[command(version)]
#[command(after_help = "EXAMPLES:
    # Sync the OSH metadata ontology into the default wiki
    ont2wb --user Bot --password secret

    # Sync a local ontology into a local wiki
    ont2wb ontology.ttl --api-url http://localhost:8181/w/api.php

    # Preview without touching the wiki (in-memory store)
    ont2wb ontology.ttl --dry-run

    # Re-run without duplicating statements
    ont2wb ontology.ttl --skip-existing-claims

    # Machine-readable progress
    ont2wb ontology.ttl --dry-run --json

Credentials can also be given as WB_USER and WB_PASSWORD.")]
pub struct Cli {
    /// Ontology to sync: a Turtle file or an http(s) URL
    /// Defaults to the configured source, else ../OSHI/osh-metadata.ttl, else upstream
    pub source: Option<String>,

    /// Config file (default: <config dir>/ont2wb/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Wikibase API endpoint (api.php)
    #[arg(long, env = "WB_API_URL")]
    pub api_url: Option<String>,

    /// Wiki user name
    #[arg(short, long, env = "WB_USER")]
    pub user: Option<String>,

    /// Wiki password (prefer the WB_PASSWORD environment variable)
    #[arg(short, long, env = "WB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Link file mapping RDF nodes to wiki entity IDs
    #[arg(short, long)]
    pub links: Option<PathBuf>,

    /// IRI of the ontology root, which is not synchronized
    #[arg(long)]
    pub base_uri: Option<String>,

    /// Language for literals without a language tag
    #[arg(long)]
    pub language: Option<String>,

    /// Sync into an in-memory store instead of the wiki (nothing is written)
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Don't add statements the entity already has
    #[arg(long)]
    pub skip_existing_claims: bool,

    /// Only create entities and links, skip statements
    #[arg(long)]
    pub entities_only: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only show errors)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output JSON (newline-delimited JSON for scripting)
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.dry_run {
            return Ok(());
        }

        if self.user.as_deref().map_or(true, str::is_empty) {
            anyhow::bail!("A wiki user is required (--user or WB_USER), or use --dry-run");
        }
        if self.password.as_deref().map_or(true, str::is_empty) {
            anyhow::bail!("A wiki password is required (--password or WB_PASSWORD), or use --dry-run");
        }

        Ok(())
    }

    pub fn log_level(&self) -> tracing::Level {
        if self.quiet || self.json {
            return tracing::Level::ERROR;
        }

        match self.verbose {
            0 => tracing::Level::INFO,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
