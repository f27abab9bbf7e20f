use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use ont2wb::stats::{self, Downloader, OKH_LIST_URL};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "okh-stats")]
#[command(version)]
#[command(about = "Download Open Know-How manifests and count the keys they use")]
struct Cli {
    /// File to write the key statistics to
    #[arg(env = "STATS_FILE", default_value = "okh1_stats.txt")]
    stats_file: PathBuf,

    /// Directory holding the downloaded manifests
    #[arg(env = "OKH_DIR", default_value = "okh1_files")]
    okh_dir: PathBuf,

    /// Download the manifests even if the directory exists
    #[arg(short, long)]
    redownload: bool,

    /// CSV list of OKH projects (name, _, manifest URL)
    #[arg(long, default_value = OKH_LIST_URL)]
    list_url: String,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        tracing::Level::ERROR
    } else {
        match cli.verbose {
            0 => tracing::Level::INFO,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    if !cli.okh_dir.exists() || cli.redownload {
        let downloader = Downloader::new()?;
        let dl_stats = downloader.download_all(&cli.list_url, &cli.okh_dir).await?;

        if !cli.quiet {
            println!(
                "\n  Manifests:         {}/{} downloaded",
                dl_stats.num_success.to_string().green(),
                dl_stats.num_entries
            );
            for (base, count) in &dl_stats.url_bases {
                println!("  {:<18} {}", base, count.to_string().blue());
            }
            for (base, codes) in &dl_stats.error_url_codes {
                for (code, count) in codes {
                    let reason = dl_stats
                        .error_code_reason
                        .get(code)
                        .map(String::as_str)
                        .unwrap_or_default();
                    println!(
                        "  {:<18} {} {} x{}",
                        base,
                        code.to_string().red(),
                        reason,
                        count
                    );
                }
            }
            println!();
        }
    }

    let (key_stats, parsed) = stats::gather_stats(&cli.okh_dir)?;
    stats::write_stats(&cli.stats_file, &key_stats, parsed)?;

    if !cli.quiet {
        println!(
            "{} {} keys from {} manifests → {}",
            "✓".green().bold(),
            key_stats.len(),
            parsed,
            cli.stats_file.display()
        );
    }

    Ok(())
}
