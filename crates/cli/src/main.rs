//! grimoire operator CLI.
//!
//! One-shot maintenance commands over the same database and upstream
//! client the server uses. Logs go to stderr; command output to stdout.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use grimoire_client::{Context, WarmupReport};
use grimoire_core::{AppConfig, Category};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "grimoire", version, about = "Manage the tabletop reference-data store and cache")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load every reference category missing from the store.
    Load,
    /// Run one cache warmup pass.
    Warmup,
    /// Clear the whole cache, then warm it again.
    Reset,
    /// Delete expired cache entries.
    Purge,
    /// Delete cache entries for one category.
    Clear {
        /// Category path or name, e.g. "magic-items".
        category: String,
    },
    /// Show store load status and cache metadata.
    Status,
    /// Search the local store.
    Search {
        query: String,
        /// Maximum hits per category.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load()?;
    let ctx = Context::open(&config).await?;
    run(&ctx, cli.command).await
}

async fn run(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Load => {
            let summary = ctx.loader.run().await?;
            for (category, count) in &summary.loaded {
                println!("loaded {:<14} {count}", category.path());
            }
            for category in &summary.skipped {
                println!("skipped {:<13} already loaded", category.path());
            }
        }
        Command::Warmup => report(ctx.warmup.warmup().await?)?,
        Command::Reset => report(ctx.warmup.reset_cache().await?)?,
        Command::Purge => {
            let removed = ctx.warmup.clear_expired().await?;
            println!("removed {removed} expired entries");
        }
        Command::Clear { category } => {
            let category: Category = category.parse()?;
            let removed = ctx.cache.clear_category(category).await?;
            println!("removed {removed} entries for {}", category.path());
        }
        Command::Status => {
            println!("core loaded: {}", ctx.store.is_core_loaded().await?);
            let statuses = ctx.store.all_load_status().await?;
            for category in Category::ALL {
                let stored = ctx.store.count(category).await?;
                let loaded = match statuses.iter().find(|s| s.category == category) {
                    Some(s) if s.is_current() => s.last_loaded.to_rfc3339(),
                    Some(s) => format!("stale (format {})", s.version),
                    None => "never".to_string(),
                };
                let cached = ctx.cache.metadata(category).await?.map_or(0, |m| m.total_items);
                println!("{:<14} stored {stored:>5}  cached {cached:>3}  loaded {loaded}", category.path());
            }
        }
        Command::Search { query, limit } => {
            if query.trim().is_empty() {
                bail!("query cannot be empty");
            }
            for hit in ctx.store.search(query.trim(), limit).await? {
                println!("{:<12} {:<32} {}", hit.kind, hit.slug, hit.name);
            }
        }
    }

    Ok(())
}

fn report(report: WarmupReport) -> Result<()> {
    for (category, count) in &report.warmed {
        println!("warmed {:<14} {count}", category.path());
    }
    for (category, e) in &report.failed {
        eprintln!("failed {:<14} {e}", category.path());
    }
    if !report.failed.is_empty() {
        bail!("{} categories failed to warm", report.failed.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clear() {
        let cli = Cli::try_parse_from(["grimoire", "clear", "magic-items"]).unwrap();
        let Command::Clear { category } = cli.command else { panic!("expected clear") };
        assert_eq!(category.parse::<Category>().unwrap(), Category::MagicItems);
    }

    #[test]
    fn test_parse_search_limit() {
        let cli = Cli::try_parse_from(["grimoire", "search", "fire", "--limit", "3"]).unwrap();
        assert!(matches!(cli.command, Command::Search { ref query, limit: 3 } if query == "fire"));

        let cli = Cli::try_parse_from(["grimoire", "search", "fire"]).unwrap();
        assert!(matches!(cli.command, Command::Search { limit: 10, .. }));
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(Cli::try_parse_from(["grimoire", "explode"]).is_err());
        assert!(Cli::try_parse_from(["grimoire", "clear"]).is_err());
    }

    #[test]
    fn test_failed_warmup_is_an_error() {
        let mut failed = WarmupReport::default();
        failed.failed.push((
            Category::Spells,
            grimoire_client::UpstreamError::new("down").with_category(Category::Spells).into(),
        ));
        assert!(report(failed).is_err());
        assert!(report(WarmupReport::default()).is_ok());
    }
}
