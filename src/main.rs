//! Locale Spider main entry point
//!
//! This is the command-line interface for the Locale Spider link auditor.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::Parser;
use locale_spider::config::{load_config_with_hash, Config};
use locale_spider::crawler::{build_http_client, HttpRenderEngine, NoopObserver, PageExtractor};
use locale_spider::health::{run_health_check, HealthCheckOptions, LinkChecker, SavedReport};
use locale_spider::index::{search_index, Index, IndexBuilder, SearchMode, SearchQuery};
use locale_spider::output::{
    print_crawl_summary, print_health_report, print_index_list, print_search_results,
    print_sitemap_report, write_health_markdown,
};
use locale_spider::sitemap::SitemapReconciler;
use locale_spider::storage::{IndexStore, JsonIndexStore, JsonReportStore, ReportStore};
use locale_spider::url::{extract_domain, UrlFilter, UrlNormalizer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Locale Spider: a link index and locale auditor
///
/// Locale Spider crawls one multilingual site into a searchable link index,
/// flags links that leave their page's locale, checks link health, and
/// compares the index with the site's sitemap.
#[derive(Parser, Debug)]
#[command(name = "locale-spider")]
#[command(version = "1.0.0")]
#[command(about = "A link index and locale auditor for multilingual sites", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Re-index only these URLs and merge them into the saved index
    #[arg(long, num_args = 1.., value_name = "URL")]
    urls: Vec<String>,

    /// Search the saved index for links matching comma-separated patterns
    /// (`/regex/` for a case-insensitive regular expression)
    #[arg(long, value_name = "PATTERN")]
    search: Option<String>,

    /// Search the saved index for links that cross a locale boundary
    #[arg(long)]
    cross_locale: bool,

    /// Only look at pages of this locale ("default" or a locale code)
    #[arg(long, value_name = "LOCALE")]
    source_locale: Option<String>,

    /// Locale codes that count as foreign for default-locale pages
    #[arg(long, value_delimiter = ',', value_name = "LOCALES")]
    other_locales: Vec<String>,

    /// Report language switcher links as cross-locale findings too
    #[arg(long)]
    keep_locale_switchers: bool,

    /// Check link health of the saved index and save a report
    #[arg(long, conflicts_with_all = ["sitemap", "list", "dry_run", "urls"])]
    health_check: bool,

    /// Compare the saved index with the site's sitemap
    #[arg(long, conflicts_with_all = ["list", "dry_run", "urls"])]
    sitemap: bool,

    /// List saved indexes and reports and exit
    #[arg(long, conflicts_with_all = ["dry_run", "urls"])]
    list: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "urls")]
    dry_run: bool,
}

impl Cli {
    fn search_requested(&self) -> bool {
        self.search.is_some() || self.cross_locale
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.list {
        handle_list(&config)
    } else if !cli.urls.is_empty() {
        handle_incremental(config, &cli.urls).await
    } else if cli.search_requested() {
        handle_search(&config, &cli)
    } else if cli.health_check {
        handle_health_check(&config, &cli).await
    } else if cli.sitemap {
        handle_sitemap(&config).await
    } else {
        handle_build(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("locale_spider=info,warn"),
            1 => EnvFilter::new("locale_spider=debug,info"),
            2 => EnvFilter::new("locale_spider=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn domain_of(config: &Config) -> Result<String> {
    let start = Url::parse(&config.crawler.start_url)
        .with_context(|| format!("Invalid start URL: {}", config.crawler.start_url))?;
    extract_domain(&start).ok_or_else(|| anyhow!("Start URL has no host: {}", start))
}

fn index_store(config: &Config) -> JsonIndexStore {
    JsonIndexStore::new(&config.output.index_dir)
}

fn load_saved_index(config: &Config) -> Result<Index> {
    let domain = domain_of(config)?;
    let locale = config.crawler.locale_filter.as_deref();
    index_store(config)
        .load_index(&domain, locale)?
        .ok_or_else(|| {
            anyhow!(
                "No saved index for {} ({}); build one first",
                domain,
                locale.unwrap_or("full")
            )
        })
}

fn asset_filter(config: &Config) -> UrlFilter {
    UrlFilter::new(
        &config.filters.excluded_paths,
        &config.filters.excluded_extensions,
        &config.filters.asset_extensions,
    )
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> Result<()> {
    println!("=== Locale Spider Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Start URL: {}", config.crawler.start_url);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Page delay: {}ms", config.crawler.page_delay);
    println!(
        "  Navigation: {}ms timeout, {} retries",
        config.crawler.navigation_timeout, config.crawler.navigation_retries
    );
    println!(
        "  Locale scope: {}",
        config.crawler.locale_filter.as_deref().unwrap_or("full site")
    );
    if let Some(scope) = &config.crawler.domain_scope {
        println!("  Domain scope: {}", scope);
    }

    println!("\nLocales:");
    println!("  Known: {}", config.locales.known.join(", "));
    println!("  Other: {}", config.locales.other.join(", "));
    println!("  Default locale has prefix: {}", config.locales.default_has_prefix);
    println!("  Heuristic fallback: {}", config.locales.heuristic_fallback);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Indexes: {}", config.output.index_dir);
    println!("  Reports: {}", config.output.report_dir);
    println!("  Summary: {}", config.output.summary_path);

    println!("\n✓ Configuration is valid");
    println!("✓ Would index {}", domain_of(config)?);

    Ok(())
}

/// Handles the --list mode
fn handle_list(config: &Config) -> Result<()> {
    print_index_list(&index_store(config).list_indexes()?);

    let reports = JsonReportStore::new(&config.output.report_dir).list_reports()?;
    if !reports.is_empty() {
        println!("\n=== Saved Reports ({}) ===\n", reports.len());
        for r in reports {
            println!(
                "  {} [{}] broken {}, redirects {}, cross-locale {} ({} pending)",
                r.id, r.locale, r.broken, r.redirects, r.cross_locale, r.issue_stats.pending
            );
        }
    }
    Ok(())
}

/// Builds a fresh index, stopping cleanly on Ctrl-C
async fn handle_build(config: Config) -> Result<()> {
    let engine = Arc::new(HttpRenderEngine::new(&config.user_agent)?);
    let store = index_store(&config);
    let builder = IndexBuilder::new(config, engine);

    let handle = builder.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after in-flight pages");
            handle.stop();
        }
    });

    let outcome = builder.build().await?;
    print_crawl_summary(&outcome.summary, &outcome.errors);

    let path = store.save_index(&outcome.index)?;
    println!("✓ Index saved to: {}", path);
    Ok(())
}

/// Handles the --urls mode: re-indexes the listed pages only
async fn handle_incremental(config: Config, urls: &[String]) -> Result<()> {
    let existing = load_saved_index(&config)?;
    let engine = Arc::new(HttpRenderEngine::new(&config.user_agent)?);
    let store = index_store(&config);

    let outcome = IndexBuilder::new(config, engine)
        .merge_incremental(&existing, urls)
        .await?;
    print_crawl_summary(&outcome.summary, &outcome.errors);

    let path = store.save_index(&outcome.index)?;
    println!("✓ Index updated: {}", path);
    Ok(())
}

fn handle_search(config: &Config, cli: &Cli) -> Result<()> {
    let index = load_saved_index(config)?;

    let mode = match (cli.search.is_some(), cli.cross_locale) {
        (true, true) => SearchMode::Both,
        (false, true) => SearchMode::CrossLocale,
        _ => SearchMode::Pattern,
    };
    let other_locales = if cli.other_locales.is_empty() {
        &config.locales.other
    } else {
        &cli.other_locales
    };
    let mut query = SearchQuery::new(mode)
        .with_source_locale(cli.source_locale.as_deref())
        .with_other_locales(other_locales)
        .exclude_locale_switcher(!cli.keep_locale_switchers)
        .with_asset_filter(asset_filter(config));
    if let Some(pattern) = &cli.search {
        query = query.with_patterns(pattern);
    }

    print_search_results(&search_index(&index, &query));
    Ok(())
}

/// Handles the --health-check mode: checks, saves the report, writes markdown
async fn handle_health_check(config: &Config, cli: &Cli) -> Result<()> {
    let mut index = load_saved_index(config)?;

    let normalizer = UrlNormalizer::new(config.filters.tracking_params.iter().cloned());
    let checker = LinkChecker::new(&config.user_agent, &config.health, normalizer)?;
    let mut options = HealthCheckOptions::from_config(config);
    if cli.keep_locale_switchers {
        options.exclude_locale_switcher = false;
    }

    let report = run_health_check(&mut index, &checker, &options, &NoopObserver).await;
    print_health_report(&report);

    index_store(config).save_index(&index)?;

    let saved = SavedReport::new(
        &index.metadata.domain,
        index.metadata.locale_filter.as_deref(),
        report,
        Utc::now(),
    );
    JsonReportStore::new(&config.output.report_dir).save_report(&saved)?;
    println!("✓ Report saved: {}", saved.id);

    let summary_path = Path::new(&config.output.summary_path);
    write_health_markdown(&saved, summary_path)?;
    println!("✓ Summary exported to: {}", summary_path.display());
    Ok(())
}

async fn handle_sitemap(config: &Config) -> Result<()> {
    let index = load_saved_index(config)?;
    let client = build_http_client(&config.user_agent, true)?;
    let classifier = PageExtractor::from_config(config).classifier().clone();

    let report = SitemapReconciler::new(client, classifier)
        .reconcile(&index)
        .await?;
    print_sitemap_report(&report);
    Ok(())
}
