/*
reelscope - single-binary main.rs
Fetches the release feed once, extracts and filters its entries, then runs
each selected output mode in sequence over the same filtered collection.
*/

use anyhow::Result;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use common::Config;
use reelscope::processing::MovieRecord;
use reelscope::{ingestion, mailer, processing, render};

#[derive(Parser, Debug)]
#[command(
    name = "reelscope",
    about = "Watches a movie release feed and reports the releases matching \
             your configured quality. Choose one or more output modes below."
)]
struct Args {
    /// Display the filtered releases on the command line
    #[arg(short = 'c', long = "console")]
    console: bool,

    /// Write the filtered releases to a text file (not implemented yet)
    #[arg(short = 'f', long = "file")]
    file: bool,

    /// Render the filtered releases and send them as an HTML email
    #[arg(short = 'e', long = "email")]
    email: bool,

    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    // Parse CLI args
    let args = Args::parse();

    // A run with no mode selected has nothing to do: show usage, exit non-zero.
    if !(args.console || args.file || args.email) {
        Args::command().print_help()?;
        std::process::exit(2);
    }

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // Resolve config paths
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = args.config {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() {
            Some(p)
        } else {
            None
        }
    };

    // Load configuration with defaults
    let config = match Config::load_with_defaults(
        if default_path.exists() {
            Some(&default_path)
        } else {
            None
        },
        override_path.as_deref(),
    )
    .await
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    config.validate()?;
    info!(default = ?default_path, overrides = ?override_path, "configuration loaded");

    // Fetch the feed. A failed fetch yields an empty run, not an abort.
    info!("Parsing release feed...");
    let entries = match ingestion::fetch_and_parse_feed(
        &config.rssfeed.rss,
        config.fetch_timeout_seconds(),
    )
    .await
    {
        Ok(feed) => {
            info!("Fetched feed '{}': {} entries", config.rssfeed.rss, feed.entries.len());
            ingestion::raw_entries(&feed)
        }
        Err(e) => {
            error!(%e, url = %config.rssfeed.rss, "feed fetch failed, continuing with no entries");
            Vec::new()
        }
    };

    // Extract every entry; a malformed one is skipped, not fatal.
    let mut movies = Vec::new();
    for (idx, result) in processing::extract_all(&entries).into_iter().enumerate() {
        match result {
            Ok(movie) => movies.push(movie),
            Err(e) => warn!(entry = idx, %e, "skipping malformed feed entry"),
        }
    }

    let filtered = processing::filter_by_quality(&movies, config.filters.quality);
    info!(
        "{} of {} releases match quality {}",
        filtered.len(),
        movies.len(),
        config.filters.quality
    );

    // Run each selected mode in sequence over the same collection.
    let mut delivery_failed = false;

    if args.console {
        run_console_mode(&filtered);
    }
    if args.file {
        run_file_mode();
    }
    if args.email {
        if let Err(e) = run_email_mode(&config, &filtered).await {
            error!(%e, "email delivery failed");
            delivery_failed = true;
        }
    }

    if delivery_failed {
        anyhow::bail!("one or more deliveries failed");
    }
    Ok(())
}

/// Console mode: one line per release on stdout.
fn run_console_mode(movies: &[MovieRecord]) {
    info!("CLI MODE");
    for line in render::console_lines(movies) {
        println!("{}", line);
    }
}

/// File mode: reserved upstream, still a no-op here.
fn run_file_mode() {
    // TODO: write the filtered list to a flat file once the output format is settled
    info!("FILE MODE -- not implemented yet");
}

/// Email mode: render the collection, persist the artifact, submit over SMTP.
async fn run_email_mode(config: &Config, movies: &[MovieRecord]) -> Result<()> {
    info!("EMAIL MODE");
    let html = render::render_email_html(movies, render::EMAIL_DIR).await?;
    render::write_index_html(&html, render::EMAIL_DIR).await?;
    mailer::send_email(config, html).await?;
    info!("Email sent to {}", config.email.to);
    Ok(())
}

fn print_banner() {
    println!(
        r#"
 ____           _
|  _ \ ___  ___| |___  ___ ___  _ __   ___
| |_) / _ \/ _ \ / __|/ __/ _ \| '_ \ / _ \
|  _ <  __/  __/ \__ \ (_| (_) | |_) |  __/
|_| \_\___|\___|_|___/\___\___/| .__/ \___|
                               |_|

  Version {}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
