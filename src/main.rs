//! CLI entry point for `slacksearch`.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use unicode_width::UnicodeWidthStr;

use slacksearch::archive::Archive;
use slacksearch::config::Config;
use slacksearch::export::{self, OutputFormat, RenderOptions};
use slacksearch::model::timestamp::Zone;
use slacksearch::search::{self, SearchOptions};

#[derive(Parser)]
#[command(name = "slacksearch", version)]
#[command(about = "Search exported Slack archives using Slack's search syntax")]
#[command(after_help = "QUERY SYNTAX:\n  \
    word \"exact phrase\"       text (all terms must match)\n  \
    in:#channel             channel\n  \
    from:@user              sender name or id\n  \
    is:thread               threaded messages\n  \
    on:/before:/after:DATE  YYYY-MM-DD, inclusive (until:, since: too)\n  \
    during:month            month name or 3-letter prefix\n  \
    -term -from:x -in:y     exclude")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Search messages in one or more archives
    Search {
        /// Query string, e.g. 'in:#general from:@alice "release notes"'
        query: String,
        /// Export directories or channel-day JSON files; none or `-` reads
        /// one day log from stdin
        #[arg(value_name = "PATH")]
        paths: Vec<PathBuf>,
        /// Channel name for a log read from stdin
        #[arg(long, default_value = search::STDIN_CHANNEL)]
        channel: String,
        /// Extra users manifest merged into every archive's user table
        #[arg(long, value_name = "FILE")]
        users_file: Option<PathBuf>,
        /// Output format: text, csv, json
        #[arg(short, long)]
        format: Option<String>,
        /// Shorthand for --format json
        #[arg(long, conflicts_with = "format")]
        json: bool,
        /// Write results to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Use UTC instead of local time for dates
        #[arg(long)]
        utc: bool,
    },
    /// List channels in an archive
    Channels {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = slacksearch::config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Search {
            query,
            paths,
            channel,
            users_file,
            format,
            json,
            output,
            utc,
        } => {
            let format = if json {
                OutputFormat::Json
            } else {
                format
                    .as_deref()
                    .unwrap_or(config.output.format.as_str())
                    .parse::<OutputFormat>()
                    .map_err(|e| anyhow::anyhow!(e))?
            };
            let zone = if utc { Zone::Utc } else { config.general.timezone };
            cmd_search(
                &config,
                &query,
                &paths,
                &channel,
                users_file,
                format,
                zone,
                output.as_deref(),
            )
        }
        Commands::Channels { path, json } => cmd_channels(&config, &path, json),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = slacksearch::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "slacksearch.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "slacksearch", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::stdout().write_all(&buf)?;
    Ok(())
}

/// Search archives and print matching messages.
fn cmd_search(
    config: &Config,
    query: &str,
    paths: &[PathBuf],
    channel: &str,
    users_file: Option<PathBuf>,
    format: OutputFormat,
    zone: Zone,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let options = SearchOptions {
        zone,
        users_file,
        layout: config.archive.clone(),
    };

    let from_stdin = paths.is_empty() || paths.iter().all(|p| p.as_os_str() == "-");
    let (_parsed_query, results) = if from_stdin {
        if paths.len() > 1 {
            anyhow::bail!("stdin ('-') can only be given once");
        }
        let stdin = std::io::stdin();
        search::search_reader(std::io::BufReader::new(stdin.lock()), channel, query, &options)?
    } else {
        if paths.iter().any(|p| p.as_os_str() == "-") {
            anyhow::bail!("stdin ('-') cannot be combined with archive paths");
        }

        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} Searching [{bar:40.cyan/blue}] {pos}/{len} files")
                .expect("valid template")
                .progress_chars("#>-"),
        );

        let found = search::execute(
            paths,
            query,
            &options,
            Some(&|current, total| {
                pb.set_length(total as u64);
                pb.set_position(current as u64);
            }),
        )?;
        pb.finish_and_clear();
        found
    };
    tracing::info!(matches = results.len(), "Search complete");

    let render = RenderOptions {
        zone,
        date_format: config.output.date_format.clone(),
    };

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
            export::write_results(&results, format, &render, &mut file)?;
            file.flush()?;
            eprintln!("  {} result(s) written to {}", results.len(), path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            export::write_results(&results, format, &render, &mut lock)?;
            lock.flush()?;
        }
    }

    Ok(())
}

/// List channels with their day-file count and size.
fn cmd_channels(config: &Config, path: &Path, json: bool) -> anyhow::Result<()> {
    let archive = Archive::open(path, &config.archive)?;
    let summaries = archive.channel_summaries()?;

    if json {
        let output = serde_json::json!({
            "archive": path.to_string_lossy(),
            "channel_count": summaries.len(),
            "channels": summaries,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    use humansize::{format_size, BINARY};

    let name_width = summaries
        .iter()
        .map(|s| s.name.width() + 1)
        .max()
        .unwrap_or(0)
        .max("Channel".len());

    println!();
    println!(
        "  {}{}  {:>6}  {:>10}",
        "Channel",
        " ".repeat(name_width - "Channel".len()),
        "Days",
        "Size"
    );
    println!("  {}", "-".repeat(name_width + 20));
    for summary in &summaries {
        let label = format!("#{}", summary.name);
        let pad = name_width.saturating_sub(label.width());
        println!(
            "  {}{}  {:>6}  {:>10}",
            label,
            " ".repeat(pad),
            summary.files,
            format_size(summary.bytes, BINARY)
        );
    }
    println!();
    println!("  {} channel(s)", summaries.len());
    println!();

    Ok(())
}
