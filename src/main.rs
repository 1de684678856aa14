use castlytics::config::{self, AppConfig};
use castlytics::dashboard::{format_compact, DashboardView};
use castlytics::neynar::{CastSource, NeynarClient};
use castlytics::ranking::RankingPipeline;
use castlytics::{fetch_top_casts, format_number, server, Error, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "castlytics", about = "Farcaster cast engagement analytics")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rank a user's casts by engagement and print the top ones.
    Top(TopArgs),
    /// Serve the JSON API and the Mini App frontend.
    Serve(ServeArgs),
    /// Write the default configuration file.
    InitConfig(InitConfigArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SourceArg {
    UserCasts,
    Feed,
}

impl From<SourceArg> for CastSource {
    fn from(value: SourceArg) -> Self {
        match value {
            SourceArg::UserCasts => CastSource::UserCasts,
            SourceArg::Feed => CastSource::Feed,
        }
    }
}

#[derive(Args, Debug, Clone)]
struct TopArgs {
    #[arg(long, required_unless_present = "username", conflicts_with = "username")]
    fid: Option<u64>,
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long, value_enum)]
    source: Option<SourceArg>,
    #[arg(long)]
    json: bool,
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct ServeArgs {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    web_root: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct InitConfigArgs {
    #[arg(long, default_value = "config/castlytics.toml")]
    path: PathBuf,
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() {
    let env_files = config::load_env_files(Path::new("."));
    init_tracing();
    for path in env_files {
        debug!(path = %path.display(), "loaded env file");
    }
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Top(args) => run_top(args).await,
        Command::Serve(args) => run_serve(args).await,
        Command::InitConfig(args) => run_init_config(args),
    }
}

async fn run_top(args: TopArgs) -> Result<()> {
    let (config, config_path) = AppConfig::load(args.config)?;
    if let Some(path) = config_path.filter(|path| path.exists()) {
        info!(path = %path.display(), "loaded config");
    }

    let client = NeynarClient::from_config(&config)?;
    let source = args.source.map(CastSource::from).unwrap_or(config.neynar.source);
    let limit = args.limit.unwrap_or(config.ranking.limit);
    if limit == 0 {
        return Err(Error::Invalid("--limit must be at least 1".to_string()));
    }
    let pipeline = RankingPipeline::with_limit(limit);

    let fid = match (args.fid, args.username.as_deref()) {
        (Some(fid), _) => fid,
        (None, Some(username)) => {
            client
                .lookup_user_by_username(username)
                .await
                .map_err(|err| Error::Fetch(err.into_inner()))?
                .fid
        }
        (None, None) => return Err(Error::Invalid("pass --fid or --username".to_string())),
    };

    let report = fetch_top_casts(&client, source, fid, &pipeline).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let view = DashboardView::build(&report, args.username.as_deref(), chrono::Utc::now());
    print_dashboard(&view);
    Ok(())
}

fn print_dashboard(view: &DashboardView) {
    if let Some(empty) = &view.empty_state {
        println!("{} {}", empty.emoji, empty.title);
        println!("{}", empty.message);
        if let Some(tip) = &empty.tip {
            println!("Tip: {}", tip);
        }
        return;
    }

    if let Some(owner) = &view.owner {
        println!("{} (@{})", owner.name, owner.username);
    }
    println!(
        "Top {} casts | {} total engagement | {} casts analyzed",
        view.entries.len(),
        format_compact(view.total_engagement),
        format_number(view.casts_fetched as u64)
    );

    for entry in &view.entries {
        println!();
        println!(
            "#{}  {} engagement (likes {} | recasts {} | replies {}){}",
            entry.rank,
            format_number(entry.total_engagement),
            format_number(entry.engagement.likes),
            format_number(entry.engagement.recasts),
            format_number(entry.engagement.replies),
            entry
                .posted
                .as_deref()
                .map(|posted| format!("  {}", posted))
                .unwrap_or_default()
        );
        for line in entry.text.lines() {
            println!("    {}", line);
        }
        if !entry.media.is_empty() {
            println!("    [{} media attachment(s)]", entry.media.len());
        }
        if let Some(url) = &entry.url {
            println!("    {}", url);
        }
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let (mut config, _) = AppConfig::load(args.config)?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(web_root) = args.web_root {
        config.server.web_root = web_root;
    }
    server::serve(config).await
}

fn run_init_config(args: InitConfigArgs) -> Result<()> {
    if args.path.exists() && !args.force {
        return Err(Error::Invalid(format!(
            "{} already exists (use --force to overwrite)",
            args.path.display()
        )));
    }
    AppConfig::default().write(&args.path)?;
    println!("Wrote {}", args.path.display());
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("castlytics=info,tower_http=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
