use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use log::info;
use spotify_cadence::cadence;
use spotify_cadence::clients::errors::{Error, Result};
use spotify_cadence::demo::{self, ConfigBuilder, Demo, Gait};

#[derive(Parser)]
#[command(name = "spotify-cadence")]
#[command(version, about = "Search Spotify tracks and estimate running cadence", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a token, search tracks and print the cadence estimate (default)
    Run(RunArgs),
    /// Print only the cadence estimate, no network access
    Cadence(GaitArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Free-text search term
    #[arg(long, default_value = demo::DEFAULT_QUERY)]
    query: String,

    /// Number of tracks to list
    #[arg(long, default_value_t = demo::DEFAULT_LIMIT, value_parser = clap::value_parser!(u32).range(1..=50))]
    limit: u32,

    /// Deadline shared by both requests, in seconds
    #[arg(long, default_value_t = demo::DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,

    #[command(flatten)]
    gait: GaitArgs,
}

impl Default for RunArgs {
    fn default() -> Self {
        RunArgs {
            query: demo::DEFAULT_QUERY.to_string(),
            limit: demo::DEFAULT_LIMIT,
            timeout_secs: demo::DEFAULT_TIMEOUT.as_secs(),
            gait: GaitArgs::default(),
        }
    }
}

#[derive(Args)]
struct GaitArgs {
    /// Runner height in meters
    #[arg(long, default_value_t = demo::DEFAULT_HEIGHT_M)]
    height: f64,

    /// Running speed in meters per second
    #[arg(long, default_value_t = demo::DEFAULT_SPEED_MPS)]
    speed: f64,
}

impl Default for GaitArgs {
    fn default() -> Self {
        GaitArgs {
            height: demo::DEFAULT_HEIGHT_M,
            speed: demo::DEFAULT_SPEED_MPS,
        }
    }
}

impl From<&GaitArgs> for Gait {
    fn from(args: &GaitArgs) -> Gait {
        Gait {
            height_m: args.height,
            speed_mps: args.speed,
        }
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => run_demo(RunArgs::default()).await,
        Some(Commands::Run(args)) => run_demo(args).await,
        Some(Commands::Cadence(args)) => {
            let estimate = cadence::estimate(args.height, args.speed)?;
            println!("{estimate}");
            Ok(())
        }
    }
}

async fn run_demo(args: RunArgs) -> Result<()> {
    info!("Building config ...");
    let config = match ConfigBuilder::new()
        .query(args.query)
        .limit(args.limit)
        .gait(Gait::from(&args.gait))
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()
    {
        Ok(config) => config,
        // Missing credentials end the run cleanly, before any request is made
        Err(Error::ConfigurationError(msg)) => {
            println!("{msg}");
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let demo = Demo::new(config);
    let mut stdout = std::io::stdout();
    demo.run(&mut stdout).await
}
