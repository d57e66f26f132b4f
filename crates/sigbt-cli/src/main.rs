use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sigbt")]
#[command(about = "Signal backtester CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Market data commands
    Md {
        #[command(subcommand)]
        cmd: MdCmd,
    },

    /// Signal generation commands
    Signals {
        #[command(subcommand)]
        cmd: SignalsCmd,
    },

    /// Replay a signal series against candles and report metrics
    Backtest(commands::backtest::BacktestArgs),

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> overrides)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[derive(Subcommand)]
enum MdCmd {
    /// Download klines from Binance into `<out-dir>/<SYMBOL>_<interval>.csv`
    Fetch(commands::md::FetchArgs),

    /// Print a data-quality report for a candle CSV
    Quality(commands::md::QualityArgs),
}

#[derive(Subcommand)]
enum SignalsCmd {
    /// Run a signal producer over candle files and write a signal CSV
    Generate(commands::signals::GenerateArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Md { cmd } => match cmd {
            MdCmd::Fetch(args) => commands::md::md_fetch(args).await?,
            MdCmd::Quality(args) => commands::md::md_quality(args)?,
        },
        Commands::Signals { cmd } => match cmd {
            SignalsCmd::Generate(args) => commands::signals::signals_generate(args)?,
        },
        Commands::Backtest(args) => commands::backtest::backtest(args)?,
        Commands::ConfigHash { paths } => {
            let loaded = sigbt_config::load_layered_yaml(&paths)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}

// stdout carries key=value results; logs go to stderr
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
