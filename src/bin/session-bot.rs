// Session Bot - configuration resolution and market bootstrap
// Single entry point: resolve the session, then hand off to the decision loop

use clap::Parser;
use session_bootstrap::{BootstrapError, CliOptions, LastAction};
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload};

// Load command module from cli directory
#[path = "../cli/session_commands.rs"]
mod session_commands;

#[derive(Parser)]
#[command(name = "session-bot")]
#[command(version = "0.1.0")]
#[command(about = "Resolve and bootstrap a trading session", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(long, default_value = "config.json")]
    config: String,

    /// TOML file overriding the built-in defaults
    #[arg(long)]
    defaults: Option<String>,

    /// coinbasepro, binance or dummy
    #[arg(long)]
    exchange: Option<String>,

    /// Market symbol (BTC-GBP on coinbasepro, BTCUSDT on binance)
    #[arg(long)]
    market: Option<String>,

    /// Candle width: seconds (coinbasepro) or label (binance)
    #[arg(long)]
    granularity: Option<String>,

    #[arg(long)]
    smartswitch: Option<i64>,

    #[arg(long)]
    graphs: Option<i64>,

    /// 1 enables debug logging
    #[arg(long)]
    verbose: Option<i64>,

    #[arg(long)]
    live: Option<i64>,

    /// slow, fast, slow-sample or fast-sample
    #[arg(long)]
    sim: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    sellupperpcnt: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    selllowerpcnt: Option<f64>,

    #[arg(long)]
    sellatloss: Option<i64>,

    /// Last order placed on the account (buy or sell)
    #[arg(long, default_value = "none")]
    last_action: LastAction,
}

impl Cli {
    fn options(&self) -> CliOptions {
        CliOptions {
            exchange: self.exchange.clone(),
            market: self.market.clone(),
            granularity: self.granularity.clone(),
            smartswitch: self.smartswitch,
            graphs: self.graphs,
            verbose: self.verbose,
            live: self.live,
            sim: self.sim.clone(),
            sellupperpcnt: self.sellupperpcnt,
            selllowerpcnt: self.selllowerpcnt,
            sellatloss: self.sellatloss,
        }
    }
}

fn exit_with(e: BootstrapError) -> ! {
    error!("❌ Startup failed ({})", e.category());
    for line in e.user_message().lines() {
        error!("{}", line);
    }
    std::process::exit(1);
}

fn main() {
    let cli = Cli::parse();

    // Setup logging first so config errors are visible; the level is
    // raised once the file layer is known
    let initial = if cli.verbose == Some(1) { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let (filter, level_handle) = reload::Layer::new(initial);
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();

    info!("🚀 Session Bot v0.1.0");
    info!("📁 Config: {}", cli.config);

    let options = cli.options();
    let config = match session_commands::resolve_session(&cli.config, cli.defaults.as_deref(), &options) {
        Ok(config) => config,
        Err(e) => exit_with(e),
    };

    let level = session_commands::log_level(&config);
    if let Err(e) = level_handle.modify(|filter| *filter = level) {
        error!("Unable to change log level: {}", e);
    }

    if let Err(e) = session_commands::run(&config, cli.last_action) {
        exit_with(e);
    }
}
