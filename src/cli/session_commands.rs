// Session command implementations
use chrono::Utc;
use session_bootstrap::{
    resolve, BootstrapResult, CliOptions, Exchange, FileConfig, LastAction, PaperExchange,
    SessionConfiguration, SessionDefaults, SessionStart, StartupSequencer,
};
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;

/// Starting balances for the dummy exchange
const PAPER_QUOTE_BALANCE: f64 = 1000.0;

pub fn load_layers(config_path: &str, defaults_path: Option<&str>) -> BootstrapResult<(SessionDefaults, FileConfig)> {
    let defaults = match defaults_path {
        Some(path) => {
            info!("📄 Defaults: {}", path);
            SessionDefaults::from_file(path)?
        }
        None => SessionDefaults::default(),
    };
    let file = FileConfig::load_or_empty(config_path)?;
    Ok((defaults, file))
}

pub fn resolve_session(
    config_path: &str,
    defaults_path: Option<&str>,
    options: &CliOptions,
) -> BootstrapResult<SessionConfiguration> {
    let (defaults, file) = load_layers(config_path, defaults_path)?;
    resolve(&defaults, &file, options)
}

/// `verbose` from any layer turns on debug output.
pub fn log_level(config: &SessionConfiguration) -> LevelFilter {
    if config.is_verbose() {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}

pub fn run(config: &SessionConfiguration, last_action: LastAction) -> BootstrapResult<()> {
    describe(config);

    match config.exchange() {
        Exchange::Dummy => run_paper(config, last_action),
        exchange => {
            info!("✅ {} session validated", exchange);
            warn!("⚠️  The {} transport belongs to the decision loop, stopping after validation", exchange);
            Ok(())
        }
    }
}

fn describe(config: &SessionConfiguration) {
    info!("⚙️  Session");
    info!("   Exchange: {}", config.exchange());
    info!("   Market: {}", config.market());
    info!("   Granularity: {} (smart switch {})", config.granularity(), u8::from(config.smart_switch()));
    if config.is_simulation() {
        info!("   Simulation: {}", config.sim_speed());
    }
    if config.is_telegram_enabled() {
        info!("   Telegram: enabled");
    }
}

fn run_paper(config: &SessionConfiguration, last_action: LastAction) -> BootstrapResult<()> {
    let seed = Utc::now().timestamp() as u64;
    let paper = PaperExchange::new(seed).with_balance(config.quote_currency().as_str(), PAPER_QUOTE_BALANCE);

    let start = StartupSequencer::new(config, &paper)
        .with_progress(true)
        .bootstrap(last_action)?;

    match start {
        SessionStart::Simulation(data) => {
            info!(
                "📊 {} candles of {} ready for simulation",
                data.window.len(),
                data.window.market()
            );
            if let (Some(first), Some(last)) = (data.window.first_timestamp(), data.window.last_timestamp()) {
                info!("   From {} to {}", first, last);
            }
        }
        SessionStart::Live(handle) => {
            info!(
                "📡 Ready to poll {} every {} ({} checks passed)",
                handle.market,
                handle.granularity,
                handle.preflight.checks.len()
            );
        }
    }
    Ok(())
}
