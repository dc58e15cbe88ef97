use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Table};
use configuration::{Config, LogFormat, init_logging, load_config, validate};
use core_types::OrderSide;
use engine::{SessionRunner, TradingSession};
use events::{RecordedEvent, SessionEvent};
use executor::{ExecutionState, ManualScheduler, SubmitOutcome};
use indicatif::{ProgressBar, ProgressStyle};
use market_data::{BarTrend, source_for};
use risk::InputOutcome;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;

/// The main entry point for the trade simulator.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // .env is optional.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    // Keep the guard alive so buffered file logs are flushed on exit.
    let _log_guard = init_logging(&config.logging, cli.log_file.as_deref())?;
    tracing::debug!(?config, "Configuration in effect");

    match cli.command {
        Commands::Series(args) => handle_series(&config, args),
        Commands::Quote(args) => handle_quote(&config, args),
        Commands::Simulate(args) => handle_simulate(&config, args).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A trade simulator: synthetic prices, order economics and a simulated order lifecycle.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (default: ./simulator.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Append logs to this file instead of stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Log line format.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate and print a synthetic price history.
    Series(SeriesArgs),
    /// Print the economics of an order without submitting it.
    Quote(OrderArgs),
    /// Submit an order and walk it through confirmation and success.
    Simulate(SimulateArgs),
}

#[derive(Args)]
struct SeriesArgs {
    /// Instrument symbol (e.g., "AAPL"). Defaults to the configured instrument.
    #[arg(long)]
    symbol: Option<String>,

    /// Number of daily points to generate, 2 to 3650.
    #[arg(long)]
    days: Option<usize>,

    /// Seed for a reproducible walk.
    #[arg(long)]
    seed: Option<u64>,

    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct OrderArgs {
    /// Instrument symbol (e.g., "AAPL"). Defaults to the configured instrument.
    #[arg(long)]
    symbol: Option<String>,

    /// Available funds. Defaults to the configured initial funds.
    #[arg(long)]
    funds: Option<String>,

    /// Number of shares.
    #[arg(long)]
    quantity: String,

    /// Leverage multiplier, 1 to 5.
    #[arg(long, default_value = "1")]
    leverage: String,

    /// "buy" or "sell".
    #[arg(long, default_value = "buy")]
    side: OrderSide,

    /// Seed for a reproducible walk.
    #[arg(long)]
    seed: Option<u64>,

    /// Print JSON instead of tables.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SimulateArgs {
    #[command(flatten)]
    order: OrderArgs,

    /// Run the timers on a virtual clock instead of waiting for them.
    #[arg(long)]
    instant: bool,
}

// ==============================================================================
// Session Setup
// ==============================================================================

fn open_session(
    config: &Config,
    symbol: Option<&str>,
    seed: Option<u64>,
) -> anyhow::Result<TradingSession> {
    let mut config = config.clone();
    if let Some(symbol) = symbol {
        config.session.default_instrument = symbol.to_string();
    }
    let catalog = config.catalog()?;
    let source = source_for(seed.or(config.session.seed));
    let session = TradingSession::new(&config, catalog, source)?;
    Ok(session)
}

/// Applies the order form; rejected text keeps the session's previous value.
fn fill_form(session: &mut TradingSession, order: &OrderArgs) -> anyhow::Result<()> {
    session.set_side(order.side)?;
    if let Some(funds) = &order.funds {
        report_input("funds", funds, session.set_funds_text(funds)?);
    }
    report_input("quantity", &order.quantity, session.set_quantity_text(&order.quantity)?);
    report_input("leverage", &order.leverage, session.set_leverage_text(&order.leverage)?);
    Ok(())
}

fn report_input<T: Copy + Display>(field: &str, raw: &str, outcome: InputOutcome<T>) {
    if let InputOutcome::Rejected { retained, reason } = outcome {
        eprintln!("Ignoring {} '{}': {} (keeping {})", field, raw, reason, retained);
    }
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn handle_series(config: &Config, args: SeriesArgs) -> anyhow::Result<()> {
    let mut config = config.clone();
    if let Some(days) = args.days {
        config.generator.days = days;
    }
    validate(&config)?;

    let session = open_session(&config, args.symbol.as_deref(), args.seed)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(session.series())?);
        return Ok(());
    }

    let chart = session.chart();
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Date", "Price", "Trend", "Chart"]);
    for bar in &chart.bars {
        let trend = match bar.trend {
            BarTrend::Rising => "up",
            BarTrend::Falling => "down",
            BarTrend::Latest => "latest",
        };
        let width = (bar.height_pct / Decimal::from(5)).round().to_usize().unwrap_or(0);
        table.add_row(vec![
            Cell::new(bar.date),
            Cell::new(format!("{:.2}", bar.price)).set_alignment(CellAlignment::Right),
            Cell::new(trend),
            Cell::new(format!("|{}", "#".repeat(width))),
        ]);
    }

    println!("{}", session.instrument());
    println!("{table}");
    println!(
        "Latest {:.2}  {}  (range {:.2} - {:.2})",
        session.series().current_price(),
        session.price_change().display(),
        chart.min_price,
        chart.max_price
    );
    Ok(())
}

fn handle_quote(config: &Config, args: OrderArgs) -> anyhow::Result<()> {
    let mut session = open_session(config, args.symbol.as_deref(), args.seed)?;
    fill_form(&mut session, &args)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&session.economics().rounded())?);
        return Ok(());
    }
    print_quote(&session);
    Ok(())
}

async fn handle_simulate(config: &Config, args: SimulateArgs) -> anyhow::Result<()> {
    let mut session = open_session(config, args.order.symbol.as_deref(), args.order.seed)?;
    fill_form(&mut session, &args.order)?;
    // Form set-up events are not part of the lifecycle transcript.
    session.drain_events();
    let json = args.order.json;

    if !json {
        print_quote(&session);
    }

    if args.instant {
        simulate_on_virtual_clock(session, json)
    } else {
        simulate_on_real_timers(session, json).await
    }
}

fn simulate_on_virtual_clock(mut session: TradingSession, json: bool) -> anyhow::Result<()> {
    let mut scheduler = ManualScheduler::new();
    let outcome = session.submit(&mut scheduler);
    print_events(session.drain_events(), json)?;
    if !outcome.is_accepted() {
        return Ok(());
    }

    while let Some(delay) = scheduler.next_due_in() {
        scheduler.advance(delay, |s, token| {
            session.on_timer(token, s);
        });
        print_events(session.drain_events(), json)?;
    }
    Ok(())
}

async fn simulate_on_real_timers(session: TradingSession, json: bool) -> anyhow::Result<()> {
    let label = session.order_button_label();
    let mut runner = SessionRunner::new(session);
    let mut events = runner.subscribe();

    let outcome = runner.submit().await;
    print_events(drain(&mut events), json)?;
    if let SubmitOutcome::Ignored(_) = outcome {
        return Ok(());
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}")?,
    );
    spinner.set_message(format!("Confirming: {}...", label));
    spinner.enable_steady_tick(Duration::from_millis(100));

    while runner.step().await? != Some(ExecutionState::Succeeded) {}
    spinner.finish_and_clear();
    print_events(drain(&mut events), json)?;

    runner.run_until_idle().await?;
    print_events(drain(&mut events), json)?;
    Ok(())
}

// ==============================================================================
// Output
// ==============================================================================

fn drain(events: &mut tokio::sync::broadcast::Receiver<RecordedEvent>) -> Vec<RecordedEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

fn print_events(events: Vec<RecordedEvent>, json: bool) -> anyhow::Result<()> {
    for recorded in events {
        if json {
            println!("{}", recorded.to_json()?);
            continue;
        }
        let at = recorded.timestamp.format("%H:%M:%S%.3f");
        match recorded.event {
            SessionEvent::StateChanged(change) => {
                println!("[{}] {} -> {}", at, change.from, change.to);
            }
            SessionEvent::OrderExecuted(execution) => {
                println!(
                    "[{}] {} at {:.2} (total {:.2}, ticket {})",
                    at,
                    execution.summary(),
                    execution.price,
                    execution.total_cost,
                    execution.ticket_id
                );
            }
            SessionEvent::OrderIgnored(reason) => {
                println!("[{}] Order not submitted: {}", at, reason);
            }
            _ => {}
        }
    }
    Ok(())
}

fn print_quote(session: &TradingSession) {
    let economics = session.economics().rounded();
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        Cell::new(session.instrument()),
        Cell::new(session.order_button_label()),
    ]);
    let rows: Vec<(String, String)> = vec![
        ("Current price".into(), format!("{:.2}", economics.current_price)),
        ("Change".into(), economics.price_change.display()),
        ("Leverage".into(), economics.leverage.to_string()),
        ("Max affordable".into(), economics.max_affordable_quantity.to_string()),
        (session.total_label().into(), format!("{:.2}", economics.total_cost)),
        (
            format!("Potential gain ({}% move)", signed(economics.gain_scenario_pct)),
            format!("{:.2}", economics.potential_gain),
        ),
        (
            format!("Potential loss ({}% move)", signed(economics.loss_scenario_pct)),
            format!("{:.2}", economics.potential_loss),
        ),
        (
            "Can submit".into(),
            if economics.is_valid { "yes" } else { "no" }.into(),
        ),
    ];
    for (label, value) in rows {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{table}");
}

fn signed(value: Decimal) -> String {
    if value.is_sign_negative() {
        value.normalize().to_string()
    } else {
        format!("+{}", value.normalize())
    }
}
