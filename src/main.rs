use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    fs::OpenOptions,
    io,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use emi_calculator::{app::App, ui::ui, Config, Edit, LoanState, Quote};

#[derive(Parser)]
#[command(name = "emi")]
#[command(version)]
#[command(about = "EMI loan calculator with live down payment and installment sliders")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "emi.toml")]
    config: PathBuf,

    /// Write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a single quote instead of starting the interactive calculator
    Quote {
        /// Total cost of the asset
        #[arg(long)]
        cost: f64,

        /// Amount paid upfront
        #[arg(long, conflicts_with = "installment")]
        down_payment: Option<f64>,

        /// Desired monthly installment; the down payment is derived from it
        #[arg(long)]
        installment: Option<f64>,

        /// Tenure in months (must be one of the configured options)
        #[arg(long)]
        tenure: Option<u32>,

        /// Annual interest rate in percent
        #[arg(long)]
        rate: Option<f64>,

        /// Processing fee in percent of the financed amount
        #[arg(long)]
        fee: Option<f64>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn setup_logging(verbose: bool, log_file: Option<&Path>, interactive: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact();

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            let subscriber = builder.with_ansi(false).with_writer(Mutex::new(file)).finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("failed to set tracing subscriber")?;
        }
        // The terminal UI owns stdout and stderr.
        None if interactive => {}
        None => {
            let subscriber = builder.with_writer(io::stderr).finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("failed to set tracing subscriber")?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.log_file.as_deref(), cli.command.is_none())?;

    let config = Config::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    match cli.command {
        Some(Commands::Quote {
            cost,
            down_payment,
            installment,
            tenure,
            rate,
            fee,
            json,
        }) => {
            let mut state = LoanState::from_config(&config)?;
            let mut edits = Vec::new();
            edits.extend(rate.map(Edit::InterestRate));
            edits.extend(fee.map(Edit::ProcessingFee));
            edits.extend(tenure.map(Edit::Tenure));
            edits.push(Edit::AssetCost(cost));
            edits.extend(down_payment.map(Edit::DownPayment));
            edits.extend(installment.map(Edit::MonthlyInstallment));
            for edit in edits {
                state.apply(edit)?;
            }

            let quote = Quote::from(&state);
            if json {
                println!("{}", quote.to_json()?);
            } else {
                print!("{quote}");
            }
            Ok(())
        }
        None => run_interactive(&config),
    }
}

fn run_interactive(config: &Config) -> Result<()> {
    let app = App::new(config)?;
    info!(tenures = ?config.tenure.options, "starting calculator");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, &app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && app.handle_key(key) {
                return Ok(());
            }
        }
    }
}
