use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use reminders::backend::{Backend, HttpBackend};
use reminders::config::{config_dir, init_config, load_config, Config, ViewMode};
use reminders::error::{ReminderError, Result};
use reminders::logging::init_logging;
use reminders::reminder::{select_clients, ClientGroup, ClientKey, SplitGroups};
use reminders::render::{
    render_client_details, render_clients, render_loaded_file, render_send_summary,
    render_smtp_check, render_split, render_stats,
};
use reminders::session::{Outcome, Session, Slot};

#[derive(Parser)]
#[command(name = "reminders")]
#[command(version, about = "Invoice reminder client: analyze portfolio spreadsheets and send reminder emails", long_about = None)]
struct Cli {
    /// Path to config directory (default: ~/.reminders or XDG config)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    /// Backend base URL (overrides server.base_url)
    #[arg(long, global = true, value_name = "URL")]
    server: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct Inputs {
    /// Clients and sellers spreadsheet (.xlsx or .xls)
    clients: PathBuf,

    /// Aged portfolio spreadsheet (.xlsx or .xls)
    portfolio: PathBuf,

    /// Only show clients whose name contains this text
    #[arg(short, long)]
    filter: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with a template config.toml
    Init,

    /// Show the effective configuration
    Status,

    /// Upload both spreadsheets and show reminders grouped by client
    Analyze {
        #[command(flatten)]
        inputs: Inputs,

        /// Layout of the grouped reminders (default: display.view)
        #[arg(long, value_enum)]
        view: Option<ViewMode>,

        /// Show each client's invoices per status
        #[arg(short, long)]
        details: bool,

        /// Print groups as JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Analyze, then email every selected client its reminders
    Send {
        #[command(flatten)]
        inputs: Inputs,

        /// Only send to this client (can be repeated)
        #[arg(short, long, value_name = "NAME|EMAIL")]
        client: Vec<ClientKey>,

        /// Leave this client out (can be repeated)
        #[arg(short, long, value_name = "NAME|EMAIL")]
        exclude: Vec<ClientKey>,

        /// Maximum clients per request (default: send.batch_size)
        #[arg(long)]
        batch_size: Option<usize>,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Ask the backend to send itself a test email
    SmtpCheck,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Determine config directory
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    let server = cli.server;
    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Status => cmd_status(&cfg_dir, &effective_config(&cfg_dir, server)?),
        Commands::Analyze {
            inputs,
            view,
            details,
            json,
        } => {
            let config = effective_config(&cfg_dir, server)?;
            let view = view.unwrap_or(config.display.view);
            cmd_analyze(&config, &inputs, view, details, json)
        }
        Commands::Send {
            inputs,
            client,
            exclude,
            batch_size,
            yes,
        } => {
            let config = effective_config(&cfg_dir, server)?;
            let batch_size = batch_size.unwrap_or(config.send.batch_size);
            cmd_send(&config, &inputs, &client, &exclude, batch_size, yes)
        }
        Commands::SmtpCheck => cmd_smtp_check(&effective_config(&cfg_dir, server)?),
    }
}

/// config.toml with the command-line server override applied
fn effective_config(cfg_dir: &Path, server: Option<String>) -> Result<Config> {
    let mut config = load_config(cfg_dir)?;
    if let Some(server) = server {
        config.server.base_url = server;
    }
    Ok(config)
}

/// Initialize config directory with the template file
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    let path = init_config(cfg_dir)?;

    println!("Initialized reminders config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!("  1. Point it at your backend:  $EDITOR {}", path.display());
    println!("  2. Check email delivery:      reminders smtp-check");
    println!();
    println!("Then analyze your spreadsheets:");
    println!("  reminders analyze <clients.xlsx> <portfolio.xlsx>");

    Ok(())
}

/// Show the effective configuration
fn cmd_status(cfg_dir: &Path, config: &Config) -> Result<()> {
    let config_file = cfg_dir.join("config.toml");

    println!("Reminders Status");
    println!("{}", "-".repeat(50));
    if config_file.exists() {
        println!("Config file:      {}", config_file.display());
    } else {
        println!("Config file:      {} (not found, using defaults)", config_file.display());
    }
    println!("Backend:          {}", config.server.base_url);
    println!("Timeout:          {}s", config.server.timeout_secs);
    println!(
        "View:             {}",
        match config.display.view {
            ViewMode::Unified => "unified",
            ViewMode::Split => "split",
        }
    );
    println!("Currency:         {}", config.display.currency_symbol);
    println!("Batch size:       {} clients", config.send.batch_size);

    Ok(())
}

/// Load both spreadsheets and run the analysis.
/// Returns false when the backend found nothing to remind about.
fn load_and_analyze(
    session: &mut Session,
    backend: &dyn Backend,
    inputs: &Inputs,
    quiet: bool,
) -> Result<bool> {
    for (slot, path, label) in [
        (Slot::Clients, &inputs.clients, "Clients"),
        (Slot::Portfolio, &inputs.portfolio, "Portfolio"),
    ] {
        let file = session.load_file(slot, path)?;
        if !quiet {
            println!("{}", render_loaded_file(label, file));
        }
    }

    match session.analyze(backend)? {
        Outcome::Empty(message) => {
            if quiet {
                eprintln!("{message}");
            } else {
                println!("{message}");
            }
            Ok(false)
        }
        Outcome::Analyzed { records, clients } => {
            info!(records, clients, "analysis complete");
            Ok(true)
        }
    }
}

fn filter_split(mut split: SplitGroups, filter: Option<&str>) -> SplitGroups {
    if let Some(filter) = filter {
        let needle = filter.to_lowercase();
        split.overdue.retain(|g| g.client.to_lowercase().contains(&needle));
        split.upcoming.retain(|g| g.client.to_lowercase().contains(&needle));
    }
    split
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| ReminderError::InvalidResponse(e.to_string()))?;
    println!("{json}");
    Ok(())
}

/// Upload, group and display reminders
fn cmd_analyze(
    config: &Config,
    inputs: &Inputs,
    view: ViewMode,
    details: bool,
    json: bool,
) -> Result<()> {
    let backend = HttpBackend::new(&config.server);
    let mut session = Session::new();
    let filter = inputs.filter.as_deref();

    if !load_and_analyze(&mut session, &backend, inputs, json)? {
        if json {
            match view {
                ViewMode::Unified => print_json(&Vec::<ClientGroup>::new())?,
                ViewMode::Split => print_json(&SplitGroups::default())?,
            }
        }
        return Ok(());
    }

    if view == ViewMode::Split {
        let split = filter_split(session.split_view(), filter);
        if json {
            return print_json(&split);
        }
        println!("{}", render_stats(session.stats()));
        println!();
        println!("{}", render_split(&split, &config.display));
        return Ok(());
    }

    let visible = session.visible_groups(filter);
    if json {
        return print_json(&visible);
    }

    println!("{}", render_stats(session.stats()));
    println!();

    if visible.is_empty() {
        println!("No clients match '{}'.", filter.unwrap_or(""));
        return Ok(());
    }

    println!("{}", render_clients(&visible, &config.display));
    if details {
        for group in &visible {
            println!();
            println!("{}", render_client_details(group, &config.display));
        }
    }

    println!();
    println!(
        "Clients shown: {} of {}",
        visible.len(),
        session.groups().len()
    );

    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Upload, select clients and dispatch one email per client
fn cmd_send(
    config: &Config,
    inputs: &Inputs,
    include: &[ClientKey],
    exclude: &[ClientKey],
    batch_size: usize,
    yes: bool,
) -> Result<()> {
    let backend = HttpBackend::new(&config.server);
    let mut session = Session::new();

    if !load_and_analyze(&mut session, &backend, inputs, false)? {
        return Ok(());
    }

    let visible = session.visible_groups(inputs.filter.as_deref());
    let selection = select_clients(&visible, include, exclude);
    if selection.is_empty() {
        return Err(ReminderError::NothingSelected);
    }

    let selected: Vec<&ClientGroup> = visible
        .iter()
        .copied()
        .filter(|g| selection.iter().any(|k| k.matches(&g.client, &g.client_email)))
        .collect();
    println!();
    println!("{}", render_clients(&selected, &config.display));
    println!();

    let prompt = format!(
        "Send {} unified emails? Each client receives ONE email with all its invoices (overdue, upcoming and not due).",
        selection.len()
    );
    if !yes && !confirm(&prompt)? {
        println!("Aborted.");
        return Ok(());
    }

    let summary = session
        .send(&backend, &selection, batch_size)
        .inspect_err(|e| {
            if let ReminderError::PartialSend { delivered, .. } = e {
                println!("Delivered before the failure:");
                println!("{}", render_send_summary(delivered));
            }
        })?;

    println!("{}", render_send_summary(&summary));
    if let Some(message) = &summary.message {
        println!("{message}");
    }

    Ok(())
}

/// Run the backend's SMTP self-test
fn cmd_smtp_check(config: &Config) -> Result<()> {
    let backend = HttpBackend::new(&config.server);
    let check = backend.smtp_check()?;

    println!("{}", render_smtp_check(&check));
    if !check.success {
        return Err(ReminderError::Rejected("SMTP self-test failed".to_string()));
    }
    Ok(())
}
