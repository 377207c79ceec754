use chrono::{Duration, Local};
use clap::{Parser, Subcommand};
use mate_core::*;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Upper bound for `estimate --drinks`
const MAX_DRINKS: i64 = 1000;

#[derive(Parser)]
#[command(name = "mate")]
#[command(about = "Mate caffeine intake tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Load configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Track drinks interactively (default)
    Track {
        /// Reset today's entries without asking for confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Estimate intake for bottles drunk at a single point in time
    Estimate {
        /// Number of bottles
        #[arg(
            long,
            default_value_t = 1,
            value_parser = clap::value_parser!(u32).range(0..=MAX_DRINKS)
        )]
        drinks: u32,

        /// How long ago the bottles were drunk, in hours
        #[arg(long, default_value_t = 0.0)]
        hours_ago: f64,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    mate_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    tracing::debug!(
        "Using dose {} mg, daily max {} mg, half-life {} h",
        config.intake.dose_mg,
        config.intake.max_daily_mg,
        config.intake.half_life_hours
    );

    match cli.command {
        Some(Commands::Track { yes }) => cmd_track(config.intake, yes),
        Some(Commands::Estimate {
            drinks,
            hours_ago,
            json,
        }) => cmd_estimate(config.intake, drinks, hours_ago, json),
        None => {
            // Default to "track" command
            cmd_track(config.intake, false)
        }
    }
}

fn cmd_track(settings: IntakeConfig, assume_yes: bool) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let ledger = Ledger::try_new(settings)?;
    run_session(ledger, stdin.lock(), stdout.lock(), assume_yes)
}

/// Interactive loop; the ledger lives only as long as this session
fn run_session<R: BufRead, W: Write>(
    mut ledger: Ledger,
    mut input: R,
    mut out: W,
    assume_yes: bool,
) -> Result<()> {
    display_disclaimer(&mut out, ledger.settings())?;
    display_status(&mut out, &ledger.summary(&Local::now()), ledger.settings())?;

    loop {
        prompt_user_action(&mut out)?;
        let line = match read_line(&mut input)? {
            Some(line) => line,
            None => break,
        };

        match parse_action(&line) {
            Some(UserAction::Drink) => {
                ledger.add_event(&Local::now());
                writeln!(
                    out,
                    "\n✓ Added one bottle ({} mg)",
                    ledger.settings().dose_mg
                )?;
            }
            Some(UserAction::Reset) => {
                let confirmed = assume_yes
                    || confirm(
                        &mut input,
                        &mut out,
                        "Do you really want to delete all of today's entries?",
                    )?;
                if confirmed {
                    let removed = ledger.reset_today(&Local::now());
                    writeln!(out, "\n✓ Removed {} of today's entries", removed)?;
                } else {
                    writeln!(out, "\nReset cancelled")?;
                }
            }
            Some(UserAction::Refresh) => {}
            Some(UserAction::Quit) => break,
            None => {
                writeln!(out, "Unknown command: {}", line.trim())?;
                continue;
            }
        }

        display_status(&mut out, &ledger.summary(&Local::now()), ledger.settings())?;
    }

    out.flush()?;
    Ok(())
}

fn cmd_estimate(settings: IntakeConfig, drinks: u32, hours_ago: f64, json: bool) -> Result<()> {
    const MAX_HOURS_AGO: f64 = 24.0 * 366.0;

    if !hours_ago.is_finite() || !(0.0..=MAX_HOURS_AGO).contains(&hours_ago) {
        return Err(Error::Other(format!(
            "--hours-ago must be between 0 and {}, got {}",
            MAX_HOURS_AGO, hours_ago
        )));
    }

    let now = Local::now();
    let drunk_at = now - Duration::milliseconds((hours_ago * 3_600_000.0).round() as i64);
    tracing::debug!(
        "Estimating {} bottles drunk at {}",
        drinks,
        drunk_at.to_rfc3339()
    );

    let mut ledger = Ledger::try_new(settings)?;
    for _ in 0..drinks {
        ledger.add_event(&drunk_at);
    }

    let summary = ledger.summary(&now);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
    } else {
        display_status(&mut out, &summary, ledger.settings())?;
    }

    Ok(())
}

fn display_disclaimer<W: Write>(out: &mut W, settings: &IntakeConfig) -> Result<()> {
    writeln!(out, "DISCLAIMER: NOT medical advice!")?;
    writeln!(out, "Only an estimate based on assumptions:")?;
    writeln!(
        out,
        "{} mg per bottle, {} mg daily maximum, {} h half-life.",
        settings.dose_mg, settings.max_daily_mg, settings.half_life_hours
    )?;
    Ok(())
}

fn display_status<W: Write>(
    out: &mut W,
    summary: &IntakeSummary,
    settings: &IntakeConfig,
) -> Result<()> {
    writeln!(out, "\n╭─────────────────────────────────────────╮")?;
    writeln!(out, "│  MATE CAFFEINE TRACKER")?;
    writeln!(out, "╰─────────────────────────────────────────╯")?;
    writeln!(out)?;
    writeln!(out, "  Bottles today:            {}", summary.event_count_today)?;
    writeln!(out, "  Caffeine intake today:    {:.0} mg", summary.total_today_mg)?;
    writeln!(
        out,
        "  Remaining until {:.0} mg:  {:.0} mg",
        settings.max_daily_mg, summary.remaining_allowance_mg
    )?;
    writeln!(out, "  Estimated in system now:  {:.1} mg", summary.residual_mg)?;

    if let Some(warning) = summary.state.warning() {
        writeln!(out)?;
        writeln!(out, "  ⚠ {}", warning)?;
    }

    writeln!(out)?;
    Ok(())
}

#[derive(Debug, PartialEq)]
enum UserAction {
    Drink,
    Reset,
    Refresh,
    Quit,
}

fn parse_action(line: &str) -> Option<UserAction> {
    match line.trim().to_lowercase().as_str() {
        "a" | "+" => Some(UserAction::Drink),
        "r" => Some(UserAction::Reset),
        "" | "s" => Some(UserAction::Refresh),
        "q" => Some(UserAction::Quit),
        _ => None,
    }
}

fn prompt_user_action<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "─────────────────────────────────────────")?;
    writeln!(out, "'a' + Enter to drink one bottle now")?;
    writeln!(out, "'r' + Enter to reset today's entries")?;
    writeln!(out, "  Enter to refresh, 'q' + Enter to quit")?;
    write!(out, "> ")?;
    out.flush()?;
    Ok(())
}

fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> Result<bool> {
    write!(out, "{} [y/N] ", question)?;
    out.flush()?;

    let answer = read_line(input)?.unwrap_or_default();
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Read one line, `None` at end of input
fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}
