use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use automotions_core::api::{load_json_file, ApiMotion, ApiRound, ApiTournament};
use automotions_core::config::{load_config, resolve_config, write_config, AutomotionsConfig};
use automotions_core::export::write_table;
use automotions_core::format::TournamentFormat;
use automotions_core::ledger::{insert_year, read_ledger_file, write_ledger_file, year_to_lines};
use automotions_core::model::{TournamentGroup, TournamentYear};
use automotions_core::reconcile::MotionReconciler;

mod version;

#[derive(Parser)]
#[command(
    name = "automotions",
    version = version::FULL,
    about = "Reconcile tournament motion statistics and maintain motion ledgers"
)]
struct Cli {
    /// Project root used for config lookup and relative ledger paths
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,
    /// Log reconciliation progress to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Output {
    Lines,
    Json,
    Table,
}

#[derive(Subcommand)]
enum Command {
    /// Join API rounds/motions with a saved statistics page
    Reconcile {
        /// JSON array of API rounds
        #[arg(long)]
        rounds: PathBuf,
        /// JSON array of API motions
        #[arg(long)]
        motions: PathBuf,
        /// Saved HTML of the motion statistics page
        #[arg(long)]
        page: PathBuf,
        /// Tournament year name, e.g. "JPDU Autumn 2024"
        #[arg(long, required_unless_present = "tournament")]
        name: Option<String>,
        /// API tournament record to take the year name from
        #[arg(long)]
        tournament: Option<PathBuf>,
        /// Statistics layout (NA, Asian, BP); inferred when omitted
        #[arg(long)]
        format: Option<TournamentFormat>,
        #[arg(long, value_enum, default_value_t = Output::Lines)]
        output: Output,
    },
    /// Insert a reconciled tournament year (JSON) into a ledger file
    Insert {
        #[arg(long)]
        ledger: PathBuf,
        #[arg(long)]
        year: PathBuf,
        /// Index of the tournament group to insert into
        #[arg(long, default_value_t = 0)]
        group: usize,
        /// Position within the group (0 = first)
        #[arg(long, default_value_t = 0)]
        position: usize,
    },
    /// Parse a ledger file and summarize it
    Check {
        #[arg(long)]
        ledger: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Rewrite a ledger file with canonical tab indentation
    Fmt {
        #[arg(long)]
        ledger: PathBuf,
    },
    /// Set project defaults in .automotions.toml
    Config {
        /// Statistics layout to assume when reconciling
        #[arg(long)]
        format: Option<TournamentFormat>,
        /// Directory that relative --ledger paths resolve against
        #[arg(long)]
        ledger_dir: Option<String>,
    },
    /// Print version information
    Version,
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("AUTOMOTIONS_LOG")
        .unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = resolve_config(&cli.root);
    debug!(?config, root = %cli.root.display(), "resolved config");

    match cli.command {
        Some(Command::Reconcile {
            rounds,
            motions,
            page,
            name,
            tournament,
            format,
            output,
        }) => {
            let name = year_name(name, tournament.as_deref())?;
            let year = reconcile_year(&rounds, &motions, &page, &name, format.or(config.format))?;
            print_year(&year, output)?;
        }
        Some(Command::Insert {
            ledger,
            year,
            group,
            position,
        }) => {
            let path = ledger_path(&config, &cli.root, &ledger);
            let mut groups = read_ledger(&path)?;
            let year: TournamentYear = load_json_file(&year)?;
            let year_name = year.name.clone();
            insert_year(&mut groups, group, position, year)?;
            write_ledger_file(&path, &groups)
                .with_context(|| format!("write ledger {}", path.display()))?;
            println!(
                "Inserted {} into {} (group {}, position {})",
                year_name,
                path.display(),
                group,
                position
            );
        }
        Some(Command::Check { ledger, json }) => {
            let path = ledger_path(&config, &cli.root, &ledger);
            let groups = read_ledger(&path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&groups)?);
            } else {
                print_summary(&groups);
            }
        }
        Some(Command::Fmt { ledger }) => {
            let path = ledger_path(&config, &cli.root, &ledger);
            let groups = read_ledger(&path)?;
            write_ledger_file(&path, &groups)
                .with_context(|| format!("write ledger {}", path.display()))?;
            println!("Formatted {}", path.display());
        }
        Some(Command::Config { format, ledger_dir }) => {
            let updates = AutomotionsConfig { format, ledger_dir };
            let project = updates.or(load_config(&cli.root).unwrap_or_default());
            let path = write_config(&cli.root, &project)
                .with_context(|| format!("write config under {}", cli.root.display()))?;
            println!("Wrote {}", path.display());
        }
        Some(Command::Version) => {
            println!("automotions {}", version::FULL);
        }
        None => {
            Cli::command().print_help()?;
            println!();
        }
    }
    Ok(())
}

fn ledger_path(config: &AutomotionsConfig, root: &Path, ledger: &Path) -> PathBuf {
    config.resolve_ledger_path(root, ledger)
}

fn read_ledger(path: &Path) -> Result<Vec<TournamentGroup>> {
    read_ledger_file(path).with_context(|| format!("read ledger {}", path.display()))
}

fn year_name(name: Option<String>, tournament: Option<&Path>) -> Result<String> {
    if let Some(name) = name {
        return Ok(name);
    }
    let path = tournament.context("either --name or --tournament is required")?;
    let tournament: ApiTournament = load_json_file(path)?;
    Ok(tournament.name)
}

fn reconcile_year(
    rounds: &Path,
    motions: &Path,
    page: &Path,
    name: &str,
    format: Option<TournamentFormat>,
) -> Result<TournamentYear> {
    let rounds: Vec<ApiRound> = load_json_file(rounds)?;
    let motions: Vec<ApiMotion> = load_json_file(motions)?;
    let html = fs::read_to_string(page)
        .with_context(|| format!("read statistics page {}", page.display()))?;

    let mut reconciler = MotionReconciler::from_api(&rounds, &motions, format);
    reconciler
        .apply_statistics_page(&html)
        .with_context(|| format!("reconcile {}", page.display()))?;
    Ok(reconciler.into_year(name))
}

fn print_year(year: &TournamentYear, output: Output) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match output {
        Output::Lines => {
            for line in year_to_lines(year) {
                writeln!(out, "{line}")?;
            }
        }
        Output::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(year)?)?;
        }
        Output::Table => write_table(&mut out, year)?,
    }
    Ok(())
}

fn print_summary(groups: &[TournamentGroup]) {
    for (idx, group) in groups.iter().enumerate() {
        println!("[{}] {} ({} tournaments)", idx, group.name, group.tournaments.len());
        for year in &group.tournaments {
            println!(
                "    {}: {} rounds, {} motions",
                year.name,
                year.rounds.len(),
                year.motion_count()
            );
        }
    }
}
