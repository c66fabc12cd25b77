use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use volley_tracker::api::{build_router, dedup_by_id, state::AppState};
use volley_tracker::calculate::{aggregate_range, derive_rows};
use volley_tracker::config::AppConfig;
use volley_tracker::display::all_columns;
use volley_tracker::import::parse_csv_file;
use volley_tracker::models::{DateRange, Event, Person, StatRow, Team, TeamAggregate};
use volley_tracker::storage::{
    create_team, find_team, load_match_summaries, read_teams, save_stat_rows, EntityType,
    JsonlReader, StorageConfig,
};

#[derive(Parser)]
#[command(name = "volley-tracker")]
#[command(about = "Volleyball team manager with match statistics")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Manage teams
    Team {
        #[command(subcommand)]
        action: TeamAction,
    },

    /// Import a CSV stat sheet into a game
    Import {
        /// Team ID
        #[arg(long)]
        team: String,

        /// Game event ID
        #[arg(long)]
        event: String,

        /// CSV export to read
        #[arg(long)]
        file: PathBuf,

        /// Parse and preview without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Print team totals and record over a date range
    Overview {
        /// Team ID
        #[arg(long)]
        team: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        to: Option<String>,

        /// Print the full aggregate as JSON
        #[arg(long)]
        json: bool,
    },

    /// List stat columns with their labels
    Columns,
}

#[derive(Subcommand)]
enum TeamAction {
    /// Create a team
    Add {
        #[arg(long)]
        name: String,
    },

    /// List teams
    List,
}

fn parse_date(value: Option<&str>, flag: &str) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("Invalid --{} date (expected YYYY-MM-DD): {}", flag, s))
        })
        .transpose()
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn print_rows(rows: &[StatRow]) {
    println!(
        "{:<24} {:>4} {:>4} {:>4} {:>7} {:>5} {:>4} {:>5}",
        "Name", "K", "E", "TA", "Atk%", "K/S", "SA", "Pct"
    );
    for row in rows {
        println!(
            "{:<24} {:>4} {:>4} {:>4} {:>7} {:>5} {:>4} {:>5}",
            row.name,
            fmt_opt(row.kills),
            fmt_opt(row.attack_errors),
            fmt_opt(row.attack_attempts),
            fmt_opt(row.attack_efficiency),
            fmt_opt(row.kills_per_set),
            fmt_opt(row.serve_aces),
            fmt_opt(row.serve_percentage),
        );
    }
}

fn print_overview(team: &Team, overview: &TeamAggregate) {
    println!("\n=== {} ===", team.name);
    if let Some(range) = &overview.date_range {
        println!("Range:            {} to {}", range.from, range.to);
    }
    println!("Matches:          {}", overview.matches);
    println!("Record:           {}-{}", overview.wins, overview.losses);
    println!("Win %:            {}", fmt_opt(overview.win_percentage));
    println!("Kills:            {}", overview.totals.kills);
    println!("Kills per set:    {}", fmt_opt(overview.kills_per_set));
    println!("Attack eff.:      {}", fmt_opt(overview.attack_efficiency));
    println!("Serve %:          {}", fmt_opt(overview.serve_percentage));
    println!("Serve eff.:       {}", fmt_opt(overview.serve_efficiency));
    println!("Pass rating:      {}", fmt_opt(overview.receive_percentage));
    println!("Blocks per set:   {}", fmt_opt(overview.blocks_per_set));

    if !overview.series.is_empty() {
        println!("\nPer match:");
        for point in &overview.series {
            println!(
                "  {}  {:<24} points {:>4}  errors {:>4}",
                point.date, point.title, point.score, point.errors
            );
        }
    }
}

fn run_import(
    config: &AppConfig,
    storage: &StorageConfig,
    team_id: &str,
    event_id: &str,
    file: &std::path::Path,
    dry_run: bool,
) -> Result<()> {
    find_team(storage, team_id)?;
    let event = JsonlReader::<Event>::for_entity(storage, EntityType::Event, team_id)
        .read_all()?
        .into_iter()
        .find(|e| e.id.as_str() == event_id)
        .with_context(|| format!("No event {} in team {}", event_id, team_id))?;
    if !event.is_game() {
        bail!("Event {} is a {}, stats are only kept for games", event.id, event.kind);
    }

    let sheet = parse_csv_file(file).with_context(|| format!("Failed to read {:?}", file))?;
    print_rows(&derive_rows(&sheet.rows, config.stats.input_policy));
    println!(
        "\n{} rows parsed, {} summary lines skipped",
        sheet.rows.len(),
        sheet.skipped
    );
    if !sheet.unrecognized_headers.is_empty() {
        println!("Ignored columns: {}", sheet.unrecognized_headers.join(", "));
    }

    if dry_run {
        println!("\n(dry run - no data written to disk)");
        return Ok(());
    }

    let roster = dedup_by_id(
        JsonlReader::<Person>::for_entity(storage, EntityType::Person, team_id).read_all()?,
        |p| p.id.as_str(),
    );
    let report = save_stat_rows(storage, team_id, &event.id, sheet.rows, &roster);

    println!("\n=== Import Results ===");
    println!("Saved:            {}", report.saved.len());
    if !report.failed.is_empty() {
        println!("\nNot saved:");
        for failure in &report.failed {
            println!("  - row {} ({}): {}", failure.row_id, failure.name, failure.reason);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config {:?}", cli.config))?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting volley-tracker v{}", env!("CARGO_PKG_VERSION"));
    let storage = StorageConfig::new(config.data_dir.clone());

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;

            let addr = format!("{}:{}", config.server.host, config.server.port);
            let app = build_router(AppState::new(config));
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("API: http://{}/api", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Team { action } => match action {
            TeamAction::Add { name } => {
                let team = Team::new(name.trim().to_string());
                create_team(&storage, &team)?;
                println!("{}\t{}", team.id, team.name);
            }
            TeamAction::List => {
                let teams = dedup_by_id(read_teams(&storage)?, |t| t.id.as_str());
                for team in teams {
                    let members =
                        JsonlReader::<Person>::for_entity(&storage, EntityType::Person, team.id.as_str())
                            .count()?;
                    println!("{}\t{}\t{} members", team.id, team.name, members);
                }
            }
        },
        Commands::Import {
            team,
            event,
            file,
            dry_run,
        } => {
            run_import(&config, &storage, &team, &event, &file, dry_run)?;
        }
        Commands::Overview {
            team,
            from,
            to,
            json,
        } => {
            let team = find_team(&storage, &team)?;
            let range = DateRange::from_bounds(
                parse_date(from.as_deref(), "from")?,
                parse_date(to.as_deref(), "to")?,
                chrono::Utc::now().date_naive(),
                config.stats.default_range_days,
            );
            if range.from > range.to {
                bail!("--from {} is after --to {}", range.from, range.to);
            }

            let matches = load_match_summaries(&storage, team.id.as_str())?;
            let overview = aggregate_range(&matches, range);
            if json {
                println!("{}", serde_json::to_string_pretty(&overview)?);
            } else {
                print_overview(&team, &overview);
            }
        }
        Commands::Columns => {
            for column in all_columns() {
                println!(
                    "{:<20} {:<8} {:<6} {}",
                    column.id.as_str(),
                    format!("{:?}", column.group).to_lowercase(),
                    column.label,
                    column.tooltip
                );
            }
        }
    }

    Ok(())
}
