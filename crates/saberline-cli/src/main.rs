// saberline entry point.
//
// Startup sequence:
// 1. Parse arguments
// 2. Initialize tracing (stderr, so stdout stays clean for tables and JSON)
// 3. Load config, copying defaults on first run
// 4. Load the batting and pitching tables
// 5. Run the subcommand and print the result

mod report;

use saberline_core::config::{self, Config, ContextHandle, LeagueContext};
use saberline_core::evaluation::aggregate::{team_batting_summaries, team_pitching_summaries};
use saberline_core::evaluation::comparison::{compare_batters, compare_pitchers, leaderboard};
use saberline_core::evaluation::rating::{rate_batter, rate_pitcher};
use saberline_core::stats::calculator::{approximate_war, batting_metrics, pitching_metrics};
use saberline_core::stats::derived::{BattingMetrics, BattingStat, PitchingMetrics, PitchingStat};
use saberline_core::stats::record::{BattingRecord, PitchingRecord};
use saberline_core::table::{self, LoadedTable, SeasonTables};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    let config = config::load_config(&cli.base_dir).context("failed to load configuration")?;
    let handle = ContextHandle::new(config.league.clone());
    if let Some(path) = &cli.league {
        let league = config::load_league_context(path)
            .with_context(|| format!("failed to load league context from {}", path.display()))?;
        handle.replace(league);
    }
    let ctx = handle.current();
    info!("using {} league context", ctx.season);

    let tables = load_tables(&cli, &config).context("failed to load stat tables")?;
    report_rejections(&tables);

    let out = Output {
        json: cli.json,
        season: ctx.season,
    };
    match &cli.command {
        Commands::Player { name } => run_player(&out, &tables, &ctx, name),
        Commands::Compare { first, second } => {
            run_compare(&out, &tables, &ctx, &config, first, second)
        }
        Commands::Team { team } => run_team(&out, &tables, &ctx, team.as_deref()),
        Commands::Leaders { stat, limit, role } => {
            run_leaders(&out, &tables, &ctx, stat, *limit, *role)
        }
    }
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("saberline=info,saberline_core=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Sabermetric reports from season stat tables.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding `config/`, `defaults/` and the data files.
    #[arg(long, global = true, default_value = ".")]
    base_dir: PathBuf,

    /// Batting CSV, overriding `data_paths.batting`. Relative paths resolve
    /// against `--base-dir`.
    #[arg(long, global = true)]
    batting: Option<PathBuf>,

    /// Pitching CSV, overriding `data_paths.pitching`. Relative paths resolve
    /// against `--base-dir`.
    #[arg(long, global = true)]
    pitching: Option<PathBuf>,

    /// League context TOML to use instead of `config/league.toml`.
    #[arg(long, global = true)]
    league: Option<PathBuf>,

    /// Print JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full metric line and rating for one player.
    Player {
        /// Player name; case-insensitive, a unique partial name also works.
        name: String,
    },
    /// Head-to-head comparison of two batters or two pitchers.
    Compare { first: String, second: String },
    /// Team totals with metrics re-derived from summed counting stats.
    Team {
        /// Only this team code (e.g. "LAD").
        #[arg(long)]
        team: Option<String>,
    },
    /// Rank players on one stat.
    Leaders {
        /// Stat label, e.g. "wRC+", "FIP", "K/BB".
        #[arg(long)]
        stat: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Which table to rank when a label exists for both (K%, BB%).
        #[arg(long, value_enum)]
        role: Option<Role>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Role {
    Batting,
    Pitching,
}

pub(crate) struct Output {
    pub json: bool,
    pub season: u16,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Apply the `--batting`/`--pitching` overrides to the configured paths and
/// load both tables against `--base-dir`.
fn load_tables(cli: &Cli, config: &Config) -> anyhow::Result<SeasonTables> {
    let mut paths = config.data_paths.clone();
    if let Some(path) = &cli.batting {
        paths.batting = path_arg(path)?;
    }
    if let Some(path) = &cli.pitching {
        paths.pitching = path_arg(path)?;
    }
    Ok(table::load_season(&cli.base_dir, &paths)?)
}

fn path_arg(path: &Path) -> anyhow::Result<String> {
    path.to_str()
        .map(str::to_owned)
        .with_context(|| format!("path is not valid UTF-8: {}", path.display()))
}

fn report_rejections(tables: &SeasonTables) {
    let rejected = tables.batting.rejected.len() + tables.pitching.rejected.len();
    if rejected > 0 {
        warn!("{} rows were rejected; see warnings above", rejected);
    }
}

/// Exact case-insensitive match first, then a unique partial match.
fn find<'a, T>(table: &'a LoadedTable<T>, name: &str, name_of: impl Fn(&T) -> &str) -> Option<&'a T> {
    let wanted = name.trim().to_lowercase();
    if let Some(exact) = table
        .records
        .iter()
        .find(|r| name_of(r).to_lowercase() == wanted)
    {
        return Some(exact);
    }
    let mut partial = table
        .records
        .iter()
        .filter(|r| name_of(r).to_lowercase().contains(&wanted));
    match (partial.next(), partial.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}

fn find_batter<'a>(tables: &'a SeasonTables, name: &str) -> Option<&'a BattingRecord> {
    find(&tables.batting, name, |r| r.player.name.as_str())
}

fn find_pitcher<'a>(tables: &'a SeasonTables, name: &str) -> Option<&'a PitchingRecord> {
    find(&tables.pitching, name, |r| r.player.name.as_str())
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

fn run_player(
    out: &Output,
    tables: &SeasonTables,
    ctx: &LeagueContext,
    name: &str,
) -> anyhow::Result<()> {
    let batter = find_batter(tables, name);
    let pitcher = find_pitcher(tables, name);
    if batter.is_none() && pitcher.is_none() {
        bail!("no player matching '{}'", name);
    }

    if let Some(record) = batter {
        let metrics = batting_metrics(record, ctx)?;
        let war = approximate_war(record, &metrics);
        let rating = rate_batter(&metrics, ctx);
        report::batter(out, record, &metrics, war, &rating)?;
    }
    if let Some(record) = pitcher {
        let metrics = pitching_metrics(record, ctx)?;
        let rating = rate_pitcher(&metrics, ctx);
        report::pitcher(out, record, &metrics, &rating)?;
    }
    Ok(())
}

fn run_compare(
    out: &Output,
    tables: &SeasonTables,
    ctx: &LeagueContext,
    config: &Config,
    first: &str,
    second: &str,
) -> anyhow::Result<()> {
    if let (Some(a), Some(b)) = (find_batter(tables, first), find_batter(tables, second)) {
        let comparison = compare_batters(
            &batting_metrics(a, ctx)?,
            &batting_metrics(b, ctx)?,
            &config.comparison.batting,
        );
        return report::comparison(out, &a.player.name, &b.player.name, &comparison);
    }
    if let (Some(a), Some(b)) = (find_pitcher(tables, first), find_pitcher(tables, second)) {
        let comparison = compare_pitchers(
            &pitching_metrics(a, ctx)?,
            &pitching_metrics(b, ctx)?,
            &config.comparison.pitching,
        );
        return report::comparison(out, &a.player.name, &b.player.name, &comparison);
    }

    for name in [first, second] {
        if find_batter(tables, name).is_none() && find_pitcher(tables, name).is_none() {
            bail!("no player matching '{}'", name);
        }
    }
    bail!("'{}' and '{}' are not both batters or both pitchers", first, second)
}

fn run_team(
    out: &Output,
    tables: &SeasonTables,
    ctx: &LeagueContext,
    team: Option<&str>,
) -> anyhow::Result<()> {
    let mut batting = team_batting_summaries(&tables.batting.records, ctx)?;
    let mut pitching = team_pitching_summaries(&tables.pitching.records, ctx)?;

    if let Some(code) = team {
        batting.retain(|t| t.totals.player.team.eq_ignore_ascii_case(code));
        pitching.retain(|t| t.totals.player.team.eq_ignore_ascii_case(code));
        if batting.is_empty() && pitching.is_empty() {
            bail!("no records for team '{}'", code);
        }
    }
    report::teams(out, &batting, &pitching)
}

fn run_leaders(
    out: &Output,
    tables: &SeasonTables,
    ctx: &LeagueContext,
    stat: &str,
    limit: usize,
    role: Option<Role>,
) -> anyhow::Result<()> {
    let batting_stat = BattingStat::from_label(stat).filter(|_| role != Some(Role::Pitching));
    let pitching_stat = PitchingStat::from_label(stat).filter(|_| role != Some(Role::Batting));

    if let Some(key) = batting_stat {
        let rows = derived_batting(&tables.batting.records, ctx);
        let entries = rows.iter().map(|(name, m)| (name.as_str(), m));
        let leaders = leaderboard(entries, key, limit);
        return report::leaders(out, key, &leaders);
    }
    if let Some(key) = pitching_stat {
        let rows = derived_pitching(&tables.pitching.records, ctx);
        let entries = rows.iter().map(|(name, m)| (name.as_str(), m));
        let leaders = leaderboard(entries, key, limit);
        return report::leaders(out, key, &leaders);
    }
    bail!("unknown stat '{}'", stat)
}

fn derived_batting(records: &[BattingRecord], ctx: &LeagueContext) -> Vec<(String, BattingMetrics)> {
    records
        .iter()
        .filter_map(|r| match batting_metrics(r, ctx) {
            Ok(m) => Some((r.player.name.clone(), m)),
            Err(e) => {
                warn!("skipping {}: {}", r.player.name, e);
                None
            }
        })
        .collect()
}

fn derived_pitching(
    records: &[PitchingRecord],
    ctx: &LeagueContext,
) -> Vec<(String, PitchingMetrics)> {
    records
        .iter()
        .filter_map(|r| match pitching_metrics(r, ctx) {
            Ok(m) => Some((r.player.name.clone(), m)),
            Err(e) => {
                warn!("skipping {}: {}", r.player.name, e);
                None
            }
        })
        .collect()
}
