// Terminal and JSON rendering of engine results. Nothing here derives a
// metric; it only formats what the core returns.

use crate::Output;
use saberline_core::evaluation::aggregate::{TeamBatting, TeamPitching};
use saberline_core::evaluation::comparison::{Advantage, Comparison, Leader, Winner};
use saberline_core::evaluation::rating::Rating;
use saberline_core::stats::derived::{
    BattingMetrics, BattingStat, MetricSet, PitchingMetrics, PitchingStat, StatKey,
};
use saberline_core::stats::metric::Metric;
use saberline_core::stats::record::{BattingRecord, PitchingRecord};

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use serde::Serialize;
use serde_json::json;

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// How a stat is conventionally written.
pub(crate) trait DisplayStat: StatKey {
    fn show(self, metric: Metric) -> String;
}

impl DisplayStat for BattingStat {
    fn show(self, metric: Metric) -> String {
        match self {
            BattingStat::WrcPlus | BattingStat::OpsPlus => metric.format(0, false),
            BattingStat::KPct | BattingStat::BbPct => percent(metric),
            _ => metric.format(3, true),
        }
    }
}

impl DisplayStat for PitchingStat {
    fn show(self, metric: Metric) -> String {
        match self {
            PitchingStat::KPct | PitchingStat::BbPct => percent(metric),
            _ => metric.format(2, false),
        }
    }
}

fn percent(metric: Metric) -> String {
    match metric {
        Metric::Value(v) => format!("{:.1}%", v * 100.0),
        other => other.format(1, false),
    }
}

fn new_table<I, T>(header: I) -> Table
where
    I: IntoIterator<Item = T>,
    T: Into<Cell>,
{
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn right(content: impl ToString) -> Cell {
    Cell::new(content).set_alignment(CellAlignment::Right)
}

fn title(out: &Output, heading: &str) {
    let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M");
    println!("{heading}  ({} season, generated {stamp})", out.season);
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One row per stat: label and formatted value.
fn metric_rows<M>(metrics: &M, keys: &[M::Key]) -> Table
where
    M: MetricSet,
    M::Key: DisplayStat,
{
    let mut table = new_table(["Stat", "Value"]);
    for &key in keys {
        table.add_row(vec![Cell::new(key.label()), right(key.show(metrics.metric(key)))]);
    }
    table
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

pub(crate) fn batter(
    out: &Output,
    record: &BattingRecord,
    metrics: &BattingMetrics,
    war: Metric,
    rating: &Rating,
) -> anyhow::Result<()> {
    if out.json {
        return print_json(&json!({
            "player": record.player,
            "role": "batting",
            "record": record,
            "metrics": metrics,
            "war": war,
            "rating": rating,
        }));
    }

    let position = record
        .player
        .position
        .map(|p| p.display_str())
        .unwrap_or("-");
    title(out, &format!("{} ({}, {})", record.player.name, record.player.team, position));
    println!(
        "{} PA, {} H, {} HR, {} BB, {} K",
        record.pa, record.h, record.hr, record.bb, record.k
    );

    let mut table = metric_rows(metrics, &BattingStat::ALL);
    table.add_row(vec![Cell::new("WAR (approx.)"), right(war.format(1, false))]);
    println!("{table}");
    println!("{}: {}", rating.tier, rating.rationale);
    Ok(())
}

pub(crate) fn pitcher(
    out: &Output,
    record: &PitchingRecord,
    metrics: &PitchingMetrics,
    rating: &Rating,
) -> anyhow::Result<()> {
    if out.json {
        return print_json(&json!({
            "player": record.player,
            "role": "pitching",
            "record": record,
            "metrics": metrics,
            "rating": rating,
        }));
    }

    title(out, &format!("{} ({}, P)", record.player.name, record.player.team));
    println!(
        "{} IP, {}-{}, {} K, {} BB, {} HR",
        record.ip, record.w, record.l, record.k, record.bb, record.hr
    );
    println!("{}", metric_rows(metrics, &PitchingStat::ALL));
    println!("{}: {}", rating.tier, rating.rationale);
    Ok(())
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

pub(crate) fn comparison<K>(
    out: &Output,
    first: &str,
    second: &str,
    result: &Comparison<K>,
) -> anyhow::Result<()>
where
    K: DisplayStat + Serialize,
{
    if out.json {
        return print_json(&json!({
            "first": first,
            "second": second,
            "comparison": result,
        }));
    }

    title(out, &format!("{first} vs {second}"));
    let mut table = new_table(["Stat", first, second, "Edge", "Gap", "Weight"]);
    for row in &result.rows {
        let edge = match row.advantage {
            Advantage::First => first,
            Advantage::Second => second,
            Advantage::Even => "even",
            Advantage::Incomparable => "n/a",
        };
        let gap = row
            .gap
            .map(|g| row.stat.show(Metric::Value(g)))
            .unwrap_or_else(|| "-".to_string());
        let weight = if row.weight > 0.0 {
            format!("{:.1}", row.weight)
        } else {
            String::new()
        };
        table.add_row(vec![
            Cell::new(row.label),
            right(row.stat.show(row.first)),
            right(row.stat.show(row.second)),
            Cell::new(edge),
            right(gap),
            right(weight),
        ]);
    }
    println!("{table}");

    let verdict = match result.winner {
        Winner::First => format!("{first} wins"),
        Winner::Second => format!("{second} wins"),
        Winner::Undecided => "Undecided".to_string(),
    };
    println!(
        "{verdict} ({:.1} to {:.1} on weighted advantages)",
        result.first_score, result.second_score
    );
    if !result.excluded.is_empty() {
        println!("Not counted, undefined for one side: {}", result.excluded.join(", "));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

pub(crate) fn teams(
    out: &Output,
    batting: &[TeamBatting],
    pitching: &[TeamPitching],
) -> anyhow::Result<()> {
    if out.json {
        return print_json(&json!({
            "batting": batting,
            "pitching": pitching,
        }));
    }

    title(out, "Team summaries");
    if !batting.is_empty() {
        let mut table = new_table(["Team", "Players", "PA", "HR", "AVG", "OBP", "SLG", "wOBA", "wRC+"]);
        for team in batting {
            let m = &team.metrics;
            table.add_row(vec![
                Cell::new(&team.totals.player.team),
                right(team.players),
                right(team.totals.pa),
                right(team.totals.hr),
                right(BattingStat::Avg.show(m.avg)),
                right(BattingStat::Obp.show(m.obp)),
                right(BattingStat::Slg.show(m.slg)),
                right(BattingStat::Woba.show(m.woba)),
                right(BattingStat::WrcPlus.show(m.wrc_plus)),
            ]);
        }
        println!("Batting\n{table}");
    }
    if !pitching.is_empty() {
        let mut table = new_table(["Team", "Pitchers", "IP", "K", "ERA", "FIP", "WHIP", "K/BB"]);
        for team in pitching {
            let m = &team.metrics;
            table.add_row(vec![
                Cell::new(&team.totals.player.team),
                right(team.players),
                right(team.totals.ip),
                right(team.totals.k),
                right(PitchingStat::Era.show(m.era)),
                right(PitchingStat::Fip.show(m.fip)),
                right(PitchingStat::Whip.show(m.whip)),
                right(PitchingStat::KPerBb.show(m.k_per_bb)),
            ]);
        }
        println!("Pitching\n{table}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Leaders
// ---------------------------------------------------------------------------

pub(crate) fn leaders<K: DisplayStat>(
    out: &Output,
    stat: K,
    leaders: &[Leader<'_>],
) -> anyhow::Result<()> {
    if out.json {
        return print_json(&json!({
            "stat": stat.label(),
            "leaders": leaders,
        }));
    }

    title(out, &format!("{} leaders", stat.label()));
    let mut table = new_table(["#", "Player", stat.label()]);
    for leader in leaders {
        table.add_row(vec![
            right(leader.rank),
            Cell::new(leader.name),
            right(stat.show(Metric::Value(leader.value))),
        ]);
    }
    println!("{table}");
    Ok(())
}
