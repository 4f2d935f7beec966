// Team aggregation: sum counting stats across a roster, then re-derive the
// team's metrics from the totals.

use crate::config::LeagueContext;
use crate::stats::calculator::{batting_metrics, pitching_metrics};
use crate::stats::derived::{BattingMetrics, PitchingMetrics};
use crate::stats::record::{BattingRecord, PitchingRecord, PlayerInfo, ValidationError};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Name given to a total that spans more than one team.
pub const COMBINED_NAME: &str = "Combined";

#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("cannot aggregate an empty roster")]
    EmptyRoster,

    #[error(transparent)]
    InvalidRecord(#[from] ValidationError),

    #[error("{field} total overflows")]
    Overflow { field: &'static str },
}

fn add(field: &'static str, a: u32, b: u32) -> Result<u32, AggregationError> {
    a.checked_add(b).ok_or(AggregationError::Overflow { field })
}

/// Identity of a combined record: the shared team, or "Combined" when the
/// inputs span teams.
fn combined_identity(a: &PlayerInfo, b: &PlayerInfo) -> PlayerInfo {
    if !a.team.is_empty() && a.team == b.team {
        PlayerInfo::new(a.team.clone(), a.team.clone(), None)
    } else {
        PlayerInfo::new(COMBINED_NAME, "", None)
    }
}

/// A single record as the starting point of a total.
fn as_total(player: &PlayerInfo) -> PlayerInfo {
    PlayerInfo::new(player.team.clone(), player.team.clone(), None)
}

// ---------------------------------------------------------------------------
// Batting
// ---------------------------------------------------------------------------

fn combine_batting(a: &BattingRecord, b: &BattingRecord) -> Result<BattingRecord, AggregationError> {
    Ok(BattingRecord {
        player: combined_identity(&a.player, &b.player),
        ab: add("AB", a.ab, b.ab)?,
        h: add("H", a.h, b.h)?,
        doubles: add("2B", a.doubles, b.doubles)?,
        triples: add("3B", a.triples, b.triples)?,
        hr: add("HR", a.hr, b.hr)?,
        bb: add("BB", a.bb, b.bb)?,
        ibb: add("IBB", a.ibb, b.ibb)?,
        hbp: add("HBP", a.hbp, b.hbp)?,
        k: add("K", a.k, b.k)?,
        sf: add("SF", a.sf, b.sf)?,
        sb: add("SB", a.sb, b.sb)?,
        cs: add("CS", a.cs, b.cs)?,
        pa: add("PA", a.pa, b.pa)?,
        r: add("R", a.r, b.r)?,
        rbi: add("RBI", a.rbi, b.rbi)?,
    })
}

/// Sum every counting stat across the records. Each record is validated
/// first; the first invalid one fails the whole total.
pub fn aggregate_batting<'a>(
    records: impl IntoIterator<Item = &'a BattingRecord>,
) -> Result<BattingRecord, AggregationError> {
    let mut iter = records.into_iter();
    let first = iter.next().ok_or(AggregationError::EmptyRoster)?;
    first.validate()?;

    let mut total = BattingRecord {
        player: as_total(&first.player),
        ..first.clone()
    };
    for record in iter {
        record.validate()?;
        total = combine_batting(&total, record)?;
    }
    Ok(total)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamBatting {
    pub totals: BattingRecord,
    pub metrics: BattingMetrics,
    pub players: usize,
}

/// Aggregate a roster and derive metrics from the totals.
pub fn team_batting(
    records: &[BattingRecord],
    ctx: &LeagueContext,
) -> Result<TeamBatting, AggregationError> {
    let totals = aggregate_batting(records)?;
    let metrics = batting_metrics(&totals, ctx)?;
    debug!(team = %totals.player.team, players = records.len(), "aggregated batting");
    Ok(TeamBatting {
        totals,
        metrics,
        players: records.len(),
    })
}

// ---------------------------------------------------------------------------
// Pitching
// ---------------------------------------------------------------------------

fn combine_pitching(
    a: &PitchingRecord,
    b: &PitchingRecord,
) -> Result<PitchingRecord, AggregationError> {
    let ip = a
        .ip
        .checked_add(b.ip)
        .ok_or(AggregationError::Overflow { field: "IP" })?;
    // A total only carries batters faced when every input does.
    let bf = if a.bf == 0 || b.bf == 0 {
        0
    } else {
        add("BF", a.bf, b.bf)?
    };
    Ok(PitchingRecord {
        player: combined_identity(&a.player, &b.player),
        ip,
        er: add("ER", a.er, b.er)?,
        h: add("H", a.h, b.h)?,
        bb: add("BB", a.bb, b.bb)?,
        k: add("K", a.k, b.k)?,
        hr: add("HR", a.hr, b.hr)?,
        hbp: add("HBP", a.hbp, b.hbp)?,
        bf,
        w: add("W", a.w, b.w)?,
        l: add("L", a.l, b.l)?,
        g: add("G", a.g, b.g)?,
        gs: add("GS", a.gs, b.gs)?,
        sv: add("SV", a.sv, b.sv)?,
    })
}

/// Sum pitching stats. Innings add as outs, so 0.2 + 0.2 is 1.1.
pub fn aggregate_pitching<'a>(
    records: impl IntoIterator<Item = &'a PitchingRecord>,
) -> Result<PitchingRecord, AggregationError> {
    let mut iter = records.into_iter();
    let first = iter.next().ok_or(AggregationError::EmptyRoster)?;
    first.validate()?;

    let mut total = PitchingRecord {
        player: as_total(&first.player),
        ..first.clone()
    };
    for record in iter {
        record.validate()?;
        total = combine_pitching(&total, record)?;
    }
    Ok(total)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamPitching {
    pub totals: PitchingRecord,
    pub metrics: PitchingMetrics,
    pub players: usize,
}

pub fn team_pitching(
    records: &[PitchingRecord],
    ctx: &LeagueContext,
) -> Result<TeamPitching, AggregationError> {
    let totals = aggregate_pitching(records)?;
    let metrics = pitching_metrics(&totals, ctx)?;
    debug!(team = %totals.player.team, players = records.len(), "aggregated pitching");
    Ok(TeamPitching {
        totals,
        metrics,
        players: records.len(),
    })
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Anything that belongs to a team.
pub trait Rostered {
    fn team(&self) -> &str;
}

impl Rostered for BattingRecord {
    fn team(&self) -> &str {
        &self.player.team
    }
}

impl Rostered for PitchingRecord {
    fn team(&self) -> &str {
        &self.player.team
    }
}

/// Split records into per-team rosters, ordered by team code. Input order is
/// kept within each roster.
pub fn group_by_team<R: Rostered>(records: &[R]) -> BTreeMap<&str, Vec<&R>> {
    let mut teams: BTreeMap<&str, Vec<&R>> = BTreeMap::new();
    for record in records {
        teams.entry(record.team()).or_default().push(record);
    }
    teams
}

/// One batting summary per team, in team order.
pub fn team_batting_summaries(
    records: &[BattingRecord],
    ctx: &LeagueContext,
) -> Result<Vec<TeamBatting>, AggregationError> {
    group_by_team(records)
        .into_values()
        .map(|roster| {
            let totals = aggregate_batting(roster.iter().copied())?;
            let metrics = batting_metrics(&totals, ctx)?;
            Ok(TeamBatting {
                totals,
                metrics,
                players: roster.len(),
            })
        })
        .collect()
}

/// One pitching summary per team, in team order.
pub fn team_pitching_summaries(
    records: &[PitchingRecord],
    ctx: &LeagueContext,
) -> Result<Vec<TeamPitching>, AggregationError> {
    group_by_team(records)
        .into_values()
        .map(|roster| {
            let totals = aggregate_pitching(roster.iter().copied())?;
            let metrics = pitching_metrics(&totals, ctx)?;
            Ok(TeamPitching {
                totals,
                metrics,
                players: roster.len(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::metric::Metric;
    use crate::stats::record::InningsPitched;

    fn hitter(name: &str, team: &str, ab: u32, h: u32, hr: u32, bb: u32) -> BattingRecord {
        BattingRecord {
            player: PlayerInfo::new(name, team, None),
            ab,
            h,
            doubles: h / 5,
            triples: u32::from(h > 0),
            hr,
            bb,
            ibb: bb / 10,
            hbp: 4,
            k: ab / 5,
            sf: 3,
            sb: 10,
            cs: 2,
            pa: ab + bb + 4 + 3,
            r: 60,
            rbi: 70,
        }
    }

    fn arm(name: &str, team: &str, ip: &str, er: u32, k: u32) -> PitchingRecord {
        PitchingRecord {
            player: PlayerInfo::new(name, team, None),
            ip: ip.parse().unwrap(),
            er,
            h: 150,
            bb: 50,
            k,
            hr: 20,
            hbp: 5,
            bf: 800,
            w: 10,
            l: 8,
            g: 30,
            gs: 30,
            sv: 0,
        }
    }

    // -- Totals --

    #[test]
    fn empty_roster_is_an_error() {
        let none: Vec<BattingRecord> = Vec::new();
        assert!(matches!(aggregate_batting(&none), Err(AggregationError::EmptyRoster)));
        let none: Vec<PitchingRecord> = Vec::new();
        assert!(matches!(
            team_pitching(&none, &LeagueContext::default()),
            Err(AggregationError::EmptyRoster)
        ));
    }

    #[test]
    fn counting_stats_sum_exactly() {
        let roster = [
            hitter("A", "NYY", 500, 150, 30, 60),
            hitter("B", "NYY", 400, 100, 10, 40),
        ];
        let total = aggregate_batting(&roster).unwrap();
        assert_eq!(total.ab, 900);
        assert_eq!(total.h, 250);
        assert_eq!(total.hr, 40);
        assert_eq!(total.bb, 100);
        assert_eq!(total.pa, roster[0].pa + roster[1].pa);
        assert_eq!(total.player.name, "NYY");
        assert_eq!(total.player.team, "NYY");
    }

    #[test]
    fn team_average_is_hits_over_at_bats() {
        let roster = [
            hitter("A", "LAD", 500, 150, 30, 60),
            hitter("B", "LAD", 100, 20, 2, 10),
        ];
        let team = team_batting(&roster, &LeagueContext::default()).unwrap();
        // 170 / 600, not the mean of .300 and .200
        assert_eq!(team.metrics.avg, Metric::Value(170.0 / 600.0));
        assert_eq!(team.players, 2);
    }

    #[test]
    fn aggregation_is_associative() {
        let a = hitter("A", "ATL", 500, 150, 30, 60);
        let b = hitter("B", "ATL", 400, 100, 10, 40);
        let c = hitter("C", "BOS", 300, 90, 5, 20);

        let all_at_once = aggregate_batting([&a, &b, &c]).unwrap();
        let ab = aggregate_batting([&a, &b]).unwrap();
        let stepwise = aggregate_batting([&ab, &c]).unwrap();
        let bc = aggregate_batting([&b, &c]).unwrap();
        let other_way = aggregate_batting([&a, &bc]).unwrap();

        assert_eq!(all_at_once, stepwise);
        assert_eq!(all_at_once, other_way);
        assert_eq!(all_at_once.player.name, COMBINED_NAME);
        assert_eq!(all_at_once.player.team, "");
    }

    #[test]
    fn invalid_member_fails_with_player_name() {
        let mut bad = hitter("Broken", "SEA", 100, 30, 2, 5);
        bad.h = 120;
        let roster = [hitter("Fine", "SEA", 200, 50, 5, 10), bad];
        let err = aggregate_batting(&roster).unwrap_err();
        match err {
            AggregationError::InvalidRecord(ValidationError::HitsExceedAtBats { player, .. }) => {
                assert_eq!(player, "Broken");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn overflow_is_reported() {
        let mut big = hitter("A", "TEX", 0, 0, 0, 0);
        big.r = u32::MAX;
        let small = hitter("B", "TEX", 10, 3, 0, 1);
        let err = aggregate_batting([&big, &small]).unwrap_err();
        assert!(matches!(err, AggregationError::Overflow { field: "R" }));
    }

    // -- Pitching --

    #[test]
    fn innings_add_as_outs() {
        let staff = [
            arm("Cole", "NYY", "222.2", 65, 222),
            arm("Rodon", "NYY", "64.1", 42, 64),
        ];
        let total = aggregate_pitching(&staff).unwrap();
        assert_eq!(total.ip, InningsPitched::new(287, 0).unwrap());
        assert_eq!(total.er, 107);
        assert_eq!(total.bf, 1600);

        let team = team_pitching(&staff, &LeagueContext::default()).unwrap();
        let era = team.metrics.era.value().unwrap();
        assert!((era - 9.0 * 107.0 / 287.0).abs() < 1e-9);
    }

    #[test]
    fn batters_faced_dropped_when_any_input_lacks_it() {
        let mut no_bf = arm("Old", "CHC", "10.0", 5, 8);
        no_bf.bf = 0;
        let staff = [arm("New", "CHC", "20.0", 6, 20), no_bf];
        assert_eq!(aggregate_pitching(&staff).unwrap().bf, 0);
    }

    #[test]
    fn pitching_aggregation_is_associative() {
        let a = arm("A", "ATL", "0.2", 1, 2);
        let b = arm("B", "ATL", "10.2", 4, 12);
        let mut c = arm("C", "MIA", "5.1", 2, 6);
        c.bf = 0;

        let all_at_once = aggregate_pitching([&a, &b, &c]).unwrap();
        let ab = aggregate_pitching([&a, &b]).unwrap();
        let stepwise = aggregate_pitching([&ab, &c]).unwrap();
        let bc = aggregate_pitching([&b, &c]).unwrap();
        let other_way = aggregate_pitching([&a, &bc]).unwrap();

        assert_eq!(all_at_once, stepwise);
        assert_eq!(all_at_once, other_way);
        // 2 + 32 + 16 outs
        assert_eq!(all_at_once.ip.outs(), 50);
        assert_eq!(all_at_once.ip.to_string(), "16.2");
        assert_eq!(ab.bf, 1600);
        assert_eq!(all_at_once.bf, 0);
        assert_eq!(all_at_once.player.name, COMBINED_NAME);
    }

    // -- Grouping --

    #[test]
    fn groups_are_ordered_by_team() {
        let records = [
            hitter("A", "SEA", 100, 25, 2, 5),
            hitter("B", "ATL", 100, 30, 3, 5),
            hitter("C", "SEA", 100, 20, 1, 5),
        ];
        let groups = group_by_team(&records);
        let teams: Vec<&str> = groups.keys().copied().collect();
        assert_eq!(teams, vec!["ATL", "SEA"]);
        let sea: Vec<&str> = groups["SEA"].iter().map(|r| r.player.name.as_str()).collect();
        assert_eq!(sea, vec!["A", "C"]);
    }

    #[test]
    fn summaries_per_team() {
        let records = [
            hitter("A", "SEA", 100, 25, 2, 5),
            hitter("B", "ATL", 100, 30, 3, 5),
            hitter("C", "SEA", 100, 20, 1, 5),
        ];
        let summaries = team_batting_summaries(&records, &LeagueContext::default()).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].totals.player.team, "ATL");
        assert_eq!(summaries[1].players, 2);
        assert_eq!(summaries[1].totals.h, 45);
    }
}
