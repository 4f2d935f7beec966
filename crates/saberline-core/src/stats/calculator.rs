// Metric calculator: raw counting stats in, derived sabermetrics out.
//
// Every function here is pure. Records are validated before any division,
// and any division by a non-positive denominator yields `Metric::Undefined`.

use crate::config::{LeagueContext, WobaWeights};
use crate::stats::derived::{BattingMetrics, PitchingMetrics};
use crate::stats::metric::Metric;
use crate::stats::record::{BattingRecord, PitchingRecord, Position, ValidationError};

/// Plate appearances in a full season, the scale the WAR estimate uses.
const FULL_SEASON_PA: f64 = 700.0;

/// Runs per win-scale multiplier for the offensive term of the WAR estimate.
const OFFENSE_RUN_SCALE: f64 = 20.0;

/// Replacement-level wins over a full season.
const REPLACEMENT_WINS: f64 = 2.0;

// ---------------------------------------------------------------------------
// Batting
// ---------------------------------------------------------------------------

/// Validate a batting record and derive its full metric set.
pub fn batting_metrics(
    record: &BattingRecord,
    ctx: &LeagueContext,
) -> Result<BattingMetrics, ValidationError> {
    record.validate()?;
    Ok(derive_batting(record, ctx))
}

/// Derive batting metrics from a record already known to be valid.
fn derive_batting(r: &BattingRecord, ctx: &LeagueContext) -> BattingMetrics {
    let ab = f64::from(r.ab);
    let h = f64::from(r.h);

    let avg = Metric::ratio(h, ab);
    let obp = on_base_percentage(r);
    let slg = Metric::ratio(r.total_bases() as f64, ab);
    let ops = obp.zip_with(slg, |o, s| o + s);
    let iso = slg.zip_with(avg, |s, a| s - a);
    let woba = weighted_on_base(r, &ctx.woba_weights);
    let wrc_plus = wrc_plus(woba, ctx);
    let ops_plus = obp.zip_with(slg, |o, s| 100.0 * (o / ctx.obp + s / ctx.slg - 1.0));

    let pa = f64::from(r.pa);

    BattingMetrics {
        avg,
        obp,
        slg,
        ops,
        iso,
        babip: babip(r),
        woba,
        wrc_plus,
        ops_plus,
        k_pct: Metric::ratio(f64::from(r.k), pa),
        bb_pct: Metric::ratio(f64::from(r.bb), pa),
    }
}

/// (H + BB + HBP) / (AB + BB + HBP + SF)
pub fn on_base_percentage(r: &BattingRecord) -> Metric {
    let times_on = u64::from(r.h) + u64::from(r.bb) + u64::from(r.hbp);
    let denominator = u64::from(r.ab) + u64::from(r.bb) + u64::from(r.hbp) + u64::from(r.sf);
    Metric::ratio(times_on as f64, denominator as f64)
}

/// (H − HR) / (AB − K − HR + SF). The denominator can go negative for
/// strikeout-heavy small samples; that is undefined too.
pub fn babip(r: &BattingRecord) -> Metric {
    let in_play = i64::from(r.ab) - i64::from(r.k) - i64::from(r.hr) + i64::from(r.sf);
    let hits_in_play = i64::from(r.h) - i64::from(r.hr);
    Metric::ratio(hits_in_play as f64, in_play as f64)
}

/// Linear-weights wOBA over AB + BB − IBB + SF + HBP.
pub fn weighted_on_base(r: &BattingRecord, w: &WobaWeights) -> Metric {
    let numerator = w.ubb * f64::from(r.unintentional_walks())
        + w.hbp * f64::from(r.hbp)
        + w.single * f64::from(r.singles())
        + w.double * f64::from(r.doubles)
        + w.triple * f64::from(r.triples)
        + w.home_run * f64::from(r.hr);
    let denominator = u64::from(r.ab)
        + u64::from(r.unintentional_walks())
        + u64::from(r.sf)
        + u64::from(r.hbp);
    Metric::ratio(numerator, denominator as f64)
}

/// wRC+ = 100 × ((wOBA − lgwOBA) / scale + lgR/PA) / lgR/PA.
///
/// Not park-adjusted. Full precision is kept; round only for display.
pub fn wrc_plus(woba: Metric, ctx: &LeagueContext) -> Metric {
    woba.map(|w| 100.0 * ((w - ctx.woba) / ctx.woba_scale + ctx.runs_per_pa) / ctx.runs_per_pa)
}

/// Run a batch of records, one result per record in input order. A record
/// that fails validation doesn't affect the others.
pub fn batting_metrics_batch(
    records: &[BattingRecord],
    ctx: &LeagueContext,
) -> Vec<Result<BattingMetrics, ValidationError>> {
    records.iter().map(|r| batting_metrics(r, ctx)).collect()
}

// ---------------------------------------------------------------------------
// Approximate WAR
// ---------------------------------------------------------------------------

/// Positional adjustment in runs per full season.
pub fn position_adjustment(position: Option<Position>) -> f64 {
    match position {
        Some(Position::Catcher) => 12.5,
        Some(Position::FirstBase) => -12.5,
        Some(Position::SecondBase) => 2.5,
        Some(Position::ThirdBase) => 2.5,
        Some(Position::ShortStop) => 7.5,
        Some(Position::LeftField) => -7.5,
        Some(Position::CenterField) => 2.5,
        Some(Position::RightField) => -7.5,
        Some(Position::DesignatedHitter) => -17.5,
        Some(Position::Outfield) | Some(Position::Pitcher) | None => 0.0,
    }
}

/// Rough batter WAR: offense above average plus position and replacement
/// credit, each scaled by playing time, floored at zero. No defense, no park.
pub fn approximate_war(record: &BattingRecord, metrics: &BattingMetrics) -> Metric {
    let pa = f64::from(record.ab) + f64::from(record.bb) + f64::from(record.sf) + f64::from(record.hbp);
    let share = pa / FULL_SEASON_PA;
    let position = position_adjustment(record.player.position);
    metrics.wrc_plus.map(|wrc| {
        let offense = (wrc - 100.0) / 100.0 * share * OFFENSE_RUN_SCALE;
        (offense + position * share + REPLACEMENT_WINS * share).max(0.0)
    })
}

// ---------------------------------------------------------------------------
// Pitching
// ---------------------------------------------------------------------------

/// Validate a pitching record and derive its full metric set.
pub fn pitching_metrics(
    record: &PitchingRecord,
    ctx: &LeagueContext,
) -> Result<PitchingMetrics, ValidationError> {
    record.validate()?;
    Ok(derive_pitching(record, ctx))
}

fn derive_pitching(r: &PitchingRecord, ctx: &LeagueContext) -> PitchingMetrics {
    let ip = r.ip.as_innings();
    let per_nine = |count: u32| Metric::ratio(9.0 * f64::from(count), ip);
    let bf = f64::from(r.bf);

    PitchingMetrics {
        era: per_nine(r.er),
        fip: fip(r, ctx),
        whip: Metric::ratio(f64::from(r.h) + f64::from(r.bb), ip),
        k_per_bb: Metric::ratio_or_unbounded(f64::from(r.k), f64::from(r.bb)),
        k_per_9: per_nine(r.k),
        bb_per_9: per_nine(r.bb),
        hr_per_9: per_nine(r.hr),
        k_pct: Metric::ratio(f64::from(r.k), bf),
        bb_pct: Metric::ratio(f64::from(r.bb), bf),
    }
}

/// (13×HR + 3×(BB+HBP) − 2×K) / IP + FIP constant.
pub fn fip(r: &PitchingRecord, ctx: &LeagueContext) -> Metric {
    let components = 13.0 * f64::from(r.hr) + 3.0 * (f64::from(r.bb) + f64::from(r.hbp))
        - 2.0 * f64::from(r.k);
    Metric::ratio(components, r.ip.as_innings()).map(|v| v + ctx.fip_constant)
}

pub fn pitching_metrics_batch(
    records: &[PitchingRecord],
    ctx: &LeagueContext,
) -> Vec<Result<PitchingMetrics, ValidationError>> {
    records.iter().map(|r| pitching_metrics(r, ctx)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::record::{InningsPitched, PlayerInfo};

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn value(m: Metric) -> f64 {
        m.value().unwrap_or_else(|| panic!("expected a defined metric, got {m:?}"))
    }

    /// AB=421, H=164, 2B=22, 3B=4, HR=41, BB=80, IBB=9, HBP=12, SF=3, K=105.
    fn reference_batter() -> BattingRecord {
        BattingRecord {
            player: PlayerInfo::new("Reference Batter", "ATL", Some(Position::RightField)),
            ab: 421,
            h: 164,
            doubles: 22,
            triples: 4,
            hr: 41,
            bb: 80,
            ibb: 9,
            hbp: 12,
            k: 105,
            sf: 3,
            pa: 516,
            ..Default::default()
        }
    }

    /// Gerrit Cole, 2023.
    fn cole() -> PitchingRecord {
        PitchingRecord {
            player: PlayerInfo::new("Gerrit Cole", "NYY", Some(Position::Pitcher)),
            ip: "222.2".parse().unwrap(),
            er: 65,
            h: 180,
            bb: 45,
            k: 222,
            hr: 28,
            hbp: 7,
            ..Default::default()
        }
    }

    // -- Batting formulas --

    #[test]
    fn reference_batter_rate_stats() {
        let ctx = LeagueContext::default();
        let m = batting_metrics(&reference_batter(), &ctx).unwrap();

        assert!(approx_eq(value(m.avg), 164.0 / 421.0, 1e-12));
        assert!(approx_eq(value(m.avg), 0.390, 0.001));
        assert!(approx_eq(value(m.obp), 256.0 / 516.0, 1e-12));
        assert!(approx_eq(value(m.slg), 317.0 / 421.0, 1e-12));
        assert!(approx_eq(value(m.ops), 256.0 / 516.0 + 317.0 / 421.0, 1e-12));
        assert!(approx_eq(value(m.babip), 123.0 / 278.0, 1e-12));
    }

    #[test]
    fn reference_batter_woba_and_wrc_plus() {
        let ctx = LeagueContext::default();
        let m = batting_metrics(&reference_batter(), &ctx).unwrap();

        // 0.690×71 + 0.722×12 + 0.888×97 + 1.271×22 + 1.616×4 + 2.101×41 = 264.357
        let expected_woba = 264.357 / 507.0;
        assert!(approx_eq(value(m.woba), expected_woba, 1e-9));

        let expected_wrc = 100.0 * ((expected_woba - 0.320) / 1.255 + 0.122) / 0.122;
        assert!(approx_eq(value(m.wrc_plus), expected_wrc, 1e-6));
        assert!(value(m.wrc_plus) > 160.0);
    }

    #[test]
    fn iso_is_exactly_slg_minus_avg() {
        let ctx = LeagueContext::default();
        let m = batting_metrics(&reference_batter(), &ctx).unwrap();
        assert_eq!(value(m.iso), value(m.slg) - value(m.avg));
    }

    #[test]
    fn ops_plus_against_league_baseline() {
        let ctx = LeagueContext::default();
        let m = batting_metrics(&reference_batter(), &ctx).unwrap();
        let expected = 100.0 * (value(m.obp) / 0.320 + value(m.slg) / 0.425 - 1.0);
        assert!(approx_eq(value(m.ops_plus), expected, 1e-9));
    }

    #[test]
    fn strikeout_and_walk_rates_use_plate_appearances() {
        let ctx = LeagueContext::default();
        let m = batting_metrics(&reference_batter(), &ctx).unwrap();
        assert!(approx_eq(value(m.k_pct), 105.0 / 516.0, 1e-12));
        assert!(approx_eq(value(m.bb_pct), 80.0 / 516.0, 1e-12));
    }

    #[test]
    fn league_average_woba_is_wrc_plus_100() {
        let ctx = LeagueContext::default();
        let wrc = wrc_plus(Metric::Value(ctx.woba), &ctx);
        assert!(approx_eq(value(wrc), 100.0, 1e-9));
        assert_eq!(wrc_plus(Metric::Undefined, &ctx), Metric::Undefined);
    }

    #[test]
    fn custom_woba_weights_are_used() {
        let ctx = LeagueContext {
            woba_weights: WobaWeights {
                ubb: 0.0,
                hbp: 0.0,
                single: 1.0,
                double: 1.0,
                triple: 1.0,
                home_run: 1.0,
            },
            ..LeagueContext::default()
        };
        let m = batting_metrics(&reference_batter(), &ctx).unwrap();
        assert!(approx_eq(value(m.woba), 164.0 / 507.0, 1e-12));
    }

    // -- Undefined results --

    #[test]
    fn zero_at_bats_leaves_rate_stats_undefined() {
        let ctx = LeagueContext::default();
        let rec = BattingRecord {
            player: PlayerInfo::new("Pinch Runner", "LAD", None),
            ..Default::default()
        };
        let m = batting_metrics(&rec, &ctx).unwrap();
        assert_eq!(m.avg, Metric::Undefined);
        assert_eq!(m.obp, Metric::Undefined);
        assert_eq!(m.slg, Metric::Undefined);
        assert_eq!(m.ops, Metric::Undefined);
        assert_eq!(m.iso, Metric::Undefined);
        assert_eq!(m.babip, Metric::Undefined);
        assert_eq!(m.woba, Metric::Undefined);
        assert_eq!(m.wrc_plus, Metric::Undefined);
        assert_eq!(m.k_pct, Metric::Undefined);
    }

    #[test]
    fn walk_only_line_has_obp_but_no_avg() {
        let ctx = LeagueContext::default();
        let rec = BattingRecord {
            bb: 3,
            pa: 3,
            ..Default::default()
        };
        let m = batting_metrics(&rec, &ctx).unwrap();
        assert_eq!(m.avg, Metric::Undefined);
        assert_eq!(m.obp, Metric::Value(1.0));
        assert_eq!(m.ops, Metric::Undefined);
        assert!(m.woba.is_defined());
    }

    #[test]
    fn empty_babip_denominator_is_undefined() {
        let ctx = LeagueContext::default();
        // AB − K − HR + SF = 4 − 3 − 1 + 0 = 0: every ball in play left the park.
        let rec = BattingRecord {
            ab: 4,
            h: 1,
            hr: 1,
            k: 3,
            pa: 4,
            ..Default::default()
        };
        let m = batting_metrics(&rec, &ctx).unwrap();
        assert_eq!(m.babip, Metric::Undefined);
        assert!(m.avg.is_defined());
    }

    #[test]
    fn invalid_batter_fails_before_calculation() {
        let ctx = LeagueContext::default();
        let rec = BattingRecord {
            h: 422,
            ..reference_batter()
        };
        assert!(matches!(
            batting_metrics(&rec, &ctx),
            Err(ValidationError::HitsExceedAtBats { .. })
        ));
    }

    #[test]
    fn batch_isolates_invalid_rows() {
        let ctx = LeagueContext::default();
        let records = vec![
            reference_batter(),
            BattingRecord {
                pa: 10,
                ..reference_batter()
            },
            reference_batter(),
        ];
        let results = batting_metrics_batch(&records, &ctx);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }

    #[test]
    fn avg_stays_within_unit_interval() {
        let ctx = LeagueContext::default();
        for (ab, h) in [(1, 0), (1, 1), (10, 3), (600, 200), (3, 3)] {
            let rec = BattingRecord {
                ab,
                h,
                pa: ab,
                ..Default::default()
            };
            let avg = value(batting_metrics(&rec, &ctx).unwrap().avg);
            assert!((0.0..=1.0).contains(&avg), "AVG {avg} out of range for {ab}/{h}");
        }
    }

    // -- WAR estimate --

    #[test]
    fn war_scales_with_playing_time_and_position() {
        let ctx = LeagueContext::default();
        let rec = reference_batter();
        let m = batting_metrics(&rec, &ctx).unwrap();
        let war = value(approximate_war(&rec, &m));

        let share = (421.0 + 80.0 + 3.0 + 12.0) / 700.0;
        let expected = (value(m.wrc_plus) - 100.0) / 100.0 * share * 20.0 - 7.5 * share + 2.0 * share;
        assert!(approx_eq(war, expected, 1e-9));
    }

    #[test]
    fn war_floors_at_zero_and_needs_wrc_plus() {
        let ctx = LeagueContext::default();
        let weak = BattingRecord {
            player: PlayerInfo::new("Weak DH", "OAK", Some(Position::DesignatedHitter)),
            ab: 400,
            h: 70,
            k: 150,
            pa: 420,
            bb: 20,
            ..Default::default()
        };
        let m = batting_metrics(&weak, &ctx).unwrap();
        assert_eq!(approximate_war(&weak, &m), Metric::Value(0.0));

        let empty = BattingRecord::default();
        let m = batting_metrics(&empty, &ctx).unwrap();
        assert_eq!(approximate_war(&empty, &m), Metric::Undefined);
    }

    // -- Pitching formulas --

    #[test]
    fn cole_pitching_line() {
        let ctx = LeagueContext::default();
        let m = pitching_metrics(&cole(), &ctx).unwrap();
        let ip = 668.0 / 3.0;

        assert!(approx_eq(value(m.era), 9.0 * 65.0 / ip, 1e-9));
        assert!(approx_eq(value(m.era), 2.63, 0.01));
        assert!(approx_eq(value(m.fip), 76.0 / ip + 3.10, 1e-9));
        assert!(approx_eq(value(m.whip), 225.0 / ip, 1e-9));
        assert!(approx_eq(value(m.whip), 1.01, 0.01));
        assert!(approx_eq(value(m.k_per_bb), 222.0 / 45.0, 1e-12));
        assert!(approx_eq(value(m.k_per_9), 9.0 * 222.0 / ip, 1e-9));
        // No batters faced in the record.
        assert_eq!(m.k_pct, Metric::Undefined);
    }

    #[test]
    fn zero_innings_is_undefined_not_a_fault() {
        let ctx = LeagueContext::default();
        let rec = PitchingRecord {
            ip: InningsPitched::default(),
            er: 3,
            h: 2,
            bb: 2,
            hr: 1,
            ..Default::default()
        };
        let m = pitching_metrics(&rec, &ctx).unwrap();
        assert_eq!(m.era, Metric::Undefined);
        assert_eq!(m.fip, Metric::Undefined);
        assert_eq!(m.whip, Metric::Undefined);
        assert_eq!(m.hr_per_9, Metric::Undefined);
    }

    #[test]
    fn strikeouts_without_walks_are_unbounded() {
        let ctx = LeagueContext::default();
        let rec = PitchingRecord {
            ip: InningsPitched::new(5, 0).unwrap(),
            k: 9,
            ..Default::default()
        };
        let m = pitching_metrics(&rec, &ctx).unwrap();
        assert_eq!(m.k_per_bb, Metric::Unbounded);

        let none = PitchingRecord {
            ip: InningsPitched::new(1, 0).unwrap(),
            ..Default::default()
        };
        let m = pitching_metrics(&none, &ctx).unwrap();
        assert_eq!(m.k_per_bb, Metric::Undefined);
        assert_eq!(m.era, Metric::Value(0.0));
    }

    #[test]
    fn pitcher_rates_with_batters_faced() {
        let ctx = LeagueContext::default();
        let rec = PitchingRecord { bf: 889, ..cole() };
        let m = pitching_metrics(&rec, &ctx).unwrap();
        assert!(approx_eq(value(m.k_pct), 222.0 / 889.0, 1e-12));
        assert!(approx_eq(value(m.bb_pct), 45.0 / 889.0, 1e-12));
    }

    #[test]
    fn fip_constant_comes_from_context() {
        let rec = cole();
        let base = value(fip(&rec, &LeagueContext::default()));
        let shifted = value(fip(
            &rec,
            &LeagueContext {
                fip_constant: 3.50,
                ..LeagueContext::default()
            },
        ));
        assert!(approx_eq(shifted - base, 0.40, 1e-9));
    }

    #[test]
    fn pitching_batch_isolates_invalid_rows() {
        let ctx = LeagueContext::default();
        let bad = PitchingRecord { hr: 500, ..cole() };
        let results = pitching_metrics_batch(&[cole(), bad], &ctx);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(ValidationError::HomeRunsExceedHits { .. })));
    }
}
