// Rating engine: maps derived metrics onto a performance tier with a short
// written rationale.
//
// Batters are rated on wRC+, pitchers on FIP. Both use ordered threshold
// tables, so retuning a band is a data change.

use crate::config::LeagueContext;
use crate::stats::derived::{BattingMetrics, PitchingMetrics};
use crate::stats::metric::Metric;
use serde::Serialize;
use std::fmt;

// ---------------------------------------------------------------------------
// Tiers and tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    MvpCandidate,
    AllStar,
    AboveAverage,
    Average,
    BelowAverage,
    InsufficientData,
}

impl Tier {
    pub fn display_str(&self) -> &'static str {
        match self {
            Tier::MvpCandidate => "MVP candidate",
            Tier::AllStar => "All-Star",
            Tier::AboveAverage => "Above average",
            Tier::Average => "Average",
            Tier::BelowAverage => "Below average",
            Tier::InsufficientData => "Insufficient data",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

/// wRC+ lower bounds, best tier first.
pub const BATTING_TIERS: &[(f64, Tier)] = &[
    (160.0, Tier::MvpCandidate),
    (130.0, Tier::AllStar),
    (110.0, Tier::AboveAverage),
    (90.0, Tier::Average),
];

/// FIP upper bounds, best tier first.
pub const PITCHING_TIERS: &[(f64, Tier)] = &[
    (2.75, Tier::MvpCandidate),
    (3.25, Tier::AllStar),
    (3.75, Tier::AboveAverage),
    (4.25, Tier::Average),
];

/// Ordered `(bound, tier)` bands plus the tier for values past the last band.
#[derive(Debug, Clone, Copy)]
pub struct RatingTable<'a> {
    bands: &'a [(f64, Tier)],
    higher_is_better: bool,
    floor: Tier,
}

impl<'a> RatingTable<'a> {
    /// Bands are read as lower bounds (`value >= bound`) when
    /// `higher_is_better`, upper bounds (`value <= bound`) otherwise, and must
    /// be listed best tier first.
    pub fn new(bands: &'a [(f64, Tier)], higher_is_better: bool, floor: Tier) -> Self {
        Self {
            bands,
            higher_is_better,
            floor,
        }
    }

    /// First band the value clears; undefined values are insufficient data.
    pub fn classify(&self, metric: Metric) -> Tier {
        let Some(value) = metric.value() else {
            return Tier::InsufficientData;
        };
        self.bands
            .iter()
            .find(|(bound, _)| {
                if self.higher_is_better {
                    value >= *bound
                } else {
                    value <= *bound
                }
            })
            .map(|(_, tier)| *tier)
            .unwrap_or(self.floor)
    }
}

impl RatingTable<'static> {
    pub fn batting() -> Self {
        Self::new(BATTING_TIERS, true, Tier::BelowAverage)
    }

    pub fn pitching() -> Self {
        Self::new(PITCHING_TIERS, false, Tier::BelowAverage)
    }
}

// ---------------------------------------------------------------------------
// Ratings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rating {
    pub tier: Tier,
    pub rationale: String,
}

/// ISO at or above which power is called elite, then above average.
const ELITE_ISO: f64 = 0.250;
const PLUS_ISO: f64 = 0.200;
const WEAK_ISO: f64 = 0.120;

/// How far BABIP can sit from the league norm before it reads as luck.
const BABIP_LUCK_MARGIN: f64 = 0.040;

/// ERA and FIP closer than this are treated as agreeing.
const ERA_FIP_MARGIN: f64 = 0.25;

pub fn rate_batter(metrics: &BattingMetrics, ctx: &LeagueContext) -> Rating {
    rate_batter_with(&RatingTable::batting(), metrics, ctx)
}

/// Rate a batter against a custom wRC+ table.
pub fn rate_batter_with(
    table: &RatingTable<'_>,
    metrics: &BattingMetrics,
    ctx: &LeagueContext,
) -> Rating {
    let tier = table.classify(metrics.wrc_plus);
    let Some(wrc) = metrics.wrc_plus.value() else {
        return Rating {
            tier,
            rationale: "wRC+ is undefined: not enough plate appearances to rate.".to_string(),
        };
    };

    let shown = wrc.round();
    let mut parts = vec![format!(
        "wRC+ of {shown:.0} is {}.",
        deviation_phrase(shown - 100.0, "below", "league average")
    )];

    if let Some(iso) = metrics.iso.value() {
        let power = if iso >= ELITE_ISO {
            "elite power"
        } else if iso >= PLUS_ISO {
            "above-average power"
        } else if iso < WEAK_ISO {
            "limited power"
        } else {
            "average power"
        };
        parts.push(format!("ISO of {} shows {power}.", Metric::Value(iso).format(3, true)));
    }

    if let Some(babip) = metrics.babip.value() {
        let norm = Metric::Value(ctx.babip).format(3, true);
        let shown_babip = Metric::Value(babip).format(3, true);
        let note = if babip - ctx.babip >= BABIP_LUCK_MARGIN {
            format!("BABIP of {shown_babip} is well above the {norm} league norm; some regression is likely.")
        } else if ctx.babip - babip >= BABIP_LUCK_MARGIN {
            format!("BABIP of {shown_babip} is well below the {norm} league norm; expect improvement.")
        } else {
            format!("BABIP of {shown_babip} is in line with the {norm} league norm.")
        };
        parts.push(note);
    }

    Rating {
        tier,
        rationale: parts.join(" "),
    }
}

pub fn rate_pitcher(metrics: &PitchingMetrics, ctx: &LeagueContext) -> Rating {
    rate_pitcher_with(&RatingTable::pitching(), metrics, ctx)
}

/// Rate a pitcher against a custom FIP table.
pub fn rate_pitcher_with(
    table: &RatingTable<'_>,
    metrics: &PitchingMetrics,
    ctx: &LeagueContext,
) -> Rating {
    let tier = table.classify(metrics.fip);
    let Some(fip) = metrics.fip.value() else {
        return Rating {
            tier,
            rationale: "FIP is undefined: no innings pitched to rate.".to_string(),
        };
    };

    // Lower is better, so the deviation is measured from the league side.
    let pct = ((ctx.era - fip) / ctx.era * 100.0).round();
    let mut parts = vec![format!(
        "FIP of {fip:.2} is {}.",
        deviation_phrase(pct, "worse than", &format!("the league ERA of {:.2}", ctx.era))
    )];

    if let Some(era) = metrics.era.value() {
        let note = if fip < era - ERA_FIP_MARGIN {
            format!("FIP below the {era:.2} ERA suggests bad luck; expect improvement.")
        } else if fip > era + ERA_FIP_MARGIN {
            format!("FIP above the {era:.2} ERA suggests good luck; expect regression.")
        } else {
            format!("ERA of {era:.2} and FIP align; the performance looks sustainable.")
        };
        parts.push(note);
    }

    Rating {
        tier,
        rationale: parts.join(" "),
    }
}

/// "69% better than league average", "12% below ...", "exactly ...".
/// `behind` words the negative side, since a worse FIP is a higher number.
fn deviation_phrase(pct: f64, behind: &str, baseline: &str) -> String {
    let pct = pct.round();
    if pct > 0.0 {
        format!("{pct:.0}% better than {baseline}")
    } else if pct < 0.0 {
        format!("{:.0}% {behind} {baseline}", -pct)
    } else {
        format!("exactly {baseline}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
