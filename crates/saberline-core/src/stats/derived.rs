// Derived metric sets for batters and pitchers, keyed by stat name.

use crate::stats::metric::Metric;
use serde::Serialize;
use std::fmt;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// A named stat within one role's metric set.
pub trait StatKey: Copy + Eq + fmt::Debug + 'static {
    /// Display label, e.g. "wRC+".
    fn label(self) -> &'static str;

    /// ERA-style stats where the smaller number is the better one.
    fn lower_is_better(self) -> bool;
}

/// A complete set of derived metrics for one role, addressable by key.
pub trait MetricSet {
    type Key: StatKey;

    fn metric(&self, key: Self::Key) -> Metric;
}

/// Batting stats in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BattingStat {
    Avg,
    Obp,
    Slg,
    Ops,
    Iso,
    Babip,
    Woba,
    WrcPlus,
    OpsPlus,
    KPct,
    BbPct,
}

impl BattingStat {
    pub const ALL: [BattingStat; 11] = [
        BattingStat::Avg,
        BattingStat::Obp,
        BattingStat::Slg,
        BattingStat::Ops,
        BattingStat::Iso,
        BattingStat::Babip,
        BattingStat::Woba,
        BattingStat::WrcPlus,
        BattingStat::OpsPlus,
        BattingStat::KPct,
        BattingStat::BbPct,
    ];

    /// Parse a label case-insensitively ("woba", "wRC+", "bb%").
    pub fn from_label(s: &str) -> Option<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|stat| stat.label().eq_ignore_ascii_case(wanted))
    }
}

impl StatKey for BattingStat {
    fn label(self) -> &'static str {
        match self {
            BattingStat::Avg => "AVG",
            BattingStat::Obp => "OBP",
            BattingStat::Slg => "SLG",
            BattingStat::Ops => "OPS",
            BattingStat::Iso => "ISO",
            BattingStat::Babip => "BABIP",
            BattingStat::Woba => "wOBA",
            BattingStat::WrcPlus => "wRC+",
            BattingStat::OpsPlus => "OPS+",
            BattingStat::KPct => "K%",
            BattingStat::BbPct => "BB%",
        }
    }

    fn lower_is_better(self) -> bool {
        matches!(self, BattingStat::KPct)
    }
}

/// Pitching stats in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PitchingStat {
    Era,
    Fip,
    Whip,
    KPerBb,
    KPer9,
    BbPer9,
    HrPer9,
    KPct,
    BbPct,
}

impl PitchingStat {
    pub const ALL: [PitchingStat; 9] = [
        PitchingStat::Era,
        PitchingStat::Fip,
        PitchingStat::Whip,
        PitchingStat::KPerBb,
        PitchingStat::KPer9,
        PitchingStat::BbPer9,
        PitchingStat::HrPer9,
        PitchingStat::KPct,
        PitchingStat::BbPct,
    ];

    pub fn from_label(s: &str) -> Option<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|stat| stat.label().eq_ignore_ascii_case(wanted))
    }
}

impl StatKey for PitchingStat {
    fn label(self) -> &'static str {
        match self {
            PitchingStat::Era => "ERA",
            PitchingStat::Fip => "FIP",
            PitchingStat::Whip => "WHIP",
            PitchingStat::KPerBb => "K/BB",
            PitchingStat::KPer9 => "K/9",
            PitchingStat::BbPer9 => "BB/9",
            PitchingStat::HrPer9 => "HR/9",
            PitchingStat::KPct => "K%",
            PitchingStat::BbPct => "BB%",
        }
    }

    fn lower_is_better(self) -> bool {
        matches!(
            self,
            PitchingStat::Era
                | PitchingStat::Fip
                | PitchingStat::Whip
                | PitchingStat::BbPer9
                | PitchingStat::HrPer9
                | PitchingStat::BbPct
        )
    }
}

// ---------------------------------------------------------------------------
// Metric sets
// ---------------------------------------------------------------------------

/// Everything the calculator derives from one batting record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BattingMetrics {
    #[serde(rename = "AVG")]
    pub avg: Metric,
    #[serde(rename = "OBP")]
    pub obp: Metric,
    #[serde(rename = "SLG")]
    pub slg: Metric,
    #[serde(rename = "OPS")]
    pub ops: Metric,
    #[serde(rename = "ISO")]
    pub iso: Metric,
    #[serde(rename = "BABIP")]
    pub babip: Metric,
    #[serde(rename = "wOBA")]
    pub woba: Metric,
    #[serde(rename = "wRC+")]
    pub wrc_plus: Metric,
    #[serde(rename = "OPS+")]
    pub ops_plus: Metric,
    #[serde(rename = "K%")]
    pub k_pct: Metric,
    #[serde(rename = "BB%")]
    pub bb_pct: Metric,
}

impl MetricSet for BattingMetrics {
    type Key = BattingStat;

    fn metric(&self, key: BattingStat) -> Metric {
        match key {
            BattingStat::Avg => self.avg,
            BattingStat::Obp => self.obp,
            BattingStat::Slg => self.slg,
            BattingStat::Ops => self.ops,
            BattingStat::Iso => self.iso,
            BattingStat::Babip => self.babip,
            BattingStat::Woba => self.woba,
            BattingStat::WrcPlus => self.wrc_plus,
            BattingStat::OpsPlus => self.ops_plus,
            BattingStat::KPct => self.k_pct,
            BattingStat::BbPct => self.bb_pct,
        }
    }
}

/// Everything the calculator derives from one pitching record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PitchingMetrics {
    #[serde(rename = "ERA")]
    pub era: Metric,
    #[serde(rename = "FIP")]
    pub fip: Metric,
    #[serde(rename = "WHIP")]
    pub whip: Metric,
    #[serde(rename = "K/BB")]
    pub k_per_bb: Metric,
    #[serde(rename = "K/9")]
    pub k_per_9: Metric,
    #[serde(rename = "BB/9")]
    pub bb_per_9: Metric,
    #[serde(rename = "HR/9")]
    pub hr_per_9: Metric,
    #[serde(rename = "K%")]
    pub k_pct: Metric,
    #[serde(rename = "BB%")]
    pub bb_pct: Metric,
}

impl MetricSet for PitchingMetrics {
    type Key = PitchingStat;

    fn metric(&self, key: PitchingStat) -> Metric {
        match key {
            PitchingStat::Era => self.era,
            PitchingStat::Fip => self.fip,
            PitchingStat::Whip => self.whip,
            PitchingStat::KPerBb => self.k_per_bb,
            PitchingStat::KPer9 => self.k_per_9,
            PitchingStat::BbPer9 => self.bb_per_9,
            PitchingStat::HrPer9 => self.hr_per_9,
            PitchingStat::KPct => self.k_pct,
            PitchingStat::BbPct => self.bb_pct,
        }
    }
}
