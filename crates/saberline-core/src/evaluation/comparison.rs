// Head-to-head comparison of two players of the same role, plus single-stat
// leaderboards.

use crate::config::{BattingWeights, PitchingWeights};
use crate::stats::derived::{
    BattingMetrics, BattingStat, MetricSet, PitchingMetrics, PitchingStat, StatKey,
};
use crate::stats::metric::Metric;
use serde::Serialize;
use std::cmp::Ordering;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Which side a single metric favours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Advantage {
    First,
    Second,
    Even,
    /// Undefined (or unbounded) for at least one player.
    Incomparable,
}

impl Advantage {
    /// The same verdict seen from the other side.
    pub fn swapped(self) -> Self {
        match self {
            Advantage::First => Advantage::Second,
            Advantage::Second => Advantage::First,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Winner {
    First,
    Second,
    Undecided,
}

impl Winner {
    pub fn swapped(self) -> Self {
        match self {
            Winner::First => Winner::Second,
            Winner::Second => Winner::First,
            Winner::Undecided => Winner::Undecided,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricComparison<K> {
    #[serde(skip)]
    pub stat: K,
    pub label: &'static str,
    pub first: Metric,
    pub second: Metric,
    pub advantage: Advantage,
    /// Absolute difference; `None` when incomparable.
    pub gap: Option<f64>,
    /// Weight in the overall verdict; zero for display-only rows.
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison<K> {
    pub rows: Vec<MetricComparison<K>>,
    pub first_score: f64,
    pub second_score: f64,
    pub winner: Winner,
    /// Scored metrics left out of the tally because one side is undefined.
    pub excluded: Vec<&'static str>,
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Verdict for one stat, respecting its better direction.
pub fn judge<K: StatKey>(key: K, first: Metric, second: Metric) -> (Advantage, Option<f64>) {
    let (Some(a), Some(b)) = (first.value(), second.value()) else {
        return (Advantage::Incomparable, None);
    };
    let gap = (a - b).abs();
    let advantage = match a.total_cmp(&b) {
        Ordering::Equal => Advantage::Even,
        Ordering::Greater if key.lower_is_better() => Advantage::Second,
        Ordering::Greater => Advantage::First,
        Ordering::Less if key.lower_is_better() => Advantage::First,
        Ordering::Less => Advantage::Second,
    };
    (advantage, Some(gap))
}

/// Compare two metric sets.
///
/// `selected` picks the rows to report, in order. `tally` lists the stats
/// that decide the winner and their weights; a stat may appear in either or
/// both. The side with the larger weighted sum of advantages wins, and equal
/// sums are undecided.
pub fn compare<M: MetricSet>(
    first: &M,
    second: &M,
    selected: &[M::Key],
    tally: &[(M::Key, f64)],
) -> Comparison<M::Key> {
    let weight_of = |key: M::Key| {
        tally
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    };

    let rows = selected
        .iter()
        .map(|&key| {
            let a = first.metric(key);
            let b = second.metric(key);
            let (advantage, gap) = judge(key, a, b);
            MetricComparison {
                stat: key,
                label: key.label(),
                first: a,
                second: b,
                advantage,
                gap,
                weight: weight_of(key),
            }
        })
        .collect();

    let mut first_score = 0.0;
    let mut second_score = 0.0;
    let mut excluded = Vec::new();
    for &(key, weight) in tally {
        match judge(key, first.metric(key), second.metric(key)).0 {
            Advantage::First => first_score += weight,
            Advantage::Second => second_score += weight,
            Advantage::Even => {}
            Advantage::Incomparable => excluded.push(key.label()),
        }
    }

    let winner = match first_score.total_cmp(&second_score) {
        Ordering::Greater => Winner::First,
        Ordering::Less => Winner::Second,
        Ordering::Equal => Winner::Undecided,
    };

    Comparison {
        rows,
        first_score,
        second_score,
        winner,
        excluded,
    }
}

/// wOBA, wRC+, ISO and BABIP with their configured weights.
pub fn canonical_batting(weights: &BattingWeights) -> [(BattingStat, f64); 4] {
    [
        (BattingStat::Woba, weights.woba),
        (BattingStat::WrcPlus, weights.wrc_plus),
        (BattingStat::Iso, weights.iso),
        (BattingStat::Babip, weights.babip),
    ]
}

/// ERA, FIP, WHIP and K/BB with their configured weights.
pub fn canonical_pitching(weights: &PitchingWeights) -> [(PitchingStat, f64); 4] {
    [
        (PitchingStat::Era, weights.era),
        (PitchingStat::Fip, weights.fip),
        (PitchingStat::Whip, weights.whip),
        (PitchingStat::KPerBb, weights.k_per_bb),
    ]
}

/// Every batting stat side by side, scored on the canonical four.
pub fn compare_batters(
    first: &BattingMetrics,
    second: &BattingMetrics,
    weights: &BattingWeights,
) -> Comparison<BattingStat> {
    compare(first, second, &BattingStat::ALL, &canonical_batting(weights))
}

/// Every pitching stat side by side, scored on the canonical four.
pub fn compare_pitchers(
    first: &PitchingMetrics,
    second: &PitchingMetrics,
    weights: &PitchingWeights,
) -> Comparison<PitchingStat> {
    compare(first, second, &PitchingStat::ALL, &canonical_pitching(weights))
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leader<'a> {
    pub rank: usize,
    pub name: &'a str,
    pub value: f64,
}

/// Rank players on one stat, best first. Players without a finite value for
/// the stat are left out. Ties share a rank and keep input order.
pub fn leaderboard<'a, M: MetricSet + 'a>(
    entries: impl IntoIterator<Item = (&'a str, &'a M)>,
    key: M::Key,
    limit: usize,
) -> Vec<Leader<'a>> {
    let mut ranked: Vec<(&'a str, f64)> = entries
        .into_iter()
        .filter_map(|(name, metrics)| metrics.metric(key).value().map(|v| (name, v)))
        .collect();

    if key.lower_is_better() {
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    } else {
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    }

    let mut leaders: Vec<Leader<'a>> = Vec::with_capacity(ranked.len().min(limit));
    for (i, (name, value)) in ranked.into_iter().take(limit).enumerate() {
        let rank = match leaders.last() {
            Some(prev) if prev.value == value => prev.rank,
            _ => i + 1,
        };
        leaders.push(Leader { rank, name, value });
    }
    leaders
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
