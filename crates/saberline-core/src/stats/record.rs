// Raw per-player counting stats and their validation.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A raw record broke one of the counting-stat invariants. Always surfaced to
/// the caller; nothing is clamped or corrected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{player}: {field} must be non-negative, got {value}")]
    Negative {
        player: String,
        field: &'static str,
        value: i64,
    },

    #[error("{player}: {field} value {value} is out of range")]
    OutOfRange {
        player: String,
        field: &'static str,
        value: i64,
    },

    #[error("{player}: hits ({hits}) exceed at-bats ({at_bats})")]
    HitsExceedAtBats {
        player: String,
        hits: u32,
        at_bats: u32,
    },

    #[error("{player}: strikeouts ({strikeouts}) plus hits ({hits}) exceed at-bats ({at_bats})")]
    StrikeoutsAndHitsExceedAtBats {
        player: String,
        strikeouts: u32,
        hits: u32,
        at_bats: u32,
    },

    #[error("{player}: extra-base hits ({extra_base_hits}) exceed hits ({hits})")]
    ExtraBaseHitsExceedHits {
        player: String,
        extra_base_hits: u32,
        hits: u32,
    },

    #[error("{player}: plate appearances ({plate_appearances}) are fewer than at-bats ({at_bats})")]
    PlateAppearancesBelowAtBats {
        player: String,
        plate_appearances: u32,
        at_bats: u32,
    },

    #[error("{player}: intentional walks ({intentional}) exceed walks ({walks})")]
    IntentionalWalksExceedWalks {
        player: String,
        intentional: u32,
        walks: u32,
    },

    #[error("{player}: home runs allowed ({home_runs}) exceed hits allowed ({hits})")]
    HomeRunsExceedHits {
        player: String,
        home_runs: u32,
        hits: u32,
    },

    #[error("{player}: batters faced ({batters_faced}) fewer than the {accounted} accounted for by H+BB+HBP+K")]
    BattersFacedTooLow {
        player: String,
        batters_faced: u32,
        accounted: u64,
    },

    #[error("{player}: invalid innings pitched `{value}`: {source}")]
    Innings {
        player: String,
        value: String,
        source: InningsError,
    },
}

/// Why an innings-pitched string could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InningsError {
    #[error("not a number")]
    NotANumber,
    #[error("innings cannot be negative")]
    Negative,
    #[error("fractional part must be .0, .1 or .2")]
    BadFraction,
    #[error("too many innings")]
    Overflow,
}

/// Convert a signed count read from an input table into a counting stat.
pub(crate) fn counting_stat(
    player: &str,
    field: &'static str,
    value: i64,
) -> Result<u32, ValidationError> {
    if value < 0 {
        return Err(ValidationError::Negative {
            player: player.to_string(),
            field,
            value,
        });
    }
    u32::try_from(value).map_err(|_| ValidationError::OutOfRange {
        player: player.to_string(),
        field,
        value,
    })
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Fielding positions as they appear in stat tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Position {
    Catcher,
    FirstBase,
    SecondBase,
    ThirdBase,
    ShortStop,
    LeftField,
    CenterField,
    RightField,
    Outfield,
    DesignatedHitter,
    Pitcher,
}

impl Position {
    /// Parse a position abbreviation ("C", "1B", "SS", "OF", ...).
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "C" => Some(Position::Catcher),
            "1B" => Some(Position::FirstBase),
            "2B" => Some(Position::SecondBase),
            "3B" => Some(Position::ThirdBase),
            "SS" => Some(Position::ShortStop),
            "LF" => Some(Position::LeftField),
            "CF" => Some(Position::CenterField),
            "RF" => Some(Position::RightField),
            "OF" => Some(Position::Outfield),
            "DH" => Some(Position::DesignatedHitter),
            "P" | "SP" | "RP" => Some(Position::Pitcher),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Catcher => "C",
            Position::FirstBase => "1B",
            Position::SecondBase => "2B",
            Position::ThirdBase => "3B",
            Position::ShortStop => "SS",
            Position::LeftField => "LF",
            Position::CenterField => "CF",
            Position::RightField => "RF",
            Position::Outfield => "OF",
            Position::DesignatedHitter => "DH",
            Position::Pitcher => "P",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

/// Who a record belongs to. For aggregated records the name is the team label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlayerInfo {
    pub name: String,
    pub team: String,
    pub position: Option<Position>,
}

impl PlayerInfo {
    pub fn new(name: impl Into<String>, team: impl Into<String>, position: Option<Position>) -> Self {
        Self {
            name: name.into(),
            team: team.into(),
            position,
        }
    }
}

// ---------------------------------------------------------------------------
// Innings pitched
// ---------------------------------------------------------------------------

/// Innings pitched, stored as recorded outs so thirds stay exact.
///
/// Baseball notation writes 186⅔ innings as `186.2`; the digit after the point
/// counts outs, not tenths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InningsPitched {
    outs: u32,
}

impl InningsPitched {
    pub fn from_outs(outs: u32) -> Self {
        Self { outs }
    }

    /// Whole innings plus 0, 1 or 2 extra outs.
    pub fn new(innings: u32, extra_outs: u32) -> Result<Self, InningsError> {
        if extra_outs > 2 {
            return Err(InningsError::BadFraction);
        }
        innings
            .checked_mul(3)
            .and_then(|outs| outs.checked_add(extra_outs))
            .map(Self::from_outs)
            .ok_or(InningsError::Overflow)
    }

    pub fn outs(&self) -> u32 {
        self.outs
    }

    /// Innings as a real number (186.2 notation → 186.667).
    pub fn as_innings(&self) -> f64 {
        f64::from(self.outs) / 3.0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.outs.checked_add(other.outs).map(Self::from_outs)
    }
}

impl FromStr for InningsPitched {
    type Err = InningsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with('-') {
            return Err(InningsError::Negative);
        }
        let (whole, frac) = match s.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (s, ""),
        };
        let innings: u32 = if whole.is_empty() && !frac.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| InningsError::NotANumber)?
        };
        let extra_outs = match frac {
            "" | "0" => 0,
            "1" => 1,
            "2" => 2,
            f if f.chars().all(|c| c.is_ascii_digit()) => return Err(InningsError::BadFraction),
            _ => return Err(InningsError::NotANumber),
        };
        Self::new(innings, extra_outs)
    }
}

impl fmt::Display for InningsPitched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.outs / 3, self.outs % 3)
    }
}

impl Serialize for InningsPitched {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Batting
// ---------------------------------------------------------------------------

/// One player-season of batting counting stats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BattingRecord {
    pub player: PlayerInfo,
    pub ab: u32,
    pub h: u32,
    pub doubles: u32,
    pub triples: u32,
    pub hr: u32,
    pub bb: u32,
    pub ibb: u32,
    pub hbp: u32,
    pub k: u32,
    pub sf: u32,
    pub sb: u32,
    pub cs: u32,
    pub pa: u32,
    pub r: u32,
    pub rbi: u32,
}

impl BattingRecord {
    /// Check the cross-field invariants: AB ≥ H ≥ 2B+3B+HR, AB ≥ H+K,
    /// PA ≥ AB, BB ≥ IBB.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let player = || self.player.name.clone();

        if self.h > self.ab {
            return Err(ValidationError::HitsExceedAtBats {
                player: player(),
                hits: self.h,
                at_bats: self.ab,
            });
        }
        if u64::from(self.h) + u64::from(self.k) > u64::from(self.ab) {
            return Err(ValidationError::StrikeoutsAndHitsExceedAtBats {
                player: player(),
                strikeouts: self.k,
                hits: self.h,
                at_bats: self.ab,
            });
        }
        let extra_base_hits = u64::from(self.doubles) + u64::from(self.triples) + u64::from(self.hr);
        if extra_base_hits > u64::from(self.h) {
            return Err(ValidationError::ExtraBaseHitsExceedHits {
                player: player(),
                extra_base_hits: u32::try_from(extra_base_hits).unwrap_or(u32::MAX),
                hits: self.h,
            });
        }
        if self.pa < self.ab {
            return Err(ValidationError::PlateAppearancesBelowAtBats {
                player: player(),
                plate_appearances: self.pa,
                at_bats: self.ab,
            });
        }
        if self.ibb > self.bb {
            return Err(ValidationError::IntentionalWalksExceedWalks {
                player: player(),
                intentional: self.ibb,
                walks: self.bb,
            });
        }
        Ok(())
    }

    /// Singles: H − 2B − 3B − HR. Only meaningful on a validated record.
    pub fn singles(&self) -> u32 {
        self.h
            .saturating_sub(self.doubles)
            .saturating_sub(self.triples)
            .saturating_sub(self.hr)
    }

    pub fn total_bases(&self) -> u64 {
        u64::from(self.singles())
            + 2 * u64::from(self.doubles)
            + 3 * u64::from(self.triples)
            + 4 * u64::from(self.hr)
    }

    pub fn unintentional_walks(&self) -> u32 {
        self.bb.saturating_sub(self.ibb)
    }
}

// ---------------------------------------------------------------------------
// Pitching
// ---------------------------------------------------------------------------

/// One player-season of pitching counting stats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PitchingRecord {
    pub player: PlayerInfo,
    pub ip: InningsPitched,
    pub er: u32,
    pub h: u32,
    pub bb: u32,
    pub k: u32,
    pub hr: u32,
    pub hbp: u32,
    /// Batters faced; zero when the source table doesn't carry it.
    pub bf: u32,
    pub w: u32,
    pub l: u32,
    pub g: u32,
    pub gs: u32,
    pub sv: u32,
}

impl PitchingRecord {
    /// Innings and earned runs are unsigned, so negatives are caught by the
    /// table loader. This checks HR ≤ H and, when batters faced is recorded,
    /// BF ≥ H + BB + HBP + K.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.hr > self.h {
            return Err(ValidationError::HomeRunsExceedHits {
                player: self.player.name.clone(),
                home_runs: self.hr,
                hits: self.h,
            });
        }
        if self.bf > 0 {
            let accounted = u64::from(self.h) + u64::from(self.bb) + u64::from(self.hbp) + u64::from(self.k);
            if u64::from(self.bf) < accounted {
                return Err(ValidationError::BattersFacedTooLow {
                    player: self.player.name.clone(),
                    batters_faced: self.bf,
                    accounted,
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
