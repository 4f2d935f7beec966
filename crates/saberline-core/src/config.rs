// Configuration loading and parsing (league.toml, analysis.toml).
//
// league.toml carries the season's normalization constants (the league
// context); analysis.toml carries comparison weights and input table paths.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueContext,
    pub comparison: ComparisonWeights,
    pub data_paths: DataPaths,
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level tables in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueSection,
    woba_weights: WobaWeights,
}

#[derive(Debug, Clone, Deserialize)]
struct LeagueSection {
    season: u16,
    woba: f64,
    woba_scale: f64,
    runs_per_pa: f64,
    fip_constant: f64,
    obp: f64,
    slg: f64,
    era: f64,
    babip: f64,
}

/// Season-level normalization constants. Read-only once loaded; every
/// calculation takes it by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct LeagueContext {
    pub season: u16,
    /// League-average wOBA.
    pub woba: f64,
    pub woba_scale: f64,
    pub runs_per_pa: f64,
    pub fip_constant: f64,
    /// League OBP and SLG, the OPS+ baseline.
    pub obp: f64,
    pub slg: f64,
    /// League ERA, the baseline pitcher ratings are described against.
    pub era: f64,
    pub babip: f64,
    pub woba_weights: WobaWeights,
}

/// Linear weights for wOBA. `ubb` applies to unintentional walks only.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct WobaWeights {
    pub ubb: f64,
    pub hbp: f64,
    pub single: f64,
    pub double: f64,
    pub triple: f64,
    pub home_run: f64,
}

impl Default for WobaWeights {
    fn default() -> Self {
        Self {
            ubb: 0.690,
            hbp: 0.722,
            single: 0.888,
            double: 1.271,
            triple: 1.616,
            home_run: 2.101,
        }
    }
}

/// 2023 MLB constants.
impl Default for LeagueContext {
    fn default() -> Self {
        Self {
            season: 2023,
            woba: 0.320,
            woba_scale: 1.255,
            runs_per_pa: 0.122,
            fip_constant: 3.10,
            obp: 0.320,
            slg: 0.425,
            era: 4.33,
            babip: 0.297,
            woba_weights: WobaWeights::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// analysis.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct AnalysisFile {
    comparison: ComparisonWeights,
    data_paths: DataPaths,
}

/// Per-metric weights used when the comparison engine tallies advantages.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ComparisonWeights {
    pub batting: BattingWeights,
    pub pitching: PitchingWeights,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BattingWeights {
    pub woba: f64,
    pub wrc_plus: f64,
    pub iso: f64,
    pub babip: f64,
}

impl Default for BattingWeights {
    fn default() -> Self {
        Self {
            woba: 1.0,
            wrc_plus: 1.0,
            iso: 1.0,
            babip: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PitchingWeights {
    pub era: f64,
    pub fip: f64,
    pub whip: f64,
    pub k_per_bb: f64,
}

impl Default for PitchingWeights {
    fn default() -> Self {
        Self {
            era: 1.0,
            fip: 1.0,
            whip: 1.0,
            k_per_bb: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataPaths {
    pub batting: String,
    pub pitching: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// `config/analysis.toml` relative to `base_dir`.
///
/// Does not copy defaults; `load_config()` does.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    let league_path = config_dir.join("league.toml");
    let league = parse_league(&read_file(&league_path)?, &league_path)?;

    let analysis_path = config_dir.join("analysis.toml");
    let analysis_text = read_file(&analysis_path)?;
    let analysis: AnalysisFile =
        toml::from_str(&analysis_text).map_err(|e| ConfigError::ParseError {
            path: analysis_path.clone(),
            source: e,
        })?;

    let config = Config {
        league,
        comparison: analysis.comparison,
        data_paths: analysis.data_paths,
    };

    validate(&config)?;
    debug!(season = config.league.season, "configuration validated");
    Ok(config)
}

/// Read a league context from a standalone league.toml. Used for reloading a
/// different season without touching the rest of the config.
pub fn load_league_context(path: &Path) -> Result<LeagueContext, ConfigError> {
    let league = parse_league(&read_file(path)?, path)?;
    validate_league(&league)?;
    Ok(league)
}

fn parse_league(text: &str, path: &Path) -> Result<LeagueContext, ConfigError> {
    let file: LeagueFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let s = file.league;
    Ok(LeagueContext {
        season: s.season,
        woba: s.woba,
        woba_scale: s.woba_scale,
        runs_per_pa: s.runs_per_pa,
        fip_constant: s.fip_constant,
        obp: s.obp,
        slg: s.slg,
        era: s.era,
        babip: s.babip,
        woba_weights: file.woba_weights,
    })
}

/// Files read from `config/`, each seeded from `defaults/` when missing.
pub const CONFIG_FILES: [&str; 2] = ["league.toml", "analysis.toml"];

/// Copy each missing entry of [`CONFIG_FILES`] from `defaults/` into
/// `config/`. Existing files are never overwritten. Returns the copied paths.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        if config_dir.is_dir() {
            return Ok(Vec::new());
        }
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no defaults/ or config/ directory in {}",
                base_dir.display()
            ),
        });
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create {}: {e}", config_dir.display()),
    })?;

    let mut copied = Vec::new();
    for name in CONFIG_FILES {
        let source = defaults_dir.join(name);
        let target = config_dir.join(name);
        if source.is_file() && copy_if_absent(&source, &target)? {
            info!("copied default config to {}", target.display());
            copied.push(target);
        }
    }
    Ok(copied)
}

/// `create_new` makes the existence check and the create one step.
fn copy_if_absent(source: &Path, target: &Path) -> Result<bool, ConfigError> {
    use std::io::Write;

    let copy_error = |what: &str, path: &Path, e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to {what} {}: {e}", path.display()),
    };

    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
    {
        Ok(dest) => dest,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(copy_error("create", target, e)),
    };
    let content = std::fs::read(source).map_err(|e| copy_error("read", source, e))?;
    dest.write_all(&content)
        .map_err(|e| copy_error("write", target, e))?;
    Ok(true)
}

/// Copy any missing defaults into `base_dir/config`, then load.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Shared context
// ---------------------------------------------------------------------------

/// The active league context. Readers take a snapshot `Arc`; a season change
/// swaps in a whole new context, so a calculation never observes a mix of
/// old and new constants.
#[derive(Debug)]
pub struct ContextHandle {
    current: RwLock<Arc<LeagueContext>>,
}

impl ContextHandle {
    pub fn new(context: LeagueContext) -> Self {
        Self {
            current: RwLock::new(Arc::new(context)),
        }
    }

    /// Snapshot of the context in force right now.
    pub fn current(&self) -> Arc<LeagueContext> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    /// Replace the context. Existing snapshots are unaffected.
    pub fn replace(&self, context: LeagueContext) -> Arc<LeagueContext> {
        let next = Arc::new(context);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        info!(season = next.season, "league context replaced");
        std::mem::replace(&mut *guard, Arc::clone(&next))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_league(&config.league)?;

    let b = &config.comparison.batting;
    let p = &config.comparison.pitching;
    let weight_fields: &[(&str, f64)] = &[
        ("comparison.batting.woba", b.woba),
        ("comparison.batting.wrc_plus", b.wrc_plus),
        ("comparison.batting.iso", b.iso),
        ("comparison.batting.babip", b.babip),
        ("comparison.pitching.era", p.era),
        ("comparison.pitching.fip", p.fip),
        ("comparison.pitching.whip", p.whip),
        ("comparison.pitching.k_per_bb", p.k_per_bb),
    ];
    for (name, val) in weight_fields {
        if !val.is_finite() || *val < 0.0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be a finite value >= 0, got {val}"),
            });
        }
    }

    Ok(())
}

fn validate_league(league: &LeagueContext) -> Result<(), ConfigError> {
    // Denominators in wRC+, OPS+ and the rating rationale.
    let positive_fields: &[(&str, f64)] = &[
        ("league.woba_scale", league.woba_scale),
        ("league.runs_per_pa", league.runs_per_pa),
        ("league.obp", league.obp),
        ("league.slg", league.slg),
        ("league.era", league.era),
    ];
    for (name, val) in positive_fields {
        if !val.is_finite() || *val <= 0.0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be > 0, got {val}"),
            });
        }
    }

    let w = &league.woba_weights;
    let finite_fields: &[(&str, f64)] = &[
        ("league.woba", league.woba),
        ("league.fip_constant", league.fip_constant),
        ("league.babip", league.babip),
        ("woba_weights.ubb", w.ubb),
        ("woba_weights.hbp", w.hbp),
        ("woba_weights.single", w.single),
        ("woba_weights.double", w.double),
        ("woba_weights.triple", w.triple),
        ("woba_weights.home_run", w.home_run),
    ];
    for (name, val) in finite_fields {
        if !val.is_finite() {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be finite, got {val}"),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
