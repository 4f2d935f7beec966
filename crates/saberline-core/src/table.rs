// Stat table loading.
//
// Reads one-row-per-player-season CSV tables into validated records. Rows
// that fail to parse or validate are set aside as rejected rows; they never
// stop the rest of the table from loading.

use crate::config::DataPaths;
use crate::stats::record::{
    counting_stat, BattingRecord, InningsPitched, PitchingRecord, PlayerInfo, Position,
    ValidationError,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A row that was skipped, with enough context to find it in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    /// 1-based line number in the source file.
    pub line: u64,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTable<T> {
    pub records: Vec<T>,
    pub rejected: Vec<RejectedRow>,
}

impl<T> Default for LoadedTable<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

/// Both tables for one season.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonTables {
    pub batting: LoadedTable<BattingRecord>,
    pub pitching: LoadedTable<PitchingRecord>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

/// Batting row as it appears in the file. Counts are signed so negative
/// entries reach validation instead of failing as parse errors. Extra
/// columns are ignored.
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawBattingRow {
    Name: String,
    #[serde(default)]
    Team: String,
    #[serde(default)]
    Pos: String,
    AB: i64,
    H: i64,
    #[serde(rename = "2B")]
    Doubles: i64,
    #[serde(rename = "3B")]
    Triples: i64,
    HR: i64,
    BB: i64,
    #[serde(default)]
    IBB: i64,
    #[serde(default)]
    HBP: i64,
    #[serde(alias = "SO")]
    K: i64,
    #[serde(default)]
    SF: i64,
    #[serde(default)]
    SB: i64,
    #[serde(default)]
    CS: i64,
    /// Derived from AB + BB + HBP + SF when the column is absent or blank.
    #[serde(default)]
    PA: Option<i64>,
    #[serde(default)]
    R: i64,
    #[serde(default)]
    RBI: i64,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawPitchingRow {
    Name: String,
    #[serde(default)]
    Team: String,
    /// Baseball notation: "186.2" is 186 innings and two outs.
    IP: String,
    ER: i64,
    H: i64,
    BB: i64,
    #[serde(alias = "SO")]
    K: i64,
    HR: i64,
    #[serde(default)]
    HBP: i64,
    #[serde(default)]
    BF: i64,
    #[serde(default)]
    W: i64,
    #[serde(default)]
    L: i64,
    #[serde(default)]
    G: i64,
    #[serde(default)]
    GS: i64,
    #[serde(default)]
    SV: i64,
}

// ---------------------------------------------------------------------------
// Row conversion
// ---------------------------------------------------------------------------

fn player_info(name: &str, team: &str, pos: &str) -> PlayerInfo {
    let pos = pos.trim();
    let position = if pos.is_empty() {
        None
    } else {
        let parsed = Position::from_str_pos(pos);
        if parsed.is_none() {
            warn!("unknown position '{}' for '{}', leaving it unset", pos, name);
        }
        parsed
    };
    PlayerInfo::new(name, team.trim(), position)
}

impl RawBattingRow {
    fn into_record(self) -> Result<BattingRecord, ValidationError> {
        let name = self.Name.trim().to_string();
        let n = name.as_str();
        let pa = match self.PA {
            Some(pa) => pa,
            None => self.AB.saturating_add(self.BB).saturating_add(self.HBP).saturating_add(self.SF),
        };
        let record = BattingRecord {
            ab: counting_stat(n, "AB", self.AB)?,
            h: counting_stat(n, "H", self.H)?,
            doubles: counting_stat(n, "2B", self.Doubles)?,
            triples: counting_stat(n, "3B", self.Triples)?,
            hr: counting_stat(n, "HR", self.HR)?,
            bb: counting_stat(n, "BB", self.BB)?,
            ibb: counting_stat(n, "IBB", self.IBB)?,
            hbp: counting_stat(n, "HBP", self.HBP)?,
            k: counting_stat(n, "K", self.K)?,
            sf: counting_stat(n, "SF", self.SF)?,
            sb: counting_stat(n, "SB", self.SB)?,
            cs: counting_stat(n, "CS", self.CS)?,
            pa: counting_stat(n, "PA", pa)?,
            r: counting_stat(n, "R", self.R)?,
            rbi: counting_stat(n, "RBI", self.RBI)?,
            player: player_info(n, &self.Team, &self.Pos),
        };
        record.validate()?;
        Ok(record)
    }
}

impl RawPitchingRow {
    fn into_record(self) -> Result<PitchingRecord, ValidationError> {
        let name = self.Name.trim().to_string();
        let n = name.as_str();
        let ip: InningsPitched = self.IP.parse().map_err(|source| ValidationError::Innings {
            player: name.clone(),
            value: self.IP.trim().to_string(),
            source,
        })?;
        let record = PitchingRecord {
            ip,
            er: counting_stat(n, "ER", self.ER)?,
            h: counting_stat(n, "H", self.H)?,
            bb: counting_stat(n, "BB", self.BB)?,
            k: counting_stat(n, "K", self.K)?,
            hr: counting_stat(n, "HR", self.HR)?,
            hbp: counting_stat(n, "HBP", self.HBP)?,
            bf: counting_stat(n, "BF", self.BF)?,
            w: counting_stat(n, "W", self.W)?,
            l: counting_stat(n, "L", self.L)?,
            g: counting_stat(n, "G", self.G)?,
            gs: counting_stat(n, "GS", self.GS)?,
            sv: counting_stat(n, "SV", self.SV)?,
            player: PlayerInfo::new(n, self.Team.trim(), Some(Position::Pitcher)),
        };
        record.validate()?;
        Ok(record)
    }
}

// ---------------------------------------------------------------------------
// Reader-based loaders
// ---------------------------------------------------------------------------

/// Shared row loop: parse each row into `Raw`, convert it, and collect the
/// failures. Only an unreadable header is fatal.
fn load_table<R, Raw, T>(
    rdr: R,
    kind: &str,
    convert: impl Fn(Raw) -> Result<T, ValidationError>,
) -> Result<LoadedTable<T>, csv::Error>
where
    R: Read,
    Raw: for<'de> Deserialize<'de>,
{
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let headers = reader.headers()?.clone();
    let name_col = headers.iter().position(|h| h == "Name");

    let mut table = LoadedTable::default();
    let mut seen = HashSet::new();
    for result in reader.records() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                warn!("skipping malformed {} row at line {}: {}", kind, line, e);
                table.rejected.push(RejectedRow {
                    line,
                    name: String::new(),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let name = name_col
            .and_then(|i| row.get(i))
            .unwrap_or_default()
            .to_string();

        let converted = row
            .deserialize::<Raw>(Some(&headers))
            .map_err(|e| e.to_string())
            .and_then(|raw| convert(raw).map_err(|e| e.to_string()));
        match converted {
            Ok(record) => {
                if !seen.insert(name.clone()) {
                    warn!("duplicate {} entry for '{}' at line {}", kind, name, line);
                }
                table.records.push(record);
            }
            Err(reason) => {
                warn!("skipping {} row '{}' at line {}: {}", kind, name, line, reason);
                table.rejected.push(RejectedRow { line, name, reason });
            }
        }
    }
    Ok(table)
}

pub fn load_batting_from_reader<R: Read>(rdr: R) -> Result<LoadedTable<BattingRecord>, csv::Error> {
    load_table(rdr, "batting", RawBattingRow::into_record)
}

pub fn load_pitching_from_reader<R: Read>(
    rdr: R,
) -> Result<LoadedTable<PitchingRecord>, csv::Error> {
    load_table(rdr, "pitching", RawPitchingRow::into_record)
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

/// Load a batting table from a CSV file.
pub fn load_batting(path: &Path) -> Result<LoadedTable<BattingRecord>, TableError> {
    let file = std::fs::File::open(path).map_err(|e| TableError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let table = load_batting_from_reader(file).map_err(|e| TableError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;
    info!(
        "loaded {} batters from {} ({} rejected)",
        table.records.len(),
        path.display(),
        table.rejected.len()
    );
    Ok(table)
}

/// Load a pitching table from a CSV file.
pub fn load_pitching(path: &Path) -> Result<LoadedTable<PitchingRecord>, TableError> {
    let file = std::fs::File::open(path).map_err(|e| TableError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let table = load_pitching_from_reader(file).map_err(|e| TableError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;
    info!(
        "loaded {} pitchers from {} ({} rejected)",
        table.records.len(),
        path.display(),
        table.rejected.len()
    );
    Ok(table)
}

/// Load both tables, resolving relative paths against `base_dir`.
pub fn load_season(base_dir: &Path, paths: &DataPaths) -> Result<SeasonTables, TableError> {
    let batting = load_batting(&base_dir.join(&paths.batting))?;
    let pitching = load_pitching(&base_dir.join(&paths.pitching))?;
    Ok(SeasonTables { batting, pitching })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const BATTING_HEADER: &str = "Name,Team,Pos,AB,H,2B,3B,HR,BB,IBB,HBP,K,SF,SB,CS,PA,R,RBI\n";
    const PITCHING_HEADER: &str = "Name,Team,IP,ER,H,BB,K,HR,HBP,BF,W,L,G,GS,SV\n";

    // -- Batting --

    #[test]
    fn batting_rows_load() {
        let csv = format!(
            "{BATTING_HEADER}\
             Mookie Betts,LAD,RF,584,179,40,1,39,96,4,8,107,5,14,3,693,126,107\n\
             Freddie Freeman,LAD,1B,637,211,59,2,29,72,7,16,121,5,23,1,730,131,102\n"
        );
        let table = load_batting_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.records.len(), 2);
        assert!(table.rejected.is_empty());

        let betts = &table.records[0];
        assert_eq!(betts.player.name, "Mookie Betts");
        assert_eq!(betts.player.team, "LAD");
        assert_eq!(betts.player.position, Some(Position::RightField));
        assert_eq!(betts.doubles, 40);
        assert_eq!(betts.ibb, 4);
        assert_eq!(betts.pa, 693);
    }

    #[test]
    fn so_alias_and_missing_optional_columns() {
        let csv = "Name,AB,H,2B,3B,HR,BB,SO\nRookie,100,25,5,1,3,10,30\n";
        let table = load_batting_from_reader(csv.as_bytes()).unwrap();
        let rookie = &table.records[0];
        assert_eq!(rookie.k, 30);
        assert_eq!(rookie.hbp, 0);
        assert_eq!(rookie.player.team, "");
        assert_eq!(rookie.player.position, None);
        // PA falls back to AB + BB + HBP + SF
        assert_eq!(rookie.pa, 110);
    }

    #[test]
    fn extra_columns_are_ignored() {
        let csv = "Name,AB,H,2B,3B,HR,BB,K,WAR,Notes\nA,100,30,5,0,4,8,20,1.5,hot\n";
        let table = load_batting_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].h, 30);
    }

    #[test]
    fn invalid_rows_are_rejected_not_fatal() {
        let csv = format!(
            "{BATTING_HEADER}\
             Good,SEA,CF,500,140,30,3,20,50,2,5,120,4,20,5,559,80,70\n\
             TooManyHits,SEA,SS,100,120,10,0,5,10,0,0,20,0,0,0,110,10,10\n\
             Negative,SEA,C,100,-5,0,0,0,10,0,0,20,0,0,0,110,10,10\n\
             Garbage,SEA,LF,abc,30,5,0,4,8,0,0,20,0,0,0,108,10,10\n\
             Fine,SEA,DH,300,80,15,0,12,30,1,2,70,2,1,0,334,40,45\n"
        );
        let table = load_batting_from_reader(csv.as_bytes()).unwrap();
        let names: Vec<&str> = table.records.iter().map(|r| r.player.name.as_str()).collect();
        assert_eq!(names, vec!["Good", "Fine"]);

        assert_eq!(table.rejected.len(), 3);
        assert_eq!(table.rejected[0].name, "TooManyHits");
        assert_eq!(table.rejected[0].line, 3);
        assert!(table.rejected[0].reason.contains("exceed at-bats"));
        assert_eq!(table.rejected[1].name, "Negative");
        assert!(table.rejected[1].reason.contains("non-negative"));
        assert_eq!(table.rejected[2].name, "Garbage");
        assert_eq!(table.rejected[2].line, 5);
    }

    #[test]
    fn unknown_position_is_left_unset() {
        let csv = "Name,Pos,AB,H,2B,3B,HR,BB,K\nUtility,UT,100,25,5,1,3,10,30\n";
        let table = load_batting_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.records[0].player.position, None);
    }

    #[test]
    fn empty_table_loads_empty() {
        let table = load_batting_from_reader(BATTING_HEADER.as_bytes()).unwrap();
        assert!(table.records.is_empty());
        assert!(table.rejected.is_empty());
    }

    // -- Pitching --

    #[test]
    fn pitching_rows_load_with_innings_notation() {
        let csv = format!(
            "{PITCHING_HEADER}\
             Gerrit Cole,NYY,222.2,65,180,45,222,28,7,821,15,4,33,33,0\n\
             Spencer Strider,ATL,186.2,80,149,56,281,25,9,761,20,5,32,32,0\n"
        );
        let table = load_pitching_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.records.len(), 2);
        let cole = &table.records[0];
        assert_eq!(cole.ip.outs(), 668);
        assert_eq!(cole.player.position, Some(Position::Pitcher));
        assert_eq!(table.records[1].ip.to_string(), "186.2");
    }

    #[test]
    fn bad_innings_are_rejected() {
        let csv = format!(
            "{PITCHING_HEADER}\
             Typo,BOS,100.4,40,90,30,100,10,3,0,5,5,20,20,0\n\
             Opener,BOS,0.1,0,0,0,1,0,0,1,0,0,1,1,0\n"
        );
        let table = load_pitching_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].ip.outs(), 1);
        assert_eq!(table.rejected[0].name, "Typo");
        assert!(table.rejected[0].reason.contains("100.4"));
    }

    #[test]
    fn path_loader_reports_missing_file() {
        let err = load_batting(Path::new("/nonexistent/batting.csv")).unwrap_err();
        assert!(matches!(err, TableError::Io { .. }));
    }

    #[test]
    fn season_resolves_against_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bat.csv"), "Name,AB,H,2B,3B,HR,BB,K\nA,10,3,0,0,1,1,2\n").unwrap();
        std::fs::write(
            dir.path().join("pit.csv"),
            "Name,IP,ER,H,BB,K,HR\nB,9.0,3,8,2,10,1\n",
        )
        .unwrap();
        let paths = DataPaths {
            batting: "bat.csv".into(),
            pitching: "pit.csv".into(),
        };
        let season = load_season(dir.path(), &paths).unwrap();
        assert_eq!(season.batting.records.len(), 1);
        assert_eq!(season.pitching.records[0].ip.outs(), 27);
    }
}
