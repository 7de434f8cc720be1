//! Battle configuration and judged-battle report files.
//!
//! Both are plain JSON. Nothing read from disk is adopted until it has been
//! checked against the same invariants the in-memory model keeps, and every
//! problem found is reported in a single [`BattleError::MalformedImport`].

use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::model::{BattleSetup, Contestant, RoundConfig};
use super::presets::RoundCatalogue;
use super::session::BattleSession;
use super::store::{RoundKey, ScoreSheet, ScoreStore, SheetKey};
use crate::error::BattleError;

pub const REPORT_VERSION: u32 = 1;

/// Contestant names and round list, as exchanged with the setup screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleConfigFile {
    pub mcs: Vec<String>,
    pub rounds: Vec<RoundConfig>,
}

impl BattleConfigFile {
    pub fn from_setup(setup: &BattleSetup) -> Self {
        Self {
            mcs: setup.contestants().iter().map(|c| c.name.clone()).collect(),
            rounds: setup.rounds().to_vec(),
        }
    }

    /// Validate and turn into a setup. Contestants are numbered `mc-0`, `mc-1`, ... in order.
    pub fn into_setup(self, catalogue: RoundCatalogue) -> Result<BattleSetup, BattleError> {
        let mut problems = Vec::new();

        let mut names = HashSet::new();
        for (i, name) in self.mcs.iter().enumerate() {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                problems.push(format!("mcs[{}]: empty name", i));
            } else if !names.insert(trimmed) {
                problems.push(format!("mcs[{}]: duplicate name '{}'", i, trimmed));
            }
        }
        problems.extend(round_problems(&self.rounds));
        for (i, round) in self.rounds.iter().enumerate() {
            if !round.name.trim().is_empty() && catalogue.get(&round.name).is_none() {
                problems.push(format!("rounds[{}].name: unknown round '{}'", i, round.name));
            }
        }

        if !problems.is_empty() {
            return Err(BattleError::MalformedImport(problems));
        }

        let contestants = self
            .mcs
            .iter()
            .enumerate()
            .map(|(i, name)| Contestant {
                id: format!("mc-{}", i),
                name: name.trim().to_string(),
            })
            .collect();
        Ok(BattleSetup::from_parts(contestants, self.rounds, catalogue))
    }
}

fn round_problems(rounds: &[RoundConfig]) -> Vec<String> {
    let mut problems = Vec::new();
    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    for (i, round) in rounds.iter().enumerate() {
        if round.id.trim().is_empty() {
            problems.push(format!("rounds[{}].id: must not be empty", i));
        } else if !ids.insert(round.id.as_str()) {
            problems.push(format!("rounds[{}].id: duplicate id '{}'", i, round.id));
        }
        if round.name.trim().is_empty() {
            problems.push(format!("rounds[{}].name: must not be empty", i));
        } else if !names.insert(round.name.as_str()) {
            problems.push(format!("rounds[{}].name: duplicate round '{}'", i, round.name));
        }
        if round.turns_per_mc < 1 {
            problems.push(format!("rounds[{}].turnsPerMC: must be at least 1", i));
        }
        if round.patterns_per_turn < 1 {
            problems.push(format!("rounds[{}].patternsPerTurn: must be at least 1", i));
        }
    }
    problems
}

/// Parse a battle configuration from JSON text.
pub fn parse_config(json: &str, catalogue: RoundCatalogue) -> Result<BattleSetup, BattleError> {
    let file: BattleConfigFile = serde_json::from_str(json)
        .map_err(|e| BattleError::MalformedImport(vec![e.to_string()]))?;
    file.into_setup(catalogue)
}

pub fn load_config(path: &Path, catalogue: RoundCatalogue) -> Result<BattleSetup> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read battle config at {}", path.display()))?;
    let setup = parse_config(&json, catalogue)
        .with_context(|| format!("Failed to import battle config from {}", path.display()))?;
    debug!(
        path = %path.display(),
        contestants = setup.contestants().len(),
        rounds = setup.rounds().len(),
        "loaded battle config"
    );
    Ok(setup)
}

pub fn save_config(path: &Path, setup: &BattleSetup) -> Result<()> {
    write_json_atomic(path, &BattleConfigFile::from_setup(setup))
}

/// Score sheet of one contestant in one round instance, as stored in a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetRecord {
    pub round: RoundKey,
    #[serde(rename = "mcId")]
    pub contestant_id: String,
    #[serde(flatten)]
    pub sheet: ScoreSheet,
}

/// Snapshot of a judged battle, enough to review it or recompute results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleReport {
    pub version: u32,
    pub judged_at: DateTime<Utc>,
    pub mcs: Vec<Contestant>,
    pub rounds: Vec<RoundConfig>,
    pub sheets: Vec<SheetRecord>,
}

impl BattleReport {
    pub fn from_session(session: &BattleSession) -> Self {
        let mut sheets: Vec<SheetRecord> = Vec::with_capacity(session.store().len());
        // Play order, then contestant order, so reports diff cleanly
        for key in session.round_keys() {
            for contestant in session.contestants() {
                if let Some(sheet) = session.sheet(key, &contestant.id) {
                    sheets.push(SheetRecord {
                        round: key.clone(),
                        contestant_id: contestant.id.clone(),
                        sheet: sheet.clone(),
                    });
                }
            }
        }
        Self {
            version: REPORT_VERSION,
            judged_at: Utc::now(),
            mcs: session.contestants().to_vec(),
            rounds: session.rounds().to_vec(),
            sheets,
        }
    }

    /// Check every invariant and rebuild the session the report was taken from.
    pub fn into_session(self) -> Result<BattleSession, BattleError> {
        let mut problems = Vec::new();
        if self.version != REPORT_VERSION {
            problems.push(format!("unsupported report version {}", self.version));
        }

        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for (i, mc) in self.mcs.iter().enumerate() {
            let trimmed = mc.name.trim();
            if trimmed.is_empty() {
                problems.push(format!("mcs[{}]: empty name", i));
            } else if !names.insert(trimmed) {
                problems.push(format!("mcs[{}]: duplicate name '{}'", i, trimmed));
            }
            if !ids.insert(mc.id.as_str()) {
                problems.push(format!("mcs[{}]: duplicate id '{}'", i, mc.id));
            }
        }
        problems.extend(round_problems(&self.rounds));

        let mut expected: HashMap<SheetKey, &RoundConfig> = HashMap::new();
        for round in &self.rounds {
            for key in RoundKey::expand(round) {
                for mc in &self.mcs {
                    expected.insert(SheetKey::new(&key, &mc.id), round);
                }
            }
        }

        let mut sheets = HashMap::new();
        for (i, record) in self.sheets.into_iter().enumerate() {
            let key = SheetKey::new(&record.round, &record.contestant_id);
            match expected.get(&key) {
                None => problems.push(format!(
                    "sheets[{}]: no round instance {} for {}",
                    i, record.round, record.contestant_id
                )),
                Some(round) => {
                    for problem in record.sheet.problems(round) {
                        problems.push(format!("sheets[{}] ({} {}): {}", i, record.round, record.contestant_id, problem));
                    }
                }
            }
            if sheets.insert(key, record.sheet).is_some() {
                problems.push(format!("sheets[{}]: duplicate sheet", i));
            }
        }
        let mut missing: Vec<&SheetKey> = expected.keys().filter(|k| !sheets.contains_key(*k)).collect();
        missing.sort();
        for key in missing {
            problems.push(format!("missing sheet for {} in {}", key.contestant_id, key.round));
        }

        if !problems.is_empty() {
            return Err(BattleError::MalformedImport(problems));
        }
        Ok(BattleSession::resume(
            self.mcs,
            self.rounds,
            ScoreStore::from_sheets(sheets),
        ))
    }
}

/// `battle-<timestamp>.json` inside `dir`.
pub fn default_report_path(dir: &Path) -> PathBuf {
    dir.join(format!("battle-{}.json", Utc::now().format("%Y%m%d-%H%M%S")))
}

pub fn save_report(path: &Path, session: &BattleSession) -> Result<()> {
    write_json_atomic(path, &BattleReport::from_session(session))?;
    debug!(path = %path.display(), "saved battle report");
    Ok(())
}

/// Load a report and rebuild its session. Malformed reports are rejected whole.
pub fn load_report(path: &Path) -> Result<BattleSession> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open battle report at {}", path.display()))?;
    let report: BattleReport = serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("Failed to parse battle report at {}", path.display()))?;
    let session = report
        .into_session()
        .with_context(|| format!("Rejected battle report at {}", path.display()))?;
    Ok(session)
}

/// Write JSON atomically so the file is never left half-written.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    serde_json::to_writer_pretty(&mut file, value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    file.commit()
        .with_context(|| format!("Failed to save {}", path.display()))?;
    Ok(())
}
