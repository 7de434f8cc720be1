use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

use super::presets::RoundCatalogue;
use crate::error::{BattleError, Result};

/// Bonus categories a judge can award on top of pattern scores.
///
/// `Responses` is special: it is never scored as a number. When enabled it lets
/// individual patterns be flagged as rebuttals (see [`crate::battle::engine`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BonusCategory {
    #[serde(rename = "FLOW")]
    Flow,
    #[serde(rename = "P. EN ESCENA")]
    StagePresence,
    #[serde(rename = "RESPUESTAS")]
    Responses,
    #[serde(rename = "TÉCNICAS")]
    Technique,
}

impl BonusCategory {
    pub const ALL: [BonusCategory; 4] = [
        BonusCategory::Flow,
        BonusCategory::StagePresence,
        BonusCategory::Responses,
        BonusCategory::Technique,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BonusCategory::Flow => "FLOW",
            BonusCategory::StagePresence => "P. EN ESCENA",
            BonusCategory::Responses => "RESPUESTAS",
            BonusCategory::Technique => "TÉCNICAS",
        }
    }

    /// Whether the category is awarded as a numeric bonus entry.
    pub fn is_numeric(self) -> bool {
        self != BonusCategory::Responses
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.label().to_lowercase() == s)
    }
}

impl fmt::Display for BonusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contestant {
    pub id: String,
    pub name: String,
}

/// Structure of one round in the battle.
///
/// Field names follow the battle configuration JSON format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundConfig {
    pub id: String,
    pub name: String,
    #[serde(rename = "turnsPerMC")]
    pub turns_per_mc: u32,
    #[serde(rename = "patternsPerTurn")]
    pub patterns_per_turn: u32,
    #[serde(rename = "doubleRound", default)]
    pub double_round: bool,
    #[serde(rename = "bonus", default)]
    pub bonus_enabled: BTreeMap<BonusCategory, bool>,
}

impl RoundConfig {
    pub fn new(name: &str, turns_per_mc: u32, patterns_per_turn: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            turns_per_mc,
            patterns_per_turn,
            double_round: false,
            bonus_enabled: BonusCategory::ALL.into_iter().map(|c| (c, false)).collect(),
        }
    }

    pub fn is_enabled(&self, category: BonusCategory) -> bool {
        self.bonus_enabled.get(&category).copied().unwrap_or(false)
    }

    pub fn responses_enabled(&self) -> bool {
        self.is_enabled(BonusCategory::Responses)
    }

    /// Enabled categories that carry a numeric bonus entry, in display order.
    pub fn numeric_bonuses(&self) -> Vec<BonusCategory> {
        BonusCategory::ALL
            .into_iter()
            .filter(|c| c.is_numeric() && self.is_enabled(*c))
            .collect()
    }
}

/// Contestants and rounds of a battle that has not started yet.
///
/// Every mutation either succeeds completely or returns an error and leaves
/// the setup untouched.
#[derive(Debug, Clone)]
pub struct BattleSetup {
    contestants: Vec<Contestant>,
    rounds: Vec<RoundConfig>,
    catalogue: RoundCatalogue,
    next_contestant: usize,
}

impl Default for BattleSetup {
    fn default() -> Self {
        Self::new(RoundCatalogue::builtin())
    }
}

impl BattleSetup {
    pub fn new(catalogue: RoundCatalogue) -> Self {
        Self {
            contestants: Vec::new(),
            rounds: Vec::new(),
            catalogue,
            next_contestant: 0,
        }
    }

    /// Assemble a setup from already-validated parts (used by import).
    pub(crate) fn from_parts(
        contestants: Vec<Contestant>,
        rounds: Vec<RoundConfig>,
        catalogue: RoundCatalogue,
    ) -> Self {
        let next_contestant = contestants.len();
        Self {
            contestants,
            rounds,
            catalogue,
            next_contestant,
        }
    }

    pub fn contestants(&self) -> &[Contestant] {
        &self.contestants
    }

    pub fn rounds(&self) -> &[RoundConfig] {
        &self.rounds
    }

    pub fn catalogue(&self) -> &RoundCatalogue {
        &self.catalogue
    }

    pub fn round(&self, id: &str) -> Option<&RoundConfig> {
        self.rounds.iter().find(|r| r.id == id)
    }

    pub fn add_contestant(&mut self, name: &str) -> Result<Contestant> {
        let name = name.trim();
        if name.is_empty() {
            warn!("rejected empty contestant name");
            return Err(BattleError::EmptyName);
        }
        if self.contestants.iter().any(|c| c.name == name) {
            warn!(name, "rejected duplicate contestant");
            return Err(BattleError::DuplicateName(name.to_string()));
        }

        let contestant = Contestant {
            id: format!("mc-{}", self.next_contestant),
            name: name.to_string(),
        };
        self.next_contestant += 1;
        debug!(id = %contestant.id, name, "added contestant");
        self.contestants.push(contestant.clone());
        Ok(contestant)
    }

    pub fn remove_contestant(&mut self, id: &str) -> Result<Contestant> {
        let idx = self
            .contestants
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| BattleError::UnknownContestant(id.to_string()))?;
        debug!(id, "removed contestant");
        Ok(self.contestants.remove(idx))
    }

    /// Add a round in the format named `name`, taking its default structure
    /// from the catalogue. A battle holds each format at most once.
    pub fn add_round_config(&mut self, name: &str) -> Result<RoundConfig> {
        if self.rounds.iter().any(|r| r.name == name) {
            warn!(name, "rejected duplicate round");
            return Err(BattleError::DuplicateRoundName(name.to_string()));
        }
        let preset = self
            .catalogue
            .get(name)
            .ok_or_else(|| BattleError::UnknownRound(name.to_string()))?;

        let round = RoundConfig::new(&preset.name, preset.turns_per_mc, preset.patterns_per_turn);
        debug!(id = %round.id, name, "added round");
        self.rounds.push(round.clone());
        Ok(round)
    }

    pub fn remove_round_config(&mut self, id: &str) -> Result<RoundConfig> {
        let idx = self.round_index(id)?;
        debug!(id, "removed round");
        Ok(self.rounds.remove(idx))
    }

    /// Replace the round order. `new_order` must list every current round id exactly once.
    pub fn reorder_round_configs(&mut self, new_order: &[String]) -> Result<()> {
        if let Some(foreign) = new_order.iter().find(|id| self.round(id).is_none()) {
            return Err(BattleError::UnknownRound(foreign.clone()));
        }
        let mut seen = std::collections::HashSet::new();
        let is_permutation =
            new_order.len() == self.rounds.len() && new_order.iter().all(|id| seen.insert(id));
        if !is_permutation {
            return Err(BattleError::InvalidValue(
                "new round order must list every round exactly once".to_string(),
            ));
        }

        let mut reordered = Vec::with_capacity(self.rounds.len());
        for id in new_order {
            if let Some(round) = self.round(id) {
                reordered.push(round.clone());
            }
        }
        self.rounds = reordered;
        debug!("reordered rounds");
        Ok(())
    }

    /// Move one round to `to` (clamped to the end of the list), shifting the others.
    pub fn move_round_config(&mut self, id: &str, to: usize) -> Result<()> {
        let from = self.round_index(id)?;
        let round = self.rounds.remove(from);
        let to = to.min(self.rounds.len());
        self.rounds.insert(to, round);
        Ok(())
    }

    /// Flip a bonus category on or off, returning the new state.
    pub fn toggle_bonus(&mut self, id: &str, category: BonusCategory) -> Result<bool> {
        let round = self.round_mut(id)?;
        let enabled = !round.is_enabled(category);
        round.bonus_enabled.insert(category, enabled);
        debug!(id, %category, enabled, "toggled bonus");
        Ok(enabled)
    }

    pub fn set_turns_per_mc(&mut self, id: &str, n: u32) -> Result<()> {
        if n < 1 {
            return Err(BattleError::InvalidValue("turns per MC must be at least 1".to_string()));
        }
        self.round_mut(id)?.turns_per_mc = n;
        Ok(())
    }

    pub fn set_patterns_per_turn(&mut self, id: &str, n: u32) -> Result<()> {
        if n < 1 {
            return Err(BattleError::InvalidValue(
                "patterns per turn must be at least 1".to_string(),
            ));
        }
        self.round_mut(id)?.patterns_per_turn = n;
        Ok(())
    }

    pub fn toggle_double_round(&mut self, id: &str) -> Result<bool> {
        let round = self.round_mut(id)?;
        round.double_round = !round.double_round;
        Ok(round.double_round)
    }

    fn round_index(&self, id: &str) -> Result<usize> {
        self.rounds
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| BattleError::UnknownRound(id.to_string()))
    }

    fn round_mut(&mut self, id: &str) -> Result<&mut RoundConfig> {
        self.rounds
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| BattleError::UnknownRound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(setup: &BattleSetup) -> Vec<String> {
        setup.rounds().iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_add_contestant_trims_and_assigns_ids() {
        let mut setup = BattleSetup::default();
        let a = setup.add_contestant("  Chuty ").unwrap();
        let b = setup.add_contestant("Aczino").unwrap();
        assert_eq!(a.name, "Chuty");
        assert_eq!(a.id, "mc-0");
        assert_eq!(b.id, "mc-1");
    }

    #[test]
    fn test_add_contestant_rejects_duplicates_and_blanks() {
        let mut setup = BattleSetup::default();
        setup.add_contestant("Chuty").unwrap();

        assert_eq!(
            setup.add_contestant("Chuty"),
            Err(BattleError::DuplicateName("Chuty".to_string()))
        );
        assert_eq!(setup.add_contestant("   "), Err(BattleError::EmptyName));
        // Case-sensitive match
        assert!(setup.add_contestant("chuty").is_ok());
        assert_eq!(setup.contestants().len(), 2);
    }

    #[test]
    fn test_contestant_ids_not_reused_after_removal() {
        let mut setup = BattleSetup::default();
        let a = setup.add_contestant("A").unwrap();
        setup.remove_contestant(&a.id).unwrap();
        let b = setup.add_contestant("B").unwrap();
        assert_eq!(b.id, "mc-1");
    }

    #[test]
    fn test_add_round_uses_catalogue_defaults() {
        let mut setup = BattleSetup::default();
        let round = setup.add_round_config("12x12").unwrap();
        assert_eq!(round.turns_per_mc, 2);
        assert_eq!(round.patterns_per_turn, 3);
        assert!(!round.double_round);
        assert!(BonusCategory::ALL.iter().all(|c| !round.is_enabled(*c)));
    }

    #[test]
    fn test_add_round_rejects_duplicate_and_unknown() {
        let mut setup = BattleSetup::default();
        setup.add_round_config("4x4").unwrap();
        assert_eq!(
            setup.add_round_config("4x4"),
            Err(BattleError::DuplicateRoundName("4x4".to_string()))
        );
        assert_eq!(
            setup.add_round_config("Nope"),
            Err(BattleError::UnknownRound("Nope".to_string()))
        );
        assert_eq!(setup.rounds().len(), 1);
    }

    #[test]
    fn test_remove_round_frees_its_name() {
        let mut setup = BattleSetup::default();
        let round = setup.add_round_config("Objetos").unwrap();
        assert_eq!(setup.remove_round_config(&round.id).unwrap().name, "Objetos");
        assert_eq!(
            setup.remove_round_config(&round.id),
            Err(BattleError::UnknownRound(round.id.clone()))
        );
        assert!(setup.add_round_config("Objetos").is_ok());
    }

    #[test]
    fn test_structure_setters_reject_zero() {
        let mut setup = BattleSetup::default();
        let round = setup.add_round_config("8x8").unwrap();

        assert!(matches!(
            setup.set_turns_per_mc(&round.id, 0),
            Err(BattleError::InvalidValue(_))
        ));
        assert!(matches!(
            setup.set_patterns_per_turn(&round.id, 0),
            Err(BattleError::InvalidValue(_))
        ));
        assert_eq!(setup.round(&round.id).unwrap().turns_per_mc, 3);

        setup.set_turns_per_mc(&round.id, 5).unwrap();
        setup.set_patterns_per_turn(&round.id, 7).unwrap();
        let round = setup.round(&round.id).unwrap();
        assert_eq!(round.turns_per_mc, 5);
        assert_eq!(round.patterns_per_turn, 7);
    }

    #[test]
    fn test_toggle_bonus_and_double() {
        let mut setup = BattleSetup::default();
        let round = setup.add_round_config("4x4").unwrap();

        assert!(setup.toggle_bonus(&round.id, BonusCategory::Flow).unwrap());
        assert!(setup.toggle_bonus(&round.id, BonusCategory::Responses).unwrap());
        assert!(setup.toggle_double_round(&round.id).unwrap());

        let r = setup.round(&round.id).unwrap();
        assert!(r.double_round);
        assert!(r.responses_enabled());
        assert_eq!(r.numeric_bonuses(), vec![BonusCategory::Flow]);

        assert!(!setup.toggle_bonus(&round.id, BonusCategory::Flow).unwrap());
        assert!(setup.round(&round.id).unwrap().numeric_bonuses().is_empty());
    }

    #[test]
    fn test_reorder_round_configs() {
        let mut setup = BattleSetup::default();
        let a = setup.add_round_config("4x4").unwrap();
        let b = setup.add_round_config("8x8").unwrap();
        let c = setup.add_round_config("Acapella").unwrap();

        setup
            .reorder_round_configs(&[c.id.clone(), a.id.clone(), b.id.clone()])
            .unwrap();
        assert_eq!(ids(&setup), vec![c.id.clone(), a.id.clone(), b.id.clone()]);

        // Missing id
        assert!(matches!(
            setup.reorder_round_configs(&[a.id.clone(), b.id.clone()]),
            Err(BattleError::InvalidValue(_))
        ));
        // Repeated id
        assert!(matches!(
            setup.reorder_round_configs(&[a.id.clone(), a.id.clone(), b.id.clone()]),
            Err(BattleError::InvalidValue(_))
        ));
        // Foreign id
        assert!(matches!(
            setup.reorder_round_configs(&[a.id.clone(), b.id.clone(), "x".to_string()]),
            Err(BattleError::UnknownRound(_))
        ));
        assert_eq!(ids(&setup), vec![c.id, a.id, b.id]);
    }

    #[test]
    fn test_move_round_config() {
        let mut setup = BattleSetup::default();
        let a = setup.add_round_config("4x4").unwrap();
        let b = setup.add_round_config("8x8").unwrap();
        let c = setup.add_round_config("Acapella").unwrap();

        setup.move_round_config(&c.id, 0).unwrap();
        assert_eq!(ids(&setup), vec![c.id.clone(), a.id.clone(), b.id.clone()]);
        setup.move_round_config(&c.id, 99).unwrap();
        assert_eq!(ids(&setup), vec![a.id, b.id, c.id]);
    }

    #[test]
    fn test_bonus_category_parse() {
        assert_eq!(BonusCategory::parse("flow"), Some(BonusCategory::Flow));
        assert_eq!(
            BonusCategory::parse("P. en escena"),
            Some(BonusCategory::StagePresence)
        );
        assert_eq!(BonusCategory::parse("técnicas"), Some(BonusCategory::Technique));
        assert_eq!(BonusCategory::parse("punchlines"), None);
    }

    #[test]
    fn test_round_config_json_field_names() {
        let mut round = RoundConfig::new("4x4", 4, 1);
        round.id = "r1".to_string();
        round.bonus_enabled.insert(BonusCategory::Responses, true);
        let json = serde_json::to_value(&round).unwrap();
        assert_eq!(json["turnsPerMC"], 4);
        assert_eq!(json["patternsPerTurn"], 1);
        assert_eq!(json["doubleRound"], false);
        assert_eq!(json["bonus"]["RESPUESTAS"], true);
    }
}
