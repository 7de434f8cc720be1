use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::engine;
use super::model::{BonusCategory, Contestant, RoundConfig};
use crate::error::{BattleError, Result};

/// Leg of a there-and-back ("ida y vuelta") round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Leg {
    Ida,
    Vuelta,
}

impl Leg {
    pub fn label(self) -> &'static str {
        match self {
            Leg::Ida => "Ida",
            Leg::Vuelta => "Vuelta",
        }
    }
}

/// Identifies one presentable round: a whole round, or one leg of a doubled round.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoundKey {
    pub round_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leg: Option<Leg>,
}

impl RoundKey {
    pub fn single(round_id: &str) -> Self {
        Self {
            round_id: round_id.to_string(),
            leg: None,
        }
    }

    pub fn leg(round_id: &str, leg: Leg) -> Self {
        Self {
            round_id: round_id.to_string(),
            leg: Some(leg),
        }
    }

    /// Every key a round expands to, in play order.
    pub fn expand(round: &RoundConfig) -> Vec<RoundKey> {
        if round.double_round {
            vec![
                RoundKey::leg(&round.id, Leg::Ida),
                RoundKey::leg(&round.id, Leg::Vuelta),
            ]
        } else {
            vec![RoundKey::single(&round.id)]
        }
    }
}

impl fmt::Display for RoundKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.leg {
            Some(Leg::Ida) => write!(f, "{}-ida", self.round_id),
            Some(Leg::Vuelta) => write!(f, "{}-vuelta", self.round_id),
            None => f.write_str(&self.round_id),
        }
    }
}

/// One scored pattern. `value == None` means the judge has not scored it yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub value: Option<f64>,
    #[serde(rename = "isResponse", default)]
    pub is_response: bool,
}

impl Pattern {
    pub fn scored(value: f64) -> Self {
        Self {
            value: Some(value),
            is_response: false,
        }
    }

    pub fn response(value: f64) -> Self {
        Self {
            value: Some(value),
            is_response: true,
        }
    }
}

/// One turn of one contestant: exactly `patterns_per_turn` patterns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
    pub patterns: Vec<Pattern>,
}

impl Intervention {
    pub fn blank(patterns_per_turn: usize) -> Self {
        Self {
            patterns: vec![Pattern::default(); patterns_per_turn],
        }
    }
}

/// Everything scored for one contestant in one round instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreSheet {
    pub interventions: Vec<Intervention>,
    #[serde(default)]
    pub bonus: BTreeMap<BonusCategory, f64>,
}

impl ScoreSheet {
    /// Unscored sheet shaped after `round`: null patterns, zeroed numeric bonuses.
    pub fn blank(round: &RoundConfig) -> Self {
        Self {
            interventions: (0..round.turns_per_mc)
                .map(|_| Intervention::blank(round.patterns_per_turn as usize))
                .collect(),
            bonus: round.numeric_bonuses().into_iter().map(|c| (c, 0.0)).collect(),
        }
    }

    pub fn pattern(&self, turn: usize, pattern: usize) -> Option<&Pattern> {
        self.interventions.get(turn)?.patterns.get(pattern)
    }

    fn pattern_mut(&mut self, turn: usize, pattern: usize) -> Result<&mut Pattern> {
        let turns = self.interventions.len();
        let intervention = self.interventions.get_mut(turn).ok_or(BattleError::OutOfRange {
            what: "turn",
            index: turn,
            len: turns,
        })?;
        let patterns = intervention.patterns.len();
        intervention
            .patterns
            .get_mut(pattern)
            .ok_or(BattleError::OutOfRange {
                what: "pattern",
                index: pattern,
                len: patterns,
            })
    }

    /// Problems with this sheet's shape or values relative to `round`.
    /// Response flags are not checked: scoring ignores them when the round
    /// does not score RESPUESTAS.
    pub fn problems(&self, round: &RoundConfig) -> Vec<String> {
        let mut problems = Vec::new();
        if self.interventions.len() != round.turns_per_mc as usize {
            problems.push(format!(
                "expected {} interventions, found {}",
                round.turns_per_mc,
                self.interventions.len()
            ));
        }
        for (t, intervention) in self.interventions.iter().enumerate() {
            if intervention.patterns.len() != round.patterns_per_turn as usize {
                problems.push(format!(
                    "intervention {}: expected {} patterns, found {}",
                    t,
                    round.patterns_per_turn,
                    intervention.patterns.len()
                ));
            }
            for (p, pattern) in intervention.patterns.iter().enumerate() {
                if let Some(value) = pattern.value {
                    if engine::validate_pattern_value(value).is_err() {
                        problems.push(format!("intervention {} pattern {}: invalid score {}", t, p, value));
                    }
                }
            }
        }
        let expected = round.numeric_bonuses();
        for (category, value) in &self.bonus {
            if !expected.contains(category) {
                problems.push(format!("bonus {}: not enabled for this round", category));
            } else if engine::validate_bonus_value(*value).is_err() {
                problems.push(format!("bonus {}: invalid value {}", category, value));
            }
        }
        for category in expected {
            if !self.bonus.contains_key(&category) {
                problems.push(format!("bonus {}: missing", category));
            }
        }
        problems
    }
}

/// Identifies one [`ScoreSheet`] in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SheetKey {
    pub round: RoundKey,
    pub contestant_id: String,
}

impl SheetKey {
    pub fn new(round: &RoundKey, contestant_id: &str) -> Self {
        Self {
            round: round.clone(),
            contestant_id: contestant_id.to_string(),
        }
    }
}

/// Mutable grid of scores: one sheet per (round instance, contestant).
///
/// Sheets are created up front by [`ScoreStore::initialize`] and never removed.
/// All writes validate before touching a sheet, so a rejected write leaves the
/// store unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreStore {
    sheets: HashMap<SheetKey, ScoreSheet>,
}

impl ScoreStore {
    /// Blank sheets for every contestant in every round instance.
    pub fn initialize(contestants: &[Contestant], rounds: &[RoundConfig]) -> Self {
        let mut sheets = HashMap::new();
        for round in rounds {
            for key in RoundKey::expand(round) {
                for contestant in contestants {
                    sheets.insert(SheetKey::new(&key, &contestant.id), ScoreSheet::blank(round));
                }
            }
        }
        Self { sheets }
    }

    pub(crate) fn from_sheets(sheets: HashMap<SheetKey, ScoreSheet>) -> Self {
        Self { sheets }
    }

    pub fn sheet(&self, round: &RoundKey, contestant_id: &str) -> Option<&ScoreSheet> {
        self.sheets.get(&SheetKey::new(round, contestant_id))
    }

    pub fn sheets(&self) -> impl Iterator<Item = (&SheetKey, &ScoreSheet)> {
        self.sheets.iter()
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn set_pattern_value(
        &mut self,
        round: &RoundKey,
        contestant_id: &str,
        turn: usize,
        pattern: usize,
        value: f64,
    ) -> Result<()> {
        engine::validate_pattern_value(value)?;
        let slot = self.sheet_mut(round, contestant_id)?.pattern_mut(turn, pattern)?;
        slot.value = Some(value);
        Ok(())
    }

    /// Flip the response flag and return its new state.
    pub fn toggle_response_flag(
        &mut self,
        round: &RoundKey,
        contestant_id: &str,
        turn: usize,
        pattern: usize,
    ) -> Result<bool> {
        let slot = self.sheet_mut(round, contestant_id)?.pattern_mut(turn, pattern)?;
        slot.is_response = !slot.is_response;
        Ok(slot.is_response)
    }

    /// Write a bonus value. Only categories already present on the sheet can be set;
    /// sheets are created with exactly the round's enabled numeric categories.
    pub fn set_bonus_value(
        &mut self,
        round: &RoundKey,
        contestant_id: &str,
        category: BonusCategory,
        value: f64,
    ) -> Result<()> {
        engine::validate_bonus_value(value)?;
        let sheet = self.sheet_mut(round, contestant_id)?;
        match sheet.bonus.get_mut(&category) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(BattleError::UnknownCategory(category)),
        }
    }

    fn sheet_mut(&mut self, round: &RoundKey, contestant_id: &str) -> Result<&mut ScoreSheet> {
        self.sheets
            .get_mut(&SheetKey::new(round, contestant_id))
            .ok_or_else(|| BattleError::UnknownContestant(format!("{} in round {}", contestant_id, round)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contestants() -> Vec<Contestant> {
        vec![
            Contestant { id: "mc-0".to_string(), name: "A".to_string() },
            Contestant { id: "mc-1".to_string(), name: "B".to_string() },
        ]
    }

    fn round(double: bool) -> RoundConfig {
        let mut round = RoundConfig::new("8x8", 3, 2);
        round.id = "r1".to_string();
        round.double_round = double;
        round.bonus_enabled.insert(BonusCategory::Flow, true);
        round.bonus_enabled.insert(BonusCategory::Responses, true);
        round
    }

    #[test]
    fn test_round_key_display_matches_leg_suffix() {
        assert_eq!(RoundKey::single("r1").to_string(), "r1");
        assert_eq!(RoundKey::leg("r1", Leg::Ida).to_string(), "r1-ida");
        assert_eq!(RoundKey::leg("r1", Leg::Vuelta).to_string(), "r1-vuelta");
    }

    #[test]
    fn test_expand_doubled_round() {
        let keys = RoundKey::expand(&round(true));
        assert_eq!(keys, vec![RoundKey::leg("r1", Leg::Ida), RoundKey::leg("r1", Leg::Vuelta)]);
        assert_eq!(RoundKey::expand(&round(false)), vec![RoundKey::single("r1")]);
    }

    #[test]
    fn test_initialize_shapes_every_sheet() {
        let store = ScoreStore::initialize(&contestants(), &[round(true)]);
        assert_eq!(store.len(), 4);

        let sheet = store.sheet(&RoundKey::leg("r1", Leg::Vuelta), "mc-1").unwrap();
        assert_eq!(sheet.interventions.len(), 3);
        assert!(sheet.interventions.iter().all(|i| i.patterns.len() == 2));
        assert!(sheet
            .interventions
            .iter()
            .flat_map(|i| &i.patterns)
            .all(|p| p.value.is_none() && !p.is_response));
        // Responses never gets a numeric entry
        assert_eq!(sheet.bonus.len(), 1);
        assert_eq!(sheet.bonus.get(&BonusCategory::Flow), Some(&0.0));
    }

    #[test]
    fn test_set_pattern_value_rejects_non_step() {
        let mut store = ScoreStore::initialize(&contestants(), &[round(false)]);
        let key = RoundKey::single("r1");
        store.set_pattern_value(&key, "mc-0", 0, 1, 2.5).unwrap();

        assert_eq!(
            store.set_pattern_value(&key, "mc-0", 0, 1, 0.3),
            Err(BattleError::InvalidScoreValue(0.3))
        );
        assert_eq!(store.sheet(&key, "mc-0").unwrap().pattern(0, 1).unwrap().value, Some(2.5));
    }

    #[test]
    fn test_set_pattern_value_out_of_range() {
        let mut store = ScoreStore::initialize(&contestants(), &[round(false)]);
        let key = RoundKey::single("r1");
        assert!(matches!(
            store.set_pattern_value(&key, "mc-0", 3, 0, 1.0),
            Err(BattleError::OutOfRange { what: "turn", index: 3, len: 3 })
        ));
        assert!(matches!(
            store.set_pattern_value(&key, "mc-0", 0, 2, 1.0),
            Err(BattleError::OutOfRange { what: "pattern", index: 2, len: 2 })
        ));
        assert!(matches!(
            store.set_pattern_value(&key, "mc-9", 0, 0, 1.0),
            Err(BattleError::UnknownContestant(_))
        ));
    }

    #[test]
    fn test_legs_are_independent() {
        let mut store = ScoreStore::initialize(&contestants(), &[round(true)]);
        let ida = RoundKey::leg("r1", Leg::Ida);
        let vuelta = RoundKey::leg("r1", Leg::Vuelta);

        store.set_pattern_value(&ida, "mc-0", 0, 0, 4.0).unwrap();
        store.set_bonus_value(&ida, "mc-0", BonusCategory::Flow, 1.5).unwrap();
        store.toggle_response_flag(&ida, "mc-0", 1, 1).unwrap();

        let other = store.sheet(&vuelta, "mc-0").unwrap();
        assert_eq!(other, &ScoreSheet::blank(&round(true)));
    }

    #[test]
    fn test_toggle_response_flag_flips() {
        let mut store = ScoreStore::initialize(&contestants(), &[round(false)]);
        let key = RoundKey::single("r1");
        assert!(store.toggle_response_flag(&key, "mc-1", 2, 0).unwrap());
        assert!(!store.toggle_response_flag(&key, "mc-1", 2, 0).unwrap());
    }

    #[test]
    fn test_set_bonus_value_checks_category_and_value() {
        let mut store = ScoreStore::initialize(&contestants(), &[round(false)]);
        let key = RoundKey::single("r1");

        assert_eq!(
            store.set_bonus_value(&key, "mc-0", BonusCategory::Technique, 1.0),
            Err(BattleError::UnknownCategory(BonusCategory::Technique))
        );
        assert_eq!(
            store.set_bonus_value(&key, "mc-0", BonusCategory::Responses, 1.0),
            Err(BattleError::UnknownCategory(BonusCategory::Responses))
        );
        assert_eq!(
            store.set_bonus_value(&key, "mc-0", BonusCategory::Flow, 2.5),
            Err(BattleError::InvalidBonusValue(2.5))
        );
        store.set_bonus_value(&key, "mc-0", BonusCategory::Flow, 2.0).unwrap();
        assert_eq!(
            store.sheet(&key, "mc-0").unwrap().bonus.get(&BonusCategory::Flow),
            Some(&2.0)
        );
    }

    #[test]
    fn test_sheet_problems() {
        let round = round(false);
        assert!(ScoreSheet::blank(&round).problems(&round).is_empty());

        let mut sheet = ScoreSheet::blank(&round);
        sheet.interventions.pop();
        sheet.interventions[0].patterns[0].value = Some(5.0);
        sheet.bonus.clear();
        sheet.bonus.insert(BonusCategory::Technique, 1.0);
        let problems = sheet.problems(&round);
        assert_eq!(problems.len(), 4);
        assert!(problems[0].contains("expected 3 interventions"));
    }

    #[test]
    fn test_pattern_json_shape() {
        let json = serde_json::to_string(&Pattern::response(3.5)).unwrap();
        assert_eq!(json, r#"{"value":3.5,"isResponse":true}"#);
        let blank: Pattern = serde_json::from_str(r#"{"value":null}"#).unwrap();
        assert_eq!(blank, Pattern::default());
    }
}
