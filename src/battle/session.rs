use tracing::{debug, warn};

use super::engine;
use super::model::{BattleSetup, BonusCategory, Contestant, RoundConfig};
use super::sequencer::{Advance, RoundSequencer};
use super::store::{RoundKey, ScoreSheet, ScoreStore};
use crate::error::{BattleError, Result};

/// A battle in progress: frozen configuration, the score grid and the round cursor.
///
/// The session is the single owner of all scoring state. Commands validate
/// first and mutate second; queries never fail and read missing data as zero.
#[derive(Debug, Clone)]
pub struct BattleSession {
    contestants: Vec<Contestant>,
    rounds: Vec<RoundConfig>,
    store: ScoreStore,
    sequencer: RoundSequencer,
}

impl BattleSession {
    /// Freeze `setup` and create blank score sheets for every round instance.
    pub fn start(setup: &BattleSetup) -> Self {
        let contestants = setup.contestants().to_vec();
        let rounds = setup.rounds().to_vec();
        let store = ScoreStore::initialize(&contestants, &rounds);
        let sequencer = RoundSequencer::new(&rounds);
        debug!(
            contestants = contestants.len(),
            round_instances = sequencer.len(),
            "battle started"
        );
        Self {
            contestants,
            rounds,
            store,
            sequencer,
        }
    }

    /// Rebuild a session around an existing score grid (used when loading a report).
    pub(crate) fn resume(contestants: Vec<Contestant>, rounds: Vec<RoundConfig>, store: ScoreStore) -> Self {
        let sequencer = RoundSequencer::new(&rounds);
        Self {
            contestants,
            rounds,
            store,
            sequencer,
        }
    }

    pub fn contestants(&self) -> &[Contestant] {
        &self.contestants
    }

    pub fn contestant(&self, id: &str) -> Option<&Contestant> {
        self.contestants.iter().find(|c| c.id == id)
    }

    pub fn rounds(&self) -> &[RoundConfig] {
        &self.rounds
    }

    pub fn store(&self) -> &ScoreStore {
        &self.store
    }

    pub fn sequencer(&self) -> &RoundSequencer {
        &self.sequencer
    }

    pub fn round_keys(&self) -> &[RoundKey] {
        self.sequencer.keys()
    }

    pub fn round_config(&self, key: &RoundKey) -> Option<&RoundConfig> {
        self.rounds.iter().find(|r| r.id == key.round_id)
    }

    /// Display label: the round name, with "(Ida)"/"(Vuelta)" for legs.
    pub fn round_label(&self, key: &RoundKey) -> String {
        let name = self
            .round_config(key)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| key.to_string());
        match key.leg {
            Some(leg) => format!("{} ({})", name, leg.label()),
            None => name,
        }
    }

    pub fn sheet(&self, key: &RoundKey, contestant_id: &str) -> Option<&ScoreSheet> {
        self.store.sheet(key, contestant_id)
    }

    // --- navigation ---

    pub fn current_round(&self) -> Option<&RoundKey> {
        self.sequencer.current()
    }

    pub fn next_round(&mut self) -> Advance {
        let advance = self.sequencer.next();
        debug!(?advance, "next round");
        advance
    }

    pub fn previous_round(&mut self) -> usize {
        self.sequencer.previous()
    }

    // --- scoring commands ---

    pub fn set_pattern_value(
        &mut self,
        key: &RoundKey,
        contestant_id: &str,
        turn: usize,
        pattern: usize,
        value: f64,
    ) -> Result<()> {
        self.require_round(key)?;
        self.store
            .set_pattern_value(key, contestant_id, turn, pattern, value)
            .inspect_err(|e| warn!(round = %key, contestant_id, error = %e, "pattern score rejected"))?;
        debug!(round = %key, contestant_id, turn, pattern, value, "pattern scored");
        Ok(())
    }

    /// Flip a pattern's response flag. Allowed even when the round does not
    /// score responses; scoring then ignores the flag.
    pub fn toggle_response_flag(
        &mut self,
        key: &RoundKey,
        contestant_id: &str,
        turn: usize,
        pattern: usize,
    ) -> Result<bool> {
        self.require_round(key)?;
        let flagged = self.store.toggle_response_flag(key, contestant_id, turn, pattern)?;
        debug!(round = %key, contestant_id, turn, pattern, flagged, "response flag toggled");
        Ok(flagged)
    }

    pub fn set_bonus_value(
        &mut self,
        key: &RoundKey,
        contestant_id: &str,
        category: BonusCategory,
        value: f64,
    ) -> Result<()> {
        let round = self.require_round(key)?;
        if !category.is_numeric() || !round.is_enabled(category) {
            warn!(round = %key, %category, "bonus category not scored in this round");
            return Err(BattleError::UnknownCategory(category));
        }
        self.store
            .set_bonus_value(key, contestant_id, category, value)
            .inspect_err(|e| warn!(round = %key, contestant_id, error = %e, "bonus rejected"))?;
        debug!(round = %key, contestant_id, %category, value, "bonus scored");
        Ok(())
    }

    // --- totals ---

    /// Patterns plus bonuses for one contestant in one round instance; 0 if unknown.
    pub fn round_subtotal(&self, key: &RoundKey, contestant_id: &str) -> f64 {
        let responses = self
            .round_config(key)
            .map(|r| r.responses_enabled())
            .unwrap_or(false);
        self.store
            .sheet(key, contestant_id)
            .map(|sheet| engine::sheet_total(sheet, responses))
            .unwrap_or(0.0)
    }

    pub fn grand_total(&self, contestant_id: &str) -> f64 {
        self.sequencer
            .keys()
            .iter()
            .map(|key| self.round_subtotal(key, contestant_id))
            .sum()
    }

    fn require_round(&self, key: &RoundKey) -> Result<&RoundConfig> {
        let round = self
            .round_config(key)
            .ok_or_else(|| BattleError::UnknownRound(key.to_string()))?;
        let leg_matches = key.leg.is_some() == round.double_round;
        if !leg_matches {
            return Err(BattleError::UnknownRound(key.to_string()));
        }
        Ok(round)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::store::Leg;

    fn setup(double: bool, responses: bool) -> (BattleSetup, String) {
        let mut setup = BattleSetup::default();
        setup.add_contestant("A").unwrap();
        setup.add_contestant("B").unwrap();
        let round = setup.add_round_config("8x8").unwrap();
        setup.toggle_bonus(&round.id, BonusCategory::Flow).unwrap();
        if responses {
            setup.toggle_bonus(&round.id, BonusCategory::Responses).unwrap();
        }
        if double {
            setup.toggle_double_round(&round.id).unwrap();
        }
        (setup, round.id)
    }

    #[test]
    fn test_start_freezes_configuration() {
        let (mut setup, id) = setup(false, false);
        let session = BattleSession::start(&setup);
        setup.set_turns_per_mc(&id, 9).unwrap();

        assert_eq!(session.rounds()[0].turns_per_mc, 3);
        let sheet = session.sheet(&RoundKey::single(&id), "mc-0").unwrap();
        assert_eq!(sheet.interventions.len(), 3);
    }

    #[test]
    fn test_round_subtotal_with_responses_and_bonus() {
        let (setup, id) = setup(false, true);
        let mut session = BattleSession::start(&setup);
        let key = RoundKey::single(&id);

        session.set_pattern_value(&key, "mc-0", 0, 0, 3.5).unwrap();
        session.toggle_response_flag(&key, "mc-0", 0, 0).unwrap();
        session.set_pattern_value(&key, "mc-0", 1, 1, 2.0).unwrap();
        session.set_bonus_value(&key, "mc-0", BonusCategory::Flow, 1.5).unwrap();

        assert_eq!(session.round_subtotal(&key, "mc-0"), 4.0 + 2.0 + 1.5);
        assert_eq!(session.round_subtotal(&key, "mc-1"), 0.0);
    }

    #[test]
    fn test_stray_response_flag_has_no_effect() {
        let (setup, id) = setup(false, false);
        let mut session = BattleSession::start(&setup);
        let key = RoundKey::single(&id);

        session.set_pattern_value(&key, "mc-0", 0, 0, 2.0).unwrap();
        assert!(session.toggle_response_flag(&key, "mc-0", 0, 0).unwrap());
        assert_eq!(session.round_subtotal(&key, "mc-0"), 2.0);
    }

    #[test]
    fn test_set_bonus_value_rejects_disabled_and_responses() {
        let (setup, id) = setup(false, true);
        let mut session = BattleSession::start(&setup);
        let key = RoundKey::single(&id);

        assert_eq!(
            session.set_bonus_value(&key, "mc-0", BonusCategory::Technique, 1.0),
            Err(BattleError::UnknownCategory(BonusCategory::Technique))
        );
        assert_eq!(
            session.set_bonus_value(&key, "mc-0", BonusCategory::Responses, 1.0),
            Err(BattleError::UnknownCategory(BonusCategory::Responses))
        );
        assert_eq!(session.round_subtotal(&key, "mc-0"), 0.0);
    }

    #[test]
    fn test_wrong_leg_key_rejected() {
        let (setup, id) = setup(true, false);
        let mut session = BattleSession::start(&setup);
        assert_eq!(
            session.set_pattern_value(&RoundKey::single(&id), "mc-0", 0, 0, 1.0),
            Err(BattleError::UnknownRound(id.clone()))
        );
        assert!(session
            .set_pattern_value(&RoundKey::leg(&id, Leg::Vuelta), "mc-0", 0, 0, 1.0)
            .is_ok());
    }

    #[test]
    fn test_queries_default_to_zero() {
        let (setup, _) = setup(false, false);
        let session = BattleSession::start(&setup);
        assert_eq!(session.round_subtotal(&RoundKey::single("nope"), "mc-0"), 0.0);
        assert_eq!(session.grand_total("mc-42"), 0.0);
    }

    #[test]
    fn test_grand_total_independent_of_cursor() {
        let (setup, id) = setup(true, false);
        let mut session = BattleSession::start(&setup);
        let ida = RoundKey::leg(&id, Leg::Ida);
        let vuelta = RoundKey::leg(&id, Leg::Vuelta);
        session.set_pattern_value(&ida, "mc-0", 0, 0, 3.0).unwrap();
        session.set_pattern_value(&vuelta, "mc-0", 2, 1, 1.5).unwrap();

        let before = session.grand_total("mc-0");
        assert_eq!(session.next_round(), Advance::Moved(1));
        assert_eq!(session.grand_total("mc-0"), before);
        assert_eq!(session.next_round(), Advance::Complete);
        assert_eq!(session.grand_total("mc-0"), 4.5);
    }

    #[test]
    fn test_round_labels() {
        let (setup, id) = setup(true, false);
        let session = BattleSession::start(&setup);
        assert_eq!(session.round_label(&RoundKey::leg(&id, Leg::Ida)), "8x8 (Ida)");
        assert_eq!(session.round_label(&RoundKey::leg(&id, Leg::Vuelta)), "8x8 (Vuelta)");
    }

    mod proptests {
        use super::*;
        use crate::battle::engine::PATTERN_STEPS;
        use proptest::prelude::*;

        proptest! {
            /// Property: grand totals are the same at every cursor position
            #[test]
            fn prop_grand_total_same_at_every_cursor(
                writes in proptest::collection::vec(
                    (0usize..3, 0usize..2, 0usize..3, 0usize..2, 0usize..PATTERN_STEPS.len()),
                    0..20,
                ),
            ) {
                let (mut setup, id) = setup(true, true);
                let single = setup.add_round_config("4x4").unwrap();
                let mut session = BattleSession::start(&setup);
                let keys = [
                    RoundKey::leg(&id, Leg::Ida),
                    RoundKey::leg(&id, Leg::Vuelta),
                    RoundKey::single(&single.id),
                ];
                for (key_idx, mc, turn, pattern, step) in writes {
                    // 4x4 has one pattern per turn
                    let pattern = if key_idx == 2 { 0 } else { pattern };
                    let mc_id = format!("mc-{}", mc);
                    session
                        .set_pattern_value(&keys[key_idx], &mc_id, turn, pattern, PATTERN_STEPS[step])
                        .unwrap();
                }

                let totals = |session: &BattleSession| -> Vec<f64> {
                    ["mc-0", "mc-1"].iter().map(|mc| session.grand_total(mc)).collect()
                };
                let expected = totals(&session);

                while let Advance::Moved(_) = session.next_round() {
                    prop_assert_eq!(totals(&session), expected.clone());
                }
                prop_assert_eq!(totals(&session), expected.clone());
                while session.previous_round() > 0 {
                    prop_assert_eq!(totals(&session), expected.clone());
                }
                prop_assert_eq!(totals(&session), expected);
            }
        }
    }
}
