use crate::battle::{engine, transport, Advance, BattleSession, BonusCategory, Contestant, RoundKey};
use crate::tui::theme::ThemeColors;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Help,
    Results,
}

/// One editable cell of the judging grid. `mc` indexes the session's contestants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Focus {
    Pattern { mc: usize, turn: usize, pattern: usize },
    Bonus { mc: usize, category: BonusCategory },
}

impl Focus {
    pub fn mc(&self) -> usize {
        match self {
            Focus::Pattern { mc, .. } | Focus::Bonus { mc, .. } => *mc,
        }
    }
}

pub struct App {
    pub session: BattleSession,
    pub focus: usize,
    pub input_mode: InputMode,
    pub flash_message: Option<(String, Instant)>,
    pub should_quit: bool,
    pub report_path: PathBuf,
    pub report_saved: bool,
    pub theme: ThemeColors,
}

impl App {
    pub fn new(session: BattleSession, report_path: PathBuf, theme: ThemeColors) -> Self {
        Self {
            session,
            focus: 0,
            input_mode: InputMode::Normal,
            flash_message: None,
            should_quit: false,
            report_path,
            report_saved: false,
            theme,
        }
    }

    pub fn current_key(&self) -> Option<RoundKey> {
        self.session.current_round().cloned()
    }

    /// Editable cells of the current round, grouped by contestant: every
    /// pattern in turn order, then the round's numeric bonuses.
    pub fn focus_slots(&self) -> Vec<Focus> {
        let Some(round) = self
            .session
            .current_round()
            .and_then(|key| self.session.round_config(key))
        else {
            return Vec::new();
        };
        let bonuses = round.numeric_bonuses();

        let mut slots = Vec::new();
        for mc in 0..self.session.contestants().len() {
            for turn in 0..round.turns_per_mc as usize {
                for pattern in 0..round.patterns_per_turn as usize {
                    slots.push(Focus::Pattern { mc, turn, pattern });
                }
            }
            for category in &bonuses {
                slots.push(Focus::Bonus {
                    mc,
                    category: *category,
                });
            }
        }
        slots
    }

    pub fn focused(&self) -> Option<Focus> {
        self.focus_slots().get(self.focus).copied()
    }

    fn focused_contestant(&self, focus: Focus) -> Option<&Contestant> {
        self.session.contestants().get(focus.mc())
    }

    pub fn next_slot(&mut self) {
        let len = self.focus_slots().len();
        if len == 0 {
            return;
        }
        self.focus = if self.focus >= len - 1 { 0 } else { self.focus + 1 };
    }

    pub fn previous_slot(&mut self) {
        let len = self.focus_slots().len();
        if len == 0 {
            return;
        }
        self.focus = if self.focus == 0 { len - 1 } else { self.focus - 1 };
    }

    /// Jump to the same cell of the next (or previous) contestant.
    pub fn switch_contestant(&mut self, forward: bool) {
        let len = self.focus_slots().len();
        let mcs = self.session.contestants().len();
        if len == 0 || mcs < 2 {
            return;
        }
        let block = len / mcs;
        self.focus = if forward {
            (self.focus + block) % len
        } else {
            (self.focus + len - block) % len
        };
    }

    /// Current value under the cursor; `None` for an unscored pattern.
    pub fn focused_value(&self) -> Option<f64> {
        let key = self.current_key()?;
        let focus = self.focused()?;
        let contestant = self.focused_contestant(focus)?;
        let sheet = self.session.sheet(&key, &contestant.id)?;
        match focus {
            Focus::Pattern { turn, pattern, .. } => sheet.pattern(turn, pattern)?.value,
            Focus::Bonus { category, .. } => Some(sheet.bonus.get(&category).copied().unwrap_or(0.0)),
        }
    }

    /// Digit keys: `d` means `d * 0.5` points. A scored pattern moves the cursor on.
    pub fn enter_digit(&mut self, digit: u32) {
        let value = f64::from(digit) * 0.5;
        if self.apply_value(value) && matches!(self.focused(), Some(Focus::Pattern { .. })) {
            self.next_slot();
        }
    }

    pub fn step_focused(&mut self, up: bool) {
        let Some(focus) = self.focused() else {
            return;
        };
        let value = match focus {
            Focus::Pattern { .. } => engine::step_pattern_value(self.focused_value(), up),
            Focus::Bonus { .. } => engine::step_bonus_value(self.focused_value().unwrap_or(0.0), up),
        };
        self.apply_value(value);
    }

    /// Write `value` into the focused cell. Rejections are flashed, not propagated.
    fn apply_value(&mut self, value: f64) -> bool {
        let (Some(key), Some(focus)) = (self.current_key(), self.focused()) else {
            return false;
        };
        let Some(mc_id) = self.focused_contestant(focus).map(|c| c.id.clone()) else {
            return false;
        };
        let result = match focus {
            Focus::Pattern { turn, pattern, .. } => {
                self.session.set_pattern_value(&key, &mc_id, turn, pattern, value)
            }
            Focus::Bonus { category, .. } => self.session.set_bonus_value(&key, &mc_id, category, value),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                self.show_flash(format!("Error: {}", e));
                false
            }
        }
    }

    pub fn toggle_response(&mut self) {
        let (Some(key), Some(focus)) = (self.current_key(), self.focused()) else {
            return;
        };
        let responses = self
            .session
            .round_config(&key)
            .map(|r| r.responses_enabled())
            .unwrap_or(false);
        if !responses {
            self.show_flash(format!("Error: {} is not scored in this round", BonusCategory::Responses));
            return;
        }
        let Focus::Pattern { turn, pattern, .. } = focus else {
            return;
        };
        let Some(mc_id) = self.focused_contestant(focus).map(|c| c.id.clone()) else {
            return;
        };
        match self.session.toggle_response_flag(&key, &mc_id, turn, pattern) {
            Ok(true) => self.show_flash("Marked as response".to_string()),
            Ok(false) => self.show_flash("Response mark removed".to_string()),
            Err(e) => self.show_flash(format!("Error: {}", e)),
        }
    }

    /// Advance to the next round instance; past the last one the battle is finished.
    pub fn next_round(&mut self) {
        match self.session.next_round() {
            Advance::Moved(_) => self.focus = 0,
            Advance::Complete => self.finish(),
        }
    }

    pub fn previous_round(&mut self) {
        if self.input_mode == InputMode::Results {
            self.input_mode = InputMode::Normal;
            return;
        }
        self.session.previous_round();
        self.focus = 0;
    }

    /// Write the report and switch to the results view.
    pub fn finish(&mut self) {
        match transport::save_report(&self.report_path, &self.session) {
            Ok(()) => {
                self.report_saved = true;
                self.show_flash(format!("Report saved: {}", self.report_path.display()));
            }
            Err(e) => self.show_flash(format!("Failed to save report: {:#}", e)),
        }
        self.input_mode = InputMode::Results;
    }

    pub fn update_flash(&mut self) {
        if let Some((_, timestamp)) = self.flash_message {
            if timestamp.elapsed().as_secs() >= 3 {
                self.flash_message = None;
            }
        }
    }

    pub fn show_flash(&mut self, msg: String) {
        self.flash_message = Some((msg, Instant::now()));
    }

    pub fn show_help(&mut self) {
        self.input_mode = InputMode::Help;
    }

    /// Leave help; a finished battle goes back to its results.
    pub fn dismiss_help(&mut self) {
        self.input_mode = if self.report_saved {
            InputMode::Results
        } else {
            InputMode::Normal
        };
    }
}
