//! Pure scoring rules.
//!
//! A pattern is scored in half-point steps from 0 to 4. When the round has
//! the responses category enabled, a pattern flagged as a response earns an
//! extra half point, still capped at 4. Bonus categories add 0 to 2 points
//! (half-point steps) to a contestant's round total.

use super::store::{Intervention, Pattern, ScoreSheet};
use crate::error::{BattleError, Result};

pub const MAX_PATTERN_SCORE: f64 = 4.0;
pub const MAX_BONUS_SCORE: f64 = 2.0;
pub const RESPONSE_BONUS: f64 = 0.5;

/// Every value a pattern can be scored with, in picker order.
pub const PATTERN_STEPS: [f64; 9] = [0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0];

/// Every value a bonus category can take.
pub const BONUS_STEPS: [f64; 5] = [0.0, 0.5, 1.0, 1.5, 2.0];

fn is_half_step(value: f64, max: f64) -> bool {
    if !value.is_finite() || !(0.0..=max).contains(&value) {
        return false;
    }
    let doubled = value * 2.0;
    doubled == doubled.trunc()
}

pub fn validate_pattern_value(value: f64) -> Result<()> {
    if is_half_step(value, MAX_PATTERN_SCORE) {
        Ok(())
    } else {
        Err(BattleError::InvalidScoreValue(value))
    }
}

pub fn validate_bonus_value(value: f64) -> Result<()> {
    if is_half_step(value, MAX_BONUS_SCORE) {
        Ok(())
    } else {
        Err(BattleError::InvalidBonusValue(value))
    }
}

/// Points a pattern contributes. Unscored patterns count 0.
///
/// The response flag only counts when `responses_enabled` is set for the
/// enclosing round; a stray flag on a round without responses is ignored.
pub fn effective_pattern_value(pattern: &Pattern, responses_enabled: bool) -> f64 {
    let Some(value) = pattern.value else {
        return 0.0;
    };
    let extra = if responses_enabled && pattern.is_response && value < MAX_PATTERN_SCORE {
        RESPONSE_BONUS
    } else {
        0.0
    };
    (value + extra).min(MAX_PATTERN_SCORE)
}

pub fn intervention_subtotal(intervention: &Intervention, responses_enabled: bool) -> f64 {
    intervention
        .patterns
        .iter()
        .map(|p| effective_pattern_value(p, responses_enabled))
        .sum()
}

pub fn bonus_subtotal(sheet: &ScoreSheet) -> f64 {
    sheet.bonus.values().sum()
}

/// Interventions plus bonuses for one contestant in one round instance.
pub fn sheet_total(sheet: &ScoreSheet, responses_enabled: bool) -> f64 {
    let patterns: f64 = sheet
        .interventions
        .iter()
        .map(|i| intervention_subtotal(i, responses_enabled))
        .sum();
    patterns + bonus_subtotal(sheet)
}

/// Step a pattern value up or down by half a point, clamped to the valid range.
/// An unscored pattern steps to 0 in either direction.
pub fn step_pattern_value(current: Option<f64>, up: bool) -> f64 {
    step(current, up, MAX_PATTERN_SCORE)
}

pub fn step_bonus_value(current: f64, up: bool) -> f64 {
    step(Some(current), up, MAX_BONUS_SCORE)
}

fn step(current: Option<f64>, up: bool, max: f64) -> f64 {
    match current {
        None => 0.0,
        Some(v) if up => (v + 0.5).min(max),
        Some(v) => (v - 0.5).max(0.0),
    }
}
