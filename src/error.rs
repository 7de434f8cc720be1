use thiserror::Error;

use crate::battle::BonusCategory;

/// Rejections raised by battle setup and scoring mutations.
///
/// Every variant is local and recoverable: the call that produced it left
/// the battle state exactly as it was.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BattleError {
    #[error("contestant name must not be empty")]
    EmptyName,

    #[error("contestant '{0}' is already in the battle")]
    DuplicateName(String),

    #[error("round '{0}' is already in the round list")]
    DuplicateRoundName(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("invalid score {0}: patterns take half-point steps from 0 to 4")]
    InvalidScoreValue(f64),

    #[error("invalid bonus {0}: bonuses take half-point steps from 0 to 2")]
    InvalidBonusValue(f64),

    #[error("bonus category {0} is not scored in this round")]
    UnknownCategory(BonusCategory),

    #[error("unknown contestant: {0}")]
    UnknownContestant(String),

    #[error("unknown round: {0}")]
    UnknownRound(String),

    #[error("{what} index {index} is out of range (0..{len})")]
    OutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("malformed battle data:\n  - {}", .0.join("\n  - "))]
    MalformedImport(Vec<String>),
}

pub type Result<T> = std::result::Result<T, BattleError>;
