use super::model::RoundConfig;
use super::store::RoundKey;

/// Result of asking the sequencer to advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Cursor moved to this index.
    Moved(usize),
    /// Already on the last round instance: the battle is over.
    Complete,
}

/// Walks the round instances of a battle in play order.
///
/// A doubled round contributes its "ida" leg immediately followed by its
/// "vuelta" leg. The cursor only selects what is shown; it never affects totals.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSequencer {
    keys: Vec<RoundKey>,
    current: usize,
}

impl RoundSequencer {
    pub fn new(rounds: &[RoundConfig]) -> Self {
        Self {
            keys: rounds.iter().flat_map(RoundKey::expand).collect(),
            current: 0,
        }
    }

    pub fn keys(&self) -> &[RoundKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn position(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&RoundKey> {
        self.keys.get(self.current)
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.keys.len()
    }

    pub fn next(&mut self) -> Advance {
        if self.is_last() {
            return Advance::Complete;
        }
        self.current += 1;
        Advance::Moved(self.current)
    }

    /// Step back one round instance. Stays put at the first one.
    pub fn previous(&mut self) -> usize {
        self.current = self.current.saturating_sub(1);
        self.current
    }
}
