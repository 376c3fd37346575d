//! Per-turn tool-call budget.

/// Counts operations executed during one user turn.
///
/// A fresh budget is created for every user turn; exhaustion ends the turn
/// without discarding conversation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnBudget {
    max: u32,
    used: u32,
}

impl TurnBudget {
    pub fn new(max: u32) -> Self {
        Self { max, used: 0 }
    }

    /// Record one executed operation.
    pub fn consume(&mut self) {
        self.used = self.used.saturating_add(1);
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.used)
    }

    /// True once no further model calls may be issued this turn.
    pub fn is_exhausted(&self) -> bool {
        self.used >= self.max
    }
}
