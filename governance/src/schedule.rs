//! Append-only value history for one governed parameter.

use crate::error::GovernanceError;
use burst_types::Timestamp;
use serde::{Deserialize, Serialize};

/// One `(value, effective_at)` entry of a schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamEntry {
    pub value: u128,
    pub effective_at: Timestamp,
}

/// A half-open interval `[start, end)` during which `value` governed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateSegment {
    pub value: u128,
    pub start: Timestamp,
    pub end: Timestamp,
}

impl RateSegment {
    pub fn duration_secs(&self) -> u64 {
        self.start.elapsed_since(self.end)
    }
}

/// Versioned history of a parameter.
///
/// Entries are never rewritten. A change appends one entry in O(1); lookups
/// are O(log k) and interval walks O(k), where k is the number of changes
/// over the protocol's lifetime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSchedule {
    entries: Vec<ParamEntry>,
}

impl ParamSchedule {
    /// A schedule whose first value takes effect at `genesis`.
    pub fn new(initial: u128, genesis: Timestamp) -> Self {
        Self {
            entries: vec![ParamEntry {
                value: initial,
                effective_at: genesis,
            }],
        }
    }

    /// Append a value. Effective timestamps must be non-decreasing; a change at
    /// the same instant as the latest entry supersedes it for lookups.
    pub fn push(&mut self, value: u128, effective_at: Timestamp) -> Result<(), GovernanceError> {
        let latest = self.latest().effective_at;
        if effective_at < latest {
            return Err(GovernanceError::EffectiveTimeRegression {
                effective_at,
                latest,
            });
        }
        self.entries.push(ParamEntry {
            value,
            effective_at,
        });
        Ok(())
    }

    fn latest(&self) -> &ParamEntry {
        // `new` seeds one entry and nothing removes entries.
        &self.entries[self.entries.len() - 1]
    }

    /// The most recently appended value, regardless of the clock.
    pub fn current(&self) -> u128 {
        self.latest().value
    }

    /// The value governing at `t`. Before genesis the genesis value applies.
    pub fn value_at(&self, t: Timestamp) -> u128 {
        let idx = self.entries.partition_point(|e| e.effective_at <= t);
        match idx {
            0 => self.entries[0].value,
            n => self.entries[n - 1].value,
        }
    }

    pub fn entries(&self) -> &[ParamEntry] {
        &self.entries
    }

    /// Split `[from, to)` at every effective timestamp inside it.
    ///
    /// Zero-length segments (from same-instant changes) are skipped, so the
    /// durations of the returned segments always sum to `to - from`.
    pub fn segments(&self, from: Timestamp, to: Timestamp) -> Vec<RateSegment> {
        let mut out = Vec::new();
        if to <= from {
            return out;
        }
        for (i, entry) in self.entries.iter().enumerate() {
            let seg_start = if i == 0 {
                Timestamp::EPOCH
            } else {
                entry.effective_at
            };
            let seg_end = self
                .entries
                .get(i + 1)
                .map(|next| next.effective_at)
                .unwrap_or(Timestamp::new(u64::MAX));
            let start = seg_start.max(from);
            let end = seg_end.min(to);
            if start < end {
                out.push(RateSegment {
                    value: entry.value,
                    start,
                    end,
                });
            }
        }
        out
    }
}
