//! Expiry Evaluator.
//!
//! A batch is transferable iff `now − expiry_source ≤ e`, with `e` the value
//! currently in force, applied uniformly to every batch. Expired batches stay
//! in the index as non-transferable records until pruned.

use burst_types::Timestamp;

use crate::batch::mul_div_floor;

pub fn is_expired(expiry_source: Timestamp, now: Timestamp, expiry_secs: u64) -> bool {
    expiry_source.has_expired(expiry_secs, now)
}

/// The last instant at which a batch is still transferable.
pub fn expires_at(expiry_source: Timestamp, expiry_secs: u64) -> Timestamp {
    expiry_source.saturating_add(expiry_secs)
}

/// Seconds of life left, zero once expired.
pub fn remaining_secs(expiry_source: Timestamp, now: Timestamp, expiry_secs: u64) -> u64 {
    expiry_secs.saturating_sub(expiry_source.elapsed_since(now))
}

/// Value-based demurrage: `amount × remaining / e`.
///
/// With `e = u64::MAX` (normal money) the value never decays.
pub fn effective_value(amount: u128, expiry_source: Timestamp, now: Timestamp, expiry_secs: u64) -> u128 {
    if expiry_secs == 0 || expiry_secs == u64::MAX {
        return if is_expired(expiry_source, now, expiry_secs) { 0 } else { amount };
    }
    let remaining = remaining_secs(expiry_source, now, expiry_secs);
    mul_div_floor(u128::from(remaining), amount, u128::from(expiry_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: u64) -> Timestamp {
        Timestamp::new(s)
    }

    #[test]
    fn boundary_is_inclusive() {
        assert!(!is_expired(ts(100), ts(200), 100));
        assert!(is_expired(ts(100), ts(201), 100));
        assert_eq!(expires_at(ts(100), 100), ts(200));
    }

    #[test]
    fn century_expiry() {
        let year = 365 * 24 * 3600;
        let t0 = ts(1_000);
        assert!(!is_expired(t0, t0.saturating_add(99 * year), 100 * year));
        assert!(is_expired(t0, t0.saturating_add(101 * year), 100 * year));
    }

    #[test]
    fn demurrage_decays_linearly() {
        assert_eq!(effective_value(1_000, ts(0), ts(0), 100), 1_000);
        assert_eq!(effective_value(1_000, ts(0), ts(25), 100), 750);
        assert_eq!(effective_value(1_000, ts(0), ts(100), 100), 0);
        assert_eq!(effective_value(1_000, ts(0), ts(500), 100), 0);
    }

    #[test]
    fn normal_money_keeps_face_value() {
        assert_eq!(effective_value(1_000, ts(0), ts(1 << 40), u64::MAX), 1_000);
    }
}
