//! Live TRST batches.

use burst_types::{Timestamp, TrstState, TxHash, WalletAddress};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::expiry;

/// A spendable (or formerly spendable) unit of TRST in the live index.
///
/// `constituent_origins` maps every founding burn to the share of `amount`
/// that descends from it; its values always sum to `amount`. Revocation
/// reads it to compute `tainted` once, and transfers only read the cache.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveBatch {
    /// Output id: the creating tx hash for output 0, derived for the rest.
    pub id: TxHash,
    pub holder: WalletAddress,
    pub amount: u128,
    /// Founding burn, or the merge that produced this lineage.
    pub origin: TxHash,
    /// Timestamp the expiry clock runs from. For merges, the earliest input's.
    pub expiry_source: Timestamp,
    /// Hash of the transaction that created this batch.
    pub link: TxHash,
    /// Cached revoked share of `amount`, always in `[0, amount]`.
    pub tainted: u128,
    pub constituent_origins: BTreeMap<TxHash, u128>,
    pub created_at: Timestamp,
}

impl LiveBatch {
    /// The share of this batch that can still move.
    pub fn clean_amount(&self) -> u128 {
        self.amount.saturating_sub(self.tainted)
    }

    pub fn is_fully_tainted(&self) -> bool {
        self.amount > 0 && self.tainted >= self.amount
    }

    /// `tainted / amount` for reporting; integer paths use `tainted` directly.
    pub fn tainted_fraction(&self) -> f64 {
        if self.amount == 0 {
            return 0.0;
        }
        self.tainted as f64 / self.amount as f64
    }

    pub fn is_expired(&self, now: Timestamp, expiry_secs: u64) -> bool {
        expiry::is_expired(self.expiry_source, now, expiry_secs)
    }

    /// Revoked wins over Expired so a fully tainted batch always reads as revoked.
    pub fn state(&self, now: Timestamp, expiry_secs: u64) -> TrstState {
        if self.is_fully_tainted() {
            TrstState::Revoked
        } else if self.is_expired(now, expiry_secs) {
            TrstState::Expired
        } else {
            TrstState::Active
        }
    }

    /// Demurrage-adjusted value of the clean share.
    pub fn effective_value(&self, now: Timestamp, expiry_secs: u64) -> u128 {
        expiry::effective_value(self.clean_amount(), self.expiry_source, now, expiry_secs)
    }

    pub fn touches_any<'a>(&self, mut origins: impl Iterator<Item = &'a TxHash>) -> bool {
        origins.any(|o| self.constituent_origins.contains_key(o))
    }
}

/// `floor(a × b / d)` without intermediate overflow. Requires `a <= d`, which
/// bounds the result by `b`.
pub(crate) fn mul_div_floor(a: u128, b: u128, d: u128) -> u128 {
    if d == 0 {
        return 0;
    }
    if let Some(p) = a.checked_mul(b) {
        return p / d;
    }
    let (hi, lo) = wide_mul(a, b);
    let mut rem: u128 = 0;
    let mut q: u128 = 0;
    for i in (0..256u32).rev() {
        let bit = if i >= 128 {
            (hi >> (i - 128)) & 1
        } else {
            (lo >> i) & 1
        };
        let carry = rem >> 127;
        rem = (rem << 1) | bit;
        if carry == 1 || rem >= d {
            rem = rem.wrapping_sub(d);
            if i < 128 {
                q |= 1u128 << i;
            }
        }
    }
    q
}

fn wide_mul(a: u128, b: u128) -> (u128, u128) {
    const MASK: u128 = u64::MAX as u128;
    let (a1, a0) = (a >> 64, a & MASK);
    let (b1, b0) = (b >> 64, b & MASK);
    let p00 = a0 * b0;
    let p01 = a0 * b1;
    let p10 = a1 * b0;
    let p11 = a1 * b1;
    let mid = (p00 >> 64) + (p01 & MASK) + (p10 & MASK);
    let lo = (p00 & MASK) | ((mid & MASK) << 64);
    let hi = p11 + (p01 >> 64) + (p10 >> 64) + (mid >> 64);
    (hi, lo)
}

/// Split `parts` (values summing to `total`) across `amounts` (also summing
/// to `total`), proportionally and deterministically.
///
/// Every output but the last takes the floor of its proportional share per
/// origin (capped by what is left of that origin), topped up in key order
/// until it sums to its amount; the last output takes whatever remains. Each
/// returned map sums exactly to its amount.
pub(crate) fn apportion(
    parts: &BTreeMap<TxHash, u128>,
    total: u128,
    amounts: &[u128],
) -> Vec<BTreeMap<TxHash, u128>> {
    let mut remaining = parts.clone();
    let mut out = Vec::with_capacity(amounts.len());
    let Some((_, head)) = amounts.split_last() else {
        return out;
    };
    for &amount in head {
        let mut share: BTreeMap<TxHash, u128> = BTreeMap::new();
        let mut assigned: u128 = 0;
        for (origin, &part) in parts {
            let Some(left) = remaining.get_mut(origin) else {
                continue;
            };
            let floor = mul_div_floor(part, amount, total).min(*left);
            if floor > 0 {
                *left -= floor;
                share.insert(*origin, floor);
                assigned += floor;
            }
        }
        let mut deficit = amount - assigned;
        for (origin, left) in remaining.iter_mut() {
            if deficit == 0 {
                break;
            }
            let extra = (*left).min(deficit);
            if extra > 0 {
                *left -= extra;
                deficit -= extra;
                *share.entry(*origin).or_insert(0) += extra;
            }
        }
        out.push(share);
    }
    remaining.retain(|_, left| *left > 0);
    out.push(remaining);
    out
}
