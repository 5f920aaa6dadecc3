//! Weighted random walk over a solved predicate.
//!
//! Starting from the root, each step follows the low or the high edge with
//! probability proportional to the number of satisfying assignments below it, which
//! makes the complete walk pick every satisfying assignment with the same
//! probability. Levels the walk never tests are filled with uniform random bits
//! at the end.

use num_bigint::BigUint;
use rand::RngCore;

use crate::bdd::Bdd;
use crate::reference::Ref;
use crate::sat::Weights;
use crate::value::BitVector;

/// Source of random bits. Owned by the caller, never seeded here.
pub trait Entropy {
    /// `n <= 64` random bits, in the low bits of the result.
    fn next_bits(&mut self, n: u32) -> u64;

    /// Uniformly random vector of `n` bits.
    fn next_bit_vector(&mut self, n: usize) -> BitVector {
        let mut value = BigUint::ZERO;
        let mut filled = 0;
        while filled < n {
            let k = (n - filled).min(64);
            value |= BigUint::from(self.next_bits(k as u32)) << filled;
            filled += k;
        }
        BitVector::new(n, value)
    }
}

impl<R: RngCore + ?Sized> Entropy for R {
    fn next_bits(&mut self, n: u32) -> u64 {
        match n {
            0 => 0,
            64.. => self.next_u64(),
            _ => self.next_u64() >> (64 - n),
        }
    }
}

/// Uniform value in `0..bound` by rejection sampling. `bound` must be positive.
pub fn uniform_below<E: Entropy + ?Sized>(entropy: &mut E, bound: &BigUint) -> BigUint {
    debug_assert!(*bound > BigUint::ZERO);
    let bits = bound.bits() as usize;
    loop {
        let candidate = entropy.next_bit_vector(bits);
        if candidate.value() < bound {
            return candidate.value().clone();
        }
    }
}

/// One satisfying assignment of `root`, one value per level, or `None` if `root` is unsatisfiable.
///
/// `weights` must count over `num_levels` variables.
pub fn random_walk<E: Entropy + ?Sized>(
    bdd: &Bdd,
    root: Ref,
    weights: &mut Weights,
    num_levels: usize,
    entropy: &mut E,
) -> Option<Vec<bool>> {
    if weights.count(bdd, root) == BigUint::ZERO {
        return None;
    }

    let mut bits = vec![None; num_levels];
    let mut node = root;
    while !bdd.is_terminal(node) {
        let v = bdd.variable(node.id()) as usize;
        let low = bdd.low_node(node);
        let high = bdd.high_node(node);
        let w_low = weights.count(bdd, low);
        let w_high = weights.count(bdd, high);

        let take_high = if w_low == BigUint::ZERO {
            true
        } else if w_high == BigUint::ZERO {
            false
        } else if w_low == w_high {
            entropy.next_bits(1) == 1
        } else {
            uniform_below(entropy, &(&w_low + &w_high)) >= w_low
        };

        if let Some(slot) = bits.get_mut(v - 1) {
            *slot = Some(take_high);
        }
        node = if take_high { high } else { low };
    }
    debug_assert!(bdd.is_one(node));

    // Don't-care levels: skipped between tested nodes or below the last one.
    let free: Vec<usize> = (0..num_levels).filter(|&i| bits[i].is_none()).collect();
    let fill = entropy.next_bit_vector(free.len());
    for (k, &i) in free.iter().enumerate() {
        bits[i] = Some(fill.bit(k));
    }
    Some(bits.into_iter().map(|b| b.unwrap_or(false)).collect())
}
