//! Concrete fixed-width values.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use num_bigint::{BigInt, BigUint};

use crate::variable::VarId;

/// A concrete bit pattern of a fixed width, stored as an unsigned integer.
///
/// The signedness is not part of the value: [`BitVector::to_i64`] and
/// [`BitVector::to_bigint`] interpret the top bit as the two's complement sign.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct BitVector {
    width: usize,
    value: BigUint,
}

impl BitVector {
    /// Keep the low `width` bits of `value`.
    pub fn new(width: usize, value: BigUint) -> Self {
        let value = if value.bits() as usize > width {
            value & ((BigUint::from(1u32) << width) - 1u32)
        } else {
            value
        };
        Self { width, value }
    }

    pub fn zero(width: usize) -> Self {
        Self {
            width,
            value: BigUint::ZERO,
        }
    }

    pub fn from_u64(width: usize, value: u64) -> Self {
        Self::new(width, BigUint::from(value))
    }

    /// Two's complement encoding of `value`, sign-extended or truncated to `width`.
    pub fn from_i64(width: usize, value: i64) -> Self {
        if value >= 0 {
            return Self::from_u64(width, value as u64);
        }
        let modulus = BigUint::from(1u32) << width.max(64);
        let magnitude = BigUint::from(value.unsigned_abs());
        Self::new(width, modulus - magnitude)
    }

    /// Least significant bit first.
    pub fn from_bits(bits: impl IntoIterator<Item = bool>) -> Self {
        let mut width = 0;
        let mut value = BigUint::ZERO;
        for bit in bits {
            if bit {
                value.set_bit(width as u64, true);
            }
            width += 1;
        }
        Self { width, value }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn value(&self) -> &BigUint {
        &self.value
    }

    pub fn bit(&self, i: usize) -> bool {
        i < self.width && self.value.bit(i as u64)
    }

    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.width).map(|i| self.bit(i))
    }

    pub fn is_zero(&self) -> bool {
        self.value == BigUint::ZERO
    }

    /// Number of bits needed to hold the value without its leading zeros (at least one).
    pub fn min_width(&self) -> usize {
        (self.value.bits() as usize).max(1)
    }

    /// Same bit pattern at another width, zero- or sign-extended.
    pub fn resize(&self, width: usize, signed: bool) -> Self {
        if width <= self.width || self.width == 0 || !(signed && self.bit(self.width - 1)) {
            return Self::new(width, self.value.clone());
        }
        let ones = (BigUint::from(1u32) << width) - (BigUint::from(1u32) << self.width);
        Self {
            width,
            value: &self.value | ones,
        }
    }

    pub fn to_u64(&self) -> Option<u64> {
        u64::try_from(&self.value).ok()
    }

    /// Value with the top bit read as the two's complement sign.
    pub fn to_bigint(&self) -> BigInt {
        if self.width > 0 && self.bit(self.width - 1) {
            BigInt::from(self.value.clone()) - (BigInt::from(1) << self.width)
        } else {
            BigInt::from(self.value.clone())
        }
    }

    pub fn to_i64(&self) -> Option<i64> {
        i64::try_from(&self.to_bigint()).ok()
    }

    /// Numeric value under the given signedness.
    pub fn to_bigint_as(&self, signed: bool) -> BigInt {
        if signed {
            self.to_bigint()
        } else {
            BigInt::from(self.value.clone())
        }
    }
}

impl Display for BitVector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}'d{}", self.width, self.value)
    }
}

/// One sampled value per variable.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Assignment {
    values: BTreeMap<VarId, BitVector>,
}

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, var: VarId, value: BitVector) {
        self.values.insert(var, value);
    }

    pub fn get(&self, var: VarId) -> Option<&BitVector> {
        self.values.get(&var)
    }

    /// Unsigned value of `var`, if it fits.
    pub fn get_u64(&self, var: VarId) -> Option<u64> {
        self.get(var).and_then(BitVector::to_u64)
    }

    /// Two's complement value of `var`, if it fits.
    pub fn get_i64(&self, var: VarId) -> Option<i64> {
        self.get(var).and_then(BitVector::to_i64)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, &BitVector)> {
        self.values.iter().map(|(&var, value)| (var, value))
    }
}

impl Display for Assignment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (var, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} = {}", var, value)?;
        }
        write!(f, "}}")
    }
}
