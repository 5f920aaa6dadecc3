//! Bit-vector domains: one integer value as a vector of decision functions.
//!
//! A [`Bvd`] holds one [`Ref`] per bit, least significant bit first, and a signedness
//! flag. A bit whose function is a terminal is known statically, so a vector made of
//! terminals only is a constant. The symbolic operators live in [`arith`][crate::arith].

use crate::reference::Ref;
use crate::value::BitVector;

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Bvd {
    bits: Vec<Ref>,
    signed: bool,
}

impl Bvd {
    pub fn new(bits: Vec<Ref>, signed: bool) -> Self {
        Self { bits, signed }
    }

    pub fn zeros(width: usize, signed: bool) -> Self {
        Self::new(vec![Ref::ZERO; width], signed)
    }

    /// Constant vector holding `value`.
    pub fn constant(value: &BitVector, signed: bool) -> Self {
        let bits = value.bits().map(|b| if b { Ref::ONE } else { Ref::ZERO }).collect();
        Self::new(bits, signed)
    }

    pub fn from_u64(width: usize, value: u64, signed: bool) -> Self {
        Self::constant(&BitVector::from_u64(width, value), signed)
    }

    /// Unsigned constant of minimal width (at least one bit).
    pub fn from_usize(value: usize) -> Self {
        let width = (usize::BITS - value.leading_zeros()).max(1) as usize;
        Self::from_u64(width, value as u64, false)
    }

    /// One-bit unsigned vector of a boolean function.
    pub fn from_bool(bit: Ref) -> Self {
        Self::new(vec![bit], false)
    }

    pub fn bits(&self) -> &[Ref] {
        &self.bits
    }

    pub fn bit(&self, i: usize) -> Ref {
        self.bits[i]
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn with_signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    pub fn msb(&self) -> Ref {
        self.bits.last().copied().unwrap_or(Ref::ZERO)
    }

    /// Sign bit: the top bit of a signed vector, constant zero for an unsigned one.
    pub fn sign(&self) -> Ref {
        if self.signed {
            self.msb()
        } else {
            Ref::ZERO
        }
    }

    pub fn is_const(&self) -> bool {
        self.bits.iter().all(|b| b.id() == 0)
    }

    /// Every bit is the constant zero.
    pub fn is_zero(&self) -> bool {
        self.bits.iter().all(|&b| b == Ref::ZERO)
    }

    /// Signed with a constant-one sign bit.
    pub fn is_negative(&self) -> bool {
        self.signed && self.msb() == Ref::ONE
    }

    pub fn value(&self) -> Option<BitVector> {
        if !self.is_const() {
            return None;
        }
        Some(BitVector::from_bits(self.bits.iter().map(|&b| b == Ref::ONE)))
    }

    /// Resize to `width`, extending with the sign bit (signed) or zero (unsigned), or truncating.
    pub fn coerce(&self, width: usize) -> Bvd {
        let mut bits = self.bits.clone();
        let fill = self.sign();
        bits.resize(width, fill);
        Bvd::new(bits, self.signed)
    }

    pub fn map(&self, f: impl FnMut(Ref) -> Ref) -> Bvd {
        Bvd::new(self.bits.iter().copied().map(f).collect(), self.signed)
    }
}

/// Coerce both operands to the wider of the two lengths.
pub fn equalize(a: &Bvd, b: &Bvd) -> (Bvd, Bvd) {
    let n = a.len().max(b.len());
    (a.coerce(n), b.coerce(n))
}
