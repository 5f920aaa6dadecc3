//! Symbolic arithmetic and relational operators over [`Bvd`]s.
//!
//! Every operator builds fresh functions in the [`Bdd`] and leaves its operands
//! untouched. Operands of a binary operator are first brought to a common length by
//! sign- or zero-extension, depending on their own signedness. Lengths only grow.
//!
//! # Mixed signedness
//!
//! When exactly one operand is signed:
//!
//! - a statically negative signed operand is never equal to an unsigned one,
//!   it is always `<=` an unsigned one, and an unsigned operand is never `<=` it;
//! - symbolically, the same rules are applied to the sign bit of the signed operand;
//! - in arithmetic, the unsigned operand is widened by one zero bit first, so that
//!   its top bit is never read as a sign.
//!
//! # Arithmetic width
//!
//! `add`, `sub`, `mul`, `div` and `rem` take a target `width`: the operands are
//! extended to `max(width, len(a), len(b))` bits and the result has that many bits.
//! A carry out of a narrow operand is thus kept as an extra bit, while overflow of
//! the target width wraps around (two's complement, no saturation).

use crate::bdd::Bdd;
use crate::bitvec::{equalize, Bvd};
use crate::error::ArithmeticError;
use crate::reference::Ref;

impl Bdd {
    fn ite_vec(&self, cond: Ref, then: &Bvd, other: &Bvd) -> Bvd {
        debug_assert_eq!(then.len(), other.len());
        let bits = then
            .bits()
            .iter()
            .zip(other.bits())
            .map(|(&t, &e)| self.apply_ite(cond, t, e))
            .collect();
        Bvd::new(bits, then.is_signed())
    }

    /// Bring both operands to `max(width, len(a), len(b))` bits, widening an unsigned
    /// operand by one bit first if the other one is signed.
    fn arith_operands(a: &Bvd, b: &Bvd, width: usize) -> (Bvd, Bvd, usize) {
        let widen = |v: &Bvd| if v.is_signed() { v.clone() } else { v.coerce(v.len() + 1) };
        let (a, b) = match (a.is_signed(), b.is_signed()) {
            (true, false) => (a.clone(), widen(b)),
            (false, true) => (widen(a), b.clone()),
            _ => (a.clone(), b.clone()),
        };
        let n = width.max(a.len()).max(b.len());
        (a.coerce(n), b.coerce(n), n)
    }

    /// `a + b + carry` over equal-length operands, dropping the final carry.
    fn ripple_add(&self, a: &Bvd, b: &Bvd, carry: Ref) -> Vec<Ref> {
        let mut carry = carry;
        let mut bits = Vec::with_capacity(a.len());
        for (&x, &y) in a.bits().iter().zip(b.bits()) {
            let half = self.apply_xor(x, y);
            bits.push(self.apply_xor(half, carry));
            carry = self.apply_or(self.apply_and(x, y), self.apply_and(carry, half));
        }
        bits
    }

    /// Two's complement at the same width.
    fn negate(&self, a: &Bvd) -> Bvd {
        let inverted = a.map(|b| -b);
        let zero = Bvd::zeros(a.len(), a.is_signed());
        Bvd::new(self.ripple_add(&inverted, &zero, self.one), a.is_signed())
    }

    /// Magnitude of a signed vector, as an unsigned pattern of the same length.
    fn magnitude(&self, a: &Bvd) -> Bvd {
        let m = if a.is_signed() {
            self.ite_vec(a.sign(), &self.negate(a), a)
        } else {
            a.clone()
        };
        m.with_signed(false)
    }

    // ----------------------------------------------------------------------------
    // Relational
    // ----------------------------------------------------------------------------

    pub fn bv_eq(&self, a: &Bvd, b: &Bvd) -> Ref {
        let mixed = a.is_signed() != b.is_signed();
        if mixed && (a.is_negative() || b.is_negative()) {
            return self.zero;
        }
        let (x, y) = equalize(a, b);
        let mut res = self.one;
        for (&p, &q) in x.bits().iter().zip(y.bits()) {
            res = self.apply_and(res, self.apply_eq(p, q));
            if self.is_zero(res) {
                return res;
            }
        }
        if mixed {
            let sign = if x.is_signed() { x.sign() } else { y.sign() };
            res = self.apply_and(res, -sign);
        }
        res
    }

    pub fn bv_neq(&self, a: &Bvd, b: &Bvd) -> Ref {
        -self.bv_eq(a, b)
    }

    pub fn bv_le(&self, a: &Bvd, b: &Bvd) -> Ref {
        if a.is_signed() != b.is_signed() {
            if a.is_negative() {
                return self.one;
            }
            if b.is_negative() {
                return self.zero;
            }
        }
        let (x, y) = equalize(a, b);

        // Scan from the top: `equal` while every bit so far matched, `less` once x had a 0 where y had a 1.
        let mut equal = self.one;
        let mut less = self.zero;
        for (&p, &q) in x.bits().iter().zip(y.bits()).rev() {
            let here = self.apply_and(-p, q);
            less = self.apply_or(less, self.apply_and(equal, here));
            equal = self.apply_and(equal, self.apply_eq(p, q));
        }
        let magnitude = self.apply_or(less, equal);

        let (sx, sy) = (x.sign(), y.sign());
        match (x.is_signed(), y.is_signed()) {
            (true, true) => {
                let neg_x = self.apply_ite(sy, magnitude, self.one);
                let pos_x = self.apply_ite(sy, self.zero, magnitude);
                self.apply_ite(sx, neg_x, pos_x)
            }
            (true, false) => self.apply_or(sx, magnitude),
            (false, true) => self.apply_and(-sy, magnitude),
            (false, false) => magnitude,
        }
    }

    pub fn bv_lt(&self, a: &Bvd, b: &Bvd) -> Ref {
        self.apply_and(self.bv_neq(a, b), self.bv_le(a, b))
    }

    pub fn bv_gt(&self, a: &Bvd, b: &Bvd) -> Ref {
        self.bv_lt(b, a)
    }

    pub fn bv_ge(&self, a: &Bvd, b: &Bvd) -> Ref {
        self.apply_or(self.bv_eq(a, b), self.bv_gt(a, b))
    }

    // ----------------------------------------------------------------------------
    // Bitwise
    // ----------------------------------------------------------------------------

    fn zip_with(&self, a: &Bvd, b: &Bvd, op: impl Fn(Ref, Ref) -> Ref) -> Bvd {
        let (x, y) = equalize(a, b);
        let bits = x.bits().iter().zip(y.bits()).map(|(&p, &q)| op(p, q)).collect();
        Bvd::new(bits, a.is_signed() || b.is_signed())
    }

    pub fn bv_and(&self, a: &Bvd, b: &Bvd) -> Bvd {
        self.zip_with(a, b, |p, q| self.apply_and(p, q))
    }

    pub fn bv_or(&self, a: &Bvd, b: &Bvd) -> Bvd {
        self.zip_with(a, b, |p, q| self.apply_or(p, q))
    }

    pub fn bv_xor(&self, a: &Bvd, b: &Bvd) -> Bvd {
        self.zip_with(a, b, |p, q| self.apply_xor(p, q))
    }

    pub fn bv_not(&self, a: &Bvd) -> Bvd {
        a.map(|b| -b)
    }

    pub fn bv_reduce_and(&self, a: &Bvd) -> Ref {
        self.apply_and_many(a.bits().iter().copied())
    }

    /// Also the boolean reading of a vector (`a != 0`).
    pub fn bv_reduce_or(&self, a: &Bvd) -> Ref {
        self.apply_or_many(a.bits().iter().copied())
    }

    pub fn bv_reduce_xor(&self, a: &Bvd) -> Ref {
        a.bits().iter().fold(self.zero, |acc, &b| self.apply_xor(acc, b))
    }

    // ----------------------------------------------------------------------------
    // Arithmetic
    // ----------------------------------------------------------------------------

    /// Two's complement negation. An unsigned operand is widened by one bit and the result is signed.
    pub fn bv_neg(&self, a: &Bvd) -> Bvd {
        if a.is_signed() {
            self.negate(a)
        } else {
            self.negate(&a.coerce(a.len() + 1).with_signed(true))
        }
    }

    pub fn bv_add(&self, a: &Bvd, b: &Bvd, width: usize) -> Bvd {
        let (x, y, _) = Self::arith_operands(a, b, width);
        Bvd::new(self.ripple_add(&x, &y, self.zero), a.is_signed() || b.is_signed())
    }

    pub fn bv_sub(&self, a: &Bvd, b: &Bvd, width: usize) -> Bvd {
        let (x, y, _) = Self::arith_operands(a, b, width);
        let inverted = self.bv_not(&y);
        Bvd::new(self.ripple_add(&x, &inverted, self.one), a.is_signed() || b.is_signed())
    }

    pub fn bv_mul(&self, a: &Bvd, b: &Bvd, width: usize) -> Bvd {
        let signed = a.is_signed() || b.is_signed();
        let (x, y, n) = Self::arith_operands(a, b, width);
        if a.is_zero() || b.is_zero() {
            return Bvd::zeros(n, signed);
        }

        let (mx, my) = (self.magnitude(&x), self.magnitude(&y));
        // Walk the bits of the constant (or narrower) factor, shifting the other one.
        let (mut shifted, multiplier) = if my.is_const() || (!mx.is_const() && b.len() <= a.len()) {
            (mx, my)
        } else {
            (my, mx)
        };

        let mut product = Bvd::zeros(n, false);
        for &bit in multiplier.bits() {
            if !self.is_zero(bit) {
                let sum = Bvd::new(self.ripple_add(&product, &shifted, self.zero), false);
                product = self.ite_vec(bit, &sum, &product);
            }
            let mut bits = vec![self.zero];
            bits.extend_from_slice(&shifted.bits()[..n - 1]);
            shifted = Bvd::new(bits, false);
        }

        let sign = self.apply_xor(x.sign(), y.sign());
        let negated = self.negate(&product);
        self.ite_vec(sign, &negated, &product).with_signed(signed)
    }

    /// Quotient and remainder, truncating toward zero.
    ///
    /// The quotient takes the sign of `a ^ b`, the remainder the sign of `a`.
    pub fn bv_divmod(&self, a: &Bvd, b: &Bvd, width: usize) -> Result<(Bvd, Bvd), ArithmeticError> {
        if b.is_zero() {
            return Err(ArithmeticError::DivideByZero);
        }
        let signed = a.is_signed() || b.is_signed();
        let (x, y, n) = Self::arith_operands(a, b, width);
        if a.is_zero() {
            return Ok((Bvd::zeros(n, signed), Bvd::zeros(n, signed)));
        }

        let dividend = self.magnitude(&x).coerce(2 * n);
        let divisor = self.magnitude(&y).coerce(2 * n);

        // Restoring division: try the divisor shifted by n-1, ..., 0 against the running remainder.
        let mut rem = dividend;
        let mut quotient = vec![self.zero; n];
        for i in (0..n).rev() {
            let mut bits = vec![self.zero; i];
            bits.extend_from_slice(&divisor.bits()[..2 * n - i]);
            let step = Bvd::new(bits, false);
            let fits = self.bv_le(&step, &rem);
            let inverted = self.bv_not(&step);
            let diff = Bvd::new(self.ripple_add(&rem, &inverted, self.one), false);
            rem = self.ite_vec(fits, &diff, &rem);
            quotient[i] = fits;
        }

        let quotient = Bvd::new(quotient, false);
        let rem = rem.coerce(n);
        let q_sign = self.apply_xor(x.sign(), y.sign());
        let quotient = self.ite_vec(q_sign, &self.negate(&quotient), &quotient);
        let rem = self.ite_vec(x.sign(), &self.negate(&rem), &rem);
        Ok((quotient.with_signed(signed), rem.with_signed(signed)))
    }

    pub fn bv_div(&self, a: &Bvd, b: &Bvd, width: usize) -> Result<Bvd, ArithmeticError> {
        Ok(self.bv_divmod(a, b, width)?.0)
    }

    pub fn bv_rem(&self, a: &Bvd, b: &Bvd, width: usize) -> Result<Bvd, ArithmeticError> {
        Ok(self.bv_divmod(a, b, width)?.1)
    }

    // ----------------------------------------------------------------------------
    // Shifts
    // ----------------------------------------------------------------------------

    pub fn bv_shl(&self, a: &Bvd, amount: &Bvd) -> Result<Bvd, ArithmeticError> {
        self.shift(a, amount, true, self.zero)
    }

    /// Right shift. An arithmetic shift fills with the sign bit (zero for unsigned operands).
    pub fn bv_shr(&self, a: &Bvd, amount: &Bvd, arithmetic: bool) -> Result<Bvd, ArithmeticError> {
        let fill = if arithmetic { a.sign() } else { self.zero };
        self.shift(a, amount, false, fill)
    }

    fn shift(&self, a: &Bvd, amount: &Bvd, left: bool, fill: Ref) -> Result<Bvd, ArithmeticError> {
        if a.is_zero() || amount.is_zero() {
            return Ok(a.clone());
        }
        let len = a.len();
        let source = |j: isize| -> Ref {
            if (0..len as isize).contains(&j) {
                a.bit(j as usize)
            } else if j < 0 {
                self.zero
            } else {
                fill
            }
        };

        if let Some(value) = amount.value() {
            if amount.is_negative() {
                let shift = value.to_i64().unwrap_or(i64::MIN);
                return Err(ArithmeticError::NegativeShift(shift));
            }
            let k = value.to_u64().map_or(len, |k| k.min(len as u64) as usize) as isize;
            let bits = (0..len as isize)
                .map(|j| if left { source(j - k) } else { source(j + k) })
                .collect();
            return Ok(Bvd::new(bits, a.is_signed()));
        }

        let overflow = self.bv_ge(amount, &Bvd::from_usize(len));
        let selects: Vec<Ref> = (0..len).map(|k| self.bv_eq(amount, &Bvd::from_usize(k))).collect();
        let bits = (0..len as isize)
            .map(|j| {
                let picked = self.apply_or_many(selects.iter().enumerate().map(|(k, &sel)| {
                    let k = k as isize;
                    let bit = if left { source(j - k) } else { source(j + k) };
                    self.apply_and(sel, bit)
                }));
                self.apply_ite(overflow, fill, picked)
            })
            .collect();
        Ok(Bvd::new(bits, a.is_signed()))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::value::BitVector;

    /// Symbolic vector over consecutive decision variables starting at `first`.
    fn symbolic(bdd: &Bdd, first: u32, width: usize, signed: bool) -> Bvd {
        Bvd::new((0..width as u32).map(|i| bdd.mk_var(first + i)).collect(), signed)
    }

    fn constant(value: i64, width: usize, signed: bool) -> Bvd {
        Bvd::constant(&BitVector::from_i64(width, value), signed)
    }

    /// Value of `v` when the decision variables hold the bits of `input`.
    fn eval_vec(bdd: &Bdd, v: &Bvd, input: u64) -> i64 {
        let bits = v.bits().iter().map(|&b| bdd.eval(b, |var| input >> (var - 1) & 1 != 0));
        let value = BitVector::from_bits(bits);
        if v.is_signed() {
            value.to_i64().unwrap()
        } else {
            value.to_u64().unwrap() as i64
        }
    }

    fn eval_bool(bdd: &Bdd, f: Ref, input: u64) -> bool {
        bdd.eval(f, |var| input >> (var - 1) & 1 != 0)
    }

    /// Interpret the low `width` bits of `bits` under the given signedness.
    fn decode(bits: u64, width: usize, signed: bool) -> i64 {
        let v = bits & ((1 << width) - 1);
        if signed && v >> (width - 1) & 1 == 1 {
            v as i64 - (1 << width)
        } else {
            v as i64
        }
    }

    fn wrap(value: i64, width: usize, signed: bool) -> i64 {
        decode(value as u64, width, signed)
    }

    #[test]
    fn test_constant_folding() {
        let bdd = Bdd::default();
        let a = constant(6, 8, false);
        let b = constant(3, 8, false);
        assert_eq!(bdd.bv_add(&a, &b, 8).value().unwrap().to_u64(), Some(9));
        assert_eq!(bdd.bv_sub(&a, &b, 8).value().unwrap().to_u64(), Some(3));
        assert_eq!(bdd.bv_mul(&a, &b, 8).value().unwrap().to_u64(), Some(18));
        assert_eq!(bdd.bv_div(&a, &b, 8).unwrap().value().unwrap().to_u64(), Some(2));
        assert_eq!(bdd.bv_rem(&b, &a, 8).unwrap().value().unwrap().to_u64(), Some(3));
        assert_eq!(bdd.bv_eq(&a, &b), bdd.zero);
        assert_eq!(bdd.bv_le(&b, &a), bdd.one);
        assert_eq!(bdd.bv_gt(&b, &a), bdd.zero);
    }

    #[test]
    fn test_add_keeps_carry_when_widened() {
        let bdd = Bdd::default();
        let a = constant(200, 8, false);
        let b = constant(100, 8, false);
        assert_eq!(bdd.bv_add(&a, &b, 8).value().unwrap().to_u64(), Some(44));
        let wide = bdd.bv_add(&a, &b, 16);
        assert_eq!(wide.len(), 16);
        assert_eq!(wide.value().unwrap().to_u64(), Some(300));
    }

    #[test]
    fn test_signed_constant_arith() {
        let bdd = Bdd::default();
        let a = constant(-7, 8, true);
        let b = constant(2, 8, true);
        let v = |x: Bvd| x.value().unwrap().to_i64().unwrap();
        assert_eq!(v(bdd.bv_add(&a, &b, 8)), -5);
        assert_eq!(v(bdd.bv_mul(&a, &b, 8)), -14);
        assert_eq!(v(bdd.bv_div(&a, &b, 8).unwrap()), -3);
        assert_eq!(v(bdd.bv_rem(&a, &b, 8).unwrap()), -1);
        assert_eq!(v(bdd.bv_neg(&a)), 7);
    }

    #[test]
    fn test_neg_unsigned_widens() {
        let bdd = Bdd::default();
        let a = constant(255, 8, false);
        let n = bdd.bv_neg(&a);
        assert_eq!(n.len(), 9);
        assert!(n.is_signed());
        assert_eq!(n.value().unwrap().to_i64(), Some(-255));
    }

    #[test]
    fn test_divide_by_zero() {
        let bdd = Bdd::default();
        let a = symbolic(&bdd, 1, 4, false);
        let zero = constant(0, 32, true);
        assert_eq!(bdd.bv_div(&a, &zero, 32), Err(ArithmeticError::DivideByZero));
        assert_eq!(bdd.bv_rem(&a, &zero, 32), Err(ArithmeticError::DivideByZero));
    }

    #[test]
    fn test_mixed_sign_rules() {
        let bdd = Bdd::default();
        let minus_one = constant(-1, 8, true);
        let max = constant(255, 8, false);
        assert_eq!(bdd.bv_le(&minus_one, &max), bdd.one);
        assert_eq!(bdd.bv_le(&max, &minus_one), bdd.zero);
        assert_eq!(bdd.bv_eq(&minus_one, &max), bdd.zero);
        assert_eq!(bdd.bv_lt(&minus_one, &max), bdd.one);
    }

    #[test]
    fn test_symbolic_relations_exhaustive() {
        let bdd = Bdd::default();
        for (sa, sb) in [(false, false), (true, true), (true, false), (false, true)] {
            let a = symbolic(&bdd, 1, 3, sa);
            let b = symbolic(&bdd, 4, 4, sb);
            let eq = bdd.bv_eq(&a, &b);
            let le = bdd.bv_le(&a, &b);
            let lt = bdd.bv_lt(&a, &b);
            let ge = bdd.bv_ge(&a, &b);
            for input in 0..128u64 {
                let x = decode(input, 3, sa);
                let y = decode(input >> 3, 4, sb);
                assert_eq!(eval_bool(&bdd, eq, input), x == y, "{} == {}", x, y);
                assert_eq!(eval_bool(&bdd, le, input), x <= y, "{} <= {}", x, y);
                assert_eq!(eval_bool(&bdd, lt, input), x < y, "{} < {}", x, y);
                assert_eq!(eval_bool(&bdd, ge, input), x >= y, "{} >= {}", x, y);
            }
        }
    }

    #[test]
    fn test_symbolic_arith_exhaustive() {
        let bdd = Bdd::default();
        for signed in [false, true] {
            let a = symbolic(&bdd, 1, 4, signed);
            let b = symbolic(&bdd, 5, 4, signed);
            let sum = bdd.bv_add(&a, &b, 6);
            let diff = bdd.bv_sub(&a, &b, 6);
            let prod = bdd.bv_mul(&a, &b, 6);
            let quot = bdd.bv_div(&a, &b, 6).unwrap();
            let rem = bdd.bv_rem(&a, &b, 6).unwrap();
            for input in 0..256u64 {
                let x = decode(input, 4, signed);
                let y = decode(input >> 4, 4, signed);
                assert_eq!(eval_vec(&bdd, &sum, input), wrap(x + y, 6, signed));
                assert_eq!(eval_vec(&bdd, &diff, input), wrap(x - y, 6, signed));
                assert_eq!(eval_vec(&bdd, &prod, input), wrap(x * y, 6, signed));
                if y != 0 {
                    assert_eq!(eval_vec(&bdd, &quot, input), wrap(x / y, 6, signed), "{} / {}", x, y);
                    assert_eq!(eval_vec(&bdd, &rem, input), wrap(x % y, 6, signed), "{} % {}", x, y);
                }
            }
        }
    }

    #[test]
    fn test_symbolic_shifts_exhaustive() {
        let bdd = Bdd::default();
        let a = symbolic(&bdd, 1, 4, true);
        let k = symbolic(&bdd, 5, 3, false);
        let shl = bdd.bv_shl(&a, &k).unwrap();
        let sar = bdd.bv_shr(&a, &k, true).unwrap();
        let shr = bdd.bv_shr(&a, &k, false).unwrap();
        for input in 0..128u64 {
            let x = decode(input, 4, true);
            let s = (input >> 4) as u32;
            let pattern = (input & 0xf) as i64;
            assert_eq!(eval_vec(&bdd, &shl, input), wrap(if s >= 4 { 0 } else { x << s }, 4, true));
            assert_eq!(eval_vec(&bdd, &sar, input), x >> s.min(3));
            assert_eq!(eval_vec(&bdd, &shr, input), wrap(if s >= 4 { 0 } else { pattern >> s }, 4, true));
        }
    }

    #[test]
    fn test_constant_shifts() {
        let bdd = Bdd::default();
        let a = constant(0b1011, 4, false);
        let v = |x: Bvd| x.value().unwrap().to_u64().unwrap();
        assert_eq!(v(bdd.bv_shl(&a, &constant(1, 32, true)).unwrap()), 0b0110);
        assert_eq!(v(bdd.bv_shr(&a, &constant(2, 32, true), false).unwrap()), 0b0010);
        assert_eq!(v(bdd.bv_shl(&a, &constant(9, 32, true)).unwrap()), 0);
        assert_eq!(
            bdd.bv_shl(&a, &constant(-1, 32, true)),
            Err(ArithmeticError::NegativeShift(-1))
        );
    }

    #[test]
    fn test_reductions() {
        let bdd = Bdd::default();
        let a = symbolic(&bdd, 1, 3, false);
        let and = bdd.bv_reduce_and(&a);
        let or = bdd.bv_reduce_or(&a);
        let xor = bdd.bv_reduce_xor(&a);
        for input in 0..8u64 {
            assert_eq!(eval_bool(&bdd, and, input), input == 7);
            assert_eq!(eval_bool(&bdd, or, input), input != 0);
            assert_eq!(eval_bool(&bdd, xor, input), input.count_ones() % 2 == 1);
        }
    }
}
