//! Opaque numeric value carried by Number nodes.
//!
//! Role
//! - Three internal arms: arbitrary-precision integer, binary float, complex.
//! - Only the host-boundary conversion contract is interesting: machine-word
//!   fast path plus a base-256 big-endian digest for anything larger, and
//!   strict (never silently lossy) float/complex extraction.
//!
//! Arithmetic promotes int -> float -> complex; operators always return new
//! values.
use num_bigint::{BigInt, Sign};

use crate::error::{ExprError, ExprResult};

#[derive(Clone, PartialEq)]
enum Repr {
    Int(BigInt),
    Float(f64),
    Complex { re: f64, im: f64 },
}

/// Arbitrary-precision number value.
#[derive(Clone, PartialEq)]
pub struct Number(Repr);

impl Number {
    pub fn zero() -> Self {
        Number(Repr::Int(BigInt::default()))
    }

    pub fn from_f64(value: f64) -> Self {
        Number(Repr::Float(value))
    }

    pub fn complex(re: f64, im: f64) -> Self {
        Number(Repr::Complex { re, im })
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.0, Repr::Int(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self.0, Repr::Float(_))
    }

    pub fn is_complex(&self) -> bool {
        matches!(self.0, Repr::Complex { .. })
    }

    pub fn is_zero(&self) -> bool {
        match &self.0 {
            Repr::Int(i) => i.sign() == Sign::NoSign,
            Repr::Float(f) => *f == 0.0,
            Repr::Complex { re, im } => *re == 0.0 && *im == 0.0,
        }
    }

    pub fn is_negative(&self) -> bool {
        match &self.0 {
            Repr::Int(i) => i.sign() == Sign::Minus,
            Repr::Float(f) => *f < 0.0,
            Repr::Complex { .. } => false,
        }
    }

    // ---------------- Host-boundary conversion contract ----------------

    /// Rebuild an integer from its base-256 big-endian digest.
    ///
    /// The accumulation is `value = value * 256 + byte`, then negation; this is
    /// the documented overflow path for host integers wider than a machine
    /// word.
    pub fn from_bytes_be(negative: bool, bytes: &[u8]) -> Self {
        let mut value = BigInt::default();
        for byte in bytes {
            value = value * 256 + BigInt::from(*byte);
        }
        if negative {
            value = -value;
        }
        Number(Repr::Int(value))
    }

    /// Sign and base-256 big-endian digest of an integer value.
    pub fn to_bytes_be(&self) -> ExprResult<(bool, Vec<u8>)> {
        match &self.0 {
            Repr::Int(i) => Ok((i.sign() == Sign::Minus, i.magnitude().to_bytes_be())),
            _ => Err(ExprError::Unrepresentable { target: "integer" }),
        }
    }

    /// Machine-word fast path of the integer contract.
    pub fn try_to_i64(&self) -> ExprResult<i64> {
        match &self.0 {
            Repr::Int(i) => {
                i64::try_from(i).map_err(|_| ExprError::Unrepresentable { target: "i64" })
            }
            _ => Err(ExprError::Unrepresentable { target: "i64" }),
        }
    }

    /// Extract the float arm. Integers do not convert silently.
    pub fn try_to_f64(&self) -> ExprResult<f64> {
        match &self.0 {
            Repr::Float(f) => Ok(*f),
            _ => Err(ExprError::Unrepresentable { target: "f64" }),
        }
    }

    /// Extract the complex arm as a `(re, im)` pair.
    pub fn try_to_complex(&self) -> ExprResult<(f64, f64)> {
        match &self.0 {
            Repr::Complex { re, im } => Ok((*re, *im)),
            _ => Err(ExprError::Unrepresentable { target: "complex" }),
        }
    }

    /// Lossy float approximation for numeric evaluation; `None` for complex.
    /// Not part of the strict host conversion contract.
    pub fn approx_f64(&self) -> Option<f64> {
        match &self.0 {
            Repr::Complex { .. } => None,
            _ => Some(self.promote_f64()),
        }
    }

    /// Approximate this value as a float, regardless of arm. Used internally
    /// for promotion, not part of the strict conversion contract.
    fn promote_f64(&self) -> f64 {
        match &self.0 {
            Repr::Int(i) => int_to_f64(i),
            Repr::Float(f) => *f,
            Repr::Complex { re, .. } => *re,
        }
    }

    fn promote_complex(&self) -> (f64, f64) {
        match &self.0 {
            Repr::Complex { re, im } => (*re, *im),
            _ => (self.promote_f64(), 0.0),
        }
    }

    // ---------------- Arithmetic ----------------

    /// Raise to a power. `None` when the combination has no numeric result
    /// here (complex operands are left symbolic by the engine).
    pub fn checked_pow(&self, exponent: &Number) -> Option<Number> {
        match (&self.0, &exponent.0) {
            (Repr::Int(base), Repr::Int(exp)) => {
                if exp.sign() == Sign::Minus {
                    let b = int_to_f64(base);
                    Some(Number(Repr::Float(b.powf(int_to_f64(exp)))))
                } else {
                    Some(Number(Repr::Int(int_pow(base, exp)?)))
                }
            }
            (Repr::Complex { .. }, _) | (_, Repr::Complex { .. }) => None,
            _ => Some(Number(Repr::Float(
                self.promote_f64().powf(exponent.promote_f64()),
            ))),
        }
    }

    /// Bitwise AND, integers only.
    pub fn bit_and(&self, other: &Number) -> Option<Number> {
        self.int_pair(other).map(|(a, b)| Number(Repr::Int(a & b)))
    }

    /// Bitwise OR, integers only.
    pub fn bit_or(&self, other: &Number) -> Option<Number> {
        self.int_pair(other).map(|(a, b)| Number(Repr::Int(a | b)))
    }

    /// Bitwise XOR, integers only.
    pub fn bit_xor(&self, other: &Number) -> Option<Number> {
        self.int_pair(other).map(|(a, b)| Number(Repr::Int(a ^ b)))
    }

    /// Left shift, integers only; the shift amount must be a non-negative
    /// integer.
    pub fn shift_left(&self, bits: &Number) -> Option<Number> {
        let (value, bits) = self.int_pair(bits)?;
        let bits = usize::try_from(bits).ok()?;
        Some(Number(Repr::Int(value << bits)))
    }

    /// Arithmetic right shift, integers only; rounds toward negative
    /// infinity.
    pub fn shift_right(&self, bits: &Number) -> Option<Number> {
        let (value, bits) = self.int_pair(bits)?;
        let bits = usize::try_from(bits).ok()?;
        Some(Number(Repr::Int(value >> bits)))
    }

    fn int_pair<'a>(&'a self, other: &'a Number) -> Option<(&'a BigInt, &'a BigInt)> {
        match (&self.0, &other.0) {
            (Repr::Int(a), Repr::Int(b)) => Some((a, b)),
            _ => None,
        }
    }
}

fn int_to_f64(value: &BigInt) -> f64 {
    if let Ok(small) = i64::try_from(value) {
        return small as f64;
    }
    let mut out = 0.0f64;
    for byte in value.magnitude().to_bytes_be() {
        out = out * 256.0 + byte as f64;
    }
    if value.sign() == Sign::Minus { -out } else { out }
}

// Exact exponentiation by squaring; bails out on absurd exponents so folding
// stays bounded.
fn int_pow(base: &BigInt, exp: &BigInt) -> Option<BigInt> {
    let exp = u32::try_from(exp).ok()?;
    let mut result = BigInt::from(1);
    let mut acc = base.clone();
    let mut exp = exp;
    while exp > 0 {
        if exp & 1 == 1 {
            result = &result * &acc;
        }
        exp >>= 1;
        if exp > 0 {
            acc = &acc * &acc;
        }
    }
    Some(result)
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number(Repr::Int(BigInt::from(value)))
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number(Repr::Int(BigInt::from(value)))
    }
}

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        Number(Repr::Int(BigInt::from(value)))
    }
}

impl From<u32> for Number {
    fn from(value: u32) -> Self {
        Number(Repr::Int(BigInt::from(value)))
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number(Repr::Float(value))
    }
}

impl From<(f64, f64)> for Number {
    fn from((re, im): (f64, f64)) -> Self {
        Number(Repr::Complex { re, im })
    }
}

impl From<BigInt> for Number {
    fn from(value: BigInt) -> Self {
        Number(Repr::Int(value))
    }
}

impl std::ops::Neg for Number {
    type Output = Number;

    fn neg(self) -> Number {
        match self.0 {
            Repr::Int(i) => Number(Repr::Int(-i)),
            Repr::Float(f) => Number(Repr::Float(-f)),
            Repr::Complex { re, im } => Number(Repr::Complex { re: -re, im: -im }),
        }
    }
}

impl std::ops::Add for Number {
    type Output = Number;

    fn add(self, rhs: Number) -> Number {
        match (self.0, rhs.0) {
            (Repr::Int(a), Repr::Int(b)) => Number(Repr::Int(a + b)),
            (a, b) => {
                if matches!(a, Repr::Complex { .. }) || matches!(b, Repr::Complex { .. }) {
                    let (ar, ai) = Number(a).promote_complex();
                    let (br, bi) = Number(b).promote_complex();
                    Number(Repr::Complex {
                        re: ar + br,
                        im: ai + bi,
                    })
                } else {
                    Number(Repr::Float(
                        Number(a).promote_f64() + Number(b).promote_f64(),
                    ))
                }
            }
        }
    }
}

impl std::ops::Sub for Number {
    type Output = Number;

    fn sub(self, rhs: Number) -> Number {
        self + (-rhs)
    }
}

impl std::ops::Mul for Number {
    type Output = Number;

    fn mul(self, rhs: Number) -> Number {
        match (self.0, rhs.0) {
            (Repr::Int(a), Repr::Int(b)) => Number(Repr::Int(a * b)),
            (a, b) => {
                if matches!(a, Repr::Complex { .. }) || matches!(b, Repr::Complex { .. }) {
                    let (ar, ai) = Number(a).promote_complex();
                    let (br, bi) = Number(b).promote_complex();
                    Number(Repr::Complex {
                        re: ar * br - ai * bi,
                        im: ar * bi + ai * br,
                    })
                } else {
                    Number(Repr::Float(
                        Number(a).promote_f64() * Number(b).promote_f64(),
                    ))
                }
            }
        }
    }
}

impl std::ops::Div for Number {
    type Output = Number;

    fn div(self, rhs: Number) -> Number {
        match (self.0, rhs.0) {
            // Exact when it divides evenly, float otherwise.
            (Repr::Int(a), Repr::Int(b)) if b.sign() != Sign::NoSign => {
                if (&a % &b).sign() == Sign::NoSign {
                    Number(Repr::Int(a / b))
                } else {
                    Number(Repr::Float(int_to_f64(&a) / int_to_f64(&b)))
                }
            }
            (a, b) => {
                if matches!(a, Repr::Complex { .. }) || matches!(b, Repr::Complex { .. }) {
                    let (ar, ai) = Number(a).promote_complex();
                    let (br, bi) = Number(b).promote_complex();
                    let denom = br * br + bi * bi;
                    Number(Repr::Complex {
                        re: (ar * br + ai * bi) / denom,
                        im: (ai * br - ar * bi) / denom,
                    })
                } else {
                    Number(Repr::Float(
                        Number(a).promote_f64() / Number(b).promote_f64(),
                    ))
                }
            }
        }
    }
}

impl PartialOrd for Number {
    /// Ordering is defined for real values only; complex operands compare as
    /// `None`.
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (&self.0, &other.0) {
            (Repr::Int(a), Repr::Int(b)) => Some(a.cmp(b)),
            (Repr::Complex { .. }, _) | (_, Repr::Complex { .. }) => None,
            _ => self.promote_f64().partial_cmp(&other.promote_f64()),
        }
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Repr::Int(i) => write!(f, "{i}"),
            Repr::Float(v) => write!(f, "{v}"),
            Repr::Complex { re, im } if *re == 0.0 => write!(f, "{im}i"),
            Repr::Complex { re, im } if *im < 0.0 => write!(f, "{re} - {}i", -im),
            Repr::Complex { re, im } => write!(f, "{re} + {im}i"),
        }
    }
}

impl std::fmt::Debug for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_round_trip_small() {
        let n = Number::from(-77_i64);
        let (neg, bytes) = n.to_bytes_be().unwrap();
        assert!(neg);
        assert_eq!(Number::from_bytes_be(neg, &bytes), n);
    }

    #[test]
    fn exact_division_stays_integer() {
        let q = Number::from(1024) / Number::from(4);
        assert!(q.is_integer());
        assert_eq!(q.try_to_i64().unwrap(), 256);
    }

    #[test]
    fn inexact_division_falls_back_to_float() {
        let q = Number::from(3) / Number::from(2);
        assert!(q.is_float());
        assert_eq!(q.try_to_f64().unwrap(), 1.5);
    }
}
