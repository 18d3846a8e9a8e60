use crate::value::Value;

/// The numeric value a [`super::Token`] carries, already resolved to either
/// an integer or a float — the tokenizer never hands a raw digit string
/// downstream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn into_value(self) -> Value {
        match self {
            Number::Int(i) => Value::Int(i),
            Number::Float(f) => Value::Float(f),
        }
    }
}

/// Accumulates one numeric lexeme one digit at a time.
///
/// The mantissa is tracked unsigned and promoted to `f64` the moment it
/// would exceed `i64::MAX` — not `u64::MAX` — so that every integer this
/// crate can produce already fits the documented `[i64::MIN + 1,
/// i64::MAX]` range without a later fallible cast.
#[derive(Debug, Clone)]
pub struct NumberState {
    sign: i8,
    is_hex: bool,
    mantissa: u64,
    digit_count: u32,
    overflowed: bool,
    float_mantissa: f64,
    has_frac: bool,
    frac_digits: u32,
    has_exp: bool,
    exp_sign: i8,
    exp_value: u32,
    exp_digits: u32,
}

impl NumberState {
    pub fn new() -> Self {
        Self {
            sign: 1,
            is_hex: false,
            mantissa: 0,
            digit_count: 0,
            overflowed: false,
            float_mantissa: 0.0,
            has_frac: false,
            frac_digits: 0,
            has_exp: false,
            exp_sign: 1,
            exp_value: 0,
            exp_digits: 0,
        }
    }

    pub fn set_sign(&mut self, sign: i8) {
        self.sign = sign;
    }

    pub fn sign(&self) -> i8 {
        self.sign
    }

    /// Discards the leading `0` of a `0x`/`0X` prefix and starts a fresh
    /// hex mantissa, so `has_digits` afterwards reflects hex digits only.
    pub fn enter_hex(&mut self) {
        self.is_hex = true;
        self.mantissa = 0;
        self.digit_count = 0;
        self.overflowed = false;
        self.float_mantissa = 0.0;
    }

    pub fn is_lone_zero(&self) -> bool {
        !self.is_hex && self.digit_count == 1 && self.mantissa == 0 && !self.overflowed
    }

    pub fn push_digit(&mut self, value: u8) {
        let base: u64 = if self.is_hex { 16 } else { 10 };
        self.digit_count += 1;
        if !self.overflowed {
            match self
                .mantissa
                .checked_mul(base)
                .and_then(|m| m.checked_add(value as u64))
            {
                Some(m) if m <= i64::MAX as u64 => self.mantissa = m,
                _ => {
                    self.overflowed = true;
                    self.float_mantissa = self.mantissa as f64 * base as f64 + value as f64;
                }
            }
        } else {
            self.float_mantissa = self.float_mantissa * base as f64 + value as f64;
        }
        if self.has_frac {
            self.frac_digits += 1;
        }
    }

    pub fn has_digits(&self) -> bool {
        self.digit_count > 0
    }

    pub fn enter_frac(&mut self) {
        self.has_frac = true;
    }

    pub fn enter_exp(&mut self, sign: i8) {
        self.has_exp = true;
        self.exp_sign = sign;
    }

    pub fn has_exp_digits(&self) -> bool {
        self.exp_digits > 0
    }

    /// Saturates at `DBL_MAX_10_EXP` (307): any larger exponent already
    /// over/underflows a finite `f64`, so further precision in the count is
    /// pointless.
    pub fn push_exp_digit(&mut self, value: u8) {
        self.exp_digits += 1;
        let v = self.exp_value.saturating_mul(10).saturating_add(value as u32);
        self.exp_value = v.min(307);
    }

    pub fn finalize(&self) -> Number {
        if self.is_hex {
            return if self.overflowed {
                let m = if self.sign < 0 {
                    -self.float_mantissa
                } else {
                    self.float_mantissa
                };
                Number::Float(m)
            } else {
                let signed = if self.sign < 0 {
                    -(self.mantissa as i64)
                } else {
                    self.mantissa as i64
                };
                Number::Int(signed)
            };
        }

        if !self.overflowed && !self.has_frac && !self.has_exp {
            let signed = if self.sign < 0 {
                -(self.mantissa as i64)
            } else {
                self.mantissa as i64
            };
            return Number::Int(signed);
        }

        let mut mant = if self.overflowed {
            self.float_mantissa
        } else {
            self.mantissa as f64
        };

        let exp_signed = if self.has_exp {
            if self.exp_sign < 0 {
                -(self.exp_value as i64)
            } else {
                self.exp_value as i64
            }
        } else {
            0
        };
        let n = self.frac_digits as i64 - exp_signed;

        if n != 0 {
            let divide = n > 0;
            let mut n_abs = n.unsigned_abs();
            let mut d: f64 = 10.0;
            let mut e: f64 = 1.0;
            while n_abs > 0 {
                if n_abs & 1 == 1 {
                    e *= d;
                }
                d *= d;
                n_abs >>= 1;
            }
            mant = if divide { mant / e } else { mant * e };
        }

        Number::Float(if self.sign < 0 { -mant } else { mant })
    }
}

impl Default for NumberState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digits(n: &mut NumberState, s: &str) {
        for b in s.bytes() {
            n.push_digit(b - b'0');
        }
    }

    #[test]
    fn plain_int() {
        let mut n = NumberState::new();
        digits(&mut n, "1234");
        assert_eq!(n.finalize(), Number::Int(1234));
    }

    #[test]
    fn decimal_fraction() {
        let mut n = NumberState::new();
        digits(&mut n, "1");
        n.enter_frac();
        digits(&mut n, "23");
        assert_eq!(n.finalize(), Number::Float(1.23));
    }

    #[test]
    fn positive_exponent_produces_integral_float() {
        let mut n = NumberState::new();
        digits(&mut n, "123");
        n.enter_exp(1);
        n.push_exp_digit(2);
        assert_eq!(n.finalize(), Number::Float(12300.0));
    }

    #[test]
    fn negative_exponent() {
        let mut n = NumberState::new();
        digits(&mut n, "123");
        n.enter_exp(-1);
        n.push_exp_digit(1);
        match n.finalize() {
            Number::Float(f) => assert!((f - 0.123).abs() < 1e-12),
            other => panic!("expected float, got {other:?}"),
        }
    }

    #[test]
    fn bare_trailing_point_is_zero_float() {
        let mut n = NumberState::new();
        digits(&mut n, "0");
        n.enter_frac();
        assert_eq!(n.finalize(), Number::Float(0.0));
    }

    #[test]
    fn overflow_promotes_to_float() {
        let mut n = NumberState::new();
        digits(&mut n, "99999999999999999999");
        assert!(matches!(n.finalize(), Number::Float(_)));
    }

    #[test]
    fn max_i64_stays_int() {
        let mut n = NumberState::new();
        digits(&mut n, &i64::MAX.to_string());
        assert_eq!(n.finalize(), Number::Int(i64::MAX));
    }

    #[test]
    fn hex_literal() {
        let mut n = NumberState::new();
        n.enter_hex();
        for c in "1a".chars() {
            n.push_digit(c.to_digit(16).unwrap() as u8);
        }
        assert_eq!(n.finalize(), Number::Int(0x1a));
    }
}
