//! The 128-bit register quadword.
//!
//! A quadword is four 32-bit limbs, Low least significant. The
//! 128-bit machine keeps all register state (including the program
//! counter) in this form; arithmetic ripples carries limb to limb and
//! the High limb absorbs overflow silently.

use std::fmt;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Quad {
    pub low: u32,
    pub mid_low: u32,
    pub mid_high: u32,
    pub high: u32,
}

impl Quad {
    pub const ZERO: Self = Self {
        low: 0,
        mid_low: 0,
        mid_high: 0,
        high: 0,
    };

    /// A quadword with the given Low limb and zero upper limbs
    pub fn from_low(low: u32) -> Self {
        Self { low, ..Self::ZERO }
    }

    /// Sign-extend a 16-bit immediate to 128 bits (ones-fill on
    /// negative)
    pub fn from_imm16(imm: i16) -> Self {
        let fill = if imm < 0 { 0xffff_ffff } else { 0 };
        Self {
            low: i32::from(imm) as u32,
            mid_low: fill,
            mid_high: fill,
            high: fill,
        }
    }

    fn limbs(self) -> [u32; 4] {
        [self.low, self.mid_low, self.mid_high, self.high]
    }

    fn from_limbs(limbs: [u32; 4]) -> Self {
        Self {
            low: limbs[0],
            mid_low: limbs[1],
            mid_high: limbs[2],
            high: limbs[3],
        }
    }

    /// Four-limb add; carry out of the High limb is discarded
    pub fn wrapping_add(self, rhs: Self) -> Self {
        let mut out = [0u32; 4];
        let mut carry = 0u64;
        for (limb, (a, b)) in out.iter_mut().zip(self.limbs().into_iter().zip(rhs.limbs())) {
            let sum = u64::from(a) + u64::from(b) + carry;
            *limb = sum as u32;
            carry = sum >> 32;
        }
        Self::from_limbs(out)
    }

    /// Four-limb subtract; borrow out of the High limb is discarded
    pub fn wrapping_sub(self, rhs: Self) -> Self {
        let mut out = [0u32; 4];
        let mut borrow = 0u32;
        for (limb, (a, b)) in out.iter_mut().zip(self.limbs().into_iter().zip(rhs.limbs())) {
            let (diff, underflow_a) = a.overflowing_sub(b);
            let (diff, underflow_b) = diff.overflowing_sub(borrow);
            *limb = diff;
            borrow = u32::from(underflow_a) + u32::from(underflow_b);
        }
        Self::from_limbs(out)
    }

    /// Count leading zero bits, scanning High down to Low. The
    /// all-zero quadword gives 128.
    pub fn leading_zeros(self) -> u32 {
        let mut count = 0;
        for limb in self.limbs().into_iter().rev() {
            if limb == 0 {
                count += 32;
            } else {
                count += limb.leading_zeros();
                break;
            }
        }
        count
    }
}

impl From<u128> for Quad {
    fn from(value: u128) -> Self {
        Self {
            low: value as u32,
            mid_low: (value >> 32) as u32,
            mid_high: (value >> 64) as u32,
            high: (value >> 96) as u32,
        }
    }
}

impl From<Quad> for u128 {
    fn from(value: Quad) -> Self {
        u128::from(value.low)
            | u128::from(value.mid_low) << 32
            | u128::from(value.mid_high) << 64
            | u128::from(value.high) << 96
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HIGH({}), MIDHIGH({}), MIDLOW({}), LOW({})",
            self.high, self.mid_high, self.mid_low, self.low
        )
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn add_carries_into_next_limb() {
        let a = Quad::from_low(0xffff_ffff);
        let b = Quad::from_low(1);
        let sum = a.wrapping_add(b);
        assert_eq!(
            sum,
            Quad {
                low: 0,
                mid_low: 1,
                mid_high: 0,
                high: 0
            }
        );
    }

    #[test]
    fn add_ripples_through_all_limbs() {
        let a = Quad::from(u128::MAX);
        let b = Quad::from_low(1);
        assert_eq!(a.wrapping_add(b), Quad::ZERO);
    }

    #[test]
    fn add_matches_u128_arithmetic() {
        let pairs = [
            (0u128, 0u128),
            (0xffff_ffff_ffff_ffff, 1),
            (0x0123_4567_89ab_cdef_0123_4567_89ab_cdef, 0xffff_ffff),
            (u128::MAX, u128::MAX),
        ];
        for (a, b) in pairs {
            let got = Quad::from(a).wrapping_add(Quad::from(b));
            assert_eq!(u128::from(got), a.wrapping_add(b));
        }
    }

    #[test]
    fn sub_borrows_across_limbs() {
        let a = Quad {
            low: 0,
            mid_low: 1,
            mid_high: 0,
            high: 0,
        };
        let b = Quad::from_low(1);
        assert_eq!(a.wrapping_sub(b), Quad::from_low(0xffff_ffff));
    }

    #[test]
    fn sub_matches_u128_arithmetic() {
        let pairs = [
            (0u128, 1u128),
            (0x1_0000_0000, 1),
            (0x0123_4567_89ab_cdef_0123_4567_89ab_cdef, 0xdead_beef),
        ];
        for (a, b) in pairs {
            let got = Quad::from(a).wrapping_sub(Quad::from(b));
            assert_eq!(u128::from(got), a.wrapping_sub(b));
        }
    }

    #[test]
    fn immediate_sign_extension() {
        assert_eq!(u128::from(Quad::from_imm16(1)), 1);
        assert_eq!(u128::from(Quad::from_imm16(-1)), u128::MAX);
        let minus_two = Quad::from_imm16(-2);
        assert_eq!(minus_two.low, 0xffff_fffe);
        assert_eq!(minus_two.high, 0xffff_ffff);
    }

    #[test]
    fn leading_zeros_spans_limbs() {
        assert_eq!(Quad::ZERO.leading_zeros(), 128);
        assert_eq!(Quad::from_low(1).leading_zeros(), 127);
        let high_bit = Quad {
            high: 0x8000_0000,
            ..Quad::ZERO
        };
        assert_eq!(high_bit.leading_zeros(), 0);
        let mid = Quad {
            high: 0x0000_8000,
            ..Quad::ZERO
        };
        assert_eq!(mid.leading_zeros(), 16);
    }

    #[test]
    fn leading_zeros_is_128_minus_bitlength() {
        for value in [1u128, 2, 0xff, 0x1_0000_0000, u128::MAX >> 3] {
            let bitlength = 128 - value.leading_zeros();
            assert_eq!(Quad::from(value).leading_zeros(), 128 - bitlength);
        }
    }
}
