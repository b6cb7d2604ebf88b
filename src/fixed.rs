//! 16.16 fixed-point arithmetic for the column rasterizer.
//!
//! Screen-space stepping state (`scale`, `xiscale`, `startfrac`,
//! `texturemid`) lives in this format so that walking a sprite column
//! advances through texture space without float drift. World-space math
//! stays in `f32` ([`glam::Vec2`]); conversion happens once, at projection
//! time.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

pub const FRACBITS: i32 = 16;
pub const FRACUNIT: i32 = 1 << FRACBITS;

/// Signed 16.16 fixed-point value.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Fixed(pub i32);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(FRACUNIT);
    pub const MAX: Fixed = Fixed(i32::MAX);
    pub const MIN: Fixed = Fixed(i32::MIN);

    #[inline]
    pub const fn from_int(i: i32) -> Fixed {
        Fixed(i << FRACBITS)
    }

    #[inline]
    pub fn from_f32(f: f32) -> Fixed {
        Fixed((f * FRACUNIT as f32) as i32)
    }

    /// Integer part, flooring toward negative infinity (arithmetic shift).
    #[inline]
    pub const fn to_int(self) -> i32 {
        self.0 >> FRACBITS
    }

    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / FRACUNIT as f32
    }

    #[inline]
    pub const fn abs(self) -> Fixed {
        Fixed(self.0.abs())
    }

    /// Fixed-point product through a 64-bit intermediate.
    #[inline]
    pub fn mul(self, rhs: Fixed) -> Fixed {
        Fixed(((self.0 as i64 * rhs.0 as i64) >> FRACBITS) as i32)
    }

    /// Fixed-point quotient. Saturates instead of wrapping when the result
    /// would not fit 32 bits (quotients feed screen coordinates, where a
    /// clamped extreme is harmless and a wrapped one is not).
    #[inline]
    pub fn div(self, rhs: Fixed) -> Fixed {
        if (self.0.abs() >> 14) >= rhs.0.abs() {
            return if (self.0 ^ rhs.0) < 0 {
                Fixed::MIN
            } else {
                Fixed::MAX
            };
        }
        Fixed((((self.0 as i64) << FRACBITS) / rhs.0 as i64) as i32)
    }

    /// Raw value widened to i64, for sums that overflow 32 bits
    /// (unclipped top-of-screen coordinates of tall close-up sprites).
    #[inline]
    pub const fn wide(self) -> i64 {
        self.0 as i64
    }
}

impl Add for Fixed {
    type Output = Fixed;
    #[inline]
    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Fixed {
    type Output = Fixed;
    #[inline]
    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.wrapping_sub(rhs.0))
    }
}

impl AddAssign for Fixed {
    #[inline]
    fn add_assign(&mut self, rhs: Fixed) {
        *self = *self + rhs;
    }
}

impl SubAssign for Fixed {
    #[inline]
    fn sub_assign(&mut self, rhs: Fixed) {
        *self = *self - rhs;
    }
}

impl Neg for Fixed {
    type Output = Fixed;
    #[inline]
    fn neg(self) -> Fixed {
        Fixed(-self.0)
    }
}

impl Mul<i32> for Fixed {
    type Output = Fixed;
    #[inline]
    fn mul(self, rhs: i32) -> Fixed {
        Fixed(self.0.wrapping_mul(rhs))
    }
}

/*====================================================================*/
/*                                Tests                               */
/*====================================================================*/
