//! Typed bit sets over small flag enums.
//!
//! A flag enum (declared with [`mask_flags!`]) maps each variant to one bit of
//! its backing integer. [`Mask<F>`] is a set of those flags that only accepts
//! `F`, so a collision-group mask cannot be built from some other flag type.

use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;
use std::ops::{BitOr, BitOrAssign};

use num_traits::{PrimInt, Zero};

/// A flag enum whose variants each own one bit of `Bits`.
pub trait MaskBit: Copy {
    type Bits: PrimInt + Debug + Hash;

    fn bit(self) -> Self::Bits;
}

/// Set of `F` flags.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mask<F: MaskBit> {
    bits: F::Bits,
    flag: PhantomData<F>,
}

impl<F: MaskBit> Mask<F> {
    pub fn empty() -> Self {
        Self::from_bits(F::Bits::zero())
    }

    /// Every bit of the backing integer, including bits no variant uses.
    pub fn all() -> Self {
        Self::from_bits(!F::Bits::zero())
    }

    pub fn from_bits(bits: F::Bits) -> Self {
        Self { bits, flag: PhantomData }
    }

    pub fn of(flags: &[F]) -> Self {
        flags.iter().copied().collect()
    }

    pub fn bits(&self) -> F::Bits {
        self.bits
    }

    pub fn contains(&self, flag: F) -> bool {
        self.bits & flag.bit() != F::Bits::zero()
    }

    /// True when every flag is present; vacuously true for an empty slice.
    pub fn contains_all(&self, flags: &[F]) -> bool {
        let wanted = Self::of(flags).bits;
        self.bits & wanted == wanted
    }

    /// True when at least one flag is present.
    pub fn contains_any(&self, flags: &[F]) -> bool {
        self.bits & Self::of(flags).bits != F::Bits::zero()
    }

    pub fn insert(&mut self, flag: F) {
        self.bits = self.bits | flag.bit();
    }

    pub fn remove(&mut self, flag: F) {
        self.bits = self.bits & !flag.bit();
    }

    pub fn with(mut self, flag: F) -> Self {
        self.insert(flag);
        self
    }

    pub fn without(mut self, flag: F) -> Self {
        self.remove(flag);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.bits == F::Bits::zero()
    }
}

impl<F: MaskBit> Default for Mask<F> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<F: MaskBit> Debug for Mask<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Mask({:?})", self.bits)
    }
}

impl<F: MaskBit> From<F> for Mask<F> {
    fn from(flag: F) -> Self {
        Self::from_bits(flag.bit())
    }
}

impl<F: MaskBit> FromIterator<F> for Mask<F> {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        let mut mask = Self::empty();
        for flag in iter {
            mask.insert(flag);
        }
        mask
    }
}

impl<F: MaskBit> BitOr<F> for Mask<F> {
    type Output = Self;

    fn bitor(self, flag: F) -> Self {
        self.with(flag)
    }
}

impl<F: MaskBit> BitOrAssign<F> for Mask<F> {
    fn bitor_assign(&mut self, flag: F) {
        self.insert(flag);
    }
}

/// Declare a flag enum backed by `$bits`, one bit per variant in declaration order.
///
/// ```rust
/// kcc::mask_flags! {
///     pub enum SurfaceTag: u16 {
///         Slippery,
///         Ladder,
///         Water,
///     }
/// }
///
/// let tags = kcc::mask::Mask::of(&[SurfaceTag::Ladder]);
/// assert!(tags.contains(SurfaceTag::Ladder));
/// ```
#[macro_export]
macro_rules! mask_flags {
    ($(#[$meta:meta])* $vis:vis enum $name:ident: $bits:ty { $($variant:ident),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        $vis enum $name {
            $($variant),*
        }

        impl $name {
            /// Every variant in bit order.
            pub const ALL: &'static [$name] = &[$($name::$variant),*];
        }

        impl $crate::mask::MaskBit for $name {
            type Bits = $bits;

            fn bit(self) -> $bits {
                (1 as $bits) << (self as u8)
            }
        }
    };
}
