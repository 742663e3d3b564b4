//! Cyclic counter over a fixed modulus.
//!
//! A [`CyclicCounter`] is one position on a clock face: stepping past the
//! last position wraps to zero and stepping back from zero wraps to the end.

use clock_common::error::{ClockError, ClockResult};
use std::num::NonZeroU32;

/// Counter holding a value in `[0, modulus)`.
///
/// # Example
///
/// ```
/// use clock_core::counter::CyclicCounter;
///
/// let mut minutes = CyclicCounter::new(60).unwrap();
/// minutes.set_value(58).unwrap();
///
/// minutes.advance(3);
/// assert_eq!(minutes.value(), 1);
///
/// minutes.retreat(2);
/// assert_eq!(minutes.value(), 59);
///
/// // Out-of-range assignment is rejected and leaves the value alone
/// assert!(minutes.set_value(60).is_err());
/// assert_eq!(minutes.value(), 59);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CyclicCounter {
    modulus: NonZeroU32,
    value: u32,
}

impl CyclicCounter {
    /// Create a counter at zero.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::ZeroModulus`] if `modulus` is zero.
    pub fn new(modulus: u32) -> ClockResult<Self> {
        NonZeroU32::new(modulus)
            .map(Self::with_modulus)
            .ok_or(ClockError::ZeroModulus)
    }

    /// Create a counter at zero from a modulus known to be non-zero.
    #[must_use]
    pub const fn with_modulus(modulus: NonZeroU32) -> Self {
        Self { modulus, value: 0 }
    }

    /// Move forward `steps` positions, wrapping at the modulus.
    pub fn advance(&mut self, steps: u32) {
        let m = self.modulus.get();
        let steps = steps % m;
        // u64 keeps value + steps from overflowing for large moduli
        self.value = ((u64::from(self.value) + u64::from(steps)) % u64::from(m)) as u32;
    }

    /// Move backward `steps` positions, wrapping below zero.
    pub fn retreat(&mut self, steps: u32) {
        let m = self.modulus.get();
        self.advance(m - steps % m);
    }

    /// Assign `value` directly.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::OutOfRange`] if `value >= modulus`; the current
    /// value is retained.
    pub fn set_value(&mut self, value: u32) -> ClockResult<()> {
        if value < self.modulus.get() {
            self.value = value;
            Ok(())
        } else {
            Err(ClockError::out_of_range("value", value, self.modulus.get()))
        }
    }

    /// Current value.
    #[must_use]
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Number of positions on the cycle.
    #[must_use]
    pub fn modulus(&self) -> u32 {
        self.modulus.get()
    }

    /// True when the counter sits at position zero.
    #[must_use]
    pub fn is_at_origin(&self) -> bool {
        self.value == 0
    }
}
