//! Fixed time-step splitting for `UpdateMode::Fixed`.

use crate::error::KccError;

/// Splits frame time into fixed-size ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedStepper {
    fixed_delta: f32,
}

impl FixedStepper {
    pub fn new(updates_per_second: u32) -> Result<Self, KccError> {
        if updates_per_second == 0 {
            return Err(KccError::InvalidFixedRate);
        }
        Ok(Self {
            fixed_delta: 1.0 / updates_per_second as f32,
        })
    }

    #[inline]
    pub fn fixed_delta(&self) -> f32 {
        self.fixed_delta
    }

    /// Tick deltas covering `frame_delta`: whole fixed steps while more than one
    /// step remains, then a single partial step for the rest.
    ///
    /// Nothing carries over to the next frame, so the ticks always sum to the
    /// frame time. Non-positive or NaN frame times yield no ticks.
    pub fn split(&self, frame_delta: f32) -> FixedSteps {
        FixedSteps {
            fixed_delta: self.fixed_delta,
            remaining: frame_delta,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FixedSteps {
    fixed_delta: f32,
    remaining: f32,
}

impl Iterator for FixedSteps {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.remaining > self.fixed_delta {
            self.remaining -= self.fixed_delta;
            Some(self.fixed_delta)
        } else if self.remaining > 0.0 {
            let last = self.remaining;
            self.remaining = 0.0;
            Some(last)
        } else {
            None
        }
    }
}
