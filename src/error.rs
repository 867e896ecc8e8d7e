use derive_more::{Display, Error};

/// Result type used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors reported while configuring or driving the servo.
///
/// Every variant is fatal at startup; nothing is retried.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The GPIO does not exist on this chip, so it has no PWM slice.
    #[display("GPIO {gpio} has no PWM slice")]
    InvalidPin {
        /// Offending GPIO number.
        gpio: u8,
    },

    /// Clock divider outside the 8.4 fixed-point range `1.0..=255.9375`.
    #[display("PWM clock divider must be within 1.0..=255.9375")]
    InvalidDivider,

    /// A wrap of zero gives no PWM period.
    #[display("PWM wrap must be non-zero")]
    InvalidWrap,

    /// Servo limits are empty or do not fit in the PWM frame.
    #[display("servo limits {min}..={max} are invalid for wrap {wrap}")]
    InvalidLimits {
        /// Lowest allowed compare level.
        min: u16,
        /// Highest allowed compare level.
        max: u16,
        /// Configured wrap.
        wrap: u16,
    },

    /// A sweep must move between two distinct levels, lowest first.
    #[display("sweep bounds {min}..={max} are empty")]
    EmptySweep {
        /// Lower sweep bound.
        min: u16,
        /// Upper sweep bound.
        max: u16,
    },

    /// A ramp step of zero would never reach its target.
    #[display("sweep step must be non-zero")]
    InvalidStep,

    /// The requested compare level is outside the safe servo range.
    #[display("level {level} outside servo range {min}..={max}")]
    LevelOutOfRange {
        /// Rejected compare level.
        level: u16,
        /// Lowest allowed compare level.
        min: u16,
        /// Highest allowed compare level.
        max: u16,
    },

    /// Degrees beyond the servo's travel.
    #[display("{degrees} degrees is beyond the servo's 0..=180 travel")]
    DegreesOutOfRange {
        /// Rejected angle.
        degrees: u16,
    },
}
