//! Compile-time servo configuration and the pulse-width arithmetic behind it.
//!
//! # Deriving the constants
//!
//! Hobby servos expect one pulse every 20 ms (50 Hz). The pulse's high time
//! selects the position: about 0.5 ms is 0° and about 2.4 ms is 180°.
//!
//! The PWM counter runs at `tick_hz = clk_sys / divider`. With the default
//! `clk_sys` of 125 MHz and a divider of 125, one tick is exactly 1 µs. The
//! counter counts `0..=wrap`, so a wrap of 20 000 gives a frame of 20 001 ticks
//! (≈ 20 ms). Because one tick is one microsecond, a compare level *is* the
//! pulse width in microseconds:
//!
//! ```text
//! duty = level / (wrap + 1)        2400 / 20001 ≈ 12 %  ->  2.4 ms  ->  180°
//!                                  1470 / 20001 ≈  7 %  ->  1.47 ms ->   90°
//!                                   500 / 20001 ≈  2.5% ->  0.5 ms  ->    0°
//! ```
//!
//! See [`tick_hz`] and [`frame_micros`] to check the relationship for other
//! clocks.

use embassy_time::Duration;
use fixed::FixedU16;
use fixed::types::extra::U4;

use crate::{Error, Result};

/// PWM clock divider in the RP2040/RP2350 8.4 fixed-point format.
pub type ClockDivider = FixedU16<U4>;

// ============================================================================
// Constants
// ============================================================================

/// GPIO the servo signal wire is connected to.
pub const SERVO_GPIO: u8 = 22;

/// System clock the divider was chosen for (Hz).
pub const CLK_SYS_HZ_DEFAULT: u32 = 125_000_000;

/// 125 MHz / 125 = 1 MHz, so one PWM tick is one microsecond.
pub const SERVO_CLOCK_DIVIDER: ClockDivider = ClockDivider::from_bits(125 << 4);

/// Counter wrap: a 20 ms servo frame at 1 tick per microsecond.
pub const SERVO_WRAP: u16 = 20_000;

/// Compare level for 0° (0.5 ms pulse).
pub const LEVEL_0_DEGREES: u16 = 500;

/// Compare level for 90° (1.47 ms pulse, calibrated center).
pub const LEVEL_90_DEGREES: u16 = 1_470;

/// Compare level for 180° (2.4 ms pulse).
pub const LEVEL_180_DEGREES: u16 = 2_400;

/// How long each startup position is held.
pub const STARTUP_DWELL: Duration = Duration::from_millis(5_000);

/// Positions commanded once at startup, in order: 180°, 90°, 0°.
pub const STARTUP_POSITIONS: [(u16, Duration); 3] = [
    (LEVEL_180_DEGREES, STARTUP_DWELL),
    (LEVEL_90_DEGREES, STARTUP_DWELL),
    (LEVEL_0_DEGREES, STARTUP_DWELL),
];

/// Level increment between sweep writes.
pub const SWEEP_STEP: u16 = 5;

/// Pause after every sweep write. A full one-way sweep takes ~3.8 s.
pub const SWEEP_STEP_DELAY: Duration = Duration::from_millis(10);

/// Travel of a standard positional servo.
pub const MAX_DEGREES: u16 = 180;

const DIVIDER_BITS_MIN: u16 = 1 << 4; // 1.0
const DIVIDER_BITS_MAX: u16 = 0x0FFF; // 255 + 15/16

#[cfg(feature = "pico2")]
const GPIO_COUNT: u8 = 48;
#[cfg(not(feature = "pico2"))]
const GPIO_COUNT: u8 = 30;

// ============================================================================
// Slice configuration
// ============================================================================

/// Divider and wrap for one PWM slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliceConfig {
    divider: ClockDivider,
    wrap: u16,
}

impl SliceConfig {
    /// Configuration used by the sweep firmware (divider 125, wrap 20 000).
    pub const SERVO: Self = Self {
        divider: SERVO_CLOCK_DIVIDER,
        wrap: SERVO_WRAP,
    };

    /// Validate a divider and wrap.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDivider`] if the divider is outside `1.0..=255.9375`,
    /// [`Error::InvalidWrap`] if the wrap is zero.
    pub const fn new(divider: ClockDivider, wrap: u16) -> Result<Self> {
        let bits = divider.to_bits();
        if bits < DIVIDER_BITS_MIN || bits > DIVIDER_BITS_MAX {
            return Err(Error::InvalidDivider);
        }
        if wrap == 0 {
            return Err(Error::InvalidWrap);
        }
        Ok(Self { divider, wrap })
    }

    /// Clock divider.
    #[must_use]
    pub const fn divider(&self) -> ClockDivider {
        self.divider
    }

    /// Counter wrap (the last count before the period restarts).
    #[must_use]
    pub const fn wrap(&self) -> u16 {
        self.wrap
    }
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self::SERVO
    }
}

// ============================================================================
// Servo limits
// ============================================================================

/// Inclusive range of compare levels the servo may be driven to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServoLimits {
    min: u16,
    max: u16,
}

impl ServoLimits {
    /// 0.5 ms to 2.4 ms, the range the sweep firmware uses.
    pub const SERVO: Self = Self {
        min: LEVEL_0_DEGREES,
        max: LEVEL_180_DEGREES,
    };

    /// Validate limits against the slice's wrap.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLimits`] if `min >= max` or `max` does not fit in the frame.
    pub const fn new(min: u16, max: u16, slice_config: &SliceConfig) -> Result<Self> {
        let wrap = slice_config.wrap;
        if min >= max || max > wrap {
            return Err(Error::InvalidLimits { min, max, wrap });
        }
        Ok(Self { min, max })
    }

    /// Lowest allowed level.
    #[must_use]
    pub const fn min(&self) -> u16 {
        self.min
    }

    /// Highest allowed level.
    #[must_use]
    pub const fn max(&self) -> u16 {
        self.max
    }

    /// Return `level` if it is within the limits.
    ///
    /// # Errors
    ///
    /// [`Error::LevelOutOfRange`] otherwise.
    pub const fn check(&self, level: u16) -> Result<u16> {
        if level < self.min || level > self.max {
            return Err(Error::LevelOutOfRange {
                level,
                min: self.min,
                max: self.max,
            });
        }
        Ok(level)
    }

    /// Map `0..=180` degrees linearly onto the limits.
    ///
    /// # Errors
    ///
    /// [`Error::DegreesOutOfRange`] above [`MAX_DEGREES`].
    pub const fn level_for_degrees(&self, degrees: u16) -> Result<u16> {
        if degrees > MAX_DEGREES {
            return Err(Error::DegreesOutOfRange { degrees });
        }
        let span = (self.max - self.min) as u32;
        let offset = degrees as u32 * span / MAX_DEGREES as u32;
        // offset <= span, which came from two u16 values
        Ok(self.min + offset as u16)
    }
}

impl Default for ServoLimits {
    fn default() -> Self {
        Self::SERVO
    }
}

// ============================================================================
// Sweep parameters
// ============================================================================

/// Parameters of the endless up/down sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sweep {
    min: u16,
    max: u16,
    step: u16,
    step_delay: Duration,
}

impl Sweep {
    /// 500 to 2400 in steps of 5, 10 ms apart.
    pub const SERVO: Self = Self {
        min: LEVEL_0_DEGREES,
        max: LEVEL_180_DEGREES,
        step: SWEEP_STEP,
        step_delay: SWEEP_STEP_DELAY,
    };

    /// Validate sweep parameters.
    ///
    /// A `step` that does not divide `max - min` is allowed: the last step of
    /// each phase is clamped onto the bound.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidStep`] for a zero step, [`Error::EmptySweep`] if
    /// `min >= max`.
    pub const fn new(min: u16, max: u16, step: u16, step_delay: Duration) -> Result<Self> {
        if step == 0 {
            return Err(Error::InvalidStep);
        }
        if min >= max {
            return Err(Error::EmptySweep { min, max });
        }
        Ok(Self {
            min,
            max,
            step,
            step_delay,
        })
    }

    /// Lower bound of the sweep.
    #[must_use]
    pub const fn min(&self) -> u16 {
        self.min
    }

    /// Upper bound of the sweep.
    #[must_use]
    pub const fn max(&self) -> u16 {
        self.max
    }

    /// Level increment.
    #[must_use]
    pub const fn step(&self) -> u16 {
        self.step
    }

    /// Pause after each write.
    #[must_use]
    pub const fn step_delay(&self) -> Duration {
        self.step_delay
    }
}

impl Default for Sweep {
    fn default() -> Self {
        Self::SERVO
    }
}

// ============================================================================
// Pin mapping and timing
// ============================================================================

/// Output channel of a PWM slice.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Channel {
    /// Even GPIOs.
    A,
    /// Odd GPIOs.
    B,
}

/// PWM slice and channel driven by `gpio`.
///
/// GPIO 0..=31 use `(gpio / 2) % 8`; the RP2350B's GPIO 32..=47 use slices 8..=11.
///
/// # Errors
///
/// [`Error::InvalidPin`] if the chip has no such GPIO.
pub const fn slice_for_gpio(gpio: u8) -> Result<(u8, Channel)> {
    if gpio >= GPIO_COUNT {
        return Err(Error::InvalidPin { gpio });
    }
    let slice = if gpio < 32 {
        (gpio / 2) % 8
    } else {
        8 + ((gpio - 32) / 2) % 4
    };
    let channel = if gpio % 2 == 0 { Channel::A } else { Channel::B };
    Ok((slice, channel))
}

/// Split a divider into its integer part and its fraction in sixteenths,
/// the two fields of the hardware `DIV` register.
#[must_use]
pub const fn divider_parts(divider: ClockDivider) -> (u16, u8) {
    let bits = divider.to_bits();
    (bits >> 4, (bits & 0x0F) as u8)
}

/// PWM counter rate for a system clock and divider.
#[must_use]
pub const fn tick_hz(clk_sys_hz: u32, divider: ClockDivider) -> u32 {
    let bits = divider.to_bits() as u64;
    if bits == 0 {
        return 0;
    }
    // clk / (bits / 16), rounded to nearest
    ((clk_sys_hz as u64 * 16 + bits / 2) / bits) as u32
}

/// Length of one PWM frame (`wrap + 1` ticks) in microseconds.
#[must_use]
pub const fn frame_micros(tick_hz: u32, wrap: u16) -> u32 {
    if tick_hz == 0 {
        return 0;
    }
    let ticks = wrap as u64 + 1;
    ((ticks * 1_000_000 + tick_hz as u64 / 2) / tick_hz as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_divider_gives_one_microsecond_ticks() {
        assert_eq!(tick_hz(CLK_SYS_HZ_DEFAULT, SERVO_CLOCK_DIVIDER), 1_000_000);
        assert_eq!(frame_micros(1_000_000, SERVO_WRAP), 20_001);
    }

    #[test]
    fn servo_gpio_is_slice_3_channel_a() {
        assert_eq!(slice_for_gpio(SERVO_GPIO), Ok((3, Channel::A)));
    }

    #[test]
    fn servo_divider_has_no_fraction() {
        assert_eq!(divider_parts(SERVO_CLOCK_DIVIDER), (125, 0));
    }

    #[test]
    fn named_levels_fit_in_limits() {
        for (level, dwell) in STARTUP_POSITIONS {
            assert_eq!(ServoLimits::SERVO.check(level), Ok(level));
            assert_eq!(dwell.as_millis(), 5_000);
        }
    }
}
