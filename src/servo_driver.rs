//! Position driver for one servo: hold a level, ramp between levels, sweep
//! until told to stop.
//!
//! The driver owns a [`PwmSlice`] (the hardware compare register, or a mock)
//! and a [`DelayNs`] (the wait). Nothing here touches global peripheral state,
//! so the same code runs on the Pico and in host tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use servo_sweep::servo_config::{STARTUP_POSITIONS, ServoLimits, SliceConfig, Sweep};
//! use servo_sweep::servo_driver::{ServoDriver, StopSignal};
//!
//! static STOP: StopSignal = StopSignal::new();
//!
//! async fn example(pwm: impl servo_sweep::servo_driver::PwmSlice) -> servo_sweep::Result<()> {
//!     let mut driver = ServoDriver::configure(
//!         pwm,
//!         embassy_time::Delay,
//!         SliceConfig::SERVO,
//!         ServoLimits::SERVO,
//!     )?;
//!     // Returns only once STOP is signaled.
//!     driver.run(&STARTUP_POSITIONS, &Sweep::SERVO, &STOP).await
//! }
//! ```

use core::ops::ControlFlow;

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;

use crate::servo_config::{ServoLimits, SliceConfig, Sweep};
use crate::{Error, Result};

/// Raised once to make [`ServoDriver::sweep`] and [`ServoDriver::run`] return.
pub type StopSignal = Signal<CriticalSectionRawMutex, ()>;

/// One PWM slice channel as seen by the driver.
///
/// Levels are compare values in ticks of the slice counter. Implementations
/// write straight to hardware; the driver has already validated the value.
pub trait PwmSlice {
    /// Apply divider and wrap, then start the counter.
    fn configure(&mut self, slice_config: &SliceConfig);

    /// Write the compare level. Takes effect at the start of the next period.
    fn set_level(&mut self, level: u16);

    /// Start or stop the output without touching divider or wrap.
    fn set_enabled(&mut self, enabled: bool);
}

/// A configured servo, ready to take position commands.
///
/// See the [module-level example](self) for usage.
pub struct ServoDriver<P, D> {
    pwm: P,
    delay: D,
    slice_config: SliceConfig,
    limits: ServoLimits,
    level: Option<u16>,
}

impl<P: PwmSlice, D: DelayNs> ServoDriver<P, D> {
    /// Configure the slice and return a driver for it.
    ///
    /// The slice is running when this returns; no level has been written yet.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLimits`] if the limits do not fit in the slice's frame.
    pub fn configure(
        mut pwm: P,
        delay: D,
        slice_config: SliceConfig,
        limits: ServoLimits,
    ) -> Result<Self> {
        let limits = ServoLimits::new(limits.min(), limits.max(), &slice_config)?;
        pwm.configure(&slice_config);
        Ok(Self {
            pwm,
            delay,
            slice_config,
            limits,
            level: None,
        })
    }

    /// Slice configuration applied at startup.
    #[must_use]
    pub const fn slice_config(&self) -> &SliceConfig {
        &self.slice_config
    }

    /// Levels this driver accepts.
    #[must_use]
    pub const fn limits(&self) -> &ServoLimits {
        &self.limits
    }

    /// Last level written, if any.
    #[must_use]
    pub const fn level(&self) -> Option<u16> {
        self.level
    }

    /// Give back the slice and delay.
    pub fn into_parts(self) -> (P, D) {
        (self.pwm, self.delay)
    }

    /// Write a compare level without waiting.
    ///
    /// Every call writes, even when the level is unchanged.
    ///
    /// # Errors
    ///
    /// [`Error::LevelOutOfRange`] before anything is written.
    pub fn set_level(&mut self, level: u16) -> Result<()> {
        let level = self.limits.check(level)?;
        self.write(level);
        Ok(())
    }

    /// Move to `0..=180` degrees, mapped linearly onto the limits.
    ///
    /// # Errors
    ///
    /// [`Error::DegreesOutOfRange`] above 180.
    pub fn set_degrees(&mut self, degrees: u16) -> Result<()> {
        let level = self.limits.level_for_degrees(degrees)?;
        #[cfg(not(feature = "host"))]
        defmt::info!("Servo set_degrees({}) -> level {}", degrees, level);
        self.write(level);
        Ok(())
    }

    /// Write `level` and wait `dwell`.
    ///
    /// The dwell cannot be cut short.
    ///
    /// # Errors
    ///
    /// [`Error::LevelOutOfRange`] before anything is written.
    pub async fn hold_position(&mut self, level: u16, dwell: Duration) -> Result<()> {
        self.set_level(level)?;
        #[cfg(not(feature = "host"))]
        defmt::info!("Servo hold level {} for {} ms", level, dwell.as_millis());
        self.delay.delay_ms(millis(dwell)).await;
        Ok(())
    }

    /// Stop the output so the servo can move freely.
    pub fn relax(&mut self) {
        self.pwm.set_enabled(false);
    }

    /// Resume the output at the last commanded level.
    pub fn hold(&mut self) {
        self.pwm.set_enabled(true);
    }

    /// Walk from `from` to `to` (either direction), writing every `step` and
    /// waiting `step_delay` after each write.
    ///
    /// Both ends are written. When `step` does not divide the distance the
    /// last step is clamped onto `to`, so no write passes it.
    ///
    /// Returns [`ControlFlow::Break`] if `stop` was raised before the ramp
    /// finished. A stop raised before the call writes nothing.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidStep`] for a zero step, [`Error::LevelOutOfRange`] if
    /// either end is outside the limits.
    pub async fn ramp(
        &mut self,
        from: u16,
        to: u16,
        step: u16,
        step_delay: Duration,
        stop: &StopSignal,
    ) -> Result<ControlFlow<()>> {
        if step == 0 {
            return Err(Error::InvalidStep);
        }
        self.limits.check(from)?;
        self.limits.check(to)?;
        if stop.signaled() {
            return Ok(ControlFlow::Break(()));
        }

        let mut level = from;
        loop {
            self.write(level);
            if self.pause(step_delay, stop).await.is_break() {
                return Ok(ControlFlow::Break(()));
            }
            if level == to {
                return Ok(ControlFlow::Continue(()));
            }
            level = if from < to {
                level.saturating_add(step).min(to)
            } else {
                level.saturating_sub(step).max(to)
            };
        }
    }

    /// Ramp up then down between the sweep bounds until `stop` is raised.
    ///
    /// Each cycle writes `min..=max` and then `max..=min`, so the bounds are
    /// written twice in a row at each turn.
    ///
    /// # Errors
    ///
    /// [`Error::LevelOutOfRange`] if the sweep reaches outside the limits.
    pub async fn sweep(&mut self, sweep: &Sweep, stop: &StopSignal) -> Result<()> {
        #[cfg(not(feature = "host"))]
        defmt::info!(
            "Servo sweep {}..={} step {} every {} ms",
            sweep.min(),
            sweep.max(),
            sweep.step(),
            sweep.step_delay().as_millis()
        );
        loop {
            let up = self
                .ramp(
                    sweep.min(),
                    sweep.max(),
                    sweep.step(),
                    sweep.step_delay(),
                    stop,
                )
                .await?;
            if up.is_break() {
                break;
            }
            let down = self
                .ramp(
                    sweep.max(),
                    sweep.min(),
                    sweep.step(),
                    sweep.step_delay(),
                    stop,
                )
                .await?;
            if down.is_break() {
                break;
            }
        }
        #[cfg(not(feature = "host"))]
        defmt::info!("Servo sweep stopped at level {}", self.level);
        Ok(())
    }

    /// Hold each `(level, dwell)` in turn, then [`sweep`](Self::sweep) until `stop`.
    ///
    /// A raised `stop` is noticed between positions and during the sweep.
    ///
    /// # Errors
    ///
    /// The first error from [`hold_position`](Self::hold_position) or
    /// [`sweep`](Self::sweep); nothing further is written after it.
    pub async fn run(
        &mut self,
        positions: &[(u16, Duration)],
        sweep: &Sweep,
        stop: &StopSignal,
    ) -> Result<()> {
        for &(level, dwell) in positions {
            if stop.signaled() {
                return Ok(());
            }
            self.hold_position(level, dwell).await?;
        }
        self.sweep(sweep, stop).await
    }

    fn write(&mut self, level: u16) {
        self.pwm.set_level(level);
        self.level = Some(level);
    }

    async fn pause(&mut self, duration: Duration, stop: &StopSignal) -> ControlFlow<()> {
        if stop.signaled() {
            return ControlFlow::Break(());
        }
        match select(self.delay.delay_ms(millis(duration)), stop.wait()).await {
            Either::First(()) => ControlFlow::Continue(()),
            Either::Second(()) => ControlFlow::Break(()),
        }
    }
}

fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}
