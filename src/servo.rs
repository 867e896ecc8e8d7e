//! RP2040/RP2350 hardware PWM backend for [`ServoDriver`].
//!
//! [`servo_driver`] binds a GPIO to its PWM slice, programs divider and wrap,
//! and hands back a driver that writes the slice's compare register.
//! Pairing a pin with the wrong slice is a compile error: [`ServoPwmPin`] is
//! only implemented for the pairs the chip actually wires together.

use defmt::{info, warn};
use embassy_rp::clocks::clk_sys_freq;
use embassy_rp::pwm::{Config, Pwm};
use embassy_rp::{Peri, PeripheralType};
use embassy_time::Delay;

use crate::Result;
use crate::servo_config::{
    Channel, ServoLimits, SliceConfig, divider_parts, frame_micros, slice_for_gpio, tick_hz,
};
use crate::servo_driver::{PwmSlice, ServoDriver};

/// Servo driver on a hardware PWM slice, waiting with the embassy timer.
pub type RpServoDriver<'d> = ServoDriver<RpPwmSlice<'d>, Delay>;

/// GPIO that can drive PWM slice `S`.
///
/// Implemented for every `(PIN_n, PWM_SLICEm)` pair the chip routes together.
pub trait ServoPwmPin<S: PeripheralType>: PeripheralType {
    /// GPIO number, for logging and runtime checks.
    const GPIO: u8;
    /// Slice channel the pin is wired to.
    const CHANNEL: Channel;

    /// Claim the pin and slice as a PWM output.
    fn new_pwm<'d>(slice: Peri<'d, S>, pin: Peri<'d, Self>) -> Pwm<'d>;
}

macro_rules! servo_pin_map {
    ($gpio:literal, $pin:ident, $slice:ident, A) => {
        impl ServoPwmPin<embassy_rp::peripherals::$slice> for embassy_rp::peripherals::$pin {
            const GPIO: u8 = $gpio;
            const CHANNEL: Channel = Channel::A;
            fn new_pwm<'d>(
                slice: Peri<'d, embassy_rp::peripherals::$slice>,
                pin: Peri<'d, Self>,
            ) -> Pwm<'d> {
                Pwm::new_output_a(slice, pin, Config::default())
            }
        }
    };
    ($gpio:literal, $pin:ident, $slice:ident, B) => {
        impl ServoPwmPin<embassy_rp::peripherals::$slice> for embassy_rp::peripherals::$pin {
            const GPIO: u8 = $gpio;
            const CHANNEL: Channel = Channel::B;
            fn new_pwm<'d>(
                slice: Peri<'d, embassy_rp::peripherals::$slice>,
                pin: Peri<'d, Self>,
            ) -> Pwm<'d> {
                Pwm::new_output_b(slice, pin, Config::default())
            }
        }
    };
}

servo_pin_map!(0, PIN_0, PWM_SLICE0, A);
servo_pin_map!(1, PIN_1, PWM_SLICE0, B);
servo_pin_map!(2, PIN_2, PWM_SLICE1, A);
servo_pin_map!(3, PIN_3, PWM_SLICE1, B);
servo_pin_map!(4, PIN_4, PWM_SLICE2, A);
servo_pin_map!(5, PIN_5, PWM_SLICE2, B);
servo_pin_map!(6, PIN_6, PWM_SLICE3, A);
servo_pin_map!(7, PIN_7, PWM_SLICE3, B);
servo_pin_map!(8, PIN_8, PWM_SLICE4, A);
servo_pin_map!(9, PIN_9, PWM_SLICE4, B);
servo_pin_map!(10, PIN_10, PWM_SLICE5, A);
servo_pin_map!(11, PIN_11, PWM_SLICE5, B);
servo_pin_map!(12, PIN_12, PWM_SLICE6, A);
servo_pin_map!(13, PIN_13, PWM_SLICE6, B);
servo_pin_map!(14, PIN_14, PWM_SLICE7, A);
servo_pin_map!(15, PIN_15, PWM_SLICE7, B);
servo_pin_map!(16, PIN_16, PWM_SLICE0, A);
servo_pin_map!(17, PIN_17, PWM_SLICE0, B);
servo_pin_map!(18, PIN_18, PWM_SLICE1, A);
servo_pin_map!(19, PIN_19, PWM_SLICE1, B);
servo_pin_map!(20, PIN_20, PWM_SLICE2, A);
servo_pin_map!(21, PIN_21, PWM_SLICE2, B);
servo_pin_map!(22, PIN_22, PWM_SLICE3, A);
servo_pin_map!(23, PIN_23, PWM_SLICE3, B);
servo_pin_map!(24, PIN_24, PWM_SLICE4, A);
servo_pin_map!(25, PIN_25, PWM_SLICE4, B);
servo_pin_map!(26, PIN_26, PWM_SLICE5, A);
servo_pin_map!(27, PIN_27, PWM_SLICE5, B);
servo_pin_map!(28, PIN_28, PWM_SLICE6, A);
servo_pin_map!(29, PIN_29, PWM_SLICE6, B);

#[cfg(feature = "pico2")]
servo_pin_map!(30, PIN_30, PWM_SLICE7, A);
#[cfg(feature = "pico2")]
servo_pin_map!(31, PIN_31, PWM_SLICE7, B);
#[cfg(feature = "pico2")]
servo_pin_map!(32, PIN_32, PWM_SLICE8, A);
#[cfg(feature = "pico2")]
servo_pin_map!(33, PIN_33, PWM_SLICE8, B);
#[cfg(feature = "pico2")]
servo_pin_map!(34, PIN_34, PWM_SLICE9, A);
#[cfg(feature = "pico2")]
servo_pin_map!(35, PIN_35, PWM_SLICE9, B);
#[cfg(feature = "pico2")]
servo_pin_map!(36, PIN_36, PWM_SLICE10, A);
#[cfg(feature = "pico2")]
servo_pin_map!(37, PIN_37, PWM_SLICE10, B);
#[cfg(feature = "pico2")]
servo_pin_map!(38, PIN_38, PWM_SLICE11, A);
#[cfg(feature = "pico2")]
servo_pin_map!(39, PIN_39, PWM_SLICE11, B);
#[cfg(feature = "pico2")]
servo_pin_map!(40, PIN_40, PWM_SLICE8, A);
#[cfg(feature = "pico2")]
servo_pin_map!(41, PIN_41, PWM_SLICE8, B);
#[cfg(feature = "pico2")]
servo_pin_map!(42, PIN_42, PWM_SLICE9, A);
#[cfg(feature = "pico2")]
servo_pin_map!(43, PIN_43, PWM_SLICE9, B);
#[cfg(feature = "pico2")]
servo_pin_map!(44, PIN_44, PWM_SLICE10, A);
#[cfg(feature = "pico2")]
servo_pin_map!(45, PIN_45, PWM_SLICE10, B);
#[cfg(feature = "pico2")]
servo_pin_map!(46, PIN_46, PWM_SLICE11, A);
#[cfg(feature = "pico2")]
servo_pin_map!(47, PIN_47, PWM_SLICE11, B);

/// Bind `pin` to `slice`, configure it, and return a driver.
///
/// # Example
/// ```rust,no_run
/// # #![no_std]
/// # #![no_main]
/// # use panic_probe as _;
/// use servo_sweep::servo::servo_driver;
/// use servo_sweep::servo_config::{ServoLimits, SliceConfig};
///
/// async fn example(p: embassy_rp::Peripherals) -> servo_sweep::Result<()> {
///     // GPIO 22 is channel A of PWM slice 3.
///     let mut servo =
///         servo_driver(p.PIN_22, p.PWM_SLICE3, SliceConfig::SERVO, ServoLimits::SERVO)?;
///     servo.hold_position(1_470, embassy_time::Duration::from_secs(1)).await?;
///     Ok(())
/// }
/// ```
///
/// # Errors
///
/// [`Error::InvalidPin`](crate::Error::InvalidPin) if the pin has no slice on
/// this chip, [`Error::InvalidLimits`](crate::Error::InvalidLimits) if the
/// limits do not fit in the frame.
pub fn servo_driver<'d, P, S>(
    pin: Peri<'d, P>,
    slice: Peri<'d, S>,
    slice_config: SliceConfig,
    limits: ServoLimits,
) -> Result<RpServoDriver<'d>>
where
    P: ServoPwmPin<S>,
    S: PeripheralType,
{
    let (slice_number, channel) = slice_for_gpio(P::GPIO)?;
    debug_assert!(channel == P::CHANNEL, "pin map disagrees with slice_for_gpio");
    info!(
        "servo GPIO {} -> PWM slice {} channel {}",
        P::GPIO,
        slice_number,
        if matches!(channel, Channel::A) { "A" } else { "B" }
    );
    let pwm = RpPwmSlice::new(P::new_pwm(slice, pin), P::CHANNEL);
    ServoDriver::configure(pwm, Delay, slice_config, limits)
}

/// One channel of an `embassy_rp` PWM slice.
pub struct RpPwmSlice<'d> {
    pwm: Pwm<'d>,
    cfg: Config, // kept so level writes do not reset the divider
    channel: Channel,
}

impl<'d> RpPwmSlice<'d> {
    /// Wrap a PWM output already bound to its pin.
    #[must_use]
    pub fn new(pwm: Pwm<'d>, channel: Channel) -> Self {
        let mut cfg = Config::default();
        cfg.enable = false;
        Self { pwm, cfg, channel }
    }
}

impl PwmSlice for RpPwmSlice<'_> {
    fn configure(&mut self, slice_config: &SliceConfig) {
        let clk = clk_sys_freq();
        let tick = tick_hz(clk, slice_config.divider());
        let frame_us = frame_micros(tick, slice_config.wrap());
        let (div_int, div_frac) = divider_parts(slice_config.divider());
        info!(
            "servo clk={}Hz div={}+{}/16 wrap={} tick={}Hz frame={}us",
            clk,
            div_int,
            div_frac,
            slice_config.wrap(),
            tick,
            frame_us
        );
        if tick != 1_000_000 {
            warn!("servo tick is {}Hz, levels are not microseconds", tick);
        }

        self.cfg.divider = slice_config.divider();
        self.cfg.top = slice_config.wrap();
        self.cfg.phase_correct = false; // edge-aligned => one level per tick
        self.cfg.enable = true;
        self.pwm.set_config(&self.cfg);
    }

    fn set_level(&mut self, level: u16) {
        // Reapply the stored config so the divider survives.
        match self.channel {
            Channel::A => self.cfg.compare_a = level,
            Channel::B => self.cfg.compare_b = level,
        }
        self.pwm.set_config(&self.cfg);
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.cfg.enable = enabled;
        self.pwm.set_config(&self.cfg);
    }
}
