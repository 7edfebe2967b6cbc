#![cfg_attr(not(test), no_std)]

//! A software successive-approximation ADC for embedded systems.
//!
//! The converter digitizes an unknown analog voltage using two pieces of
//! feedback hardware: a DAC output it can drive, and a comparator telling
//! it whether that output is currently above or below the input. An 8-bit
//! binary search over DAC codes pins the input down in exactly eight
//! compare cycles.
//!
//! The crate is `no_std` and built on the `embedded-hal` traits. Any
//! [`DacPort`] works as the output side; [`R2rLadder`] bit-bangs one from
//! eight GPIO pins driving an R-2R resistor ladder, which together with a
//! comparator wired to a GPIO input is enough to build an ADC from parts.
//!
//! # Examples
//!
//! ```
//! use sar_adc::{Config, R2rLadder, SarAdc};
//! # use embedded_hal_mock::{
//! #     delay::MockNoop,
//! #     pin::{Mock, State, Transaction},
//! # };
//! #
//! # // Comparator stuck above the input: every candidate bit is discarded.
//! # let candidates = [128u8, 64, 32, 16, 8, 4, 2, 1];
//! # let pins: [Mock; 8] = std::array::from_fn(|bit| {
//! #     let mut expectations: Vec<Transaction> = candidates
//! #         .iter()
//! #         .map(|code| {
//! #             Transaction::set(if code & (0x80 >> bit) != 0 {
//! #                 State::High
//! #             } else {
//! #                 State::Low
//! #             })
//! #         })
//! #         .collect();
//! #     // free() zeroes the ladder at the end.
//! #     expectations.push(Transaction::set(State::Low));
//! #     Mock::new(&expectations)
//! # });
//! # let comparator = Mock::new(&vec![Transaction::get(State::High); 8]);
//! # let delay = MockNoop::new();
//!
//! // 3.3 V full scale, 100 µs settle time after each DAC update
//! let config = Config::new(3300, 100).unwrap();
//! let ladder = R2rLadder::new(pins);
//! let mut adc = SarAdc::new(ladder, comparator, delay, config);
//!
//! let result = adc.convert().unwrap();
//! assert_eq!(result.code, 0);
//!
//! // Hand the hardware back once done; the DAC is left at code 0.
//! let (ladder, comparator, delay) = adc.free();
//! ```

mod converter;
mod ladder;
mod scale;

pub use converter::{AnalogInput, SarAdc};
pub use ladder::R2rLadder;
pub use scale::code_to_millivolts;

use embedded_hal::digital::v2::InputPin;

/// Resolution of the converter in bits.
pub const RESOLUTION: u32 = 8;

/// Largest code the converter can produce.
pub const MAX_CODE: u8 = u8::MAX;

/// Output side of the conversion loop.
///
/// Drives an analog output proportional to `code / 255` of the full-scale
/// voltage. Backed by whatever produces the voltage: a resistor ladder on
/// GPIO pins ([`R2rLadder`]), an external DAC chip, a filtered PWM signal.
/// The output must be stable within the configured settle time after
/// `write` returns.
pub trait DacPort {
    type Error;

    /// Drives the analog output to `code / 255` of full scale.
    fn write(&mut self, code: u8) -> Result<(), Self::Error>;
}

/// Feedback side of the conversion loop.
///
/// A 1-bit view of the analog domain: whether the DAC output currently
/// exceeds the unknown input voltage.
pub trait Comparator {
    type Error;

    /// Returns `true` while the DAC output exceeds the unknown input.
    fn is_above(&mut self) -> Result<bool, Self::Error>;
}

/// A comparator output wired to a GPIO input reads high when the DAC side
/// wins, so any input pin works as the feedback channel directly.
impl<P: InputPin> Comparator for P {
    type Error = P::Error;

    fn is_above(&mut self) -> Result<bool, Self::Error> {
        self.is_high()
    }
}

/// The error of a failed conversion.
///
/// A collaborator fault is surfaced immediately and is not retried; the
/// DAC is left at whatever code was last written. Call
/// [`SarAdc::reset`] before reusing the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<D, C> {
    /// The DAC port rejected a code write.
    Dac(D),
    /// The comparator read failed.
    Comparator(C),
}

/// Conversion parameters, validated once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    full_scale_mv: u32,
    settle_time_us: u32,
}

impl Config {
    /// Returns a config for the given full-scale voltage (mV) and settle
    /// time (µs), rejecting zero values.
    ///
    /// The full-scale voltage is whatever the DAC actually produces at
    /// code 255, so measure it rather than assuming the nominal supply
    /// rail. The settle time covers the DAC output and any downstream
    /// analog filtering; comparator readings taken earlier are invalid.
    pub fn new(full_scale_mv: u32, settle_time_us: u32) -> Result<Self, ConfigError> {
        if full_scale_mv == 0 {
            return Err(ConfigError::ZeroFullScale);
        }

        if settle_time_us == 0 {
            return Err(ConfigError::ZeroSettleTime);
        }

        Ok(Self {
            full_scale_mv,
            settle_time_us,
        })
    }

    /// The voltage produced at code 255, in millivolts.
    pub fn full_scale_mv(&self) -> u32 {
        self.full_scale_mv
    }

    /// The wait between a DAC update and the next comparator read, in
    /// microseconds.
    pub fn settle_time_us(&self) -> u32 {
        self.settle_time_us
    }
}

/// A rejected [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The full-scale voltage must be positive.
    ZeroFullScale,
    /// The settle time must be positive.
    ZeroSettleTime,
}

/// The outcome of one complete conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConversionResult {
    /// The largest code whose DAC output does not exceed the input.
    pub code: u8,
    /// `code` scaled to millivolts: `code * full_scale_mv / 255`.
    pub millivolts: u32,
    /// Number of write/settle/compare cycles the conversion took: 8 for
    /// [`SarAdc::convert`], up to 256 for [`SarAdc::convert_counting`].
    /// Multiplied by the settle time this bounds the latency from below.
    pub steps: u16,
}
