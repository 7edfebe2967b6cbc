use crate::{
    scale::code_to_millivolts, Comparator, Config, ConversionResult, DacPort, Error, MAX_CODE,
    RESOLUTION,
};
use embedded_hal::{
    adc::{Channel, OneShot},
    blocking::delay::DelayUs,
};

/// A successive-approximation analog-to-digital converter.
///
/// Owns a [`DacPort`], a [`Comparator`] and a delay provider for its
/// whole lifetime; nothing else may drive the DAC or read the comparator
/// while the converter holds them, which the ownership model enforces.
/// [`free`](SarAdc::free) zeroes the DAC and hands the hardware back.
#[derive(Debug)]
pub struct SarAdc<Dac, Comp, Delay> {
    dac: Dac,
    comparator: Comp,
    delay: Delay,
    config: Config,
}

impl<Dac, Comp, Delay> SarAdc<Dac, Comp, Delay>
where
    Dac: DacPort,
    Comp: Comparator,
    Delay: DelayUs<u32>,
{
    /// Returns a converter owning the given hardware.
    ///
    /// Build the [`Config`] first; [`Config::new`] is where invalid
    /// parameters are rejected.
    pub fn new(dac: Dac, comparator: Comp, delay: Delay, config: Config) -> Self {
        Self {
            dac,
            comparator,
            delay,
            config,
        }
    }

    /// Runs one 8-step binary search and returns the result.
    ///
    /// For each bit from the most significant down, the candidate code
    /// with that bit set is driven onto the DAC, the output is given
    /// [`Config::settle_time_us`] to stabilize, and the comparator
    /// decides: at or below the input keeps the bit, above discards it.
    /// Equality counts as "at or below". Exactly 8 DAC writes and 8
    /// comparator reads later, the accumulator holds the largest code
    /// whose DAC output does not exceed the input, to within one LSB of
    /// quantization.
    ///
    /// On a collaborator fault the DAC is left at an undefined code;
    /// call [`reset`](SarAdc::reset) before converting again.
    pub fn convert(&mut self) -> Result<ConversionResult, Error<Dac::Error, Comp::Error>> {
        let mut code = 0u8;
        let mut weight = 1u8 << (RESOLUTION - 1);

        while weight != 0 {
            let candidate = code | weight;
            let above = self.sample(candidate)?;

            if !above {
                code = candidate;
            }

            #[cfg(feature = "defmt")]
            defmt::trace!("sar step: candidate={=u8} above={=bool}", candidate, above);

            weight >>= 1;
        }

        Ok(self.result(code, RESOLUTION as u16))
    }

    /// Runs one sequential-counting conversion and returns the result.
    ///
    /// Sweeps codes upward from 0 until the DAC output first exceeds the
    /// input, then steps back one code. Returns the same code as
    /// [`convert`](SarAdc::convert) for the same input, but takes up to
    /// 256 write/settle/compare cycles where the binary search takes 8.
    /// Only worth it when per-step observability matters more than
    /// latency.
    pub fn convert_counting(&mut self) -> Result<ConversionResult, Error<Dac::Error, Comp::Error>> {
        for code in 0..=MAX_CODE {
            if self.sample(code)? {
                return Ok(self.result(code.saturating_sub(1), u16::from(code) + 1));
            }
        }

        Ok(self.result(MAX_CODE, u16::from(MAX_CODE) + 1))
    }

    /// Drives the DAC back to code 0.
    ///
    /// Required after a failed conversion, which leaves the DAC at
    /// whatever code was last written.
    pub fn reset(&mut self) -> Result<(), Error<Dac::Error, Comp::Error>> {
        self.dac.write(0).map_err(Error::Dac)
    }

    /// The conversion parameters.
    pub fn config(&self) -> Config {
        self.config
    }

    /// Destroys the converter and returns the hardware.
    ///
    /// The DAC is zeroed on a best-effort basis first, so released
    /// hardware never keeps driving a stale voltage.
    pub fn free(mut self) -> (Dac, Comp, Delay) {
        let _ = self.dac.write(0);

        (self.dac, self.comparator, self.delay)
    }

    /// One write/settle/compare cycle.
    fn sample(&mut self, code: u8) -> Result<bool, Error<Dac::Error, Comp::Error>> {
        self.dac.write(code).map_err(Error::Dac)?;
        self.delay.delay_us(self.config.settle_time_us());
        self.comparator.is_above().map_err(Error::Comparator)
    }

    fn result(&self, code: u8, steps: u16) -> ConversionResult {
        ConversionResult {
            code,
            millivolts: code_to_millivolts(code, self.config.full_scale_mv()),
            steps,
        }
    }
}

/// The single virtual input channel of a [`SarAdc`].
///
/// The converter measures one analog node, so its [`OneShot`] impl takes
/// this marker instead of a real pin.
#[derive(Debug, Default)]
pub struct AnalogInput;

impl<Dac, Comp, Delay> Channel<SarAdc<Dac, Comp, Delay>> for AnalogInput {
    type ID = ();

    fn channel() -> Self::ID {}
}

/// Lets the converter stand in for a hardware ADC anywhere the generic
/// `embedded-hal` ADC traits are consumed.
impl<Dac, Comp, Delay> OneShot<SarAdc<Dac, Comp, Delay>, u8, AnalogInput>
    for SarAdc<Dac, Comp, Delay>
where
    Dac: DacPort,
    Comp: Comparator,
    Delay: DelayUs<u32>,
{
    type Error = Error<Dac::Error, Comp::Error>;

    fn read(&mut self, _pin: &mut AnalogInput) -> nb::Result<u8, Self::Error> {
        let result = self.convert().map_err(nb::Error::Other)?;

        Ok(result.code)
    }
}
