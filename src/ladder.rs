use crate::DacPort;
use embedded_hal::digital::v2::OutputPin;

/// An 8-bit DAC bit-banged from eight GPIO pins driving an R-2R resistor
/// ladder.
///
/// `pins[0]` carries the most significant bit, matching the top-to-bottom
/// order of the ladder rungs on the board.
#[derive(Debug)]
pub struct R2rLadder<Pin> {
    pins: [Pin; 8],
}

impl<Pin: OutputPin> R2rLadder<Pin> {
    pub fn new(pins: [Pin; 8]) -> Self {
        Self { pins }
    }

    /// Zeroes the ladder and returns the pins.
    pub fn free(mut self) -> [Pin; 8] {
        let _ = self.set_code(0);

        self.pins
    }

    fn set_code(&mut self, code: u8) -> Result<(), Pin::Error> {
        for (bit, pin) in self.pins.iter_mut().enumerate() {
            if code & (0x80 >> bit) != 0 {
                pin.set_high()?;
            } else {
                pin.set_low()?;
            }
        }

        Ok(())
    }
}

impl<Pin: OutputPin> DacPort for R2rLadder<Pin> {
    type Error = Pin::Error;

    fn write(&mut self, code: u8) -> Result<(), Self::Error> {
        self.set_code(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::{
        pin::{Mock, State, Transaction},
        MockError,
    };
    use std::io::ErrorKind;

    fn bit_state(code: u8, bit: usize) -> State {
        if code & (0x80 >> bit) != 0 {
            State::High
        } else {
            State::Low
        }
    }

    #[test]
    fn drives_pins_most_significant_bit_first() {
        let code = 0b1011_0001;
        let mut pins: [Mock; 8] =
            std::array::from_fn(|bit| Mock::new(&[Transaction::set(bit_state(code, bit))]));

        let mut ladder = R2rLadder::new(pins.clone());
        ladder.write(code).unwrap();

        for pin in pins.iter_mut() {
            pin.done();
        }
    }

    #[test]
    fn free_zeroes_the_ladder() {
        let mut pins: [Mock; 8] = std::array::from_fn(|bit| {
            Mock::new(&[
                Transaction::set(bit_state(0xff, bit)),
                Transaction::set(State::Low),
            ])
        });

        let mut ladder = R2rLadder::new(pins.clone());
        ladder.write(0xff).unwrap();
        ladder.free();

        for pin in pins.iter_mut() {
            pin.done();
        }
    }

    #[test]
    fn pin_fault_aborts_the_write() {
        let error = MockError::Io(ErrorKind::NotConnected);
        let mut pins: [Mock; 8] = std::array::from_fn(|_| Mock::new(&[]));
        pins[0] = Mock::new(&[Transaction::set(State::High).with_error(error)]);

        let mut ladder = R2rLadder::new(pins);

        assert!(ladder.write(0x80).is_err());
    }
}
