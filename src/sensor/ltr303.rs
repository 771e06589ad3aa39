//! LTR-303 ambient light sensor driver.
//!
//! Stateless wrapper over [`RegisterBus`]: every call goes to the device.
//! Blocking, so it must only run from the polling loop.

use super::registers::*;
use crate::bus::RegisterBus;
use crate::error::SensorError;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

/// Raw result of one combined channel read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelReading {
    /// CH0: visible + IR.
    pub ch0: u16,
    /// CH1: IR only.
    pub ch1: u16,
    /// The status register flagged the data as invalid.
    pub overrun: bool,
}

impl ChannelReading {
    /// Visible-light estimate (CH0 minus CH1).
    pub fn visible(&self) -> u16 {
        self.ch0.saturating_sub(self.ch1)
    }
}

pub struct Ltr303<I2C, D> {
    bus: RegisterBus<I2C>,
    delay: D,
}

impl<I2C: I2c, D: DelayNs> Ltr303<I2C, D> {
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self {
            bus: RegisterBus::new(i2c),
            delay,
        }
    }

    /// Verify the device identity, then reset and enable it.
    ///
    /// An identity mismatch stops here: no reset or enable is attempted.
    pub fn init(&mut self) -> Result<(), SensorError> {
        let part_id = self.read_reg(REG_PART_ID)?;
        if part_id != PART_ID_LTR303 {
            return Err(SensorError::WrongPartId(part_id));
        }

        let manufacturer_id = self.read_reg(REG_MANUFAC_ID)?;
        if manufacturer_id != MANUFACTURER_ID_LITEON {
            return Err(SensorError::WrongManufacturerId(manufacturer_id));
        }

        // The device powers up in standby; it has to be reset and put into
        // active mode before it starts converting.
        self.reset()?;
        self.enable()
    }

    /// Software reset. The control register must read back as zero once the
    /// settle time has passed.
    pub fn reset(&mut self) -> Result<(), SensorError> {
        let contr = self.read_reg(REG_ALS_CONTR)?;
        self.write_reg(REG_ALS_CONTR, contr | CONTR_SW_RESET)?;

        self.delay.delay_ms(RESET_SETTLE_MS);

        let contr = self.read_reg(REG_ALS_CONTR)?;
        if contr != 0x00 {
            return Err(SensorError::ResetNotCleared(contr));
        }
        Ok(())
    }

    /// Switch the ALS into active mode and confirm the bit stuck.
    pub fn enable(&mut self) -> Result<(), SensorError> {
        let contr = self.read_reg(REG_ALS_CONTR)?;
        self.write_reg(REG_ALS_CONTR, contr | CONTR_ALS_MODE_ACTIVE)?;

        let contr = self.read_reg(REG_ALS_CONTR)?;
        if contr & CONTR_ALS_MODE_ACTIVE == 0 {
            return Err(SensorError::NotActive(contr));
        }
        Ok(())
    }

    /// `true` when a measurement is waiting to be read.
    pub fn has_new_data(&mut self) -> Result<bool, SensorError> {
        let status = self.read_reg(REG_ALS_STATUS)?;
        Ok(status & STATUS_NEW_DATA != 0)
    }

    /// Read both channels in one burst, then check data validity.
    ///
    /// CH1 must be read before CH0 (the datasheet latches on the CH1 LSB), so all
    /// four bytes come from a single transaction starting at CH1. An overrun is
    /// reported in the result, not as an error.
    pub fn read_both_channels(&mut self) -> Result<ChannelReading, SensorError> {
        let mut data = [0u8; 4];
        self.bus.read(LTR303_I2C_ADDR, REG_ALS_DATA_CH1_0, &mut data)?;
        let ch1 = u16::from_le_bytes([data[0], data[1]]);
        let ch0 = u16::from_le_bytes([data[2], data[3]]);

        let status = self.read_reg(REG_ALS_STATUS)?;

        Ok(ChannelReading {
            ch0,
            ch1,
            overrun: status & STATUS_DATA_INVALID != 0,
        })
    }

    /// Give the bus and delay back.
    pub fn release(self) -> (I2C, D) {
        (self.bus.release(), self.delay)
    }

    fn read_reg(&mut self, register: u8) -> Result<u8, SensorError> {
        Ok(self.bus.read_u8(LTR303_I2C_ADDR, register)?)
    }

    fn write_reg(&mut self, register: u8, value: u8) -> Result<(), SensorError> {
        self.bus.write(LTR303_I2C_ADDR, register, &[value])?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests (run on host, not embedded)
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BusError;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    const A: u8 = LTR303_I2C_ADDR;

    fn read(reg: u8, value: u8) -> I2cTransaction {
        I2cTransaction::write_read(A, vec![reg], vec![value])
    }

    fn write(reg: u8, value: u8) -> I2cTransaction {
        I2cTransaction::write(A, vec![reg, value])
    }

    fn sensor(expectations: &[I2cTransaction]) -> Ltr303<I2cMock, NoopDelay> {
        Ltr303::new(I2cMock::new(expectations), NoopDelay)
    }

    fn finish(sensor: Ltr303<I2cMock, NoopDelay>) {
        let (mut i2c, _) = sensor.release();
        i2c.done();
    }

    #[test]
    fn init_verifies_identity_then_resets_and_enables() {
        let mut s = sensor(&[
            read(REG_PART_ID, PART_ID_LTR303),
            read(REG_MANUFAC_ID, MANUFACTURER_ID_LITEON),
            // reset
            read(REG_ALS_CONTR, 0x00),
            write(REG_ALS_CONTR, CONTR_SW_RESET),
            read(REG_ALS_CONTR, 0x00),
            // enable
            read(REG_ALS_CONTR, 0x00),
            write(REG_ALS_CONTR, CONTR_ALS_MODE_ACTIVE),
            read(REG_ALS_CONTR, CONTR_ALS_MODE_ACTIVE),
        ]);
        assert_eq!(s.init(), Ok(()));
        finish(s);
    }

    #[test]
    fn init_rejects_wrong_part_id_without_touching_control() {
        let mut s = sensor(&[read(REG_PART_ID, 0x90)]);
        assert_eq!(s.init(), Err(SensorError::WrongPartId(0x90)));
        finish(s);
    }

    #[test]
    fn init_rejects_wrong_manufacturer() {
        let mut s = sensor(&[
            read(REG_PART_ID, PART_ID_LTR303),
            read(REG_MANUFAC_ID, 0x06),
        ]);
        assert_eq!(s.init(), Err(SensorError::WrongManufacturerId(0x06)));
        finish(s);
    }

    #[test]
    fn reset_preserves_other_control_bits_in_the_write() {
        let mut s = sensor(&[
            read(REG_ALS_CONTR, 0x0C), // gain bits set
            write(REG_ALS_CONTR, 0x0C | CONTR_SW_RESET),
            read(REG_ALS_CONTR, 0x00),
        ]);
        assert_eq!(s.reset(), Ok(()));
        finish(s);
    }

    #[test]
    fn reset_fails_when_register_does_not_clear() {
        let mut s = sensor(&[
            read(REG_ALS_CONTR, 0x00),
            write(REG_ALS_CONTR, CONTR_SW_RESET),
            read(REG_ALS_CONTR, CONTR_SW_RESET),
        ]);
        assert_eq!(s.reset(), Err(SensorError::ResetNotCleared(CONTR_SW_RESET)));
        finish(s);
    }

    #[test]
    fn enable_fails_when_active_bit_does_not_stick() {
        let mut s = sensor(&[
            read(REG_ALS_CONTR, 0x00),
            write(REG_ALS_CONTR, CONTR_ALS_MODE_ACTIVE),
            read(REG_ALS_CONTR, 0x00),
        ]);
        assert_eq!(s.enable(), Err(SensorError::NotActive(0x00)));
        finish(s);
    }

    #[test]
    fn init_propagates_enable_failure() {
        let mut s = sensor(&[
            read(REG_PART_ID, PART_ID_LTR303),
            read(REG_MANUFAC_ID, MANUFACTURER_ID_LITEON),
            read(REG_ALS_CONTR, 0x00),
            write(REG_ALS_CONTR, CONTR_SW_RESET),
            read(REG_ALS_CONTR, 0x00),
            read(REG_ALS_CONTR, 0x00),
            write(REG_ALS_CONTR, CONTR_ALS_MODE_ACTIVE),
            read(REG_ALS_CONTR, 0x00),
        ]);
        assert_eq!(s.init(), Err(SensorError::NotActive(0x00)));
        finish(s);
    }

    #[test]
    fn has_new_data_checks_status_bit() {
        let mut s = sensor(&[
            read(REG_ALS_STATUS, STATUS_NEW_DATA),
            read(REG_ALS_STATUS, 0x00),
            read(REG_ALS_STATUS, STATUS_DATA_INVALID),
        ]);
        assert_eq!(s.has_new_data(), Ok(true));
        assert_eq!(s.has_new_data(), Ok(false));
        assert_eq!(s.has_new_data(), Ok(false));
        finish(s);
    }

    #[test]
    fn read_both_channels_decodes_little_endian_pairs() {
        let mut s = sensor(&[
            I2cTransaction::write_read(A, vec![REG_ALS_DATA_CH1_0], vec![0x34, 0x12, 0x78, 0x56]),
            read(REG_ALS_STATUS, 0x00),
        ]);
        let reading = s.read_both_channels().unwrap();
        assert_eq!(reading.ch1, 0x1234);
        assert_eq!(reading.ch0, 0x5678);
        assert!(!reading.overrun);
        assert_eq!(reading.visible(), 0x5678 - 0x1234);
        finish(s);
    }

    #[test]
    fn read_both_channels_keeps_values_on_overrun() {
        let mut s = sensor(&[
            I2cTransaction::write_read(A, vec![REG_ALS_DATA_CH1_0], vec![0x10, 0x00, 0x20, 0x00]),
            read(REG_ALS_STATUS, STATUS_DATA_INVALID | STATUS_NEW_DATA),
        ]);
        let reading = s.read_both_channels().unwrap();
        assert!(reading.overrun);
        assert_eq!((reading.ch0, reading.ch1), (0x20, 0x10));
        finish(s);
    }

    #[test]
    fn read_both_channels_propagates_bus_failure() {
        let mut s = sensor(&[I2cTransaction::write_read(
            A,
            vec![REG_ALS_DATA_CH1_0],
            vec![0, 0, 0, 0],
        )
        .with_error(ErrorKind::Other)]);
        assert_eq!(
            s.read_both_channels(),
            Err(SensorError::Bus(BusError::Transport(ErrorKind::Other)))
        );
        finish(s);
    }

    #[test]
    fn visible_never_underflows() {
        let reading = ChannelReading {
            ch0: 5,
            ch1: 9,
            overrun: false,
        };
        assert_eq!(reading.visible(), 0);
    }
}
