//! DS1337 real-time clock driver
//!
//! The DS1337 keeps seconds through year in seven BCD registers starting
//! at address 0x00, with an auto-incrementing register pointer, so a full
//! time/date image can be set in one burst write. Device address is fixed
//! at 0x68.
//!
//! # Register usage
//!
//! - Time/date is written in one burst starting at the seconds register
//! - Individual registers are read one at a time (seconds polling is the
//!   common case and costs a single transaction)
//! - Writing 0x00 to the control register enables the oscillator and the
//!   1 Hz square-wave output

use synchron_core::{BusError, I2cMaster};
use synchron_hal::I2cPort;

/// Fixed 7-bit device address (1101000)
pub const DEVICE_ADDRESS: u8 = 0x68;

/// DS1337 register addresses
pub mod reg {
    /// Seconds (00-59, BCD)
    pub const SECONDS: u8 = 0x00;
    /// Minutes (00-59, BCD)
    pub const MINUTES: u8 = 0x01;
    /// Hours (BCD; bit 6 selects 12-hour mode)
    pub const HOURS: u8 = 0x02;
    /// Day of week (1-7)
    pub const DAY: u8 = 0x03;
    /// Date (01-31, BCD)
    pub const DATE: u8 = 0x04;
    /// Month (01-12, BCD; bit 7 is the century flag)
    pub const MONTH: u8 = 0x05;
    /// Year (00-99, BCD)
    pub const YEAR: u8 = 0x06;
    /// Control (oscillator, square wave, alarm interrupts)
    pub const CONTROL: u8 = 0x0E;
    /// Status (oscillator-stop and alarm flags)
    pub const STATUS: u8 = 0x0F;
}

/// Control register bits
pub mod control {
    /// Oscillator disabled when set
    pub const EOSC_N: u8 = 1 << 7;
    /// Square-wave rate select, high bit
    pub const RS2: u8 = 1 << 4;
    /// Square-wave rate select, low bit
    pub const RS1: u8 = 1 << 3;
    /// Route alarms to the interrupt output instead of the square wave
    pub const INTCN: u8 = 1 << 2;
    /// Alarm 2 interrupt enable
    pub const A2IE: u8 = 1 << 1;
    /// Alarm 1 interrupt enable
    pub const A1IE: u8 = 1 << 0;
}

/// Status register bits
pub mod status {
    /// Oscillator stopped at some point; timekeeping data is suspect
    pub const OSF: u8 = 1 << 7;
    /// Alarm 2 match
    pub const A2F: u8 = 1 << 1;
    /// Alarm 1 match
    pub const A1F: u8 = 1 << 0;
}

/// Convert a packed BCD byte to binary
pub fn bcd_to_bin(bcd: u8) -> u8 {
    (bcd >> 4) * 10 + (bcd & 0x0F)
}

/// Convert a binary value (0-99) to packed BCD
pub fn bin_to_bcd(bin: u8) -> u8 {
    ((bin / 10) << 4) | (bin % 10)
}

/// A full time/date image, in binary (not BCD) units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeDate {
    /// Seconds (0-59)
    pub seconds: u8,
    /// Minutes (0-59)
    pub minutes: u8,
    /// Hours (0-23, 24-hour mode)
    pub hours: u8,
    /// Day of week (1-7)
    pub weekday: u8,
    /// Date (1-31)
    pub date: u8,
    /// Month (1-12)
    pub month: u8,
    /// Year within century (0-99)
    pub year: u8,
}

impl TimeDate {
    /// Encode as the seven-register BCD image starting at
    /// [`reg::SECONDS`].
    pub fn to_registers(&self) -> [u8; 7] {
        [
            bin_to_bcd(self.seconds),
            bin_to_bcd(self.minutes),
            bin_to_bcd(self.hours),
            self.weekday,
            bin_to_bcd(self.date),
            bin_to_bcd(self.month),
            bin_to_bcd(self.year),
        ]
    }

    /// Decode from the seven-register BCD image.
    ///
    /// Masks the 12-hour mode bit out of the hours register and the
    /// century flag out of the month register.
    pub fn from_registers(image: &[u8; 7]) -> Self {
        Self {
            seconds: bcd_to_bin(image[0] & 0x7F),
            minutes: bcd_to_bin(image[1] & 0x7F),
            hours: bcd_to_bin(image[2] & 0x3F),
            weekday: image[3] & 0x07,
            date: bcd_to_bin(image[4] & 0x3F),
            month: bcd_to_bin(image[5] & 0x1F),
            year: bcd_to_bin(image[6]),
        }
    }
}

/// DS1337 driver over the transaction engine.
pub struct Ds1337<P: I2cPort> {
    bus: I2cMaster<P>,
}

impl<P: I2cPort> Ds1337<P> {
    /// Create a driver over an engine
    pub fn new(bus: I2cMaster<P>) -> Self {
        Self { bus }
    }

    /// Release the engine
    pub fn release(self) -> I2cMaster<P> {
        self.bus
    }

    /// Read the seconds register (binary)
    pub fn seconds(&mut self) -> Result<u8, BusError> {
        let raw = self.bus.read_byte(DEVICE_ADDRESS, reg::SECONDS)?;
        Ok(bcd_to_bin(raw & 0x7F))
    }

    /// Read the full time/date image
    pub fn read_time(&mut self) -> Result<TimeDate, BusError> {
        let mut image = [0u8; 7];
        for (i, slot) in image.iter_mut().enumerate() {
            *slot = self.bus.read_byte(DEVICE_ADDRESS, reg::SECONDS + i as u8)?;
        }
        Ok(TimeDate::from_registers(&image))
    }

    /// Set the full time/date image in a single burst write
    pub fn set_time(&mut self, time: &TimeDate) -> Result<(), BusError> {
        self.bus
            .burst_write(DEVICE_ADDRESS, reg::SECONDS, &time.to_registers())
    }

    /// Enable the oscillator and the 1 Hz square-wave output
    ///
    /// Clears every control bit: oscillator running, rate select at 1 Hz,
    /// square wave routed to the output pin.
    pub fn enable_square_wave(&mut self) -> Result<(), BusError> {
        self.bus.write_byte(DEVICE_ADDRESS, reg::CONTROL, 0x00)
    }

    /// Write the control register
    pub fn write_control(&mut self, value: u8) -> Result<(), BusError> {
        self.bus.write_byte(DEVICE_ADDRESS, reg::CONTROL, value)
    }

    /// Whether the oscillator has stopped since the flag was last cleared
    pub fn oscillator_stopped(&mut self) -> Result<bool, BusError> {
        let status = self.bus.read_byte(DEVICE_ADDRESS, reg::STATUS)?;
        Ok(status & status::OSF != 0)
    }

    /// Clear the oscillator-stop and alarm flags
    pub fn clear_status(&mut self) -> Result<(), BusError> {
        self.bus.write_byte(DEVICE_ADDRESS, reg::STATUS, 0x00)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synchron_core::sim::{BusEvent, SimPort};

    fn driver() -> Ds1337<SimPort> {
        Ds1337::new(I2cMaster::new(SimPort::new(DEVICE_ADDRESS)))
    }

    #[test]
    fn test_bcd_conversions() {
        assert_eq!(bcd_to_bin(0x55), 55);
        assert_eq!(bcd_to_bin(0x09), 9);
        assert_eq!(bin_to_bcd(58), 0x58);
        assert_eq!(bin_to_bcd(7), 0x07);

        for value in 0..=99 {
            assert_eq!(bcd_to_bin(bin_to_bcd(value)), value);
        }
    }

    #[test]
    fn test_time_image_encoding() {
        // 10:58:55 on Tuesday 26 September 2017
        let time = TimeDate {
            seconds: 55,
            minutes: 58,
            hours: 10,
            weekday: 3,
            date: 26,
            month: 9,
            year: 17,
        };
        assert_eq!(
            time.to_registers(),
            [0x55, 0x58, 0x10, 0x03, 0x26, 0x09, 0x17]
        );
        assert_eq!(TimeDate::from_registers(&time.to_registers()), time);
    }

    #[test]
    fn test_set_time_bursts_from_seconds_register() {
        let mut rtc = driver();
        let time = TimeDate {
            seconds: 55,
            minutes: 58,
            hours: 10,
            weekday: 3,
            date: 26,
            month: 9,
            year: 17,
        };
        rtc.set_time(&time).unwrap();

        let port = rtc.release().release();
        assert!(port.violations().is_empty());
        assert_eq!(port.register(reg::SECONDS), 0x55);
        assert_eq!(port.register(reg::YEAR), 0x17);
        assert!(port
            .events()
            .contains(&BusEvent::Select { register: reg::SECONDS }));
    }

    #[test]
    fn test_set_then_read_time_round_trip() {
        let mut rtc = driver();
        let time = TimeDate {
            seconds: 1,
            minutes: 2,
            hours: 23,
            weekday: 7,
            date: 31,
            month: 12,
            year: 99,
        };
        rtc.set_time(&time).unwrap();
        assert_eq!(rtc.read_time().unwrap(), time);
    }

    #[test]
    fn test_seconds_polling() {
        let mut port = SimPort::new(DEVICE_ADDRESS);
        port.set_register(reg::SECONDS, 0x37);

        let mut rtc = Ds1337::new(I2cMaster::new(port));
        assert_eq!(rtc.seconds().unwrap(), 37);
    }

    #[test]
    fn test_enable_square_wave_clears_control() {
        let mut rtc = driver();
        rtc.write_control(control::EOSC_N | control::INTCN).unwrap();
        rtc.enable_square_wave().unwrap();

        let port = rtc.release().release();
        assert_eq!(port.register(reg::CONTROL), 0x00);
    }

    #[test]
    fn test_oscillator_stop_flag() {
        let mut rtc = driver();
        rtc.clear_status().unwrap();
        assert!(!rtc.oscillator_stopped().unwrap());
    }
}
