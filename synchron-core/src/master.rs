//! Transaction engine
//!
//! Sequences an I2C master peripheral through complete transactions:
//! single-byte read, single-byte write, and multi-byte burst write against
//! a 7-bit device address plus an 8-bit register address. Every flag wait
//! is a bounded busy-poll; a transaction either completes or returns a
//! definite error, never hangs and never reports partial success.
//!
//! The three operations share one prefix (bus-free wait, START, address
//! phase in write direction, register-address byte) and differ only in
//! their suffix:
//!
//! - read: repeated START, address phase in read direction with ACK
//!   disabled ahead of the flag clear, STOP, receive
//! - write: data byte, full-completion wait, STOP
//! - burst write: register-drain wait per byte, one full-completion wait
//!   after the last byte, STOP

use synchron_hal::{Direction, I2cPort, Status};

use crate::error::{BusError, WaitPhase};

/// Largest valid 7-bit device address
pub const MAX_DEVICE_ADDRESS: u8 = 0x7F;

/// Default per-wait-step poll budget
///
/// Generous for a 100 kHz bus: a single byte takes tens of microseconds
/// on the wire, while a stuck flag burns the budget in well under a
/// millisecond of spinning.
pub const DEFAULT_POLL_BUDGET: u32 = 10_000;

/// Form the address-phase byte from a 7-bit device address and a
/// transfer direction.
pub fn address_byte(device: u8, direction: Direction) -> u8 {
    (device << 1) | direction.bit()
}

/// Engine configuration
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MasterConfig {
    /// Maximum status polls per wait step before `Timeout`
    pub poll_budget: u32,
    /// Report a hardware NACK flag as `NotAcknowledged`
    ///
    /// When false the engine ignores the flag and proceeds on status
    /// alone; an unacknowledged phase then starves its awaited flag and
    /// surfaces as `Timeout`.
    pub strict_ack: bool,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            poll_budget: DEFAULT_POLL_BUDGET,
            strict_ack: true,
        }
    }
}

/// I2C master transaction engine
///
/// Owns its port for as long as it lives, making the single-owner
/// discipline explicit: a second transaction cannot begin until the
/// `&mut self` borrow of the previous one has ended. The engine holds no
/// state between calls beyond the port and its configuration.
pub struct I2cMaster<P: I2cPort> {
    port: P,
    config: MasterConfig,
}

impl<P: I2cPort> I2cMaster<P> {
    /// Create an engine with the default configuration
    pub fn new(port: P) -> Self {
        Self::with_config(port, MasterConfig::default())
    }

    /// Create an engine with an explicit configuration
    pub fn with_config(port: P, config: MasterConfig) -> Self {
        Self { port, config }
    }

    /// Get the configuration
    pub fn config(&self) -> &MasterConfig {
        &self.config
    }

    /// Reset the peripheral after a failed transaction
    ///
    /// The engine never recovers on its own; after an error the caller
    /// decides whether to reset and retry the whole transaction.
    pub fn reset(&mut self) {
        self.port.software_reset();
    }

    /// Release the port
    pub fn release(self) -> P {
        self.port
    }

    /// Read one byte from `register` of the device at `device`.
    pub fn read_byte(&mut self, device: u8, register: u8) -> Result<u8, BusError> {
        self.begin_write(device, register)?;

        self.port.request_restart();
        self.wait(WaitPhase::StartGenerated)?;

        self.port.write_data(address_byte(device, Direction::Read));
        self.wait(WaitPhase::AddressComplete)?;
        // ACK must be off before the address flag is released; once the
        // flag clears the peripheral commits to shifting in the data byte
        // and the NACK window for "last byte" is gone.
        self.port.set_ack(false);
        self.port.clear_address_flag();

        self.port.request_stop();

        self.wait(WaitPhase::RxNotEmpty)?;
        Ok(self.port.read_data())
    }

    /// Write one byte to `register` of the device at `device`.
    pub fn write_byte(&mut self, device: u8, register: u8, data: u8) -> Result<(), BusError> {
        self.begin_write(device, register)?;

        self.wait(WaitPhase::TxEmpty)?;
        self.port.write_data(data);

        // TxEmpty only means the register is free; the byte must have
        // fully shifted out and been acknowledged before STOP.
        self.wait(WaitPhase::ByteFinished)?;
        self.port.request_stop();
        Ok(())
    }

    /// Write `payload` to consecutive registers starting at `register`.
    ///
    /// Waits only for the data register to drain between bytes, letting
    /// the hardware shift one byte out while the next is queued. Only the
    /// final byte's full completion is awaited before STOP; stopping while
    /// a byte is still shifting truncates the transfer.
    pub fn burst_write(
        &mut self,
        device: u8,
        register: u8,
        payload: &[u8],
    ) -> Result<(), BusError> {
        if payload.is_empty() {
            return Err(BusError::InvalidArgument);
        }
        self.begin_write(device, register)?;

        for &byte in payload {
            self.wait(WaitPhase::TxEmpty)?;
            self.port.write_data(byte);
        }

        self.wait(WaitPhase::ByteFinished)?;
        self.port.request_stop();
        Ok(())
    }

    /// Shared transaction prefix: bus-free wait, START, address phase in
    /// write direction, register-address byte.
    fn begin_write(&mut self, device: u8, register: u8) -> Result<(), BusError> {
        if device > MAX_DEVICE_ADDRESS {
            return Err(BusError::InvalidArgument);
        }

        self.wait(WaitPhase::BusBusyClear)?;
        self.port.request_start();
        self.wait(WaitPhase::StartGenerated)?;

        self.port.write_data(address_byte(device, Direction::Write));
        self.wait(WaitPhase::AddressComplete)?;
        self.port.clear_address_flag();

        self.wait(WaitPhase::TxEmpty)?;
        self.port.write_data(register);
        Ok(())
    }

    /// Poll the status surface until `phase` is ready, up to the
    /// configured budget.
    fn wait(&mut self, phase: WaitPhase) -> Result<(), BusError> {
        for _ in 0..self.config.poll_budget {
            let status = self.port.status();
            if self.config.strict_ack && status.nack {
                return Err(BusError::NotAcknowledged);
            }
            if phase_ready(phase, &status) {
                return Ok(());
            }
        }
        Err(BusError::Timeout { phase })
    }
}

/// The status flag each wait step parks on.
fn phase_ready(phase: WaitPhase, status: &Status) -> bool {
    match phase {
        WaitPhase::BusBusyClear => !status.busy,
        WaitPhase::StartGenerated => status.start_generated,
        WaitPhase::AddressComplete => status.address_complete,
        WaitPhase::TxEmpty => status.tx_empty,
        WaitPhase::ByteFinished => status.byte_finished,
        WaitPhase::RxNotEmpty => status.rx_not_empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimPort;

    #[test]
    fn test_address_byte_formation() {
        assert_eq!(address_byte(0x68, Direction::Write), 0xD0);
        assert_eq!(address_byte(0x68, Direction::Read), 0xD1);
        assert_eq!(address_byte(0x00, Direction::Write), 0x00);
        assert_eq!(address_byte(0x7F, Direction::Read), 0xFF);
    }

    #[test]
    fn test_phase_ready_table() {
        let mut status = Status::default();
        // Idle bus: only the busy-clear wait is satisfied
        assert!(phase_ready(WaitPhase::BusBusyClear, &status));
        assert!(!phase_ready(WaitPhase::StartGenerated, &status));

        status.busy = true;
        status.start_generated = true;
        assert!(!phase_ready(WaitPhase::BusBusyClear, &status));
        assert!(phase_ready(WaitPhase::StartGenerated, &status));

        status.tx_empty = true;
        status.byte_finished = true;
        status.rx_not_empty = true;
        status.address_complete = true;
        assert!(phase_ready(WaitPhase::TxEmpty, &status));
        assert!(phase_ready(WaitPhase::ByteFinished, &status));
        assert!(phase_ready(WaitPhase::RxNotEmpty, &status));
        assert!(phase_ready(WaitPhase::AddressComplete, &status));
    }

    #[test]
    fn test_invalid_device_address_rejected() {
        let mut master = I2cMaster::new(SimPort::new(0x68));
        assert_eq!(
            master.write_byte(0x80, 0x00, 0x12),
            Err(BusError::InvalidArgument)
        );
        assert_eq!(master.read_byte(0xFF, 0x00), Err(BusError::InvalidArgument));
        // Nothing reached the bus
        assert!(master.release().events().is_empty());
    }

    #[test]
    fn test_write_byte_happy_path() {
        let mut master = I2cMaster::new(SimPort::new(0x68));
        master.write_byte(0x68, 0x0E, 0x00).unwrap();

        let port = master.release();
        assert_eq!(port.register(0x0E), 0x00);
        assert!(port.violations().is_empty());
    }

    #[test]
    fn test_default_config() {
        let master = I2cMaster::new(SimPort::new(0x68));
        assert_eq!(master.config().poll_budget, DEFAULT_POLL_BUDGET);
        assert!(master.config().strict_ack);
    }
}
