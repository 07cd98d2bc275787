//! I2C master peripheral abstraction
//!
//! Models the control/status/data surface of a memory-mapped I2C master
//! block. The engine in synchron-core sequences transactions purely
//! through this trait, so a simulation port can stand in for real
//! silicon during host testing.

/// Transfer direction, encoded as the low bit of the address-phase byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Master transmits (direction bit 0)
    Write = 0,
    /// Master receives (direction bit 1)
    Read = 1,
}

impl Direction {
    /// The R/W bit value carried in the address-phase byte
    pub fn bit(self) -> u8 {
        self as u8
    }
}

/// Snapshot of the peripheral's status flags.
///
/// The flags are independent and edge-triggered by the hardware. Reading
/// a snapshot must not clear any of them; [`I2cPort::clear_address_flag`]
/// performs the explicit acknowledgment read that releases
/// `address_complete`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    /// A START (or repeated START) condition has been generated
    pub start_generated: bool,
    /// The address phase completed and was acknowledged
    pub address_complete: bool,
    /// The data register is free to accept the next outgoing byte
    pub tx_empty: bool,
    /// The previous byte has fully shifted out and been acknowledged
    pub byte_finished: bool,
    /// An incoming byte is waiting in the data register
    pub rx_not_empty: bool,
    /// A transfer is in progress on the bus
    pub busy: bool,
    /// The last address or data byte was not acknowledged
    pub nack: bool,
}

/// Control/status/data surface of an I2C master peripheral.
///
/// Implementations wrap a memory-mapped register block (or a simulation
/// of one). The engine owns the port exclusively for the lifetime of a
/// transaction; the trait takes `&mut self` throughout so that exclusive
/// ownership is visible in the type system.
pub trait I2cPort {
    /// Request a START condition once the bus is free
    fn request_start(&mut self);

    /// Request a repeated START mid-transaction
    ///
    /// On common silicon this is the same control bit as
    /// [`request_start`](Self::request_start); the hardware interprets it
    /// contextually.
    fn request_restart(&mut self) {
        self.request_start();
    }

    /// Request a STOP condition
    fn request_stop(&mut self);

    /// Enable or disable automatic ACK generation for received bytes
    ///
    /// Disabling ACK makes the master NACK the next incoming byte,
    /// signalling the peripheral that no further bytes will be accepted.
    fn set_ack(&mut self, enabled: bool);

    /// Reset the peripheral, releasing the bus and clearing all flags
    fn software_reset(&mut self);

    /// Read a snapshot of the status flags
    fn status(&mut self) -> Status;

    /// Clear the address-phase flag
    ///
    /// Performs the secondary status register read the hardware requires
    /// before the transfer can proceed past the address phase.
    fn clear_address_flag(&mut self);

    /// Write a byte into the shared data register
    fn write_data(&mut self, byte: u8);

    /// Read the byte waiting in the shared data register
    fn read_data(&mut self) -> u8;
}
