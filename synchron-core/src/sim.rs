//! Scripted peripheral simulation
//!
//! [`SimPort`] implements [`I2cPort`] over a model of a master peripheral
//! wired to a single register-addressed device: a 256-byte register file
//! behind an auto-incrementing register pointer, the way RTC and EEPROM
//! style parts behave. Host tests drive the engine against it and then
//! inspect what the "wire" saw.
//!
//! The model is observable and scriptable:
//!
//! - every bus-level action lands in an event journal ([`BusEvent`])
//! - protocol misuse is recorded ([`Violation`]) instead of silently
//!   tolerated
//! - faults can be scripted: a bus that stays busy, a START that never
//!   generates, a device that stops acknowledging ([`SimFault`],
//!   [`SimPort::hold_busy_for`])
//!
//! Timing model: outgoing bytes take one status poll to drain the data
//! register and a second poll to finish shifting, so waits that skip
//! either step are caught rather than rewarded.

use heapless::Vec;
use synchron_hal::{Direction, I2cPort, Status};

/// Capacity of the event journal
pub const EVENT_CAPACITY: usize = 128;

/// Capacity of the violation log
pub const VIOLATION_CAPACITY: usize = 8;

/// One observed bus-level action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusEvent {
    /// START condition
    Start,
    /// Repeated START condition
    Restart,
    /// Address phase byte
    Address {
        /// 7-bit device address seen on the wire
        device: u8,
        /// Transfer direction from the R/W bit
        direction: Direction,
    },
    /// Register pointer set by the first data byte after a write address
    Select {
        /// New register pointer value
        register: u8,
    },
    /// Data byte committed to the register file
    Write {
        /// Register the byte landed in
        register: u8,
        /// The byte value
        value: u8,
    },
    /// Data byte shifted out to the master
    Read {
        /// Register the byte came from
        register: u8,
        /// The byte value
        value: u8,
    },
    /// STOP condition
    Stop,
}

/// Protocol misuse detected by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Violation {
    /// The read address phase was released with ACK still enabled
    ///
    /// Once the address flag clears, the peripheral commits to the
    /// transfer; the single-byte NACK can no longer be signalled. The
    /// model also withholds the receive flag so the mistake surfaces as
    /// a timeout, matching what real silicon does to a corrupted read.
    AckWindowMissed,
    /// STOP requested while a byte was still shifting out
    TruncatedTransfer,
}

/// Scripted fault for a test scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SimFault {
    /// Normal operation
    #[default]
    None,
    /// The START condition flag never asserts
    StartNeverGenerated,
    /// The device stops acknowledging data bytes
    DataNotAcked,
}

/// Where the model is within a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimPhase {
    /// No transaction in progress
    Idle,
    /// START generated, expecting the address byte
    AddressSelect,
    /// Write address phase released, expecting the register pointer byte
    RegisterSelect,
    /// Register pointer set, data bytes land in the register file
    DataWrite,
    /// Read address phase released, byte loaded for the master
    DataRead,
}

/// Simulated I2C master peripheral with one attached device.
pub struct SimPort {
    device_address: u8,
    registers: [u8; 256],
    pointer: u8,
    phase: SimPhase,
    direction: Direction,
    status: Status,
    ack_enabled: bool,
    /// An outgoing byte occupies the shifter until two polls pass
    in_flight: bool,
    rx_byte: u8,
    busy_holdoff: u32,
    fault: SimFault,
    events: Vec<BusEvent, EVENT_CAPACITY>,
    violations: Vec<Violation, VIOLATION_CAPACITY>,
}

impl SimPort {
    /// Create a model with a device listening at `device_address`.
    pub fn new(device_address: u8) -> Self {
        Self {
            device_address,
            registers: [0; 256],
            pointer: 0,
            phase: SimPhase::Idle,
            direction: Direction::Write,
            status: Status::default(),
            ack_enabled: true,
            in_flight: false,
            rx_byte: 0,
            busy_holdoff: 0,
            fault: SimFault::None,
            events: Vec::new(),
            violations: Vec::new(),
        }
    }

    /// Script a fault for the next transaction(s)
    pub fn set_fault(&mut self, fault: SimFault) {
        self.fault = fault;
    }

    /// Report the bus as busy for the next `polls` status reads
    ///
    /// Models a prior transaction still settling on the wire.
    pub fn hold_busy_for(&mut self, polls: u32) {
        self.busy_holdoff = polls;
    }

    /// Preload a device register
    pub fn set_register(&mut self, register: u8, value: u8) {
        self.registers[register as usize] = value;
    }

    /// Current value of a device register
    pub fn register(&self, register: u8) -> u8 {
        self.registers[register as usize]
    }

    /// Everything observed on the bus so far
    pub fn events(&self) -> &[BusEvent] {
        &self.events
    }

    /// Protocol violations observed so far
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    fn record(&mut self, event: BusEvent) {
        let _ = self.events.push(event);
    }

    /// Advance the shifter by one poll: the data register drains first,
    /// then the byte finishes on the wire.
    fn tick(&mut self) {
        if !self.in_flight {
            return;
        }
        if !self.status.tx_empty {
            self.status.tx_empty = true;
        } else if !self.status.byte_finished {
            self.status.byte_finished = true;
            self.in_flight = false;
        }
    }

    fn accept_address(&mut self, byte: u8) {
        let device = byte >> 1;
        let direction = if byte & 1 == 0 {
            Direction::Write
        } else {
            Direction::Read
        };
        self.status.start_generated = false;
        self.in_flight = false;
        self.status.tx_empty = false;
        self.status.byte_finished = false;
        self.record(BusEvent::Address { device, direction });

        if device != self.device_address {
            // No device drives the ACK slot
            self.status.nack = true;
            return;
        }
        self.direction = direction;
        self.status.address_complete = true;
    }

    fn accept_data(&mut self, byte: u8) {
        if self.fault == SimFault::DataNotAcked {
            self.status.nack = true;
            self.in_flight = false;
            return;
        }
        match self.phase {
            SimPhase::RegisterSelect => {
                self.pointer = byte;
                self.record(BusEvent::Select { register: byte });
                self.phase = SimPhase::DataWrite;
            }
            SimPhase::DataWrite => {
                self.registers[self.pointer as usize] = byte;
                self.record(BusEvent::Write {
                    register: self.pointer,
                    value: byte,
                });
                self.pointer = self.pointer.wrapping_add(1);
            }
            _ => {}
        }
        self.status.tx_empty = false;
        self.status.byte_finished = false;
        self.in_flight = true;
    }
}

impl I2cPort for SimPort {
    fn request_start(&mut self) {
        if self.fault == SimFault::StartNeverGenerated {
            self.status.busy = true;
            return;
        }
        if self.phase == SimPhase::Idle {
            self.record(BusEvent::Start);
        } else {
            self.record(BusEvent::Restart);
        }
        self.status.busy = true;
        self.status.start_generated = true;
        self.phase = SimPhase::AddressSelect;
    }

    fn request_stop(&mut self) {
        if matches!(self.phase, SimPhase::RegisterSelect | SimPhase::DataWrite) && self.in_flight {
            let _ = self.violations.push(Violation::TruncatedTransfer);
        }
        self.record(BusEvent::Stop);
        self.phase = SimPhase::Idle;
        self.in_flight = false;
        self.status.busy = false;
        self.status.start_generated = false;
        self.status.address_complete = false;
        self.status.tx_empty = false;
        self.status.byte_finished = false;
        // An already-received byte stays readable after STOP
    }

    fn set_ack(&mut self, enabled: bool) {
        self.ack_enabled = enabled;
    }

    fn software_reset(&mut self) {
        self.phase = SimPhase::Idle;
        self.status = Status::default();
        self.ack_enabled = true;
        self.in_flight = false;
        self.busy_holdoff = 0;
    }

    fn status(&mut self) -> Status {
        self.tick();
        let mut snapshot = self.status;
        if self.busy_holdoff > 0 {
            self.busy_holdoff -= 1;
            snapshot.busy = true;
        }
        snapshot
    }

    fn clear_address_flag(&mut self) {
        self.status.address_complete = false;
        match (self.phase, self.direction) {
            (SimPhase::AddressSelect, Direction::Write) => {
                self.phase = SimPhase::RegisterSelect;
                self.status.tx_empty = true;
            }
            (SimPhase::AddressSelect, Direction::Read) => {
                if self.ack_enabled {
                    // The last-byte NACK can no longer be signalled;
                    // starve the receive flag like corrupted silicon would
                    let _ = self.violations.push(Violation::AckWindowMissed);
                    self.phase = SimPhase::DataRead;
                    return;
                }
                self.rx_byte = self.registers[self.pointer as usize];
                self.record(BusEvent::Read {
                    register: self.pointer,
                    value: self.rx_byte,
                });
                self.pointer = self.pointer.wrapping_add(1);
                self.status.rx_not_empty = true;
                self.phase = SimPhase::DataRead;
            }
            _ => {}
        }
    }

    fn write_data(&mut self, byte: u8) {
        match self.phase {
            SimPhase::AddressSelect => self.accept_address(byte),
            SimPhase::RegisterSelect | SimPhase::DataWrite => self.accept_data(byte),
            _ => {}
        }
    }

    fn read_data(&mut self) -> u8 {
        self.status.rx_not_empty = false;
        self.rx_byte
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive the model through a raw single-byte write, the way the
    /// engine would.
    fn raw_write(port: &mut SimPort, device: u8, register: u8, value: u8) {
        port.request_start();
        port.write_data(device << 1);
        port.clear_address_flag();
        port.write_data(register);
        // Drain the register byte
        port.status();
        port.write_data(value);
        port.status();
        port.status();
        port.request_stop();
    }

    #[test]
    fn test_write_lands_in_register_file() {
        let mut port = SimPort::new(0x68);
        raw_write(&mut port, 0x68, 0x0E, 0x55);

        assert_eq!(port.register(0x0E), 0x55);
        assert_eq!(
            port.events(),
            &[
                BusEvent::Start,
                BusEvent::Address {
                    device: 0x68,
                    direction: Direction::Write
                },
                BusEvent::Select { register: 0x0E },
                BusEvent::Write {
                    register: 0x0E,
                    value: 0x55
                },
                BusEvent::Stop,
            ]
        );
        assert!(port.violations().is_empty());
    }

    #[test]
    fn test_shifter_latency_is_two_polls() {
        let mut port = SimPort::new(0x68);
        port.request_start();
        port.write_data(0x68 << 1);
        port.clear_address_flag();
        port.write_data(0x00);

        let first = port.status();
        assert!(first.tx_empty);
        assert!(!first.byte_finished);

        let second = port.status();
        assert!(second.byte_finished);
    }

    #[test]
    fn test_premature_stop_is_a_violation() {
        let mut port = SimPort::new(0x68);
        port.request_start();
        port.write_data(0x68 << 1);
        port.clear_address_flag();
        port.write_data(0x00);
        port.status();
        port.write_data(0x42);
        // STOP without waiting for the byte to finish
        port.request_stop();

        assert_eq!(port.violations(), &[Violation::TruncatedTransfer]);
    }

    #[test]
    fn test_ack_left_enabled_is_a_violation() {
        let mut port = SimPort::new(0x68);
        port.request_start();
        port.write_data((0x68 << 1) | 1);
        // Release the address phase without disabling ACK first
        port.clear_address_flag();
        port.set_ack(false);

        assert_eq!(port.violations(), &[Violation::AckWindowMissed]);
        assert!(!port.status().rx_not_empty);
    }

    #[test]
    fn test_wrong_device_address_nacks() {
        let mut port = SimPort::new(0x68);
        port.request_start();
        port.write_data(0x21 << 1);

        let status = port.status();
        assert!(status.nack);
        assert!(!status.address_complete);
    }

    #[test]
    fn test_busy_holdoff_drains() {
        let mut port = SimPort::new(0x68);
        port.hold_busy_for(2);
        assert!(port.status().busy);
        assert!(port.status().busy);
        assert!(!port.status().busy);
    }

    #[test]
    fn test_software_reset_releases_bus() {
        let mut port = SimPort::new(0x68);
        port.hold_busy_for(u32::MAX);
        assert!(port.status().busy);

        port.software_reset();
        assert!(!port.status().busy);
    }
}
