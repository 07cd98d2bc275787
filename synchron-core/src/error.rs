//! Engine error taxonomy
//!
//! Errors are pure return values; the engine performs no retries and no
//! logging. `Timeout` carries the wait step that failed so callers can
//! tell a dead bus from an absent device from a stalled transfer.

/// The wait step a bounded flag poll was parked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitPhase {
    /// Waiting for the bus-busy flag to clear before START
    BusBusyClear,
    /// Waiting for the START (or repeated START) condition flag
    StartGenerated,
    /// Waiting for the address phase to complete
    AddressComplete,
    /// Waiting for the data register to drain
    TxEmpty,
    /// Waiting for the final byte to fully shift out
    ByteFinished,
    /// Waiting for an incoming byte
    RxNotEmpty,
}

/// Errors returned by the transaction engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// A required status flag did not assert within the poll budget
    Timeout {
        /// The wait step that exceeded its budget
        phase: WaitPhase,
    },
    /// The device left an address or data byte unacknowledged
    ///
    /// Only reported when [`MasterConfig::strict_ack`] is set; in lenient
    /// mode a NACK starves the awaited flag and surfaces as [`Timeout`].
    ///
    /// [`MasterConfig::strict_ack`]: crate::master::MasterConfig::strict_ack
    /// [`Timeout`]: Self::Timeout
    NotAcknowledged,
    /// Device address outside the 7-bit range, or empty burst payload
    InvalidArgument,
}

impl embedded_hal::i2c::Error for BusError {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
        match self {
            BusError::NotAcknowledged => {
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown)
            }
            BusError::Timeout { .. } | BusError::InvalidArgument => ErrorKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{Error, ErrorKind, NoAcknowledgeSource};

    #[test]
    fn test_nack_maps_to_no_acknowledge() {
        assert_eq!(
            BusError::NotAcknowledged.kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown)
        );
    }

    #[test]
    fn test_timeout_maps_to_other() {
        let err = BusError::Timeout {
            phase: WaitPhase::BusBusyClear,
        };
        assert_eq!(err.kind(), ErrorKind::Other);
    }
}
