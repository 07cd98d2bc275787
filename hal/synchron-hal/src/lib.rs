//! Synchron Hardware Abstraction Layer
//!
//! This crate defines the register-level trait an I2C master peripheral
//! must expose for the Synchron transaction engine to drive it. Chip
//! crates implement the trait over their memory-mapped register blocks;
//! the engine and the drivers built on top of it stay board-agnostic.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Drivers (synchron-drivers)             │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  Transaction engine (synchron-core)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  synchron-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ chip register │       │ simulation    │
//! │ ports         │       │ port (tests)  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`i2c::I2cPort`] - control/status/data surface of a master peripheral

#![no_std]
#![deny(unsafe_code)]

pub mod i2c;

// Re-export key items at crate root for convenience
pub use i2c::{Direction, I2cPort, Status};
