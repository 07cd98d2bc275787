//! Device driver implementations
//!
//! This crate provides drivers for register-addressed I2C devices, built
//! on the transaction engine from synchron-core:
//!
//! - Real-time clocks (DS1337)

#![no_std]
#![deny(unsafe_code)]

pub mod rtc;
