//! Fermentation chamber temperature controller.
//!
//! Bang-bang thermostat with a boost phase for cold starts, an
//! emergency polarity-reversal phase for severe over-temperature, a fan
//! run-on timer, and sliding-window calibration that maps an air band to
//! a product-temperature target.
//!
//! The pure-logic modules ([`app`], [`control`], [`calibration`]) run
//! anywhere; the Raspberry Pi pieces are guarded by the `rpi` feature
//! inside [`adapters`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod calibration;
pub mod config;
pub mod control;
pub mod error;
pub mod reading;
