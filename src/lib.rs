//! Astrometers - Daily Astrology Meters
//!
//! A deterministic engine that turns a natal chart and the sky's state
//! on a date into a calibrated panel of quantitative meter readings,
//! served over the Model Context Protocol, plus the offline calibration
//! pipeline that produces the percentile tables the normalizer depends
//! on. Planetary positions come from the Swiss Ephemeris library.

pub mod calibration;
pub mod config;
pub mod ephemeris;
pub mod meters;
pub mod models;
pub mod server;
pub mod storage;

pub use server::AstrometersServer;
