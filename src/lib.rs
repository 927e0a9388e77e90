//! Fare Scout — flight-offer aggregation and chat flow engine.

pub mod affiliate;
pub mod catalog;
pub mod channels;
pub mod config;
pub mod error;
pub mod flow;
pub mod leads;
pub mod model;
pub mod providers;
pub mod render;
pub mod search;
pub mod session;
pub mod tier;
pub mod tiering;
