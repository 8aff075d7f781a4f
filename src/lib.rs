//! Choropleth explorer for historical and projected natural-disaster impacts.
//!
//! Two immutable stores (impact records and sub-region boundaries) feed a
//! filter-and-sum query whose per-region totals are joined back to their
//! boundaries and drawn as a braille choropleth in the terminal.

pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod error;
pub mod map;
pub mod query;
pub mod ui;
