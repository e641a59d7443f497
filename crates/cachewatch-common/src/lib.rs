//! Domain types shared by the cachewatch crates.

pub mod types;
