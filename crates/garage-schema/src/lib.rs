//! Shared vocabulary for the garage engine.
//!
//! This crate defines the schema layer: the closed, totally ordered `Tier`
//! enum (also used as `VehicleSize`), string newtypes for plates and ticket
//! identifiers with input validation, and the TOML garage configuration
//! (`GarageConfig`) carrying per-tier capacities and the fee `RateTable`.

pub mod config;
pub mod tier;
pub mod types;

pub use config::{
    parse_config_file, parse_config_str, CapacitySection, ConfigError, GarageConfig, Rate,
    RateTable, DEFAULT_GRACE_HOURS,
};
pub use tier::{ParseTierError, Tier, VehicleSize};
pub use types::{validate_plate, InputError, Plate, TicketId, MAX_PLATE_LEN};
