//! Allocation and orchestration engine for a tiered parking garage.
//!
//! This crate ties the schema and store layers together: `AllocationEngine`
//! decides where an arriving vehicle parks (own tier first, then larger
//! tiers, then a single compaction move), `FeeCalculator` prices a stay,
//! `Garage` pairs spot reservations with tickets, and `GarageService` wraps a
//! garage in one mutex so admit and exit each run as a single critical section.

pub mod allocation;
pub mod fee;
pub mod garage;
pub mod service;

pub use allocation::{Allocation, AllocationEngine, Relocation};
pub use fee::{FeeCalculator, FeeQuote};
pub use garage::{Admission, ExitReceipt, Garage, StatusReport};
pub use garage_store::{Clock, HashIds, IdGenerator, ManualClock, SequentialIds, SystemClock};
pub use service::{AdmitResponse, ExitResponse, GarageService};

use garage_schema::VehicleSize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no space available for {size} vehicle")]
    NoSpaceAvailable { size: VehicleSize },
    #[error("plate '{0}' is already admitted")]
    DuplicateAdmission(String),
    #[error("no live ticket for plate '{0}'")]
    TicketNotFound(String),
    #[error("config error: {0}")]
    Config(#[from] garage_schema::ConfigError),
    #[error("store error: {0}")]
    Store(#[from] garage_store::StoreError),
}

impl From<garage_schema::InputError> for CoreError {
    fn from(e: garage_schema::InputError) -> Self {
        CoreError::InvalidInput(e.to_string())
    }
}

impl From<garage_schema::ParseTierError> for CoreError {
    fn from(e: garage_schema::ParseTierError) -> Self {
        CoreError::InvalidInput(e.to_string())
    }
}
