//! In-memory state owners for the garage engine.
//!
//! `SpotInventory` exclusively owns per-tier occupancy and exposes
//! reserve/release/relocate primitives that never break the capacity or
//! upgrade-only invariants. `TicketLedger` exclusively owns the
//! plate → ticket mapping. The `Clock` and `IdGenerator` traits are the
//! narrow seams through which wall-clock time and ticket identifiers enter.

pub mod clock;
pub mod ids;
pub mod inventory;
pub mod ledger;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ids::{HashIds, IdGenerator, SequentialIds};
pub use inventory::{ParkedVehicle, SpotInventory};
pub use ledger::{elapsed_hours, Ticket, TicketLedger};

use garage_schema::{Tier, VehicleSize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no free spot in {0} tier")]
    TierFull(Tier),
    #[error("a {size} vehicle does not fit a {tier} spot")]
    SizeMismatch { size: VehicleSize, tier: Tier },
    #[error("plate '{0}' is already parked")]
    DuplicatePlate(String),
    #[error("vehicle not found: {0}")]
    VehicleNotFound(String),
    #[error("vehicle '{plate}' is not parked in {tier} tier")]
    VehicleNotInTier { plate: String, tier: Tier },
    #[error("plate '{0}' already holds a live ticket")]
    TicketExists(String),
    #[error("no live ticket for plate '{0}'")]
    TicketNotFound(String),
    #[error("advance out of range")]
    ClockOutOfRange,
}
