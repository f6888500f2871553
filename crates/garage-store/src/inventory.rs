use crate::StoreError;
use garage_schema::{CapacitySection, Plate, Tier, VehicleSize};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A vehicle currently holding a spot. `occupied_tier >= size` always.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkedVehicle {
    pub plate: Plate,
    pub size: VehicleSize,
    pub occupied_tier: Tier,
    /// Monotonic admission order, kept across relocations.
    pub admitted_seq: u64,
}

impl ParkedVehicle {
    /// Parked in a larger tier than its own size.
    pub fn is_upgraded(&self) -> bool {
        self.occupied_tier > self.size
    }
}

/// Per-tier capacity and occupancy.
///
/// Every mutation checks the capacity and upgrade-only invariants before it
/// touches state, so a failed call leaves the inventory unchanged.
#[derive(Debug, Clone)]
pub struct SpotInventory {
    capacity: [u32; 3],
    /// Occupants per tier, ordered by `admitted_seq`.
    occupied: [Vec<ParkedVehicle>; 3],
    next_seq: u64,
}

impl SpotInventory {
    pub fn new(capacity: CapacitySection) -> Self {
        Self {
            capacity: Tier::ALL.map(|t| capacity.get(t)),
            occupied: Default::default(),
            next_seq: 0,
        }
    }

    pub fn capacity(&self, tier: Tier) -> u32 {
        self.capacity[tier.index()]
    }

    pub fn occupied(&self, tier: Tier) -> u32 {
        self.occupied[tier.index()].len() as u32
    }

    pub fn available(&self, tier: Tier) -> u32 {
        self.capacity(tier).saturating_sub(self.occupied(tier))
    }

    // Totals are u64 so that per-tier counts up to u32::MAX never overflow.
    pub fn total_capacity(&self) -> u64 {
        self.capacity.iter().copied().map(u64::from).sum()
    }

    pub fn total_occupied(&self) -> u64 {
        Tier::ALL.into_iter().map(|t| u64::from(self.occupied(t))).sum()
    }

    pub fn total_available(&self) -> u64 {
        Tier::ALL.into_iter().map(|t| u64::from(self.available(t))).sum()
    }

    /// Occupants of one tier, earliest admission first.
    pub fn occupants_of(&self, tier: Tier) -> &[ParkedVehicle] {
        &self.occupied[tier.index()]
    }

    /// Every occupant across tiers, earliest admission first.
    pub fn occupants(&self) -> Vec<ParkedVehicle> {
        let mut all: Vec<_> = self.occupied.iter().flatten().cloned().collect();
        all.sort_by_key(|v| v.admitted_seq);
        all
    }

    pub fn find(&self, plate: &str) -> Option<&ParkedVehicle> {
        self.occupied.iter().flatten().find(|v| v.plate == plate)
    }

    pub fn reserve(
        &mut self,
        tier: Tier,
        plate: Plate,
        size: VehicleSize,
    ) -> Result<ParkedVehicle, StoreError> {
        if !size.fits_in(tier) {
            return Err(StoreError::SizeMismatch { size, tier });
        }
        if self.available(tier) == 0 {
            return Err(StoreError::TierFull(tier));
        }
        if self.find(&plate).is_some() {
            return Err(StoreError::DuplicatePlate(plate.into_inner()));
        }

        self.next_seq += 1;
        let vehicle = ParkedVehicle {
            plate,
            size,
            occupied_tier: tier,
            admitted_seq: self.next_seq,
        };
        debug!("reserved {tier} spot for {} ({size})", vehicle.plate);
        // Fresh sequence numbers are the largest, so push keeps the order.
        self.occupied[tier.index()].push(vehicle.clone());
        Ok(vehicle)
    }

    pub fn release(&mut self, plate: &str) -> Result<ParkedVehicle, StoreError> {
        for slot in &mut self.occupied {
            if let Some(pos) = slot.iter().position(|v| v.plate == plate) {
                let vehicle = slot.remove(pos);
                debug!("released {} spot held by {plate}", vehicle.occupied_tier);
                return Ok(vehicle);
            }
        }
        Err(StoreError::VehicleNotFound(plate.to_owned()))
    }

    /// Move a parked vehicle between tiers. Total occupancy is unchanged.
    pub fn relocate(&mut self, plate: &str, from: Tier, to: Tier) -> Result<(), StoreError> {
        let pos = self.occupied[from.index()]
            .iter()
            .position(|v| v.plate == plate)
            .ok_or_else(|| StoreError::VehicleNotInTier {
                plate: plate.to_owned(),
                tier: from,
            })?;
        if from == to {
            return Ok(());
        }
        let size = self.occupied[from.index()][pos].size;
        if !size.fits_in(to) {
            return Err(StoreError::SizeMismatch { size, tier: to });
        }
        if self.available(to) == 0 {
            return Err(StoreError::TierFull(to));
        }

        let mut vehicle = self.occupied[from.index()].remove(pos);
        vehicle.occupied_tier = to;
        let dest = &mut self.occupied[to.index()];
        let at = dest.partition_point(|v| v.admitted_seq < vehicle.admitted_seq);
        dest.insert(at, vehicle);
        debug!("relocated {plate} from {from} to {to}");
        Ok(())
    }
}
