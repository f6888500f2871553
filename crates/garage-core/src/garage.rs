use crate::allocation::{AllocationEngine, Relocation};
use crate::fee::{FeeCalculator, FeeQuote};
use crate::CoreError;
use chrono::{DateTime, Utc};
use garage_schema::{CapacitySection, GarageConfig, Plate, Tier, VehicleSize};
use garage_store::{
    Clock, HashIds, IdGenerator, ParkedVehicle, SpotInventory, SystemClock, Ticket, TicketLedger,
};
use serde::Serialize;
use tracing::{info, warn};

/// Result of a successful admission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Admission {
    pub ticket: Ticket,
    pub tier: Tier,
    pub relocation: Option<Relocation>,
}

/// Result of a successful exit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExitReceipt {
    pub ticket: Ticket,
    /// Spot the vehicle held when it left, which may differ from where it
    /// was first parked.
    pub released_tier: Tier,
    pub exited_at: DateTime<Utc>,
    pub quote: FeeQuote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub small_available: u32,
    pub medium_available: u32,
    pub large_available: u32,
    pub total_occupied: u64,
    pub total_available: u64,
}

impl StatusReport {
    pub fn available(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Small => self.small_available,
            Tier::Medium => self.medium_available,
            Tier::Large => self.large_available,
        }
    }
}

/// One garage: spot inventory, ticket ledger, pricing and a clock.
///
/// Methods take `&mut self`; callers sharing a garage across threads go
/// through [`crate::GarageService`], which serializes admit and exit.
pub struct Garage {
    inventory: SpotInventory,
    ledger: TicketLedger,
    fees: FeeCalculator,
    clock: Box<dyn Clock>,
}

impl std::fmt::Debug for Garage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Garage")
            .field("inventory", &self.inventory)
            .field("ledger", &self.ledger)
            .field("fees", &self.fees)
            .finish_non_exhaustive()
    }
}

impl Garage {
    /// A garage on the wall clock with opaque hashed ticket ids.
    pub fn new(config: &GarageConfig) -> Self {
        Self::with_collaborators(
            config,
            Box::new(SystemClock),
            Box::new(HashIds::from_entropy()),
        )
    }

    pub fn with_collaborators(
        config: &GarageConfig,
        clock: Box<dyn Clock>,
        ids: Box<dyn IdGenerator>,
    ) -> Self {
        info!(
            "opening garage: small={} medium={} large={}",
            config.capacity.small, config.capacity.medium, config.capacity.large
        );
        Self {
            inventory: SpotInventory::new(config.capacity),
            ledger: TicketLedger::new(ids),
            fees: FeeCalculator::from_table(config.rates),
            clock,
        }
    }

    /// Validate raw input, then admit.
    pub fn admit(&mut self, plate: &str, size: &str) -> Result<Admission, CoreError> {
        let plate = match Plate::parse(plate) {
            Ok(p) => p,
            Err(e) => {
                warn!("rejected admission: {e}");
                return Err(e.into());
            }
        };
        let size: VehicleSize = match size.parse() {
            Ok(s) => s,
            Err(e) => {
                warn!("rejected admission of {plate}: {e}");
                return Err(e.into());
            }
        };
        self.admit_sized(plate, size)
    }

    pub fn admit_sized(&mut self, plate: Plate, size: VehicleSize) -> Result<Admission, CoreError> {
        if self.ledger.find(&plate).is_some() {
            warn!("rejected duplicate admission of {plate}");
            return Err(CoreError::DuplicateAdmission(plate.into_inner()));
        }

        let allocation = match AllocationEngine::new(&mut self.inventory).admit(plate.clone(), size)
        {
            Ok(a) => a,
            Err(CoreError::NoSpaceAvailable { size }) => {
                info!("no space for {plate} ({size})");
                return Err(CoreError::NoSpaceAvailable { size });
            }
            Err(e) => panic!(
                "internal consistency violation: {plate} has no ticket but inventory refused it: {e}"
            ),
        };

        let entry_time = self.clock.now();
        let ticket = match self.ledger.issue(plate.clone(), size, entry_time) {
            Ok(t) => t,
            Err(e) => panic!(
                "internal consistency violation: spot reserved for {plate} but ticket refused: {e}"
            ),
        };

        let tier = allocation.tier();
        info!("admitted {plate} ({size}) to {tier} with ticket {}", ticket.id);
        Ok(Admission {
            ticket,
            tier,
            relocation: allocation.relocation,
        })
    }

    pub fn exit(&mut self, plate: &str) -> Result<ExitReceipt, CoreError> {
        let plate = plate.trim();
        let Some(ticket) = self.ledger.find(plate).cloned() else {
            warn!("exit requested for {plate} without a live ticket");
            return Err(CoreError::TicketNotFound(plate.to_owned()));
        };

        // Priced from the ticket, before the spot is released.
        let exited_at = self.clock.now();
        let hours = self.ledger.elapsed_hours(&ticket, exited_at);
        let quote = self.fees.quote(ticket.size, hours);

        let vehicle = match AllocationEngine::new(&mut self.inventory).release(plate) {
            Ok(v) => v,
            Err(e) => panic!(
                "internal consistency violation: ticket {} for {plate} has no parked vehicle: {e}",
                ticket.id
            ),
        };
        if let Err(e) = self.ledger.retire(plate) {
            panic!("internal consistency violation: ticket for {plate} vanished: {e}");
        }

        info!(
            "{plate} exited from {} after {:.2}h, fee {:.2}",
            vehicle.occupied_tier, quote.elapsed_hours, quote.fee
        );
        Ok(ExitReceipt {
            ticket,
            released_tier: vehicle.occupied_tier,
            exited_at,
            quote,
        })
    }

    pub fn status(&self) -> StatusReport {
        let inv = &self.inventory;
        debug_assert_eq!(inv.total_occupied() as usize, self.ledger.len());
        StatusReport {
            small_available: inv.available(Tier::Small),
            medium_available: inv.available(Tier::Medium),
            large_available: inv.available(Tier::Large),
            total_occupied: inv.total_occupied(),
            total_available: inv.total_available(),
        }
    }

    /// What leaving now would cost, without leaving.
    pub fn quote(&self, plate: &str) -> Result<FeeQuote, CoreError> {
        let plate = plate.trim();
        let ticket = self
            .ledger
            .find(plate)
            .ok_or_else(|| CoreError::TicketNotFound(plate.to_owned()))?;
        let hours = self.ledger.elapsed_hours(ticket, self.clock.now());
        Ok(self.fees.quote(ticket.size, hours))
    }

    /// Where `plate` is parked right now, reflecting any compaction moves.
    pub fn locate(&self, plate: &str) -> Option<&ParkedVehicle> {
        self.inventory.find(plate.trim())
    }

    pub fn occupants(&self) -> Vec<ParkedVehicle> {
        self.inventory.occupants()
    }

    pub fn tickets(&self) -> Vec<&Ticket> {
        self.ledger.tickets()
    }

    pub fn capacity(&self) -> CapacitySection {
        CapacitySection::new(
            self.inventory.capacity(Tier::Small),
            self.inventory.capacity(Tier::Medium),
            self.inventory.capacity(Tier::Large),
        )
    }

    pub fn fees(&self) -> &FeeCalculator {
        &self.fees
    }

    /// Check capacity, conservation, upgrade-only and ticket pairing.
    pub fn check_invariants(&self) -> Result<(), String> {
        let inv = &self.inventory;
        for tier in Tier::ALL {
            if inv.occupied(tier) > inv.capacity(tier) {
                return Err(format!(
                    "{tier} tier over capacity: {} > {}",
                    inv.occupied(tier),
                    inv.capacity(tier)
                ));
            }
            for v in inv.occupants_of(tier) {
                if v.occupied_tier != tier {
                    return Err(format!(
                        "{} filed under {tier} but records {}",
                        v.plate, v.occupied_tier
                    ));
                }
                if !v.size.fits_in(tier) {
                    return Err(format!(
                        "{} ({}) parked in smaller {tier} spot",
                        v.plate, v.size
                    ));
                }
            }
        }
        if inv.total_occupied() + inv.total_available() != inv.total_capacity() {
            return Err(format!(
                "occupied {} + available {} != capacity {}",
                inv.total_occupied(),
                inv.total_available(),
                inv.total_capacity()
            ));
        }
        if inv.total_occupied() as usize != self.ledger.len() {
            return Err(format!(
                "{} parked vehicles but {} live tickets",
                inv.total_occupied(),
                self.ledger.len()
            ));
        }
        for ticket in self.ledger.tickets() {
            match inv.find(&ticket.plate) {
                Some(v) if v.size == ticket.size => {}
                Some(v) => {
                    return Err(format!(
                        "{} ticketed as {} but parked as {}",
                        ticket.plate, ticket.size, v.size
                    ))
                }
                None => {
                    return Err(format!(
                        "ticket {} for {} has no vehicle",
                        ticket.id, ticket.plate
                    ))
                }
            }
        }
        Ok(())
    }
}
