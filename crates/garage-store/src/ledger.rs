use crate::ids::IdGenerator;
use crate::StoreError;
use chrono::{DateTime, Utc};
use garage_schema::{Plate, TicketId, VehicleSize};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub plate: Plate,
    pub size: VehicleSize,
    pub entry_time: DateTime<Utc>,
}

/// Hours between a ticket's entry and `now`, floored at zero when the clock
/// reads earlier than the entry.
pub fn elapsed_hours(ticket: &Ticket, now: DateTime<Utc>) -> f64 {
    let millis = (now - ticket.entry_time).num_milliseconds();
    if millis <= 0 {
        0.0
    } else {
        millis as f64 / 3_600_000.0
    }
}

/// Live tickets keyed by plate. At most one per plate.
pub struct TicketLedger {
    tickets: BTreeMap<Plate, Ticket>,
    ids: Box<dyn IdGenerator>,
}

impl std::fmt::Debug for TicketLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketLedger")
            .field("tickets", &self.tickets)
            .finish_non_exhaustive()
    }
}

impl TicketLedger {
    pub fn new(ids: Box<dyn IdGenerator>) -> Self {
        Self {
            tickets: BTreeMap::new(),
            ids,
        }
    }

    pub fn issue(
        &mut self,
        plate: Plate,
        size: VehicleSize,
        entry_time: DateTime<Utc>,
    ) -> Result<Ticket, StoreError> {
        if self.tickets.contains_key(plate.as_str()) {
            return Err(StoreError::TicketExists(plate.into_inner()));
        }
        let ticket = Ticket {
            id: self.ids.new_id(),
            plate: plate.clone(),
            size,
            entry_time,
        };
        debug!("issued ticket {} for {plate}", ticket.id);
        self.tickets.insert(plate, ticket.clone());
        Ok(ticket)
    }

    pub fn find(&self, plate: &str) -> Option<&Ticket> {
        self.tickets.get(plate)
    }

    pub fn retire(&mut self, plate: &str) -> Result<Ticket, StoreError> {
        let ticket = self
            .tickets
            .remove(plate)
            .ok_or_else(|| StoreError::TicketNotFound(plate.to_owned()))?;
        debug!("retired ticket {} for {plate}", ticket.id);
        Ok(ticket)
    }

    pub fn elapsed_hours(&self, ticket: &Ticket, now: DateTime<Utc>) -> f64 {
        elapsed_hours(ticket, now)
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// Live tickets, earliest entry first.
    pub fn tickets(&self) -> Vec<&Ticket> {
        let mut all: Vec<_> = self.tickets.values().collect();
        all.sort_by(|a, b| {
            a.entry_time
                .cmp(&b.entry_time)
                .then_with(|| a.plate.cmp(&b.plate))
        });
        all
    }
}
