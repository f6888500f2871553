use crate::garage::{Garage, StatusReport};
use garage_schema::{GarageConfig, TicketId, Tier};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdmitResponse {
    pub ok: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<TicketId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExitResponse {
    pub ok: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_hours: Option<f64>,
}

/// Thread-safe boundary over one [`Garage`].
///
/// Every call holds the garage mutex for its whole duration, so the
/// reserve-then-ticket and price-release-retire sequences are atomic with
/// respect to each other. Expected failures come back as `ok: false`.
#[derive(Debug)]
pub struct GarageService {
    garage: Mutex<Garage>,
}

impl GarageService {
    pub fn new(garage: Garage) -> Self {
        Self {
            garage: Mutex::new(garage),
        }
    }

    pub fn from_config(config: &GarageConfig) -> Self {
        Self::new(Garage::new(config))
    }

    fn lock(&self) -> MutexGuard<'_, Garage> {
        // A poisoned lock means a consistency panic already fired while the
        // garage was mid-update; its state can no longer be trusted.
        match self.garage.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("garage state poisoned by an earlier consistency violation"),
        }
    }

    pub fn admit_vehicle(&self, plate: &str, size: &str) -> AdmitResponse {
        match self.lock().admit(plate, size) {
            Ok(admission) => {
                let mut message = format!(
                    "admitted {} to {} spot",
                    admission.ticket.plate, admission.tier
                );
                if let Some(moved) = &admission.relocation {
                    message.push_str(&format!(
                        " after moving {} from {} to {}",
                        moved.plate, moved.from, moved.to
                    ));
                }
                AdmitResponse {
                    ok: true,
                    message,
                    ticket_id: Some(admission.ticket.id),
                    tier: Some(admission.tier),
                }
            }
            Err(e) => AdmitResponse {
                ok: false,
                message: e.to_string(),
                ticket_id: None,
                tier: None,
            },
        }
    }

    pub fn exit_vehicle(&self, plate: &str) -> ExitResponse {
        match self.lock().exit(plate) {
            Ok(receipt) => ExitResponse {
                ok: true,
                message: format!(
                    "{} exited after {:.2}h, fee {:.2}",
                    receipt.ticket.plate, receipt.quote.elapsed_hours, receipt.quote.fee
                ),
                fee: Some(receipt.quote.fee),
                elapsed_hours: Some(receipt.quote.elapsed_hours),
            },
            Err(e) => ExitResponse {
                ok: false,
                message: e.to_string(),
                fee: None,
                elapsed_hours: None,
            },
        }
    }

    pub fn status(&self) -> StatusReport {
        self.lock().status()
    }

    /// Run `f` with exclusive access to the garage.
    pub fn with_garage<R>(&self, f: impl FnOnce(&mut Garage) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn check_invariants(&self) -> Result<(), String> {
        self.lock().check_invariants()
    }
}
