//! Scripted garage sessions.
//!
//! A session is a sequence of line commands driven against one
//! [`GarageService`] whose clock only moves on `advance`, so a script
//! produces the same tiers and fees every time it is replayed.

use super::{colorize_outcome, colorize_tier, json_line, load_config, EXIT_FAILURE, EXIT_SUCCESS};
use garage_core::{Clock, Garage, GarageService, ManualClock, SequentialIds};
use garage_schema::GarageConfig;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::sync::Arc;

/// Capacity flags given on the command line, applied over the config file.
#[derive(Debug, Default, Clone, Copy)]
pub struct CapacityOverride {
    pub small: Option<u32>,
    pub medium: Option<u32>,
    pub large: Option<u32>,
}

impl CapacityOverride {
    fn apply(self, config: &mut GarageConfig) {
        if let Some(n) = self.small {
            config.capacity.small = n;
        }
        if let Some(n) = self.medium {
            config.capacity.medium = n;
        }
        if let Some(n) = self.large {
            config.capacity.large = n;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Admit { plate: String, size: String },
    Exit { plate: String },
    Advance { hours: f64 },
    Status,
    Locate { plate: String },
    Quote { plate: String },
    List,
}

impl SessionCommand {
    /// Parse one script line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            return Ok(None);
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        let cmd = match words.as_slice() {
            ["admit", plate, size] => Self::Admit {
                plate: (*plate).to_owned(),
                size: (*size).to_owned(),
            },
            ["exit", plate] => Self::Exit {
                plate: (*plate).to_owned(),
            },
            ["advance", hours] => {
                let hours: f64 = hours
                    .parse()
                    .map_err(|_| format!("invalid hours '{hours}'"))?;
                if !hours.is_finite() || hours < 0.0 {
                    return Err(format!("advance needs a non-negative duration, got {hours}"));
                }
                Self::Advance { hours }
            }
            ["status"] => Self::Status,
            ["locate", plate] => Self::Locate {
                plate: (*plate).to_owned(),
            },
            ["quote", plate] => Self::Quote {
                plate: (*plate).to_owned(),
            },
            ["list"] => Self::List,
            [verb, ..] => {
                return Err(match *verb {
                    "admit" => "usage: admit <PLATE> <SIZE>".to_owned(),
                    "exit" | "locate" | "quote" => format!("usage: {verb} <PLATE>"),
                    "advance" => "usage: advance <HOURS>".to_owned(),
                    "status" | "list" => format!("usage: {verb}"),
                    other => format!("unknown command '{other}'"),
                })
            }
            [] => return Ok(None),
        };
        Ok(Some(cmd))
    }
}

/// One garage plus the hand-driven clock behind it.
pub struct Session {
    service: GarageService,
    clock: Arc<ManualClock>,
    json: bool,
}

impl Session {
    pub fn new(config: &GarageConfig, json: bool) -> Self {
        let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
        let garage = Garage::with_collaborators(
            config,
            Box::new(Arc::clone(&clock)),
            Box::new(SequentialIds::new()),
        );
        Self {
            service: GarageService::new(garage),
            clock,
            json,
        }
    }

    /// Execute one command and render its output lines.
    pub fn execute(&self, cmd: &SessionCommand) -> Result<Vec<String>, String> {
        match cmd {
            SessionCommand::Admit { plate, size } => {
                let r = self.service.admit_vehicle(plate, size);
                if self.json {
                    return Ok(vec![json_line(&serde_json::json!({
                        "command": "admit",
                        "plate": plate,
                        "response": r,
                    }))?]);
                }
                let mut line = format!("{} {}", colorize_outcome(r.ok), r.message);
                if let Some(id) = &r.ticket_id {
                    line.push_str(&format!(" [ticket {id}]"));
                }
                Ok(vec![line])
            }
            SessionCommand::Exit { plate } => {
                let r = self.service.exit_vehicle(plate);
                if self.json {
                    return Ok(vec![json_line(&serde_json::json!({
                        "command": "exit",
                        "plate": plate,
                        "response": r,
                    }))?]);
                }
                Ok(vec![format!("{} {}", colorize_outcome(r.ok), r.message)])
            }
            SessionCommand::Advance { hours } => {
                self.clock
                    .advance_hours(*hours)
                    .map_err(|e| e.to_string())?;
                if self.json {
                    return Ok(vec![json_line(&serde_json::json!({
                        "command": "advance",
                        "hours": hours,
                        "now": self.clock.now(),
                    }))?]);
                }
                Ok(vec![format!("clock advanced {hours}h")])
            }
            SessionCommand::Status => {
                let status = self.service.status();
                if self.json {
                    return Ok(vec![json_line(&serde_json::json!({
                        "command": "status",
                        "status": status,
                    }))?]);
                }
                Ok(vec![format!(
                    "small={} medium={} large={} occupied={} available={}",
                    status.small_available,
                    status.medium_available,
                    status.large_available,
                    status.total_occupied,
                    status.total_available
                )])
            }
            SessionCommand::Locate { plate } => {
                let found = self.service.with_garage(|g| g.locate(plate).cloned());
                if self.json {
                    return Ok(vec![json_line(&serde_json::json!({
                        "command": "locate",
                        "plate": plate,
                        "vehicle": found,
                    }))?]);
                }
                Ok(vec![match found {
                    Some(v) => format!(
                        "{} ({}) parked in {} spot",
                        v.plate,
                        v.size,
                        colorize_tier(v.occupied_tier)
                    ),
                    None => format!("{} {plate} is not parked here", colorize_outcome(false)),
                }])
            }
            SessionCommand::Quote { plate } => {
                let quote = self.service.with_garage(|g| g.quote(plate));
                match quote {
                    Ok(q) if self.json => Ok(vec![json_line(&serde_json::json!({
                        "command": "quote",
                        "plate": plate,
                        "quote": q,
                    }))?]),
                    Ok(q) => Ok(vec![format!(
                        "{plate}: {:.2}h so far, fee {:.2}",
                        q.elapsed_hours, q.fee
                    )]),
                    Err(e) if self.json => Ok(vec![json_line(&serde_json::json!({
                        "command": "quote",
                        "plate": plate,
                        "error": e.to_string(),
                    }))?]),
                    Err(e) => Ok(vec![format!("{} {e}", colorize_outcome(false))]),
                }
            }
            SessionCommand::List => {
                let occupants = self.service.with_garage(|g| g.occupants());
                if self.json {
                    return Ok(vec![json_line(&serde_json::json!({
                        "command": "list",
                        "vehicles": occupants,
                    }))?]);
                }
                if occupants.is_empty() {
                    return Ok(vec!["garage is empty".to_owned()]);
                }
                Ok(occupants
                    .iter()
                    .map(|v| {
                        let upgraded = if v.is_upgraded() { " (upgraded)" } else { "" };
                        format!(
                            "{:<12} {:<6} in {}{upgraded}",
                            v.plate.as_str(),
                            v.size.as_str(),
                            colorize_tier(v.occupied_tier)
                        )
                    })
                    .collect())
            }
        }
    }

    pub fn check_invariants(&self) -> Result<(), String> {
        self.service.check_invariants()
    }
}

pub fn run(
    config: Option<&Path>,
    script: Option<&Path>,
    overrides: CapacityOverride,
    json: bool,
) -> Result<u8, String> {
    let mut config = load_config(config)?;
    overrides.apply(&mut config);
    tracing::debug!(
        "session capacity: small={} medium={} large={}",
        config.capacity.small,
        config.capacity.medium,
        config.capacity.large
    );

    let input: Box<dyn Read> = match script {
        Some(p) if p != Path::new("-") => Box::new(
            std::fs::File::open(p)
                .map_err(|e| format!("failed to open script {}: {e}", p.display()))?,
        ),
        _ => Box::new(std::io::stdin()),
    };

    let session = Session::new(&config, json);
    for (idx, line) in BufReader::new(input).lines().enumerate() {
        let line = line.map_err(|e| format!("failed to read script: {e}"))?;
        let lineno = idx + 1;
        let Some(cmd) = SessionCommand::parse(&line).map_err(|e| format!("line {lineno}: {e}"))?
        else {
            continue;
        };
        tracing::trace!("line {lineno}: {cmd:?}");
        for out in session
            .execute(&cmd)
            .map_err(|e| format!("line {lineno}: {e}"))?
        {
            println!("{out}");
        }
    }

    if let Err(e) = session.check_invariants() {
        tracing::error!("garage inconsistent at end of session: {e}");
        return Ok(EXIT_FAILURE);
    }
    Ok(EXIT_SUCCESS)
}
