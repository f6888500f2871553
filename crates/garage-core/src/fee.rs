use garage_schema::{RateTable, VehicleSize};
use serde::Serialize;

/// Price of a stay, with the inputs that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeeQuote {
    pub elapsed_hours: f64,
    pub billable_hours: u32,
    pub fee: f64,
}

/// Stateless pricing over a rate table.
///
/// Stays within the grace period are free. Past it, every started hour after
/// the grace period is billed (at least one), and the total is capped at the
/// size's daily cap.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeeCalculator {
    table: RateTable,
}

impl FeeCalculator {
    pub fn from_table(table: RateTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RateTable {
        &self.table
    }

    pub fn calculate_fee(&self, size: VehicleSize, elapsed_hours: f64) -> f64 {
        self.quote(size, elapsed_hours).fee
    }

    /// Like `calculate_fee`, for sizes still in string form. Unknown sizes
    /// are charged nothing.
    pub fn calculate_fee_str(&self, size: &str, elapsed_hours: f64) -> f64 {
        size.parse::<VehicleSize>()
            .map_or(0.0, |s| self.calculate_fee(s, elapsed_hours))
    }

    pub fn quote(&self, size: VehicleSize, elapsed_hours: f64) -> FeeQuote {
        // NaN and negative durations price as zero.
        let hours = if elapsed_hours.is_nan() {
            0.0
        } else {
            elapsed_hours.max(0.0)
        };
        if hours <= self.table.grace_hours {
            return FeeQuote {
                elapsed_hours: hours,
                billable_hours: 0,
                fee: 0.0,
            };
        }

        let rate = self.table.rate(size);
        let billable = (hours - self.table.grace_hours).ceil().max(1.0);
        let fee = (billable * rate.hourly_rate).min(rate.daily_cap);
        FeeQuote {
            elapsed_hours: hours,
            billable_hours: billable.min(f64::from(u32::MAX)) as u32,
            fee,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garage_schema::{Rate, Tier};

    fn calc() -> FeeCalculator {
        FeeCalculator::default()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn grace_period_is_free() {
        for size in Tier::ALL {
            assert!(approx(calc().calculate_fee(size, 0.0), 0.0));
            assert!(approx(calc().calculate_fee(size, 0.24), 0.0));
            assert!(approx(calc().calculate_fee(size, 0.25), 0.0));
            assert!(calc().calculate_fee(size, 0.26) > 0.0);
        }
    }

    #[test]
    fn just_past_grace_bills_one_hour() {
        assert!(approx(calc().calculate_fee(Tier::Small, 0.26), 2.0));
        assert!(approx(calc().calculate_fee(Tier::Medium, 0.26), 3.0));
        assert!(approx(calc().calculate_fee(Tier::Large, 0.26), 5.0));
    }

    #[test]
    fn small_five_point_one_hours() {
        let q = calc().quote(Tier::Small, 5.1);
        assert_eq!(q.billable_hours, 5);
        assert!(approx(q.fee, 10.0));
    }

    #[test]
    fn started_hours_round_up() {
        assert!(approx(calc().calculate_fee(Tier::Medium, 1.25), 3.0));
        assert!(approx(calc().calculate_fee(Tier::Medium, 1.26), 6.0));
    }

    #[test]
    fn daily_cap_applies() {
        assert!(approx(calc().calculate_fee(Tier::Small, 30.0), 20.0));
        assert!(approx(calc().calculate_fee(Tier::Medium, 11.0), 30.0));
        assert!(approx(calc().calculate_fee(Tier::Large, 72.0), 50.0));
    }

    #[test]
    fn fee_is_monotone_in_time() {
        for size in Tier::ALL {
            let mut last = 0.0;
            for step in 0..=2000 {
                let hours = f64::from(step) * 0.02;
                let fee = calc().calculate_fee(size, hours);
                assert!(fee >= last, "{size} fee dropped at {hours}h");
                assert!(fee <= calc().table().rate(size).daily_cap);
                last = fee;
            }
        }
    }

    #[test]
    fn negative_and_nan_are_free() {
        assert!(approx(calc().calculate_fee(Tier::Large, -3.0), 0.0));
        assert!(approx(calc().calculate_fee(Tier::Large, f64::NAN), 0.0));
    }

    #[test]
    fn unknown_size_string_is_free() {
        assert!(approx(calc().calculate_fee_str("bus", 10.0), 0.0));
        assert!(approx(calc().calculate_fee_str("large", 1.0), 5.0));
    }

    #[test]
    fn custom_table_is_used() {
        let table = RateTable {
            grace_hours: 0.5,
            small: Rate::new(1.0, 4.0),
            ..RateTable::default()
        };
        let c = FeeCalculator::from_table(table);
        assert!(approx(c.calculate_fee(Tier::Small, 0.4), 0.0));
        assert!(approx(c.calculate_fee(Tier::Small, 2.0), 2.0));
        assert!(approx(c.calculate_fee(Tier::Small, 9.0), 4.0));
    }

    #[test]
    fn infinite_stay_hits_cap() {
        let q = calc().quote(Tier::Small, f64::INFINITY);
        assert!(approx(q.fee, 20.0));
        assert_eq!(q.billable_hours, u32::MAX);
    }
}
