use super::{json_pretty, load_config, EXIT_SUCCESS};
use garage_core::FeeCalculator;
use garage_schema::Tier;
use std::path::Path;

pub fn run(config: Option<&Path>, size: &str, hours: f64, json: bool) -> Result<u8, String> {
    let config = load_config(config)?;
    let size: Tier = size.parse().map_err(|e| format!("{e}"))?;
    let fees = FeeCalculator::from_table(config.rates);
    let quote = fees.quote(size, hours);

    if json {
        let payload = serde_json::json!({
            "size": size,
            "elapsed_hours": quote.elapsed_hours,
            "billable_hours": quote.billable_hours,
            "fee": quote.fee,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "{size} vehicle, {:.2}h ({} billable): fee {:.2}",
            quote.elapsed_hours, quote.billable_hours, quote.fee
        );
    }
    Ok(EXIT_SUCCESS)
}
