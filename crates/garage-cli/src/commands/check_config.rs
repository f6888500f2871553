use super::{colorize_tier, json_pretty, load_config, EXIT_SUCCESS};
use garage_schema::Tier;
use std::path::Path;

pub fn run(config: Option<&Path>, json: bool) -> Result<u8, String> {
    let config = load_config(config)?;

    if json {
        println!("{}", json_pretty(&config)?);
        return Ok(EXIT_SUCCESS);
    }

    println!("capacity: {} spots", config.capacity.total());
    for tier in Tier::ALL {
        let rate = config.rates.rate(tier);
        println!(
            "  {:<8} {:>4} spots  {:.2}/h  cap {:.2}",
            colorize_tier(tier),
            config.capacity.get(tier),
            rate.hourly_rate,
            rate.daily_cap
        );
    }
    println!("grace: {:.2}h", config.rates.grace_hours);
    Ok(EXIT_SUCCESS)
}
