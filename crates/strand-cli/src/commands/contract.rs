//! Contract command - print the declared signatures

use anyhow::Result;
use strand_adapter::contract::{self, CONTRACT};

pub fn run(json: bool) -> Result<()> {
    if json {
        let entries: Vec<serde_json::Value> = CONTRACT
            .iter()
            .map(|decl| {
                serde_json::json!({
                    "symbol": decl.symbol,
                    "signature": decl.signature(),
                    "release": decl.release,
                    "callable": decl.is_dynamic(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        println!("{}", contract::render());
    }
    Ok(())
}
