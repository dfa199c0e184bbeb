//! Call command - invoke one declared symbol with typed arguments

use super::Target;
use anyhow::{anyhow, bail, Context, Result};
use strand_adapter::contract;
use strand_adapter::{ExternType, Value};

pub fn run(target: &Target, symbol: &str, raw_args: &[String], json: bool) -> Result<()> {
    let decl = contract::find(symbol)
        .ok_or_else(|| anyhow!("'{}' is not declared in the contract", symbol))?;
    if raw_args.len() != decl.params.len() {
        bail!(
            "{} takes {} argument(s), got {}",
            decl.signature(),
            decl.params.len(),
            raw_args.len()
        );
    }
    let args = decl
        .params
        .iter()
        .zip(raw_args)
        .enumerate()
        .map(|(i, (ty, raw))| {
            parse_arg(ty, raw).with_context(|| format!("argument {} of {}", i + 1, symbol))
        })
        .collect::<Result<Vec<_>>>()?;

    let bridge = target.open()?;
    tracing::debug!(symbol, args = args.len(), "calling");
    let value = bridge.invoke(symbol, &args)?;

    if json {
        println!("{}", serde_json::to_string(&value)?);
    } else {
        println!("{}", value);
    }
    Ok(())
}

/// Parse one command-line argument as the declared parameter type
fn parse_arg(ty: &ExternType, raw: &str) -> Result<Value> {
    match ty {
        ExternType::U8 | ExternType::U32 | ExternType::U64 => {
            Ok(Value::Int(parse_int(raw)?))
        }
        ExternType::Bool => match raw {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => bail!("expected true or false, got '{}'", raw),
        },
        ExternType::CharPtr => Ok(Value::text(raw)),
        ExternType::U32Array => {
            let items = raw
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(parse_int)
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::ints(items))
        }
        ExternType::Pair => {
            let (x, y) = raw
                .split_once(',')
                .ok_or_else(|| anyhow!("expected a pair 'x,y', got '{}'", raw))?;
            let x = x.trim().parse().with_context(|| format!("invalid x '{}'", x))?;
            let y = y.trim().parse().with_context(|| format!("invalid y '{}'", y))?;
            Ok(Value::Pair(x, y))
        }
        other => bail!("parameters of type {} cannot be given on the command line", other),
    }
}

fn parse_int(raw: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .with_context(|| format!("invalid integer '{}'", raw))
}
