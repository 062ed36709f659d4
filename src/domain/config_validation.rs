//! Configuration validation.
//!
//! Checks every `[reinvest]` / `[indicators]` field before a run starts and
//! turns the indicator keys into [`IndicatorType`] values.

use crate::domain::error::ReinvestorError;
use crate::domain::indicator::IndicatorType;
use crate::ports::config_port::ConfigPort;

pub const REINVEST: &str = "reinvest";
pub const INDICATORS: &str = "indicators";

pub const DEFAULT_REBALANCE_MONTHS: [u32; 1] = [1];

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> ReinvestorError {
    ReinvestorError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_reinvest_config(config: &dyn ConfigPort) -> Result<(), ReinvestorError> {
    rebalance_months(config)?;
    delimiter(config, REINVEST)?;
    Ok(())
}

pub fn validate_indicator_config(config: &dyn ConfigPort) -> Result<(), ReinvestorError> {
    let specs = indicator_specs(config)?;
    if specs.is_empty() {
        return Err(invalid(
            INDICATORS,
            "stochastic",
            "no indicator configured (set stochastic, donchian, atr, bollinger or deciles)",
        ));
    }
    delimiter(config, INDICATORS)?;
    Ok(())
}

/// Parses month numbers 1-12 from list items.
pub fn parse_months(items: &[String]) -> Result<Vec<u32>, ReinvestorError> {
    let mut months = Vec::with_capacity(items.len());
    for item in items {
        let month: u32 = item.parse().map_err(|_| {
            invalid(REINVEST, "rebalance_months", format!("{item:?} is not a month number"))
        })?;
        if !(1..=12).contains(&month) {
            return Err(invalid(
                REINVEST,
                "rebalance_months",
                format!("month {month} outside 1-12"),
            ));
        }
        if !months.contains(&month) {
            months.push(month);
        }
    }
    Ok(months)
}

/// `[reinvest] rebalance_months`, defaulting to January.
pub fn rebalance_months(config: &dyn ConfigPort) -> Result<Vec<u32>, ReinvestorError> {
    match config.get_list(REINVEST, "rebalance_months") {
        Some(items) => parse_months(&items),
        None => Ok(DEFAULT_REBALANCE_MONTHS.to_vec()),
    }
}

/// Single-byte field delimiter under `section`, if set.
pub fn delimiter(config: &dyn ConfigPort, section: &str) -> Result<Option<u8>, ReinvestorError> {
    match config.get_string(section, "delimiter") {
        None => Ok(None),
        Some(raw) => parse_delimiter(&raw).map(Some).ok_or_else(|| {
            invalid(section, "delimiter", "must be a single ASCII character")
        }),
    }
}

pub fn parse_delimiter(raw: &str) -> Option<u8> {
    match raw {
        "\\t" | "tab" => Some(b'\t'),
        _ => {
            let bytes = raw.as_bytes();
            (bytes.len() == 1 && bytes[0].is_ascii()).then(|| bytes[0])
        }
    }
}

fn parse_usize(section: &str, key: &str, raw: &str, name: &str) -> Result<usize, ReinvestorError> {
    let value: usize = raw
        .parse()
        .map_err(|_| invalid(section, key, format!("{name} {raw:?} is not a whole number")))?;
    if value == 0 {
        return Err(invalid(section, key, format!("{name} must be positive")));
    }
    Ok(value)
}

fn expect_arity(key: &str, items: &[String], allowed: &[usize]) -> Result<(), ReinvestorError> {
    if allowed.contains(&items.len()) {
        Ok(())
    } else {
        Err(invalid(
            INDICATORS,
            key,
            format!("expected {allowed:?} comma-separated values, got {}", items.len()),
        ))
    }
}

/// Every indicator configured under `[indicators]`, in a fixed order.
pub fn indicator_specs(config: &dyn ConfigPort) -> Result<Vec<IndicatorType>, ReinvestorError> {
    let mut specs = Vec::new();

    if let Some(items) = config.get_list(INDICATORS, "stochastic") {
        let key = "stochastic";
        expect_arity(key, &items, &[3])?;
        specs.push(IndicatorType::Stochastic {
            k_period: parse_usize(INDICATORS, key, &items[0], "k_period")?,
            d_period: parse_usize(INDICATORS, key, &items[1], "d_period")?,
            smooth_k: parse_usize(INDICATORS, key, &items[2], "smooth_k")?,
        });
    }

    if let Some(items) = config.get_list(INDICATORS, "donchian") {
        let key = "donchian";
        expect_arity(key, &items, &[1, 2])?;
        let offset = match items.get(1) {
            Some(raw) => raw
                .parse::<isize>()
                .map_err(|_| invalid(INDICATORS, key, format!("offset {raw:?} is not an integer")))?,
            None => 0,
        };
        specs.push(IndicatorType::Donchian {
            period: parse_usize(INDICATORS, key, &items[0], "period")?,
            offset,
        });
    }

    if let Some(items) = config.get_list(INDICATORS, "atr") {
        let key = "atr";
        expect_arity(key, &items, &[1, 2])?;
        let relative = match items.get(1).map(|s| s.to_lowercase()) {
            None => true,
            Some(flag) => match flag.as_str() {
                "true" | "yes" | "1" | "relative" => true,
                "false" | "no" | "0" | "absolute" => false,
                _ => return Err(invalid(INDICATORS, key, format!("{flag:?} is not a boolean"))),
            },
        };
        specs.push(IndicatorType::Atr {
            period: parse_usize(INDICATORS, key, &items[0], "period")?,
            relative,
        });
    }

    if let Some(items) = config.get_list(INDICATORS, "bollinger") {
        let key = "bollinger";
        expect_arity(key, &items, &[1, 2])?;
        let num_std_dev = match items.get(1) {
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|m| m.is_finite() && *m >= 0.0)
                .ok_or_else(|| {
                    invalid(INDICATORS, key, format!("num_std_dev {raw:?} is invalid"))
                })?,
            None => 2.0,
        };
        specs.push(IndicatorType::Bollinger {
            window: parse_usize(INDICATORS, key, &items[0], "window")?,
            num_std_dev,
        });
    }

    if let Some(column) = config.get_string(INDICATORS, "deciles") {
        let column = column.trim();
        if column.is_empty() {
            return Err(invalid(INDICATORS, "deciles", "column name is empty"));
        }
        specs.push(IndicatorType::Deciles {
            column: column.to_string(),
        });
    }

    Ok(specs)
}
