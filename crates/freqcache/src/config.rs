//! Cache configuration
//!
//! Byte budgets accept plain integers or human-readable sizes:
//! ```text
//! 4096        bytes
//! 512KB       decimal units (KB, MB, GB)
//! 64MiB       binary units (KiB, MiB, GiB)
//! 0           unbounded
//! unbounded   unbounded
//! ```

use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{alpha0, digit1, multispace0},
    combinator::{all_consuming, map, map_res},
    sequence::{delimited, pair},
    IResult,
};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Default number of entries to preallocate for
pub const DEFAULT_INITIAL_CAPACITY: usize = 1024;

/// Maximum bytes a cache may account before evicting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "BudgetRepr")]
pub enum ByteBudget {
    /// Never evict on capacity
    #[default]
    Unbounded,
    /// Evict once accounted bytes exceed this many
    Limit(usize),
}

impl ByteBudget {
    /// Budget from a signed byte count; zero or negative means unbounded
    pub fn from_bytes(max_bytes: i64) -> Self {
        match usize::try_from(max_bytes) {
            Ok(0) | Err(_) => ByteBudget::Unbounded,
            Ok(limit) => ByteBudget::Limit(limit),
        }
    }

    /// Parse a human-readable size such as `"64MiB"`
    pub fn parse(input: &str) -> Result<Self> {
        let (_, parsed) = all_consuming(delimited(multispace0, budget, multispace0))(input)?;

        match parsed {
            Parsed::Unbounded => Ok(ByteBudget::Unbounded),
            Parsed::Sized(count, unit) => {
                let multiplier = unit_multiplier(unit)?;
                count
                    .checked_mul(multiplier)
                    .and_then(|bytes| usize::try_from(bytes).ok())
                    .map(|bytes| {
                        if bytes == 0 {
                            ByteBudget::Unbounded
                        } else {
                            ByteBudget::Limit(bytes)
                        }
                    })
                    .ok_or_else(|| Error::BudgetOverflow(input.trim().to_string()))
            }
        }
    }

    /// Byte limit, if bounded
    pub fn limit(&self) -> Option<usize> {
        match self {
            ByteBudget::Unbounded => None,
            ByteBudget::Limit(limit) => Some(*limit),
        }
    }
}

enum Parsed<'a> {
    Unbounded,
    Sized(u64, &'a str),
}

fn budget(input: &str) -> IResult<&str, Parsed<'_>> {
    alt((
        map(alt((tag_no_case("unbounded"), tag_no_case("none"))), |_| {
            Parsed::Unbounded
        }),
        map(
            pair(
                map_res(digit1, |digits: &str| digits.parse::<u64>()),
                delimited(multispace0, alpha0, multispace0),
            ),
            |(count, unit)| Parsed::Sized(count, unit),
        ),
    ))(input)
}

fn unit_multiplier(unit: &str) -> Result<u64> {
    let multiplier = match unit.to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "kb" => 1_000,
        "mb" => 1_000_000,
        "gb" => 1_000_000_000,
        "k" | "kib" => 1 << 10,
        "m" | "mib" => 1 << 20,
        "g" | "gib" => 1 << 30,
        _ => return Err(Error::UnknownUnit(unit.to_string())),
    };
    Ok(multiplier)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BudgetRepr {
    Bytes(i64),
    Text(String),
}

impl TryFrom<BudgetRepr> for ByteBudget {
    type Error = Error;

    fn try_from(repr: BudgetRepr) -> Result<Self> {
        match repr {
            BudgetRepr::Bytes(max_bytes) => Ok(ByteBudget::from_bytes(max_bytes)),
            BudgetRepr::Text(text) => ByteBudget::parse(&text),
        }
    }
}

/// Settings shared by every cache policy
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Byte budget before eviction kicks in
    pub max_bytes: ByteBudget,

    /// Entries to preallocate table and queue space for
    pub initial_capacity: usize,
}

impl CacheConfig {
    /// Config with the given budget and default preallocation
    pub fn new(max_bytes: ByteBudget) -> Self {
        Self {
            max_bytes,
            ..Self::default()
        }
    }

    /// Override the preallocated entry count
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: ByteBudget::Unbounded,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_bytes() {
        assert_eq!(ByteBudget::parse("4096").unwrap(), ByteBudget::Limit(4096));
        assert_eq!(ByteBudget::parse(" 16 B ").unwrap(), ByteBudget::Limit(16));
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(ByteBudget::parse("512KB").unwrap(), ByteBudget::Limit(512_000));
        assert_eq!(ByteBudget::parse("64MiB").unwrap(), ByteBudget::Limit(64 << 20));
        assert_eq!(ByteBudget::parse("2 gib").unwrap(), ByteBudget::Limit(2 << 30));
        assert_eq!(ByteBudget::parse("8k").unwrap(), ByteBudget::Limit(8192));
    }

    #[test]
    fn test_parse_unbounded() {
        assert_eq!(ByteBudget::parse("0").unwrap(), ByteBudget::Unbounded);
        assert_eq!(ByteBudget::parse("0MiB").unwrap(), ByteBudget::Unbounded);
        assert_eq!(ByteBudget::parse("Unbounded").unwrap(), ByteBudget::Unbounded);
        assert_eq!(ByteBudget::parse("none").unwrap(), ByteBudget::Unbounded);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(ByteBudget::parse("12 parsecs"), Err(Error::UnknownUnit(_))));
        assert!(matches!(ByteBudget::parse("MiB"), Err(Error::Parse(_))));
        assert!(matches!(ByteBudget::parse("-5"), Err(Error::Parse(_))));
        assert!(matches!(
            ByteBudget::parse("99999999999999999999"),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            ByteBudget::parse("18446744073709551615GiB"),
            Err(Error::BudgetOverflow(_))
        ));
    }

    #[test]
    fn test_from_signed_bytes() {
        assert_eq!(ByteBudget::from_bytes(-1), ByteBudget::Unbounded);
        assert_eq!(ByteBudget::from_bytes(0), ByteBudget::Unbounded);
        assert_eq!(ByteBudget::from_bytes(24), ByteBudget::Limit(24));
        assert_eq!(ByteBudget::Limit(24).limit(), Some(24));
        assert_eq!(ByteBudget::Unbounded.limit(), None);
    }

    #[test]
    fn test_config_deserialize() {
        let config: CacheConfig =
            serde_json::from_str(r#"{"max_bytes": "1MiB", "initial_capacity": 64}"#).unwrap();
        assert_eq!(config.max_bytes, ByteBudget::Limit(1 << 20));
        assert_eq!(config.initial_capacity, 64);

        let config: CacheConfig = serde_json::from_str(r#"{"max_bytes": -1}"#).unwrap();
        assert_eq!(config.max_bytes, ByteBudget::Unbounded);
        assert_eq!(config.initial_capacity, DEFAULT_INITIAL_CAPACITY);

        let config: CacheConfig = serde_json::from_str(r#"{"max_bytes": 2048}"#).unwrap();
        assert_eq!(config.max_bytes, ByteBudget::Limit(2048));
    }

    #[test]
    fn test_config_deserialize_rejects_bad_unit() {
        let result: std::result::Result<CacheConfig, _> =
            serde_json::from_str(r#"{"max_bytes": "3 furlongs"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::new(ByteBudget::Limit(100)).with_initial_capacity(8);
        assert_eq!(config.max_bytes.limit(), Some(100));
        assert_eq!(config.initial_capacity, 8);
    }
}
