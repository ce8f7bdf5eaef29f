// src/core/types.rs - Core Type Definitions
//! Fundamental type aliases and enums used across the engine.

use crate::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Type alias for order ids - assigned monotonically, process-wide
pub type OrderId = u64;

/// Type alias for trading symbols
pub type Symbol = String;

/// Type alias for prices
///
/// Note: production venues usually quote in integer ticks; this engine keeps
/// the floating-point representation of its public contract and confines all
/// price ordering to the book's total-order key.
pub type Price = f64;

/// Type alias for order quantities
pub type Qty = u64;

/// Type alias for timestamps
pub type Timestamp = DateTime<Utc>;

/// Order side - Buy or Sell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy order - bids for liquidity
    Buy,
    /// Sell order - offers liquidity
    Sell,
}

impl Side {
    /// The opposing side of the book.
    pub fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "Buy"),
            Self::Sell => write!(f, "Sell"),
        }
    }
}

impl FromStr for Side {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "buy" | "b" | "bid" => Ok(Self::Buy),
            "sell" | "s" | "ask" => Ok(Self::Sell),
            _ => Err(EngineError::InvalidOrder(format!("invalid side: {s}"))),
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Limit order - rests at its price and executes at that price or better
    Limit,
    /// Market order - executes against the best opposing liquidity; an
    /// unfilled remainder rests ahead of all limit orders on its side
    Market,
    /// Stop order - accepted and rested at its price; once on the book it
    /// participates in matching like a limit order
    Stop,
}

impl OrderType {
    /// Whether this order executes without a limit price of its own.
    pub fn is_market(self) -> bool {
        matches!(self, Self::Market)
    }

    /// Whether construction and amendment require a positive price.
    pub fn requires_price(self) -> bool {
        !self.is_market()
    }
}

impl Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limit => write!(f, "Limit"),
            Self::Market => write!(f, "Market"),
            Self::Stop => write!(f, "Stop"),
        }
    }
}

impl FromStr for OrderType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "limit" | "l" => Ok(Self::Limit),
            "market" | "m" => Ok(Self::Market),
            "stop" => Ok(Self::Stop),
            _ => Err(EngineError::InvalidOrder(format!("invalid order type: {s}"))),
        }
    }
}
