// src/core/mod.rs - Core Domain Module
//! Core domain types: identifiers, the order entity, and the command and
//! event vocabulary shared by the engine and its consumers.

pub mod events;
pub mod order;
pub mod types;

pub use events::{Command, MarketEvent, Match, TopOfBook, Trade};
pub use order::{Order, OrderBuilder};
pub use types::{OrderId, OrderType, Price, Qty, Side, Symbol, Timestamp};
