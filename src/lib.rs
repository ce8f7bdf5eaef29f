// src/lib.rs - Matchbook Library Root
//! # Matchbook - Single-Venue Matching Engine
//!
//! A price-time-priority limit order book matching engine with:
//! - Per-symbol order books with FIFO price levels
//! - Limit, market, and stop order entry with cancel and modify
//! - A multi-symbol execution engine with a pre-trade risk gate
//! - A single-writer runner that serializes concurrent command streams
//!   and publishes trade and top-of-book events to polling consumers
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌─────────────┐
//! │  Producer   │   │  Producer   │   │  Producer   │
//! └──────┬──────┘   └──────┬──────┘   └──────┬──────┘
//!        │   push(Command) │                 │
//!        └─────────────────┼─────────────────┘
//!                          ▼
//!              ┌───────────────────────┐
//!              │     Engine Runner     │  inbound FIFO, worker thread,
//!              │   (serialization)     │  outbound event FIFO
//!              └───────────┬───────────┘
//!                          ▼
//!              ┌───────────────────────┐
//!              │   Execution Engine    │  symbol routing, risk gate,
//!              │  (multi-symbol hub)   │  id -> book index, trade sink
//!              └───────────┬───────────┘
//!                          ▼
//!              ┌───────────────────────┐
//!              │      Order Book       │  price-time priority levels,
//!              │     (per symbol)      │  matching loop
//!              └───────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use matchbook::prelude::*;
//!
//! fn main() -> EngineResult<()> {
//!     let engine = ExecutionEngine::new();
//!
//!     let bid = Order::limit("AAPL", Side::Buy, 150.0, 30)?;
//!     let ask = Order::limit("AAPL", Side::Sell, 149.5, 25)?;
//!
//!     engine.submit(bid)?;
//!     engine.submit(ask)?;
//!
//!     let top = engine.top_of_book("AAPL").unwrap();
//!     assert_eq!(top.bid_qty, 5);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate
)]
#![warn(missing_docs)]
#![deny(unsafe_code)]

use thiserror::Error;

pub mod book;
pub mod core;
pub mod engine;

// Re-export the main surface for convenience
pub use book::{BookDepth, DepthRow, OrderBook};
pub use core::{
    events::{Command, MarketEvent, Match, TopOfBook, Trade},
    order::{Order, OrderBuilder},
    types::{OrderId, OrderType, Price, Qty, Side, Symbol, Timestamp},
};
pub use engine::{runner::EngineRunner, EngineConfig, ExecutionEngine, TradeSink};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Errors raised by the engine for programming-error class failures.
///
/// Soft operational failures (cancel or modify of an unknown id) are not
/// errors; they surface as `false` / `None` results instead.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Order construction or amendment violated a structural rule.
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    /// An order was routed to a book for a different symbol.
    #[error("order symbol {order} does not match book symbol {book}")]
    SymbolMismatch {
        /// Symbol of the receiving book.
        book: String,
        /// Symbol carried by the order.
        order: String,
    },

    /// Pre-trade risk gate: per-order quantity ceiling exceeded.
    #[error("order quantity {qty} exceeds per-order limit {max}")]
    RiskLimit {
        /// Quantity of the rejected order.
        qty: u64,
        /// Configured ceiling at the time of submission.
        max: u64,
    },

    /// An operation required an active order but found a terminal one.
    #[error("order {0} is no longer active")]
    InactiveOrder(u64),
}

/// Result type used throughout the library
pub type EngineResult<T> = Result<T, EngineError>;

/// Constants used throughout the library
pub mod constants {
    //! System-wide defaults

    /// Default per-order quantity ceiling enforced at submit time.
    pub const DEFAULT_MAX_ORDER_QTY: u64 = 1_000_000;

    /// Default number of per-order rows per side in depth snapshots.
    pub const DEFAULT_DEPTH_LEVELS: usize = 10;
}

/// Prelude module for convenient imports
pub mod prelude {
    //! Re-exports the most commonly used types and traits

    pub use crate::{
        book::{BookDepth, DepthRow, OrderBook},
        core::{
            events::{Command, MarketEvent, Match, TopOfBook, Trade},
            order::{Order, OrderBuilder},
            types::{OrderId, OrderType, Price, Qty, Side, Symbol},
        },
        engine::{runner::EngineRunner, EngineConfig, ExecutionEngine, TradeSink},
        EngineError, EngineResult,
    };
}
