// src/core/events.rs - Command and Event Vocabulary
//! Inbound commands and outbound market events.
//!
//! Both streams are tagged unions with exhaustive dispatch: producers push
//! [`Command`] values at the runner, consumers poll [`MarketEvent`] values
//! back out. [`Match`] is the matching loop's internal execution record; the
//! engine wraps it into a [`Trade`] with the symbol, an execution id, and a
//! timestamp before it leaves the engine layer.

use crate::core::order::Order;
use crate::core::types::{OrderId, Price, Qty, Symbol, Timestamp};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

/// One execution produced by a book's matching loop.
///
/// Internal to the engine layer; consumers only ever see [`Trade`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Match {
    /// Id of the buy-side order.
    pub buy_id: OrderId,
    /// Id of the sell-side order.
    pub sell_id: OrderId,
    /// Execution price.
    pub price: Price,
    /// Executed quantity.
    pub qty: Qty,
}

/// A trade report published to consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    /// Unique execution id.
    pub execution_id: Uuid,
    /// Symbol the trade printed on.
    pub symbol: Symbol,
    /// Id of the buy-side order.
    pub buy_id: OrderId,
    /// Id of the sell-side order.
    pub sell_id: OrderId,
    /// Execution price.
    pub price: Price,
    /// Executed quantity.
    pub qty: Qty,
    /// Execution timestamp.
    pub executed_at: Timestamp,
}

impl Trade {
    /// Wrap a matching-loop execution with its symbol.
    pub fn from_match(symbol: impl Into<Symbol>, m: Match) -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            symbol: symbol.into(),
            buy_id: m.buy_id,
            sell_id: m.sell_id,
            price: m.price,
            qty: m.qty,
            executed_at: Utc::now(),
        }
    }
}

/// Top-of-book snapshot published after each order-entry command.
///
/// Price and quantity are zero when the side holds no quotable order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopOfBook {
    /// Symbol of the book.
    pub symbol: Symbol,
    /// Best bid price, or 0 when the bid side is empty.
    pub bid_price: Price,
    /// Quantity of the best bid, or 0.
    pub bid_qty: Qty,
    /// Best ask price, or 0 when the ask side is empty.
    pub ask_price: Price,
    /// Quantity of the best ask, or 0.
    pub ask_qty: Qty,
}

/// Inbound command stream.
#[derive(Debug, Clone)]
pub enum Command {
    /// Submit a fully constructed order.
    NewOrder(Order),
    /// Cancel a working order by id.
    Cancel(OrderId),
    /// Amend a working order's price and/or quantity.
    Modify {
        /// Id of the order to amend.
        id: OrderId,
        /// New price, or `None` to keep the current price.
        price: Option<Price>,
        /// New quantity, or `None` to keep the current quantity.
        /// `Some(0)` cancels the order.
        qty: Option<Qty>,
    },
}

/// Outbound event stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketEvent {
    /// Two orders crossed.
    Trade(Trade),
    /// Best bid/ask after a fully processed command.
    TopOfBook(TopOfBook),
}
