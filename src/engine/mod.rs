// src/engine/mod.rs - Execution Engine
//! Multi-symbol execution hub.
//!
//! The engine owns one [`OrderBook`] per symbol, routes cancel and modify
//! requests by order id alone through a global id index, enforces the
//! pre-trade risk gate, and hands every execution to the configured
//! [`TradeSink`] synchronously while the triggering operation is still in
//! flight.
//!
//! The book registry and the id index are sharded concurrent maps; each book
//! sits behind its own mutex so traffic on different symbols never
//! serializes. The registry is only touched to resolve a book handle, never
//! held across a book operation.

pub mod runner;

use crate::book::{BookDepth, OrderBook};
use crate::constants::DEFAULT_MAX_ORDER_QTY;
use crate::core::events::{Match, TopOfBook, Trade};
use crate::core::order::Order;
use crate::core::types::{OrderId, Price, Qty, Symbol};
use crate::{EngineError, EngineResult};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Receiver of trade reports, invoked synchronously from `submit`/`modify`.
///
/// Implementations must not panic; the engine does not guard against a
/// faulting sink.
pub trait TradeSink: Send + Sync {
    /// Called once per execution, in the order the executions occurred.
    fn on_trade(&self, trade: &Trade);
}

impl<T: TradeSink + ?Sized> TradeSink for Arc<T> {
    fn on_trade(&self, trade: &Trade) {
        (**self).on_trade(trade);
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Per-order quantity ceiling enforced at submit time.
    pub max_order_qty: Qty,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_order_qty: DEFAULT_MAX_ORDER_QTY,
        }
    }
}

/// Multi-symbol execution engine.
pub struct ExecutionEngine {
    config: RwLock<EngineConfig>,
    books: DashMap<Symbol, Arc<Mutex<OrderBook>>>,
    id_index: DashMap<OrderId, Symbol>,
    trade_sink: RwLock<Option<Box<dyn TradeSink>>>,
}

impl ExecutionEngine {
    /// Create an engine with default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with the given configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config: RwLock::new(config),
            books: DashMap::new(),
            id_index: DashMap::new(),
            trade_sink: RwLock::new(None),
        }
    }

    /// Idempotently create the book for a symbol.
    pub fn ensure_book(&self, symbol: &str) {
        self.book_handle_or_create(symbol);
    }

    /// Whether a book exists for the symbol.
    pub fn book_exists(&self, symbol: &str) -> bool {
        self.books.contains_key(symbol)
    }

    /// Run a closure against the book for a symbol, if it exists.
    ///
    /// The book's mutex is held for the duration of the closure, so the view
    /// is consistent with respect to concurrent operations.
    pub fn with_book<T>(&self, symbol: &str, f: impl FnOnce(&OrderBook) -> T) -> Option<T> {
        let handle = self.book_handle(symbol)?;
        let book = handle.lock();
        Some(f(&book))
    }

    /// Set the per-order quantity ceiling.
    ///
    /// Configuration points are expected to be established before concurrent
    /// submission begins.
    pub fn set_max_order_qty(&self, max: Qty) {
        self.config.write().max_order_qty = max;
    }

    /// Install the trade sink.
    ///
    /// Configuration points are expected to be established before concurrent
    /// submission begins.
    pub fn set_trade_sink(&self, sink: Box<dyn TradeSink>) {
        *self.trade_sink.write() = Some(sink);
    }

    /// Submit an order: route to its book, rest it, and match.
    ///
    /// Fails hard when the quantity exceeds the configured ceiling. Every
    /// execution triggered by the submission is delivered to the trade sink
    /// before this method returns. Returns the order's id.
    pub fn submit(&self, order: Order) -> EngineResult<OrderId> {
        let max_order_qty = self.config.read().max_order_qty;
        if order.quantity() > max_order_qty {
            warn!(
                "rejecting order {}: qty {} above limit {}",
                order.id(),
                order.quantity(),
                max_order_qty
            );
            return Err(EngineError::RiskLimit {
                qty: order.quantity(),
                max: max_order_qty,
            });
        }

        let symbol = order.symbol().to_string();
        let handle = self.book_handle_or_create(&symbol);

        let (id, trades) = {
            let mut book = handle.lock();
            let id = book.add_order(order)?;
            self.id_index.insert(id, symbol);
            let fills = book.match_orders();
            (id, self.absorb_fills(&book, &fills))
        };

        self.dispatch(&trades);
        Ok(id)
    }

    /// Cancel a working order by id.
    ///
    /// Returns `false` for an unknown id. On success the id index entry is
    /// erased as well.
    pub fn cancel(&self, id: OrderId) -> bool {
        let Some(handle) = self.routed_book(id) else {
            return false;
        };
        let removed = handle.lock().remove_order(id);
        if removed {
            self.id_index.remove(&id);
            debug!("cancelled order {}", id);
        }
        removed
    }

    /// Amend a working order by id, then re-match its book.
    ///
    /// Returns `Ok(false)` for an unknown id. Executions triggered by the
    /// amendment are delivered to the trade sink before this method returns.
    /// A modify to zero quantity cancels the order and erases its id index
    /// entry.
    pub fn modify(
        &self,
        id: OrderId,
        new_price: Option<Price>,
        new_qty: Option<Qty>,
    ) -> EngineResult<bool> {
        let Some(handle) = self.routed_book(id) else {
            return Ok(false);
        };

        let trades = {
            let mut book = handle.lock();
            if !book.modify_order(id, new_price, new_qty)? {
                return Ok(false);
            }
            if book.get_order(id).is_none() {
                // Modify-to-zero cancelled the order
                self.id_index.remove(&id);
            }
            let fills = book.match_orders();
            self.absorb_fills(&book, &fills)
        };

        self.dispatch(&trades);
        Ok(true)
    }

    /// Top-of-book snapshot for a symbol, zeros for an empty side.
    pub fn top_of_book(&self, symbol: &str) -> Option<TopOfBook> {
        self.with_book(symbol, |book| {
            let (bid_price, bid_qty) = book
                .best_bid()
                .map_or((0.0, 0), |o| (o.price(), o.quantity()));
            let (ask_price, ask_qty) = book
                .best_ask()
                .map_or((0.0, 0), |o| (o.price(), o.quantity()));
            TopOfBook {
                symbol: book.symbol().to_string(),
                bid_price,
                bid_qty,
                ask_price,
                ask_qty,
            }
        })
    }

    /// Depth snapshot for a symbol with up to `levels` rows per side.
    pub fn depth(&self, symbol: &str, levels: usize) -> Option<BookDepth> {
        self.with_book(symbol, |book| book.depth(levels))
    }

    /// Number of working orders across all books.
    pub fn order_count(&self) -> usize {
        self.id_index.len()
    }

    /// Symbols with an existing book.
    pub fn symbols(&self) -> Vec<Symbol> {
        self.books.iter().map(|entry| entry.key().clone()).collect()
    }

    fn book_handle(&self, symbol: &str) -> Option<Arc<Mutex<OrderBook>>> {
        self.books.get(symbol).map(|entry| Arc::clone(entry.value()))
    }

    fn book_handle_or_create(&self, symbol: &str) -> Arc<Mutex<OrderBook>> {
        Arc::clone(
            self.books
                .entry(symbol.to_string())
                .or_insert_with(|| {
                    debug!("creating book for symbol {}", symbol);
                    Arc::new(Mutex::new(OrderBook::new(symbol)))
                })
                .value(),
        )
    }

    /// Book handle for the order id, via the id index.
    fn routed_book(&self, id: OrderId) -> Option<Arc<Mutex<OrderBook>>> {
        let symbol = self.id_index.get(&id).map(|entry| entry.value().clone())?;
        self.book_handle(&symbol)
    }

    /// Wrap fills as trades and drop id index entries for fully filled
    /// orders, which the book has already evicted.
    fn absorb_fills(&self, book: &OrderBook, fills: &[Match]) -> Vec<Trade> {
        fills
            .iter()
            .map(|&m| {
                for id in [m.buy_id, m.sell_id] {
                    if book.get_order(id).is_none() {
                        self.id_index.remove(&id);
                    }
                }
                Trade::from_match(book.symbol(), m)
            })
            .collect()
    }

    fn dispatch(&self, trades: &[Trade]) {
        if trades.is_empty() {
            return;
        }
        let guard = self.trade_sink.read();
        if let Some(sink) = guard.as_ref() {
            for trade in trades {
                sink.on_trade(trade);
            }
        }
    }
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new()
    }
}
