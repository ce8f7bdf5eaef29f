// src/book/mod.rs - Per-Symbol Order Book
//! Price-time priority order book for a single symbol.
//!
//! The book owns every resting order by value in an id-keyed arena; the
//! price levels and the per-side market-order FIFOs hold ids only. Cancel,
//! modify, and fill unlink eagerly, so queue heads are always live orders
//! and the matching loop never has to sweep tombstones.
//!
//! ## Book Structure
//!
//! ```text
//! Ask (Sell) Side                    Bid (Buy) Side
//! market FIFO (matched first)        market FIFO (matched first)
//! Price  | Orders                    Price  | Orders
//! -------|--------                   -------|--------
//! 150.03 | 12, 17                    149.95 | 4
//! 150.05 | 9            best ask     149.92 | 2, 8    best bid
//! 150.10 | 21                        149.90 | 11
//! ```
//!
//! Matching runs to fixpoint: one call to [`OrderBook::match_orders`] drains
//! all crossing liquidity and leaves the book non-crossing.

mod level;

use crate::core::events::Match;
use crate::core::order::Order;
use crate::core::types::{OrderId, OrderType, Price, Qty, Side, Symbol};
use crate::{EngineError, EngineResult};
use level::{OrderedPrice, PriceLevel};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::debug;

/// One (price, quantity) row of a depth snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DepthRow {
    /// Resting price of the order. Zero for a resting market order.
    pub price: Price,
    /// Residual quantity of the order.
    pub qty: Qty,
}

/// Depth snapshot of one book, flattened per order.
///
/// Two orders at the same price produce two rows; aggregation is left to the
/// consumer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookDepth {
    /// Symbol of the book.
    pub symbol: Symbol,
    /// Buy rows, best-first (resting market orders lead with price 0).
    pub bids: Vec<DepthRow>,
    /// Sell rows, best-first (resting market orders lead with price 0).
    pub asks: Vec<DepthRow>,
}

/// Arena slot: the order plus its book-arrival sequence.
///
/// The sequence is re-stamped when a modify re-queues the order, so it also
/// decides which of two crossing limit orders was resting and therefore sets
/// the trade price.
#[derive(Debug, Clone)]
struct BookEntry {
    order: Order,
    seq: u64,
}

/// Price-time priority order book for one symbol.
#[derive(Debug)]
pub struct OrderBook {
    symbol: Symbol,
    orders: HashMap<OrderId, BookEntry>,
    bids: BTreeMap<OrderedPrice, PriceLevel>,
    asks: BTreeMap<OrderedPrice, PriceLevel>,
    market_bids: VecDeque<OrderId>,
    market_asks: VecDeque<OrderId>,
    next_seq: u64,
}

impl OrderBook {
    /// Create an empty book for a symbol.
    pub fn new(symbol: impl Into<Symbol>) -> Self {
        Self {
            symbol: symbol.into(),
            orders: HashMap::new(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            market_bids: VecDeque::new(),
            market_asks: VecDeque::new(),
            next_seq: 0,
        }
    }

    /// Symbol this book trades.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Number of resting orders across both sides.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Whether the book holds no resting orders.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Look up a resting order by id.
    pub fn get_order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id).map(|entry| &entry.order)
    }

    /// Insert an order at the tail of its queue.
    ///
    /// Faults on a symbol mismatch or an inactive order; never matches.
    /// Returns the order's id.
    pub fn add_order(&mut self, order: Order) -> EngineResult<OrderId> {
        if order.symbol() != self.symbol {
            return Err(EngineError::SymbolMismatch {
                book: self.symbol.clone(),
                order: order.symbol().to_string(),
            });
        }
        if !order.is_active() {
            return Err(EngineError::InactiveOrder(order.id()));
        }

        let id = order.id();
        debug!(
            "book {}: add order {} {} {} {} @ {}",
            self.symbol,
            id,
            order.side(),
            order.order_type(),
            order.quantity(),
            order.price()
        );

        self.enqueue(order.side(), order.order_type(), order.price(), id);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.orders.insert(id, BookEntry { order, seq });
        Ok(id)
    }

    /// Cancel a resting order.
    ///
    /// Returns `false` for an unknown id. On success the order leaves both
    /// its queue (erasing an emptied level) and the arena.
    pub fn remove_order(&mut self, id: OrderId) -> bool {
        let Some(mut entry) = self.orders.remove(&id) else {
            return false;
        };
        self.unlink(
            entry.order.side(),
            entry.order.order_type(),
            entry.order.price(),
            id,
        );
        entry.order.cancel();
        debug!("book {}: cancelled order {}", self.symbol, id);
        true
    }

    /// Amend a resting order's price and/or quantity.
    ///
    /// Returns `Ok(false)` for an unknown or inactive id. A new quantity of
    /// zero cancels the order and returns `Ok(true)`. Otherwise the order is
    /// re-queued at the tail of its destination level: any modify loses time
    /// priority. Price validity rules from construction still apply.
    pub fn modify_order(
        &mut self,
        id: OrderId,
        new_price: Option<Price>,
        new_qty: Option<Qty>,
    ) -> EngineResult<bool> {
        let (side, order_type, old_price, price, qty) = {
            let Some(entry) = self.orders.get(&id) else {
                return Ok(false);
            };
            if !entry.order.is_active() {
                return Ok(false);
            }
            (
                entry.order.side(),
                entry.order.order_type(),
                entry.order.price(),
                new_price.unwrap_or_else(|| entry.order.price()),
                new_qty.unwrap_or_else(|| entry.order.quantity()),
            )
        };

        // Validate before unlinking so a bad amendment leaves the book intact.
        if order_type.requires_price() && (price <= 0.0 || !price.is_finite()) {
            return Err(EngineError::InvalidOrder(
                "price must be positive for non-market orders".into(),
            ));
        }

        self.unlink(side, order_type, old_price, id);

        if qty == 0 {
            if let Some(mut entry) = self.orders.remove(&id) {
                entry.order.cancel();
            }
            debug!("book {}: modify-to-zero cancelled order {}", self.symbol, id);
            return Ok(true);
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        if let Some(entry) = self.orders.get_mut(&id) {
            entry.order.modify(price, qty)?;
            entry.seq = seq;
        }
        self.enqueue(side, order_type, price, id);
        debug!(
            "book {}: modified order {} to {} @ {}",
            self.symbol, id, qty, price
        );
        Ok(true)
    }

    /// Best (highest) priced buy order, excluding resting market orders.
    pub fn best_bid(&self) -> Option<&Order> {
        self.bids
            .iter()
            .next_back()
            .and_then(|(_, level)| level.front())
            .and_then(|id| self.get_order(id))
    }

    /// Best (lowest) priced sell order, excluding resting market orders.
    pub fn best_ask(&self) -> Option<&Order> {
        self.asks
            .iter()
            .next()
            .and_then(|(_, level)| level.front())
            .and_then(|id| self.get_order(id))
    }

    /// Snapshot of active buy orders: resting market orders first, then
    /// best-price-first with FIFO order within each level.
    pub fn buy_orders(&self) -> Vec<&Order> {
        self.market_bids
            .iter()
            .chain(self.bids.iter().rev().flat_map(|(_, level)| level.iter()))
            .filter_map(|&id| self.get_order(id))
            .collect()
    }

    /// Snapshot of active sell orders: resting market orders first, then
    /// best-price-first with FIFO order within each level.
    pub fn sell_orders(&self) -> Vec<&Order> {
        self.market_asks
            .iter()
            .chain(self.asks.iter().flat_map(|(_, level)| level.iter()))
            .filter_map(|&id| self.get_order(id))
            .collect()
    }

    /// Depth snapshot with up to `levels` per-order rows per side.
    pub fn depth(&self, levels: usize) -> BookDepth {
        let row = |order: &&Order| DepthRow {
            price: order.price(),
            qty: order.quantity(),
        };
        BookDepth {
            symbol: self.symbol.clone(),
            bids: self.buy_orders().iter().take(levels).map(row).collect(),
            asks: self.sell_orders().iter().take(levels).map(row).collect(),
        }
    }

    /// Run the matching loop to fixpoint and return the executions in the
    /// order they occurred.
    ///
    /// Head orders of the two sides are paired while they cross; a pair
    /// crosses when either order is a market order or the bid price is at or
    /// above the ask price. Two market orders never trade with each other;
    /// each pairs against opposing limit liquidity instead, or rests. The
    /// trade price is the limit side's price when one order is a market
    /// order, and the resting (earlier-queued) side's price when both are
    /// priced. On return the book is non-crossing.
    pub fn match_orders(&mut self) -> Vec<Match> {
        let mut executions = Vec::new();

        while let Some((buy_id, sell_id)) = self.next_crossing_pair() {
            let Some((qty, price, buy_market, sell_market)) = self.pair_terms(buy_id, sell_id)
            else {
                break;
            };

            if let Some(entry) = self.orders.get_mut(&buy_id) {
                entry.order.fill(qty);
            }
            if let Some(entry) = self.orders.get_mut(&sell_id) {
                entry.order.fill(qty);
            }

            debug!(
                "book {}: matched buy {} / sell {} for {} @ {}",
                self.symbol, buy_id, sell_id, qty, price
            );
            executions.push(Match {
                buy_id,
                sell_id,
                price,
                qty,
            });

            if self.is_filled(buy_id) {
                self.pop_best(Side::Buy, buy_market);
                self.orders.remove(&buy_id);
            }
            if self.is_filled(sell_id) {
                self.pop_best(Side::Sell, sell_market);
                self.orders.remove(&sell_id);
            }
        }

        executions
    }

    /// Head pair that is willing to trade, if any.
    fn next_crossing_pair(&self) -> Option<(OrderId, OrderId)> {
        let market_buy = self.market_bids.front().copied();
        let market_sell = self.market_asks.front().copied();
        let limit_buy = self
            .bids
            .iter()
            .next_back()
            .and_then(|(_, level)| level.front());
        let limit_sell = self.asks.iter().next().and_then(|(_, level)| level.front());

        let buy = market_buy.or(limit_buy)?;
        let sell = market_sell.or(limit_sell)?;

        if market_buy.is_some() && market_sell.is_some() {
            // Two market orders never trade with each other: pair each
            // against opposing limit liquidity, or leave both resting.
            if let Some(ask) = limit_sell {
                return Some((buy, ask));
            }
            if let Some(bid) = limit_buy {
                return Some((bid, sell));
            }
            return None;
        }

        let buy_entry = self.orders.get(&buy)?;
        let sell_entry = self.orders.get(&sell)?;
        let crossed = buy_entry.order.order_type().is_market()
            || sell_entry.order.order_type().is_market()
            || buy_entry.order.price() >= sell_entry.order.price();
        crossed.then_some((buy, sell))
    }

    /// Traded quantity, price, and market flags for a crossing pair.
    fn pair_terms(&self, buy_id: OrderId, sell_id: OrderId) -> Option<(Qty, Price, bool, bool)> {
        let buy = self.orders.get(&buy_id)?;
        let sell = self.orders.get(&sell_id)?;
        let qty = buy.order.quantity().min(sell.order.quantity());
        let buy_market = buy.order.order_type().is_market();
        let sell_market = sell.order.order_type().is_market();
        let price = match (buy_market, sell_market) {
            (true, false) => sell.order.price(),
            (false, true) => buy.order.price(),
            // Both priced: the resting side set the terms.
            _ => {
                if buy.seq <= sell.seq {
                    buy.order.price()
                } else {
                    sell.order.price()
                }
            }
        };
        Some((qty, price, buy_market, sell_market))
    }

    fn is_filled(&self, id: OrderId) -> bool {
        self.orders
            .get(&id)
            .is_some_and(|entry| !entry.order.is_active())
    }

    /// Append an id at the tail of its queue.
    fn enqueue(&mut self, side: Side, order_type: OrderType, price: Price, id: OrderId) {
        if order_type.is_market() {
            match side {
                Side::Buy => self.market_bids.push_back(id),
                Side::Sell => self.market_asks.push_back(id),
            }
            return;
        }
        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        levels.entry(OrderedPrice(price)).or_default().push(id);
    }

    /// Remove an id from its queue, erasing an emptied level.
    fn unlink(&mut self, side: Side, order_type: OrderType, price: Price, id: OrderId) {
        if order_type.is_market() {
            let queue = match side {
                Side::Buy => &mut self.market_bids,
                Side::Sell => &mut self.market_asks,
            };
            if let Some(pos) = queue.iter().position(|&x| x == id) {
                queue.remove(pos);
            }
            return;
        }
        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let key = OrderedPrice(price);
        if let Some(level) = levels.get_mut(&key) {
            level.remove(id);
            if level.is_empty() {
                levels.remove(&key);
            }
        }
    }

    /// Pop the head of a side's current match source (market FIFO or best
    /// level), erasing an emptied level.
    fn pop_best(&mut self, side: Side, market: bool) {
        if market {
            match side {
                Side::Buy => self.market_bids.pop_front(),
                Side::Sell => self.market_asks.pop_front(),
            };
            return;
        }
        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let key = match side {
            Side::Buy => levels.iter().next_back().map(|(key, _)| *key),
            Side::Sell => levels.iter().next().map(|(key, _)| *key),
        };
        if let Some(key) = key {
            if let Some(level) = levels.get_mut(&key) {
                level.pop_front();
                if level.is_empty() {
                    levels.remove(&key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(book: &str, side: Side, price: Price, qty: Qty) -> Order {
        Order::limit(book, side, price, qty).unwrap()
    }

    fn market(book: &str, side: Side, qty: Qty) -> Order {
        Order::market(book, side, qty).unwrap()
    }

    /// Structural checks that must hold after every public operation.
    fn assert_invariants(book: &OrderBook) {
        let bids = book.buy_orders();
        let asks = book.sell_orders();
        assert_eq!(book.len(), bids.len() + asks.len());
        for order in bids.iter().chain(asks.iter()) {
            assert!(order.is_active());
            assert!(order.quantity() > 0);
            assert_eq!(order.symbol(), book.symbol());
        }
    }

    fn submit(book: &mut OrderBook, order: Order) -> (OrderId, Vec<Match>) {
        let id = book.add_order(order).unwrap();
        let fills = book.match_orders();
        assert_invariants(book);
        if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
            assert!(bid.price() < ask.price(), "book must not cross after match");
        }
        (id, fills)
    }

    #[test]
    fn new_book_is_empty() {
        let book = OrderBook::new("AAPL");
        assert_eq!(book.symbol(), "AAPL");
        assert!(book.is_empty());
        assert!(book.best_bid().is_none());
        assert!(book.best_ask().is_none());
    }

    #[test]
    fn add_orders_and_best_prices() {
        let mut book = OrderBook::new("AAPL");
        submit(&mut book, limit("AAPL", Side::Buy, 149.99, 100));
        submit(&mut book, limit("AAPL", Side::Buy, 150.01, 200));
        submit(&mut book, limit("AAPL", Side::Sell, 150.05, 150));
        submit(&mut book, limit("AAPL", Side::Sell, 150.03, 100));

        assert_eq!(book.best_bid().unwrap().price(), 150.01);
        assert_eq!(book.best_ask().unwrap().price(), 150.03);
        assert_eq!(book.len(), 4);
    }

    #[test]
    fn symbol_mismatch_is_rejected() {
        let mut book = OrderBook::new("AAPL");
        let err = book.add_order(limit("MSFT", Side::Buy, 100.0, 10));
        assert!(matches!(err, Err(EngineError::SymbolMismatch { .. })));
        assert!(book.is_empty());
    }

    #[test]
    fn remove_order_round_trip() {
        let mut book = OrderBook::new("AAPL");
        let (id, _) = submit(&mut book, limit("AAPL", Side::Buy, 150.0, 10));

        assert!(book.remove_order(id));
        assert!(book.is_empty());
        assert!(book.best_bid().is_none());
        // Second cancel is a soft no-op
        assert!(!book.remove_order(id));
        assert!(!book.remove_order(99_999_999));
    }

    #[test]
    fn modify_loses_time_priority() {
        let mut book = OrderBook::new("AAPL");
        let (first, _) = submit(&mut book, limit("AAPL", Side::Buy, 150.0, 10));
        let (second, _) = submit(&mut book, limit("AAPL", Side::Buy, 150.0, 20));

        assert!(book.modify_order(first, None, Some(15)).unwrap());
        let ids: Vec<_> = book.buy_orders().iter().map(|o| o.id()).collect();
        assert_eq!(ids, vec![second, first]);
        assert_eq!(book.get_order(first).unwrap().quantity(), 15);
    }

    #[test]
    fn modify_moves_between_levels() {
        let mut book = OrderBook::new("AAPL");
        let (id, _) = submit(&mut book, limit("AAPL", Side::Sell, 151.0, 10));
        submit(&mut book, limit("AAPL", Side::Sell, 150.5, 5));

        assert!(book.modify_order(id, Some(150.0), None).unwrap());
        assert_eq!(book.best_ask().unwrap().id(), id);
        assert_eq!(book.best_ask().unwrap().price(), 150.0);
    }

    #[test]
    fn modify_to_zero_cancels() {
        let mut book = OrderBook::new("AAPL");
        let (id, _) = submit(&mut book, limit("AAPL", Side::Buy, 100.0, 20));

        assert!(book.modify_order(id, None, Some(0)).unwrap());
        assert!(book.is_empty());
        assert!(book.buy_orders().is_empty());
        // Follow-up operations on the id are soft no-ops
        assert!(!book.modify_order(id, Some(101.0), Some(5)).unwrap());
        assert!(!book.remove_order(id));
    }

    #[test]
    fn modify_unknown_is_soft_false() {
        let mut book = OrderBook::new("AAPL");
        assert!(!book.modify_order(42, Some(100.0), Some(10)).unwrap());
    }

    #[test]
    fn modify_rejects_bad_price_and_keeps_order() {
        let mut book = OrderBook::new("AAPL");
        let (id, _) = submit(&mut book, limit("AAPL", Side::Buy, 150.0, 10));

        assert!(book.modify_order(id, Some(0.0), None).is_err());
        let order = book.get_order(id).unwrap();
        assert_eq!(order.price(), 150.0);
        assert_eq!(book.best_bid().unwrap().id(), id);
    }

    #[test]
    fn simple_limit_cross() {
        let mut book = OrderBook::new("AAPL");
        let (buy_id, _) = submit(&mut book, limit("AAPL", Side::Buy, 150.0, 30));
        let (sell_id, fills) = submit(&mut book, limit("AAPL", Side::Sell, 149.5, 25));

        assert_eq!(fills.len(), 1);
        assert_eq!(
            fills[0],
            Match {
                buy_id,
                sell_id,
                price: 150.0,
                qty: 25
            }
        );
        let rest = book.best_bid().unwrap();
        assert_eq!(rest.id(), buy_id);
        assert_eq!(rest.quantity(), 5);
        assert!(book.get_order(sell_id).is_none());
    }

    #[test]
    fn market_against_book() {
        let mut book = OrderBook::new("AAPL");
        let (sell_id, _) = submit(&mut book, limit("AAPL", Side::Sell, 150.0, 40));
        let (buy_id, fills) = submit(&mut book, market("AAPL", Side::Buy, 35));

        assert_eq!(fills.len(), 1);
        assert_eq!(
            fills[0],
            Match {
                buy_id,
                sell_id,
                price: 150.0,
                qty: 35
            }
        );
        assert_eq!(book.best_ask().unwrap().quantity(), 5);
        assert!(book.get_order(buy_id).is_none());
    }

    #[test]
    fn wide_spread_no_trade() {
        let mut book = OrderBook::new("AAPL");
        let (_, fills) = submit(&mut book, limit("AAPL", Side::Buy, 149.0, 100));
        assert!(fills.is_empty());
        let (_, fills) = submit(&mut book, limit("AAPL", Side::Sell, 151.0, 100));
        assert!(fills.is_empty());

        assert_eq!(book.best_bid().unwrap().price(), 149.0);
        assert_eq!(book.best_ask().unwrap().price(), 151.0);
    }

    #[test]
    fn modify_triggers_match_at_resting_price() {
        let mut book = OrderBook::new("AAPL");
        let (buy_id, _) = submit(&mut book, limit("AAPL", Side::Buy, 149.0, 50));
        let (sell_id, _) = submit(&mut book, limit("AAPL", Side::Sell, 151.0, 50));

        assert!(book.modify_order(buy_id, Some(152.0), None).unwrap());
        let fills = book.match_orders();

        // The modified bid lost time priority, so the resting ask sets the
        // price.
        assert_eq!(fills.len(), 1);
        assert_eq!(
            fills[0],
            Match {
                buy_id,
                sell_id,
                price: 151.0,
                qty: 50
            }
        );
        assert!(book.is_empty());
    }

    #[test]
    fn trade_price_follows_resting_side() {
        // Bid rests first: trade at the bid.
        let mut book = OrderBook::new("AAPL");
        submit(&mut book, limit("AAPL", Side::Buy, 150.0, 10));
        let (_, fills) = submit(&mut book, limit("AAPL", Side::Sell, 149.5, 10));
        assert_eq!(fills[0].price, 150.0);

        // Ask rests first: trade at the ask.
        let mut book = OrderBook::new("AAPL");
        submit(&mut book, limit("AAPL", Side::Sell, 149.5, 10));
        let (_, fills) = submit(&mut book, limit("AAPL", Side::Buy, 150.0, 10));
        assert_eq!(fills[0].price, 149.5);
    }

    #[test]
    fn multi_step_sweep() {
        let mut book = OrderBook::new("AAPL");
        let (bid, _) = submit(&mut book, limit("AAPL", Side::Buy, 149.0, 50));
        let (ask, _) = submit(&mut book, limit("AAPL", Side::Sell, 150.5, 30));

        // Crossing sell fills against the resting bid at the bid's price.
        let (_, fills) = submit(&mut book, limit("AAPL", Side::Sell, 148.8, 40));
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].price, 149.0);
        assert_eq!(fills[0].qty, 40);
        assert_eq!(book.get_order(bid).unwrap().quantity(), 10);

        // Market buy sweeps the remaining ask; the residual rests ahead of
        // all limit bids.
        let (mkt, fills) = submit(&mut book, market("AAPL", Side::Buy, 100));
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].price, 150.5);
        assert_eq!(fills[0].qty, 30);
        assert!(book.get_order(ask).is_none());
        assert!(book.best_ask().is_none());

        let bids = book.buy_orders();
        assert_eq!(bids[0].id(), mkt);
        assert_eq!(bids[0].quantity(), 70);
        assert_eq!(bids[0].order_type(), OrderType::Market);
        // A resting market order is not a quotable price.
        assert_eq!(book.best_bid().unwrap().id(), bid);
    }

    #[test]
    fn two_market_orders_do_not_cross() {
        let mut book = OrderBook::new("AAPL");
        let (mkt_buy, fills) = submit(&mut book, market("AAPL", Side::Buy, 10));
        assert!(fills.is_empty());
        let (mkt_sell, fills) = submit(&mut book, market("AAPL", Side::Sell, 10));
        assert!(fills.is_empty());
        assert_eq!(book.len(), 2);

        // Limit liquidity pairs with the market buy, not the market sell.
        let (ask, fills) = submit(&mut book, limit("AAPL", Side::Sell, 150.0, 10));
        assert_eq!(fills.len(), 1);
        assert_eq!(
            fills[0],
            Match {
                buy_id: mkt_buy,
                sell_id: ask,
                price: 150.0,
                qty: 10
            }
        );
        assert!(book.get_order(mkt_sell).is_some());
    }

    #[test]
    fn market_sell_pairs_with_limit_bid_when_both_sides_market() {
        let mut book = OrderBook::new("AAPL");
        let (mkt_buy, _) = submit(&mut book, market("AAPL", Side::Buy, 10));
        let (mkt_sell, _) = submit(&mut book, market("AAPL", Side::Sell, 10));

        let (bid, fills) = submit(&mut book, limit("AAPL", Side::Buy, 150.0, 10));
        assert_eq!(fills.len(), 1);
        assert_eq!(
            fills[0],
            Match {
                buy_id: bid,
                sell_id: mkt_sell,
                price: 150.0,
                qty: 10
            }
        );
        assert!(book.get_order(mkt_buy).is_some());
    }

    #[test]
    fn fifo_priority_within_level() {
        let mut book = OrderBook::new("AAPL");
        let (first, _) = submit(&mut book, limit("AAPL", Side::Sell, 150.0, 10));
        let (second, _) = submit(&mut book, limit("AAPL", Side::Sell, 150.0, 10));
        let (third, _) = submit(&mut book, limit("AAPL", Side::Sell, 150.0, 10));

        let (_, fills) = submit(&mut book, limit("AAPL", Side::Buy, 150.0, 25));
        assert_eq!(fills.len(), 3);
        assert_eq!(fills[0].sell_id, first);
        assert_eq!(fills[1].sell_id, second);
        assert_eq!(fills[2].sell_id, third);
        assert_eq!(fills[2].qty, 5);
        assert_eq!(book.get_order(third).unwrap().quantity(), 5);
    }

    #[test]
    fn sweep_multiple_levels() {
        let mut book = OrderBook::new("AAPL");
        submit(&mut book, limit("AAPL", Side::Sell, 150.0, 10));
        submit(&mut book, limit("AAPL", Side::Sell, 150.5, 10));
        submit(&mut book, limit("AAPL", Side::Sell, 151.0, 10));

        let (_, fills) = submit(&mut book, limit("AAPL", Side::Buy, 150.7, 25));
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].price, 150.0);
        assert_eq!(fills[1].price, 150.5);
        // Unfilled remainder rests as the new best bid.
        assert_eq!(book.best_bid().unwrap().quantity(), 5);
        assert_eq!(book.best_ask().unwrap().price(), 151.0);
    }

    #[test]
    fn stop_order_rests_and_matches_like_limit() {
        let mut book = OrderBook::new("AAPL");
        let stop = Order::new("AAPL", Side::Sell, OrderType::Stop, 150.0, 10).unwrap();
        let (stop_id, fills) = submit(&mut book, stop);
        assert!(fills.is_empty());
        assert_eq!(book.best_ask().unwrap().id(), stop_id);

        let (buy_id, fills) = submit(&mut book, limit("AAPL", Side::Buy, 151.0, 10));
        assert_eq!(fills.len(), 1);
        assert_eq!(
            fills[0],
            Match {
                buy_id,
                sell_id: stop_id,
                price: 150.0,
                qty: 10
            }
        );
    }

    #[test]
    fn best_prices_exclude_resting_market_orders() {
        let mut book = OrderBook::new("AAPL");
        submit(&mut book, market("AAPL", Side::Buy, 10));
        assert!(book.best_bid().is_none());

        let (bid, _) = submit(&mut book, limit("AAPL", Side::Buy, 149.0, 10));
        assert_eq!(book.best_bid().unwrap().id(), bid);
        // The market order still leads the side snapshot.
        assert_eq!(book.buy_orders().len(), 2);
        assert_eq!(book.buy_orders()[0].order_type(), OrderType::Market);
    }

    #[test]
    fn depth_flattens_per_order() {
        let mut book = OrderBook::new("AAPL");
        submit(&mut book, limit("AAPL", Side::Buy, 149.0, 10));
        submit(&mut book, limit("AAPL", Side::Buy, 149.0, 20));
        submit(&mut book, limit("AAPL", Side::Buy, 148.5, 30));
        submit(&mut book, limit("AAPL", Side::Sell, 151.0, 40));

        let depth = book.depth(10);
        assert_eq!(depth.symbol, "AAPL");
        assert_eq!(
            depth.bids,
            vec![
                DepthRow { price: 149.0, qty: 10 },
                DepthRow { price: 149.0, qty: 20 },
                DepthRow { price: 148.5, qty: 30 },
            ]
        );
        assert_eq!(depth.asks, vec![DepthRow { price: 151.0, qty: 40 }]);

        let capped = book.depth(2);
        assert_eq!(capped.bids.len(), 2);
    }

    #[test]
    fn cancel_inside_level_keeps_queue_order() {
        let mut book = OrderBook::new("AAPL");
        let (first, _) = submit(&mut book, limit("AAPL", Side::Buy, 150.0, 10));
        let (second, _) = submit(&mut book, limit("AAPL", Side::Buy, 150.0, 20));
        let (third, _) = submit(&mut book, limit("AAPL", Side::Buy, 150.0, 30));

        assert!(book.remove_order(second));
        let ids: Vec<_> = book.buy_orders().iter().map(|o| o.id()).collect();
        assert_eq!(ids, vec![first, third]);
    }
}
