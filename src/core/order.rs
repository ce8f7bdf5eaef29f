// src/core/order.rs - Order Entity
//! The order entity: immutable identity plus the mutable residual state of
//! one working order.
//!
//! # Order Lifecycle
//!
//! ```text
//! Resting ──modify──► Resting (time priority lost)
//!    │
//!    ├──fill to zero──► Filled    (active = false, qty = 0)
//!    └──cancel───────► Cancelled  (active = false, qty = 0)
//! ```
//!
//! Identity is assigned at construction from a process-wide counter and is
//! never reused.

use crate::core::types::{OrderId, OrderType, Price, Qty, Side, Symbol, Timestamp};
use crate::{EngineError, EngineResult};
use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ORDER_ID: AtomicU64 = AtomicU64::new(0);

fn next_order_id() -> OrderId {
    NEXT_ORDER_ID.fetch_add(1, Ordering::Relaxed)
}

/// One working order.
///
/// Symbol, side, and type are fixed at construction; price and residual
/// quantity are amended through [`Order::modify`] and reduced by fills.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    id: OrderId,
    symbol: Symbol,
    side: Side,
    order_type: OrderType,
    price: Price,
    quantity: Qty,
    active: bool,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Order {
    /// Create a new order.
    ///
    /// Fails when the symbol is empty, the quantity is zero, or the price is
    /// not strictly positive for a non-market order. Market orders ignore the
    /// supplied price and carry the conventional zero.
    pub fn new(
        symbol: impl Into<Symbol>,
        side: Side,
        order_type: OrderType,
        price: Price,
        quantity: Qty,
    ) -> EngineResult<Self> {
        let symbol = symbol.into();
        if symbol.is_empty() {
            return Err(EngineError::InvalidOrder("symbol must not be empty".into()));
        }
        if quantity == 0 {
            return Err(EngineError::InvalidOrder("quantity must be positive".into()));
        }
        if order_type.requires_price() && (price <= 0.0 || !price.is_finite()) {
            return Err(EngineError::InvalidOrder(
                "price must be positive for non-market orders".into(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: next_order_id(),
            symbol,
            side,
            order_type,
            price: if order_type.is_market() { 0.0 } else { price },
            quantity,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Shorthand for a limit order.
    pub fn limit(symbol: impl Into<Symbol>, side: Side, price: Price, qty: Qty) -> EngineResult<Self> {
        Self::new(symbol, side, OrderType::Limit, price, qty)
    }

    /// Shorthand for a market order.
    pub fn market(symbol: impl Into<Symbol>, side: Side, qty: Qty) -> EngineResult<Self> {
        Self::new(symbol, side, OrderType::Market, 0.0, qty)
    }

    /// Process-wide unique order id.
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Trading symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Order side.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Order type.
    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    /// Current price. Zero by convention for market orders.
    pub fn price(&self) -> Price {
        self.price
    }

    /// Residual (unfilled) quantity.
    pub fn quantity(&self) -> Qty {
        self.quantity
    }

    /// Whether the order is still working. Inactive orders carry zero
    /// residual quantity.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Timestamp of the last amendment or fill.
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Amend price and residual quantity.
    ///
    /// Faults on an inactive order or an invalid price; a zero quantity
    /// deactivates the order. Market orders keep their conventional zero
    /// price regardless of the value supplied.
    pub fn modify(&mut self, new_price: Price, new_quantity: Qty) -> EngineResult<()> {
        if !self.active {
            return Err(EngineError::InactiveOrder(self.id));
        }
        if self.order_type.requires_price() && (new_price <= 0.0 || !new_price.is_finite()) {
            return Err(EngineError::InvalidOrder(
                "price must be positive for non-market orders".into(),
            ));
        }

        if !self.order_type.is_market() {
            self.price = new_price;
        }
        self.quantity = new_quantity;
        if self.quantity == 0 {
            self.active = false;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Reduce the residual quantity by a fill.
    ///
    /// Faults on a zero fill or a fill larger than the residual. Reaching
    /// zero deactivates the order.
    pub fn reduce_quantity(&mut self, traded: Qty) -> EngineResult<()> {
        if traded == 0 {
            return Err(EngineError::InvalidOrder("traded qty must be positive".into()));
        }
        if traded > self.quantity {
            return Err(EngineError::InvalidOrder(
                "traded qty exceeds resting qty".into(),
            ));
        }
        self.fill(traded);
        Ok(())
    }

    /// Internal fill path used by the matching loop, which has already
    /// bounded the traded quantity by both residuals.
    pub(crate) fn fill(&mut self, traded: Qty) {
        debug_assert!(traded > 0 && traded <= self.quantity);
        self.quantity = self.quantity.saturating_sub(traded);
        if self.quantity == 0 {
            self.active = false;
        }
        self.updated_at = Utc::now();
    }

    /// Cancel the order: residual drops to zero and it goes inactive.
    pub fn cancel(&mut self) {
        self.quantity = 0;
        self.active = false;
        self.updated_at = Utc::now();
    }
}

/// Builder for orders, used by the demo driver and tests.
#[derive(Debug, Clone, Default)]
pub struct OrderBuilder {
    symbol: Option<Symbol>,
    side: Option<Side>,
    order_type: Option<OrderType>,
    price: Price,
    quantity: Qty,
}

impl OrderBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the symbol.
    pub fn symbol(mut self, symbol: impl Into<Symbol>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Set the side.
    pub fn side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    /// Shorthand for the buy side.
    pub fn buy(self) -> Self {
        self.side(Side::Buy)
    }

    /// Shorthand for the sell side.
    pub fn sell(self) -> Self {
        self.side(Side::Sell)
    }

    /// Make this a limit order at the given price.
    pub fn limit_price(mut self, price: Price) -> Self {
        self.order_type = Some(OrderType::Limit);
        self.price = price;
        self
    }

    /// Make this a stop order at the given price.
    pub fn stop_price(mut self, price: Price) -> Self {
        self.order_type = Some(OrderType::Stop);
        self.price = price;
        self
    }

    /// Make this a market order.
    pub fn market(mut self) -> Self {
        self.order_type = Some(OrderType::Market);
        self.price = 0.0;
        self
    }

    /// Set the quantity.
    pub fn quantity(mut self, qty: Qty) -> Self {
        self.quantity = qty;
        self
    }

    /// Build the order, running full construction validation.
    pub fn build(self) -> EngineResult<Order> {
        let symbol = self
            .symbol
            .ok_or_else(|| EngineError::InvalidOrder("symbol is required".into()))?;
        let side = self
            .side
            .ok_or_else(|| EngineError::InvalidOrder("side is required".into()))?;
        let order_type = self.order_type.unwrap_or(OrderType::Limit);
        Order::new(symbol, side, order_type, self.price, self.quantity)
    }
}
