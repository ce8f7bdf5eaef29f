// src/engine/runner.rs - Engine Runner
//! Single-writer serialization boundary.
//!
//! Producers push [`Command`] values from any thread; one worker thread
//! drains them in FIFO order, drives the [`ExecutionEngine`], and publishes
//! [`MarketEvent`] values to an outbound queue that consumers poll.
//!
//! ## Ordering guarantees
//!
//! - Commands are applied in the order they were enqueued.
//! - Trade events of a command are enqueued before that command's
//!   top-of-book event, because the trade sink runs synchronously inside
//!   `submit`/`modify`.
//! - The top-of-book event for a command reflects the book after the command
//!   and every match it triggered.
//! - A consumer that polls an event is guaranteed the producing command has
//!   fully completed.
//!
//! Lock order: the trade sink and the top-of-book publication take the
//! queue mutex after the engine has released the matched book's mutex, and
//! no path holds the queue mutex while acquiring a book mutex, so the order
//! is acyclic.
//!
//! A command that faults in the engine (for example a risk-gate reject fed
//! in through the queue) is logged and dropped; it does not take the worker
//! down.

use crate::core::events::{Command, MarketEvent, Trade};
use crate::engine::{EngineConfig, ExecutionEngine, TradeSink};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, info, warn};

/// Queues shared between producers, the worker, and consumers.
#[derive(Default)]
struct RunnerQueues {
    inbound: VecDeque<Command>,
    outbound: VecDeque<MarketEvent>,
}

/// State shared with the worker thread and the trade sink.
struct Shared {
    queues: Mutex<RunnerQueues>,
    available: Condvar,
    running: AtomicBool,
}

/// Trade sink that republishes executions on the outbound queue.
struct QueueSink {
    shared: Arc<Shared>,
}

impl TradeSink for QueueSink {
    fn on_trade(&self, trade: &Trade) {
        self.shared
            .queues
            .lock()
            .outbound
            .push_back(MarketEvent::Trade(trade.clone()));
    }
}

/// Serializes concurrent command streams into one worker and publishes the
/// resulting event stream.
///
/// Construction starts the worker; dropping the runner stops it and joins.
pub struct EngineRunner {
    engine: Arc<ExecutionEngine>,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl EngineRunner {
    /// Start a runner over an engine with default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Start a runner over an engine with the given configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        let engine = Arc::new(ExecutionEngine::with_config(config));
        let shared = Arc::new(Shared {
            queues: Mutex::new(RunnerQueues::default()),
            available: Condvar::new(),
            running: AtomicBool::new(true),
        });
        engine.set_trade_sink(Box::new(QueueSink {
            shared: Arc::clone(&shared),
        }));

        let worker = {
            let engine = Arc::clone(&engine);
            let shared = Arc::clone(&shared);
            thread::spawn(move || worker_loop(&engine, &shared))
        };
        info!("engine runner started");

        Self {
            engine,
            shared,
            worker: Some(worker),
        }
    }

    /// The underlying engine, for read-only queries such as depth snapshots.
    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    /// Enqueue a command without blocking.
    ///
    /// Returns `false` once the runner has been stopped; the command is
    /// dropped rather than queued behind a worker that will never run again.
    pub fn push(&self, command: Command) -> bool {
        if !self.shared.running.load(Ordering::Acquire) {
            warn!("command rejected: runner is stopped");
            return false;
        }
        self.shared.queues.lock().inbound.push_back(command);
        self.shared.available.notify_one();
        true
    }

    /// Dequeue the next pending event without blocking.
    ///
    /// Events already published remain pollable after `stop`.
    pub fn poll(&self) -> Option<MarketEvent> {
        self.shared.queues.lock().outbound.pop_front()
    }

    /// Signal shutdown. Idempotent.
    ///
    /// Commands still in the inbound queue are abandoned.
    pub fn stop(&self) {
        if self.shared.running.swap(false, Ordering::AcqRel) {
            info!("engine runner stopping");
        }
        self.shared.available.notify_all();
    }
}

impl Default for EngineRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EngineRunner {
    fn drop(&mut self) {
        self.stop();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn worker_loop(engine: &ExecutionEngine, shared: &Shared) {
    loop {
        let command = {
            let mut queues = shared.queues.lock();
            loop {
                if !shared.running.load(Ordering::Acquire) {
                    return;
                }
                if let Some(command) = queues.inbound.pop_front() {
                    break command;
                }
                shared.available.wait(&mut queues);
            }
        };

        // Only order entry names a symbol directly; cancels and modifies are
        // routed by id and do not produce a top-of-book event.
        let symbol = match &command {
            Command::NewOrder(order) => Some(order.symbol().to_string()),
            Command::Cancel(_) | Command::Modify { .. } => None,
        };

        match command {
            Command::NewOrder(order) => {
                let id = order.id();
                if let Err(e) = engine.submit(order) {
                    error!("submit of order {} failed: {}", id, e);
                }
            }
            Command::Cancel(id) => {
                engine.cancel(id);
            }
            Command::Modify { id, price, qty } => {
                if let Err(e) = engine.modify(id, price, qty) {
                    error!("modify of order {} failed: {}", id, e);
                }
            }
        }

        if let Some(symbol) = symbol {
            if let Some(top) = engine.top_of_book(&symbol) {
                shared
                    .queues
                    .lock()
                    .outbound
                    .push_back(MarketEvent::TopOfBook(top));
            }
        }
    }
}
