// src/main.rs - Matchbook Demonstration Driver
//! Scripted demonstration of the matching engine: seeds a book, crosses the
//! spread, sweeps with a market order, and prints the resulting event stream.

use anyhow::Result;
use clap::Parser;
use matchbook::constants::DEFAULT_DEPTH_LEVELS;
use matchbook::{Command, EngineRunner, MarketEvent, Order, Side};
use std::thread;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "matchbook", version, about = "Single-venue matching engine demo")]
struct Args {
    /// Symbol for the scripted session
    #[arg(long, default_value = "AAPL")]
    symbol: String,

    /// Number of seed orders per side
    #[arg(long, default_value_t = 4)]
    ladder: usize,

    /// Print events as JSON lines instead of readable text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let runner = EngineRunner::new();

    info!("seeding {} with {} orders per side", args.symbol, args.ladder);
    for i in 0..args.ladder {
        let step = i as f64 * 0.5;
        let qty = 10 * (i as u64 + 1);
        runner.push(Command::NewOrder(Order::limit(
            &args.symbol,
            Side::Buy,
            149.0 - step,
            qty,
        )?));
        runner.push(Command::NewOrder(Order::limit(
            &args.symbol,
            Side::Sell,
            151.0 + step,
            qty,
        )?));
    }

    // Cross the spread with an aggressive sell, then sweep the ask side
    // with a market buy.
    runner.push(Command::NewOrder(Order::limit(
        &args.symbol,
        Side::Sell,
        148.5,
        25,
    )?));
    runner.push(Command::NewOrder(Order::market(&args.symbol, Side::Buy, 40)?));

    drain(&runner, args.json)?;

    if let Some(depth) = runner.engine().depth(&args.symbol, DEFAULT_DEPTH_LEVELS) {
        println!("final depth: {}", serde_json::to_string_pretty(&depth)?);
    }

    runner.stop();
    Ok(())
}

/// Poll the runner until the event stream goes quiet.
fn drain(runner: &EngineRunner, json: bool) -> Result<()> {
    let mut idle = 0u32;
    while idle < 50 {
        match runner.poll() {
            Some(event) => {
                idle = 0;
                print_event(&event, json)?;
            }
            None => {
                idle += 1;
                thread::sleep(Duration::from_millis(2));
            }
        }
    }
    Ok(())
}

fn print_event(event: &MarketEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    match event {
        MarketEvent::Trade(trade) => println!(
            "TRADE {} {} @ {} (buy {} / sell {})",
            trade.symbol, trade.qty, trade.price, trade.buy_id, trade.sell_id
        ),
        MarketEvent::TopOfBook(top) => println!(
            "TOB   {} bid {} x {} | ask {} x {}",
            top.symbol, top.bid_price, top.bid_qty, top.ask_price, top.ask_qty
        ),
    }
    Ok(())
}
