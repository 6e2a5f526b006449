//! FIX 4.4 client driving a quote and a trade channel
//!
//! This example shows the host-side loop around the two channels:
//! - Both channels connect over TLS and log on at startup
//! - Prices are polled every 200ms on the quote channel
//! - Every 100th tick sends a heartbeat on both channels and prints the
//!   message logs collected since the last one
//! - An optional market order is placed once after logon
//! - Ctrl-C logs both channels out
//!
//! Configure it with `FIX_HOST`, `FIX_SENDER_COMP_ID`, `FIX_USERNAME`,
//! `FIX_PASSWORD`, `FIX_SYMBOL_ID`, `FIX_VOLUME` and `FIX_SIDE`.

use std::time::Duration;

use anyhow::{Result, bail};
use fixlink::prelude::*;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

mod common;
use common::{ExampleConfig, init_logging};

const PRICE_POLL_INTERVAL: Duration = Duration::from_millis(200);
const HEARTBEAT_EVERY_TICKS: u64 = 100;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cfg = ExampleConfig::from_env()?;
    let session_config = cfg.session_config()?;

    let mut quotes: QuoteChannel = QuoteChannel::new(session_config.clone());
    let mut trades: TradeChannel = TradeChannel::new(session_config);

    quotes.connect().await?;
    trades.connect().await?;
    if !quotes.logon().await? {
        print_log("quote", quotes.log());
        bail!("quote channel logon refused");
    }
    if !trades.logon().await? {
        print_log("trade", trades.log());
        quotes.logout().await?;
        bail!("trade channel logon refused");
    }
    info!(host = %cfg.host, symbol_id = cfg.symbol_id, "both channels logged on");

    if let Some(volume) = cfg.volume {
        let order = trades
            .place_market_order(cfg.side, cfg.symbol_id, volume)
            .await?;
        info!(
            cl_ord_id = %order.cl_ord_id,
            response = %display_message(&order.response),
            "order placed"
        );
    }

    let mut ticker = interval(PRICE_POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick: u64 = 0;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutting down");
                break;
            }
            _ = ticker.tick() => {
                tick += 1;
                match quotes.request_prices(cfg.symbol_id).await {
                    Ok(Some(book)) => info!(bid = book.bid, ask = book.ask, "prices"),
                    Ok(None) => warn!("no price update"),
                    Err(err) if err.is_fatal() => return Err(err.into()),
                    Err(err) => warn!(error = %err, "price request failed"),
                }
                if tick % HEARTBEAT_EVERY_TICKS == 0 {
                    quotes.heartbeat().await?;
                    trades.heartbeat().await?;
                    print_log("quote", &quotes.take_log());
                    print_log("trade", &trades.take_log());
                }
            }
        }
    }

    quotes.logout().await?;
    trades.logout().await?;
    print_log("quote", quotes.log());
    print_log("trade", trades.log());
    Ok(())
}

fn print_log(channel: &str, log: &MessageLog) {
    for entry in log.entries() {
        println!("[{channel}] {}", entry.render());
    }
}
