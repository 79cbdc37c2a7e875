//! Engine supervisor: startup wiring, graceful shutdown, persistence handoff.

use crate::config::{AdapterKind, Config, VenueConfig};
use crate::error::EngineError;
use crate::hub::Hub;
use crate::persist;
use crate::strategy::{Strategy, StrategyParams};
use basis_data::exchange::bitfinex::{BitfinexBookFeed, BitfinexBookFeedConfig};
use basis_data::exchange::okcoin::{OkCoinBookFeed, OkCoinBookFeedConfig};
use basis_data::fx::{FxProvider, FxProviderConfig};
use basis_data::shutdown::{self, Shutdown};
use basis_execution::client::bitfinex::{BitfinexExecution, BitfinexExecutionConfig};
use basis_execution::client::okcoin::{OkCoinExecution, OkCoinExecutionConfig};
use basis_execution::{ExecutionClient, VenueHandle};
use basis_instrument::{Book, VenueId};
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Run the engine to completion: returns after a graceful shutdown with the
/// final state persisted, or with a startup error.
pub async fn run(config: Config) -> Result<(), EngineError> {
    let (shutdown_handle, shutdown) = shutdown::channel();

    // Build venue handles and log their parameters.
    let venues: Vec<Arc<VenueHandle>> = config
        .venues
        .iter()
        .map(|venue_cfg| {
            let spec = venue_cfg.venue_spec(&config.engine.symbol);
            let client = build_execution_client(venue_cfg, &config.engine.symbol);
            Arc::new(VenueHandle::new(spec, client))
        })
        .collect();
    for venue in &venues {
        info!(
            venue = %venue,
            priority = venue.spec().priority,
            fee = venue.spec().fee,
            "venue attached"
        );
    }

    // Recover positions and P&L from the previous run.
    let mut initial_pl = 0.0;
    if let Some(state) = persist::load(&config.engine.status_file, venues.len())? {
        for (venue, position) in venues.iter().zip(&state.positions) {
            venue.set_position(*position);
        }
        initial_pl = state.pl;
        info!(positions = ?state.positions, pl = state.pl, "loaded persisted state");
    }

    // Channels: book/FX fan-in, capacity-1 snapshot publication, diagnostics.
    let (book_tx, book_rx) = mpsc::channel(64);
    let (fx_tx, fx_rx) = mpsc::channel(16);
    let (query_tx, query_rx) = mpsc::channel(4);
    let (snapshot_tx, snapshot_rx) = mpsc::channel(1);

    // Seed the hub: every venue must deliver an initial book, and every
    // foreign currency an initial quote. Anything less is fatal.
    let mut hub = Hub::new(
        venues.iter().map(|v| v.spec().clone()),
        config.order_limits(),
    );
    for venue_cfg in &config.venues {
        let initial = start_book_feed(
            venue_cfg,
            &config.engine.symbol,
            book_tx.clone(),
            shutdown.clone(),
        )
        .await;
        if let Some(reason) = &initial.error {
            return Err(EngineError::VenueStartup {
                venue: venue_cfg.id.clone(),
                reason: reason.clone(),
            });
        }
        hub.on_book(initial);
    }

    let fx_provider = FxProvider::new(FxProviderConfig::default(), shutdown.clone());
    for currency in config.foreign_currencies() {
        let initial = fx_provider.communicate_fx(currency.clone(), fx_tx.clone()).await;
        if let Some(reason) = &initial.error {
            return Err(EngineError::FxStartup {
                currency: currency.to_string(),
                reason: reason.clone(),
            });
        }
        hub.on_fx(initial);
    }

    // Spawn the hub loop and the strategy.
    let hub_task = tokio::spawn(hub.run(book_rx, fx_rx, query_rx, snapshot_tx, shutdown.clone()));

    let params = StrategyParams {
        max_arb: config.engine.max_arb,
        min_arb: config.engine.min_arb,
        fx_premium: config.engine.fx_premium,
        min_net_pos: config.engine.min_net_pos,
        min_order: config.engine.min_order,
        max_order: config.engine.max_order,
        print_on: config.engine.print_on,
    };
    let strategy = Strategy::new(venues.clone(), params, initial_pl);
    let strategy_task = tokio::spawn(strategy.run(snapshot_rx));

    info!(symbol = %config.engine.symbol, venues = venues.len(), "engine running");

    // Block until the operator asks to stop.
    wait_for_stop_request().await;
    info!("shutdown requested");
    shutdown_handle.shutdown();

    // The hub exits and closes the snapshot channel; the strategy then
    // finishes its current snapshot and returns the final state.
    if let Err(join_error) = hub_task.await {
        error!(%join_error, "hub task panicked");
    }
    let final_state = strategy_task
        .await
        .map_err(|e| EngineError::Persistence(format!("strategy task failed: {e}")))?;

    // The fan-in senders outlive the hub on purpose; release them now.
    drop(book_tx);
    drop(fx_tx);
    drop(query_tx);

    let positions: Vec<f64> = venues.iter().map(|v| v.position()).collect();
    persist::save(&config.engine.status_file, &positions, final_state.pl)?;
    info!(?positions, pl = final_state.pl, "state persisted, ending run");
    Ok(())
}

/// Resolve once the operator requests shutdown: any non-empty stdin line, or
/// Ctrl-C.
async fn wait_for_stop_request() {
    let stdin_line = async {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if !line.trim().is_empty() => return,
                Ok(Some(_)) => continue,
                // stdin closed (detached run): only the signal can stop us.
                Ok(None) | Err(_) => std::future::pending::<()>().await,
            }
        }
    };
    tokio::select! {
        _ = stdin_line => {}
        _ = tokio::signal::ctrl_c() => {}
    }
}

fn build_execution_client(venue_cfg: &VenueConfig, symbol: &str) -> Arc<dyn ExecutionClient> {
    let (api_key, api_secret) = venue_cfg.credentials();
    match venue_cfg.adapter {
        AdapterKind::OkCoin => Arc::new(OkCoinExecution::new(OkCoinExecutionConfig {
            api_key,
            api_secret,
            symbol: symbol.into(),
            currency: venue_cfg.currency.clone(),
            rest_url: OkCoinExecutionConfig::default_rest_url(&venue_cfg.currency).into(),
        })),
        AdapterKind::Bitfinex => Arc::new(BitfinexExecution::new(BitfinexExecutionConfig {
            api_key,
            api_secret,
            symbol: symbol.into(),
            currency: venue_cfg.currency.clone(),
            base_url: None,
        })),
    }
}

async fn start_book_feed(
    venue_cfg: &VenueConfig,
    symbol: &str,
    book_tx: mpsc::Sender<Book>,
    shutdown: Shutdown,
) -> Book {
    let venue = VenueId::from(venue_cfg.id.as_str());
    match venue_cfg.adapter {
        AdapterKind::OkCoin => {
            let feed = OkCoinBookFeed::new(
                OkCoinBookFeedConfig {
                    venue,
                    symbol: symbol.into(),
                    currency: venue_cfg.currency.clone(),
                    ws_url: None,
                },
                shutdown,
            );
            feed.communicate_book(book_tx).await
        }
        AdapterKind::Bitfinex => {
            let feed = BitfinexBookFeed::new(
                BitfinexBookFeedConfig {
                    venue,
                    symbol: symbol.into(),
                    currency: venue_cfg.currency.clone(),
                    base_url: None,
                },
                shutdown,
            );
            feed.communicate_book(book_tx).await
        }
    }
}
