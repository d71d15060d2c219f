//! Background task that polls the Soroban RPC and writes decoded crowdfund
//! events to the database.
//!
//! Progress is the pair `(ledger, cursor)`. A cursor continues pagination
//! where the last page stopped; without one the next request starts from
//! the last ledger seen. Both are persisted after every page so a restart
//! resumes without re-reading history (re-reading would be harmless anyway,
//! inserts are idempotent).

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Config;
use crate::db;
use crate::errors::{IndexerError, Result};
use crate::rpc::{self, EventPage};

pub struct IndexerState {
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
}

/// Where the next `getEvents` request starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub ledger: u32,
    pub cursor: Option<String>,
}

impl Position {
    /// Resume point after `page` was fetched from `self`.
    ///
    /// The ledger never moves backwards. When the page came back empty the
    /// old cursor is kept, since some RPCs omit it on an empty page.
    pub fn advance(&self, page: &EventPage) -> Position {
        let ledger = page
            .latest_ledger
            .and_then(|l| u32::try_from(l).ok())
            .map(|l| l.max(self.ledger))
            .unwrap_or(self.ledger);
        let cursor = page.cursor.clone().or_else(|| {
            if page.events.is_empty() {
                self.cursor.clone()
            } else {
                None
            }
        });
        Position { ledger, cursor }
    }
}

/// Run the indexer loop until `shutdown` is cancelled.
pub async fn run(state: Arc<IndexerState>, shutdown: CancellationToken) {
    info!("Indexer starting, contract: {}", state.config.contract_id);

    let mut position = match load_position(&state.pool, state.config.start_ledger).await {
        Ok(position) => position,
        Err(e) => {
            error!("Could not read indexer cursor, starting from config: {e}");
            Position {
                ledger: state.config.start_ledger,
                cursor: None,
            }
        }
    };
    info!("Resuming from ledger {}", position.ledger);

    loop {
        match poll_once(&state, &position, &shutdown).await {
            Ok(next) => position = next,
            Err(IndexerError::Shutdown) => break,
            Err(e) => error!("Indexer poll error: {e}"),
        }

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(state.config.poll_interval_secs)) => {}
            _ = shutdown.cancelled() => break,
        }
    }

    info!("Indexer stopped at ledger {}", position.ledger);
}

async fn load_position(pool: &SqlitePool, start_ledger: u32) -> Result<Position> {
    let last_ledger = db::get_last_ledger(pool).await?;
    let cursor = db::get_cursor_string(pool).await?;
    let ledger = match u32::try_from(last_ledger) {
        Ok(l) if l > 0 => l,
        _ => start_ledger,
    };
    Ok(Position { ledger, cursor })
}

/// Fetch, decode and store one page, then persist the new position.
async fn poll_once(
    state: &IndexerState,
    position: &Position,
    shutdown: &CancellationToken,
) -> Result<Position> {
    let config = &state.config;
    let page = rpc::fetch_events(
        &state.client,
        &config.rpc_url,
        &config.contract_id,
        position.ledger,
        position.cursor.as_deref(),
        config.events_per_page,
        shutdown,
    )
    .await?;

    if !page.events.is_empty() {
        let decoded = rpc::decode_events(&page.events, &config.contract_id);
        let inserted = db::insert_events(&state.pool, &decoded).await?;
        info!(
            "Polled {} raw events, {} new records stored",
            page.events.len(),
            inserted
        );
    }

    let next = position.advance(&page);
    db::save_cursor(&state.pool, i64::from(next.ledger), next.cursor.as_deref()).await?;
    Ok(next)
}
