use anyhow::{Context, Result, bail};
use std::time::Instant;
use tokio::signal;

use lib_board::ingestors::{FeedHandle, PollAdapter, PushAdapter};
use lib_board::storage::JsonFileStore;
use lib_board::{BoardView, FavoritesStore, FilterState};

mod config;
mod logger;
mod render;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = config::load_config().resolve()?;
    logger::setup_logging(&settings.logging)?;

    let store = JsonFileStore::new(&settings.storage.path);
    let mut favorites = FavoritesStore::open(store)
        .with_context(|| format!("opening favorites at {}", settings.storage.path.display()))?;
    if let Some(symbol) = &settings.toggle_favorite {
        let now_favorite = favorites.toggle(symbol)?;
        log::info!("{} is {} a favorite", symbol, if now_favorite { "now" } else { "no longer" });
    }

    let push = settings.push.clone().map(|cfg| PushAdapter::new(cfg).spawn());
    let poll = settings.poll.clone().map(|cfg| PollAdapter::new(cfg).spawn());
    if push.is_none() && poll.is_none() {
        bail!("No feed configured: set --push-url and/or --poll-url");
    }

    let mut board = BoardView::new(settings.board.clone(), settings.sectors.clone());
    board.set_viewport_width(settings.viewport_width);
    log::info!("Board layout: {:?}", board.layout());

    // The board resets its filters when the first data arrives, so the
    // configured filters go in right after that.
    let mut configured_filters_applied = settings.filters.is_default();

    let mut ticker = tokio::time::interval(settings.refresh_interval);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                let push_state = push.as_ref().map(FeedHandle::state).unwrap_or_default();
                let poll_state = poll.as_ref().map(FeedHandle::state).unwrap_or_default();

                let mut frame = board.refresh(&push_state, &poll_state, favorites.get(), Instant::now());
                if !frame.empty && !configured_filters_applied {
                    apply_filters(&mut board, &settings.filters);
                    configured_filters_applied = true;
                    frame = board.refresh(&push_state, &poll_state, favorites.get(), Instant::now());
                }
                render::log_frame(&frame, &settings.listings, &settings.links);
            }
        }
    }

    // Cancel both feeds and wait for their tasks before exiting.
    for handle in [push, poll].into_iter().flatten() {
        handle.shutdown().await;
    }

    log::info!("Shutdown complete.");
    Ok(())
}

fn apply_filters(board: &mut BoardView, filters: &FilterState) {
    board.set_sort(filters.sort);
    board.set_favorites_only(filters.favorites_only);
    board.set_sector(filters.sector.clone());
    board.set_price_range(filters.price_range);
    board.submit_search(&filters.search);
}

async fn shutdown_signal() {
    tokio::select! {
        _ = signal::ctrl_c() => {
            log::info!("Ctrl-C received, initiating shutdown.");
        }
        _ = async {
            #[cfg(unix)]
            {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut term_signal) => {
                        term_signal.recv().await;
                        log::info!("SIGTERM received, initiating shutdown.");
                    }
                    Err(e) => {
                        log::warn!("Could not install SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
            #[cfg(not(unix))]
            {
                // On non-unix platforms, just wait forever.
                std::future::pending::<()>().await;
            }
        } => {}
    }
}
