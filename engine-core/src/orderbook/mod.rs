//! Per-symbol top-N L2 order book.
//!
//! Maintains bid and ask levels from an initial snapshot plus a stream of
//! incremental updates, trimmed to the top `N` levels per side. A book that
//! crosses after an update is marked stale rather than published downstream;
//! `MarketDataHub` (see `crate::data`) is responsible for requesting a resync.

pub mod book;

pub use book::{OrderBook, DEFAULT_DEPTH};
