// Per-dataset chart state: the loader owns what is shown, the filter
// controller feeds it re-computed distributions over a channel.
pub mod filters;
pub mod loader;

#[cfg(test)]
mod fixtures;

use tokio::sync::mpsc;

use crate::domain::ChartRecord;

pub use filters::{overlay_distribution, FilterController, FilterOutcome};
pub use loader::{ChartDataLoader, LoadOutcome, LoaderSnapshot};

/// Receiving end for summary charts published by a [`FilterController`].
pub type SummaryUpdates = mpsc::UnboundedReceiver<ChartRecord>;
