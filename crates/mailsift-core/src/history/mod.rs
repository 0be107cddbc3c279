//! Append-only record of every classification decision.

mod model;
mod repository;

pub use model::HistoryRecord;
pub use repository::HistoryRepository;
