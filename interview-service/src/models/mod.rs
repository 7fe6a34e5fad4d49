//! Domain models for the interview service.
//!
//! Nothing here outlives a single call: a [`Submission`] arrives, an
//! [`Evaluation`] leaves.

pub mod evaluation;
pub mod submission;

pub use evaluation::{Difficulty, Evaluation};
pub use submission::{HistoryTurn, Submission};
