//! Data Models
//!
//! This module contains the core data structures of the completion tracker:
//!
//! - `Milestone` / `MilestoneNode` - per-entry progress trees
//! - `Entry` / `Franchise` - the collections that own those trees
//! - Completion result shapes shared by the aggregator and query facade
//! - [`hierarchy`] - parent-pointer walks used by services and the store

mod completion;
mod entry;
pub mod hierarchy;
mod milestone;

pub use completion::{
    Completion, EntryCompletion, FranchiseCompletion, MilestoneCompletion, RecomputeRequest,
    RecomputeResult,
};
pub use entry::{
    normalize_accent, normalize_name, Entry, EntryUpdate, Franchise, FranchiseUpdate, MediaType,
    UserPreferences,
};
pub use milestone::{
    normalize_title, Milestone, MilestoneNode, MilestoneType, MilestoneUpdate, Progress,
    ValidationError,
};
