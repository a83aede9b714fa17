//! Completion Query Facade
//!
//! Read-only queries that load fresh trees through the [`TreeLoader`] and run
//! the pure [`aggregator`] over them. Nothing is cached between calls, so the
//! numbers always reflect the store at the time of the call.

use crate::db::RecordStore;
use crate::models::{
    Entry, EntryCompletion, FranchiseCompletion, MilestoneCompletion, RecomputeRequest,
    RecomputeResult,
};
use crate::services::aggregator;
use crate::services::error::ServiceError;
use crate::services::tree_loader::TreeLoader;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct CompletionService {
    store: Arc<dyn RecordStore>,
    loader: TreeLoader,
}

impl CompletionService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            loader: TreeLoader::new(store.clone()),
            store,
        }
    }

    async fn require_entry(&self, entry_id: &str) -> Result<Entry, ServiceError> {
        self.store
            .get_entry(entry_id)
            .await?
            .ok_or_else(|| ServiceError::entry_not_found(entry_id))
    }

    /// Rollup for an entry already in hand
    pub(crate) async fn completion_of(&self, entry: &Entry) -> Result<EntryCompletion, ServiceError> {
        self.rollup_entry(entry, None).await
    }

    /// Loads the forest of `entry` and rolls it up, appending every node's
    /// completion to `breakdown` when one is given
    async fn rollup_entry(
        &self,
        entry: &Entry,
        breakdown: Option<&mut Vec<MilestoneCompletion>>,
    ) -> Result<EntryCompletion, ServiceError> {
        let forest = self.loader.load(&entry.id).await?;
        let rollup = match breakdown {
            Some(out) => aggregator::entry_completion_with_breakdown(&forest, out),
            None => aggregator::entry_completion(&forest),
        };
        Ok(EntryCompletion::from_completion(&entry.id, rollup))
    }

    /// Entry rollup across its roots
    #[instrument(skip(self))]
    pub async fn entry_completion(&self, entry_id: &str) -> Result<EntryCompletion, ServiceError> {
        let entry = self.require_entry(entry_id).await?;
        self.completion_of(&entry).await
    }

    /// Mean of qualifying entry percents within a franchise
    #[instrument(skip(self))]
    pub async fn franchise_completion(
        &self,
        franchise_id: &str,
        include_optional_entries: bool,
    ) -> Result<FranchiseCompletion, ServiceError> {
        if self.store.get_franchise(franchise_id).await?.is_none() {
            return Err(ServiceError::franchise_not_found(franchise_id));
        }
        let entries = self.store.list_entries(franchise_id).await?;
        let (_, franchise) = self
            .rollup_entries(franchise_id, &entries, include_optional_entries, None)
            .await?;
        Ok(franchise)
    }

    /// Per-entry completions plus the franchise rollup for `entries`
    ///
    /// With `breakdown`, node completions of every entry are appended in
    /// entry order.
    pub(crate) async fn rollup_entries(
        &self,
        franchise_id: &str,
        entries: &[Entry],
        include_optional_entries: bool,
        mut breakdown: Option<&mut Vec<MilestoneCompletion>>,
    ) -> Result<(Vec<EntryCompletion>, FranchiseCompletion), ServiceError> {
        let mut completions = Vec::with_capacity(entries.len());
        for entry in entries {
            completions.push(self.rollup_entry(entry, breakdown.as_deref_mut()).await?);
        }

        let (percent, entry_count) = aggregator::franchise_percent(
            entries
                .iter()
                .zip(&completions)
                .map(|(entry, completion)| (entry.is_optional, completion.percent)),
            include_optional_entries,
        );

        Ok((
            completions,
            FranchiseCompletion {
                franchise_id: franchise_id.to_string(),
                percent,
                entry_count,
            },
        ))
    }

    /// Recompute the aggregates named by `request`
    ///
    /// - `entry_id`: every node of that entry (post-order) and its rollup
    /// - `franchise_id`: every node of every entry, per-entry rollups and the
    ///   franchise rollup
    /// - both: both filled, each milestone reported once
    /// - neither: empty result
    #[instrument(skip(self))]
    pub async fn recompute(&self, request: RecomputeRequest) -> Result<RecomputeResult, ServiceError> {
        let mut result = RecomputeResult::default();
        let mut seen: HashSet<String> = HashSet::new();

        if let Some(entry_id) = request.entry_id.as_deref() {
            let entry = self.require_entry(entry_id).await?;
            let mut breakdown = Vec::new();
            result.entry = Some(self.rollup_entry(&entry, Some(&mut breakdown)).await?);
            push_unique(&mut result.milestones, &mut seen, breakdown);
        }

        if let Some(franchise_id) = request.franchise_id.as_deref() {
            if self.store.get_franchise(franchise_id).await?.is_none() {
                return Err(ServiceError::franchise_not_found(franchise_id));
            }
            let entries = self.store.list_entries(franchise_id).await?;

            let mut breakdown = Vec::new();
            let (per_entry, franchise) = self
                .rollup_entries(
                    franchise_id,
                    &entries,
                    request.include_optional_entries,
                    Some(&mut breakdown),
                )
                .await?;
            push_unique(&mut result.milestones, &mut seen, breakdown);
            result.entries = per_entry;
            result.franchise = Some(franchise);
        }

        debug!(milestones = result.milestones.len(), entries = result.entries.len(), "recomputed");
        Ok(result)
    }
}

fn push_unique(
    out: &mut Vec<MilestoneCompletion>,
    seen: &mut HashSet<String>,
    records: Vec<MilestoneCompletion>,
) {
    for record in records {
        if seen.insert(record.milestone_id.clone()) {
            out.push(record);
        }
    }
}
