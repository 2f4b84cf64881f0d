//! Pump/attendant assignment reconciliation
//!
//! Editing an attendant submits the full set of pumps they should staff.
//! The backend only exposes per-pump add/remove calls, so the desired set is
//! diffed against the current one and the difference applied.

use crate::client::BackendError;
use async_trait::async_trait;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub type PumpId = u64;
pub type AttendantId = u64;

/// Pump as listed by the backend
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pump {
    pub id: PumpId,
    #[serde(default)]
    pub pump_number: Option<String>,
    #[serde(default)]
    pub station_id: Option<u64>,
}

/// Calls needed to move an attendant from one pump set to another
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentPlan {
    pub to_add: Vec<PumpId>,
    pub to_remove: Vec<PumpId>,
}

impl AssignmentPlan {
    /// `to_add` = desired − current, `to_remove` = current − desired.
    /// Input order is kept and duplicates collapse to their first occurrence.
    #[must_use]
    pub fn diff(current: &[PumpId], desired: &[PumpId]) -> Self {
        let current_set: HashSet<PumpId> = current.iter().copied().collect();
        let desired_set: HashSet<PumpId> = desired.iter().copied().collect();

        Self {
            to_add: unique_missing(desired, &current_set),
            to_remove: unique_missing(current, &desired_set),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

fn unique_missing(ids: &[PumpId], exclude: &HashSet<PumpId>) -> Vec<PumpId> {
    let mut seen = HashSet::new();
    ids.iter()
        .copied()
        .filter(|id| !exclude.contains(id) && seen.insert(*id))
        .collect()
}

/// Pump assignment endpoints
#[async_trait]
pub trait PumpAssignmentApi: Send + Sync {
    /// Pumps currently staffed by `attendant`
    ///
    /// # Errors
    ///
    /// Returns an error if the pump list cannot be fetched
    async fn current_pumps(&self, attendant: AttendantId) -> Result<Vec<PumpId>, BackendError>;

    /// Add `attendants` to `pump`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses or cannot be reached
    async fn assign(&self, pump: PumpId, attendants: &[AttendantId]) -> Result<(), BackendError>;

    /// Remove `attendants` from `pump`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses or cannot be reached
    async fn unassign(&self, pump: PumpId, attendants: &[AttendantId]) -> Result<(), BackendError>;
}

/// A single add/remove call that did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedChange {
    pub pump: PumpId,
    pub error: BackendError,
}

/// Result of applying a plan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentOutcome {
    pub plan: AssignmentPlan,
    pub added: Vec<PumpId>,
    pub removed: Vec<PumpId>,
    pub failed_adds: Vec<FailedChange>,
    pub failed_removes: Vec<FailedChange>,
}

impl AssignmentOutcome {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed_adds.is_empty() && self.failed_removes.is_empty()
    }
}

/// Reconciliation could not start
#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    #[error("failed to load current pumps for attendant {attendant}: {source}")]
    CurrentPumps {
        attendant: AttendantId,
        #[source]
        source: BackendError,
    },
}

/// Bring `attendant`'s pumps in line with `desired`.
///
/// Adds are issued concurrently, then removes. A failed call does not stop
/// the others; failures are reported in the outcome.
///
/// # Errors
///
/// Returns an error only if the current assignment cannot be read
pub async fn reconcile(
    api: &dyn PumpAssignmentApi,
    attendant: AttendantId,
    desired: &[PumpId],
) -> Result<AssignmentOutcome, AssignmentError> {
    let current = api
        .current_pumps(attendant)
        .await
        .map_err(|source| AssignmentError::CurrentPumps { attendant, source })?;

    let plan = AssignmentPlan::diff(&current, desired);
    if plan.is_empty() {
        log::debug!("Attendant {attendant} pump assignment already up to date");
        return Ok(AssignmentOutcome {
            plan,
            ..AssignmentOutcome::default()
        });
    }

    log::info!(
        "Reconciling attendant {attendant}: adding {:?}, removing {:?}",
        plan.to_add,
        plan.to_remove
    );

    let attendants = [attendant];
    let add_results = join_all(plan.to_add.iter().map(|&pump| async move {
        (pump, api.assign(pump, &attendants).await)
    }))
    .await;
    let remove_results = join_all(plan.to_remove.iter().map(|&pump| async move {
        (pump, api.unassign(pump, &attendants).await)
    }))
    .await;

    let (added, failed_adds) = partition(add_results);
    let (removed, failed_removes) = partition(remove_results);

    for failure in failed_adds.iter().chain(&failed_removes) {
        log::warn!(
            "Pump {} assignment change for attendant {attendant} failed: {}",
            failure.pump,
            failure.error
        );
    }

    Ok(AssignmentOutcome {
        plan,
        added,
        removed,
        failed_adds,
        failed_removes,
    })
}

fn partition(
    results: Vec<(PumpId, Result<(), BackendError>)>,
) -> (Vec<PumpId>, Vec<FailedChange>) {
    let mut applied = Vec::new();
    let mut failed = Vec::new();
    for (pump, result) in results {
        match result {
            Ok(()) => applied.push(pump),
            Err(error) => failed.push(FailedChange { pump, error }),
        }
    }
    (applied, failed)
}
