//! Reservation allocation engine.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use validator::Validate;

use crate::errors::AllocationError;
use crate::models::{
    AllocationOutcome, FreeGroups, RejectReason, ReservationDraft,
    ReservationRequest, Slot,
};
use crate::ports::{ReservationPruneReport, ReservationStore};
use crate::services::allocation::{partition_groups, plan_allocation, AllocationPlan};

/// Retention horizons of the two reservation relations.
#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    /// How long past its slot a reservation stays current.
    pub current: Duration,
    pub history: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            current: Duration::hours(1),
            history: Duration::days(30),
        }
    }
}

pub struct ReservationAllocator {
    store: Arc<dyn ReservationStore>,
    retention: RetentionPolicy,
}

impl ReservationAllocator {
    pub fn new(store: Arc<dyn ReservationStore>, retention: RetentionPolicy) -> Self {
        Self { store, retention }
    }

    /// Creates (`request.id` absent) or updates a reservation for `participant`.
    pub async fn create_or_update(
        &self,
        request: &ReservationRequest,
        participant: &str,
    ) -> AllocationOutcome {
        self.create_or_update_at(request, participant, Utc::now())
            .await
    }

    pub async fn create_or_update_at(
        &self,
        request: &ReservationRequest,
        participant: &str,
        now: DateTime<Utc>,
    ) -> AllocationOutcome {
        let outcome = match self.allocate(request, participant, now).await {
            Ok(outcome) => outcome,
            Err(AllocationError::ValidationFailure(msg)) => {
                AllocationOutcome::Rejected(RejectReason::Invalid(msg))
            }
            Err(e) => AllocationOutcome::Failed(e),
        };

        match &outcome {
            AllocationOutcome::Success(reservation) => info!(
                reservation_id = reservation.id,
                participant = %participant,
                groups = ?reservation.ipad_groups,
                "Reservation stored"
            ),
            AllocationOutcome::NeedsApproval { group } => info!(
                participant = %participant,
                group = group,
                "Pinned reservation needs approval"
            ),
            AllocationOutcome::Rejected(reason) => info!(
                participant = %participant,
                reason = %reason,
                "Reservation rejected"
            ),
            AllocationOutcome::Failed(e) => warn!(
                participant = %participant,
                error = %e,
                retryable = e.is_retryable(),
                "Reservation failed"
            ),
        }
        outcome
    }

    async fn allocate(
        &self,
        request: &ReservationRequest,
        participant: &str,
        now: DateTime<Utc>,
    ) -> Result<AllocationOutcome, AllocationError> {
        request
            .validate()
            .map_err(|e| AllocationError::ValidationFailure(e.to_string()))?;
        let slot = request.slot()?;

        let existing = match request.id {
            Some(id) => match self.store.find_reservation(id).await? {
                Some(existing) => Some(existing),
                None => {
                    return Ok(AllocationOutcome::Rejected(
                        RejectReason::UnknownReservation(id),
                    ))
                }
            },
            None => None,
        };

        let groups = self.free_groups_excluding(slot, request.id).await?;
        let assigned = match plan_allocation(&request.ipad_groups, request.is_pinned, &groups) {
            AllocationPlan::Assigned(assigned) => assigned,
            AllocationPlan::NeedsApproval { group } => {
                return Ok(AllocationOutcome::NeedsApproval { group })
            }
            AllocationPlan::Rejected(reason) => return Ok(AllocationOutcome::Rejected(reason)),
        };

        let now = shared::time::truncate_to_second(now);
        let created = existing.as_ref().map_or(now, |r| r.created);
        let draft = ReservationDraft {
            id: request.id,
            reservation: request.to_reservation(
                request.id.unwrap_or(-1),
                participant,
                assigned,
                created,
                now,
            ),
            slot,
        };
        let stored = self.store.commit_reservation(draft).await?;
        Ok(AllocationOutcome::Success(stored))
    }

    /// Free/reserved partition of a slot.
    pub async fn free_groups(&self, slot: Slot) -> Result<FreeGroups, AllocationError> {
        self.free_groups_excluding(slot, None).await
    }

    async fn free_groups_excluding(
        &self,
        slot: Slot,
        ignore_reservation: Option<i64>,
    ) -> Result<FreeGroups, AllocationError> {
        let universe = self.store.resource_groups().await?;
        let reserved = self.store.reserved_units(slot).await?;
        Ok(partition_groups(&universe, &reserved, ignore_reservation))
    }

    /// Deletes a reservation from both horizons and releases its groups.
    pub async fn delete(&self, id: i64) -> Result<(), AllocationError> {
        if self.store.delete_reservation(id).await? {
            info!(reservation_id = id, "Reservation deleted");
            Ok(())
        } else {
            Err(AllocationError::NotFound(format!("reservation {}", id)))
        }
    }

    /// Applies both retention horizons.
    pub async fn prune_expired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<ReservationPruneReport, AllocationError> {
        let current_before = now - self.retention.current;
        let history_before = now - self.retention.history;
        let report = self
            .store
            .prune_reservations(current_before, history_before, current_before.date_naive())
            .await?;
        info!(
            current = report.current,
            history = report.history,
            units = report.units,
            "Pruned expired reservations"
        );
        Ok(report)
    }
}
