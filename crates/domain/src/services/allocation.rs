//! Slot partitioning and allocation planning.

use std::collections::{HashMap, VecDeque};

use crate::models::{FreeGroups, RejectReason, ReservationUnit};

/// Result of planning a request against a slot's partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationPlan {
    /// Groups to occupy, in request order, with substitutions applied.
    Assigned(Vec<i32>),
    NeedsApproval { group: i32 },
    Rejected(RejectReason),
}

/// Splits the group universe into free, unpinned-reserved and pinned-reserved groups.
///
/// Units owned by `ignore_reservation` count as free, so an update competes only
/// against other reservations.
pub fn partition_groups(
    universe: &[i32],
    reserved: &[ReservationUnit],
    ignore_reservation: Option<i64>,
) -> FreeGroups {
    let occupied: HashMap<i32, &ReservationUnit> = reserved
        .iter()
        .filter(|u| Some(u.reservation_id) != ignore_reservation)
        .map(|u| (u.ipad_group, u))
        .collect();

    let mut groups = FreeGroups::default();
    for group in universe {
        match occupied.get(group) {
            Some(unit) if unit.is_pinned => groups.reserved_groups.push(*group),
            Some(_) => groups.unpinned_groups.push(*group),
            None => groups.free_groups.push(*group),
        }
    }
    groups.max_count = groups.free_groups.len();
    groups
}

/// Plans the groups a request occupies.
///
/// Capacity is checked against the free count before any substitution. Occupied
/// groups escalate for pinned requests and are swapped for a free group otherwise.
pub fn plan_allocation(requested: &[i32], pinned: bool, groups: &FreeGroups) -> AllocationPlan {
    if requested.len() > groups.max_count {
        return AllocationPlan::Rejected(RejectReason::Capacity {
            requested: requested.len(),
            available: groups.max_count,
        });
    }

    let mut substitutes: VecDeque<i32> = groups
        .free_groups
        .iter()
        .copied()
        .filter(|g| !requested.contains(g))
        .collect();

    let mut assigned = Vec::with_capacity(requested.len());
    for group in requested {
        if groups.free_groups.contains(group) {
            assigned.push(*group);
            continue;
        }

        let occupied =
            groups.unpinned_groups.contains(group) || groups.reserved_groups.contains(group);
        if !occupied {
            return AllocationPlan::Rejected(RejectReason::UnknownGroup(*group));
        }
        if pinned {
            return AllocationPlan::NeedsApproval { group: *group };
        }
        match substitutes.pop_front() {
            Some(substitute) => assigned.push(substitute),
            None => {
                return AllocationPlan::Rejected(RejectReason::Capacity {
                    requested: requested.len(),
                    available: groups.max_count,
                })
            }
        }
    }

    AllocationPlan::Assigned(assigned)
}
