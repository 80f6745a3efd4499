//! Reservation status state machine
//!
//! | From                 | Action     | To            | Who            |
//! |----------------------|------------|---------------|----------------|
//! | Pending, Confirmed   | Reschedule | same status   | owner or admin |
//! | Pending, Confirmed   | Cancel     | Cancelled     | owner or admin |
//! | Pending, Confirmed   | Complete   | Completed     | admin          |
//! | Pending              | Confirm    | Confirmed     | admin          |
//! | any                  | Delete     | row removed   | admin          |
//! | Cancelled, Completed | other      | rejected      |                |

use super::model::{Reservation, ReservationStatus};
use crate::domain::identity::Actor;
use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleAction {
    Reschedule,
    Cancel,
    Complete,
    Confirm,
    Delete,
}

impl LifecycleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reschedule => "reschedule",
            Self::Cancel => "cancel",
            Self::Complete => "complete",
            Self::Confirm => "confirm",
            Self::Delete => "delete",
        }
    }

    pub fn admin_only(&self) -> bool {
        matches!(self, Self::Complete | Self::Confirm | Self::Delete)
    }
}

/// Status after `action`, or `InvalidTransition`
pub fn next_status(
    from: ReservationStatus,
    action: LifecycleAction,
) -> DomainResult<ReservationStatus> {
    use LifecycleAction::*;
    use ReservationStatus::*;

    match (from, action) {
        (_, Delete) => Ok(from),
        (Pending | Confirmed, Reschedule) => Ok(from),
        (Pending | Confirmed, Cancel) => Ok(Cancelled),
        (Pending | Confirmed, Complete) => Ok(Completed),
        (Pending, Confirm) => Ok(Confirmed),
        _ => Err(DomainError::InvalidTransition {
            from: from.as_str(),
            action: action.as_str(),
        }),
    }
}

/// Ownership and role gate; runs before the state check.
pub fn authorize(
    actor: &Actor,
    reservation: &Reservation,
    action: LifecycleAction,
) -> DomainResult<()> {
    match actor {
        Actor::Admin(_) => Ok(()),
        Actor::Customer(_) if action.admin_only() => Err(DomainError::Forbidden(format!(
            "only an administrator may {} a reservation",
            action.as_str()
        ))),
        Actor::Customer(id) if *id != reservation.customer_id => Err(DomainError::Forbidden(
            format!("reservation {} belongs to another customer", reservation.id),
        )),
        Actor::Customer(_) => Ok(()),
    }
}
