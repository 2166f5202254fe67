//! Access control policy.
//!
//! Pure decision logic: given who is asking and who owns the complaint, decide
//! what is permitted. Every role/ownership combination has an explicit answer
//! and nothing is permitted by default.

use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::AppError,
    models::{Complaint, Role},
};

/// An operation that is subject to authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    EditContent,
    Delete,
    ChangeStatus,
    ManageDirectory,
}

/// Relationship between the requester and the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Standing {
    Owner,
    Stranger,
}

fn standing(requester: &AuthUser, owner_id: Option<Uuid>) -> Standing {
    match owner_id {
        Some(owner) if owner == requester.id => Standing::Owner,
        _ => Standing::Stranger,
    }
}

/// The full decision table. `owner_id` is `None` for actions that are not tied
/// to a particular complaint.
pub fn permits(requester: &AuthUser, action: Action, owner_id: Option<Uuid>) -> bool {
    use Action::*;
    use Standing::*;

    match (action, requester.role, standing(requester, owner_id)) {
        (View, Role::Admin, _) => true,
        (View, Role::User, Owner) => true,
        (View, Role::User, Stranger) => false,

        // Administrators moderate status; content belongs to the author alone.
        (EditContent, _, Owner) => true,
        (EditContent, _, Stranger) => false,

        (Delete, Role::Admin, _) => true,
        (Delete, Role::User, Owner) => true,
        (Delete, Role::User, Stranger) => false,

        (ChangeStatus, Role::Admin, _) => true,
        (ChangeStatus, Role::User, _) => false,

        (ManageDirectory, Role::Admin, _) => true,
        (ManageDirectory, Role::User, _) => false,
    }
}

pub fn can_view(requester: &AuthUser, complaint: &Complaint) -> bool {
    permits(requester, Action::View, Some(complaint.user_id))
}

pub fn can_edit(requester: &AuthUser, complaint: &Complaint) -> bool {
    permits(requester, Action::EditContent, Some(complaint.user_id))
}

pub fn can_delete(requester: &AuthUser, complaint: &Complaint) -> bool {
    permits(requester, Action::Delete, Some(complaint.user_id))
}

pub fn can_change_status(requester: &AuthUser) -> bool {
    permits(requester, Action::ChangeStatus, None)
}

pub fn can_manage_directory(requester: &AuthUser) -> bool {
    permits(requester, Action::ManageDirectory, None)
}

/// Like [`permits`], but yields the `Forbidden` error handlers propagate with `?`.
pub fn authorize(
    requester: &AuthUser,
    action: Action,
    owner_id: Option<Uuid>,
) -> Result<(), AppError> {
    if permits(requester, action, owner_id) {
        return Ok(());
    }

    let message = match action {
        Action::View => "You do not have permission to view this complaint",
        Action::EditContent => "Only the creator can edit their complaint",
        Action::Delete => "You can only delete your own complaints",
        Action::ChangeStatus => "You don't have permission to change status",
        Action::ManageDirectory => "Only administrators can manage government web data",
    };
    tracing::debug!(requester = %requester.id, ?action, "authorization denied");
    Err(AppError::forbidden(message))
}
