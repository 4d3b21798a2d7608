//! Central authorization policy for ChatZone.
//!
//! Every mutating operation calls [`authorize`] with the acting role, the
//! action, and the role of the identity it touches (if any).

use thiserror::Error;

use super::identity::Role;

/// Permission-related errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// Acting role is below what the action needs.
    #[error("{action} requires the {required} role")]
    InsufficientRole {
        /// The refused action.
        action: Action,
        /// Minimum role.
        required: Role,
    },

    /// The target identity cannot be acted upon by this actor.
    #[error("{action} cannot target an {target} identity")]
    ProtectedTarget {
        /// The refused action.
        action: Action,
        /// Role of the target.
        target: Role,
    },

    /// The session is not in a room.
    #[error("this operation requires an active room")]
    NotInRoom,
}

/// Operations subject to role gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Create a public or password-protected room.
    CreateRoom,
    /// Provision or revoke moderators.
    ManageModerators,
    /// Add or remove gallery pictures.
    ManageGallery,
    /// Change the admin credential.
    UpdateAdminCredential,
    /// Remove someone from the present set.
    Kick,
    /// Ban a nickname.
    Ban,
    /// Lift a ban.
    Unban,
    /// List bans.
    ViewBans,
    /// List pending reports.
    ViewReports,
    /// Dismiss or act on a report.
    ResolveReport,
    /// Delete a message directly.
    DeleteMessage,
    /// Flag a message for moderators.
    ReportMessage,
}

impl Action {
    /// Stable name for logs and errors.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::CreateRoom => "create-room",
            Action::ManageModerators => "manage-moderators",
            Action::ManageGallery => "manage-gallery",
            Action::UpdateAdminCredential => "update-admin-credential",
            Action::Kick => "kick",
            Action::Ban => "ban",
            Action::Unban => "unban",
            Action::ViewBans => "view-bans",
            Action::ViewReports => "view-reports",
            Action::ResolveReport => "resolve-report",
            Action::DeleteMessage => "delete-message",
            Action::ReportMessage => "report-message",
        }
    }

    /// Minimum role allowed to perform this action.
    pub fn required_role(&self) -> Role {
        match self {
            Action::CreateRoom
            | Action::ManageModerators
            | Action::ManageGallery
            | Action::UpdateAdminCredential => Role::Admin,
            Action::Kick
            | Action::Ban
            | Action::Unban
            | Action::ViewBans
            | Action::ViewReports
            | Action::ResolveReport
            | Action::DeleteMessage => Role::Moderator,
            Action::ReportMessage => Role::User,
        }
    }

    /// Whether the action changes or removes what the target owns.
    ///
    /// Reporting only flags content for review, so it never counts.
    fn acts_on_target(&self) -> bool {
        matches!(
            self,
            Action::Kick | Action::Ban | Action::DeleteMessage | Action::ResolveReport
        )
    }

    /// Whether an admin target is off-limits even for the admin.
    fn admin_target_forbidden(&self) -> bool {
        matches!(self, Action::Kick | Action::Ban)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide whether `actor` may perform `action` on an identity of role `target`.
///
/// Rules:
/// - the actor must hold at least [`Action::required_role`]
/// - nobody kicks or bans the administrator
/// - only the administrator touches content owned by the administrator
/// - anyone may report, whoever the author is
///
/// # Examples
///
/// ```
/// use chatzone::auth::{authorize, Action, PermissionError, Role};
///
/// assert!(authorize(Role::Moderator, Action::Ban, Some(Role::User)).is_ok());
/// assert!(matches!(
///     authorize(Role::Moderator, Action::Ban, Some(Role::Admin)),
///     Err(PermissionError::ProtectedTarget { .. })
/// ));
/// assert!(authorize(Role::User, Action::CreateRoom, None).is_err());
/// ```
pub fn authorize(actor: Role, action: Action, target: Option<Role>) -> Result<(), PermissionError> {
    let required = action.required_role();
    if !actor.can_access(required) {
        return Err(PermissionError::InsufficientRole { action, required });
    }

    if target == Some(Role::Admin)
        && action.acts_on_target()
        && (action.admin_target_forbidden() || actor != Role::Admin)
    {
        return Err(PermissionError::ProtectedTarget {
            action,
            target: Role::Admin,
        });
    }

    Ok(())
}
