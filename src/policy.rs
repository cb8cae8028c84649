//! Authorization policy for account actions.
//!
//! Every permission decision in the service goes through [`authorize`]. Rules are
//! evaluated in order and the first match wins; two of them are self-protection rules
//! (an admin cannot change their own role, nor delete their own account) that report a
//! different denial kind than a plain lack of permission.

use std::fmt;

use crate::{auth::AuthUser, models::Role};

/// A mutable attribute of an account, as named in an update request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountField {
    Name,
    Email,
    Password,
    Role,
}

/// Action
///
/// What the actor wants to do with the target account. `List` has no single target and
/// is gated on role alone.
#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    Read,
    Update(&'a [AccountField]),
    Delete,
    List,
}

/// Denial
///
/// Why a request was refused. Both kinds answer 403, but they carry different labels so
/// a client can tell "you lack the role" apart from "nobody may do this to themselves".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    InsufficientPermissions(&'static str),
    OperationNotAllowed(&'static str),
}

impl Denial {
    pub fn label(&self) -> &'static str {
        match self {
            Self::InsufficientPermissions(_) => "Insufficient permissions",
            Self::OperationNotAllowed(_) => "Operation not allowed",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::InsufficientPermissions(message) | Self::OperationNotAllowed(message) => {
                message
            }
        }
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// authorize
///
/// Decides whether `actor` may perform `action` on the account `target_id`.
/// `target_id` is ignored for [`Action::List`].
pub fn authorize(actor: &AuthUser, target_id: i32, action: Action<'_>) -> Result<(), Denial> {
    let is_owner = actor.id == target_id;
    let is_admin = actor.role == Role::Admin;

    match action {
        Action::Read => {
            if !is_owner && !is_admin {
                return Err(Denial::InsufficientPermissions(
                    "You can only access your own data unless you are an admin",
                ));
            }
            Ok(())
        }
        Action::Update(fields) => {
            if !is_owner && !is_admin {
                return Err(Denial::InsufficientPermissions(
                    "You can only update your own profile unless you are an admin",
                ));
            }
            let changes_role = fields.contains(&AccountField::Role);
            if changes_role && !is_admin {
                return Err(Denial::InsufficientPermissions(
                    "Only administrators can change user roles",
                ));
            }
            if changes_role && is_owner {
                return Err(Denial::OperationNotAllowed("You cannot change your own role"));
            }
            Ok(())
        }
        Action::Delete => {
            if !is_admin {
                return Err(Denial::InsufficientPermissions(
                    "Only administrators can delete users",
                ));
            }
            if is_owner {
                return Err(Denial::OperationNotAllowed(
                    "You cannot delete your own account. Contact an administrator for account deletion.",
                ));
            }
            Ok(())
        }
        Action::List => {
            if !is_admin {
                return Err(Denial::InsufficientPermissions("Access denied for this role"));
            }
            Ok(())
        }
    }
}

/// The fields `actor` may change on `target_id`, assuming the base permission holds.
pub fn mutable_fields(actor: &AuthUser, target_id: i32) -> &'static [AccountField] {
    const ALL: &[AccountField] = &[
        AccountField::Name,
        AccountField::Email,
        AccountField::Password,
        AccountField::Role,
    ];
    const PROFILE: &[AccountField] = &[
        AccountField::Name,
        AccountField::Email,
        AccountField::Password,
    ];

    if actor.role == Role::Admin && actor.id != target_id {
        ALL
    } else {
        PROFILE
    }
}
