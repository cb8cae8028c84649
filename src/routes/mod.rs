/// Router Module Index
///
/// Routes are split by who may reach them. Access control is attached at the module
/// level in `create_router` (via `route_layer`), so a handler can never be mounted
/// without the guard its module implies.

/// Routes open to anonymous clients: health, API banner, signup/signin/signout.
pub mod public;

/// Routes behind the `AuthUser` session check. Finer-grained owner/admin decisions are
/// made by the policy engine inside the account service.
pub mod authenticated;

/// Routes restricted to the admin role as a whole.
pub mod admin;
