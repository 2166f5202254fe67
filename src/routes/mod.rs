/// Router Module Index
///
/// Routes are split by who may reach them. Authentication is applied per module
/// (via Axum layers); finer decisions (owner, admin) go through the access policy.

/// Routes open to anonymous clients: liveness, registration, login and the
/// read-only government web directory.
pub mod public;

/// Routes behind the `AuthUser` middleware: profile, uploads and complaints.
pub mod authenticated;

/// Directory management, nested under `/admin`. Every handler requires the
/// administrator role.
pub mod admin;
