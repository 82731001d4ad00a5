/// Router Module Index
///
/// Routes are grouped by how the auth gate treats them. The gate itself is a
/// single layer over the merged router (see `create_router`); the split here
/// mirrors its allow-list so the public surface can be read in one place.

/// Endpoints reachable without a session.
pub mod public;

/// JSON endpoints that need a valid session; role and ownership checks happen
/// in the handlers through `auth::authorize`.
pub mod protected;

/// HTML shells under `/admin`.
pub mod pages;
