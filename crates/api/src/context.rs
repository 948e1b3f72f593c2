use comercio_auth::Role;
use comercio_core::UserId;

/// The authenticated identity for a request.
///
/// Inserted by the auth middleware; must be present on all protected routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
}
