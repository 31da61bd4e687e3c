//! Host authentication seam
//!
//! Authentication belongs to the host application; this subsystem only needs
//! to know who (if anyone) is behind a request. The host installs an
//! [`AuthProvider`] at startup; without one every request is anonymous.

use actix_web::HttpRequest;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Identity and profile of an authenticated user as the host knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub id: i32,
    pub name: String,
    pub email: String,
    /// Whether the user may delete/approve reviews
    pub is_moderator: bool,
}

/// Resolves the current user from a request, typically from the host's
/// session or token machinery.
pub trait AuthProvider: Send + Sync {
    fn current_user(&self, req: &HttpRequest) -> Option<UserInfo>;
}

static AUTH_PROVIDER: OnceCell<Arc<dyn AuthProvider>> = OnceCell::new();

/// Install the host's authentication provider. Call once at startup.
pub fn install_auth_provider(provider: Arc<dyn AuthProvider>) {
    if AUTH_PROVIDER.set(provider).is_err() {
        log::warn!("Auth provider already installed; ignoring replacement");
    }
}

/// The authenticated user behind `req`, if any.
pub fn current_user(req: &HttpRequest) -> Option<UserInfo> {
    AUTH_PROVIDER.get().and_then(|p| p.current_user(req))
}
