//! Authentication state trait and macro.

use super::gateway::AuthGateway;

/// Trait for state types that can authenticate requests.
pub trait HasAuthGateway {
    fn auth(&self) -> &AuthGateway;
}

/// Macro to implement `HasAuthGateway` for state structs with an `auth` field.
///
/// # Example
/// ```ignore
/// use crate::impl_has_auth_gateway;
///
/// #[derive(Clone)]
/// pub struct MyState {
///     pub auth: AuthGateway,
///     // ... other fields
/// }
///
/// impl_has_auth_gateway!(MyState);
/// ```
#[macro_export]
macro_rules! impl_has_auth_gateway {
    ($state_type:ty) => {
        impl $crate::auth::HasAuthGateway for $state_type {
            fn auth(&self) -> &$crate::auth::AuthGateway {
                &self.auth
            }
        }
    };
}
