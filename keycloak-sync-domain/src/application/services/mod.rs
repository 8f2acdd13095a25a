pub mod client_scope_management;
pub mod federation_management;
pub mod flow_management;
pub mod identity_provider_management;
pub mod realm_management;
pub mod reconcile;
pub mod retry;
pub mod role_management;

pub use client_scope_management::*;
pub use federation_management::*;
pub use flow_management::*;
pub use identity_provider_management::*;
pub use realm_management::*;
pub use reconcile::*;
pub use retry::*;
pub use role_management::*;
