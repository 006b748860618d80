//! Database models split into domain-specific modules.

pub mod device;
pub mod grant;
pub mod status;
pub mod user;

pub use device::*;
pub use grant::*;
pub use status::*;
pub use user::*;
