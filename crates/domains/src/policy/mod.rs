//! Pure access-control decisions. Nothing in here touches a store or fails.

pub mod authorization;
pub mod visibility;

pub use authorization::*;
pub use visibility::*;
