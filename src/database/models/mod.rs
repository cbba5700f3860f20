pub mod contact;
pub mod event;
pub mod hackaway;
pub mod join_request;
pub mod stats;
pub mod team;
pub mod user;

// Re-export all models for easy importing
pub use contact::*;
pub use event::*;
pub use hackaway::*;
pub use join_request::*;
pub use stats::*;
pub use team::*;
pub use user::*;
