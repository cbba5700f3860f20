pub mod identity;
pub mod registration;
pub mod stats;
pub mod team;

pub use identity::{Claims, IdentityService};
pub use registration::RegistrationService;
pub use stats::StatsService;
pub use team::TeamService;
