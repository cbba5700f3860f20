pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;

pub use config::Config;
pub use error::AppError;
pub use services::{IdentityService, RegistrationService, StatsService, TeamService};

pub struct AppState {
    pub identity: IdentityService,
    pub teams: TeamService,
    pub registrations: RegistrationService,
    pub stats: StatsService,
}
