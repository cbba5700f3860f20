pub mod contact;
pub mod event;
pub mod hackaway;
pub mod join_request;
pub mod stats;
pub mod team;
pub mod user;

// Re-export all repositories for easy importing
pub use contact::ContactRepository;
pub use event::EventRepository;
pub use hackaway::HackawayRepository;
pub use join_request::JoinRequestRepository;
pub use stats::StatsRepository;
pub use team::TeamRepository;
pub use user::UserRepository;
