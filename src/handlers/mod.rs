pub mod admin;
pub mod auth;
pub mod contact;
pub mod events;
pub mod hackaway;
pub mod shared;
pub mod stats;
pub mod teams;
