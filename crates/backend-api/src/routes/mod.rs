pub mod agents;
pub mod auth;
pub mod boards;
pub mod chats;
pub mod health;
pub mod home;
pub mod messages;
pub mod models;
pub mod tasks;
pub mod users;
