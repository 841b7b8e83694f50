//! API Routes

pub mod attachments;
pub mod comments;
pub mod health;
pub mod letters;
pub mod notifications;
pub mod portal;
pub mod users;
