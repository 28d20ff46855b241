pub mod chat;
pub mod dashboard;
pub mod schedule;
pub mod session;
pub mod task;
