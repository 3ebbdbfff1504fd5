pub mod database;
pub mod dispatch;
pub mod models;
pub mod parser;
pub mod registry;
pub mod reminders;
pub mod scheduler;
pub mod server;
pub mod services;
pub mod store;
pub mod tasks;
