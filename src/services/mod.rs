pub mod database;
pub mod transfer;
