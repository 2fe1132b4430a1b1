pub mod auth;
pub mod init;
pub mod root;
pub mod stats;
pub mod trips;
