pub mod client;
pub mod error;
pub mod mirror;
pub mod oracle;
pub mod start_date;
