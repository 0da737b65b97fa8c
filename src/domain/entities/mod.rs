pub mod client;
pub mod email_log;
pub mod gym;
pub mod payment;
pub mod plan;
