pub mod client;
pub mod gym;
pub mod payment;
pub mod reminder;
