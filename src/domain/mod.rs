pub mod billing;
pub mod entities;
