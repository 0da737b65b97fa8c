//! Payment arithmetic: status projection from history and reconciliation of
//! new payments. Everything here is pure; persistence lives in the adapters.

pub mod projector;
pub mod reconciler;
