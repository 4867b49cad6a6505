pub mod policy;
pub mod reconcile;
