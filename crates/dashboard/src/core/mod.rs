pub mod coordinator;
pub mod indicators;
pub mod signals;
