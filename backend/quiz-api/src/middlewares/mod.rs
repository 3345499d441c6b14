pub mod metrics;
pub mod security;
pub mod trace;
