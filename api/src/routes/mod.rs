//! API Routes

pub mod clients;
pub mod connections;
pub mod health;
pub mod provisioning;
pub mod zones;
