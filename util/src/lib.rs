pub mod cache;
pub mod config;
pub mod geofence;
pub mod qr;
pub mod rate_limit;
