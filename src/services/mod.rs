// Services module - business logic layer

pub mod watch_time;

// Catalog provider
pub mod jikan;
