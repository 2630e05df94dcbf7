pub mod cache;
pub mod cancellation;
pub mod ports;
pub mod services;
pub mod use_cases;
