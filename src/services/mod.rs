pub mod circuit_breaker;
pub mod feed;
pub mod sessions;
pub mod upstream;
