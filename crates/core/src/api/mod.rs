pub mod traits;

// Transport implementations
pub mod http;
