pub mod format;
pub mod memory;
pub mod session_store;
pub mod traits;

#[cfg(not(target_arch = "wasm32"))]
pub mod file;
