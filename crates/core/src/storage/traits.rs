use crate::errors::CoreError;

/// Durable string key-value storage on the client side.
///
/// Reads and writes are synchronous and last-writer-wins. Implementations
/// decide where the data lives (memory, a file on disk, a platform
/// preference store).
pub trait KeyValueStore: Send {
    /// Value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn delete(&mut self, key: &str) -> Result<(), CoreError>;

    /// All keys currently stored, in ascending order.
    fn keys(&self) -> Result<Vec<String>, CoreError>;
}
