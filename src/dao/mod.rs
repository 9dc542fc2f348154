/// Domain model definitions shared by every layer.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
/// Document store trait and its backends.
pub mod store;
