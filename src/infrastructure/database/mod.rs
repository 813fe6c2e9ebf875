pub mod connection;
pub mod run_repository;
pub mod session_store;
pub mod utils;

pub use connection::DatabaseConnection;
pub use run_repository::SqliteRunRecorder;
pub use session_store::SqliteSessionStore;
