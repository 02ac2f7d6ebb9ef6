// Port Layer - Interfaces for external dependencies

pub mod file_scanner;
pub mod instrumentation;
pub mod key_store;
pub mod process_runner;
pub mod time_provider; // For deterministic testing

// Re-exports
pub use file_scanner::FileScanner;
pub use instrumentation::{InstrumentationProvider, WmiRow};
pub use key_store::{KeyStore, KeyStoreError};
pub use process_runner::{CommandSpec, ProcessRunner};
pub use time_provider::{SystemTimeProvider, TimeProvider};
