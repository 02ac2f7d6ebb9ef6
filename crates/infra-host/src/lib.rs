// Hostprobe Infrastructure - Host Adapters
// Implements: ProcessRunner, FileScanner, InstrumentationProvider, KeyStore

pub mod fs_scanner;
pub mod process_runner;
pub mod registry_store;
pub mod wmi_provider;

pub use fs_scanner::TokioFileScanner;
pub use process_runner::TokioProcessRunner;
pub use registry_store::HostKeyStore;
pub use wmi_provider::HostWmiProvider;
