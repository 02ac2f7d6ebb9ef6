// Application Layer - Probe services over the ports

pub mod command;
pub mod facade;
pub mod registry;
pub mod wmi;

pub use facade::ProbeFacade;
pub use registry::RegistryQueryService;
pub use wmi::InstrumentationQueryService;
