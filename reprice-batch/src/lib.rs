pub mod models;
pub mod registry;
pub mod orchestrator;

pub use models::{JobStatus, RepriceJob, RowFailure, SYSTEM_SKU};
pub use registry::{JobError, JobRegistry, SweepHandle};
pub use orchestrator::{BatchSettings, RepriceOrchestrator};
