pub mod model;
pub mod store;

pub use model::{Job, JobStatus, JobUpdate};
pub use store::{spawn_retention_sweep, InMemoryJobStore, JobStore};
