pub mod cancellation;
pub mod snapshot;
