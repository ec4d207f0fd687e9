mod cu_up;
mod data;
mod executor;
pub mod userplane;

pub use cu_up::CuUp;
pub use data::*;
pub use executor::{AsyncStdExecutor, Task, TaskExecutor};
pub use userplane::{DemuxError, DemuxStats, DispatchQueueHandle, GtpuDemux, TunnelRxNotifier};
