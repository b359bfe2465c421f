//! Processing pipeline
//!
//! - [`processor`]: the scheduling loop and per-item pipeline
//! - [`dual_writer`]: graph + relational persistence of one item
//! - [`status`]: loop state published to the health endpoint

pub mod dual_writer;
pub mod processor;
pub mod status;

pub use dual_writer::{DualWriteReport, DualWriter, WriteStatus};
pub use processor::{
    CycleReport, ItemOutcome, ItemReport, MediaProcessor, ProcessorDeps, ProcessorError,
    ProcessorSettings, SkipReason, StageStatus,
};
pub use status::{LoopState, ProcessorStatus, SharedStatus};
