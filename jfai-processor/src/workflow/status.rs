//! Processing loop status shared with the health endpoint

use super::processor::CycleReport;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    Starting,
    Scanning,
    Idle,
    Stopped,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessorStatus {
    pub state: LoopState,
    pub cycles_completed: u64,
    pub last_cycle: Option<CycleReport>,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl Default for ProcessorStatus {
    fn default() -> Self {
        Self {
            state: LoopState::Starting,
            cycles_completed: 0,
            last_cycle: None,
            last_cycle_at: None,
            last_error: None,
        }
    }
}

pub type SharedStatus = Arc<RwLock<ProcessorStatus>>;

pub fn shared_status() -> SharedStatus {
    Arc::new(RwLock::new(ProcessorStatus::default()))
}
