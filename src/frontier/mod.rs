//! The frontier: scheduling core and worker-facing contract
//!
//! This module contains:
//! - [`Frontier`], the handle workers and operators use, and the manager
//!   task behind it
//! - The [`QueueTopology`] strategy and its ready/snoozed implementation
//! - [`WorkQueue`] per-class-key containers
//! - Politeness/retry calculators and the precedence policy
//! - The dispatch gate and bulk import

mod gate;
mod import;
mod manager;
mod politeness;
mod precedence;
mod topology;
mod work_queue;

pub use gate::DispatchGate;
pub use import::{parse_seeds, ImportEntry};
pub use manager::{Frontier, FrontierCounters, FrontierState};
pub use politeness::{needs_retrying, politeness_wait};
pub use precedence::{BasePrecedencePolicy, PrecedencePolicy};
pub use topology::{QueueExport, QueueTopology, ReadySnoozedTopology, TopologyStats};
pub use work_queue::WorkQueue;
