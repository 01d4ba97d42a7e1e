//! Plan generation and single-slot edits.
//!
//! - [`request`]: wire payloads and their validated forms.
//! - [`select`]: per-slot source policy (recurring list vs. external batch).
//! - [`slot`]: slot constructors.
//! - [`builder`]: full-week generation.
//! - [`swap`]: copy-on-write replacement of one slot.

pub mod builder;
pub mod request;
pub mod select;
pub mod slot;
pub mod swap;

pub use builder::{GenerateInput, PlanBuilder};
pub use request::{
    GeneratePlanRequest, RequestError, SlotAction, SlotAddress, SlotEdit, SlotEditRequest,
};
pub use select::{SlotSource, choose_source, recurring_for};
pub use swap::{SlotSwapEngine, SwapContext};

/// Number of days in a plan.
pub const PLAN_DAYS: u64 = 7;
