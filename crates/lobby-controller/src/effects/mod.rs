//! Effect execution outside the controller's critical section.
//!
//! Registry operations return [`Effects`](crate::registry::Effects); callers
//! hand them to the effect worker task through its [`EffectWorkerHandle`].
//! [`release_all`] is the shutdown path.

mod shutdown;
mod worker;

pub use shutdown::release_all;
pub use worker::{EffectFailure, EffectWorkerHandle};
