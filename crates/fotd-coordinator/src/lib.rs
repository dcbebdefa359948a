//! Update coordination: one [`FlavorCoordinator`] per configured store owns
//! the provider session, the cached flavor and the polling schedule.

pub mod coordinator;
pub mod snapshot;

pub use coordinator::{FlavorCoordinator, RefreshOutcome, Subscription};
pub use snapshot::{FlavorSnapshot, Phase, UpdateFailure};
