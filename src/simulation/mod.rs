pub mod counters;
pub mod env;
pub mod instinct;
pub mod output;
pub mod perception;
pub mod percepts;
pub mod popcode;
pub mod resources;

pub use counters::{Counter, Counters};
pub use env::{Environment, FWorld};
pub use instinct::{Decision, InstinctPolicy, InstinctReason};
pub use output::{run_instinct, RunSummary};
pub use perception::{RayHit, Scan, Scanner};
pub use percepts::PerceptBundle;
pub use popcode::{PopCode1D, PopCodeRing};
pub use resources::{ResourceEvent, ResourceLedger};
