pub mod clock;
pub mod error;
pub mod event;
pub mod sample;
pub mod snapshot;
pub mod state;
pub mod window;

pub use clock::{Clock, ManualClock};
pub use error::{Result, VscopeError};
pub use event::Command;
pub use sample::{derive_metrics, RawVector, Sample};
pub use snapshot::{Series, Snapshot, SnapshotStats};
pub use state::RunState;
pub use window::{SampleWindow, SharedWindow};
