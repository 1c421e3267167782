pub mod diff;
pub mod owned_css;
pub mod recorder;
pub mod snapshot;

pub use owned_css::OwnedRule;
pub use recorder::{RecordingSession, StyleRecorder};
pub use snapshot::StyleSnapshot;
