pub mod automation;
pub mod container;
pub mod section;
pub mod snapshot;
pub mod track;

pub use automation::{
    AutomationLaneState, AutomationPoint, AutomationTarget, LaneRef, LaneScope, LaneUnit,
};
pub use container::{ContainerKind, ContainerState, FadeCurve, FadeSpec, MidiNote};
pub use section::SectionState;
pub use snapshot::{BarRange, InlineLaneConfig, Snapshot, TimeSignature};
pub use track::{TrackKind, TrackState};
