use serde::{Deserialize, Serialize};

use crate::model::{BarRange, FadeSpec, LaneRef, MidiNote};

/// Editing intents emitted by the interaction controller. Fire-and-forget:
/// the sink owns validation and undo bookkeeping, and the next snapshot is
/// the only acknowledgement the grid ever sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GridCommand {
    SetPlayhead(f64),

    SelectRange(BarRange),
    ClearRangeSelection,
    SelectSection(u64),
    SelectContainer { id: u64, additive: bool },
    ClearContainerSelection,
    OpenContainer(u64),

    MoveContainer { id: u64, track_id: u64, new_start_bar: f64 },
    CloneContainer { id: u64, track_id: u64, new_start_bar: f64 },
    CopyContainer(u64),
    DuplicateContainer(u64),
    SplitContainer { id: u64, at_bar: f64 },
    DeleteContainer(u64),
    ResizeContainerLeft { id: u64, new_start_bar: f64, new_length_bars: f64 },
    ResizeContainerRight { id: u64, new_length_bars: f64 },
    TrimContainerLeft {
        id: u64,
        new_start_bar: f64,
        new_length_bars: f64,
        new_offset_bars: f64,
    },
    TrimContainerRight { id: u64, new_length_bars: f64 },
    SetEnterFade { id: u64, fade: Option<FadeSpec> },
    SetExitFade { id: u64, fade: Option<FadeSpec> },
    CreateContainer { track_id: u64, start_bar: f64, length_bars: f64 },

    SetInlineLaneHeight { track_id: u64, height: f32 },
    ShiftInlinePitchRange { track_id: u64, delta_semitones: i32 },
    PreviewPitchOn { track_id: u64, pitch: u8 },
    PreviewPitchOff { track_id: u64 },

    AddMidiNote { container_id: u64, note: MidiNote },
    UpdateMidiNote { container_id: u64, note: MidiNote },
    RemoveMidiNote { container_id: u64, note_id: u64 },

    AddBreakpoint { lane: LaneRef, position_bars: f64, value: f32 },
    UpdateBreakpoint {
        lane: LaneRef,
        point_id: u64,
        position_bars: f64,
        value: f32,
    },
    RemoveBreakpoint { lane: LaneRef, point_id: u64 },
    /// Replace every breakpoint in [start_bar, end_bar] with the given
    /// (position, value) list. Used by shape drawing.
    ReplaceBreakpointRange {
        lane: LaneRef,
        start_bar: f64,
        end_bar: f64,
        points: Vec<(f64, f32)>,
    },
}

/// Owned by the surrounding application. Best-effort: no result comes back.
pub trait CommandSink {
    fn send(&self, command: GridCommand);
}

/// The usual wiring: commands flow over a channel to whoever owns the
/// editable state.
impl CommandSink for crossbeam_channel::Sender<GridCommand> {
    fn send(&self, command: GridCommand) {
        let _ = crossbeam_channel::Sender::send(self, command);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::cell::RefCell;

    /// Collects commands for assertions.
    #[derive(Default)]
    pub struct RecordingSink {
        pub sent: RefCell<Vec<GridCommand>>,
    }

    impl CommandSink for RecordingSink {
        fn send(&self, command: GridCommand) {
            self.sent.borrow_mut().push(command);
        }
    }

    impl RecordingSink {
        pub fn take(&self) -> Vec<GridCommand> {
            std::mem::take(&mut self.sent.borrow_mut())
        }
    }
}
