use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::ModifiersState;
use winit::window::{Window, WindowId};

use arrangegrid::config::Config;
use arrangegrid::geometry::Point;
use arrangegrid::host::GridView;
use arrangegrid::interaction::Modifiers;
use arrangegrid::messages::GridCommand;
use arrangegrid::model::{
    AutomationLaneState, AutomationPoint, AutomationTarget, ContainerKind, ContainerState,
    FadeSpec, InlineLaneConfig, MidiNote, SectionState, Snapshot, TrackKind, TrackState,
};
use arrangegrid::providers::{MidiProvider, WaveformPeaks, WaveformProvider};
use arrangegrid::render::RenderEngine;

/// Synthesized peaks for the demo's audio containers.
struct DemoWaveforms;

impl WaveformProvider for DemoWaveforms {
    fn peaks(&self, container_id: u64) -> Option<WaveformPeaks> {
        if container_id % 2 != 0 {
            return None;
        }
        let n = 512;
        let mut min = Vec::with_capacity(n);
        let mut max = Vec::with_capacity(n);
        for i in 0..n {
            let t = i as f32 / n as f32;
            let envelope = (t * std::f32::consts::PI).sin();
            let wobble = (t * 61.0).sin() * 0.4 + 0.6;
            let amp = (envelope * wobble).abs();
            min.push(-amp);
            max.push(amp);
        }
        Some(WaveformPeaks { min, max })
    }

    fn duration_bars(&self, container_id: u64) -> Option<f64> {
        if container_id % 2 == 0 { Some(16.0) } else { None }
    }
}

struct DemoMidi;

impl MidiProvider for DemoMidi {
    fn notes(&self, container_id: u64) -> Option<Vec<MidiNote>> {
        if container_id % 2 == 0 {
            return None;
        }
        let pitches = [60u8, 63, 67, 70];
        Some(
            (0..16)
                .map(|i| MidiNote {
                    id: 1000 + i,
                    pitch: pitches[(i % 4) as usize],
                    velocity: 100,
                    start_beat: i as f64 * 0.5,
                    duration_beats: 0.5,
                })
                .collect(),
        )
    }
}

fn demo_snapshot(config: &Config) -> Snapshot {
    let mut volume = AutomationLaneState::new(AutomationTarget::TrackVolume);
    volume.points = vec![
        AutomationPoint {
            id: 1,
            position_bars: 0.0,
            value: 0.8,
        },
        AutomationPoint {
            id: 2,
            position_bars: 4.0,
            value: 0.3,
        },
        AutomationPoint {
            id: 3,
            position_bars: 8.0,
            value: 0.9,
        },
    ];

    let audio_track = TrackState {
        id: 1,
        name: "Guitar".to_string(),
        kind: TrackKind::Audio,
        containers: vec![
            ContainerState {
                id: 2,
                name: "Intro".to_string(),
                start_bar: 1.0,
                length_bars: 8.0,
                fade_in: Some(FadeSpec::linear(1.0)),
                color: Some((120, 160, 90)),
                ..Default::default()
            },
            ContainerState {
                id: 4,
                name: "Verse".to_string(),
                start_bar: 10.0,
                length_bars: 8.0,
                fade_out: Some(FadeSpec::linear(2.0)),
                color: Some((90, 140, 180)),
                ..Default::default()
            },
        ],
        automation: vec![volume],
        ..Default::default()
    };

    let midi_track = TrackState {
        id: 2,
        name: "Keys".to_string(),
        kind: TrackKind::Midi,
        containers: vec![ContainerState {
            id: 5,
            name: "Chords".to_string(),
            kind: ContainerKind::Midi,
            start_bar: 3.0,
            length_bars: 8.0,
            color: Some((160, 120, 170)),
            ..Default::default()
        }],
        ..Default::default()
    };

    let mut snapshot = Snapshot {
        tracks: vec![audio_track, midi_track],
        sections: vec![
            SectionState {
                id: 100,
                name: "A".to_string(),
                start_bar: 1.0,
                length_bars: 9.0,
                color: Some((150, 110, 70)),
            },
            SectionState {
                id: 101,
                name: "B".to_string(),
                start_bar: 10.0,
                length_bars: 8.0,
                color: Some((110, 130, 160)),
            },
        ],
        pixels_per_bar: config.grid.pixels_per_bar,
        total_bars: 64,
        snap_enabled: config.grid.snap_enabled,
        ..Default::default()
    };
    snapshot.inline_lanes.insert(2, InlineLaneConfig::default());
    snapshot.expanded_automation.insert(1);
    snapshot
}

/// Applies grid commands back onto the demo snapshot; stands in for the
/// real application's state owner.
fn apply_command(snapshot: &mut Snapshot, next_id: &mut u64, command: GridCommand) {
    fn container_mut(snapshot: &mut Snapshot, id: u64) -> Option<&mut ContainerState> {
        snapshot
            .tracks
            .iter_mut()
            .flat_map(|t| t.containers.iter_mut())
            .find(|c| c.id == id)
    }

    match command {
        GridCommand::SetPlayhead(bar) => snapshot.playhead_bar = bar,
        GridCommand::SelectRange(range) => snapshot.selected_range = Some(range),
        GridCommand::ClearRangeSelection => snapshot.selected_range = None,
        GridCommand::SelectSection(id) => snapshot.selected_section = Some(id),
        GridCommand::SelectContainer { id, additive } => {
            if !additive {
                snapshot.selected_containers.clear();
            }
            snapshot.selected_containers.insert(id);
        }
        GridCommand::ClearContainerSelection => snapshot.selected_containers.clear(),
        GridCommand::MoveContainer {
            id, new_start_bar, ..
        } => {
            if let Some(c) = container_mut(snapshot, id) {
                c.start_bar = new_start_bar;
            }
        }
        GridCommand::ResizeContainerLeft {
            id,
            new_start_bar,
            new_length_bars,
        } => {
            if let Some(c) = container_mut(snapshot, id) {
                c.start_bar = new_start_bar;
                c.length_bars = new_length_bars;
            }
        }
        GridCommand::ResizeContainerRight {
            id,
            new_length_bars,
        } => {
            if let Some(c) = container_mut(snapshot, id) {
                c.length_bars = new_length_bars;
            }
        }
        GridCommand::TrimContainerLeft {
            id,
            new_start_bar,
            new_length_bars,
            new_offset_bars,
        } => {
            if let Some(c) = container_mut(snapshot, id) {
                c.start_bar = new_start_bar;
                c.length_bars = new_length_bars;
                c.audio_offset_bars = new_offset_bars;
            }
        }
        GridCommand::TrimContainerRight {
            id,
            new_length_bars,
        } => {
            if let Some(c) = container_mut(snapshot, id) {
                c.length_bars = new_length_bars;
            }
        }
        GridCommand::SetEnterFade { id, fade } => {
            if let Some(c) = container_mut(snapshot, id) {
                c.fade_in = fade;
            }
        }
        GridCommand::SetExitFade { id, fade } => {
            if let Some(c) = container_mut(snapshot, id) {
                c.fade_out = fade;
            }
        }
        GridCommand::CreateContainer {
            track_id,
            start_bar,
            length_bars,
        } => {
            *next_id += 1;
            let id = *next_id;
            if let Some(track) = snapshot.tracks.iter_mut().find(|t| t.id == track_id) {
                track.containers.push(ContainerState {
                    id,
                    name: format!("Take {}", id),
                    start_bar,
                    length_bars,
                    ..Default::default()
                });
            }
        }
        GridCommand::SetInlineLaneHeight { track_id, height } => {
            if let Some(cfg) = snapshot.inline_lanes.get_mut(&track_id) {
                cfg.height = height;
            }
        }
        GridCommand::ShiftInlinePitchRange {
            track_id,
            delta_semitones,
        } => {
            if let Some(cfg) = snapshot.inline_lanes.get_mut(&track_id) {
                cfg.low_pitch = (cfg.low_pitch as i32 + delta_semitones).clamp(0, 115) as u8;
                cfg.high_pitch = (cfg.high_pitch as i32 + delta_semitones).clamp(12, 127) as u8;
            }
        }
        GridCommand::AddBreakpoint {
            lane,
            position_bars,
            value,
        } => {
            *next_id += 1;
            let id = *next_id;
            if let Some(track) = snapshot.tracks.iter_mut().find(|t| t.id == lane.track_id) {
                if let Some(state) = track
                    .automation
                    .iter_mut()
                    .find(|l| l.target.path() == lane.target_path)
                {
                    state.points.push(AutomationPoint {
                        id,
                        position_bars,
                        value,
                    });
                }
            }
        }
        GridCommand::UpdateBreakpoint {
            lane,
            point_id,
            position_bars,
            value,
        } => {
            if let Some(track) = snapshot.tracks.iter_mut().find(|t| t.id == lane.track_id) {
                if let Some(state) = track
                    .automation
                    .iter_mut()
                    .find(|l| l.target.path() == lane.target_path)
                {
                    if let Some(p) = state.points.iter_mut().find(|p| p.id == point_id) {
                        p.position_bars = position_bars;
                        p.value = value;
                    }
                }
            }
        }
        other => log::debug!("demo sink ignoring {:?}", other),
    }
}

struct DemoApp {
    window: Option<Arc<Window>>,
    view: Option<GridView>,
    snapshot: Snapshot,
    next_id: u64,
    command_tx: crossbeam_channel::Sender<GridCommand>,
    command_rx: crossbeam_channel::Receiver<GridCommand>,
    cursor: Point,
    modifiers: ModifiersState,
}

impl DemoApp {
    fn new(config: &Config) -> Self {
        let (command_tx, command_rx) = crossbeam_channel::unbounded::<GridCommand>();
        Self {
            window: None,
            view: None,
            snapshot: demo_snapshot(config),
            next_id: 10_000,
            command_tx,
            command_rx,
            cursor: Point::ZERO,
            modifiers: ModifiersState::empty(),
        }
    }

    fn grid_modifiers(&self) -> Modifiers {
        Modifiers {
            fine: self.modifiers.shift_key(),
            duplicate: self.modifiers.alt_key(),
            additive: self.modifiers.control_key(),
            create: self.modifiers.super_key(),
            pitch_pan: self.modifiers.alt_key(),
            row_height: self.modifiers.control_key(),
        }
    }

    fn drain_commands(&mut self) {
        let mut changed = false;
        while let Ok(command) = self.command_rx.try_recv() {
            log::info!("command: {:?}", command);
            apply_command(&mut self.snapshot, &mut self.next_id, command);
            changed = true;
        }
        if changed {
            if let Some(view) = &mut self.view {
                view.configure(self.snapshot.clone());
            }
        }
    }
}

impl ApplicationHandler for DemoApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attributes = Window::default_attributes()
            .with_title("arrangegrid")
            .with_inner_size(winit::dpi::LogicalSize::new(1280.0, 720.0));
        let window = match event_loop.create_window(attributes) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("window creation failed: {e}");
                event_loop.exit();
                return;
            }
        };

        let mut view = GridView::new(Box::new(DemoWaveforms), Box::new(DemoMidi));
        match RenderEngine::new(window.clone()) {
            Ok(engine) => view.attach_engine(engine),
            Err(e) => {
                log::error!("render engine init failed: {e}");
                event_loop.exit();
                return;
            }
        }
        view.configure(self.snapshot.clone());
        self.view = Some(view);
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(view) = &mut self.view {
                    view.resize(size.width, size.height);
                }
            }
            WindowEvent::ModifiersChanged(mods) => {
                self.modifiers = mods.state();
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Point::new(position.x as f32, position.y as f32);
                let mods = self.grid_modifiers();
                if let Some(view) = &mut self.view {
                    view.pointer_move(self.cursor, mods, &self.command_tx);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    let mods = self.grid_modifiers();
                    let cursor = self.cursor;
                    if let Some(view) = &mut self.view {
                        match state {
                            ElementState::Pressed => {
                                view.pointer_down(cursor, mods, &self.command_tx);
                            }
                            ElementState::Released => {
                                view.pointer_up(cursor, mods, &self.command_tx);
                            }
                        }
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let (dx, dy) = match delta {
                    MouseScrollDelta::LineDelta(x, y) => (x * 24.0, y * 24.0),
                    MouseScrollDelta::PixelDelta(p) => (p.x as f32, p.y as f32),
                };
                let mods = self.grid_modifiers();
                if let Some(view) = &mut self.view {
                    view.scroll(self.cursor, dx, dy, mods, &self.command_tx);
                }
            }
            WindowEvent::PinchGesture { delta, .. } => {
                let cursor = self.cursor;
                if let Some(view) = &mut self.view {
                    view.magnify(cursor, delta as f32, &self.command_tx);
                }
            }
            WindowEvent::Focused(false) => {
                if let Some(view) = &mut self.view {
                    view.cancel_interaction();
                }
            }
            WindowEvent::RedrawRequested => {
                self.drain_commands();
                if let Some(view) = &mut self.view {
                    if let Err(e) = view.redraw() {
                        log::error!("redraw failed: {e}");
                    }
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("starting arrangegrid demo");

    let config = Config::load().unwrap_or_default();
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = DemoApp::new(&config);
    event_loop.run_app(&mut app)?;
    Ok(())
}
