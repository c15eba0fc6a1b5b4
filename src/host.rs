//! Thin host adapter: owns the scene cache, hover state and viewport, and
//! forwards input into the interaction controller. The GPU engine is
//! optional so the full input/layout path runs headless in tests.

use crate::geometry::Point;
use crate::interaction::{InteractionController, InteractionState, Modifiers};
use crate::messages::CommandSink;
use crate::model::Snapshot;
use crate::picking::{Pick, PickingEngine};
use crate::providers::{Diagnostics, MidiProvider, NullDiagnostics, WaveformProvider};
use crate::render::instances::ortho_projection;
use crate::render::{FocusState, FrameBuffers, FrameBuilder, Globals, RenderEngine};
use crate::scene::{Scene, SceneBuilder, Viewport};

pub struct GridView {
    engine: Option<RenderEngine>,
    waveforms: Box<dyn WaveformProvider>,
    midi: Box<dyn MidiProvider>,
    diagnostics: Box<dyn Diagnostics>,

    snapshot: Snapshot,
    scene: Scene,
    rebuild_count: u64,
    geometry_dirty: bool,
    frame: FrameBuffers,

    controller: InteractionController,
    viewport: Viewport,
    hover_id: u64,
    pub auto_scroll: bool,
}

impl GridView {
    pub fn new(
        waveforms: Box<dyn WaveformProvider>,
        midi: Box<dyn MidiProvider>,
    ) -> Self {
        Self {
            engine: None,
            waveforms,
            midi,
            diagnostics: Box::new(NullDiagnostics),
            snapshot: Snapshot::default(),
            scene: Scene::default(),
            rebuild_count: 0,
            geometry_dirty: true,
            frame: FrameBuffers::default(),
            controller: InteractionController::new(),
            viewport: Viewport::default(),
            hover_id: Pick::NONE_ID,
            auto_scroll: false,
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Box<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn attach_engine(&mut self, engine: RenderEngine) {
        let (w, h) = engine.surface_size();
        self.viewport.width = w as f32;
        self.viewport.height = h as f32;
        self.engine = Some(engine);
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn rebuild_count(&self) -> u64 {
        self.rebuild_count
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    /// Push a new frame's data in. The scene is rebuilt only when the
    /// snapshot actually changed.
    pub fn configure(&mut self, snapshot: Snapshot) {
        if snapshot == self.snapshot && self.rebuild_count > 0 {
            return;
        }
        self.scene = SceneBuilder::build(&snapshot, &*self.waveforms, &*self.midi);
        self.snapshot = snapshot;
        self.rebuild_count += 1;
        self.geometry_dirty = true;
        self.diagnostics.counter("scene_rebuilds", self.rebuild_count);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(engine) = &mut self.engine {
            engine.resize(width, height);
        }
        self.viewport.width = width as f32;
        self.viewport.height = height as f32;
        self.geometry_dirty = true;
    }

    /// Build (if dirty), encode and present one frame.
    pub fn redraw(&mut self) -> crate::error::Result<()> {
        if self.auto_scroll {
            self.follow_playhead();
        }
        if self.geometry_dirty {
            self.frame = FrameBuilder::build(
                &self.scene,
                &self.snapshot,
                &self.viewport,
                FocusState {
                    hover_id: self.hover_id,
                },
            );
            if let Some(engine) = &mut self.engine {
                engine.upload_frame(&self.frame);
            }
            self.geometry_dirty = false;
        }

        let overlay = FrameBuilder::build_overlay(
            &self.scene,
            &self.snapshot,
            &self.viewport,
            self.controller.state(),
        );

        if let Some(engine) = &mut self.engine {
            let globals = Globals {
                projection: ortho_projection(self.viewport.width, self.viewport.height),
                pixels_per_bar: self.snapshot.pixels_per_bar,
                canvas_height: self.scene.content_height,
                view_min_x: self.viewport.visible_min_x(),
                view_max_x: self.viewport.visible_max_x(),
            };
            let drawn = engine.render(&self.frame, &overlay, globals)?;
            if !drawn {
                self.diagnostics.counter("skipped_frames", engine.skipped_frames());
            }
        }
        Ok(())
    }

    pub fn pointer_down(&mut self, pos: Point, mods: Modifiers, sink: &dyn CommandSink) {
        self.controller
            .pointer_down(pos, mods, &self.scene, &self.snapshot, &self.viewport, sink);
    }

    pub fn pointer_move(&mut self, pos: Point, mods: Modifiers, sink: &dyn CommandSink) {
        if self.controller.is_idle() {
            // Hover re-pick is suppressed during drags; the focus highlight
            // freezes until pointer-up. See DESIGN.md before changing this.
            let pick = PickingEngine::pick(pos, &self.scene, &self.snapshot, &self.viewport);
            let id = pick.id();
            if id != self.hover_id {
                self.hover_id = id;
                self.geometry_dirty = true;
            }
        } else {
            self.controller
                .pointer_drag(pos, mods, &self.scene, &self.snapshot, &self.viewport, sink);
        }
    }

    pub fn pointer_up(&mut self, pos: Point, mods: Modifiers, sink: &dyn CommandSink) {
        self.controller
            .pointer_up(pos, mods, &self.scene, &self.snapshot, &self.viewport, sink);
    }

    pub fn cancel_interaction(&mut self) {
        self.controller.cancel();
    }

    /// Two-finger scroll. Inline-lane gestures win; everything else pans
    /// the canvas.
    pub fn scroll(&mut self, pos: Point, dx: f32, dy: f32, mods: Modifiers, sink: &dyn CommandSink) {
        if self
            .controller
            .scroll(pos, dy, mods, &self.scene, &self.viewport, sink)
        {
            return;
        }
        let max_x = (self.scene.content_width - self.viewport.width).max(0.0);
        let max_y = (self.scene.content_height - self.viewport.height).max(0.0);
        let new_x = (self.viewport.scroll_x - dx).clamp(0.0, max_x);
        let new_y = (self.viewport.scroll_y - dy).clamp(0.0, max_y);
        if new_x != self.viewport.scroll_x || new_y != self.viewport.scroll_y {
            self.viewport.scroll_x = new_x;
            self.viewport.scroll_y = new_y;
            self.geometry_dirty = true;
        }
    }

    /// Pinch gesture. Returns true when the gesture was consumed by an
    /// inline lane; canvas zoom is the owning application's call (zoom
    /// level arrives through the snapshot).
    pub fn magnify(&mut self, pos: Point, delta: f32, sink: &dyn CommandSink) -> bool {
        self.controller
            .magnify(pos, delta, &self.scene, &self.viewport, sink)
    }

    fn follow_playhead(&mut self) {
        let conv = crate::time_utils::BarConverter::new(
            self.snapshot.pixels_per_bar,
            self.snapshot.time_signature.beats_per_bar,
        );
        let x = conv.bar_to_x(self.snapshot.playhead_bar);
        let margin = self.viewport.width * 0.2;
        if x > self.viewport.scroll_x + self.viewport.width - margin {
            let max_x = (self.scene.content_width - self.viewport.width).max(0.0);
            let new_x = (x - (self.viewport.width - margin)).clamp(0.0, max_x);
            if new_x != self.viewport.scroll_x {
                self.viewport.scroll_x = new_x;
                self.geometry_dirty = true;
            }
        }
    }

    pub fn hover_id(&self) -> u64 {
        self.hover_id
    }

    /// Current interaction state, for hosts that render their own chrome.
    pub fn interaction_state(&self) -> &InteractionState {
        self.controller.state()
    }

    pub fn set_shape_tool(&mut self, tool: Option<crate::interaction::ShapeTool>) {
        self.controller.set_shape_tool(tool);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContainerState, TrackState};
    use crate::providers::EmptyProvider;

    fn snapshot() -> Snapshot {
        let track = TrackState {
            id: 1,
            containers: vec![ContainerState {
                id: 10,
                ..Default::default()
            }],
            ..Default::default()
        };
        Snapshot {
            tracks: vec![track],
            ..Default::default()
        }
    }

    #[test]
    fn equal_snapshots_skip_rebuild() {
        let mut view = GridView::new(Box::new(EmptyProvider), Box::new(EmptyProvider));
        view.configure(snapshot());
        assert_eq!(view.rebuild_count(), 1);
        view.configure(snapshot());
        assert_eq!(view.rebuild_count(), 1);

        let mut changed = snapshot();
        changed.tracks[0].containers[0].start_bar = 3.0;
        view.configure(changed);
        assert_eq!(view.rebuild_count(), 2);
    }

    #[test]
    fn hover_freezes_during_drag() {
        let mut view = GridView::new(Box::new(EmptyProvider), Box::new(EmptyProvider));
        let mut snap = snapshot();
        snap.show_headers = false;
        view.configure(snap);
        view.resize(800, 600);

        let sink = crate::messages::test_support::RecordingSink::default();
        let mods = Modifiers::default();
        view.pointer_move(Point::new(10.0, 40.0), mods, &sink);
        let hover_before = view.hover_id();
        assert_ne!(hover_before, Pick::NONE_ID);

        view.pointer_down(Point::new(80.0, 40.0), mods, &sink);
        assert!(!view.controller().is_idle());
        // moving across a zone boundary does not re-pick while dragging
        view.pointer_move(Point::new(300.0, 40.0), mods, &sink);
        assert_eq!(view.hover_id(), hover_before);

        view.pointer_up(Point::new(300.0, 40.0), mods, &sink);
        assert!(view.controller().is_idle());
    }

    #[test]
    fn redraw_without_engine_is_headless() {
        let mut view = GridView::new(Box::new(EmptyProvider), Box::new(EmptyProvider));
        view.configure(snapshot());
        view.resize(800, 600);
        view.redraw().unwrap();
    }
}
