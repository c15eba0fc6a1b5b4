//! Cross-component properties: determinism, rebuild skipping, picking
//! against draw order, and the pointer round trips.

use std::cell::RefCell;

use arrangegrid::constants::{
    CONTENT_BOTTOM_PADDING, DEFAULT_TRACK_HEIGHT, MIN_CONTAINER_BARS,
};
use arrangegrid::geometry::Point;
use arrangegrid::host::GridView;
use arrangegrid::interaction::Modifiers;
use arrangegrid::messages::{CommandSink, GridCommand};
use arrangegrid::model::{
    AutomationLaneState, AutomationPoint, AutomationTarget, ContainerState, Snapshot, TrackState,
};
use arrangegrid::picking::{ContainerZone, Pick, PickingEngine};
use arrangegrid::providers::EmptyProvider;
use arrangegrid::scene::{SceneBuilder, Viewport};

#[derive(Default)]
struct VecSink {
    sent: RefCell<Vec<GridCommand>>,
}

impl CommandSink for VecSink {
    fn send(&self, command: GridCommand) {
        self.sent.borrow_mut().push(command);
    }
}

fn one_track_snapshot() -> Snapshot {
    let track = TrackState {
        id: 1,
        containers: vec![ContainerState {
            id: 10,
            start_bar: 1.0,
            length_bars: 4.0,
            ..Default::default()
        }],
        ..Default::default()
    };
    Snapshot {
        tracks: vec![track],
        pixels_per_bar: 40.0,
        show_headers: false,
        grid_snap_bars: 1.0,
        ..Default::default()
    }
}

fn viewport() -> Viewport {
    Viewport {
        width: 800.0,
        height: 600.0,
        ..Default::default()
    }
}

#[test]
fn scene_build_is_deterministic_field_for_field() {
    let mut snapshot = one_track_snapshot();
    let mut lane = AutomationLaneState::new(AutomationTarget::TrackVolume);
    lane.points.push(AutomationPoint {
        id: 1,
        position_bars: 2.0,
        value: 0.7,
    });
    snapshot.tracks[0].automation.push(lane);
    snapshot.expanded_automation.insert(1);

    let a = SceneBuilder::build(&snapshot, &EmptyProvider, &EmptyProvider);
    let b = SceneBuilder::build(&snapshot, &EmptyProvider, &EmptyProvider);
    assert_eq!(a, b);
}

#[test]
fn equal_snapshots_do_not_rebuild_geometry() {
    let mut view = GridView::new(Box::new(EmptyProvider), Box::new(EmptyProvider));
    view.configure(one_track_snapshot());
    view.configure(one_track_snapshot());
    view.configure(one_track_snapshot());
    assert_eq!(view.rebuild_count(), 1);
}

#[test]
fn empty_snapshot_with_hidden_headers() {
    let snapshot = Snapshot {
        show_headers: false,
        ..Default::default()
    };
    let scene = SceneBuilder::build(&snapshot, &EmptyProvider, &EmptyProvider);
    assert_eq!(scene.content_height, CONTENT_BOTTOM_PADDING);
    let pick = PickingEngine::pick(Point::new(50.0, 50.0), &scene, &snapshot, &viewport());
    assert_eq!(pick, Pick::None);
}

#[test]
fn container_wins_over_track_background() {
    let snapshot = one_track_snapshot();
    let scene = SceneBuilder::build(&snapshot, &EmptyProvider, &EmptyProvider);
    let mid_y = DEFAULT_TRACK_HEIGHT / 2.0;

    match PickingEngine::pick(Point::new(10.0, mid_y), &scene, &snapshot, &viewport()) {
        Pick::ContainerZone { zone, .. } => {
            assert!(zone == ContainerZone::Move || zone == ContainerZone::Selector);
        }
        other => panic!("expected container zone, got {:?}", other),
    }

    match PickingEngine::pick(Point::new(155.0, mid_y), &scene, &snapshot, &viewport()) {
        Pick::ContainerZone { zone, .. } => assert_eq!(zone, ContainerZone::ResizeRight),
        other => panic!("expected resize-right, got {:?}", other),
    }
}

#[test]
fn resize_drag_round_trip() {
    // the worked example: ppb=40, container 1..5, drag right edge 155 -> 195
    let snapshot = one_track_snapshot();
    let mut view = GridView::new(Box::new(EmptyProvider), Box::new(EmptyProvider));
    view.configure(snapshot);
    view.resize(800, 600);

    let sink = VecSink::default();
    let mods = Modifiers::default();
    let mid_y = DEFAULT_TRACK_HEIGHT / 2.0;
    view.pointer_down(Point::new(155.0, mid_y), mods, &sink);
    view.pointer_move(Point::new(195.0, mid_y), mods, &sink);
    view.pointer_up(Point::new(195.0, mid_y), mods, &sink);

    assert_eq!(
        sink.sent.into_inner(),
        vec![GridCommand::ResizeContainerRight {
            id: 10,
            new_length_bars: 5.0
        }]
    );
}

#[test]
fn move_drag_round_trip_lands_on_grid() {
    let snapshot = one_track_snapshot();
    let mut view = GridView::new(Box::new(EmptyProvider), Box::new(EmptyProvider));
    view.configure(snapshot);
    view.resize(800, 600);

    let sink = VecSink::default();
    let mods = Modifiers::default();
    let mid_y = DEFAULT_TRACK_HEIGHT / 2.0;
    // dx of exactly 3 bars
    view.pointer_down(Point::new(20.0, mid_y), mods, &sink);
    view.pointer_move(Point::new(140.0, mid_y), mods, &sink);
    view.pointer_up(Point::new(140.0, mid_y), mods, &sink);

    assert_eq!(
        sink.sent.into_inner(),
        vec![GridCommand::MoveContainer {
            id: 10,
            track_id: 1,
            new_start_bar: 4.0
        }]
    );
}

#[test]
fn minimum_length_always_clamped() {
    let snapshot = one_track_snapshot();
    let mut view = GridView::new(Box::new(EmptyProvider), Box::new(EmptyProvider));
    view.configure(snapshot);
    view.resize(800, 600);

    let sink = VecSink::default();
    let mods = Modifiers::default();
    let mid_y = DEFAULT_TRACK_HEIGHT / 2.0;
    view.pointer_down(Point::new(155.0, mid_y), mods, &sink);
    view.pointer_move(Point::new(-300.0, mid_y), mods, &sink);
    view.pointer_up(Point::new(-300.0, mid_y), mods, &sink);

    match &sink.sent.into_inner()[0] {
        GridCommand::ResizeContainerRight {
            new_length_bars, ..
        } => assert_eq!(*new_length_bars, MIN_CONTAINER_BARS),
        other => panic!("expected resize, got {:?}", other),
    }
}

#[test]
fn breakpoint_handle_beats_segment_within_radius() {
    let mut snapshot = one_track_snapshot();
    let mut lane = AutomationLaneState::new(AutomationTarget::TrackVolume);
    lane.points.push(AutomationPoint {
        id: 42,
        position_bars: 1.0,
        value: 0.5,
    });
    snapshot.tracks[0].automation.push(lane);
    snapshot.expanded_automation.insert(1);

    let scene = SceneBuilder::build(&snapshot, &EmptyProvider, &EmptyProvider);
    let lane_rect = scene.tracks[0].lanes[0].rect;
    let x = 80.0; // owner start 1 + 1 bar at 40 px/bar
    let y = lane_rect.bottom() - 0.5 * lane_rect.height;

    match PickingEngine::pick(Point::new(x, y + 1.0), &scene, &snapshot, &viewport()) {
        Pick::AutomationBreakpoint { point_id, .. } => assert_eq!(point_id, 42),
        other => panic!("expected breakpoint, got {:?}", other),
    }
    // 10 px below the handle is outside the lane: no breakpoint, no segment
    let below = PickingEngine::pick(
        Point::new(x, lane_rect.bottom() + 10.0),
        &scene,
        &snapshot,
        &viewport(),
    );
    assert!(!matches!(below, Pick::AutomationBreakpoint { .. }));
}
