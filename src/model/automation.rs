use serde::{Deserialize, Serialize};

/// Display/guide-line mapping for a lane's parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaneUnit {
    Linear,
    Frequency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AutomationTarget {
    TrackVolume,
    TrackPan,
    TrackSend(u64),
    PluginParam {
        plugin_id: u64,
        param_name: String,
        unit: LaneUnit,
    },
}

impl AutomationTarget {
    /// Stable key used to retain lane identity across scene rebuilds.
    pub fn path(&self) -> String {
        match self {
            AutomationTarget::TrackVolume => "track/volume".to_string(),
            AutomationTarget::TrackPan => "track/pan".to_string(),
            AutomationTarget::TrackSend(dest) => format!("track/send/{}", dest),
            AutomationTarget::PluginParam {
                plugin_id,
                param_name,
                ..
            } => format!("plugin/{}/{}", plugin_id, param_name),
        }
    }

    pub fn unit(&self) -> LaneUnit {
        match self {
            AutomationTarget::PluginParam { unit, .. } => *unit,
            _ => LaneUnit::Linear,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            AutomationTarget::TrackVolume => "Volume".to_string(),
            AutomationTarget::TrackPan => "Pan".to_string(),
            AutomationTarget::TrackSend(dest) => format!("Send {}", dest),
            AutomationTarget::PluginParam { param_name, .. } => param_name.clone(),
        }
    }
}

/// Breakpoint: position along the timeline plus a normalized value.
/// `position_bars` is relative to the lane's owner (container start for
/// container-scoped lanes, bar 1 for track-scoped lanes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutomationPoint {
    pub id: u64,
    pub position_bars: f64,
    pub value: f32,
}

/// Whether a lane belongs to a whole track or to one container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaneScope {
    Track,
    Container(u64),
}

/// Addresses one automation lane across snapshot rebuilds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneRef {
    pub track_id: u64,
    pub scope: LaneScope,
    pub target_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationLaneState {
    pub target: AutomationTarget,
    pub points: Vec<AutomationPoint>,
    pub color: Option<(u8, u8, u8)>,
}

impl AutomationLaneState {
    pub fn new(target: AutomationTarget) -> Self {
        Self {
            target,
            points: Vec::new(),
            color: None,
        }
    }

    /// Points sorted by position. Snapshot order is not guaranteed sorted;
    /// rendering and picking always work on the sorted view.
    pub fn sorted_points(&self) -> Vec<AutomationPoint> {
        let mut pts = self.points.clone();
        pts.sort_by(|a, b| a.position_bars.total_cmp(&b.position_bars));
        pts
    }
}
