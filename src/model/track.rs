use serde::{Deserialize, Serialize};

use super::automation::AutomationLaneState;
use super::container::ContainerState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    Audio,
    Midi,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackState {
    pub id: u64,
    pub name: String,
    pub kind: TrackKind,
    pub containers: Vec<ContainerState>,
    /// Track-scoped lanes; container-scoped lanes live on the containers.
    pub automation: Vec<AutomationLaneState>,
    pub color: Option<(u8, u8, u8)>,
}

impl Default for TrackState {
    fn default() -> Self {
        Self {
            id: 0,
            name: "Track".to_string(),
            kind: TrackKind::Audio,
            containers: Vec::new(),
            automation: Vec::new(),
            color: None,
        }
    }
}

impl TrackState {
    pub fn container(&self, id: u64) -> Option<&ContainerState> {
        self.containers.iter().find(|c| c.id == id)
    }

    /// Resolve a lane by scope and target path.
    pub fn lane(
        &self,
        scope: super::automation::LaneScope,
        path: &str,
    ) -> Option<&AutomationLaneState> {
        match scope {
            super::automation::LaneScope::Track => {
                self.automation.iter().find(|l| l.target.path() == path)
            }
            super::automation::LaneScope::Container(id) => self
                .container(id)?
                .automation
                .iter()
                .find(|l| l.target.path() == path),
        }
    }

    /// Distinct automation target paths, first-appearance order: track-scoped
    /// lanes first, then container-scoped walking containers in order.
    pub fn automation_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = Vec::new();
        let mut push = |p: String| {
            if !paths.contains(&p) {
                paths.push(p);
            }
        };
        for lane in &self.automation {
            push(lane.target.path());
        }
        for container in &self.containers {
            for lane in &container.automation {
                push(lane.target.path());
            }
        }
        paths
    }
}
