use serde::{Deserialize, Serialize};

/// Section marker pinned in the header row (verse, chorus, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionState {
    pub id: u64,
    pub name: String,
    pub start_bar: f64,
    pub length_bars: f64,
    pub color: Option<(u8, u8, u8)>,
}
