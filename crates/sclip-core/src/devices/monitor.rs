use crate::capture::config::monitor_label;

use serde::{Deserialize, Serialize};

/// Position and size of one display in virtual-desktop coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorGeometry {
    /// Left edge; negative for displays left of the primary.
    pub x: i32,
    /// Top edge; negative for displays above the primary.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Host display query.
///
/// The core has no windowing dependency; the application answers this from
/// its event loop. Implementations must be cheap to call repeatedly and must
/// return the current topology rather than a cached one.
pub trait DisplaySource: Send + Sync {
    /// Displays in enumeration order.
    fn displays(&self) -> Vec<MonitorGeometry>;
}

/// Fixed display list, for headless hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticDisplays(Vec<MonitorGeometry>);

impl StaticDisplays {
    /// Wrap a fixed list of displays.
    pub fn new(displays: Vec<MonitorGeometry>) -> Self {
        Self(displays)
    }
}

impl DisplaySource for StaticDisplays {
    fn displays(&self) -> Vec<MonitorGeometry> {
        self.0.clone()
    }
}

/// Monitors keyed by positional label (`Monitor 1`, `Monitor 2`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorMap {
    entries: Vec<(String, MonitorGeometry)>,
}

impl MonitorMap {
    /// Label displays in the order they were enumerated.
    pub fn from_displays(displays: impl IntoIterator<Item = MonitorGeometry>) -> Self {
        let entries = displays
            .into_iter()
            .enumerate()
            .map(|(index, geometry)| (monitor_label(index), geometry))
            .collect();

        Self { entries }
    }

    /// Geometry for `label`, if such a monitor was enumerated.
    pub fn get(&self, label: &str) -> Option<MonitorGeometry> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, geometry)| *geometry)
    }

    /// Zero-based position of `label` in enumeration order.
    pub(crate) fn position(&self, label: &str) -> Option<usize> {
        self.entries.iter().position(|(l, _)| l == label)
    }

    /// Labelled monitors in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, MonitorGeometry)> {
        self.entries.iter().map(|(l, g)| (l.as_str(), *g))
    }

    /// Number of monitors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the host reported no displays.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
