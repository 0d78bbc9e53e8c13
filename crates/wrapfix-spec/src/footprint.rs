//! UV footprints and the integer cell windows they cover.

use serde::{Deserialize, Serialize};

use crate::error::UnsupportedFootprintError;

/// A texture axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Horizontal (U).
    S,
    /// Vertical (V).
    T,
}

impl Axis {
    /// Both axes, S first.
    pub const ALL: [Axis; 2] = [Axis::S, Axis::T];
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::S => write!(f, "S"),
            Axis::T => write!(f, "T"),
        }
    }
}

/// Closed coordinate range on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    /// Creates a range, ordering the bounds.
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Returns true if the range lies inside [0, 1].
    pub fn within_unit(&self) -> bool {
        self.min >= 0.0 && self.max <= 1.0
    }

    /// Integer cells `[floor(min), ceil(max))` the range touches, at least one wide.
    pub fn cell_window(&self) -> CellWindow {
        let start = self.min.floor() as i32;
        let end = (self.max.ceil() as i32).max(start + 1);
        CellWindow { start, end }
    }

    /// Smallest range covering both.
    pub fn union(&self, other: &AxisRange) -> AxisRange {
        AxisRange {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Half-open run of integer UV cells `[start, end)` on one axis.
///
/// Cell `k` covers coordinates `[k, k + 1)`. Cell 0 is the source image itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellWindow {
    pub start: i32,
    pub end: i32,
}

impl CellWindow {
    /// The single cell `[0, 1)`.
    pub const UNIT: CellWindow = CellWindow { start: 0, end: 1 };

    /// Number of cells.
    pub fn len(&self) -> u32 {
        (self.end - self.start).max(0) as u32
    }

    /// Returns true if the window holds no cells.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Returns true if any covered cell index is odd.
    pub fn touches_odd_cell(&self) -> bool {
        (self.start..self.end).any(|k| k.rem_euclid(2) == 1)
    }

    /// Smallest window covering both.
    pub fn union(&self, other: &CellWindow) -> CellWindow {
        CellWindow {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Iterates over the covered cell indices.
    pub fn cells(&self) -> std::ops::Range<i32> {
        self.start..self.end
    }
}

/// Axis-aligned UV range sampled by the faces bound to one texture usage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UvFootprint {
    pub s: AxisRange,
    pub t: AxisRange,
}

impl UvFootprint {
    /// Lowest coordinate the condensation path can reproduce.
    pub const CONDENSABLE_MIN: f64 = -1.0;
    /// Highest coordinate the condensation path can reproduce.
    pub const CONDENSABLE_MAX: f64 = 2.0;

    /// Creates a footprint from per-axis bounds.
    pub fn new(s_min: f64, s_max: f64, t_min: f64, t_max: f64) -> Self {
        Self {
            s: AxisRange::new(s_min, s_max),
            t: AxisRange::new(t_min, t_max),
        }
    }

    /// The unit square.
    pub fn unit() -> Self {
        Self::new(0.0, 1.0, 0.0, 1.0)
    }

    /// Bounding footprint of a set of UV points, or `None` when empty.
    ///
    /// Non-finite coordinates are skipped.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = [f64; 2]>,
    {
        let mut footprint: Option<UvFootprint> = None;
        for [u, v] in points {
            if !u.is_finite() || !v.is_finite() {
                continue;
            }
            let point = UvFootprint::new(u, u, v, v);
            footprint = Some(match footprint {
                Some(f) => f.union(&point),
                None => point,
            });
        }
        footprint
    }

    /// Range on the given axis.
    pub fn axis(&self, axis: Axis) -> AxisRange {
        match axis {
            Axis::S => self.s,
            Axis::T => self.t,
        }
    }

    /// Returns true if the footprint lies inside [0,1]x[0,1].
    ///
    /// Such a footprint samples identically under every wrap mode.
    pub fn within_unit(&self) -> bool {
        self.s.within_unit() && self.t.within_unit()
    }

    /// Smallest footprint covering both.
    pub fn union(&self, other: &UvFootprint) -> UvFootprint {
        UvFootprint {
            s: self.s.union(&other.s),
            t: self.t.union(&other.t),
        }
    }

    /// Returns true if condensation can reproduce sampling over this footprint.
    pub fn is_condensable(&self) -> bool {
        Axis::ALL.iter().all(|&axis| {
            let range = self.axis(axis);
            range.min >= Self::CONDENSABLE_MIN && range.max <= Self::CONDENSABLE_MAX
        })
    }

    /// Fails with [`UnsupportedFootprintError`] unless the footprint is condensable.
    pub fn ensure_condensable(
        &self,
        subject: impl Into<String>,
    ) -> Result<(), UnsupportedFootprintError> {
        if self.is_condensable() {
            Ok(())
        } else {
            Err(UnsupportedFootprintError {
                subject: subject.into(),
                footprint: *self,
            })
        }
    }
}

impl std::fmt::Display for UvFootprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}]x[{}, {}]",
            self.s.min, self.s.max, self.t.min, self.t.max
        )
    }
}
