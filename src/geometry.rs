//! Halo geometry: axis width triples and transfer boxes.
//!
//! Widths are resolved once from a [`GridConfig`] and are immutable
//! thereafter. All boxes in the crate use one convention: inclusive start,
//! exclusive end. The 1-based inclusive bounds used in solver parameter files
//! translate as `end = last_inclusive_index + 1` and are converted exactly
//! once, here, never at call sites.

use crate::config::GridConfig;
use crate::halo_error::HaloError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Spatial axis of the structured grid. X is fastest-varying in memory.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Position of this axis in `[x, y, z]` coordinate triples.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
        }
    }
}

/// Ghost-layer widths on the two sides of one axis, in cells.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisWidths {
    /// Width on the low-index side.
    pub bot: usize,
    /// Width on the high-index side.
    pub top: usize,
}

impl AxisWidths {
    /// Sum of both sides.
    #[inline]
    pub fn total(&self) -> usize {
        self.bot + self.top
    }
}

/// The three axis width triples of the local subdomain.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaloWidths {
    pub x: AxisWidths,
    pub y: AxisWidths,
    pub z: AxisWidths,
}

impl HaloWidths {
    /// Resolve the widths from periodicity and decomposition position.
    ///
    /// Every side starts at the ghost depth. On a non-periodic axis, the side
    /// facing the global domain edge gains one extra cell for the one-sided
    /// boundary-condition stencil. In Yin-Yang mode only x is widened; the
    /// y/z grid edges belong to the companion grid.
    pub fn resolve(cfg: &GridConfig) -> Self {
        let mut w = [AxisWidths {
            bot: cfg.ghost,
            top: cfg.ghost,
        }; 3];
        for axis in Axis::ALL {
            if cfg.yin_yang && axis != Axis::X {
                continue;
            }
            let i = axis.index();
            if !cfg.periodic[i] {
                if cfg.first[i] {
                    w[i].bot = cfg.ghost + 1;
                }
                if cfg.last[i] {
                    w[i].top = cfg.ghost + 1;
                }
            }
        }
        HaloWidths {
            x: w[0],
            y: w[1],
            z: w[2],
        }
    }

    /// Widths along one axis.
    #[inline]
    pub fn axis(&self, axis: Axis) -> AxisWidths {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Reject widths the transfer boxes cannot be built from.
    ///
    /// # Errors
    /// - [`HaloError::InvalidWidth`] if a side has zero width,
    /// - [`HaloError::DomainTooSmall`] if an interior extent does not exceed
    ///   the total width along its axis (the inner store boxes would then
    ///   collapse to `start >= end`).
    pub fn validate(&self, cfg: &GridConfig) -> Result<(), HaloError> {
        for axis in Axis::ALL {
            let w = self.axis(axis);
            if w.bot == 0 || w.top == 0 {
                return Err(HaloError::InvalidWidth {
                    axis,
                    bot: w.bot,
                    top: w.top,
                });
            }
            let interior = cfg.interior_extent(axis);
            if interior <= w.total() {
                return Err(HaloError::DomainTooSmall {
                    axis,
                    interior,
                    halo: w.total(),
                });
            }
        }
        Ok(())
    }
}

/// A 3-D region of the mesh: inclusive `start`, exclusive `end`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordBox {
    pub start: [usize; 3],
    pub end: [usize; 3],
}

impl CoordBox {
    /// Build a box, rejecting `start >= end` along any axis.
    ///
    /// A degenerate box is always a geometry bug upstream, never a request
    /// for an empty transfer, so it is an error rather than a no-op.
    pub fn new(start: [usize; 3], end: [usize; 3]) -> Result<Self, HaloError> {
        for axis in Axis::ALL {
            let i = axis.index();
            if start[i] >= end[i] {
                return Err(HaloError::DegenerateBox {
                    axis,
                    start: start[i],
                    end: end[i],
                });
            }
        }
        Ok(CoordBox { start, end })
    }

    /// Extent along one axis.
    #[inline]
    pub fn extent(&self, axis: Axis) -> usize {
        let i = axis.index();
        self.end[i] - self.start[i]
    }

    /// Extents along all axes.
    #[inline]
    pub fn extents(&self) -> [usize; 3] {
        [
            self.extent(Axis::X),
            self.extent(Axis::Y),
            self.extent(Axis::Z),
        ]
    }

    /// Cells covered, per field.
    #[inline]
    pub fn cell_count(&self) -> usize {
        let [ex, ey, ez] = self.extents();
        ex * ey * ez
    }

    /// Check that the box lies inside a domain of the given extents.
    pub fn check_within(&self, dims: [usize; 3]) -> Result<(), HaloError> {
        for axis in Axis::ALL {
            let i = axis.index();
            if self.end[i] > dims[i] {
                return Err(HaloError::BoxOutOfBounds {
                    axis,
                    end: self.end[i],
                    extent: dims[i],
                });
            }
        }
        Ok(())
    }
}
