//! Grid and decomposition configuration.
//!
//! A [`GridConfig`] is built once at startup from the solver's parameter file
//! and passed by reference into geometry resolution and the transfer engine.
//! It is deliberately a plain immutable value: the widths derived from it are
//! fixed for the lifetime of an engine, and changing the decomposition means
//! building a new engine.

use crate::geometry::Axis;
use crate::halo_error::HaloError;
use serde::{Deserialize, Serialize};

/// Local subdomain geometry plus its position in the global decomposition.
///
/// Extents are in grid cells. `interior` excludes ghost layers; the padded
/// extent along each axis is `interior + 2 * ghost`. `first`/`last` say
/// whether this subdomain touches the global domain boundary along an axis,
/// which (on non-periodic axes) widens the corresponding halo by one cell for
/// the one-sided boundary stencils.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Interior extents (nx, ny, nz), ghost layers excluded.
    pub interior: [usize; 3],
    /// Ghost-zone depth, identical on all six faces before widening.
    pub ghost: usize,
    /// Number of scalar fields carried per grid cell.
    pub fields: usize,
    /// Per-axis global periodicity.
    pub periodic: [bool; 3],
    /// Whether this subdomain is first along each axis of the decomposition.
    pub first: [bool; 3],
    /// Whether this subdomain is last along each axis of the decomposition.
    pub last: [bool; 3],
    /// Yin-Yang composite spherical grid: halo widening applies along x only,
    /// the y/z boundaries being handled by the inter-grid interpolation.
    pub yin_yang: bool,
}

impl GridConfig {
    /// Extents of the padded local domain, ghost layers included.
    #[inline]
    pub fn padded(&self) -> [usize; 3] {
        [
            self.interior[0] + 2 * self.ghost,
            self.interior[1] + 2 * self.ghost,
            self.interior[2] + 2 * self.ghost,
        ]
    }

    /// Padded extent along one axis.
    #[inline]
    pub fn padded_extent(&self, axis: Axis) -> usize {
        self.interior[axis.index()] + 2 * self.ghost
    }

    /// Interior extent along one axis.
    #[inline]
    pub fn interior_extent(&self, axis: Axis) -> usize {
        self.interior[axis.index()]
    }

    /// Cells per field over the padded domain.
    #[inline]
    pub fn vertices_per_field(&self) -> usize {
        let [mx, my, mz] = self.padded();
        mx * my * mz
    }

    /// Reject configurations no transfer geometry can be built from.
    ///
    /// # Errors
    /// - [`HaloError::EmptyExtent`] if any interior extent is zero,
    /// - [`HaloError::ZeroGhostDepth`] / [`HaloError::ZeroFieldCount`] for the
    ///   corresponding zero parameters.
    pub fn validate(&self) -> Result<(), HaloError> {
        for axis in Axis::ALL {
            if self.interior[axis.index()] == 0 {
                return Err(HaloError::EmptyExtent { axis });
            }
        }
        if self.ghost == 0 {
            return Err(HaloError::ZeroGhostDepth);
        }
        if self.fields == 0 {
            return Err(HaloError::ZeroFieldCount);
        }
        Ok(())
    }
}
