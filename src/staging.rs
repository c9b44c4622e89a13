//! Host staging buffers for the strided halo plates.
//!
//! The y faces stage through a pair of XZ plates, the x faces through a pair
//! of YZ plates; front/back need no staging because their slabs are
//! contiguous. Buffers are sized for the widest plate each slot can carry,
//! allocated once, and freed once on release. A plate is logically owned by
//! its face: the caller must not have two transfers of the same face in
//! flight at once, since there is no double-buffering.

use crate::config::GridConfig;
use crate::geometry::{Axis, HaloWidths};
use crate::halo_error::HaloError;
use bytemuck::Pod;
use serde::{Deserialize, Serialize};

/// Which two axes a staged plate spans.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisPair {
    /// Full-x, interior-z plates: the bottom/top (y) faces.
    Xz,
    /// Interior-y, interior-z plates: the left/right (x) faces.
    Yz,
}

impl AxisPair {
    #[inline]
    fn index(self) -> usize {
        match self {
            AxisPair::Xz => 0,
            AxisPair::Yz => 1,
        }
    }
}

/// Low-index or high-index side of an axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Bot,
    Top,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Bot, Side::Top];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Side::Bot => 0,
            Side::Top => 1,
        }
    }
}

/// Owner of the four staged-plate buffers.
///
/// Construction computes sizes and allocates; allocation failure is fatal for
/// the engine and surfaces as [`HaloError::StagingAlloc`]. Re-running
/// [`ensure_allocated`](Self::ensure_allocated) is a no-op for buffers that
/// already exist, so initialization is idempotent but the sizes fixed at
/// first allocation persist. [`release`](Self::release) frees all buffers and
/// is itself an idempotent no-op when repeated.
#[derive(Debug)]
pub struct StagingPool<V> {
    sizes: [[usize; 2]; 2],
    plates: [[Option<Vec<V>>; 2]; 2],
    released: bool,
}

impl<V: Pod> StagingPool<V> {
    /// Size and allocate the four plates for the given geometry.
    pub fn new(cfg: &GridConfig, widths: &HaloWidths) -> Result<Self, HaloError> {
        let mx = cfg.padded_extent(Axis::X);
        let [_, ny, nz] = cfg.interior;
        let mut sizes = [[0usize; 2]; 2];
        for side in Side::BOTH {
            let i = side.index();
            let wy = [widths.y.bot, widths.y.top][i];
            let wx = [widths.x.bot, widths.x.top][i];
            sizes[AxisPair::Xz.index()][i] = mx * nz * wy * cfg.fields;
            sizes[AxisPair::Yz.index()][i] = ny * nz * wx * cfg.fields;
        }
        let mut pool = StagingPool {
            sizes,
            plates: [[None, None], [None, None]],
            released: false,
        };
        pool.ensure_allocated()?;
        log::debug!(
            "staging plates allocated: xz={:?} yz={:?} elements",
            pool.sizes[0],
            pool.sizes[1]
        );
        Ok(pool)
    }

    /// Allocate any plate that is not currently allocated.
    ///
    /// Safe to call repeatedly; existing buffers are never reallocated, so
    /// their addresses are stable across calls.
    pub fn ensure_allocated(&mut self) -> Result<(), HaloError> {
        for pair in 0..2 {
            for side in 0..2 {
                if self.plates[pair][side].is_none() {
                    self.plates[pair][side] = Some(Self::alloc(self.sizes[pair][side])?);
                }
            }
        }
        self.released = false;
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.debug_assert_invariants();
        Ok(())
    }

    #[cfg(any(debug_assertions, feature = "check-invariants"))]
    fn debug_assert_invariants(&self) {
        for pair in 0..2 {
            for side in 0..2 {
                if let Some(plate) = &self.plates[pair][side] {
                    debug_assert_eq!(plate.len(), self.sizes[pair][side]);
                }
            }
        }
    }

    fn alloc(elems: usize) -> Result<Vec<V>, HaloError> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(elems)
            .map_err(|_| HaloError::StagingAlloc { elems })?;
        buf.resize(elems, V::zeroed());
        Ok(buf)
    }

    /// Element capacity of one plate slot.
    #[inline]
    pub fn plate_len(&self, pair: AxisPair, side: Side) -> usize {
        self.sizes[pair.index()][side.index()]
    }

    /// Borrow one plate.
    ///
    /// # Errors
    /// [`HaloError::StagingReleased`] after [`release`](Self::release).
    pub fn plate(&self, pair: AxisPair, side: Side) -> Result<&[V], HaloError> {
        self.plates[pair.index()][side.index()]
            .as_deref()
            .ok_or(HaloError::StagingReleased)
    }

    /// Borrow one plate mutably.
    ///
    /// # Errors
    /// [`HaloError::StagingReleased`] after [`release`](Self::release).
    pub fn plate_mut(&mut self, pair: AxisPair, side: Side) -> Result<&mut [V], HaloError> {
        self.plates[pair.index()][side.index()]
            .as_deref_mut()
            .ok_or(HaloError::StagingReleased)
    }

    /// Free all plates. Repeating is a safe no-op.
    pub fn release(&mut self) {
        if self.released {
            log::warn!("staging pool released twice");
            return;
        }
        for pair in &mut self.plates {
            for plate in pair {
                *plate = None;
            }
        }
        self.released = true;
    }

    /// Whether the pool has been released.
    #[inline]
    pub fn is_released(&self) -> bool {
        self.released
    }
}
