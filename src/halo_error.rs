//! HaloError: unified error type for gpu-halo public APIs
//!
//! Every fallible operation in the crate reports through this enum; a failed
//! transfer is never silently skipped, since continuing a solver step with
//! partial halo data would corrupt the result.

use crate::geometry::Axis;
use thiserror::Error;

/// Unified error type for halo-transfer operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HaloError {
    /// Interior grid extent of zero along some axis.
    #[error("interior extent along {axis} must be non-zero")]
    EmptyExtent { axis: Axis },
    /// Ghost-zone depth of zero makes every halo empty.
    #[error("ghost depth must be non-zero")]
    ZeroGhostDepth,
    /// A mesh with no fields has nothing to transfer.
    #[error("field count must be non-zero")]
    ZeroFieldCount,
    /// A resolved halo width came out non-positive.
    #[error("halo width along {axis} must be positive (bot={bot}, top={top})")]
    InvalidWidth { axis: Axis, bot: usize, top: usize },
    /// Interior extent too small for the resolved halo widths; the inner
    /// transfer boxes would underflow.
    #[error("interior extent {interior} along {axis} does not exceed total halo width {halo}")]
    DomainTooSmall {
        axis: Axis,
        interior: usize,
        halo: usize,
    },
    /// Host allocation of a staging plate failed.
    #[error("failed to allocate staging buffer of {elems} elements")]
    StagingAlloc { elems: usize },
    /// A plate was requested from a pool that has already been released.
    #[error("staging pool already released")]
    StagingReleased,
    /// `start >= end` along some axis of a transfer box.
    #[error("degenerate transfer box along {axis}: start {start} >= end {end}")]
    DegenerateBox {
        axis: Axis,
        start: usize,
        end: usize,
    },
    /// A transfer box reaches past the mesh extents.
    #[error("transfer box exceeds mesh along {axis}: end {end} > extent {extent}")]
    BoxOutOfBounds {
        axis: Axis,
        end: usize,
        extent: usize,
    },
    /// Staging plate cannot hold the packed box.
    #[error("plate buffer too small: need {needed} elements, have {capacity}")]
    PlateTooSmall { needed: usize, capacity: usize },
    /// A bulk region copy reaches past the end of a field.
    #[error("region transfer out of range: offset {offset} + count {count} > field length {len}")]
    RegionOutOfBounds {
        offset: usize,
        count: usize,
        len: usize,
    },
    /// Execution-channel identifier outside the documented range.
    #[error("execution channel {id} out of range (max {max})")]
    ChannelOutOfRange { id: u8, max: u8 },
    /// Mesh extents disagree with the configuration the engine was built from.
    #[error("mesh extents {found:?} do not match configured {expected:?}")]
    ShapeMismatch {
        expected: [usize; 3],
        found: [usize; 3],
    },
    /// Mesh field count disagrees with the configuration.
    #[error("mesh holds {found} fields, configuration expects {expected}")]
    FieldCountMismatch { expected: usize, found: usize },
    /// Failure reported by the device runtime; not retried here.
    #[error("device transfer failed: {0}")]
    Device(String),
}
