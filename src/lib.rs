//! # gpu-halo
//!
//! gpu-halo moves the boundary ("halo") layers of a structured 3-D grid
//! between a host-resident mesh and an accelerator mirror for PDE solvers
//! that advance on the device. Each subdomain of the decomposition refreshes
//! its outer ghost layers from neighbor data before a step and exports its
//! freshly computed inner boundary layers afterwards; this crate owns the
//! geometry of those twelve face-wise transfers and the host staging buffers
//! that linearize the strided ones.
//!
//! ## Features
//! - Per-axis halo width resolution from periodicity and decomposition
//!   position, including the widened one-sided boundary stencils
//! - Direct bulk copies for the memory-contiguous z faces, staged
//!   gather/scatter plates for the x and y faces
//! - Per-face asynchronous execution channels so the six stores overlap
//! - A pluggable [`DeviceLink`](device::DeviceLink) backend seam with an
//!   in-process mirror for testing host integrations without an accelerator
//!
//! ## Scope
//! Mesh allocation, the neighbor-exchange communication layer, and the device
//! kernels themselves live behind stable interfaces; this crate only issues
//! transfers. Load balancing across channels is not attempted.
//!
//! ## Determinism
//! Geometry resolution is a pure function of the configuration; the batched
//! drivers issue faces in a fixed order. Tests that need randomness use
//! `SmallRng` with fixed seeds.

// Re-export our major subsystems:
pub mod channel;
pub mod config;
pub mod device;
pub mod geometry;
pub mod halo_error;
pub mod mesh;
pub mod plate;
pub mod staging;
pub mod transfer;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::channel::{CHANNEL_COUNT, ChannelId};
    pub use crate::config::GridConfig;
    pub use crate::device::{DeviceLink, InProcessDevice, NullDevice};
    pub use crate::geometry::{Axis, AxisWidths, CoordBox, HaloWidths};
    pub use crate::halo_error::HaloError;
    pub use crate::mesh::MeshBuffer;
    pub use crate::staging::{AxisPair, Side, StagingPool};
    pub use crate::transfer::{Face, HaloTransfer};
}
