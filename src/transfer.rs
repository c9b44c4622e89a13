//! Face-wise halo transfers between the host mesh and the device mirror.
//!
//! Six loads refresh the outer ghost layers before a solver step, six stores
//! export the freshly computed inner boundary layers afterwards. The z faces
//! (front/back) span the full x/y extents and are contiguous in the mesh
//! layout, so they move as single bulk copies; the y faces stage through the
//! XZ plates and the x faces through the YZ plates. Each face claims a band
//! the previous faces have not covered, so the six slabs tile the halo shell
//! exactly once.

use crate::channel::ChannelId;
use crate::config::GridConfig;
use crate::device::DeviceLink;
use crate::geometry::{CoordBox, HaloWidths};
use crate::halo_error::HaloError;
use crate::mesh::MeshBuffer;
use crate::staging::{AxisPair, Side, StagingPool};
use bytemuck::Pod;
use serde::{Deserialize, Serialize};

/// One of the six faces of the local subdomain.
///
/// Front/back face along z, bottom/top along y, left/right along x, the
/// lower-index side named first in each pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    Front,
    Back,
    Bottom,
    Top,
    Left,
    Right,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::Front,
        Face::Back,
        Face::Bottom,
        Face::Top,
        Face::Left,
        Face::Right,
    ];

    /// Staging route of the face: `None` for the contiguous z faces,
    /// otherwise the plate pair and the buffer side within it.
    #[inline]
    pub fn plate_route(self) -> Option<(AxisPair, Side)> {
        match self {
            Face::Front | Face::Back => None,
            Face::Bottom => Some((AxisPair::Xz, Side::Bot)),
            Face::Top => Some((AxisPair::Xz, Side::Top)),
            Face::Left => Some((AxisPair::Yz, Side::Bot)),
            Face::Right => Some((AxisPair::Yz, Side::Top)),
        }
    }

    /// Which side of its axis the face sits on.
    #[inline]
    pub fn side(self) -> Side {
        match self {
            Face::Front | Face::Bottom | Face::Left => Side::Bot,
            Face::Back | Face::Top | Face::Right => Side::Top,
        }
    }
}

/// Issue order of the batched load driver.
const LOAD_ORDER: [Face; 6] = [
    Face::Front,
    Face::Back,
    Face::Top,
    Face::Bottom,
    Face::Left,
    Face::Right,
];

/// Channel assignment of the batched store driver, one distinct channel per
/// face so all six stores can be in flight at once.
const STORE_CHANNELS: [(Face, u8); 6] = [
    (Face::Left, 4),
    (Face::Right, 5),
    (Face::Bottom, 2),
    (Face::Top, 3),
    (Face::Front, 6),
    (Face::Back, 1),
];

/// The halo transfer engine: resolved geometry plus the staging pool.
///
/// Built once per subdomain; the decomposition cannot change under a live
/// engine. The caller serializes whole refresh cycles: a load and a store of
/// the same face share a staging plate and must not be in flight together.
#[derive(Debug)]
pub struct HaloTransfer<V = f64> {
    config: GridConfig,
    widths: HaloWidths,
    staging: StagingPool<V>,
}

impl<V: Pod> HaloTransfer<V> {
    /// Validate the configuration, resolve widths, and allocate staging.
    ///
    /// # Errors
    /// Configuration errors from [`GridConfig::validate`], geometry errors
    /// from [`HaloWidths::validate`], or [`HaloError::StagingAlloc`] when the
    /// host cannot provide scratch memory.
    pub fn new(config: GridConfig) -> Result<Self, HaloError> {
        config.validate()?;
        let widths = HaloWidths::resolve(&config);
        widths.validate(&config)?;
        log::debug!(
            "halo widths resolved: x={:?} y={:?} z={:?}",
            widths.x,
            widths.y,
            widths.z
        );
        let staging = StagingPool::new(&config, &widths)?;
        Ok(HaloTransfer {
            config,
            widths,
            staging,
        })
    }

    /// The configuration this engine was built from.
    #[inline]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// The resolved axis width triples.
    #[inline]
    pub fn widths(&self) -> &HaloWidths {
        &self.widths
    }

    /// Outer ghost slab of a face, the target of its load.
    pub fn outer_box(&self, face: Face) -> Result<CoordBox, HaloError> {
        let [mx, my, mz] = self.config.padded();
        let w = &self.widths;
        let (start, end) = match face {
            Face::Front => ([0, 0, 0], [mx, my, w.z.bot]),
            Face::Back => ([0, 0, mz - w.z.top], [mx, my, mz]),
            Face::Bottom => ([0, 0, w.z.bot], [mx, w.y.bot, mz - w.z.top]),
            Face::Top => ([0, my - w.y.top, w.z.bot], [mx, my, mz - w.z.top]),
            Face::Left => (
                [0, w.y.bot, w.z.bot],
                [w.x.bot, my - w.y.top, mz - w.z.top],
            ),
            Face::Right => (
                [mx - w.x.top, w.y.bot, w.z.bot],
                [mx, my - w.y.top, mz - w.z.top],
            ),
        };
        CoordBox::new(start, end)
    }

    /// Inner boundary slab of a face, the source of its store: the outer
    /// slab's mirror image moved inward past the ghost layers.
    pub fn inner_box(&self, face: Face) -> Result<CoordBox, HaloError> {
        let [mx, my, mz] = self.config.padded();
        let g = self.config.ghost;
        let w = &self.widths;
        let (start, end) = match face {
            Face::Front => ([g, g, g], [mx - g, my - g, g + w.z.bot]),
            Face::Back => (
                [g, g, mz - g - w.z.top],
                [mx - g, my - g, mz - g],
            ),
            Face::Bottom => (
                [g, g, g + w.z.bot],
                [mx - g, g + w.y.bot, mz - g - w.z.top],
            ),
            Face::Top => (
                [g, my - g - w.y.top, g + w.z.bot],
                [mx - g, my - g, mz - g - w.z.top],
            ),
            Face::Left => (
                [g, g + w.y.bot, g + w.z.bot],
                [g + w.x.bot, my - g - w.y.top, mz - g - w.z.top],
            ),
            Face::Right => (
                [mx - g - w.x.top, g + w.y.bot, g + w.z.bot],
                [mx - g, my - g - w.y.top, mz - g - w.z.top],
            ),
        };
        CoordBox::new(start, end)
    }

    /// Refresh the outer ghost slab of one face on the given channel.
    ///
    /// On return the copy is queued; it is complete once all work on
    /// `channel` has drained.
    pub fn load_face<D: DeviceLink<V>>(
        &mut self,
        device: &D,
        mesh: &MeshBuffer<V>,
        face: Face,
        channel: ChannelId,
    ) -> Result<(), HaloError> {
        mesh.check_config(&self.config)?;
        let slab = self.outer_box(face)?;
        log::trace!(
            "load {face:?} halo {:?}..{:?} on channel {}",
            slab.start,
            slab.end,
            channel.index()
        );
        match face.plate_route() {
            None => device.load_region(channel, mesh, slab.start, slab.start, slab.cell_count()),
            Some((pair, side)) => {
                let staging = self.staging.plate_mut(pair, side)?;
                device.load_plate(channel, &slab, mesh, staging, pair)
            }
        }
    }

    /// Export the inner boundary slab of one face on the given channel.
    pub fn store_face<D: DeviceLink<V>>(
        &mut self,
        device: &D,
        mesh: &mut MeshBuffer<V>,
        face: Face,
        channel: ChannelId,
    ) -> Result<(), HaloError> {
        mesh.check_config(&self.config)?;
        let slab = self.inner_box(face)?;
        log::trace!(
            "store {face:?} boundary {:?}..{:?} on channel {}",
            slab.start,
            slab.end,
            channel.index()
        );
        match face.plate_route() {
            None => device.store_inner_plane(channel, &slab, mesh, face.side()),
            Some((pair, side)) => {
                let staging = self.staging.plate_mut(pair, side)?;
                device.store_plate(channel, &slab, mesh, staging, pair)
            }
        }
    }

    /// Refresh all six outer ghost slabs on the shared default channel.
    pub fn load_outer_halos<D: DeviceLink<V>>(
        &mut self,
        device: &D,
        mesh: &MeshBuffer<V>,
    ) -> Result<(), HaloError> {
        for face in LOAD_ORDER {
            self.load_face(device, mesh, face, ChannelId::DEFAULT)?;
        }
        Ok(())
    }

    /// Export all six inner boundary slabs, one channel per face so the
    /// stores can overlap.
    pub fn store_inner_halos<D: DeviceLink<V>>(
        &mut self,
        device: &D,
        mesh: &mut MeshBuffer<V>,
    ) -> Result<(), HaloError> {
        for (face, raw) in STORE_CHANNELS {
            self.store_face(device, mesh, face, ChannelId::new(raw)?)?;
        }
        Ok(())
    }

    /// Push the whole padded cube to the device in one bulk copy.
    pub fn load_full<D: DeviceLink<V>>(
        &self,
        device: &D,
        mesh: &MeshBuffer<V>,
        channel: ChannelId,
    ) -> Result<(), HaloError> {
        mesh.check_config(&self.config)?;
        device.load_region(
            channel,
            mesh,
            [0, 0, 0],
            [0, 0, 0],
            self.config.vertices_per_field(),
        )
    }

    /// Pull the whole padded cube from the device in one bulk copy.
    pub fn store_full<D: DeviceLink<V>>(
        &self,
        device: &D,
        mesh: &mut MeshBuffer<V>,
        channel: ChannelId,
    ) -> Result<(), HaloError> {
        mesh.check_config(&self.config)?;
        device.store_region(
            channel,
            mesh,
            [0, 0, 0],
            [0, 0, 0],
            self.config.vertices_per_field(),
        )
    }

    /// Re-run staging allocation. Idempotent: plates that already exist are
    /// left untouched, so calling this on a live engine is a no-op; after
    /// [`release`](Self::release) it restores the engine to a usable state.
    pub fn reinitialize(&mut self) -> Result<(), HaloError> {
        self.staging.ensure_allocated()
    }

    /// Release the staging plates. Further face transfers report
    /// [`HaloError::StagingReleased`]; repeating the release is a safe no-op.
    pub fn release(&mut self) {
        self.staging.release();
    }

    /// Whether staging has been released.
    #[inline]
    pub fn is_released(&self) -> bool {
        self.staging.is_released()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Axis;

    fn cfg() -> GridConfig {
        GridConfig {
            interior: [16, 12, 10],
            ghost: 3,
            fields: 2,
            periodic: [false, true, false],
            first: [true, false, false],
            last: [false, false, true],
            yin_yang: false,
        }
    }

    // widths for cfg(): x = (4,3), y = (3,3), z = (3,4); padded = 22,18,16

    #[test]
    fn outer_boxes_match_widths() {
        let eng = HaloTransfer::<f64>::new(cfg()).unwrap();
        let front = eng.outer_box(Face::Front).unwrap();
        assert_eq!((front.start, front.end), ([0, 0, 0], [22, 18, 3]));
        let back = eng.outer_box(Face::Back).unwrap();
        assert_eq!((back.start, back.end), ([0, 0, 12], [22, 18, 16]));
        let bottom = eng.outer_box(Face::Bottom).unwrap();
        assert_eq!((bottom.start, bottom.end), ([0, 0, 3], [22, 3, 12]));
        let top = eng.outer_box(Face::Top).unwrap();
        assert_eq!((top.start, top.end), ([0, 15, 3], [22, 18, 12]));
        let left = eng.outer_box(Face::Left).unwrap();
        assert_eq!((left.start, left.end), ([0, 3, 3], [4, 15, 12]));
        let right = eng.outer_box(Face::Right).unwrap();
        assert_eq!((right.start, right.end), ([19, 3, 3], [22, 15, 12]));
    }

    #[test]
    fn inner_boxes_sit_inside_the_interior() {
        let eng = HaloTransfer::<f64>::new(cfg()).unwrap();
        let front = eng.inner_box(Face::Front).unwrap();
        assert_eq!((front.start, front.end), ([3, 3, 3], [19, 15, 6]));
        let back = eng.inner_box(Face::Back).unwrap();
        assert_eq!((back.start, back.end), ([3, 3, 9], [19, 15, 13]));
        let bottom = eng.inner_box(Face::Bottom).unwrap();
        assert_eq!((bottom.start, bottom.end), ([3, 3, 6], [19, 6, 9]));
        let top = eng.inner_box(Face::Top).unwrap();
        assert_eq!((top.start, top.end), ([3, 12, 6], [19, 15, 9]));
        let left = eng.inner_box(Face::Left).unwrap();
        assert_eq!((left.start, left.end), ([3, 6, 6], [7, 12, 9]));
        let right = eng.inner_box(Face::Right).unwrap();
        assert_eq!((right.start, right.end), ([16, 6, 6], [19, 12, 9]));
    }

    fn membership(boxes: &[CoordBox], coord: [usize; 3]) -> usize {
        boxes
            .iter()
            .filter(|b| {
                Axis::ALL.iter().all(|a| {
                    let i = a.index();
                    (b.start[i]..b.end[i]).contains(&coord[i])
                })
            })
            .count()
    }

    #[test]
    fn outer_boxes_tile_the_halo_shell_exactly_once() {
        let eng = HaloTransfer::<f64>::new(cfg()).unwrap();
        let boxes: Vec<_> = Face::ALL
            .into_iter()
            .map(|f| eng.outer_box(f).unwrap())
            .collect();
        let [mx, my, mz] = eng.config().padded();
        let w = eng.widths();
        for z in 0..mz {
            for y in 0..my {
                for x in 0..mx {
                    let in_core = (w.x.bot..mx - w.x.top).contains(&x)
                        && (w.y.bot..my - w.y.top).contains(&y)
                        && (w.z.bot..mz - w.z.top).contains(&z);
                    let expected = if in_core { 0 } else { 1 };
                    assert_eq!(
                        membership(&boxes, [x, y, z]),
                        expected,
                        "cell {x} {y} {z}"
                    );
                }
            }
        }
    }

    #[test]
    fn inner_boxes_tile_the_boundary_shell_exactly_once() {
        let eng = HaloTransfer::<f64>::new(cfg()).unwrap();
        let boxes: Vec<_> = Face::ALL
            .into_iter()
            .map(|f| eng.inner_box(f).unwrap())
            .collect();
        let [mx, my, mz] = eng.config().padded();
        let g = eng.config().ghost;
        let w = eng.widths();
        for z in 0..mz {
            for y in 0..my {
                for x in 0..mx {
                    let in_interior = (g..mx - g).contains(&x)
                        && (g..my - g).contains(&y)
                        && (g..mz - g).contains(&z);
                    let in_core = (g + w.x.bot..mx - g - w.x.top).contains(&x)
                        && (g + w.y.bot..my - g - w.y.top).contains(&y)
                        && (g + w.z.bot..mz - g - w.z.top).contains(&z);
                    let expected = usize::from(in_interior && !in_core);
                    assert_eq!(
                        membership(&boxes, [x, y, z]),
                        expected,
                        "cell {x} {y} {z}"
                    );
                }
            }
        }
    }

    #[test]
    fn batched_store_uses_six_distinct_channels() {
        let mut seen = std::collections::HashSet::new();
        for (_, raw) in STORE_CHANNELS {
            assert!(seen.insert(raw), "channel {raw} assigned twice");
            assert!(ChannelId::new(raw).is_ok());
            assert_ne!(raw, 0, "store channels must avoid the default channel");
        }
        assert_eq!(seen.len(), Face::ALL.len());
    }

    #[test]
    fn transfers_after_release_are_rejected() {
        let mut eng = HaloTransfer::<f64>::new(cfg()).unwrap();
        let mesh = MeshBuffer::<f64>::for_config(eng.config());
        let dev = crate::device::NullDevice;
        eng.release();
        assert!(eng.is_released());
        let err = eng
            .load_face(&dev, &mesh, Face::Bottom, ChannelId::DEFAULT)
            .unwrap_err();
        assert_eq!(err, HaloError::StagingReleased);
        eng.release(); // still a safe no-op
    }

    #[test]
    fn mismatched_mesh_is_rejected_before_issuing() {
        let mut eng = HaloTransfer::<f64>::new(cfg()).unwrap();
        let mesh = MeshBuffer::<f64>::zeroed([22, 18, 15], 2);
        let dev = crate::device::NullDevice;
        let err = eng
            .load_face(&dev, &mesh, Face::Front, ChannelId::DEFAULT)
            .unwrap_err();
        assert_eq!(
            err,
            HaloError::ShapeMismatch {
                expected: [22, 18, 16],
                found: [22, 18, 15]
            }
        );
    }
}
