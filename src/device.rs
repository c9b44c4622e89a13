//! Thin façade over the accelerator runtime's transfer queues.
//!
//! The engine only ever *issues* copies; the device runtime owns completion.
//! Operations queued on one channel complete in issue order, channels may
//! overlap each other. Two backends ship in-crate: a compile-time no-op for
//! pure geometry tests, and a host-memory mirror that executes transfers
//! synchronously and records what was issued on which channel.

use crate::channel::ChannelId;
use crate::config::GridConfig;
use crate::geometry::CoordBox;
use crate::halo_error::HaloError;
use crate::mesh::MeshBuffer;
use crate::plate::{pack_plate, packed_len, unpack_plate};
use crate::staging::{AxisPair, Side};
use bytemuck::Pod;
use parking_lot::{Mutex, MutexGuard};

/// Asynchronous transfer interface a device runtime must provide.
///
/// `load_*` moves host → device, `store_*` device → host. Bulk region copies
/// are addressed by a start coordinate and a per-field element count, applied
/// at the same offset in every field (the mesh layout keeps per-field offsets
/// identical). Staged plate copies carry the staging buffer to linearize the
/// strided slab, tagged with the [`AxisPair`] the plate spans.
/// `store_inner_plane` is the front/back variant whose combined device-side
/// buffer is addressed by [`Side`].
pub trait DeviceLink<V: Pod>: Send + Sync {
    /// Queue a contiguous host→device copy of `count` elements per field.
    fn load_region(
        &self,
        channel: ChannelId,
        mesh: &MeshBuffer<V>,
        src: [usize; 3],
        dst: [usize; 3],
        count: usize,
    ) -> Result<(), HaloError>;

    /// Queue a contiguous device→host copy of `count` elements per field.
    fn store_region(
        &self,
        channel: ChannelId,
        mesh: &mut MeshBuffer<V>,
        src: [usize; 3],
        dst: [usize; 3],
        count: usize,
    ) -> Result<(), HaloError>;

    /// Queue a staged host→device copy of a strided plate.
    fn load_plate(
        &self,
        channel: ChannelId,
        plate: &CoordBox,
        mesh: &MeshBuffer<V>,
        staging: &mut [V],
        pair: AxisPair,
    ) -> Result<(), HaloError>;

    /// Queue a staged device→host copy of a strided plate.
    fn store_plate(
        &self,
        channel: ChannelId,
        plate: &CoordBox,
        mesh: &mut MeshBuffer<V>,
        staging: &mut [V],
        pair: AxisPair,
    ) -> Result<(), HaloError>;

    /// Queue a device→host copy of one inner xy plane through the combined
    /// front/back device buffer, `side` picking its half.
    fn store_inner_plane(
        &self,
        channel: ChannelId,
        plate: &CoordBox,
        mesh: &mut MeshBuffer<V>,
        side: Side,
    ) -> Result<(), HaloError>;
}

/// Compile-time no-op device for pure geometry unit tests.
#[derive(Clone, Debug, Default)]
pub struct NullDevice;

impl<V: Pod> DeviceLink<V> for NullDevice {
    fn load_region(
        &self,
        _channel: ChannelId,
        _mesh: &MeshBuffer<V>,
        _src: [usize; 3],
        _dst: [usize; 3],
        _count: usize,
    ) -> Result<(), HaloError> {
        Ok(())
    }

    fn store_region(
        &self,
        _channel: ChannelId,
        _mesh: &mut MeshBuffer<V>,
        _src: [usize; 3],
        _dst: [usize; 3],
        _count: usize,
    ) -> Result<(), HaloError> {
        Ok(())
    }

    fn load_plate(
        &self,
        _channel: ChannelId,
        _plate: &CoordBox,
        _mesh: &MeshBuffer<V>,
        _staging: &mut [V],
        _pair: AxisPair,
    ) -> Result<(), HaloError> {
        Ok(())
    }

    fn store_plate(
        &self,
        _channel: ChannelId,
        _plate: &CoordBox,
        _mesh: &mut MeshBuffer<V>,
        _staging: &mut [V],
        _pair: AxisPair,
    ) -> Result<(), HaloError> {
        Ok(())
    }

    fn store_inner_plane(
        &self,
        _channel: ChannelId,
        _plate: &CoordBox,
        _mesh: &mut MeshBuffer<V>,
        _side: Side,
    ) -> Result<(), HaloError> {
        Ok(())
    }
}

/// What an [`InProcessDevice`] executed, for issue-order assertions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeviceOp {
    LoadRegion,
    StoreRegion,
    LoadPlate(AxisPair),
    StorePlate(AxisPair),
    StoreInnerPlane(Side),
}

/// Host-memory device mirror that executes every transfer synchronously.
///
/// Synchronous execution trivially satisfies the per-channel ordering
/// contract. The mirror is a full copy of the mesh, so round-trip tests can
/// load a region, store it back, and compare. Every executed operation is
/// appended to an issue log together with its channel.
#[derive(Debug)]
pub struct InProcessDevice<V = f64> {
    mirror: Mutex<MeshBuffer<V>>,
    xy_scratch: Mutex<Vec<V>>,
    issued: Mutex<Vec<(ChannelId, DeviceOp)>>,
}

impl<V: Pod> InProcessDevice<V> {
    /// Device mirror sized for a configuration's padded mesh.
    pub fn for_config(cfg: &GridConfig) -> Self {
        Self::new(cfg.padded(), cfg.fields)
    }

    /// Device mirror with explicit padded extents and field count.
    pub fn new(dims: [usize; 3], fields: usize) -> Self {
        InProcessDevice {
            mirror: Mutex::new(MeshBuffer::zeroed(dims, fields)),
            xy_scratch: Mutex::new(Vec::new()),
            issued: Mutex::new(Vec::new()),
        }
    }

    /// Lock and expose the device-resident mesh image.
    pub fn mirror(&self) -> MutexGuard<'_, MeshBuffer<V>> {
        self.mirror.lock()
    }

    /// Snapshot of the issue log as `(channel, operation)` pairs.
    pub fn issued(&self) -> Vec<(ChannelId, DeviceOp)> {
        self.issued.lock().clone()
    }

    /// Forget the issue log.
    pub fn clear_issued(&self) {
        self.issued.lock().clear();
    }

    fn check(&self, mesh: &MeshBuffer<V>) -> Result<(), HaloError> {
        let mirror = self.mirror.lock();
        if mirror.dims() != mesh.dims() {
            return Err(HaloError::ShapeMismatch {
                expected: mirror.dims(),
                found: mesh.dims(),
            });
        }
        if mirror.fields() != mesh.fields() {
            return Err(HaloError::FieldCountMismatch {
                expected: mirror.fields(),
                found: mesh.fields(),
            });
        }
        Ok(())
    }

    fn record(&self, channel: ChannelId, op: DeviceOp) {
        self.issued.lock().push((channel, op));
    }

    fn check_region(
        mesh: &MeshBuffer<V>,
        src: [usize; 3],
        dst: [usize; 3],
        count: usize,
    ) -> Result<(usize, usize), HaloError> {
        let vpf = mesh.vertices_per_field();
        let src_off = mesh.field_offset(src);
        let dst_off = mesh.field_offset(dst);
        for offset in [src_off, dst_off] {
            if offset + count > vpf {
                return Err(HaloError::RegionOutOfBounds {
                    offset,
                    count,
                    len: vpf,
                });
            }
        }
        Ok((src_off, dst_off))
    }
}

impl<V: Pod + Send> DeviceLink<V> for InProcessDevice<V> {
    fn load_region(
        &self,
        channel: ChannelId,
        mesh: &MeshBuffer<V>,
        src: [usize; 3],
        dst: [usize; 3],
        count: usize,
    ) -> Result<(), HaloError> {
        self.check(mesh)?;
        let (src_off, dst_off) = Self::check_region(mesh, src, dst, count)?;
        let vpf = mesh.vertices_per_field();
        let mut mirror = self.mirror.lock();
        for field in 0..mesh.fields() {
            let s = field * vpf + src_off;
            let d = field * vpf + dst_off;
            mirror.data_mut()[d..d + count].copy_from_slice(&mesh.data()[s..s + count]);
        }
        drop(mirror);
        self.record(channel, DeviceOp::LoadRegion);
        Ok(())
    }

    fn store_region(
        &self,
        channel: ChannelId,
        mesh: &mut MeshBuffer<V>,
        src: [usize; 3],
        dst: [usize; 3],
        count: usize,
    ) -> Result<(), HaloError> {
        self.check(mesh)?;
        let (src_off, dst_off) = Self::check_region(mesh, src, dst, count)?;
        let vpf = mesh.vertices_per_field();
        let mirror = self.mirror.lock();
        for field in 0..mesh.fields() {
            let s = field * vpf + src_off;
            let d = field * vpf + dst_off;
            mesh.data_mut()[d..d + count].copy_from_slice(&mirror.data()[s..s + count]);
        }
        drop(mirror);
        self.record(channel, DeviceOp::StoreRegion);
        Ok(())
    }

    fn load_plate(
        &self,
        channel: ChannelId,
        plate: &CoordBox,
        mesh: &MeshBuffer<V>,
        staging: &mut [V],
        pair: AxisPair,
    ) -> Result<(), HaloError> {
        self.check(mesh)?;
        let n = pack_plate(mesh, plate, staging)?;
        let mut mirror = self.mirror.lock();
        unpack_plate(&staging[..n], plate, &mut mirror)?;
        drop(mirror);
        self.record(channel, DeviceOp::LoadPlate(pair));
        Ok(())
    }

    fn store_plate(
        &self,
        channel: ChannelId,
        plate: &CoordBox,
        mesh: &mut MeshBuffer<V>,
        staging: &mut [V],
        pair: AxisPair,
    ) -> Result<(), HaloError> {
        self.check(mesh)?;
        let mirror = self.mirror.lock();
        let n = pack_plate(&mirror, plate, staging)?;
        drop(mirror);
        unpack_plate(&staging[..n], plate, mesh)?;
        self.record(channel, DeviceOp::StorePlate(pair));
        Ok(())
    }

    fn store_inner_plane(
        &self,
        channel: ChannelId,
        plate: &CoordBox,
        mesh: &mut MeshBuffer<V>,
        side: Side,
    ) -> Result<(), HaloError> {
        self.check(mesh)?;
        let mirror = self.mirror.lock();
        let needed = packed_len(plate, &mirror);
        let mut scratch = self.xy_scratch.lock();
        // One buffer, two halves: the bottom and top planes never clobber
        // each other even when issued back to back on different channels.
        if scratch.len() < 2 * needed {
            scratch.resize(2 * needed, V::zeroed());
        }
        let half = scratch.len() / 2;
        let offset = side.index() * half;
        pack_plate(&mirror, plate, &mut scratch[offset..offset + needed])?;
        drop(mirror);
        unpack_plate(&scratch[offset..offset + needed], plate, mesh)?;
        drop(scratch);
        self.record(channel, DeviceOp::StoreInnerPlane(side));
        Ok(())
    }
}
