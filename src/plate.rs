//! Gather/scatter of non-contiguous halo plates through flat buffers.
//!
//! A plate is contiguous along x but strided along y and z, so it moves
//! through a staging buffer one x-run at a time. The packed layout is
//! field-major, then z, then y, x runs contiguous — the same traversal order
//! on both sides, so pack and unpack agree without any per-cell index math.

use crate::geometry::{Axis, CoordBox};
use crate::halo_error::HaloError;
use crate::mesh::MeshBuffer;
use bytemuck::Pod;

/// Packed element count of a plate over all fields of a mesh.
#[inline]
pub fn packed_len<V: Pod>(plate: &CoordBox, mesh: &MeshBuffer<V>) -> usize {
    plate.cell_count() * mesh.fields()
}

fn check<V: Pod>(
    plate: &CoordBox,
    mesh: &MeshBuffer<V>,
    buf_len: usize,
) -> Result<usize, HaloError> {
    plate.check_within(mesh.dims())?;
    let needed = packed_len(plate, mesh);
    if buf_len < needed {
        return Err(HaloError::PlateTooSmall {
            needed,
            capacity: buf_len,
        });
    }
    Ok(needed)
}

/// Gather the cells of `plate` from `mesh` into the front of `out`.
///
/// Returns the number of elements written.
///
/// # Errors
/// [`HaloError::BoxOutOfBounds`] if the plate reaches outside the mesh,
/// [`HaloError::PlateTooSmall`] if `out` cannot hold the packed plate.
pub fn pack_plate<V: Pod>(
    mesh: &MeshBuffer<V>,
    plate: &CoordBox,
    out: &mut [V],
) -> Result<usize, HaloError> {
    let needed = check(plate, mesh, out.len())?;
    let run = plate.extent(Axis::X);
    let data = mesh.data();
    let mut at = 0;
    for field in 0..mesh.fields() {
        for z in plate.start[2]..plate.end[2] {
            for y in plate.start[1]..plate.end[1] {
                let row = mesh.index(field, [plate.start[0], y, z]);
                out[at..at + run].copy_from_slice(&data[row..row + run]);
                at += run;
            }
        }
    }
    debug_assert_eq!(at, needed);
    Ok(at)
}

/// Scatter the front of `src` back into the cells of `plate` in `mesh`.
///
/// Returns the number of elements read.
///
/// # Errors
/// Same conditions as [`pack_plate`], with `src` as the undersized buffer.
pub fn unpack_plate<V: Pod>(
    src: &[V],
    plate: &CoordBox,
    mesh: &mut MeshBuffer<V>,
) -> Result<usize, HaloError> {
    let needed = check(plate, mesh, src.len())?;
    let run = plate.extent(Axis::X);
    let mut at = 0;
    for field in 0..mesh.fields() {
        for z in plate.start[2]..plate.end[2] {
            for y in plate.start[1]..plate.end[1] {
                let row = mesh.index(field, [plate.start[0], y, z]);
                mesh.data_mut()[row..row + run].copy_from_slice(&src[at..at + run]);
                at += run;
            }
        }
    }
    debug_assert_eq!(at, needed);
    Ok(at)
}
