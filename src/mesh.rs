//! Host-side mesh storage.
//!
//! One flat allocation holds every field over the padded local domain:
//! x fastest-varying, then y, then z, fields outermost. A halo slab that
//! spans the full x/y extents is therefore a single contiguous run per
//! field, which is what makes the front/back transfers direct copies.

use crate::config::GridConfig;
use crate::halo_error::HaloError;
use bytemuck::Pod;

/// Contiguous multi-field 3-D array over the padded local domain.
///
/// The mesh is owned by the host integration and passed by reference into
/// every transfer; the engine never resizes or reallocates it.
#[derive(Clone, Debug)]
pub struct MeshBuffer<V = f64> {
    dims: [usize; 3],
    fields: usize,
    data: Vec<V>,
}

impl<V: Pod> MeshBuffer<V> {
    /// Zero-filled mesh with the given padded extents and field count.
    pub fn zeroed(dims: [usize; 3], fields: usize) -> Self {
        let len = dims[0] * dims[1] * dims[2] * fields;
        MeshBuffer {
            dims,
            fields,
            data: vec![V::zeroed(); len],
        }
    }

    /// Mesh sized from a configuration's padded extents.
    pub fn for_config(cfg: &GridConfig) -> Self {
        Self::zeroed(cfg.padded(), cfg.fields)
    }

    /// Mesh filled from `f(field, [x, y, z])`.
    pub fn from_fn(
        dims: [usize; 3],
        fields: usize,
        mut f: impl FnMut(usize, [usize; 3]) -> V,
    ) -> Self {
        let mut mesh = Self::zeroed(dims, fields);
        for field in 0..fields {
            for z in 0..dims[2] {
                for y in 0..dims[1] {
                    for x in 0..dims[0] {
                        let i = mesh.index(field, [x, y, z]);
                        mesh.data[i] = f(field, [x, y, z]);
                    }
                }
            }
        }
        mesh
    }

    /// Padded extents.
    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Number of fields.
    #[inline]
    pub fn fields(&self) -> usize {
        self.fields
    }

    /// Cells per field.
    #[inline]
    pub fn vertices_per_field(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    /// Flat index of `(field, [x, y, z])`.
    #[inline]
    pub fn index(&self, field: usize, coord: [usize; 3]) -> usize {
        let [mx, my, mz] = self.dims;
        debug_assert!(field < self.fields);
        debug_assert!(coord[0] < mx && coord[1] < my && coord[2] < mz);
        ((field * mz + coord[2]) * my + coord[1]) * mx + coord[0]
    }

    /// Flat index of a coordinate within one field.
    #[inline]
    pub fn field_offset(&self, coord: [usize; 3]) -> usize {
        let [mx, my, _] = self.dims;
        (coord[2] * my + coord[1]) * mx + coord[0]
    }

    /// Value at `(field, coord)`.
    #[inline]
    pub fn at(&self, field: usize, coord: [usize; 3]) -> V {
        self.data[self.index(field, coord)]
    }

    /// Mutable value at `(field, coord)`.
    #[inline]
    pub fn at_mut(&mut self, field: usize, coord: [usize; 3]) -> &mut V {
        let i = self.index(field, coord);
        &mut self.data[i]
    }

    /// Whole storage, all fields.
    #[inline]
    pub fn data(&self) -> &[V] {
        &self.data
    }

    /// Whole storage, mutable.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [V] {
        &mut self.data
    }

    /// Check the mesh shape against a configuration.
    ///
    /// # Errors
    /// [`HaloError::ShapeMismatch`] or [`HaloError::FieldCountMismatch`] when
    /// the mesh was not allocated for `cfg`.
    pub fn check_config(&self, cfg: &GridConfig) -> Result<(), HaloError> {
        let expected = cfg.padded();
        if self.dims != expected {
            return Err(HaloError::ShapeMismatch {
                expected,
                found: self.dims,
            });
        }
        if self.fields != cfg.fields {
            return Err(HaloError::FieldCountMismatch {
                expected: cfg.fields,
                found: self.fields,
            });
        }
        Ok(())
    }
}
