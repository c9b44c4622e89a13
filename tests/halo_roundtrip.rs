use gpu_halo::device::DeviceOp;
use gpu_halo::prelude::*;
use std::collections::HashSet;

/// Fill value of an interior lattice cell: `100 * field + linear_index`.
fn interior_value(cfg: &GridConfig, field: usize, cell: [usize; 3]) -> f64 {
    let [nx, ny, _] = cfg.interior;
    let linear = (cell[2] * ny + cell[1]) * nx + cell[0];
    (100 * field + linear) as f64
}

/// Map a padded coordinate onto the interior lattice under periodic wrap.
fn wrap(cfg: &GridConfig, coord: [usize; 3]) -> [usize; 3] {
    let g = cfg.ghost as i64;
    let mut out = [0usize; 3];
    for i in 0..3 {
        let n = cfg.interior[i] as i64;
        out[i] = (coord[i] as i64 - g).rem_euclid(n) as usize;
    }
    out
}

fn periodic_cfg() -> GridConfig {
    GridConfig {
        interior: [8, 7, 6],
        ghost: 2,
        fields: 3,
        periodic: [true; 3],
        first: [true, false, false],
        last: [false, false, true],
        yin_yang: false,
    }
}

fn mixed_cfg() -> GridConfig {
    GridConfig {
        interior: [10, 9, 8],
        ghost: 2,
        fields: 2,
        periodic: [false, true, false],
        first: [true, false, false],
        last: [false, false, true],
        yin_yang: false,
    }
}

/// Host mesh whose ghost layers already hold the periodic wrap of the
/// interior, as the neighbor-exchange layer would have left them.
fn wrapped_mesh(cfg: &GridConfig) -> MeshBuffer<f64> {
    MeshBuffer::from_fn(cfg.padded(), cfg.fields, |f, c| {
        interior_value(cfg, f, wrap(cfg, c))
    })
}

#[test]
fn batched_load_mirrors_all_wrapped_ghosts() {
    let cfg = periodic_cfg();
    let mut eng = HaloTransfer::new(cfg.clone()).unwrap();
    let mesh = wrapped_mesh(&cfg);
    let dev = InProcessDevice::for_config(&cfg);

    eng.load_outer_halos(&dev, &mesh).unwrap();

    let [mx, my, mz] = cfg.padded();
    let g = cfg.ghost;
    let mirror = dev.mirror();
    for f in 0..cfg.fields {
        for z in 0..mz {
            for y in 0..my {
                for x in 0..mx {
                    let interior = (g..mx - g).contains(&x)
                        && (g..my - g).contains(&y)
                        && (g..mz - g).contains(&z);
                    if interior {
                        continue;
                    }
                    assert_eq!(
                        mirror.at(f, [x, y, z]),
                        interior_value(&cfg, f, wrap(&cfg, [x, y, z])),
                        "ghost {f} {x} {y} {z}"
                    );
                }
            }
        }
    }
    drop(mirror);

    let issued = dev.issued();
    assert_eq!(issued.len(), 6);
    for (channel, _) in &issued {
        assert_eq!(*channel, ChannelId::DEFAULT);
    }
}

#[test]
fn single_face_load_touches_only_its_slab() {
    let cfg = mixed_cfg();
    let mut eng = HaloTransfer::new(cfg.clone()).unwrap();
    let mesh = MeshBuffer::from_fn(cfg.padded(), cfg.fields, |f, c| {
        let [mx, my, _] = cfg.padded();
        (100 * f + (c[2] * my + c[1]) * mx + c[0]) as f64
    });
    let dev = InProcessDevice::for_config(&cfg);

    eng.load_face(&dev, &mesh, Face::Left, ChannelId::DEFAULT)
        .unwrap();

    let slab = eng.outer_box(Face::Left).unwrap();
    let [mx, my, mz] = cfg.padded();
    let mirror = dev.mirror();
    for f in 0..cfg.fields {
        for z in 0..mz {
            for y in 0..my {
                for x in 0..mx {
                    let inside = (slab.start[0]..slab.end[0]).contains(&x)
                        && (slab.start[1]..slab.end[1]).contains(&y)
                        && (slab.start[2]..slab.end[2]).contains(&z);
                    let expect = if inside { mesh.at(f, [x, y, z]) } else { 0.0 };
                    assert_eq!(mirror.at(f, [x, y, z]), expect, "cell {f} {x} {y} {z}");
                }
            }
        }
    }
}

#[test]
fn batched_store_returns_every_inner_layer_bit_identical() {
    let cfg = mixed_cfg();
    let mut eng = HaloTransfer::new(cfg.clone()).unwrap();
    let mesh = MeshBuffer::from_fn(cfg.padded(), cfg.fields, |f, c| {
        let [mx, my, _] = cfg.padded();
        (100 * f + (c[2] * my + c[1]) * mx + c[0]) as f64
    });
    let dev = InProcessDevice::for_config(&cfg);

    // Seed the device with the full cube, then pull the boundary layers
    // back into an empty host mesh.
    eng.load_full(&dev, &mesh, ChannelId::DEFAULT).unwrap();
    dev.clear_issued();
    let mut out = MeshBuffer::<f64>::for_config(&cfg);
    eng.store_inner_halos(&dev, &mut out).unwrap();

    let inner: Vec<_> = Face::ALL
        .into_iter()
        .map(|f| eng.inner_box(f).unwrap())
        .collect();
    let [mx, my, mz] = cfg.padded();
    for f in 0..cfg.fields {
        for z in 0..mz {
            for y in 0..my {
                for x in 0..mx {
                    let exported = inner.iter().any(|b| {
                        (b.start[0]..b.end[0]).contains(&x)
                            && (b.start[1]..b.end[1]).contains(&y)
                            && (b.start[2]..b.end[2]).contains(&z)
                    });
                    let expect = if exported { mesh.at(f, [x, y, z]) } else { 0.0 };
                    assert_eq!(out.at(f, [x, y, z]), expect, "cell {f} {x} {y} {z}");
                }
            }
        }
    }

    // Six stores, each on its own non-default channel.
    let issued = dev.issued();
    assert_eq!(issued.len(), 6);
    let channels: HashSet<_> = issued.iter().map(|(c, _)| *c).collect();
    assert_eq!(channels.len(), 6);
    assert!(!channels.contains(&ChannelId::DEFAULT));

    let ops: Vec<_> = issued.iter().map(|(_, op)| *op).collect();
    assert_eq!(
        ops.iter()
            .filter(|op| matches!(op, DeviceOp::StorePlate(AxisPair::Xz)))
            .count(),
        2
    );
    assert_eq!(
        ops.iter()
            .filter(|op| matches!(op, DeviceOp::StorePlate(AxisPair::Yz)))
            .count(),
        2
    );
    assert!(ops.contains(&DeviceOp::StoreInnerPlane(Side::Bot)));
    assert!(ops.contains(&DeviceOp::StoreInnerPlane(Side::Top)));
}

#[test]
fn full_cube_roundtrip_is_bit_identical() {
    let cfg = periodic_cfg();
    let eng = HaloTransfer::<f64>::new(cfg.clone()).unwrap();
    let mesh = wrapped_mesh(&cfg);
    let dev = InProcessDevice::for_config(&cfg);

    eng.load_full(&dev, &mesh, ChannelId::DEFAULT).unwrap();
    let mut out = MeshBuffer::<f64>::for_config(&cfg);
    eng.store_full(&dev, &mut out, ChannelId::DEFAULT).unwrap();
    assert_eq!(out.data(), mesh.data());
}
