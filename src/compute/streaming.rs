//! Streaming: periodic propagation and macroscopic recomputation.

use rayon::prelude::*;

use super::{DENSITY_FLOOR, Lattice};

#[inline]
fn wrap(i: i32, n: usize) -> usize {
    i.rem_euclid(n as i32) as usize
}

/// Pull-scheme periodic streaming.
///
/// Each population is fetched from the upwind cell along its lattice
/// velocity, wrapping toroidally at the domain edges. A pure permutation of
/// cell values, so total mass is conserved exactly.
pub fn propagate_into(
    lattice: &Lattice,
    f: &[f32],
    f_next: &mut [f32],
    width: usize,
    height: usize,
    depth: usize,
) {
    let q = lattice.q;
    let plane = width * height;
    debug_assert_eq!(f.len(), plane * depth * q);
    debug_assert_eq!(f_next.len(), f.len());

    f_next
        .par_chunks_mut(q)
        .enumerate()
        .for_each(|(idx, out)| {
            let z = idx / plane;
            let rem = idx % plane;
            let y = rem / width;
            let x = rem % width;
            for i in 0..q {
                let c = lattice.velocities[i];
                let sx = wrap(x as i32 - c[0], width);
                let sy = wrap(y as i32 - c[1], height);
                let sz = wrap(z as i32 - c[2], depth);
                let src = (sz * height + sy) * width + sx;
                out[i] = f[src * q + i];
            }
        });
}

/// Recompute density and velocity from a freshly streamed field.
///
/// rho = sum_i f_i, u = (sum_i f_i c_i) / (Cs * rho), with the density
/// floored before the division. Solid cells carry no macroscopic state and
/// are zeroed; their populations are handled by bounce-back.
pub fn macroscopic_into(
    lattice: &Lattice,
    cs: f32,
    f: &[f32],
    mask: &[u8],
    rho: &mut [f32],
    vel: &mut [f32],
) {
    let q = lattice.q;
    rho.par_iter_mut()
        .zip(vel.par_chunks_mut(3))
        .zip(f.par_chunks(q).zip(mask.par_iter()))
        .for_each(|((r, u), (fq, &solid))| {
            if solid != 0 {
                *r = 0.0;
                u.fill(0.0);
                return;
            }
            let mut density = 0.0f32;
            let mut momentum = [0.0f32; 3];
            for i in 0..q {
                let c = lattice.velocities[i];
                density += fq[i];
                momentum[0] += fq[i] * c[0] as f32;
                momentum[1] += fq[i] * c[1] as f32;
                momentum[2] += fq[i] * c[2] as f32;
            }
            *r = density;
            let inv = 1.0 / (cs * density.max(DENSITY_FLOOR));
            u[0] = momentum[0] * inv;
            u[1] = momentum[1] * inv;
            u[2] = momentum[2] * inv;
        });
}
