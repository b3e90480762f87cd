//! Collision operators: BGK and Smagorinsky-adjusted variable relaxation.

use rayon::prelude::*;

use crate::schema::CollisionKind;

use super::{DENSITY_FLOOR, Lattice, MAX_Q, equilibrium_into};

/// Smagorinsky constant for the subgrid relaxation correction.
pub const SMAGORINSKY: f32 = 0.17;

/// Relax the distribution field toward equilibrium, in place.
///
/// `rho` and `vel` must be the macroscopic fields derived from `f`. The body
/// force is folded into the velocity used for equilibrium as dt*tau*g/rho.
///
/// BGK: f' = f - (f - feq)/tau with fixed tau.
/// Subgrid: tau_eff = 0.5*(tau + sqrt(tau^2 + 6*Q*Sc/rho)) with
/// Q = sqrt(2 * sum_i NonEq_i^2 * eek_i); reduces to BGK when Q = 0 and
/// tau_eff >= tau > 0.5 by construction.
#[allow(clippy::too_many_arguments)]
pub fn collide(
    kind: CollisionKind,
    lattice: &Lattice,
    cs: f32,
    tau: f32,
    dt: f32,
    f: &mut [f32],
    rho: &[f32],
    vel: &[f32],
    bforce: &[f32],
) {
    let q = lattice.q;
    f.par_chunks_mut(q)
        .zip(rho.par_iter())
        .zip(vel.par_chunks(3).zip(bforce.par_chunks(3)))
        .for_each(|((fq, &r), (u, g))| {
            let r_guard = r.max(DENSITY_FLOOR);
            let u_eff = [
                u[0] + dt * tau * g[0] / r_guard,
                u[1] + dt * tau * g[1] / r_guard,
                u[2] + dt * tau * g[2] / r_guard,
            ];

            let mut feq = [0.0f32; MAX_Q];
            equilibrium_into(lattice, cs, r, u_eff, &mut feq[..q]);

            match kind {
                CollisionKind::Bgk => {
                    for i in 0..q {
                        fq[i] -= (fq[i] - feq[i]) / tau;
                    }
                }
                CollisionKind::Subgrid => {
                    let mut q_sum = 0.0f32;
                    for i in 0..q {
                        let non_eq = fq[i] - feq[i];
                        q_sum += non_eq * non_eq * lattice.eek[i];
                    }
                    let q_mag = (2.0 * q_sum).sqrt();
                    let tau_eff =
                        0.5 * (tau + (tau * tau + 6.0 * q_mag * SMAGORINSKY / r_guard).sqrt());
                    for i in 0..q {
                        fq[i] -= (fq[i] - feq[i]) / tau_eff;
                    }
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::LatticeScheme;

    /// Single cell at equilibrium for (rho, u); returns (f, rho, vel, g).
    fn equilibrium_cell(lattice: &Lattice, rho: f32, u: [f32; 3]) -> (Vec<f32>, Vec<f32>, Vec<f32>, Vec<f32>) {
        let mut f = vec![0.0f32; lattice.q];
        equilibrium_into(lattice, 1.0, rho, u, &mut f);
        (f, vec![rho], u.to_vec(), vec![0.0; 3])
    }

    #[test]
    fn bgk_equilibrium_is_fixed_point() {
        let lattice = Lattice::new(LatticeScheme::D2Q9);
        let (mut f, rho, vel, g) = equilibrium_cell(&lattice, 1.2, [0.05, -0.03, 0.0]);
        let before = f.clone();

        collide(CollisionKind::Bgk, &lattice, 1.0, 1.0, 1.0, &mut f, &rho, &vel, &g);

        for i in 0..lattice.q {
            assert!(
                (f[i] - before[i]).abs() < 1e-6,
                "dir {}: {} vs {}",
                i,
                f[i],
                before[i]
            );
        }
    }

    #[test]
    fn subgrid_reduces_to_bgk_at_zero_nonequilibrium() {
        let lattice = Lattice::new(LatticeScheme::D3Q19);
        let (mut f, rho, vel, g) = equilibrium_cell(&lattice, 1.0, [0.02, 0.01, -0.01]);
        let before = f.clone();

        // NonEq = 0 so Q = 0, tau_eff = tau, and the field is unchanged.
        collide(CollisionKind::Subgrid, &lattice, 1.0, 0.8, 1.0, &mut f, &rho, &vel, &g);

        for i in 0..lattice.q {
            assert!((f[i] - before[i]).abs() < 1e-6);
        }
    }

    #[test]
    fn subgrid_matches_bgk_for_small_perturbation_direction() {
        // Away from equilibrium the subgrid operator relaxes strictly less
        // aggressively (tau_eff > tau) but toward the same equilibrium.
        let lattice = Lattice::new(LatticeScheme::D2Q9);
        let (f0, _, _, _) = equilibrium_cell(&lattice, 1.0, [0.0; 3]);

        let mut perturbed: Vec<f32> = f0;
        perturbed[1] += 0.01;
        perturbed[3] -= 0.01;
        // recompute macroscopics so they stay consistent with the field
        let r: f32 = perturbed.iter().sum();
        let mut m = [0.0f32; 3];
        for (fi, c) in perturbed.iter().zip(lattice.velocities.iter()) {
            for k in 0..3 {
                m[k] += fi * c[k] as f32;
            }
        }
        let rho = vec![r];
        let vel = vec![m[0] / r, m[1] / r, m[2] / r];

        let mut bgk = perturbed.clone();
        let mut sub = perturbed.clone();
        let g = vec![0.0f32; 3];
        collide(CollisionKind::Bgk, &lattice, 1.0, 0.8, 1.0, &mut bgk, &rho, &vel, &g);
        collide(CollisionKind::Subgrid, &lattice, 1.0, 0.8, 1.0, &mut sub, &rho, &vel, &g);

        // Same relaxation direction, smaller magnitude for subgrid.
        let bgk_delta: f32 = bgk
            .iter()
            .zip(perturbed.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        let sub_delta: f32 = sub
            .iter()
            .zip(perturbed.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        assert!(sub_delta > 0.0);
        assert!(sub_delta <= bgk_delta + 1e-7);
    }

    #[test]
    fn collision_conserves_mass_and_momentum() {
        let lattice = Lattice::new(LatticeScheme::D2Q9);
        // Arbitrary positive populations, macroscopics derived from them.
        let f: Vec<f32> = (0..lattice.q).map(|i| 0.05 + 0.01 * i as f32).collect();
        let r: f32 = f.iter().sum();
        let mut m = [0.0f32; 3];
        for (fi, c) in f.iter().zip(lattice.velocities.iter()) {
            for k in 0..3 {
                m[k] += fi * c[k] as f32;
            }
        }
        let rho = vec![r];
        let vel = vec![m[0] / r, m[1] / r, m[2] / r];
        let g = vec![0.0f32; 3];

        for kind in [CollisionKind::Bgk, CollisionKind::Subgrid] {
            let mut fc = f.clone();
            collide(kind, &lattice, 1.0, 0.9, 1.0, &mut fc, &rho, &vel, &g);

            let mass: f32 = fc.iter().sum();
            assert!(
                (mass - r).abs() < 1e-5 * r,
                "{:?}: mass {} vs {}",
                kind,
                mass,
                r
            );

            for k in 0..2 {
                let mk: f32 = fc
                    .iter()
                    .zip(lattice.velocities.iter())
                    .map(|(fi, c)| fi * c[k] as f32)
                    .sum();
                assert!(
                    (mk - m[k]).abs() < 1e-5,
                    "{:?}: momentum {} vs {}",
                    kind,
                    mk,
                    m[k]
                );
            }
        }
    }
}
