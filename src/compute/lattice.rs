//! Lattice descriptors: discrete velocity sets, weights and bounce
//! permutations.
//!
//! A descriptor is pure data shared read-only by every domain using the
//! same scheme; adding a scheme means supplying another table, not code.

use crate::schema::LatticeScheme;

/// Largest direction count across supported schemes (sizes stack buffers).
pub const MAX_Q: usize = 19;

/// D2Q9 direction ordering: rest, +x, +y, -x, -y, then diagonals
/// (+x+y), (-x+y), (-x-y), (+x-y).
const D2Q9_VELOCITIES: [[i32; 3]; 9] = [
    [0, 0, 0],
    [1, 0, 0],
    [0, 1, 0],
    [-1, 0, 0],
    [0, -1, 0],
    [1, 1, 0],
    [-1, 1, 0],
    [-1, -1, 0],
    [1, -1, 0],
];

const D2Q9_WEIGHTS: [f32; 9] = [
    4.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
];

const D2Q9_OPPOSITE: [usize; 9] = [0, 3, 4, 1, 2, 7, 8, 5, 6];

/// D3Q19 ordering: rest, 6 face neighbors in +/- pairs, 12 edge neighbors
/// in +/- pairs.
const D3Q19_VELOCITIES: [[i32; 3]; 19] = [
    [0, 0, 0],
    [1, 0, 0],
    [-1, 0, 0],
    [0, 1, 0],
    [0, -1, 0],
    [0, 0, 1],
    [0, 0, -1],
    [1, 1, 0],
    [-1, -1, 0],
    [1, -1, 0],
    [-1, 1, 0],
    [1, 0, 1],
    [-1, 0, -1],
    [1, 0, -1],
    [-1, 0, 1],
    [0, 1, 1],
    [0, -1, -1],
    [0, 1, -1],
    [0, -1, 1],
];

const D3Q19_WEIGHTS: [f32; 19] = [
    1.0 / 3.0,
    1.0 / 18.0,
    1.0 / 18.0,
    1.0 / 18.0,
    1.0 / 18.0,
    1.0 / 18.0,
    1.0 / 18.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
];

const D3Q19_OPPOSITE: [usize; 19] = [
    0, 2, 1, 4, 3, 6, 5, 8, 7, 10, 9, 12, 11, 14, 13, 16, 15, 18, 17,
];

/// Zou-He closure indices for the low-y inlet edge: the three populations
/// pointing into the domain and the tangential pair used by the transverse
/// correction. Opposites come from the bounce permutation.
#[derive(Debug, Clone, Copy)]
pub struct InletStencil {
    /// Unknown population along the inward edge normal (+y).
    pub normal: usize,
    /// Unknown diagonal with positive tangential component.
    pub diag_pos: usize,
    /// Unknown diagonal with negative tangential component.
    pub diag_neg: usize,
    /// Tangential pair (+x, -x).
    pub tangential: (usize, usize),
}

const D2Q9_INLET: InletStencil = InletStencil {
    normal: 2,
    diag_pos: 5,
    diag_neg: 6,
    tangential: (1, 3),
};

/// Immutable description of a lattice scheme.
pub struct Lattice {
    pub scheme: LatticeScheme,
    /// Number of discrete directions.
    pub q: usize,
    /// Spatial dimensionality.
    pub dim: usize,
    pub weights: &'static [f32],
    /// Integer velocity vectors; the z component is 0 for 2D schemes.
    pub velocities: &'static [[i32; 3]],
    /// Bounce-back permutation: direction i reflects to opposite[i].
    pub opposite: &'static [usize],
    /// Per-direction strain coupling scalar for the subgrid correction:
    /// eek[i] = sum over n,m of |c_i[n] * c_i[m]|.
    pub eek: Vec<f32>,
    /// Zou-He closure indices, present for 2D schemes.
    pub inlet: Option<InletStencil>,
}

impl Lattice {
    pub fn new(scheme: LatticeScheme) -> Self {
        let (weights, velocities, opposite, inlet): (
            &'static [f32],
            &'static [[i32; 3]],
            &'static [usize],
            Option<InletStencil>,
        ) = match scheme {
            LatticeScheme::D2Q9 => (
                &D2Q9_WEIGHTS,
                &D2Q9_VELOCITIES,
                &D2Q9_OPPOSITE,
                Some(D2Q9_INLET),
            ),
            LatticeScheme::D3Q19 => (&D3Q19_WEIGHTS, &D3Q19_VELOCITIES, &D3Q19_OPPOSITE, None),
        };

        let eek = velocities
            .iter()
            .map(|c| {
                let mut sum = 0.0f32;
                for n in 0..3 {
                    for m in 0..3 {
                        sum += (c[n] * c[m]).abs() as f32;
                    }
                }
                sum
            })
            .collect();

        Self {
            scheme,
            q: weights.len(),
            dim: scheme.dim(),
            weights,
            velocities,
            opposite,
            eek,
            inlet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn both() -> [Lattice; 2] {
        [
            Lattice::new(LatticeScheme::D2Q9),
            Lattice::new(LatticeScheme::D3Q19),
        ]
    }

    #[test]
    fn weights_sum_to_one() {
        for lattice in both() {
            let sum: f32 = lattice.weights.iter().sum();
            assert!(
                (sum - 1.0).abs() < 1e-6,
                "{:?}: weights sum to {}",
                lattice.scheme,
                sum
            );
        }
    }

    #[test]
    fn zero_net_momentum_at_rest() {
        for lattice in both() {
            for k in 0..3 {
                let m: f32 = lattice
                    .weights
                    .iter()
                    .zip(lattice.velocities.iter())
                    .map(|(w, c)| w * c[k] as f32)
                    .sum();
                assert!(
                    m.abs() < 1e-7,
                    "{:?}: net momentum {} along axis {}",
                    lattice.scheme,
                    m,
                    k
                );
            }
        }
    }

    #[test]
    fn bounce_map_is_involution() {
        for lattice in both() {
            for i in 0..lattice.q {
                assert_eq!(
                    lattice.opposite[lattice.opposite[i]],
                    i,
                    "{:?}: direction {}",
                    lattice.scheme,
                    i
                );
            }
        }
    }

    #[test]
    fn opposite_directions_negate_velocities() {
        for lattice in both() {
            for i in 0..lattice.q {
                let c = lattice.velocities[i];
                let r = lattice.velocities[lattice.opposite[i]];
                assert_eq!([c[0], c[1], c[2]], [-r[0], -r[1], -r[2]]);
            }
        }
    }

    #[test]
    fn eek_values_d2q9() {
        let lattice = Lattice::new(LatticeScheme::D2Q9);
        assert_eq!(lattice.eek[0], 0.0); // rest
        assert_eq!(lattice.eek[1], 1.0); // axis
        assert_eq!(lattice.eek[5], 4.0); // diagonal
    }

    #[test]
    fn inlet_stencil_points_into_domain() {
        let lattice = Lattice::new(LatticeScheme::D2Q9);
        let stencil = lattice.inlet.unwrap();
        for i in [stencil.normal, stencil.diag_pos, stencil.diag_neg] {
            assert!(lattice.velocities[i][1] > 0, "direction {} not inward", i);
        }
        assert!(Lattice::new(LatticeScheme::D3Q19).inlet.is_none());
    }
}
