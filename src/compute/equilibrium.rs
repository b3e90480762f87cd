//! Equilibrium distribution computation.

use super::Lattice;

/// Density floor applied before any division in the pipeline.
pub const DENSITY_FLOOR: f32 = 1e-10;

/// General equilibrium distribution for any lattice.
///
/// feq_i = w_i * rho * (1 + 3(c_i.u)/Cs + 4.5(c_i.u)^2/Cs^2 - 1.5(u.u)/Cs^2)
///
/// Writes into `out[..lattice.q]`.
pub fn equilibrium_into(lattice: &Lattice, cs: f32, rho: f32, u: [f32; 3], out: &mut [f32]) {
    let rho = rho.max(DENSITY_FLOOR);
    let u_sq = (u[0] * u[0] + u[1] * u[1] + u[2] * u[2]) / (cs * cs);
    for i in 0..lattice.q {
        let c = lattice.velocities[i];
        let cu = (c[0] as f32 * u[0] + c[1] as f32 * u[1] + c[2] as f32 * u[2]) / cs;
        out[i] = lattice.weights[i] * rho * (1.0 + 3.0 * cu + 4.5 * cu * cu - 1.5 * u_sq);
    }
}

/// Specialized D2Q9 closed form with the t1/t2/t3 weight grouping.
///
/// Valid in lattice units (Cs = 1). Numerically equivalent to the general
/// formula on the D2Q9 velocity set; the tests cross-check the two.
pub fn equilibrium_d2q9(rho: f32, ux: f32, uy: f32) -> [f32; 9] {
    const T1: f32 = 4.0 / 9.0;
    const T2: f32 = 1.0 / 9.0;
    const T3: f32 = 1.0 / 36.0;
    const C_SQU: f32 = 1.0 / 3.0;

    let rho = rho.max(DENSITY_FLOOR);
    let u_squ = ux * ux + uy * uy;
    let half_u = u_squ / (2.0 * C_SQU);

    let axis = |cu: f32| {
        let s = cu / C_SQU;
        T2 * rho * (1.0 + s + 0.5 * s * s - half_u)
    };
    let diag = |cu: f32| {
        let s = cu / C_SQU;
        T3 * rho * (1.0 + s + 0.5 * s * s - half_u)
    };

    [
        T1 * rho * (1.0 - half_u),
        axis(ux),
        axis(uy),
        axis(-ux),
        axis(-uy),
        diag(ux + uy),
        diag(uy - ux),
        diag(-ux - uy),
        diag(ux - uy),
    ]
}
