//! Compute module - numerical core of the lattice Boltzmann solver.

mod boundary;
mod collision;
mod domain;
mod equilibrium;
mod lattice;
mod sink;
mod streaming;

pub use boundary::*;
pub use collision::*;
pub use domain::*;
pub use equilibrium::*;
pub use lattice::*;
pub use sink::*;
pub use streaming::*;
