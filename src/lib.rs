//! Lattice Boltzmann fluid solver.
//!
//! This crate provides a CPU reference implementation of the lattice
//! Boltzmann method with D2Q9 (2D) and D3Q19 (3D) velocity sets, a BGK
//! collision operator and an optional Smagorinsky subgrid correction.
//! At macroscopic scales, LBM recovers incompressible Navier-Stokes
//! dynamics.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration types and boundary-mask setup for simulations
//! - `compute`: Numerical computation (lattice tables, equilibrium,
//!   collision, streaming, boundary handling, domain orchestration)
//!
//! # Example
//!
//! ```rust,no_run
//! use lattice_flow::{
//!     compute::Domain,
//!     schema::{BoundaryMask, LatticeScheme, SolverConfig},
//! };
//!
//! // 64x64 periodic domain, one fluid component with nu = 0.1
//! let config = SolverConfig {
//!     scheme: LatticeScheme::D2Q9,
//!     viscosity: vec![0.1],
//!     shape: vec![64, 64],
//!     ..SolverConfig::default()
//! };
//! let mask = BoundaryMask::empty(&config.shape);
//!
//! let mut domain = Domain::new(config, &mask).expect("valid configuration");
//! domain.run(100.0, None).expect("stable run");
//!
//! println!("Total mass after run: {}", domain.total_mass(0));
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{Domain, FieldStats, FrameSink, Lattice, RunSummary, SolverError};
pub use schema::{BoundaryMask, CollisionKind, ConfigError, LatticeScheme, SolverConfig};
