//! Configuration types for solver parameters.

use serde::{Deserialize, Serialize};

/// Default lattice spacing / time step.
fn default_spacing() -> f32 {
    1.0
}

/// Default inlet density.
fn default_density() -> f32 {
    1.0
}

/// Lattice velocity set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LatticeScheme {
    /// 9 directions, 2 spatial dimensions.
    D2Q9,
    /// 19 directions, 3 spatial dimensions.
    D3Q19,
}

impl LatticeScheme {
    /// Number of spatial dimensions of the scheme.
    #[inline]
    pub fn dim(&self) -> usize {
        match self {
            LatticeScheme::D2Q9 => 2,
            LatticeScheme::D3Q19 => 3,
        }
    }

    /// Number of discrete lattice directions.
    #[inline]
    pub fn q(&self) -> usize {
        match self {
            LatticeScheme::D2Q9 => 9,
            LatticeScheme::D3Q19 => 19,
        }
    }
}

/// Collision operator selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionKind {
    /// Single relaxation time (Bhatnagar-Gross-Krook).
    #[default]
    Bgk,
    /// Smagorinsky-adjusted variable relaxation time.
    Subgrid,
}

/// Velocity inlet along the y = 0 edge of the grid (D2Q9 only).
///
/// The prescribed speed points into the domain (+y); the three unknown
/// populations at the edge are reconstructed with the Zou-He closure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InletConfig {
    /// Prescribed inlet speed along +y.
    pub velocity: f32,
    /// Prescribed inlet density.
    #[serde(default = "default_density")]
    pub density: f32,
}

/// Top-level solver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Lattice velocity set.
    pub scheme: LatticeScheme,
    /// Kinematic viscosity per fluid component.
    pub viscosity: Vec<f32>,
    /// Grid extents, [width, height] or [width, height, depth].
    pub shape: Vec<usize>,
    /// Lattice spacing.
    #[serde(default = "default_spacing")]
    pub dx: f32,
    /// Time step.
    #[serde(default = "default_spacing")]
    pub dt: f32,
    /// Collision operator.
    #[serde(default)]
    pub collision: CollisionKind,
    /// Optional velocity inlet along the y = 0 edge.
    #[serde(default)]
    pub inlet: Option<InletConfig>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            scheme: LatticeScheme::D2Q9,
            viscosity: vec![0.1],
            shape: vec![256, 256],
            dx: 1.0,
            dt: 1.0,
            collision: CollisionKind::default(),
            inlet: None,
        }
    }
}

impl SolverConfig {
    /// Grid extents as (width, height, depth); depth = 1 for 2D.
    #[inline]
    pub fn dims(&self) -> (usize, usize, usize) {
        let width = self.shape.first().copied().unwrap_or(0);
        let height = self.shape.get(1).copied().unwrap_or(0);
        let depth = self.shape.get(2).copied().unwrap_or(1);
        (width, height, depth)
    }

    /// Total cell count.
    #[inline]
    pub fn cells(&self) -> usize {
        let (w, h, d) = self.dims();
        w * h * d
    }

    /// Lattice speed Cs = dx/dt.
    #[inline]
    pub fn cs(&self) -> f32 {
        self.dx / self.dt
    }

    /// Relaxation time for a kinematic viscosity: tau = 3*nu*dt/dx^2 + 0.5.
    #[inline]
    pub fn tau_for(&self, nu: f32) -> f32 {
        3.0 * nu * self.dt / (self.dx * self.dx) + 0.5
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shape.len() < 2 || self.shape.len() > 3 || self.shape.iter().any(|&e| e == 0) {
            return Err(ConfigError::InvalidShape {
                shape: self.shape.clone(),
            });
        }
        if self.scheme.dim() != self.shape.len() {
            return Err(ConfigError::SchemeShapeMismatch {
                scheme: self.scheme,
                dims: self.shape.len(),
            });
        }
        if self.viscosity.is_empty() {
            return Err(ConfigError::NoComponents);
        }
        if self.dx <= 0.0 || self.dt <= 0.0 {
            return Err(ConfigError::InvalidSpacing {
                dx: self.dx,
                dt: self.dt,
            });
        }
        for (i, &nu) in self.viscosity.iter().enumerate() {
            let tau = self.tau_for(nu);
            // tau <= 0.5 guarantees numerical instability
            if !nu.is_finite() || nu <= 0.0 || tau <= 0.5 {
                return Err(ConfigError::InvalidViscosity {
                    component: i,
                    value: nu,
                    tau,
                });
            }
        }
        if let Some(inlet) = &self.inlet {
            if self.scheme != LatticeScheme::D2Q9 {
                return Err(ConfigError::InletUnsupported {
                    scheme: self.scheme,
                });
            }
            if !inlet.density.is_finite() || inlet.density <= 0.0 {
                return Err(ConfigError::InvalidInletDensity {
                    density: inlet.density,
                });
            }
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("grid shape {shape:?} must have 2 or 3 non-zero extents")]
    InvalidShape { shape: Vec<usize> },
    #[error("lattice scheme {scheme:?} does not match a {dims}-dimensional grid")]
    SchemeShapeMismatch { scheme: LatticeScheme, dims: usize },
    #[error("at least one fluid component (viscosity) is required")]
    NoComponents,
    #[error("dx ({dx}) and dt ({dt}) must be positive")]
    InvalidSpacing { dx: f32, dt: f32 },
    #[error("component {component}: viscosity {value} yields tau = {tau} <= 0.5 (unstable)")]
    InvalidViscosity {
        component: usize,
        value: f32,
        tau: f32,
    },
    #[error("velocity inlet is only defined for D2Q9, got {scheme:?}")]
    InletUnsupported { scheme: LatticeScheme },
    #[error("inlet density {density} must be positive")]
    InvalidInletDensity { density: f32 },
    #[error("boundary mask shape {got:?} does not match grid shape {expected:?}")]
    MaskShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    #[error("boundary mask has {got} cells, grid has {expected}")]
    MaskLengthMismatch { expected: usize, got: usize },
    #[error("boundary mask value {value} at cell {index} is not 0 or 1")]
    InvalidMaskValue { index: usize, value: u8 },
    #[error("cell x = {x} on the inlet edge is also flagged solid")]
    BoundaryConflict { x: usize },
}
