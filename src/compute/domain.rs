//! Domain: owns all field state and orchestrates the step sequence.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{error, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{BoundaryMask, ConfigError, SolverConfig};

use super::{
    FrameSink, InletStencil, Lattice, VelocityFrame, apply_velocity_inlet, bounce_back_into,
    collide, combine_boundary, macroscopic_into, propagate_into, render_velocity_frame,
};

/// Frames are handed to the sink every this many steps during `run`.
const FRAME_INTERVAL: u64 = 5;

/// Domain lifecycle. Construction allocates and seeds the fields, so a
/// freshly built domain is already `Initialized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initialized,
    Stepping,
    Finished,
}

/// Per-fluid-component field state.
///
/// `rho` and `vel` are derived from `f` every step and never independently
/// mutated; `bforce` may be set by the driver between steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    /// Relaxation time, tau = 3*nu*dt/dx^2 + 0.5.
    pub tau: f32,
    /// Distribution field, cell-major with direction fastest.
    pub f: Vec<f32>,
    /// Density per cell.
    pub rho: Vec<f32>,
    /// Velocity per cell, always 3 components (z unused in 2D).
    pub vel: Vec<f32>,
    /// External body force per cell, 3 components.
    pub bforce: Vec<f32>,
}

/// Serializable checkpoint of all field state plus the clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub time: f32,
    pub step: u64,
    pub components: Vec<Component>,
}

/// Field statistics, reported on divergence and by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldStats {
    pub total_mass: f32,
    pub min_density: f32,
    pub max_density: f32,
    pub max_speed: f32,
    pub non_finite: usize,
}

impl FieldStats {
    pub fn from_component(comp: &Component) -> Self {
        let total_mass: f32 = comp.f.iter().sum();
        let mut min_density = f32::INFINITY;
        let mut max_density = f32::NEG_INFINITY;
        for &r in &comp.rho {
            min_density = min_density.min(r);
            max_density = max_density.max(r);
        }
        let max_speed = comp
            .vel
            .chunks_exact(3)
            .map(|u| (u[0] * u[0] + u[1] * u[1] + u[2] * u[2]).sqrt())
            .fold(0.0f32, f32::max);
        let non_finite = comp.f.iter().filter(|v| !v.is_finite()).count();

        Self {
            total_mass,
            min_density,
            max_density,
            max_speed,
            non_finite,
        }
    }
}

/// Runtime solver failures.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("simulation diverged at step {step} (component {component}): {stats:?}")]
    Diverged {
        step: u64,
        component: usize,
        stats: FieldStats,
    },
    #[error("frame sink error: {0}")]
    Frame(#[from] std::io::Error),
    #[error("snapshot does not match the domain layout")]
    SnapshotMismatch,
}

/// Outcome of a `run` call.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub steps_run: u64,
    pub time: f32,
    pub cancelled: bool,
}

/// Owner of all field state for one simulation.
///
/// Fields are created at construction, mutated in place every step, and are
/// never shared across domains. Lattice tables are immutable data shared by
/// all domains of a scheme.
pub struct Domain {
    config: SolverConfig,
    lattice: Lattice,
    width: usize,
    height: usize,
    depth: usize,
    cs: f32,
    mask: Vec<u8>,
    components: Vec<Component>,
    // per-component scratch, reused each step
    f_next: Vec<Vec<f32>>,
    f_bounce: Vec<Vec<f32>>,
    time: f32,
    step: u64,
    phase: Phase,
}

impl Domain {
    /// Validate the configuration and mask, allocate all fields and seed
    /// them to equilibrium at density 1 with zero velocity.
    pub fn new(config: SolverConfig, mask: &BoundaryMask) -> Result<Self, ConfigError> {
        config.validate()?;
        if mask.shape() != config.shape.as_slice() {
            return Err(ConfigError::MaskShapeMismatch {
                expected: config.shape.clone(),
                got: mask.shape().to_vec(),
            });
        }

        let (width, height, depth) = config.dims();
        if config.inlet.is_some() {
            // the inlet row is the first `width` cells of the flat layout
            for x in 0..width {
                if mask.cells()[x] != 0 {
                    return Err(ConfigError::BoundaryConflict { x });
                }
            }
        }

        let lattice = Lattice::new(config.scheme);
        let cells = width * height * depth;
        let q = lattice.q;

        let components: Vec<Component> = config
            .viscosity
            .iter()
            .map(|&nu| Component {
                tau: config.tau_for(nu),
                f: vec![0.0; cells * q],
                rho: vec![0.0; cells],
                vel: vec![0.0; cells * 3],
                bforce: vec![0.0; cells * 3],
            })
            .collect();
        let n = components.len();

        let mut domain = Self {
            cs: config.cs(),
            width,
            height,
            depth,
            mask: mask.cells().to_vec(),
            components,
            f_next: vec![vec![0.0; cells * q]; n],
            f_bounce: vec![vec![0.0; cells * q]; n],
            time: 0.0,
            step: 0,
            phase: Phase::Initialized,
            lattice,
            config,
        };
        domain.initialize();
        Ok(domain)
    }

    /// Seed every component to equilibrium with zero velocity (f = weights,
    /// density 1) and reset the clock. Calling this again makes re-running
    /// the solve idempotent.
    pub fn initialize(&mut self) {
        let q = self.lattice.q;
        for comp in &mut self.components {
            for (i, fi) in comp.f.iter_mut().enumerate() {
                *fi = self.lattice.weights[i % q];
            }
            for (idx, r) in comp.rho.iter_mut().enumerate() {
                *r = if self.mask[idx] == 0 { 1.0 } else { 0.0 };
            }
            comp.vel.fill(0.0);
        }
        self.time = 0.0;
        self.step = 0;
        self.phase = Phase::Initialized;
        info!(
            "domain initialized: {:?} {}x{}x{}, {} component(s)",
            self.config.scheme,
            self.width,
            self.height,
            self.depth,
            self.components.len()
        );
    }

    /// One collide-and-stream step:
    /// inlet -> propagate -> macroscopic -> bounce-back -> equilibrium ->
    /// collide -> combine -> commit. Components are decoupled and processed
    /// independently.
    pub fn step(&mut self) -> Result<(), SolverError> {
        self.phase = Phase::Stepping;

        let lattice = &self.lattice;
        let (width, height, depth) = (self.width, self.height, self.depth);
        let cs = self.cs;
        let dt = self.config.dt;
        let kind = self.config.collision;
        let mask = &self.mask;
        // inlet support is validated at construction, where the stencil is
        // guaranteed to exist for the configured scheme
        let inlet: Option<(f32, f32, InletStencil)> = match (&self.config.inlet, &lattice.inlet) {
            (Some(ic), Some(stencil)) => Some((ic.velocity, ic.density, *stencil)),
            _ => None,
        };

        self.components
            .par_iter_mut()
            .zip(self.f_next.par_iter_mut().zip(self.f_bounce.par_iter_mut()))
            .for_each(|(comp, (f_next, f_bounce))| {
                if let Some((u_in, rho_in, stencil)) = inlet {
                    apply_velocity_inlet(lattice, &stencil, &mut comp.f, width, u_in, rho_in);
                }

                propagate_into(lattice, &comp.f, f_next, width, height, depth);
                macroscopic_into(lattice, cs, f_next, mask, &mut comp.rho, &mut comp.vel);
                bounce_back_into(lattice, f_next, mask, f_bounce);
                collide(
                    kind,
                    lattice,
                    cs,
                    comp.tau,
                    dt,
                    f_next,
                    &comp.rho,
                    &comp.vel,
                    &comp.bforce,
                );
                combine_boundary(lattice.q, f_next, f_bounce, mask);

                std::mem::swap(&mut comp.f, f_next);
            });

        self.time += dt;
        self.step += 1;
        self.check_divergence()
    }

    /// Run until `target_time`, emitting a frame to the sink every fifth
    /// step. `num_steps = floor(target_time / dt)`.
    pub fn run(
        &mut self,
        target_time: f32,
        sink: Option<&mut dyn FrameSink>,
    ) -> Result<RunSummary, SolverError> {
        self.run_inner(target_time, sink, None)
    }

    /// Like `run`, but stops cooperatively at the next step boundary once
    /// `cancel` is set. A step in flight always completes.
    pub fn run_cancellable(
        &mut self,
        target_time: f32,
        sink: Option<&mut dyn FrameSink>,
        cancel: &AtomicBool,
    ) -> Result<RunSummary, SolverError> {
        self.run_inner(target_time, sink, Some(cancel))
    }

    fn run_inner(
        &mut self,
        target_time: f32,
        mut sink: Option<&mut dyn FrameSink>,
        cancel: Option<&AtomicBool>,
    ) -> Result<RunSummary, SolverError> {
        let num_steps = (target_time / self.config.dt).floor() as u64;
        info!("running {} step(s) to t = {}", num_steps, target_time);

        let mut steps_run = 0u64;
        let mut cancelled = false;
        let mut result: Result<(), SolverError> = Ok(());

        for i in 0..num_steps {
            if let Some(flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    info!("run cancelled at step boundary {}", self.step);
                    cancelled = true;
                    break;
                }
            }
            if let Some(s) = sink.as_deref_mut() {
                if i % FRAME_INTERVAL == 0 {
                    if let Err(e) = s.write_frame(&self.render_frame(0)) {
                        result = Err(SolverError::Frame(e));
                        break;
                    }
                }
            }
            if let Err(e) = self.step() {
                result = Err(e);
                break;
            }
            steps_run += 1;
        }

        // release exactly once, whatever ended the loop
        if let Some(s) = sink.as_deref_mut() {
            if let Err(e) = s.release() {
                if result.is_ok() {
                    result = Err(SolverError::Frame(e));
                }
            }
        }

        self.phase = Phase::Finished;
        result?;
        Ok(RunSummary {
            steps_run,
            time: self.time,
            cancelled,
        })
    }

    /// Render the velocity magnitude of one component's z = 0 slice.
    pub fn render_frame(&self, component: usize) -> VelocityFrame {
        render_velocity_frame(self.width, self.height, &self.components[component].vel)
    }

    fn check_divergence(&mut self) -> Result<(), SolverError> {
        for (ci, comp) in self.components.iter().enumerate() {
            let bad_f = comp.f.iter().any(|v| !v.is_finite());
            let bad_rho = comp
                .rho
                .iter()
                .zip(self.mask.iter())
                .any(|(r, &solid)| solid == 0 && (!r.is_finite() || *r < 0.0));
            if bad_f || bad_rho {
                let stats = FieldStats::from_component(comp);
                error!(
                    "divergence at step {} (component {}): {:?}",
                    self.step, ci, stats
                );
                self.phase = Phase::Finished;
                return Err(SolverError::Diverged {
                    step: self.step,
                    component: ci,
                    stats,
                });
            }
        }
        Ok(())
    }

    /// Checkpoint all field state plus the clock.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            time: self.time,
            step: self.step,
            components: self.components.clone(),
        }
    }

    /// Restore a checkpoint taken from a domain with the same layout.
    pub fn restore(&mut self, snapshot: Snapshot) -> Result<(), SolverError> {
        if snapshot.components.len() != self.components.len() {
            return Err(SolverError::SnapshotMismatch);
        }
        for (cur, new) in self.components.iter().zip(snapshot.components.iter()) {
            if new.f.len() != cur.f.len()
                || new.rho.len() != cur.rho.len()
                || new.vel.len() != cur.vel.len()
                || new.bforce.len() != cur.bforce.len()
            {
                return Err(SolverError::SnapshotMismatch);
            }
        }
        self.components = snapshot.components;
        self.time = snapshot.time;
        self.step = snapshot.step;
        self.phase = Phase::Initialized;
        Ok(())
    }

    /// Set a uniform body force on one component. Takes effect on the next
    /// step.
    pub fn set_body_force(&mut self, component: usize, g: [f32; 3]) {
        for cell in self.components[component].bforce.chunks_exact_mut(3) {
            cell.copy_from_slice(&g);
        }
    }

    #[inline]
    fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.height + y) * self.width + x
    }

    pub fn density(&self, component: usize, x: usize, y: usize, z: usize) -> f32 {
        self.components[component].rho[self.idx(x, y, z)]
    }

    pub fn velocity(&self, component: usize, x: usize, y: usize, z: usize) -> [f32; 3] {
        let base = self.idx(x, y, z) * 3;
        let u = &self.components[component].vel[base..base + 3];
        [u[0], u[1], u[2]]
    }

    /// Total mass of one component, summed over all populations.
    pub fn total_mass(&self, component: usize) -> f32 {
        self.components[component].f.iter().sum()
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.width, self.height, self.depth)
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn step_count(&self) -> u64 {
        self.step
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }
}
