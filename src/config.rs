//! Mesh generation configuration and fail-fast validation.

use glam::Vec3A;
use thiserror::Error;

/// Tolerances for the QEF solve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QefParams {
    /// Relative off-diagonal norm at which Jacobi sweeps stop early.
    pub error_tol: f32,
    /// Maximum number of cyclic Jacobi sweeps.
    pub sweeps: u32,
    /// Eigenvalues with magnitude or reciprocal magnitude below this are
    /// truncated in the pseudoinverse.
    pub pinv_tol: f32,
}

impl Default for QefParams {
    fn default() -> Self {
        Self {
            error_tol: 1e-6,
            sweeps: 4,
            pinv_tol: 1e-6,
        }
    }
}

/// Configuration for one mesh generation run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshConfig {
    /// World-space min corner of the octree root cell.
    pub origin: Vec3A,
    /// Edge length of the root cell. Must be a nonzero power of two.
    pub size: u32,
    /// Residual error budget for collapsing a subtree. Zero or negative
    /// disables simplification.
    pub threshold: f32,
    pub qef: QefParams,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            origin: Vec3A::ZERO,
            size: 64,
            threshold: 1.0,
            qef: QefParams::default(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("octree size must be nonzero")]
    ZeroSize,
    #[error("octree size must be a power of two, got {0}")]
    SizeNotPowerOfTwo(u32),
}

impl MeshConfig {
    /// Validate at the configuration boundary instead of failing deep in
    /// recursion.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::ZeroSize);
        }
        if !self.size.is_power_of_two() {
            return Err(ConfigError::SizeNotPowerOfTwo(self.size));
        }
        Ok(())
    }
}
