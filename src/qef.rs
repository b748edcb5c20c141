//! Quadric Error Function accumulator and solver.
//!
//! Each sampled surface crossing contributes a tangent-plane constraint
//! (point + unit normal). Minimizing the summed squared plane distances
//! places the representative vertex of a cell. The accumulator merges by
//! component-wise addition, which is what makes bottom-up simplification
//! independent of traversal order.

use crate::config::QefParams;
use crate::svd::{self, SMat3};
use glam::Vec3A;

/// Accumulated plane constraints: `ATA`, `ATb`, `btb`, plus the running sum
/// of sample points for the mass-point fallback.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct QefData {
    pub ata: SMat3,
    pub atb: Vec3A,
    pub btb: f32,
    pub mass_point_sum: Vec3A,
    pub num_points: u32,
}

impl QefData {
    /// Component-wise sum; commutative and associative.
    pub fn merge(&mut self, rhs: &QefData) {
        self.ata.add(&rhs.ata);
        self.atb += rhs.atb;
        self.btb += rhs.btb;
        self.mass_point_sum += rhs.mass_point_sum;
        self.num_points += rhs.num_points;
    }
}

#[derive(Clone, Debug, Default)]
pub struct QefSolver {
    data: QefData,
}

impl QefSolver {
    pub fn from_data(data: QefData) -> Self {
        Self { data }
    }

    pub fn data(&self) -> QefData {
        self.data
    }

    pub fn num_points(&self) -> u32 {
        self.data.num_points
    }

    /// Add the tangent-plane constraint through `p` with normal `n`.
    pub fn add(&mut self, p: Vec3A, n: Vec3A) {
        let n = n.normalize();
        self.data.ata.m00 += n.x * n.x;
        self.data.ata.m01 += n.x * n.y;
        self.data.ata.m02 += n.x * n.z;
        self.data.ata.m11 += n.y * n.y;
        self.data.ata.m12 += n.y * n.z;
        self.data.ata.m22 += n.z * n.z;
        let dot = p.dot(n);
        self.data.atb += dot * n;
        self.data.btb += dot * dot;
        self.data.mass_point_sum += p;
        self.data.num_points += 1;
    }

    /// Fold another accumulator into this one.
    pub fn merge(&mut self, rhs: &QefData) {
        self.data.merge(rhs);
    }

    /// Mean of the accumulated sample points.
    pub fn mass_point(&self) -> Vec3A {
        debug_assert!(self.data.num_points > 0);
        self.data.mass_point_sum / self.data.num_points as f32
    }

    /// Residual `x^T A x - 2 x^T b + btb` at `p`.
    pub fn error_at(&self, p: Vec3A) -> f32 {
        let atax = self.data.ata.vmul(p);
        p.dot(atax) - 2.0 * p.dot(self.data.atb) + self.data.btb
    }

    /// Minimize the quadric, returning the optimal position and the residual
    /// error there.
    ///
    /// The system is shifted to the mass point before the eigensolve so the
    /// pseudoinverse truncation pins unconstrained directions to the mass
    /// point instead of the origin.
    ///
    /// # Panics
    ///
    /// Panics if no constraints were accumulated; construction guarantees at
    /// least one crossing before any cell vertex is solved.
    pub fn solve(&self, params: &QefParams) -> (Vec3A, f32) {
        assert!(
            self.data.num_points > 0,
            "QEF solve requires at least one accumulated plane"
        );
        let mass_point = self.mass_point();
        let shifted_b = self.data.atb - self.data.ata.vmul(mass_point);
        let x = svd::solve_symmetric(
            &self.data.ata,
            shifted_b,
            params.error_tol,
            params.sweeps,
            params.pinv_tol,
        ) + mass_point;
        (x, self.error_at(x))
    }
}
