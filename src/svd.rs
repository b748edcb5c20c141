//! Symmetric 3x3 eigendecomposition for the QEF solver.
//!
//! Cyclic Jacobi sweeps with Givens rotations, followed by a truncated
//! pseudoinverse solve. Small enough that a fixed sweep count (4 by default)
//! reaches machine precision for well-conditioned inputs.

use glam::{Mat3A, Vec3A};

/// One triangle of a symmetric 3x3 matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SMat3 {
    pub m00: f32,
    pub m01: f32,
    pub m02: f32,
    pub m11: f32,
    pub m12: f32,
    pub m22: f32,
}

impl SMat3 {
    /// Symmetric matrix-vector product.
    pub fn vmul(&self, v: Vec3A) -> Vec3A {
        Vec3A::new(
            self.m00 * v.x + self.m01 * v.y + self.m02 * v.z,
            self.m01 * v.x + self.m11 * v.y + self.m12 * v.z,
            self.m02 * v.x + self.m12 * v.y + self.m22 * v.z,
        )
    }

    /// Frobenius norm.
    pub fn fnorm(&self) -> f32 {
        (self.m00 * self.m00
            + self.m11 * self.m11
            + self.m22 * self.m22
            + 2.0 * (self.m01 * self.m01 + self.m02 * self.m02 + self.m12 * self.m12))
            .sqrt()
    }

    /// Norm of the off-diagonal entries.
    pub fn off(&self) -> f32 {
        (2.0 * (self.m01 * self.m01 + self.m02 * self.m02 + self.m12 * self.m12)).sqrt()
    }

    pub fn add(&mut self, rhs: &SMat3) {
        self.m00 += rhs.m00;
        self.m01 += rhs.m01;
        self.m02 += rhs.m02;
        self.m11 += rhs.m11;
        self.m12 += rhs.m12;
        self.m22 += rhs.m22;
    }
}

/// Coefficients of the symmetric Givens rotation annihilating `a_pq`.
fn givens_coefficients(a_pp: f32, a_pq: f32, a_qq: f32) -> (f32, f32) {
    if a_pq == 0.0 {
        return (1.0, 0.0);
    }
    let tau = (a_qq - a_pp) / (2.0 * a_pq);
    let stt = (1.0 + tau * tau).sqrt();
    let tan = 1.0 / if tau >= 0.0 { tau + stt } else { tau - stt };
    let c = 1.0 / (1.0 + tan * tan).sqrt();
    (c, tan * c)
}

fn rotate01(vtav: &mut SMat3, v: &mut Mat3A) {
    if vtav.m01 == 0.0 {
        return;
    }
    let (c, s) = givens_coefficients(vtav.m00, vtav.m01, vtav.m11);
    let (cc, ss) = (c * c, s * s);
    let mix = 2.0 * c * s * vtav.m01;
    *vtav = SMat3 {
        m00: cc * vtav.m00 - mix + ss * vtav.m11,
        m01: 0.0,
        m02: c * vtav.m02 - s * vtav.m12,
        m11: ss * vtav.m00 + mix + cc * vtav.m11,
        m12: s * vtav.m02 + c * vtav.m12,
        m22: vtav.m22,
    };
    let (c0, c1) = (v.x_axis, v.y_axis);
    v.x_axis = c * c0 - s * c1;
    v.y_axis = s * c0 + c * c1;
}

fn rotate02(vtav: &mut SMat3, v: &mut Mat3A) {
    if vtav.m02 == 0.0 {
        return;
    }
    let (c, s) = givens_coefficients(vtav.m00, vtav.m02, vtav.m22);
    let (cc, ss) = (c * c, s * s);
    let mix = 2.0 * c * s * vtav.m02;
    *vtav = SMat3 {
        m00: cc * vtav.m00 - mix + ss * vtav.m22,
        m01: c * vtav.m01 - s * vtav.m12,
        m02: 0.0,
        m11: vtav.m11,
        m12: s * vtav.m01 + c * vtav.m12,
        m22: ss * vtav.m00 + mix + cc * vtav.m22,
    };
    let (c0, c2) = (v.x_axis, v.z_axis);
    v.x_axis = c * c0 - s * c2;
    v.z_axis = s * c0 + c * c2;
}

fn rotate12(vtav: &mut SMat3, v: &mut Mat3A) {
    if vtav.m12 == 0.0 {
        return;
    }
    let (c, s) = givens_coefficients(vtav.m11, vtav.m12, vtav.m22);
    let (cc, ss) = (c * c, s * s);
    let mix = 2.0 * c * s * vtav.m12;
    *vtav = SMat3 {
        m00: vtav.m00,
        m01: c * vtav.m01 - s * vtav.m02,
        m02: s * vtav.m01 + c * vtav.m02,
        m11: cc * vtav.m11 - mix + ss * vtav.m22,
        m12: 0.0,
        m22: ss * vtav.m11 + mix + cc * vtav.m22,
    };
    let (c1, c2) = (v.y_axis, v.z_axis);
    v.y_axis = c * c1 - s * c2;
    v.z_axis = s * c1 + c * c2;
}

/// Reciprocal of an eigenvalue, truncated to zero when either the value or
/// its reciprocal falls below `tol`.
fn pinv_entry(d: f32, tol: f32) -> f32 {
    if d.abs() < tol || (1.0 / d).abs() < tol {
        0.0
    } else {
        1.0 / d
    }
}

/// `V * pinv(D) * V^T` for eigenvalues `d` in the basis `v`.
fn pseudoinverse(d: Vec3A, v: &Mat3A, tol: f32) -> Mat3A {
    let inv = Vec3A::new(
        pinv_entry(d.x, tol),
        pinv_entry(d.y, tol),
        pinv_entry(d.z, tol),
    );
    Mat3A::from_cols(v.x_axis * inv.x, v.y_axis * inv.y, v.z_axis * inv.z) * v.transpose()
}

/// Least-squares solution of the symmetric system `A x = b`.
///
/// Runs up to `sweeps` cyclic Jacobi sweeps, each annihilating the
/// off-diagonal pairs in order (0,1), (0,2), (1,2), stopping early once the
/// off-diagonal norm drops below `svd_tol` times the Frobenius norm of `a`.
/// Near-singular directions are truncated by `pinv_tol` rather than treated
/// as errors.
pub fn solve_symmetric(a: &SMat3, b: Vec3A, svd_tol: f32, sweeps: u32, pinv_tol: f32) -> Vec3A {
    let mut vtav = *a;
    let mut v = Mat3A::IDENTITY;
    let delta = svd_tol * vtav.fnorm();
    for _ in 0..sweeps {
        if vtav.off() <= delta {
            break;
        }
        rotate01(&mut vtav, &mut v);
        rotate02(&mut vtav, &mut v);
        rotate12(&mut vtav, &mut v);
    }
    let eigenvalues = Vec3A::new(vtav.m00, vtav.m11, vtav.m22);
    pseudoinverse(eigenvalues, &v, pinv_tol) * b
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f32 = 1e-6;
    const SWEEPS: u32 = 4;

    fn assert_near(a: Vec3A, b: Vec3A, eps: f32) {
        assert!((a - b).length() < eps, "{a} != {b}");
    }

    #[test]
    fn solves_diagonal_system_exactly() {
        let a = SMat3 {
            m00: 2.0,
            m11: 3.0,
            m22: 4.0,
            ..Default::default()
        };
        let x = solve_symmetric(&a, Vec3A::new(2.0, 3.0, 4.0), TOL, SWEEPS, TOL);
        assert_near(x, Vec3A::ONE, 1e-5);
    }

    #[test]
    fn solves_coupled_system() {
        // A = [[2,1,0],[1,2,0],[0,0,1]], b = A * (1,1,1)
        let a = SMat3 {
            m00: 2.0,
            m01: 1.0,
            m11: 2.0,
            m22: 1.0,
            ..Default::default()
        };
        let b = a.vmul(Vec3A::ONE);
        let x = solve_symmetric(&a, b, TOL, SWEEPS, TOL);
        assert_near(x, Vec3A::ONE, 1e-4);
    }

    #[test]
    fn truncates_singular_directions() {
        // Rank-1 system: only the x direction is constrained.
        let a = SMat3 {
            m00: 1.0,
            ..Default::default()
        };
        let x = solve_symmetric(&a, Vec3A::new(2.0, 0.0, 0.0), TOL, SWEEPS, TOL);
        assert_near(x, Vec3A::new(2.0, 0.0, 0.0), 1e-5);
    }

    #[test]
    fn off_diagonal_norm_reaches_zero_after_sweeps() {
        let mut vtav = SMat3 {
            m00: 4.0,
            m01: 1.0,
            m02: 2.0,
            m11: 5.0,
            m12: 3.0,
            m22: 6.0,
        };
        let mut v = Mat3A::IDENTITY;
        for _ in 0..SWEEPS {
            rotate01(&mut vtav, &mut v);
            rotate02(&mut vtav, &mut v);
            rotate12(&mut vtav, &mut v);
        }
        assert!(vtav.off() < 1e-4 * vtav.fnorm());
    }
}
