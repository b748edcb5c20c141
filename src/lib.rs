//! Adaptive octree dual contouring.
//!
//! Converts a scalar density field (negative = solid) into a triangle mesh
//! approximating its zero level set. One vertex is fitted per surface cell
//! by minimizing a quadric error function over sampled tangent planes, the
//! octree is simplified bottom-up under an error threshold, and triangles
//! are emitted across cell adjacency wherever the field changes sign.
//!
//! The pipeline is a pure, single-threaded transformation over an arena the
//! run exclusively owns; independent runs (e.g. separate terrain chunks)
//! share no state and can execute on separate workers. The phases are also
//! callable individually ([`Octree::build`], [`Octree::simplify`],
//! [`Octree::extract`]) so hosts can yield between them; an abandoned run is
//! discarded whole, never resumed mid-phase.
//!
//! # References
//!
//! - Tao Ju, Frank Losasso, Scott Schaefer, Joe Warren ["Dual Contouring of
//!   Hermite Data"](https://www.cs.rice.edu/~jwarren/papers/dualcontour.pdf)

mod config;
mod contour;
mod density;
mod mesh;
mod octree;
mod qef;
mod svd;
mod tables;

pub mod sdf_primitives;

pub use config::*;
pub use density::*;
pub use mesh::*;
pub use octree::*;
pub use qef::*;
pub use svd::SMat3;

/// Generate a mesh of the zero level set of `field` within the octree
/// described by `config`: validate, build, simplify, extract.
pub fn generate_mesh(
    field: &impl DensityField,
    config: &MeshConfig,
) -> Result<MeshBuffers, ConfigError> {
    config.validate()?;
    let mut octree = Octree::build(field, config);
    octree.simplify(config.threshold, &config.qef);
    let mut buffers = MeshBuffers::default();
    octree.extract(&mut buffers);
    Ok(buffers)
}
