//! End-to-end pipeline tests over the public API.

use glam::Vec3A;
use octree_mesher::{generate_mesh, sdf_primitives, ConfigError, MeshConfig};

fn sphere_config(size: u32, threshold: f32) -> MeshConfig {
    MeshConfig {
        origin: Vec3A::splat(-(size as f32) / 2.0),
        size,
        threshold,
        ..Default::default()
    }
}

#[test]
fn uniform_field_produces_an_empty_mesh() {
    let config = MeshConfig {
        size: 8,
        ..Default::default()
    };
    let buffers = generate_mesh(&|_: Vec3A| 5.0, &config).unwrap();
    assert!(buffers.is_empty());
    assert!(buffers.triangles.is_empty());
}

#[test]
fn invalid_size_fails_before_building() {
    let config = MeshConfig {
        size: 12,
        ..Default::default()
    };
    let result = generate_mesh(&|_: Vec3A| 5.0, &config);
    assert_eq!(result.unwrap_err(), ConfigError::SizeNotPowerOfTwo(12));
}

#[test]
fn sphere_mesh_hugs_the_surface() {
    let radius = 5.0;
    let field = sdf_primitives::sphere(Vec3A::ZERO, radius);
    let buffers = generate_mesh(&field, &sphere_config(16, 0.0)).unwrap();

    assert!(!buffers.is_empty());
    assert!(!buffers.triangles.is_empty());
    assert_eq!(buffers.positions.len(), buffers.normals.len());

    // Every fitted vertex stays inside its unit surface cell, so it can be
    // at most a cell diagonal away from the sphere.
    for p in &buffers.positions {
        assert!(
            (p.length() - radius).abs() < 1.75,
            "vertex {p} strayed from the surface"
        );
    }
    // Normals point outward and are unit length.
    for (p, n) in buffers.positions.iter().zip(&buffers.normals) {
        assert!((n.length() - 1.0).abs() < 1e-3);
        assert!(n.dot(p.normalize()) > 0.5);
    }
}

#[test]
fn every_index_references_an_emitted_vertex() {
    let field = sdf_primitives::sphere(Vec3A::ZERO, 5.0);
    let buffers = generate_mesh(&field, &sphere_config(16, 0.1)).unwrap();
    let vertex_count = buffers.num_vertices() as u32;
    assert!(vertex_count > 0);
    for tri in &buffers.triangles {
        for &index in tri {
            assert!(index < vertex_count);
        }
    }
}

#[test]
fn identical_runs_produce_identical_buffers() {
    let field = sdf_primitives::torus(Vec3A::ZERO, glam::Vec2::new(4.0, 1.5));
    let config = sphere_config(16, 0.5);
    let first = generate_mesh(&field, &config).unwrap();
    let second = generate_mesh(&field, &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn simplification_reduces_vertex_count() {
    let field = sdf_primitives::sphere(Vec3A::ZERO, 5.0);
    let exact = generate_mesh(&field, &sphere_config(16, 0.0)).unwrap();
    let coarse = generate_mesh(&field, &sphere_config(16, 50.0)).unwrap();
    assert!(coarse.num_vertices() < exact.num_vertices());
    let vertex_count = coarse.num_vertices() as u32;
    for tri in &coarse.triangles {
        for &index in tri {
            assert!(index < vertex_count);
        }
    }
}

#[test]
fn fully_collapsed_volume_keeps_one_vertex_and_no_triangles() {
    // Solid everywhere except an air pocket straddling one corner leaf.
    let field = |p: Vec3A| 0.5 - p.length();
    let config = MeshConfig {
        size: 8,
        threshold: f32::INFINITY,
        ..Default::default()
    };
    let buffers = generate_mesh(&field, &config).unwrap();
    assert_eq!(buffers.num_vertices(), 1);
    assert!(buffers.triangles.is_empty());
}
