//! Builds the tree for given `.obj` file, saves it next to the mesh, loads it
//! back and shoots a grid of rays through it.
//!
//! ```text
//! RUST_LOG=debug cargo run --example precompute -- path/to/mesh.obj
//! ```

use std::env;
use std::path::PathBuf;

use glam::vec3;
use tribvh::{Mesh, Ray};

const GRID: usize = 32;

fn main() -> tribvh::Result<()> {
    env_logger::init();

    let Some(mesh_path) = env::args().nth(1).map(PathBuf::from) else {
        eprintln!("usage: precompute <mesh.obj> [tree.bvh]");
        return Ok(());
    };

    let tree_path = env::args()
        .nth(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| mesh_path.with_extension("bvh"));

    let built = Mesh::precompute(&mesh_path, &tree_path)?;
    let loaded = Mesh::load(&mesh_path, &tree_path)?;

    let Some(root) = loaded.bvh() else {
        println!("{} has no triangles", mesh_path.display());
        return Ok(());
    };

    if built.bvh() != Some(root) {
        eprintln!("tree loaded from {} differs", tree_path.display());
    }

    println!(
        "{}: triangles={}, nodes={}, leaves={}, depth={}",
        tree_path.display(),
        loaded.triangles().len(),
        root.node_count(),
        root.leaf_count(),
        root.depth(),
    );

    if root.node_count() <= 31 {
        root.print();
    }

    // Shoot rays along -z, from just in front of the mesh, over its extent
    let bounds = root.bounds();
    let (min, max) = (bounds.min(), bounds.max());
    let mut hits = 0;
    let mut mismatches = 0;

    for y in 0..GRID {
        for x in 0..GRID {
            let fx = (x as f32 + 0.5) / GRID as f32;
            let fy = (y as f32 + 0.5) / GRID as f32;

            let origin = vec3(
                min.x + (max.x - min.x) * fx,
                min.y + (max.y - min.y) * fy,
                max.z + 1.0,
            );

            let ray = Ray::new(origin, vec3(0.0, 0.0, -1.0));
            let hit = loaded.trace(&ray);

            if hit.is_some() {
                hits += 1;
            }

            let expected = ray.trace_naive(loaded.triangles());

            if hit.triangle_id != expected.triangle_id {
                mismatches += 1;
            }
        }
    }

    println!(
        "rays={}, hits={}, mismatches={}",
        GRID * GRID,
        hits,
        mismatches
    );

    Ok(())
}
