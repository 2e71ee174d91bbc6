use crate::bvh;
use crate::{BvhNode, Hit, Mesh, Ray, Triangle};

/// Many meshes merged into a single tree.
#[derive(Clone, Debug)]
pub struct Scene {
    triangles: Vec<Triangle>,
    bvh: BvhNode,
}

impl Scene {
    /// Merges given meshes, in order, into a single scene.
    ///
    /// Meshes without any geometry are skipped; returns `None` if there's
    /// nothing left.
    pub fn build(meshes: Vec<Mesh>) -> Option<Self> {
        let mesh_count = meshes.len();

        let objects: Vec<_> = meshes
            .into_iter()
            .filter_map(|mesh| match mesh.into_parts() {
                (Some(root), triangles) => Some((root, triangles)),
                (None, _) => None,
            })
            .collect();

        if objects.len() < mesh_count {
            log::debug!(
                "Skipping {} mesh(es) without geometry",
                mesh_count - objects.len()
            );
        }

        let (bvh, triangles) = bvh::merge(objects)?;

        Some(Self { triangles, bvh })
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn bvh(&self) -> &BvhNode {
        &self.bvh
    }

    /// Returns the nearest triangle hit by given ray; the triangle id refers
    /// to [`Self::triangles()`].
    pub fn trace(&self, ray: &Ray) -> Hit {
        ray.trace_nearest(&self.bvh, &self.triangles)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{vec3, Vec3};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::TriangleId;

    fn triangle(offset: Vec3) -> Triangle {
        Triangle::default().with_vertices([
            offset,
            offset + vec3(1.0, 0.0, 0.0),
            offset + vec3(0.0, 1.0, 0.0),
        ])
    }

    /// Three objects, as in: a floor, a pillar and a cloud of triangles
    /// floating next to it.
    fn meshes() -> Vec<Mesh> {
        let mut rng = StdRng::seed_from_u64(7);

        let floor = (0..10)
            .flat_map(|x| (0..10).map(move |z| (x, z)))
            .map(|(x, z)| {
                let (x, z) = (x as f32, z as f32);

                Triangle::default().with_vertices([
                    vec3(x, 0.0, z),
                    vec3(x + 1.0, 0.0, z),
                    vec3(x, 0.0, z + 1.0),
                ])
            })
            .collect();

        let pillar = (0..20)
            .map(|y| triangle(vec3(4.0, y as f32, 4.0)))
            .collect();

        let cloud = (0..50)
            .map(|_| {
                triangle(vec3(
                    rng.gen_range(12.0..20.0),
                    rng.gen_range(1.0..5.0),
                    rng.gen_range(0.0..8.0),
                ))
            })
            .collect();

        vec![Mesh::new(floor), Mesh::new(pillar), Mesh::new(cloud)]
    }

    #[test]
    fn build() {
        let target = Scene::build(meshes()).unwrap();

        assert_eq!(170, target.triangles().len());

        target.bvh().validate();

        let mut ids: Vec<_> =
            target.bvh().triangle_ids().map(|id| id.get()).collect();

        ids.sort();

        assert_eq!((0..170).collect::<Vec<_>>(), ids);
    }

    #[test]
    fn build_skips_empty_meshes() {
        let meshes = vec![
            Mesh::new(Vec::new()),
            Mesh::new(vec![triangle(Vec3::ZERO)]),
            Mesh::new(Vec::new()),
        ];

        let target = Scene::build(meshes).unwrap();

        assert_eq!(1, target.triangles().len());
        assert!(target.bvh().is_leaf());

        assert_eq!(None, Scene::build(Vec::new()).map(|scene| scene.bvh));
        assert_eq!(
            None,
            Scene::build(vec![Mesh::new(Vec::new())]).map(|scene| scene.bvh)
        );
    }

    #[test]
    fn trace() {
        let target = Scene::build(meshes()).unwrap();

        // Straight down onto the floor; the 10x10 floor comes first, so its
        // triangles keep their ids
        let ray = Ray::new(vec3(2.2, 10.0, 7.2), vec3(0.0, -1.0, 0.0));
        let hit = target.trace(&ray);

        assert_eq!(Some(TriangleId::new(27)), hit.triangle_id);
        assert_relative_eq!(10.0, hit.distance);

        // Into the pillar from the side; its triangles are shifted past the
        // floor's
        let ray = Ray::new(vec3(4.2, 3.2, -5.0), vec3(0.0, 0.0, 1.0));
        let hit = target.trace(&ray);

        assert_eq!(Some(TriangleId::new(103)), hit.triangle_id);
        assert_relative_eq!(9.0, hit.distance);
    }

    #[test]
    fn trace_matches_naive() {
        let target = Scene::build(meshes()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut hits = 0;

        for _ in 0..500 {
            let origin = vec3(
                rng.gen_range(-5.0..25.0),
                rng.gen_range(-5.0..10.0),
                -10.0,
            );

            let direction = vec3(
                rng.gen_range(-0.5..0.5),
                rng.gen_range(-0.5..0.5),
                1.0,
            );

            let ray = Ray::new(origin, direction);
            let expected = ray.trace_naive(target.triangles());
            let actual = target.trace(&ray);

            assert_eq!(expected.triangle_id, actual.triangle_id);

            if expected.is_some() {
                assert_relative_eq!(expected.distance, actual.distance);
                hits += 1;
            }
        }

        assert!(hits > 0);
    }
}
