use std::fs::File;
use std::path::Path;

use glam::{vec2, vec3, Vec2, Vec3};

use crate::bvh::{self, BuildPolicy};
use crate::{BvhNode, Error, Hit, Ray, Result, Triangle};

/// Triangles of a single object, together with the tree built over them.
///
/// The tree is `None` only when there are no triangles.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    triangles: Vec<Triangle>,
    bvh: Option<BvhNode>,
}

impl Mesh {
    /// Creates a mesh and builds its tree using [`BuildPolicy::Median`].
    pub fn new(triangles: Vec<Triangle>) -> Self {
        Self::with_policy(triangles, BuildPolicy::default())
    }

    pub fn with_policy(triangles: Vec<Triangle>, policy: BuildPolicy) -> Self {
        let bvh = bvh::build_with(policy, &triangles, 0..triangles.len());

        Self { triangles, bvh }
    }

    /// Loads triangles from given `.obj` file and builds the tree over them.
    pub fn from_obj(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(load_obj(path.as_ref())?))
    }

    /// Loads triangles from given `.obj` file and the tree from given `.bvh`
    /// file, without rebuilding it.
    ///
    /// The tree must reference each of the mesh's triangles exactly once.
    pub fn load(
        mesh_path: impl AsRef<Path>,
        tree_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let tree_path = tree_path.as_ref();
        let triangles = load_obj(mesh_path.as_ref())?;
        let bvh = bvh::load_tree(tree_path, triangles.len())?;

        check_coverage(tree_path, bvh.as_ref(), triangles.len())?;

        Ok(Self { triangles, bvh })
    }

    /// Loads triangles from given `.obj` file, builds the tree and saves it
    /// into `tree_path`, so that it can be later loaded with
    /// [`Self::load()`].
    pub fn precompute(
        mesh_path: impl AsRef<Path>,
        tree_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let this = Self::from_obj(mesh_path)?;

        this.save_bvh(tree_path)?;

        Ok(this)
    }

    /// Saves the tree into given file; meshes without triangles produce an
    /// empty file.
    pub fn save_bvh(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(root) = &self.bvh {
            bvh::save(path, root)
        } else {
            File::create(path).map_err(|err| Error::io(path, err))?;

            log::info!("Saved tree to {}: empty", path.display());

            Ok(())
        }
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn bvh(&self) -> Option<&BvhNode> {
        self.bvh.as_ref()
    }

    pub fn into_parts(self) -> (Option<BvhNode>, Vec<Triangle>) {
        (self.bvh, self.triangles)
    }

    /// Returns the nearest triangle hit by given ray.
    pub fn trace(&self, ray: &Ray) -> Hit {
        if let Some(root) = &self.bvh {
            ray.trace_nearest(root, &self.triangles)
        } else {
            Hit::none()
        }
    }
}

/// Checks that the tree references each of `triangle_count` triangles exactly
/// once.
fn check_coverage(
    path: &Path,
    bvh: Option<&BvhNode>,
    triangle_count: usize,
) -> Result<()> {
    let mismatch = |reason: String| Error::Mismatch {
        path: path.to_owned(),
        reason,
    };

    let Some(root) = bvh else {
        if triangle_count == 0 {
            return Ok(());
        }

        return Err(mismatch(format!(
            "tree is empty, but mesh has {} triangles",
            triangle_count
        )));
    };

    let mut seen = vec![false; triangle_count];

    for triangle_id in root.triangle_ids() {
        let Some(seen) = seen.get_mut(triangle_id.get() as usize) else {
            return Err(mismatch(format!(
                "triangle {} is out of range",
                triangle_id.get()
            )));
        };

        if *seen {
            return Err(mismatch(format!(
                "triangle {} is referenced more than once",
                triangle_id.get()
            )));
        }

        *seen = true;
    }

    if let Some(id) = seen.iter().position(|seen| !seen) {
        return Err(mismatch(format!("triangle {} is never referenced", id)));
    }

    Ok(())
}

/// Loads all models from given `.obj` file as a single list of triangles.
///
/// Faces are triangulated; missing normals and texture coordinates are
/// filled with zeros.
fn load_obj(path: &Path) -> Result<Vec<Triangle>> {
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };

    let (models, _) =
        tobj::load_obj(path, &options).map_err(|source| match source {
            tobj::LoadError::OpenFileFailed => Error::NotFound {
                path: path.to_owned(),
            },
            source => Error::Mesh {
                path: path.to_owned(),
                source,
            },
        })?;

    let mut triangles = Vec::new();

    for model in &models {
        let mesh = &model.mesh;

        let position = |idx: usize| {
            vec3(
                mesh.positions[3 * idx],
                mesh.positions[3 * idx + 1],
                mesh.positions[3 * idx + 2],
            )
        };

        let normal = |idx: usize| {
            if mesh.normals.is_empty() {
                Vec3::ZERO
            } else {
                vec3(
                    mesh.normals[3 * idx],
                    mesh.normals[3 * idx + 1],
                    mesh.normals[3 * idx + 2],
                )
            }
        };

        let uv = |idx: usize| {
            if mesh.texcoords.is_empty() {
                Vec2::ZERO
            } else {
                vec2(mesh.texcoords[2 * idx], mesh.texcoords[2 * idx + 1])
            }
        };

        for face in mesh.indices.chunks_exact(3) {
            let face = [face[0], face[1], face[2]].map(|idx| idx as usize);

            triangles.push(Triangle::new(
                face.map(position),
                face.map(normal),
                face.map(uv),
            ));
        }
    }

    log::info!(
        "Loaded mesh from {}: models={}, triangles={}",
        path.display(),
        models.len(),
        triangles.len(),
    );

    Ok(triangles)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use approx::assert_relative_eq;

    use super::*;
    use crate::TriangleId;

    const TETRAHEDRON: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
v 0 0 1
vn 0 0 -1
vn 0 0 -1
vn 0 0 -1
vn 0 0 -1
f 1//1 3//3 2//2
f 1//1 2//2 4//4
f 1//1 4//4 3//3
f 2//2 3//3 4//4
";

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tribvh-mesh-{}", name))
    }

    fn write_obj(name: &str, source: &str) -> PathBuf {
        let path = temp_path(name);

        fs::write(&path, source).unwrap();

        path
    }

    /// A strip of `count` unit quads laid out along the x axis.
    fn strip(count: usize) -> String {
        let mut source = String::new();

        for i in 0..=count {
            source += &format!("v {} 0 0\nv {} 1 0\n", i, i);
        }

        for i in 0..count {
            let v = 2 * i + 1;

            source += &format!("f {} {} {} {}\n", v, v + 2, v + 3, v + 1);
        }

        source
    }

    #[test]
    fn from_obj() {
        let path = write_obj("from-obj.obj", TETRAHEDRON);
        let target = Mesh::from_obj(&path).unwrap();

        assert_eq!(4, target.triangles().len());

        assert_eq!(
            [
                vec3(0.0, 0.0, 0.0),
                vec3(0.0, 1.0, 0.0),
                vec3(1.0, 0.0, 0.0)
            ],
            target.triangles()[0].vertices()
        );

        assert_eq!([vec3(0.0, 0.0, -1.0); 3], target.triangles()[0].normals());
        assert_eq!([Vec2::ZERO; 3], target.triangles()[0].uvs());

        let root = target.bvh().unwrap();

        assert!(root.is_leaf());
        assert_eq!(4, root.triangle_ids().count());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn from_obj_triangulates_quads() {
        let path = write_obj("quads.obj", &strip(10));
        let target = Mesh::from_obj(&path).unwrap();

        assert_eq!(20, target.triangles().len());
        assert!(target
            .triangles()
            .iter()
            .all(|triangle| triangle.normals() == [Vec3::ZERO; 3]));

        let root = target.bvh().unwrap();

        assert!(!root.is_leaf());
        root.validate();

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn from_missing_obj() {
        let err = Mesh::from_obj(temp_path("missing.obj")).unwrap_err();

        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn precompute_and_load() {
        let mesh_path = write_obj("precompute.obj", &strip(25));
        let tree_path = temp_path("precompute.bvh");

        let expected = Mesh::precompute(&mesh_path, &tree_path).unwrap();
        let actual = Mesh::load(&mesh_path, &tree_path).unwrap();

        assert_eq!(expected.triangles(), actual.triangles());
        assert_eq!(expected.bvh(), actual.bvh());

        let ray = Ray::new(vec3(12.25, 0.5, 1.0), vec3(0.0, 0.0, -1.0));
        let hit = actual.trace(&ray);

        assert_eq!(ray.trace_naive(actual.triangles()), hit);
        assert_relative_eq!(1.0, hit.distance);

        // The strip's 13th quad spans x in 12..13
        let triangle_id = hit.triangle_id.unwrap().get();

        assert!(triangle_id == 24 || triangle_id == 25);

        fs::remove_file(&mesh_path).unwrap();
        fs::remove_file(&tree_path).unwrap();
    }

    #[test]
    fn load_with_mismatched_tree() {
        let big_path = write_obj("mismatched-big.obj", &strip(8));
        let small_path = write_obj("mismatched-small.obj", &strip(2));
        let tree_path = temp_path("mismatched.bvh");

        Mesh::precompute(&big_path, &tree_path).unwrap();

        let err = Mesh::load(&small_path, &tree_path).unwrap_err();

        assert!(matches!(
            err,
            Error::IndexOutOfRange {
                triangle_count: 4,
                ..
            }
        ));

        fs::remove_file(&big_path).unwrap();
        fs::remove_file(&small_path).unwrap();
        fs::remove_file(&tree_path).unwrap();
    }

    fn mismatch_reason(mesh_path: &Path, tree_path: &Path) -> String {
        match Mesh::load(mesh_path, tree_path) {
            Err(Error::Mismatch { path, reason }) => {
                assert_eq!(tree_path, path);
                reason
            }
            other => panic!("expected a mismatch, got {:?}", other),
        }
    }

    #[test]
    fn load_with_incomplete_tree() {
        let mesh_path = write_obj("incomplete.obj", &strip(2));
        let tree_path = temp_path("incomplete.bvh");

        fs::write(&tree_path, "").unwrap();

        assert_eq!(
            "tree is empty, but mesh has 4 triangles",
            mismatch_reason(&mesh_path, &tree_path)
        );

        fs::write(&tree_path, "# just a comment\n").unwrap();

        assert_eq!(
            "tree is empty, but mesh has 4 triangles",
            mismatch_reason(&mesh_path, &tree_path)
        );

        fs::write(&tree_path, "l 0 0 0 2 1 0 0 1 3\nt 1 -1 -1\n").unwrap();

        assert_eq!(
            "triangle 2 is never referenced",
            mismatch_reason(&mesh_path, &tree_path)
        );

        fs::write(&tree_path, "l 0 0 0 2 1 0 0 1 2 3 1\nt 1 -1 -1\n")
            .unwrap();

        assert_eq!(
            "triangle 1 is referenced more than once",
            mismatch_reason(&mesh_path, &tree_path)
        );

        // The same leaf as a whole loads just fine
        fs::write(&tree_path, "l 0 0 0 2 1 0 3 2 1 0\nt 1 -1 -1\n").unwrap();

        let target = Mesh::load(&mesh_path, &tree_path).unwrap();
        let ray = Ray::new(vec3(1.25, 0.5, 1.0), vec3(0.0, 0.0, -1.0));

        assert_eq!(ray.trace_naive(target.triangles()), target.trace(&ray));
        assert!(target.trace(&ray).is_some());

        fs::remove_file(&mesh_path).unwrap();
        fs::remove_file(&tree_path).unwrap();
    }

    #[test]
    fn empty() {
        let target = Mesh::new(Vec::new());

        assert!(target.triangles().is_empty());
        assert_eq!(None, target.bvh());

        let ray = Ray::new(Vec3::ZERO, vec3(0.0, 0.0, 1.0));

        assert_eq!(Hit::none(), target.trace(&ray));

        // Saving a mesh without geometry produces an empty file, which then
        // loads back as no tree
        let mesh_path = write_obj("empty.obj", "# nothing here\n");
        let tree_path = temp_path("empty.bvh");

        target.save_bvh(&tree_path).unwrap();

        assert_eq!("", fs::read_to_string(&tree_path).unwrap());

        let target = Mesh::load(&mesh_path, &tree_path).unwrap();

        assert!(target.triangles().is_empty());
        assert_eq!(None, target.bvh());

        fs::remove_file(&mesh_path).unwrap();
        fs::remove_file(&tree_path).unwrap();
    }

    #[test]
    fn with_policy() {
        let triangles: Vec<_> = (0..40)
            .map(|i| {
                let x = i as f32;

                Triangle::default().with_vertices([
                    vec3(x, 0.0, 0.0),
                    vec3(x + 1.0, 0.0, 0.0),
                    vec3(x, 1.0, 0.0),
                ])
            })
            .collect();

        for policy in [BuildPolicy::Median, BuildPolicy::Sah] {
            let target = Mesh::with_policy(triangles.clone(), policy);
            let ray = Ray::new(vec3(20.2, 0.2, -1.0), vec3(0.0, 0.0, 1.0));

            assert_eq!(
                Some(TriangleId::new(20)),
                target.trace(&ray).triangle_id
            );

            let (bvh, triangles) = target.into_parts();

            bvh.unwrap().validate();
            assert_eq!(40, triangles.len());
        }
    }
}
