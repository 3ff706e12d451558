//! Integration tests for the glTF scene source and model pipeline.
//!
//! Generates a GLB scene, loads it through [`SceneSource`] and checks
//! selection, world placement, material sharing and the combined output.


use glam::{Mat4, Vec3};
use objex::{render_queue, ModelSettings, SceneSource, TargetSelection};
use tempfile::tempdir;

fn load_scene() -> (tempfile::TempDir, SceneSource) {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("scene.glb");
    scene_generator::write_scene_glb(&path).expect("Failed to write GLB");
    let scene = SceneSource::load(&path).expect("Failed to load GLB");
    (dir, scene)
}

#[test]
fn test_generated_glb_valid() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scene.glb");
    scene_generator::write_scene_glb(&path).unwrap();

    let (document, _buffers, _) = gltf::import(&path).expect("Failed to import GLB");
    assert_eq!(document.nodes().count(), 4);
    assert_eq!(document.meshes().count(), 1);
    assert_eq!(document.materials().count(), 2);
}

#[test]
fn test_collect_all() {
    let (_dir, mut scene) = load_scene();
    let models = scene.collect_models(None, TargetSelection::All).unwrap();

    assert_eq!(models.len(), scene_generator::MESH_NODES.len());
    for model in &models {
        assert_eq!(model.mesh.name, "Tri");
        assert_eq!(model.mesh.vertex_count(), 6);
        assert_eq!(model.mesh.submesh_count(), 2);
        assert_eq!(model.materials.len(), 2);
        model.mesh.validate().unwrap();
    }

    // each instance is a distinct mesh
    assert_ne!(models[0].mesh.id(), models[1].mesh.id());
    // materials are shared across instances
    assert_eq!(models[0].materials[0].id(), models[2].materials[0].id());
    assert_eq!(models[0].materials[1].id(), models[1].materials[1].id());
}

#[test]
fn test_world_placement_mirrored() {
    let (_dir, mut scene) = load_scene();
    let models = scene.collect_models(None, TargetSelection::All).unwrap();

    // glTF (1,0,0) under Root (0,0,5) lands at host (-1,0,5)
    assert_eq!(models[0].mesh.vertices[1], [-1.0, 0.0, 5.0]);
    // Child adds (1,0,0) in glTF space
    assert_eq!(models[1].mesh.vertices[1], [-2.0, 0.0, 5.0]);
    // Grandchild through an empty node
    assert_eq!(models[2].mesh.vertices[2], [0.0, 3.0, 5.0]);

    // winding reversed alongside the mirror
    assert_eq!(&models[0].mesh.indices[..3], &[0, 2, 1]);
    assert_eq!(&models[0].mesh.indices[3..], &[3, 5, 4]);
}

#[test]
fn test_normals_zero_filled() {
    let (_dir, mut scene) = load_scene();
    let models = scene.collect_models(None, TargetSelection::All).unwrap();
    let mesh = &models[0].mesh;

    assert_eq!(mesh.normals.len(), 6);
    assert_eq!(mesh.normals[0][2], 1.0);
    assert_eq!(mesh.normals[4], [0.0, 0.0, 0.0]);
    assert!(mesh.uvs.is_empty());
}

#[test]
fn test_materials_converted() {
    let (_dir, mut scene) = load_scene();
    let models = scene.collect_models(None, TargetSelection::All).unwrap();
    let red = &models[0].materials[0];
    let glass = &models[0].materials[1];

    assert_eq!(red.name, "Red");
    assert_eq!(red.render_queue, render_queue::OPAQUE);
    assert_eq!(red.surface_color().r, 1.0);
    assert_eq!(red.surface_color().g, 0.0);

    assert_eq!(glass.name, "Glass");
    assert_eq!(glass.render_queue, render_queue::TRANSPARENT);
    assert_eq!(glass.surface_color().a, 0.25);
}

#[test]
fn test_target_selection() {
    let (_dir, mut scene) = load_scene();

    let root_only = scene
        .collect_models(Some("Root"), TargetSelection::RootOnly)
        .unwrap();
    assert_eq!(root_only.len(), 1);

    let children = scene
        .collect_models(Some("Root"), TargetSelection::ChildrenOnly)
        .unwrap();
    assert_eq!(children.len(), 2);

    let under_empty = scene
        .collect_models(Some("Empty"), TargetSelection::All)
        .unwrap();
    assert_eq!(under_empty.len(), 1);
    assert_eq!(under_empty[0].mesh.vertices[2], [0.0, 3.0, 5.0]);

    let none = scene.collect_models(None, TargetSelection::RootOnly).unwrap();
    assert!(none.is_empty());
}

#[test]
fn test_missing_root() {
    let (_dir, mut scene) = load_scene();
    let err = scene
        .collect_models(Some("Nope"), TargetSelection::All)
        .unwrap_err();
    assert!(err.to_string().contains("Nope"));
    assert!(scene.root_world_to_local(Some("Nope")).is_err());
}

#[test]
fn test_root_world_to_local() {
    let (_dir, scene) = load_scene();
    assert_eq!(scene.root_world_to_local(None).unwrap(), Mat4::IDENTITY);

    let to_local = scene.root_world_to_local(Some("Root")).unwrap();
    let p = to_local.transform_point3(Vec3::new(-1.0, 0.0, 5.0));
    assert!((p - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-5);
}

#[test]
fn test_pipeline_combines_scene() {
    let (_dir, mut scene) = load_scene();
    let models = scene.collect_models(Some("Root"), TargetSelection::All).unwrap();
    let to_local = scene.root_world_to_local(Some("Root")).unwrap();

    let out = ModelSettings::default()
        .update_models(models, to_local, "Dock")
        .unwrap();

    assert_eq!(out.len(), 1);
    let combined = &out[0];
    assert_eq!(combined.mesh.name, "Dock");
    assert_eq!(combined.mesh.vertex_count(), 18);
    assert_eq!(combined.mesh.submesh_count(), 2);
    assert_eq!(combined.materials[0].name, "Red");
    assert_eq!(combined.materials[1].name, "Glass");
    assert_eq!(combined.mesh.normals.len(), 18);

    // Root sits at its own origin after re-basing
    assert!(combined.mesh.vertices.iter().all(|v| v[2].abs() < 1e-5));
    // recalculated normals face +Z in host space
    for n in &combined.mesh.normals {
        assert!((n[2] - 1.0).abs() < 1e-5);
    }
}

fn load_textured_scene() -> (tempfile::TempDir, SceneSource) {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("textured.glb");
    scene_generator::write_textured_glb(&path).expect("Failed to write GLB");
    let scene = SceneSource::load(&path).expect("Failed to load GLB");
    (dir, scene)
}

#[test]
fn test_mirrored_node_keeps_faces_outward() {
    let (_dir, mut scene) = load_textured_scene();
    let models = scene.collect_models(None, TargetSelection::All).unwrap();
    assert_eq!(models.len(), 1);
    let mesh = &models[0].mesh;

    // glTF (1,0,0) scaled to (-1,0,0), then mirrored into host space
    assert_eq!(mesh.vertices[1], [1.0, 0.0, 0.0]);
    // two mirrors cancel: source winding survives
    assert_eq!(mesh.indices, vec![0, 1, 2]);

    // carried normals agree with the winding
    let mut recalculated = mesh.clone();
    objex::transform::recalculate_normals(&mut recalculated);
    for (carried, computed) in mesh.normals.iter().zip(&recalculated.normals) {
        assert!((carried[2] - 1.0).abs() < 1e-5);
        assert!((computed[2] - 1.0).abs() < 1e-5);
    }
}

#[test]
fn test_uvs_flipped_to_bottom_left_origin() {
    let (_dir, mut scene) = load_textured_scene();
    let models = scene.collect_models(None, TargetSelection::All).unwrap();
    let mesh = &models[0].mesh;

    assert_eq!(mesh.uvs.len(), scene_generator::UVS.len());
    for (uv, source) in mesh.uvs.iter().zip(scene_generator::UVS) {
        assert_eq!(uv[0], source[0]);
        assert_eq!(uv[1], 1.0 - source[1]);
    }
    assert_eq!(mesh.uvs[1], [1.0, 0.75]);
}
