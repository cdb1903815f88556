use std::sync::Arc;
use strata::assets::{Material, ShaderSource, Texture};
use strata::drawables::{Drawable, MeshDrawable, SpriteDrawable};
use strata::error::RenderError;
use strata::rendering::cache::{GpuMesh, GpuTexture};
use strata::scene::DrawList;

mod common;

struct Fixture {
    gpu: common::TestGpu,
    mesh: Arc<GpuMesh>,
    red: Arc<GpuTexture>,
    blue: Arc<GpuTexture>,
}

fn fixture() -> Fixture {
    let gpu = common::gpu();
    let mesh = gpu.assets.mesh(&common::quad(0.0)).unwrap();
    let red = gpu.assets.texture(&Texture::solid(1, 1, [255, 0, 0, 255])).unwrap();
    let blue = gpu.assets.texture(&Texture::solid(1, 1, [0, 0, 255, 255])).unwrap();

    Fixture { gpu, mesh, red, blue }
}

impl Fixture {
    fn textured(&self, texture: Option<&Arc<GpuTexture>>) -> MeshDrawable {
        let material = Material::builder().maybe_texture(texture.cloned()).build();
        MeshDrawable::new(self.mesh.clone(), material)
    }
}

fn assert_sorted(list: &DrawList<&'static str>) {
    let live: Vec<_> = list.iter().map(|(_, drawable)| drawable.sort_key()).collect();
    assert!(live.is_sorted());
    assert_eq!(list.sort_keys().collect::<Vec<_>>(), live);
}

#[test]
fn entries_stay_sorted_by_texture() {
    let f = fixture();
    let mut list = DrawList::new();

    list.add("red 1", f.textured(Some(&f.red))).unwrap();
    list.add("blue 1", f.textured(Some(&f.blue))).unwrap();
    list.add("red 2", f.textured(Some(&f.red))).unwrap();
    list.add("plain", f.textured(None)).unwrap();
    list.add("blue 2", f.textured(Some(&f.blue))).unwrap();

    assert_eq!(list.len(), 5);
    assert_sorted(&list);

    // untextured sorts first, equal keys keep insertion order
    let keys: Vec<_> = list.keys().copied().collect();
    assert_eq!(keys[0], "plain");
    let reds: Vec<_> = keys.iter().filter(|k| k.starts_with("red")).collect();
    let blues: Vec<_> = keys.iter().filter(|k| k.starts_with("blue")).collect();
    assert_eq!(reds, [&"red 1", &"red 2"]);
    assert_eq!(blues, [&"blue 1", &"blue 2"]);
}

#[test]
fn program_takes_precedence_over_texture() {
    let f = fixture();
    let flat = f.gpu.assets.program(&ShaderSource::flat_color()).unwrap();
    let mut list = DrawList::new();

    list.add("flat red", f.textured(Some(&f.red)).with_program(flat.clone()))
        .unwrap();
    list.add("default blue", f.textured(Some(&f.blue))).unwrap();
    list.add("flat plain", f.textured(None).with_program(flat.clone()))
        .unwrap();
    list.add("default red", f.textured(Some(&f.red))).unwrap();

    assert_sorted(&list);

    let keys: Vec<_> = list.keys().copied().collect();
    assert!(keys[..2].iter().all(|k| k.starts_with("default")));
    assert_eq!(&keys[2..], ["flat plain", "flat red"]);
}

#[test]
fn removal_keeps_the_remaining_order() {
    let f = fixture();
    let mut list = DrawList::new();

    for (key, texture) in [("a", &f.red), ("b", &f.blue), ("c", &f.red), ("d", &f.blue)] {
        list.add(key, f.textured(Some(texture))).unwrap();
    }
    let before: Vec<_> = list.keys().copied().collect();

    assert!(list.remove(&"c"));
    assert!(!list.remove(&"c"));

    let after: Vec<_> = list.keys().copied().collect();
    let expected: Vec<_> = before.into_iter().filter(|k| *k != "c").collect();
    assert_eq!(after, expected);
    assert!(!list.contains_key(&"c"));

    // lookups still point at the right entries after the shift
    for key in ["a", "b", "d"] {
        assert!(list.get(&key).is_some());
    }
}

#[test]
fn duplicate_keys_are_rejected() {
    let f = fixture();
    let mut list = DrawList::new();

    list.add(7u32, f.textured(None)).unwrap();
    let result = list.add(7u32, f.textured(Some(&f.red)));

    assert!(matches!(result, Err(RenderError::DuplicateKey { key }) if key == "7"));
    assert_eq!(list.len(), 1);
    assert_eq!(list.get(&7).unwrap().material().texture_id(), None);
}

#[test]
fn typed_lookup_checks_the_type() {
    let f = fixture();
    let mut list = DrawList::new();

    list.add("mesh", f.textured(Some(&f.red))).unwrap();
    list.add("sprite", SpriteDrawable::new(&f.gpu.assets, Material::default()).unwrap())
        .unwrap();

    let mesh = list.get_as::<MeshDrawable>(&"mesh").unwrap().unwrap();
    assert_eq!(mesh.material.texture_id(), Some(f.red.id()));

    assert!(list.get_as::<SpriteDrawable>(&"sprite").unwrap().is_some());
    assert!(list.get_as::<MeshDrawable>(&"missing").unwrap().is_none());
    assert!(matches!(
        list.get_as::<SpriteDrawable>(&"mesh"),
        Err(RenderError::TypeMismatch { .. })
    ));
}

#[test]
fn updates_move_entries_whose_key_changed() {
    let f = fixture();
    let mut list = DrawList::new();

    list.add("a", f.textured(Some(&f.red))).unwrap();
    list.add("b", f.textured(Some(&f.blue))).unwrap();
    list.add("c", f.textured(None)).unwrap();
    assert_eq!(list.keys().next(), Some(&"c"));

    let moved = list
        .update_as::<MeshDrawable, _>(&"c", |mesh| mesh.material.set_texture(Some(f.blue.clone())))
        .unwrap();
    assert_eq!(moved, Some(()));
    assert_sorted(&list);

    let blues: Vec<_> = list
        .iter()
        .filter(|(_, d)| d.material().texture_id() == Some(f.blue.id()))
        .map(|(k, _)| *k)
        .collect();
    assert_eq!(blues, ["b", "c"]);

    assert!(
        list.update_as::<SpriteDrawable, _>(&"a", |_| ())
            .is_err()
    );
    assert_eq!(list.update(&"missing", |_| ()), None);
}

#[test]
fn added_entry_is_only_changed_through_update() {
    let f = fixture();
    let mut list = DrawList::new();

    list.add("a", f.textured(Some(&f.red))).unwrap();
    let added = list.add("b", f.textured(Some(&f.blue))).unwrap();
    assert_eq!(added.material().texture_id(), Some(f.blue.id()));

    list.update_as::<MeshDrawable, _>(&"b", |mesh| mesh.material.clear_texture())
        .unwrap();
    assert_sorted(&list);
    assert_eq!(list.keys().next(), Some(&"b"));
}

#[test]
fn clear_empties_the_list() {
    let f = fixture();
    let mut list = DrawList::new();

    list.add(1, f.textured(None)).unwrap();
    list.add(2, f.textured(None)).unwrap();
    list.clear();

    assert!(list.is_empty());
    assert!(list.get(&1).is_none());
    list.add(1, f.textured(None)).unwrap();
}
