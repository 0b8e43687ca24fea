use super::*;
use crate::KernelBuilder;

#[test]
fn schedule_excludes_params_and_keeps_program_order() {
    let mut builder = KernelBuilder::new("k");
    let img = builder.add_param("img", Some(TypeTag::Pointer), false);
    let x = builder.add_param("x", Some(TypeTag::Scalar), false);
    let a = builder.address(img, &[x]);
    let v = builder.load(a);
    let kernel = builder.build().unwrap();

    let order: Vec<_> = kernel.operations().map(|op| op.id()).collect();
    assert_eq!(order, vec![a, v]);
    assert_eq!(kernel.len(), 4);
    assert_eq!(kernel.params().len(), 2);
}

#[test]
fn ids_are_ordered_by_creation() {
    let mut builder = KernelBuilder::new("k");
    let img = builder.add_param("img", Some(TypeTag::Pointer), false);
    let v = builder.load(img);
    let w = builder.load(img);

    assert!(img < v && v < w);
    assert_eq!(
        [img.index(), v.index(), w.index()],
        [0, 1, 2],
    );
}

#[test]
fn origin_param_follows_projections() {
    let mut builder = KernelBuilder::new("k");
    let img = builder.add_param("img", Some(TypeTag::Struct("Image".into())), false);
    let x = builder.add_param("x", Some(TypeTag::Scalar), false);
    let p = builder.extract(img, "data", TypeTag::Pointer);
    let c = builder.reinterpret(p);
    let a = builder.address(c, &[x, x]);
    let v = builder.load(a);
    let kernel = builder.build().unwrap();

    assert_eq!(kernel.origin_param(a).map(|p| p.id), Some(img));
    assert_eq!(kernel.origin_param(img).map(|p| p.id), Some(img));
    // A load is not a projection, so its result has no origin.
    assert_eq!(kernel.origin_param(v), None);
}

#[test]
fn buffer_of_stops_at_extracted_pointers() {
    let mut builder = KernelBuilder::new("k");
    let img = builder.add_param("img", Some(TypeTag::Struct("Image".into())), false);
    let src = builder.add_param("src", Some(TypeTag::Pointer), false);
    let x = builder.add_param("x", Some(TypeTag::Scalar), false);
    let inner = builder.extract(img, "inner", TypeTag::Struct("Plane".into()));
    let aux = builder.extract(inner, "aux", TypeTag::Pointer);
    let c = builder.reinterpret(aux);
    let a = builder.address(c, &[x, x]);
    let s = builder.address(src, &[x]);
    let v = builder.load(a);
    let kernel = builder.build().unwrap();

    assert_eq!(kernel.buffer_of(a), Some(aux));
    assert_eq!(kernel.buffer_of(aux), Some(aux));
    assert_eq!(kernel.buffer_of(s), Some(src));
    // Structs and loaded values are not buffers.
    assert_eq!(kernel.buffer_of(inner), None);
    assert_eq!(kernel.buffer_of(img), None);
    assert_eq!(kernel.buffer_of(v), None);

    assert_eq!(kernel.field_path(aux), Some(vec!["img", "inner", "aux"]));
    assert_eq!(kernel.field_path(src), Some(vec!["src"]));
    assert_eq!(kernel.field_path(c), None);
}

#[test]
fn display_name_falls_back_to_index() {
    let mut builder = KernelBuilder::new("k");
    let img = builder.add_param("img", Some(TypeTag::Pointer), false);
    let v = builder.load(img);
    let kernel = builder.build().unwrap();

    assert_eq!(kernel.display_name(img), "%img");
    assert_eq!(kernel.display_name(v), "%1");
}

#[test]
fn address_compute_exposes_base_and_indices() {
    let mut builder = KernelBuilder::new("k");
    let img = builder.add_param("img", Some(TypeTag::Pointer), false);
    let x = builder.add_param("x", Some(TypeTag::Scalar), false);
    let y = builder.add_param("y", Some(TypeTag::Scalar), false);
    let a = builder.address(img, &[x, y]);
    let l = builder.address(img, &[x]);
    let kernel = builder.build().unwrap();

    assert_eq!(kernel[a].base(), Some(img));
    assert_eq!(kernel[a].indices().as_slice(), &[x, y]);
    assert_eq!(kernel[l].indices().as_slice(), &[x]);
    assert!(kernel[a].pointer().is_none());
}
