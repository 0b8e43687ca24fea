use super::*;
use crate::{KernelBuilder, TypeTag};

#[test]
fn accepts_well_formed_kernel() {
    let mut builder = KernelBuilder::new("blur");
    let img = builder.add_param("img", Some(TypeTag::Struct("Image".into())), false);
    let x = builder.add_param("x", Some(TypeTag::Scalar), false);
    let p = builder.extract(img, "data", TypeTag::Pointer);
    let a = builder.address(p, &[x, x]);
    let v = builder.load(a);
    builder.store(a, v);

    assert!(builder.build().is_ok());
}

#[test]
fn rejects_use_before_def() {
    let mut builder = KernelBuilder::new("k");
    let img = builder.add_param("img", Some(TypeTag::Pointer), false);
    // Refer to an id that only gets defined after this operation.
    let late = {
        let mut scratch = builder.clone();
        scratch.load(img);
        scratch.load(img)
    };
    builder.load(late);
    builder.load(img);
    builder.load(img);

    let err = builder.build().unwrap_err();
    assert!(matches!(err, ValidationError::UseBeforeDef { .. }));
}

#[test]
fn rejects_wrong_arity() {
    let mut builder = KernelBuilder::new("k");
    let img = builder.add_param("img", Some(TypeTag::Pointer), false);
    let op = builder.push(OpKind::Load, vec![img, img], Some(TypeTag::Scalar));

    assert_eq!(
        builder.build().unwrap_err(),
        ValidationError::Arity {
            op,
            mnemonic: "load".into(),
            min: 1,
            max: 1,
            found: 2,
        }
    );
}

#[test]
fn rejects_store_with_result() {
    let mut builder = KernelBuilder::new("k");
    let img = builder.add_param("img", Some(TypeTag::Pointer), false);
    let v = builder.load(img);
    builder.push(OpKind::Store, vec![img, v], Some(TypeTag::Scalar));

    assert!(matches!(
        builder.build(),
        Err(ValidationError::UnexpectedResult { .. })
    ));
}

#[test]
fn rejects_address_compute_without_result() {
    let mut builder = KernelBuilder::new("k");
    let img = builder.add_param("img", Some(TypeTag::Pointer), false);
    let x = builder.add_param("x", Some(TypeTag::Scalar), false);
    builder.push(OpKind::AddressCompute, vec![img, x], None);

    assert!(matches!(
        builder.build(),
        Err(ValidationError::MissingResult { .. })
    ));
}
