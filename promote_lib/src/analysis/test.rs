use super::*;
use kernel_ir::{KernelBuilder, OpId, OperationNode, TypeTag};
use pretty_assertions::assert_eq;

fn image() -> Option<TypeTag> {
    Some(TypeTag::Struct("Image".into()))
}

fn filter() -> Option<TypeTag> {
    Some(TypeTag::Struct("Filter".into()))
}

/// The single forward pass the two-pass classifier replaces: a load promotes unless the pointer
/// was already stored to, a store demotes and blacklists.
fn classify_streaming<'k>(
    references: &ReferenceSet,
    ops: impl IntoIterator<Item = &'k OperationNode>,
) -> PromotionState {
    let mut state = PromotionState::default();
    for op in ops {
        match (op.kind(), op.pointer()) {
            (kernel_ir::OpKind::Load, Some(ptr)) if references.is_pointer(ptr) => {
                state.promote(ptr);
            }
            (kernel_ir::OpKind::Store, Some(ptr)) => state.blacklist(ptr),
            _ => {}
        }
    }
    state
}

fn assert_disjoint(state: &AnalysisState) {
    for id in state.promotion.promoted() {
        assert!(
            !state.promotion.is_blacklisted(id),
            "{id} is both promoted and blacklisted"
        );
    }
}

#[test]
fn extracted_loaded_pointer_is_promoted() {
    let mut b = KernelBuilder::new("blur");
    let img = b.add_param("img", image(), false);
    let mask = b.add_param("mask", filter(), true);
    let x = b.add_param("x", Some(TypeTag::Scalar), false);
    let y = b.add_param("y", Some(TypeTag::Scalar), false);
    let p = b.extract(img, "data", TypeTag::Pointer);
    let a = b.address(p, &[x, y]);
    b.load(a);
    let m = b.extract(mask, "data", TypeTag::Pointer);
    let ma = b.address(m, &[x, y]);
    b.load(ma);
    let kernel = b.build().unwrap();

    let state = analyze(&kernel);

    assert!(state.promotion.is_promoted(a));
    assert!(!state.promotion.is_promoted(p));
    assert_eq!(state.references.root_of(a), Some(img));
    for id in [mask, m, ma] {
        assert!(!state.references.is_tracked(id), "{id} derives from the filter");
    }
    assert_eq!(state.promotion.blacklisted().count(), 0);
    assert_disjoint(&state);
}

#[test]
fn stored_pointer_is_blacklisted() {
    let mut b = KernelBuilder::new("write");
    let out = b.add_param("out", image(), false);
    let x = b.add_param("x", Some(TypeTag::Scalar), false);
    let q = b.extract(out, "data", TypeTag::Pointer);
    let a = b.address(q, &[x, x]);
    let v = b.other("zero", vec![], Some(TypeTag::Scalar));
    b.store(a, v);
    let kernel = b.build().unwrap();

    let state = analyze(&kernel);

    assert!(state.promotion.is_blacklisted(a));
    assert!(!state.promotion.is_promoted(a));
}

#[test]
fn filter_parameter_is_never_tracked_even_if_pointer() {
    let mut b = KernelBuilder::new("k");
    let mask = b.add_param("mask", Some(TypeTag::Pointer), true);
    let x = b.add_param("x", Some(TypeTag::Scalar), false);
    let a = b.address(mask, &[x]);
    let c = b.reinterpret(a);
    b.load(c);
    let kernel = b.build().unwrap();

    let state = analyze(&kernel);

    assert!(!state.references.is_tracked(mask));
    assert!(!state.references.is_tracked(a));
    assert!(!state.references.is_tracked(c));
    assert_eq!(state.promotion.promoted().count(), 0);
}

#[test]
fn parameter_of_unknown_type_is_not_tracked() {
    let mut b = KernelBuilder::new("k");
    let img = b.add_param("img", None, false);
    let x = b.add_param("x", Some(TypeTag::Scalar), false);
    let a = b.address(img, &[x]);
    b.load(a);
    let kernel = b.build().unwrap();

    let state = analyze(&kernel);

    assert!(!state.references.is_tracked(img));
    assert_eq!(state.promotion.promoted().count(), 0);
}

#[test]
fn pointer_parameter_is_reference_and_pointer() {
    let mut b = KernelBuilder::new("k");
    let src = b.add_param("src", Some(TypeTag::Pointer), false);
    let x = b.add_param("x", Some(TypeTag::Scalar), false);
    let kernel = b.build().unwrap();

    let state = analyze(&kernel);

    assert!(state.references.is_reference(src));
    assert!(state.references.is_pointer(src));
    // Scalars are seeded as references, but nothing can be derived from them.
    assert!(state.references.is_reference(x));
    assert!(!state.references.is_pointer(x));
}

#[test]
fn propagates_through_nested_structs_and_reinterprets() {
    let mut b = KernelBuilder::new("k");
    let pair = b.add_param("pair", Some(TypeTag::Struct("Pair".into())), false);
    let x = b.add_param("x", Some(TypeTag::Scalar), false);
    let inner = b.extract(pair, "first", TypeTag::Struct("Image".into()));
    let p = b.extract(inner, "data", TypeTag::Pointer);
    let w = b.extract(inner, "width", TypeTag::Scalar);
    let c = b.reinterpret(p);
    let a = b.address(c, &[x, w]);
    let a2 = b.address(a, &[x]);
    b.load(a2);
    let kernel = b.build().unwrap();

    let state = analyze(&kernel);

    assert!(state.references.is_reference(inner));
    assert!(!state.references.is_tracked(w));
    for id in [p, c, a, a2] {
        assert!(state.references.is_pointer(id));
        assert_eq!(state.references.root_of(id), Some(pair));
    }
    assert!(state.promotion.is_promoted(a2));
}

#[test]
fn unmodelled_operations_do_not_propagate() {
    let mut b = KernelBuilder::new("k");
    let src = b.add_param("src", Some(TypeTag::Pointer), false);
    let off = b.add_param("off", Some(TypeTag::Scalar), false);
    // Pointer arithmetic through an unmodelled operation.
    let p = b.other("add", vec![src, off], Some(TypeTag::Pointer));
    b.load(p);
    // A pointer loaded from a buffer.
    let q = b.push(kernel_ir::OpKind::Load, vec![src], Some(TypeTag::Pointer));
    let a = b.address(q, &[off]);
    b.load(a);
    let kernel = b.build().unwrap();

    let state = analyze(&kernel);

    assert!(!state.references.is_tracked(p));
    assert!(!state.references.is_tracked(q));
    assert!(!state.references.is_tracked(a));
    // `src` itself is loaded from, so it is promotable.
    assert_eq!(state.promotion.promoted().collect::<Vec<_>>(), vec![src]);
}

#[test]
fn extract_from_untracked_struct_is_ignored() {
    let mut b = KernelBuilder::new("k");
    let s = b.other("make_image", vec![], Some(TypeTag::Struct("Image".into())));
    let p = b.extract(s, "data", TypeTag::Pointer);
    b.load(p);
    let kernel = b.build().unwrap();

    let state = analyze(&kernel);

    assert!(!state.references.is_tracked(p));
    assert_eq!(state.promotion.promoted().count(), 0);
}

#[test]
fn stores_to_untracked_pointers_are_still_blacklisted() {
    let mut b = KernelBuilder::new("k");
    let p = b.other("scratch", vec![], Some(TypeTag::Pointer));
    let v = b.other("zero", vec![], Some(TypeTag::Scalar));
    b.store(p, v);
    let kernel = b.build().unwrap();

    let state = analyze(&kernel);

    assert!(state.promotion.is_blacklisted(p));
}

#[derive(Debug, Clone, Copy)]
enum Access {
    Load,
    Store,
}

fn all_sequences(len: usize) -> Vec<Vec<Access>> {
    (0..1u32 << len)
        .map(|bits| {
            (0..len)
                .map(|i| match bits >> i & 1 {
                    0 => Access::Load,
                    _ => Access::Store,
                })
                .collect()
        })
        .collect()
}

/// Builds a kernel accessing two pointers of the same buffer: `a` with the accesses in `seq`,
/// and `b` with the same accesses in reverse order, interleaved.
fn kernel_with_accesses(seq: &[Access]) -> (kernel_ir::KernelFunction, OpId, OpId) {
    let mut b = KernelBuilder::new("perm");
    let img = b.add_param("img", image(), false);
    let x = b.add_param("x", Some(TypeTag::Scalar), false);
    let v = b.add_param("v", Some(TypeTag::Scalar), false);
    let p = b.extract(img, "data", TypeTag::Pointer);
    let pa = b.address(p, &[x, x]);
    let pb = b.address(p, &[x]);
    for (i, access) in seq.iter().enumerate() {
        let other = seq[seq.len() - 1 - i];
        for (ptr, access) in [(pa, *access), (pb, other)] {
            match access {
                Access::Load => b.load(ptr),
                Access::Store => b.store(ptr, v),
            };
        }
    }
    (b.build().unwrap(), pa, pb)
}

#[test]
fn two_pass_and_streaming_classification_agree_for_every_order() {
    for len in 1..=6 {
        for seq in all_sequences(len) {
            let (kernel, pa, pb) = kernel_with_accesses(&seq);
            let state = analyze(&kernel);

            let streaming = classify_streaming(&state.references, kernel.operations());
            assert_eq!(state.promotion, streaming, "sequence {seq:?}");

            // Classifying the operations in reverse order gives the same result too.
            let reversed: Vec<_> = kernel.operations().collect::<Vec<_>>().into_iter().rev().collect();
            let state_rev =
                CandidateClassifier::new(&state.references).classify(reversed.iter().copied());
            assert_eq!(state.promotion, state_rev, "sequence {seq:?}");

            let any_store = seq.iter().any(|a| matches!(a, Access::Store));
            for ptr in [pa, pb] {
                assert_eq!(state.promotion.is_blacklisted(ptr), any_store, "{seq:?}");
                assert_eq!(state.promotion.is_promoted(ptr), !any_store, "{seq:?}");
            }
            assert_disjoint(&state);
        }
    }
}

#[test]
fn store_anywhere_blacklists_regardless_of_position() {
    // A single store, moved through every position between three loads.
    for store_at in 0..=3 {
        let mut b = KernelBuilder::new("k");
        let src = b.add_param("src", Some(TypeTag::Pointer), false);
        let v = b.add_param("v", Some(TypeTag::Scalar), false);
        for i in 0..=3 {
            if i == store_at {
                b.store(src, v);
            }
            if i < 3 {
                b.load(src);
            }
        }
        let kernel = b.build().unwrap();

        let state = analyze(&kernel);

        assert!(state.promotion.is_blacklisted(src), "store at {store_at}");
        assert!(!state.promotion.is_promoted(src), "store at {store_at}");
    }
}

#[test]
fn analysis_is_deterministic() {
    let (kernel, _, _) = kernel_with_accesses(&[Access::Load, Access::Store, Access::Load]);
    assert_eq!(analyze(&kernel), analyze(&kernel));
}

#[test]
fn promoted_buffers_group_by_buffer() {
    let mut b = KernelBuilder::new("k");
    let img = b.add_param("img", image(), false);
    let src = b.add_param("src", Some(TypeTag::Pointer), false);
    let x = b.add_param("x", Some(TypeTag::Scalar), false);
    let p = b.extract(img, "data", TypeTag::Pointer);
    let a1 = b.address(p, &[x, x]);
    let a2 = b.address(p, &[x]);
    let s1 = b.address(src, &[x, x]);
    b.load(a1);
    b.load(s1);
    b.load(a2);
    let kernel = b.build().unwrap();

    let buffers = analyze(&kernel).promoted_buffers();

    assert_eq!(buffers.len(), 2);
    assert_eq!((buffers[0].root, buffers[0].buffer), (img, p));
    assert_eq!(buffers[0].pointers.as_slice(), &[a1, a2]);
    assert_eq!((buffers[1].root, buffers[1].buffer), (src, src));
    assert_eq!(buffers[1].pointers.as_slice(), &[s1]);
}

#[test]
fn fields_of_one_parameter_are_separate_buffers() {
    let mut b = KernelBuilder::new("k");
    let img = b.add_param("img", image(), false);
    let x = b.add_param("x", Some(TypeTag::Scalar), false);
    let data = b.extract(img, "data", TypeTag::Pointer);
    let aux = b.extract(img, "aux", TypeTag::Pointer);
    let c = b.reinterpret(aux);
    let a1 = b.address(data, &[x, x]);
    let a2 = b.address(c, &[x, x]);
    b.load(a1);
    b.load(a2);
    let kernel = b.build().unwrap();

    let state = analyze(&kernel);
    let buffers = state.promoted_buffers();

    assert_eq!(state.references.buffer_of(a2), Some(aux));
    assert_eq!(state.references.buffer_of(c), Some(aux));
    assert_eq!(buffers.len(), 2);
    assert_eq!((buffers[0].root, buffers[0].buffer), (img, data));
    assert_eq!(buffers[0].pointers.as_slice(), &[a1]);
    assert_eq!((buffers[1].root, buffers[1].buffer), (img, aux));
    assert_eq!(buffers[1].pointers.as_slice(), &[a2]);
}
