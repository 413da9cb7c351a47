use std::sync::Arc;

use super::*;

#[test]
fn test_value_keys_have_value_identity() {
    assert_eq!(42u64.id(), 42u64.id());
    assert_eq!(String::from("foo").id(), "foo".to_string().id());
    assert_ne!("foo".id(), "bar".id());
}

#[test]
fn test_value_keys_are_always_reachable() {
    let weak = 7i32.downgrade();
    assert_eq!(<i32 as ModelKey>::upgrade(&weak), Some(7));
}

#[test]
fn test_arc_keys_have_object_identity() {
    let a = Arc::new(1u32);
    let b = Arc::new(1u32);

    assert_eq!(a.id(), a.clone().id());
    assert_ne!(a.id(), b.id(), "equal values in distinct allocations are distinct models");
}

#[test]
fn test_arc_weak_ref_does_not_keep_model_alive() {
    let model = Arc::new(String::from("model"));
    let weak = model.downgrade();

    assert!(<Arc<String> as ModelKey>::upgrade(&weak).is_some());
    drop(model);
    assert!(<Arc<String> as ModelKey>::upgrade(&weak).is_none());
}

#[test]
fn test_unsized_arc_keys() {
    let model: Arc<str> = Arc::from("unsized");
    assert_eq!(model.id(), ObjectId::of(&model));
}
