//! Properties of the patch engine.
//!
//! - the base document is never mutated by `apply`
//! - `Delete` is idempotent, also after additive appends
//! - the last of several `Update`s to one path wins
//! - the `<Time><maxTime>` end-to-end scenario

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rtm_document::{apply, DocPath, Document, Element, PatchOp};

const LEAVES: [&str; 4] = ["maxTime", "initTime", "delt_min", "delt_max"];

fn time_document() -> Document {
    let mut time = Element::new("Time").with_attribute("units", "s");
    for (i, tag) in LEAVES.iter().enumerate() {
        time.push_child(Element::new(*tag).with_text(i.to_string()));
    }
    Document::new(Element::new("Sim").with_child(time))
}

fn leaf_path() -> impl Strategy<Value = DocPath> {
    prop_oneof![
        proptest::sample::select(LEAVES.to_vec())
            .prop_map(|tag| format!("/Sim/Time/{tag}").parse::<DocPath>().unwrap()),
        Just("/Sim/Time/@units".parse::<DocPath>().unwrap()),
        Just("/Sim/Time/initTime:elem:max_Timesteps".parse::<DocPath>().unwrap()),
        Just("/Sim/Time/initTime:elem:Limits/max_Timesteps".parse::<DocPath>().unwrap()),
    ]
}

fn patch_op() -> impl Strategy<Value = PatchOp> {
    (leaf_path(), 0u8..3, "[a-z0-9.]{0,6}").prop_map(|(path, kind, value)| match kind {
        0 => PatchOp::Delete(path),
        1 => PatchOp::Update(path, value),
        _ => PatchOp::Append(path, Some(value)),
    })
}

proptest! {
    #[test]
    fn prop_apply_never_mutates_base(ops in proptest::collection::vec(patch_op(), 0..12)) {
        let base = time_document();
        let snapshot = base.clone();

        // Updates may fail on deleted targets; either way the base is intact.
        let _ = apply(&base, &ops);

        prop_assert_eq!(base, snapshot);
    }

    #[test]
    fn prop_delete_is_idempotent(
        prefix in proptest::collection::vec(patch_op(), 0..6),
        target in leaf_path(),
    ) {
        let base = time_document();
        if let Ok(start) = apply(&base, &prefix) {
            let once = apply(&start, &[PatchOp::Delete(target.clone())]).unwrap();
            let twice = apply(
                &start,
                &[PatchOp::Delete(target.clone()), PatchOp::Delete(target)],
            )
            .unwrap();
            prop_assert_eq!(once, twice);
        }
    }

    #[test]
    fn prop_last_update_wins(a in "[a-z0-9]{1,6}", b in "[a-z0-9]{1,6}") {
        let path: DocPath = "/Sim/Time/maxTime".parse().unwrap();
        let doc = apply(
            &time_document(),
            &[PatchOp::Update(path.clone(), a), PatchOp::Update(path.clone(), b.clone())],
        )
        .unwrap();
        prop_assert_eq!(doc.value(&path), Some(b.as_str()));
    }
}

#[test]
fn update_order_matters() {
    let path: DocPath = "/Sim/Time/maxTime".parse().unwrap();
    let base = time_document();

    let ab = apply(
        &base,
        &[PatchOp::update(path.clone(), "a"), PatchOp::update(path.clone(), "b")],
    )
    .unwrap();
    let ba = apply(
        &base,
        &[PatchOp::update(path.clone(), "b"), PatchOp::update(path.clone(), "a")],
    )
    .unwrap();

    assert_ne!(ab, ba);
    assert_eq!(ab.value(&path), Some("b"));
    assert_eq!(ba.value(&path), Some("a"));
}

#[test]
fn max_time_scenario() {
    let base = Document::parse_xml("<Time><maxTime>10</maxTime></Time>").unwrap();

    let updated = apply(&base, &[PatchOp::update("/Time/maxTime".parse().unwrap(), "100")]).unwrap();
    assert_eq!(updated.value_at("/Time/maxTime"), Some("100"));
    assert!(updated.to_xml().contains("<maxTime>100</maxTime>"));

    let removed = apply(
        &base,
        &[
            PatchOp::update("/Time/maxTime".parse().unwrap(), "100"),
            PatchOp::Delete("/Time/maxTime".parse().unwrap()),
        ],
    )
    .unwrap();
    assert!(removed.root().child("maxTime").is_none());
    assert_eq!(removed.to_xml(), "<Time/>\n");
}
