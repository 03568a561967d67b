//! `TemplateDir` against a real directory tree

use std::path::Path;

use rtm_document::Fingerprint;
use rtm_registry::catalog;
use rtm_registry::{Family, Frequency, ManifestConfig, Scheme, TemplateDir, TemplateError, TemplateSource};
use rtm_test_utils::{phasefield_skeleton, write_templates, PHASEFIELD_SKELETON};
use tempfile::TempDir;

#[test]
fn loads_and_caches() {
    let dir = TempDir::new().unwrap();
    write_templates(dir.path(), [Path::new("heat/heat_periodic_cc_2d_fe.ups")]);

    let templates = TemplateDir::new(dir.path());
    let first = templates.load(Path::new("heat/heat_periodic_cc_2d_fe.ups")).unwrap();
    let second = templates.load(Path::new("heat/heat_periodic_cc_2d_fe.ups")).unwrap();

    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(templates.cached(), 1);
    assert_eq!(*first, phasefield_skeleton());
}

#[test]
fn parsed_template_round_trips() {
    let doc = phasefield_skeleton();
    let again = rtm_document::Document::parse_xml(&doc.to_xml()).unwrap();
    assert_eq!(doc, again);
    assert_eq!(Fingerprint::of_document(&doc), Fingerprint::of_document(&again));
}

#[test]
fn malformed_template_names_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.ups");
    std::fs::write(&path, "<Uintah_specification><Time></Uintah_specification>").unwrap();

    let err = TemplateDir::new(dir.path())
        .load(Path::new("broken.ups"))
        .unwrap_err();
    match &err {
        TemplateError::Parse { path: p, .. } => assert_eq!(p, &path),
        other => panic!("expected parse error, got {other:?}"),
    }
    assert!(err.to_string().contains("broken.ups"));
}

#[test]
fn missing_template_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = TemplateDir::new(dir.path())
        .load(Path::new("heat/nope.ups"))
        .unwrap_err();
    assert!(matches!(err, TemplateError::Io { .. }));
}

#[test]
fn family_from_disk() {
    let dir = TempDir::new().unwrap();
    let family = Family::new("HEAT", "heat", "heat_periodic", Frequency::new(50, 8))
        .with_schemes(&[Scheme::Fe]);
    let paths: Vec<_> = family.enumerate().iter().map(|c| family.template_path(c)).collect();
    write_templates(dir.path(), paths.iter().map(|p| p.as_path()));

    let templates = TemplateDir::new(dir.path());
    let cases = family.cases(&templates).unwrap();
    assert_eq!(cases.serial.len(), 4);
    assert_eq!(cases.parallel.len(), 4);
    assert_eq!(templates.cached(), 4);
}

#[test]
fn catalog_fails_on_incomplete_inputs() {
    let dir = TempDir::new().unwrap();
    let config = ManifestConfig::default().with_inputs_root(dir.path());
    std::fs::create_dir_all(config.component_dir()).unwrap();

    let err = catalog::phasefield(&TemplateDir::new(config.component_dir())).unwrap_err();
    assert!(err.to_string().contains("benchmark01_cc_eps020_n063_k3e-02.ups"));
}

#[test]
fn skeleton_text_is_parseable() {
    assert!(PHASEFIELD_SKELETON.starts_with("<?xml"));
    assert_eq!(phasefield_skeleton().root().tag(), "Uintah_specification");
}
