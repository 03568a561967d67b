//! End-to-end runs of the `rtm` subcommands over a temporary inputs tree

use pretty_assertions::assert_eq;
use rtm_cli::{command, run, MANIFEST_FILE};
use rtm_registry::{catalog, CaseSummary};
use rtm_test_utils::{write_templates, StubTemplates};
use tempfile::TempDir;

/// Inputs root with the skeleton at every path the catalog needs
fn inputs() -> TempDir {
    let stub = StubTemplates::new();
    catalog::phasefield(&stub).unwrap();

    let root = TempDir::new().unwrap();
    let component = root.path().join(catalog::COMPONENT);
    let requested = stub.requested();
    write_templates(&component, requested.iter().map(|p| p.as_path()));
    root
}

fn rtm(args: &[&str]) -> anyhow::Result<String> {
    let matches = command().try_get_matches_from(std::iter::once("rtm").chain(args.iter().copied()))?;
    let mut out = Vec::new();
    run(&matches, &mut out)?;
    Ok(String::from_utf8(out)?)
}

fn inputs_arg(root: &TempDir) -> String {
    root.path().display().to_string()
}

#[test]
fn suites_lists_every_identifier() {
    let root = inputs();
    let out = rtm(&["suites", "--inputs", &inputs_arg(&root)]).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 28);
    assert_eq!(lines[0], "BENCHTEST");
    assert_eq!(lines[27], "BUILDBOTTESTS");
}

#[test]
fn list_text_and_json() {
    let root = inputs();
    let text = rtm(&["list", "HEATMPITEST", "--inputs", &inputs_arg(&root)]).unwrap();
    assert_eq!(
        text.lines().next(),
        Some("heat_periodic_cc_2d_fe_mpi\t4\tAll\texactComparison")
    );
    assert_eq!(text.lines().count(), 4);

    let json = rtm(&["list", "DEBUGTESTS", "--json", "--inputs", &inputs_arg(&root)]).unwrap();
    let cases: Vec<CaseSummary> = serde_json::from_str(&json).unwrap();
    assert_eq!(cases.len(), 14);
    assert_eq!(cases[0].name, "pure_metal_cc_2d_amr_fc0_mpi");
    assert_eq!(cases[0].input, "pure_metal_cc_2d_amr_fc0_mpi.ups");
    assert!(cases[0].flags.contains("exactComparison"));
}

#[test]
fn unknown_suite_fails_naming_identifier() {
    let root = inputs();
    let err = rtm(&["list", "DOES_NOT_EXIST", "--inputs", &inputs_arg(&root)]).unwrap_err();
    assert!(err.to_string().contains("DOES_NOT_EXIST"));
}

#[test]
fn missing_inputs_fail() {
    let root = TempDir::new().unwrap();
    let err = rtm(&["suites", "--inputs", &inputs_arg(&root)]).unwrap_err();
    assert!(format!("{err:#}").contains("building catalog"));
}

#[test]
fn materialize_writes_inputs_and_manifest() {
    let root = inputs();
    let out_dir = TempDir::new().unwrap();
    let dest = out_dir.path().join("bench");

    let msg = rtm(&[
        "materialize",
        "BENCHTEST",
        "--out",
        &dest.display().to_string(),
        "--inputs",
        &inputs_arg(&root),
    ])
    .unwrap();
    assert!(msg.starts_with("wrote 7 inputs"));

    let input = std::fs::read_to_string(dest.join("benchmark03_nc.ups")).unwrap();
    assert!(input.contains("<max_Timesteps>15001</max_Timesteps>"));
    assert!(!input.contains("<outputInterval>"));

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dest.join(MANIFEST_FILE)).unwrap()).unwrap();
    assert_eq!(manifest["suite"], "BENCHTEST");
    assert_eq!(manifest["component"], "PhaseField");
    assert_eq!(manifest["cases"].as_array().map(Vec::len), Some(7));
    assert_eq!(manifest["cases"][4]["processes"], 2);
    assert_eq!(manifest["fingerprint"].as_str().map(str::len), Some(64));
}

#[test]
fn fingerprint_matches_manifest() {
    let root = inputs();
    let out_dir = TempDir::new().unwrap();

    let printed = rtm(&["fingerprint", "HEATHYPRETEST", "--inputs", &inputs_arg(&root)]).unwrap();
    rtm(&[
        "materialize",
        "HEATHYPRETEST",
        "--out",
        &out_dir.path().display().to_string(),
        "--inputs",
        &inputs_arg(&root),
    ])
    .unwrap();

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out_dir.path().join(MANIFEST_FILE)).unwrap())
            .unwrap();
    assert_eq!(manifest["fingerprint"].as_str(), Some(printed.trim()));
}

#[test]
fn sweep_with_default_template() {
    let out_dir = TempDir::new().unwrap();
    let msg = rtm(&["sweep", "cn-sstruct-3d", "--out", &out_dir.path().display().to_string()]).unwrap();
    assert!(msg.starts_with("wrote 1200 inputs"));

    let input =
        std::fs::read_to_string(out_dir.path().join("cn_sstruct_conv_split_3d_nlvl4_2_1.ups")).unwrap();
    assert!(input.contains("<patches>[4,4,4]</patches>"));
    assert!(input.contains("<delt>0.500000</delt>"));
    assert!(input.contains("<filebase>cn_sstruct_conv_split_3d_nlvl4_2_1.uda</filebase>"));
}

#[test]
fn sweep_with_custom_template() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("base.ups");
    std::fs::write(
        &template,
        rtm_registry::SweepKind::BackwardEulerStruct2d.default_template(),
    )
    .unwrap();
    let dest = dir.path().join("out");

    rtm(&[
        "sweep",
        "be-struct-2d",
        "--out",
        &dest.display().to_string(),
        "--template",
        &template.display().to_string(),
    ])
    .unwrap();
    assert!(dest.join("be_struct_conv_bicgstab_2d_nlvl7_4_4.ups").is_file());
}

#[test]
fn sweep_min_patch_size_follows_template_unless_computed() {
    let dir = TempDir::new().unwrap();
    let plain = dir.path().join("plain");
    let computed = dir.path().join("computed");
    let file = "be_struct_conv_pfmg_2d_nlvl4_0_0.ups";

    rtm(&["sweep", "be-struct-2d", "--out", &plain.display().to_string()]).unwrap();
    rtm(&[
        "sweep",
        "be-struct-2d",
        "--out",
        &computed.display().to_string(),
        "--computed-min-patch-size",
    ])
    .unwrap();

    let plain = std::fs::read_to_string(plain.join(file)).unwrap();
    assert!(plain.starts_with("<Uintah_specification>"));
    assert!(plain.contains("<min_patch_size>[[16,16,1]]</min_patch_size>"));
    let computed = std::fs::read_to_string(computed.join(file)).unwrap();
    assert!(computed.contains("<min_patch_size>[[8,8,1],[16,16,1]]</min_patch_size>"));
}
