// SPDX-License-Identifier: MIT

use super::*;
use ff_core::ProjectId;

fn write_manifest(dir: &Path, contents: &str) {
    std::fs::write(dir.join(MANIFEST_FILE_NAME), contents).unwrap();
}

#[test]
fn scan_collects_dependencies_from_a_single_manifest() {
    let tmp = tempfile::tempdir().unwrap();
    write_manifest(
        tmp.path(),
        "dependencies:\n  espressif/led_strip: \"^2.0.0\"\n  my_component:\n    version: \"1.0.0\"\n    source: \"git:https://example.com/repo.git#main\"\n",
    );

    let project_id = ProjectId::new();
    let mut deps = scan(tmp.path(), project_id).unwrap();
    deps.sort_by(|a, b| a.component_name.cmp(&b.component_name));

    assert_eq!(deps.len(), 2);
    assert_eq!(deps[0].component_name, "espressif/led_strip");
    assert_eq!(deps[0].version_spec, "^2.0.0");
    assert_eq!(deps[0].source, DependencySource::Registry { registry: "component-registry".to_string() });

    assert_eq!(deps[1].component_name, "my_component");
    assert_eq!(
        deps[1].source,
        DependencySource::Git { url: "https://example.com/repo.git".to_string(), git_ref: "main".to_string() }
    );
}

#[test]
fn scan_skips_hidden_and_build_output_directories() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join(".git")).unwrap();
    write_manifest(&tmp.path().join(".git"), "dependencies:\n  ignored: \"1.0.0\"\n");
    std::fs::create_dir_all(tmp.path().join("build")).unwrap();
    write_manifest(&tmp.path().join("build"), "dependencies:\n  also_ignored: \"1.0.0\"\n");
    write_manifest(tmp.path(), "dependencies:\n  kept: \"1.0.0\"\n");

    let project_id = ProjectId::new();
    let deps = scan(tmp.path(), project_id).unwrap();

    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0].component_name, "kept");
}

#[test]
fn scan_aggregates_manifests_from_nested_components() {
    let tmp = tempfile::tempdir().unwrap();
    write_manifest(tmp.path(), "dependencies:\n  top_level: \"1.0.0\"\n");
    let nested = tmp.path().join("components/foo");
    std::fs::create_dir_all(&nested).unwrap();
    write_manifest(&nested, "dependencies:\n  nested_dep: \"2.0.0\"\n");

    let project_id = ProjectId::new();
    let mut deps = scan(tmp.path(), project_id).unwrap();
    deps.sort_by(|a, b| a.component_name.cmp(&b.component_name));

    assert_eq!(deps.len(), 2);
    assert_eq!(deps[0].component_name, "nested_dep");
    assert_eq!(deps[1].component_name, "top_level");
}

#[test]
fn scan_with_no_manifests_returns_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let project_id = ProjectId::new();
    let deps = scan(tmp.path(), project_id).unwrap();
    assert!(deps.is_empty());
}
