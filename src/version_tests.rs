use crate::config::{CommandSpec, ToolConfig};
use crate::error::Error;
use crate::manifest::DependencyKind;
use crate::version::{next_version, BumpType, DependencyUpdate, VersionManager};
use semver::Version;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const LISTING: &str = r#"yarn workspaces v1.22.19
{
  "pkg-a": {
    "location": "packages/pkg-a",
    "workspaceDependencies": ["pkg-b", "pkg-c"]
  },
  "pkg-b": {
    "location": "packages/pkg-b",
    "workspaceDependencies": []
  }
}
Done in 0.05s.
"#;

fn test_config() -> ToolConfig {
    ToolConfig {
        list_command: CommandSpec::new("sh", ["-c", "cat listing.txt"]),
        format_command: CommandSpec::new(
            "sh",
            ["-c", "echo run >> format.log; cp package.json root-at-format.json"],
        ),
        ..ToolConfig::default()
    }
}

fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

fn create_test_repo(root_manifest: &str) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    write_file(root, "package.json", root_manifest);
    write_file(root, "listing.txt", LISTING);
    write_file(
        root,
        "packages/pkg-a/package.json",
        r#"{
  "name": "pkg-a",
  "version": "1.0.0",
  "dependencies": { "pkg-b": "1.0.0", "left-pad": "^1.3.0" },
  "overrides": { "pkg-b": "1.0.0" }
}"#,
    );
    write_file(
        root,
        "packages/pkg-b/package.json",
        r#"{"name":"pkg-b","version":"1.0.0","devDependencies":{"pkg-a":"1.0.0"}}"#,
    );

    temp_dir
}

#[test]
fn test_bump_major() {
    let current = Version::parse("3.4.5-rc.2").unwrap();
    let new = next_version(&current, BumpType::Major).unwrap();
    assert_eq!(new.to_string(), "4.0.0");
}

#[test]
fn test_bump_minor() {
    let current = Version::parse("1.9.7").unwrap();
    let new = next_version(&current, BumpType::Minor).unwrap();
    assert_eq!(new.to_string(), "1.10.0");
}

#[test]
fn test_bump_patch() {
    let current = Version::parse("0.20.3").unwrap();
    let new = next_version(&current, BumpType::Patch).unwrap();
    assert_eq!(new.to_string(), "0.20.4");
}

#[test]
fn test_bump_prerelease_initial() {
    let current = Version::parse("2.1.0+build.5").unwrap();
    let new = next_version(&current, BumpType::Prerelease).unwrap();
    assert_eq!(new.to_string(), "2.1.0-alpha.1+build.5");
}

#[test]
fn test_bump_prerelease_increment() {
    let current = Version::parse("5.0.0-beta.9").unwrap();
    let new = next_version(&current, BumpType::Prerelease).unwrap();
    assert_eq!(new.to_string(), "5.0.0-beta.10");
}

#[test]
fn test_bump_prerelease_without_number() {
    let current = Version::parse("2.0.0-rc").unwrap();
    let new = next_version(&current, BumpType::Prerelease).unwrap();
    assert_eq!(new.to_string(), "2.0.0-rc.1");
}

#[tokio::test]
async fn test_propagate_example_repository() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "package.json", r#"{"version":"1.0.0","workspaces":["packages/*"]}"#);
    write_file(
        root,
        "listing.txt",
        r#"{"pkg-a":{"location":"packages/pkg-a","workspaceDependencies":["pkg-b"]}}"#,
    );
    write_file(
        root,
        "packages/pkg-a/package.json",
        r#"{"version":"1.0.0","dependencies":{"pkg-b":"1.0.0"}}"#,
    );

    let manager = VersionManager::new(root, test_config());
    manager.propagate("2.0.0", false).await.unwrap();

    assert_eq!(
        read(root, "packages/pkg-a/package.json"),
        r#"{"version":"2.0.0","dependencies":{"pkg-b":"2.0.0"}}"#
    );
    assert_eq!(
        read(root, "package.json"),
        r#"{"version":"2.0.0","workspaces":["packages/*"]}"#
    );
}

#[tokio::test]
async fn test_propagate_updates_every_manifest() {
    let temp_dir = create_test_repo(r#"{"name":"root","version":"1.0.0","workspaces":["packages/*"]}"#);
    let root = temp_dir.path();

    let manager = VersionManager::new(root, test_config());
    let report = manager.propagate("2.0.0", false).await.unwrap();

    assert_eq!(report.changes.len(), 3);
    assert_eq!(report.changes[0].workspace.as_deref(), Some("pkg-a"));
    assert_eq!(report.changes[1].workspace.as_deref(), Some("pkg-b"));
    assert_eq!(report.changes[2].workspace, None);
    assert_eq!(report.changes[0].old_version.as_deref(), Some("1.0.0"));
    assert_eq!(
        report.changes[0].dependencies,
        vec![
            DependencyUpdate {
                dependency: "pkg-b".to_string(),
                kind: DependencyKind::Dependencies,
            },
            DependencyUpdate {
                dependency: "pkg-b".to_string(),
                kind: DependencyKind::Overrides,
            },
        ]
    );
    assert_eq!(report.dependencies_updated(), 2);

    assert_eq!(
        read(root, "packages/pkg-a/package.json"),
        r#"{"name":"pkg-a","version":"2.0.0","dependencies":{"pkg-b":"2.0.0","left-pad":"^1.3.0"},"overrides":{"pkg-b":"2.0.0"}}"#
    );
    // pkg-b lists no workspace dependencies, so its pin on pkg-a stays.
    assert_eq!(
        read(root, "packages/pkg-b/package.json"),
        r#"{"name":"pkg-b","version":"2.0.0","devDependencies":{"pkg-a":"1.0.0"}}"#
    );
    assert_eq!(
        read(root, "package.json"),
        r#"{"name":"root","version":"2.0.0","workspaces":["packages/*"]}"#
    );
}

#[tokio::test]
async fn test_propagate_through_bundled_dependencies_flag() {
    let temp_dir = create_test_repo(r#"{"version":"1.0.0","workspaces":["packages/*"]}"#);
    let root = temp_dir.path();
    write_file(
        root,
        "packages/pkg-a/package.json",
        r#"{"version":"1.0.0","bundledDependencies":true,"dependencies":{"pkg-b":"1.0.0"}}"#,
    );

    let manager = VersionManager::new(root, test_config());
    let report = manager.propagate("2.0.0", false).await.unwrap();

    assert_eq!(report.changes.len(), 3);
    assert_eq!(
        read(root, "packages/pkg-a/package.json"),
        r#"{"version":"2.0.0","bundledDependencies":true,"dependencies":{"pkg-b":"2.0.0"}}"#
    );
}

#[tokio::test]
async fn test_propagate_with_non_object_scripts() {
    let temp_dir = create_test_repo(r#"{"version":"1.0.0","workspaces":["packages/*"],"scripts":"x"}"#);
    let root = temp_dir.path();

    let manager = VersionManager::new(root, test_config());
    let report = manager.propagate("2.0.0", false).await.unwrap();

    assert!(!report.formatted);
    assert_eq!(
        read(root, "package.json"),
        r#"{"version":"2.0.0","workspaces":["packages/*"],"scripts":"x"}"#
    );
}

#[tokio::test]
async fn test_propagate_without_workspaces_touches_root_only() {
    let temp_dir = create_test_repo(r#"{"name":"single","version":"1.0.0"}"#);
    let root = temp_dir.path();
    // The listing command must not run either.
    write_file(root, "listing.txt", "not json");

    let manager = VersionManager::new(root, test_config());
    let report = manager.propagate("1.1.0", false).await.unwrap();

    assert_eq!(report.changes.len(), 1);
    assert_eq!(read(root, "package.json"), r#"{"name":"single","version":"1.1.0"}"#);
    assert!(read(root, "packages/pkg-a/package.json").contains(r#""version": "1.0.0""#));
}

#[tokio::test]
async fn test_propagate_runs_formatter_once_after_writes() {
    let temp_dir = create_test_repo(
        r#"{"version":"1.0.0","workspaces":["packages/*"],"scripts":{"pretty":"prettier --write ."}}"#,
    );
    let root = temp_dir.path();

    let manager = VersionManager::new(root, test_config());
    let report = manager.propagate("3.0.0", false).await.unwrap();

    assert!(report.formatted);
    assert_eq!(read(root, "format.log"), "run\n");
    assert!(read(root, "root-at-format.json").contains(r#""version":"3.0.0""#));
}

#[tokio::test]
async fn test_propagate_skips_formatter_without_script() {
    let temp_dir = create_test_repo(
        r#"{"version":"1.0.0","workspaces":["packages/*"],"scripts":{"build":"tsc"}}"#,
    );
    let root = temp_dir.path();

    let manager = VersionManager::new(root, test_config());
    let report = manager.propagate("3.0.0", false).await.unwrap();

    assert!(!report.formatted);
    assert!(!root.join("format.log").exists());
}

#[tokio::test]
async fn test_propagate_dry_run_writes_nothing() {
    let root_manifest =
        r#"{"version":"1.0.0","workspaces":["packages/*"],"scripts":{"pretty":"prettier --write ."}}"#;
    let temp_dir = create_test_repo(root_manifest);
    let root = temp_dir.path();
    let pkg_a_before = read(root, "packages/pkg-a/package.json");

    let manager = VersionManager::new(root, test_config());
    let report = manager.propagate("2.0.0", true).await.unwrap();

    assert_eq!(report.changes.len(), 3);
    assert_eq!(report.dependencies_updated(), 2);
    assert!(!report.formatted);
    assert_eq!(read(root, "package.json"), root_manifest);
    assert_eq!(read(root, "packages/pkg-a/package.json"), pkg_a_before);
    assert!(!root.join("format.log").exists());
}

#[tokio::test]
async fn test_propagate_aborts_on_missing_workspace_manifest() {
    let temp_dir = create_test_repo(r#"{"version":"1.0.0","workspaces":["packages/*"]}"#);
    let root = temp_dir.path();
    fs::remove_file(root.join("packages/pkg-b/package.json")).unwrap();

    let manager = VersionManager::new(root, test_config());
    let err = manager.propagate("2.0.0", false).await.unwrap_err();

    assert!(matches!(err, Error::Io { .. }));
    // pkg-a was written before the failure and is not rolled back.
    assert!(read(root, "packages/pkg-a/package.json").contains(r#""version":"2.0.0""#));
    assert_eq!(
        read(root, "package.json"),
        r#"{"version":"1.0.0","workspaces":["packages/*"]}"#
    );
}

#[tokio::test]
async fn test_bump_from_root_version() {
    let temp_dir = create_test_repo(r#"{"version":"1.0.0","workspaces":["packages/*"]}"#);
    let root = temp_dir.path();

    let manager = VersionManager::new(root, test_config());
    let report = manager.bump(BumpType::Minor, false).await.unwrap();

    assert_eq!(report.new_version, "1.1.0");
    assert!(read(root, "packages/pkg-b/package.json").contains(r#""version":"1.1.0""#));
}

#[tokio::test]
async fn test_bump_rejects_invalid_root_version() {
    let temp_dir = create_test_repo(r#"{"version":"latest"}"#);
    let manager = VersionManager::new(temp_dir.path(), test_config());

    let err = manager.bump(BumpType::Patch, false).await.unwrap_err();
    assert!(matches!(err, Error::InvalidVersion { .. }));
}

#[tokio::test]
async fn test_bump_requires_root_version() {
    let temp_dir = create_test_repo(r#"{"name":"root"}"#);
    let manager = VersionManager::new(temp_dir.path(), test_config());

    let err = manager.bump(BumpType::Patch, false).await.unwrap_err();
    assert!(matches!(err, Error::MissingVersion { .. }));
}

#[tokio::test]
async fn test_check_consistency_after_propagation() {
    let temp_dir = create_test_repo(r#"{"version":"1.0.0","workspaces":["packages/*"]}"#);
    let manager = VersionManager::new(temp_dir.path(), test_config());

    manager.propagate("2.0.0", false).await.unwrap();
    let report = manager.check_consistency().await.unwrap();

    assert_eq!(report.total_packages, 3);
    assert_eq!(report.root_version.as_deref(), Some("2.0.0"));
    assert!(report.drift.is_empty());
    // pkg-b's pin on pkg-a is not in its workspaceDependencies, so
    // propagation leaves it behind and the check reports it.
    assert_eq!(report.inconsistencies.len(), 1);
    assert_eq!(report.inconsistencies[0].package, "pkg-b");
    assert_eq!(report.inconsistencies[0].dependency, "pkg-a");
}

#[tokio::test]
async fn test_check_consistency_without_stale_pins() {
    let temp_dir = create_test_repo(r#"{"version":"1.0.0","workspaces":["packages/*"]}"#);
    let root = temp_dir.path();
    write_file(root, "packages/pkg-b/package.json", r#"{"name":"pkg-b","version":"1.0.0"}"#);

    let manager = VersionManager::new(root, test_config());
    manager.propagate("2.0.0", false).await.unwrap();

    assert!(!manager.check_consistency().await.unwrap().has_issues());
}

#[tokio::test]
async fn test_check_consistency_flags_pin_missing_from_listing() {
    let temp_dir = create_test_repo(r#"{"version":"1.0.0","workspaces":["packages/*"]}"#);
    let root = temp_dir.path();
    write_file(root, "packages/pkg-a/package.json", r#"{"name":"pkg-a","version":"1.0.0"}"#);
    write_file(
        root,
        "packages/pkg-b/package.json",
        r#"{"name":"pkg-b","version":"1.0.0","peerDependencies":{"pkg-a":"0.9.0"}}"#,
    );

    let manager = VersionManager::new(root, test_config());
    let report = manager.check_consistency().await.unwrap();

    assert!(report.drift.is_empty());
    assert_eq!(report.inconsistencies.len(), 1);
    let stale = &report.inconsistencies[0];
    assert_eq!(stale.package, "pkg-b");
    assert_eq!(stale.dependency, "pkg-a");
    assert_eq!(stale.kind, DependencyKind::PeerDependencies);
    assert_eq!(stale.expected, "1.0.0");
    assert_eq!(stale.found, "0.9.0");
}

#[tokio::test]
async fn test_check_consistency_detects_drift_and_stale_pins() {
    let temp_dir = create_test_repo(r#"{"version":"1.0.0","workspaces":["packages/*"]}"#);
    let root = temp_dir.path();
    write_file(
        root,
        "packages/pkg-b/package.json",
        r#"{"name":"pkg-b","version":"1.2.0"}"#,
    );

    let manager = VersionManager::new(root, test_config());
    let report = manager.check_consistency().await.unwrap();

    assert!(report.has_issues());
    assert_eq!(report.drift.len(), 1);
    assert_eq!(report.drift[0].package, "pkg-b");
    assert_eq!(report.drift[0].found.as_deref(), Some("1.2.0"));

    // pkg-a pins pkg-b at 1.0.0 in two maps.
    assert_eq!(report.inconsistencies.len(), 2);
    assert!(report
        .inconsistencies
        .iter()
        .all(|i| i.package == "pkg-a" && i.dependency == "pkg-b" && i.expected == "1.2.0"));
}
