//! Integration tests for the set-icon pipeline.
//!
//! These tests verify that a run:
//! - Adds or replaces the `.icon.png` root entry with the given icon
//! - Leaves every other entry, and its bytes, exactly as it was
//! - Honors the missing-file policies for both inputs
//! - Leaves the package untouched and the workspace removed on failure

mod common;

use std::path::Path;

use iconpack::{
    EntryTime, Error, GzipCodec, ICON_ENTRY_NAME, InputKind, MemoryReporter, MissingFilePolicy,
    Outcome, PipelineOptions, Severity, run_with,
};
use tempfile::TempDir;

use common::{
    FailAt, FailingCodec, PNG_BYTES, create_icon, create_package, create_unity_package, gunzip,
    gzip, leftover_workspaces, other_png, package_names, read_package, unity_entries,
};

/// Runs the pipeline with a fresh workspace root inside `dir`.
fn run_in(
    dir: &Path,
    options: PipelineOptions,
    reporter: &MemoryReporter,
) -> iconpack::Result<Outcome> {
    let root = dir.join("scratch");
    std::fs::create_dir_all(&root).unwrap();
    run_with(&options.workspace_root(&root), reporter, &GzipCodec::new())
}

fn icon_entries(path: &Path) -> Vec<Vec<u8>> {
    read_package(path)
        .into_iter()
        .filter(|(name, _)| name == ICON_ENTRY_NAME)
        .map(|(_, data)| data)
        .collect()
}

fn non_icon_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
    read_package(path)
        .into_iter()
        .filter(|(name, _)| name != ICON_ENTRY_NAME)
        .collect()
}

// ============================================================================
// Icon injection
// ============================================================================

#[test]
fn test_adds_icon_to_package_without_one() {
    let dir = TempDir::new().unwrap();
    let package = create_unity_package(dir.path());
    let icon = create_icon(dir.path(), "icon.png", PNG_BYTES);
    let before = non_icon_entries(&package);

    let reporter = MemoryReporter::new();
    let outcome = run_in(dir.path(), PipelineOptions::new(&package, &icon), &reporter).unwrap();

    let result = outcome.edit_result().expect("package should be updated");
    assert_eq!(result.entries_kept, unity_entries().len());
    assert_eq!(result.entries_deleted, 0);
    assert_eq!(result.entries_added, 1);
    assert_eq!(result.appended[0].name, ICON_ENTRY_NAME);
    assert_eq!(result.appended[0].size, PNG_BYTES.len() as u64);
    assert_eq!(result.appended[0].crc32, crc32fast::hash(PNG_BYTES));
    assert_eq!(result.packed_bytes, std::fs::metadata(&package).unwrap().len());

    assert_eq!(icon_entries(&package), vec![PNG_BYTES.to_vec()]);
    assert_eq!(non_icon_entries(&package), before);
    assert_eq!(reporter.count(Severity::Warning), 0);
    assert_eq!(reporter.count(Severity::Fatal), 0);
}

#[test]
fn test_replaces_existing_icon() {
    let dir = TempDir::new().unwrap();
    let package = create_package(
        dir.path(),
        "Tool.unitypackage",
        &[
            ("guid/asset", b"asset data" as &[u8]),
            (ICON_ENTRY_NAME, b"old icon"),
            ("guid/pathname", b"Assets/Tool.asset"),
        ],
    );
    let icon = create_icon(dir.path(), "icon.png", &other_png());

    let reporter = MemoryReporter::new();
    let outcome = run_in(dir.path(), PipelineOptions::new(&package, &icon), &reporter).unwrap();

    assert!(outcome.is_updated());
    assert_eq!(outcome.edit_result().unwrap().entries_deleted, 1);
    assert_eq!(
        package_names(&package),
        vec!["guid/asset", "guid/pathname", ICON_ENTRY_NAME]
    );
    assert_eq!(icon_entries(&package), vec![other_png()]);
    assert_eq!(
        reporter.messages_with(Severity::Warning),
        vec!["Found existing icon file, overwriting...".to_string()]
    );
}

#[test]
fn test_removes_every_duplicate_icon() {
    let dir = TempDir::new().unwrap();
    let package = create_package(
        dir.path(),
        "Tool.unitypackage",
        &[
            (ICON_ENTRY_NAME, b"first" as &[u8]),
            ("guid/asset", b"asset data"),
            (ICON_ENTRY_NAME, b"second"),
            (ICON_ENTRY_NAME, b"third"),
        ],
    );
    let icon = create_icon(dir.path(), "icon.png", PNG_BYTES);

    let reporter = MemoryReporter::new();
    let outcome = run_in(dir.path(), PipelineOptions::new(&package, &icon), &reporter).unwrap();

    assert_eq!(outcome.edit_result().unwrap().entries_deleted, 3);
    assert_eq!(package_names(&package), vec!["guid/asset", ICON_ENTRY_NAME]);
    assert_eq!(icon_entries(&package), vec![PNG_BYTES.to_vec()]);

    let warnings = reporter.messages_with(Severity::Warning);
    assert_eq!(warnings.len(), 2);
    assert!(warnings[1].contains("Found 3"), "unexpected warning: {}", warnings[1]);
}

#[test]
fn test_nested_icon_name_is_not_replaced() {
    let dir = TempDir::new().unwrap();
    let package = create_package(
        dir.path(),
        "Tool.unitypackage",
        &[("guid/.icon.png", b"nested" as &[u8])],
    );
    let icon = create_icon(dir.path(), "icon.png", PNG_BYTES);

    let reporter = MemoryReporter::new();
    let outcome = run_in(dir.path(), PipelineOptions::new(&package, &icon), &reporter).unwrap();

    assert_eq!(outcome.edit_result().unwrap().entries_deleted, 0);
    assert_eq!(reporter.count(Severity::Warning), 0);
    assert_eq!(package_names(&package), vec!["guid/.icon.png", ICON_ENTRY_NAME]);
    assert_eq!(icon_entries(&package), vec![PNG_BYTES.to_vec()]);
}

#[test]
fn test_kept_members_are_byte_identical() {
    let dir = TempDir::new().unwrap();
    let package = create_unity_package(dir.path());
    let original_tar = gunzip(&std::fs::read(&package).unwrap());
    let icon = create_icon(dir.path(), "icon.png", PNG_BYTES);

    let reporter = MemoryReporter::new();
    run_in(dir.path(), PipelineOptions::new(&package, &icon), &reporter).unwrap();

    // Everything up to the end marker is copied, then the icon, then the
    // original end marker.
    let edited_tar = gunzip(&std::fs::read(&package).unwrap());
    let end = original_tar.len() - 1024;
    assert_eq!(&edited_tar[..end], &original_tar[..end]);
    assert_eq!(&edited_tar[end..end + 10], b".icon.png\0");
    assert_eq!(edited_tar.len(), original_tar.len() + 512 + 512);
    assert!(edited_tar[edited_tar.len() - 1024..].iter().all(|&b| b == 0));
}

#[test]
fn test_second_run_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let package = create_unity_package(dir.path());
    let icon = create_icon(dir.path(), "icon.png", PNG_BYTES);
    let options = PipelineOptions::new(&package, &icon).mtime(EntryTime::Fixed(1_700_000_000));

    run_in(dir.path(), options.clone(), &MemoryReporter::new()).unwrap();
    let first = gunzip(&std::fs::read(&package).unwrap());

    let reporter = MemoryReporter::new();
    run_in(dir.path(), options, &reporter).unwrap();
    let second = gunzip(&std::fs::read(&package).unwrap());

    assert_eq!(first, second);
    assert_eq!(icon_entries(&package).len(), 1);
    assert!(reporter.contains("Found existing icon file"));
}

#[test]
fn test_icon_entry_header_fields() {
    let dir = TempDir::new().unwrap();
    let package = create_unity_package(dir.path());
    let icon = create_icon(dir.path(), "icon.png", PNG_BYTES);
    let options = PipelineOptions::new(&package, &icon)
        .mtime(EntryTime::Fixed(1_234_567_890))
        .mode(0o600);

    run_in(dir.path(), options, &MemoryReporter::new()).unwrap();

    let tar_bytes = gunzip(&std::fs::read(&package).unwrap());
    let mut archive = tar::Archive::new(tar_bytes.as_slice());
    let entry = archive
        .entries()
        .unwrap()
        .map(|e| e.unwrap())
        .find(|e| e.path().unwrap().to_str() == Some(ICON_ENTRY_NAME))
        .expect("icon entry");
    let header = entry.header();
    assert_eq!(header.entry_type(), tar::EntryType::Regular);
    assert_eq!(header.mtime().unwrap(), 1_234_567_890);
    assert_eq!(header.mode().unwrap(), 0o600);
    assert_eq!(header.size().unwrap(), PNG_BYTES.len() as u64);
}

#[test]
fn test_empty_package_gets_icon() {
    let dir = TempDir::new().unwrap();
    let package = create_package(dir.path(), "Empty.unitypackage", &[]);
    let icon = create_icon(dir.path(), "icon.png", PNG_BYTES);

    let outcome =
        run_in(dir.path(), PipelineOptions::new(&package, &icon), &MemoryReporter::new()).unwrap();

    assert_eq!(outcome.edit_result().unwrap().entries_kept, 0);
    assert_eq!(package_names(&package), vec![ICON_ENTRY_NAME]);
}

#[test]
fn test_progress_messages_in_order() {
    let dir = TempDir::new().unwrap();
    let package = create_unity_package(dir.path());
    let icon = create_icon(dir.path(), "icon.png", PNG_BYTES);

    let reporter = MemoryReporter::new();
    run_in(dir.path(), PipelineOptions::new(&package, &icon), &reporter).unwrap();

    assert_eq!(
        reporter.messages_with(Severity::Info),
        vec![
            "Validating inputs...",
            "Extracting Unity Package...",
            "Preparing icon...",
            "Modifying Unity Package...",
            "Building Unity Package...",
            "Cleaning up...",
        ]
    );
    assert!(leftover_workspaces(&dir.path().join("scratch")).is_empty());
}

#[test]
fn test_run_keeps_working_directory() {
    let dir = TempDir::new().unwrap();
    let package = create_unity_package(dir.path());
    let icon = create_icon(dir.path(), "icon.png", PNG_BYTES);
    let cwd = std::env::current_dir().unwrap();

    run_in(dir.path(), PipelineOptions::new(&package, &icon), &MemoryReporter::new()).unwrap();

    assert_eq!(std::env::current_dir().unwrap(), cwd);
}

// ============================================================================
// Validation and missing-file policies
// ============================================================================

#[test]
fn test_wrong_icon_extension_is_fatal() {
    let dir = TempDir::new().unwrap();
    let package = create_unity_package(dir.path());
    let before = std::fs::read(&package).unwrap();
    let icon = create_icon(dir.path(), "icon.PNG", PNG_BYTES);

    let reporter = MemoryReporter::new();
    let err = run_in(dir.path(), PipelineOptions::new(&package, &icon), &reporter).unwrap_err();

    match err {
        Error::InvalidExtension {
            input, expected, ..
        } => {
            assert_eq!(input, InputKind::Icon);
            assert_eq!(expected, ".png");
        }
        e => panic!("Expected InvalidExtension, got: {:?}", e),
    }
    assert_eq!(std::fs::read(&package).unwrap(), before);
    assert_eq!(reporter.count(Severity::Fatal), 1);
}

#[test]
fn test_wrong_package_extension_is_fatal_even_with_ignore() {
    let dir = TempDir::new().unwrap();
    let icon = create_icon(dir.path(), "icon.png", PNG_BYTES);
    let package = dir.path().join("Tool.tar.gz");

    let options = PipelineOptions::new(&package, &icon).package_missing(MissingFilePolicy::Ignore);
    let err = run_in(dir.path(), options, &MemoryReporter::new()).unwrap_err();

    match err {
        Error::InvalidExtension { input, .. } => assert_eq!(input, InputKind::Package),
        e => panic!("Expected InvalidExtension, got: {:?}", e),
    }
}

#[test]
fn test_icon_is_validated_before_package() {
    let dir = TempDir::new().unwrap();
    let icon = dir.path().join("icon.jpg");
    let package = dir.path().join("Tool.zip");

    let err = run_in(dir.path(), PipelineOptions::new(&package, &icon), &MemoryReporter::new())
        .unwrap_err();

    match err {
        Error::InvalidExtension { input, .. } => assert_eq!(input, InputKind::Icon),
        e => panic!("Expected InvalidExtension, got: {:?}", e),
    }
}

#[test]
fn test_missing_icon_fail_policy() {
    let dir = TempDir::new().unwrap();
    let package = create_unity_package(dir.path());
    let before = std::fs::read(&package).unwrap();
    let icon = dir.path().join("missing.png");

    let reporter = MemoryReporter::new();
    let err = run_in(dir.path(), PipelineOptions::new(&package, &icon), &reporter).unwrap_err();

    match err {
        Error::FileNotFound { input, path } => {
            assert_eq!(input, InputKind::Icon);
            assert_eq!(path, icon);
        }
        e => panic!("Expected FileNotFound, got: {:?}", e),
    }
    assert_eq!(std::fs::read(&package).unwrap(), before);
    assert_eq!(reporter.count(Severity::Fatal), 1);
    assert!(reporter.contains("Icon not found at path"));
}

#[test]
fn test_missing_icon_warn_policy_skips() {
    let dir = TempDir::new().unwrap();
    let package = create_unity_package(dir.path());
    let before = std::fs::read(&package).unwrap();
    let icon = dir.path().join("missing.png");

    let reporter = MemoryReporter::new();
    let options = PipelineOptions::new(&package, &icon).icon_missing(MissingFilePolicy::Warn);
    let outcome = run_in(dir.path(), options, &reporter).unwrap();

    match outcome {
        Outcome::Skipped(reason) => {
            assert_eq!(reason.input, InputKind::Icon);
            assert_eq!(reason.policy, MissingFilePolicy::Warn);
        }
        Outcome::Updated(_) => panic!("package should not be modified"),
    }
    assert_eq!(std::fs::read(&package).unwrap(), before);
    assert_eq!(reporter.count(Severity::Warning), 1);
    assert_eq!(reporter.count(Severity::Fatal), 0);
    assert!(leftover_workspaces(&dir.path().join("scratch")).is_empty());
}

#[test]
fn test_missing_icon_ignore_policy_reports_info() {
    let dir = TempDir::new().unwrap();
    let package = create_unity_package(dir.path());
    let icon = dir.path().join("missing.png");

    let reporter = MemoryReporter::new();
    let options = PipelineOptions::new(&package, &icon).icon_missing(MissingFilePolicy::Ignore);
    let outcome = run_in(dir.path(), options, &reporter).unwrap();

    assert!(!outcome.is_updated());
    assert_eq!(reporter.count(Severity::Warning), 0);
    assert!(
        reporter
            .messages_with(Severity::Info)
            .iter()
            .any(|m| m.contains("Icon not found at path"))
    );
}

#[test]
fn test_missing_package_policies() {
    let dir = TempDir::new().unwrap();
    let icon = create_icon(dir.path(), "icon.png", PNG_BYTES);
    let package = dir.path().join("Missing.unitypackage");

    let err = run_in(dir.path(), PipelineOptions::new(&package, &icon), &MemoryReporter::new())
        .unwrap_err();
    match err {
        Error::FileNotFound { input, .. } => assert_eq!(input, InputKind::Package),
        e => panic!("Expected FileNotFound, got: {:?}", e),
    }

    let reporter = MemoryReporter::new();
    let options = PipelineOptions::new(&package, &icon).package_missing(MissingFilePolicy::Warn);
    let outcome = run_in(dir.path(), options, &reporter).unwrap();
    assert!(!outcome.is_updated());
    assert!(reporter.contains("Unity Package not found at path"));
    assert!(!package.exists());
}

#[test]
fn test_missing_icon_short_circuits_package_check() {
    let dir = TempDir::new().unwrap();
    let icon = dir.path().join("missing.png");
    let package = dir.path().join("Missing.unitypackage");

    let reporter = MemoryReporter::new();
    let options = PipelineOptions::new(&package, &icon)
        .icon_missing(MissingFilePolicy::Warn)
        .package_missing(MissingFilePolicy::Warn);
    run_in(dir.path(), options, &reporter).unwrap();

    let warnings = reporter.messages_with(Severity::Warning);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].starts_with("Icon not found"));
}

#[test]
fn test_invalid_policy_strings() {
    let options = PipelineOptions::new("Tool.unitypackage", "icon.png");

    let err = options.clone().policies_from_strs("Warn", "bogus").unwrap_err();
    match err {
        Error::InvalidPolicy { input, value } => {
            assert_eq!(input, InputKind::Icon);
            assert_eq!(value, "Warn");
        }
        e => panic!("Expected InvalidPolicy, got: {:?}", e),
    }

    let err = options.clone().policies_from_strs("warn", "").unwrap_err();
    assert!(matches!(err, Error::InvalidPolicy { input: InputKind::Package, .. }));

    let options = options.policies_from_strs("ignore", "warn").unwrap();
    assert_eq!(options.icon_policy(), MissingFilePolicy::Ignore);
    assert_eq!(options.package_policy(), MissingFilePolicy::Warn);
}

// ============================================================================
// Failure atomicity
// ============================================================================

fn assert_failed_run_leaves_no_trace(at: FailAt) {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("scratch");
    std::fs::create_dir(&root).unwrap();
    let package = create_unity_package(dir.path());
    let before = std::fs::read(&package).unwrap();
    let icon = create_icon(dir.path(), "icon.png", PNG_BYTES);

    let reporter = MemoryReporter::new();
    let options = PipelineOptions::new(&package, &icon).workspace_root(&root);
    let err = run_with(&options, &reporter, &FailingCodec::new(at)).unwrap_err();

    assert!(matches!(err, Error::Io(_)), "expected Io error, got {:?}", err);
    assert_eq!(std::fs::read(&package).unwrap(), before);
    assert!(leftover_workspaces(&root).is_empty());
    assert_eq!(reporter.count(Severity::Fatal), 1);
    assert!(!reporter.contains("Cleaning up..."));
}

#[test]
fn test_decompress_failure_leaves_package_unchanged() {
    assert_failed_run_leaves_no_trace(FailAt::Decompress);
}

#[test]
fn test_recompress_failure_leaves_package_unchanged() {
    assert_failed_run_leaves_no_trace(FailAt::Recompress);
}

#[test]
fn test_non_gzip_package_is_corrupt() {
    let dir = TempDir::new().unwrap();
    let package = dir.path().join("Tool.unitypackage");
    std::fs::write(&package, b"PK\x03\x04 definitely not gzip").unwrap();
    let icon = create_icon(dir.path(), "icon.png", PNG_BYTES);

    let err = run_in(dir.path(), PipelineOptions::new(&package, &icon), &MemoryReporter::new())
        .unwrap_err();

    assert!(err.is_corruption(), "expected corruption, got {:?}", err);
    assert_eq!(std::fs::read(&package).unwrap(), b"PK\x03\x04 definitely not gzip");
    assert!(leftover_workspaces(&dir.path().join("scratch")).is_empty());
}

#[test]
fn test_gzip_of_non_tar_is_corrupt() {
    let dir = TempDir::new().unwrap();
    let package = dir.path().join("Tool.unitypackage");
    let garbage = gzip(&[0x41; 2048]);
    std::fs::write(&package, &garbage).unwrap();
    let icon = create_icon(dir.path(), "icon.png", PNG_BYTES);

    let err = run_in(dir.path(), PipelineOptions::new(&package, &icon), &MemoryReporter::new())
        .unwrap_err();

    match err {
        Error::CorruptArchive { offset, .. } => assert_eq!(offset, 0),
        e => panic!("Expected CorruptArchive, got: {:?}", e),
    }
    assert_eq!(std::fs::read(&package).unwrap(), garbage);
}

#[test]
fn test_package_permissions_survive_replacement() {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let package = create_unity_package(dir.path());
        std::fs::set_permissions(&package, std::fs::Permissions::from_mode(0o640)).unwrap();
        let icon = create_icon(dir.path(), "icon.png", PNG_BYTES);

        run_in(dir.path(), PipelineOptions::new(&package, &icon), &MemoryReporter::new())
            .unwrap();

        let mode = std::fs::metadata(&package).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }
}
