//! End-to-end flows over a small PHP project: scan, persist, look up, import.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use phpns::cache::IndexCache;
use phpns::config::Settings;
use phpns::error::Error;
use phpns::types::{AnchorKind, Fqdn, Insertion};
use phpns::{build_index, edit, plan_import, store};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn names(set: Option<&BTreeSet<Fqdn>>) -> Vec<&str> {
    set.into_iter().flatten().map(Fqdn::as_str).collect()
}

fn fqdn(s: &str) -> Fqdn {
    Fqdn::parse(s).unwrap()
}

// ---------------------------------------------------------------------------
// Index build over the fixture project
// ---------------------------------------------------------------------------

#[test]
fn scan_finds_every_declared_type() {
    let roots = vec![fixture("mini-php")];
    let (index, report) = build_index(&roots, &Settings::default(), &AtomicBool::new(false));

    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert!(!report.cancelled);
    assert_eq!(report.files_scanned, 8);

    assert_eq!(
        names(index.lookup("User")),
        ["\\App\\Models\\User", "\\Lib\\Http\\User"]
    );
    assert_eq!(names(index.lookup("HasName")), ["\\App\\Contracts\\HasName"]);
    assert_eq!(names(index.lookup("Loggable")), ["\\App\\Support\\Loggable"]);
    assert_eq!(names(index.lookup("Status")), ["\\App\\Enums\\Status"]);
    assert_eq!(names(index.lookup("Legacy")), ["\\Legacy"]);
}

#[test]
fn namespace_segments_are_lookup_keys() {
    let roots = vec![fixture("mini-php")];
    let (index, _) = build_index(&roots, &Settings::default(), &AtomicBool::new(false));

    assert_eq!(
        names(index.lookup("Models")),
        ["\\App\\Models\\Post", "\\App\\Models\\User"]
    );
    assert_eq!(
        names(index.lookup("Http")),
        ["\\App\\Http\\Controllers\\UserController", "\\Lib\\Http\\User"]
    );
}

#[test]
fn comments_variables_and_excluded_folders_yield_nothing() {
    let roots = vec![fixture("mini-php")];
    let (index, _) = build_index(&roots, &Settings::default(), &AtomicBool::new(false));

    // Docblock, line comment, `$class` variable, node_modules, non-.php file.
    for absent in ["Draft", "Logger", "Ignored", "Vendor", "NotPhp"] {
        assert!(index.lookup(absent).is_none(), "{absent} should not be indexed");
    }
}

#[test]
fn exclusions_come_from_settings() {
    let roots = vec![fixture("mini-php")];
    let settings = Settings {
        folders_to_exclude: vec!["lib".to_string()],
        ..Settings::default()
    };
    let (index, report) = build_index(&roots, &settings, &AtomicBool::new(false));

    // node_modules is no longer excluded, lib now is.
    assert_eq!(report.files_scanned, 7);
    assert_eq!(names(index.lookup("Ignored")), ["\\Vendor\\Pkg\\Ignored"]);
    assert!(index.lookup("Legacy").is_none());
    assert_eq!(names(index.lookup("User")), ["\\App\\Models\\User"]);
}

#[test]
fn one_undecodable_file_does_not_sink_the_scan() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..9 {
        fs::write(
            dir.path().join(format!("Model{i}.php")),
            format!("<?php\nnamespace App\\Models;\n\nclass Model{i} {{}}\n"),
        )
        .unwrap();
    }
    let broken = dir.path().join("Broken.php");
    fs::write(&broken, b"<?php\nclass Broken \xff\xfe {}\n").unwrap();

    let roots = vec![dir.path().to_path_buf()];
    let (index, report) = build_index(&roots, &Settings::default(), &AtomicBool::new(false));

    assert_eq!(report.files_scanned, 10);
    assert_eq!(report.fqdns.len(), 9);
    assert_eq!(report.errors.len(), 1);
    assert!(matches!(&report.errors[0], Error::Decode { path } if *path == broken));
    assert_eq!(index.lookup("Models").map(BTreeSet::len), Some(9));
    assert!(index.lookup("Broken").is_none());
}

#[test]
fn malformed_declaration_is_reported_per_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Good.php"), "<?php\nclass Good {}\n").unwrap();
    fs::write(dir.path().join("Bad.php"), "<?php\nnamespace 9Bad;\n\nclass Bad {}\n").unwrap();

    let roots = vec![dir.path().to_path_buf()];
    let (index, report) = build_index(&roots, &Settings::default(), &AtomicBool::new(false));

    assert_eq!(names(index.lookup("Good")), ["\\Good"]);
    assert_eq!(report.errors.len(), 1);
    let Error::MalformedDeclaration { line, .. } = &report.errors[0] else {
        panic!("expected a malformed declaration, got {:?}", report.errors[0]);
    };
    assert_eq!(*line, 2);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn persisted_index_survives_a_fresh_cache() {
    let cache_dir = tempfile::tempdir().unwrap();
    let roots = vec![fixture("mini-php")];
    let settings = Settings::default();
    let cancel = AtomicBool::new(false);

    let built = IndexCache::new(cache_dir.path())
        .get_or_build(&roots, &settings, &cancel)
        .unwrap();

    let path = store::index_path(cache_dir.path(), &roots);
    assert!(path.is_file());
    assert!(
        path.file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with(".namespaces.index.json")
    );

    // A second process only has the file.
    let reloaded = IndexCache::new(cache_dir.path()).get(&roots).unwrap().unwrap();
    assert_eq!(reloaded.as_mapping(), built.as_mapping());
}

#[test]
fn rebuilding_an_unchanged_project_is_idempotent() {
    let cache_dir = tempfile::tempdir().unwrap();
    let roots = vec![fixture("mini-php")];
    let cache = IndexCache::new(cache_dir.path());
    let settings = Settings::default();
    let cancel = AtomicBool::new(false);

    let first = cache.rebuild(&roots, &settings, &cancel).unwrap();
    let bytes = fs::read(&first.path).unwrap();
    let second = cache.rebuild(&roots, &settings, &cancel).unwrap();

    assert_eq!(first.path, second.path);
    assert_eq!(first.index.as_mapping(), second.index.as_mapping());
    assert_eq!(fs::read(&second.path).unwrap(), bytes);
}

#[test]
fn malformed_namespace_file_does_not_poison_the_saved_index() {
    let project = tempfile::tempdir().unwrap();
    fs::write(
        project.path().join("Good.php"),
        "<?php\nnamespace App;\n\nclass Good {}\n",
    )
    .unwrap();
    fs::write(
        project.path().join("Bad.php"),
        "<?php\nnamespace App\\9Bad;\n\nclass Foo {}\n",
    )
    .unwrap();

    let cache_dir = tempfile::tempdir().unwrap();
    let roots = vec![project.path().to_path_buf()];
    let cache = IndexCache::new(cache_dir.path());
    let rebuilt = cache
        .rebuild(&roots, &Settings::default(), &AtomicBool::new(false))
        .unwrap();

    assert_eq!(rebuilt.report.errors.len(), 1);
    assert!(matches!(
        rebuilt.report.errors[0],
        Error::MalformedDeclaration { line: 2, .. }
    ));
    assert!(rebuilt.index.lookup("Foo").is_none());

    let loaded = store::load(&rebuilt.path).unwrap().unwrap();
    assert_eq!(loaded.as_mapping(), rebuilt.index.as_mapping());
    assert_eq!(names(loaded.lookup("Good")), ["\\App\\Good"]);
}

// ---------------------------------------------------------------------------
// Lookup, then import
// ---------------------------------------------------------------------------

fn controller_copy() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("UserController.php");
    fs::copy(
        fixture("mini-php").join("app/Http/Controllers/UserController.php"),
        &path,
    )
    .unwrap();
    (dir, path)
}

#[test]
fn looked_up_class_is_imported_in_order() {
    let roots = vec![fixture("mini-php")];
    let (index, _) = build_index(&roots, &Settings::default(), &AtomicBool::new(false));
    let (_dir, path) = controller_copy();

    let user = index
        .lookup("User")
        .unwrap()
        .iter()
        .find(|f| f.as_str().starts_with("\\App\\"))
        .unwrap()
        .clone();

    let Insertion::Insert(directive) = edit::plan_file(&path, &user).unwrap() else {
        panic!("expected an insertion");
    };
    assert_eq!(directive.anchor, AnchorKind::AfterImport);
    assert_eq!(directive.text, "use App\\Models\\User;\n");

    edit::apply_to_file(&path, &user).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(
        text.contains(
            "use App\\Contracts\\HasName;\nuse App\\Models\\User;\nuse App\\Support\\Loggable;\n"
        ),
        "{text}"
    );
}

#[test]
fn already_imported_class_leaves_file_untouched() {
    let (_dir, path) = controller_copy();
    let before = fs::read_to_string(&path).unwrap();

    let outcome = edit::apply_to_file(&path, &fqdn("App\\Support\\Loggable")).unwrap();
    assert_eq!(outcome, Insertion::AlreadyImported { line: 6 });
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn trait_use_in_class_body_is_not_a_file_import() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Post.php");
    fs::write(
        &path,
        "<?php\n\nnamespace App\\Models;\n\nclass Post\n{\n    use Loggable;\n}\n",
    )
    .unwrap();

    edit::apply_to_file(&path, &fqdn("App\\Support\\Loggable")).unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "<?php\n\nnamespace App\\Models;\n\nuse App\\Support\\Loggable;\n\nclass Post\n{\n    use Loggable;\n}\n"
    );
}

#[test]
fn repeated_imports_converge() {
    let (_dir, path) = controller_copy();
    for name in ["App\\Models\\User", "App\\Enums\\Status", "App\\Models\\User"] {
        edit::apply_to_file(&path, &fqdn(name)).unwrap();
    }
    let text = fs::read_to_string(&path).unwrap();
    let imports: Vec<&str> = text.lines().filter(|l| l.starts_with("use ")).collect();
    assert_eq!(
        imports,
        [
            "use App\\Contracts\\HasName;",
            "use App\\Enums\\Status;",
            "use App\\Models\\User;",
            "use App\\Support\\Loggable;",
        ]
    );
}

#[test]
fn plan_import_works_on_editor_text() {
    let text = "<?php\nnamespace App;\n\nuse App\\Alpha; // first\n\nclass Foo {}\n";

    let Insertion::Insert(directive) = plan_import(text, &fqdn("App\\Beta")).unwrap() else {
        panic!("expected an insertion");
    };
    assert_eq!(directive.line, 5);
    let mut edited = text.to_string();
    edited.insert_str(directive.offset, &directive.text);
    assert_eq!(
        plan_import(&edited, &fqdn("App\\Beta")).unwrap(),
        Insertion::AlreadyImported { line: 5 }
    );

    let err = plan_import("no tag here\n", &fqdn("App\\Beta")).unwrap_err();
    assert!(matches!(err, Error::NoAnchor { path: None }));
}
