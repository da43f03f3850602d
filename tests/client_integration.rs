//! Integration tests for the full operation pipeline.
//!
//! Every test drives a [`PkgClient`] against a tempdir catalog with a mock
//! transport and a recording pkg tool, checking the ordering and bookkeeping
//! guarantees end to end.

use std::path::Path;
use std::sync::Arc;

use pkgsrc_toolkit::PkgClient;
use pkgsrc_toolkit::tools::{Fetcher, MockFetcher, PkgTool, RecordingPkgTool, ToolOutput};
use pkgsrc_toolkit::types::Package;
use tempfile::TempDir;

/// Share a recording tool between the test and the boxed client seam.
struct SharedTool(Arc<RecordingPkgTool>);

impl PkgTool for SharedTool {
    fn add(&self, archive: &Path, force: bool, verbose: bool) -> pkgsrc_toolkit::Result<ToolOutput> {
        self.0.add(archive, force, verbose)
    }

    fn delete(&self, full: &str, force: bool, verbose: bool) -> pkgsrc_toolkit::Result<ToolOutput> {
        self.0.delete(full, force, verbose)
    }
}

/// Share a mock fetcher between the test and the boxed client seam.
struct SharedFetcher(Arc<MockFetcher>);

impl Fetcher for SharedFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, String> {
        self.0.fetch(url)
    }
}

const REPO: &str = "http://repo.example.org/packages";

struct Harness {
    dir: TempDir,
    tool: Arc<RecordingPkgTool>,
    fetcher: Arc<MockFetcher>,
    client: PkgClient,
}

impl Harness {
    /// Client over a fresh tempdir catalog, answering yes to every prompt.
    fn new(fetcher: MockFetcher, tool: RecordingPkgTool) -> Self {
        let dir = TempDir::new().unwrap();
        let tool = Arc::new(tool);
        let fetcher = Arc::new(fetcher);
        let client = PkgClient::builder()
            .db_path(dir.path().join("catalog.db"))
            .cache_dir(dir.path().join("cache"))
            .install_root(dir.path().to_path_buf())
            .repositories(vec![REPO.to_string()])
            .assume_yes(true)
            .fetcher(Box::new(SharedFetcher(Arc::clone(&fetcher))))
            .pkg_tool(Box::new(SharedTool(Arc::clone(&tool))))
            .build()
            .unwrap();
        Self {
            dir,
            tool,
            fetcher,
            client,
        }
    }

    /// Record a remote package (archive body defines its file size).
    fn seed_remote(&self, full: &str, body: &[u8], deps: &[&str]) {
        let pkg = Package::new(full, "a package", body.len() as i64, 4 * body.len() as i64)
            .unwrap();
        self.client.catalog().insert_remote_pkg(&pkg, REPO).unwrap();
        for dep in deps {
            self.client.catalog().add_remote_dep(full, dep).unwrap();
        }
    }

    /// Record an installed package and its dependency bookkeeping.
    fn seed_local(&self, full: &str, deps: &[&str], required_by: &[&str]) {
        let pkg = Package::new(full, "a package", 100, 400).unwrap();
        self.client.catalog().insert_local_pkg(&pkg).unwrap();
        for dep in deps {
            self.client.catalog().add_local_dep(full, dep).unwrap();
        }
        for requirer in required_by {
            let name = pkg.name.clone();
            self.client
                .catalog()
                .add_local_reverse_dep(&name, requirer)
                .unwrap();
        }
    }

    fn archive_body(full: &str) -> Vec<u8> {
        format!("archive of {full}").into_bytes()
    }

    /// Register the archive of a package with the mock transport.
    fn serve(fetcher: MockFetcher, full: &str) -> MockFetcher {
        fetcher.with(
            &format!("{REPO}/{full}.tgz"),
            Self::archive_body(full),
        )
    }

    fn reload(&mut self) {
        self.client.refresh_lists().unwrap();
    }
}

#[test]
fn simple_install_orders_dependencies_first() {
    let fetcher = Harness::serve(
        Harness::serve(MockFetcher::new(), "foo-1.0"),
        "bar-2.0",
    );
    let mut h = Harness::new(fetcher, RecordingPkgTool::new());
    h.seed_remote("foo-1.0", &Harness::archive_body("foo-1.0"), &["bar>=2.0"]);
    h.seed_remote("bar-2.0", &Harness::archive_body("bar-2.0"), &[]);
    h.reload();

    let summary = h.client.install(&["foo".to_string()]).unwrap();

    assert!(summary.performed);
    assert_eq!(summary.to_install, vec!["bar-2.0", "foo-1.0"]);
    assert!(summary.to_upgrade.is_empty());
    assert!(summary.to_remove.is_empty());
    assert_eq!(summary.downloaded, 2);

    let actions = h.tool.actions();
    assert_eq!(actions.len(), 2);
    assert!(actions[0].starts_with("add") && actions[0].contains("bar-2.0.tgz"));
    assert!(actions[1].starts_with("add") && actions[1].contains("foo-1.0.tgz"));

    // explicitly requested packages get the keep flag, dependencies do not
    assert_eq!(h.client.show_keep().unwrap(), vec!["foo"]);
}

#[test]
fn install_is_idempotent_on_the_cache() {
    let fetcher = Harness::serve(MockFetcher::new(), "foo-1.0");
    let mut h = Harness::new(fetcher, RecordingPkgTool::new());
    h.seed_remote("foo-1.0", &Harness::archive_body("foo-1.0"), &[]);
    h.reload();

    let first = h.client.install(&["foo".to_string()]).unwrap();
    assert_eq!(first.downloaded, 1);
    let calls_after_first = h.fetcher.calls();

    // the local list is unchanged (ingestion is external), so the same
    // impact is computed; the archive must come from the cache this time
    let second = h.client.install(&["foo".to_string()]).unwrap();
    assert_eq!(second.downloaded, 0);
    assert_eq!(h.fetcher.calls(), calls_after_first);
}

#[test]
fn upgrade_picks_the_closest_branch() {
    let fetcher = Harness::serve(MockFetcher::new(), "mysql-5.1.25");
    let mut h = Harness::new(fetcher, RecordingPkgTool::new());
    h.seed_remote(
        "mysql-5.1.25",
        &Harness::archive_body("mysql-5.1.25"),
        &[],
    );
    h.seed_remote(
        "mysql-5.5.20",
        &Harness::archive_body("mysql-5.5.20"),
        &[],
    );
    h.seed_local("mysql-5.1.20", &[], &[]);
    h.client.catalog().set_keep("mysql").unwrap();
    h.reload();

    let summary = h.client.upgrade().unwrap();

    assert!(summary.performed);
    assert_eq!(summary.to_install, vec!["mysql-5.1.25"]);
    assert_eq!(summary.to_upgrade, vec!["mysql-5.1.20"]);

    // the old version disappears before the new one is unpacked
    let actions = h.tool.actions();
    assert_eq!(actions[0], "delete mysql-5.1.20");
    assert!(actions[1].starts_with("add") && actions[1].contains("mysql-5.1.25.tgz"));
}

#[test]
fn upgrade_with_everything_current_does_nothing() {
    let mut h = Harness::new(MockFetcher::new(), RecordingPkgTool::new());
    h.seed_remote("zlib-1.2", &Harness::archive_body("zlib-1.2"), &[]);
    h.seed_local("zlib-1.2", &[], &[]);
    h.client.catalog().set_keep("zlib").unwrap();
    h.reload();

    let summary = h.client.upgrade().unwrap();
    assert!(!summary.performed);
    assert!(summary.is_empty());
    assert!(h.tool.actions().is_empty());
}

#[test]
fn unmet_requirement_blocks_the_package_but_not_the_run() {
    let mut h = Harness::new(MockFetcher::new(), RecordingPkgTool::new());
    h.seed_remote("baz-1.0", &Harness::archive_body("baz-1.0"), &[]);
    h.client
        .catalog()
        .add_remote_require("baz-1.0", "libX.so.7")
        .unwrap();
    h.seed_local("x11-6.0", &[], &[]);
    h.client
        .catalog()
        .add_local_provide("x11-6.0", "libX.so.6")
        .unwrap();
    h.reload();

    let summary = h.client.install(&["baz".to_string()]).unwrap();

    assert_eq!(summary.unmet, vec!["baz-1.0"]);
    assert!(summary.to_install.is_empty());
    assert!(!summary.performed);
    assert!(h.tool.actions().is_empty());
}

#[test]
fn remove_takes_reverse_dependents_first() {
    let mut h = Harness::new(MockFetcher::new(), RecordingPkgTool::new());
    h.seed_local("libqux-1.0", &[], &["app-a-1.0"]);
    h.seed_local("app-a-1.0", &["libqux>=1.0"], &["app-b-1.0"]);
    h.seed_local("app-b-1.0", &["app-a>=1.0"], &[]);
    h.reload();

    let summary = h.client.remove(&["libqux".to_string()]).unwrap();

    assert!(summary.performed);
    assert_eq!(
        summary.removed,
        vec!["app-b-1.0", "app-a-1.0", "libqux-1.0"]
    );
    assert_eq!(
        h.tool.actions(),
        vec![
            "delete app-b-1.0",
            "delete app-a-1.0",
            "delete libqux-1.0"
        ]
    );
}

#[test]
fn remove_reports_uninstalled_arguments() {
    let mut h = Harness::new(MockFetcher::new(), RecordingPkgTool::new());
    h.seed_local("zlib-1.2", &[], &[]);
    h.reload();

    let summary = h.client.remove(&["nosuch".to_string()]).unwrap();
    assert_eq!(summary.not_installed, vec!["nosuch"]);
    assert!(summary.removed.is_empty());
    assert!(!summary.performed);
}

#[test]
fn file_scheme_repository_symlinks_instead_of_fetching() {
    let mut h = Harness::new(MockFetcher::new(), RecordingPkgTool::new());

    let srv = h.dir.path().join("srv");
    std::fs::create_dir_all(&srv).unwrap();
    let body = Harness::archive_body("foo-1.0");
    std::fs::write(srv.join("foo-1.0.tgz"), &body).unwrap();

    let repo = format!("file://{}", srv.display());
    let pkg = Package::new("foo-1.0", "a package", body.len() as i64, 100).unwrap();
    h.client.catalog().insert_remote_pkg(&pkg, &repo).unwrap();
    h.reload();

    let summary = h.client.install(&["foo".to_string()]).unwrap();

    assert!(summary.performed);
    assert_eq!(summary.symlinked, 1);
    assert_eq!(summary.downloaded, 0);
    assert_eq!(h.fetcher.calls(), 0);

    let cached = h.client.cache().archive_path("foo-1.0");
    assert!(std::fs::symlink_metadata(&cached)
        .unwrap()
        .file_type()
        .is_symlink());
}

#[test]
fn tolerated_fetch_failure_skips_only_the_failed_package() {
    // apple's archive is missing from the transport; the harness answers
    // yes to the continue-anyway prompt
    let fetcher = Harness::serve(MockFetcher::new(), "beet-1.0");
    let mut h = Harness::new(fetcher, RecordingPkgTool::new());
    h.seed_remote("apple-1.0", &Harness::archive_body("apple-1.0"), &[]);
    h.seed_remote("beet-1.0", &Harness::archive_body("beet-1.0"), &[]);
    h.reload();

    let summary = h
        .client
        .install(&["apple".to_string(), "beet".to_string()])
        .unwrap();

    assert!(summary.performed);
    assert_eq!(summary.downloaded, 1);
    let actions = h.tool.actions();
    assert_eq!(actions.len(), 1);
    assert!(actions[0].contains("beet-1.0.tgz"));
}

#[test]
fn fetch_failure_on_an_upgrade_keeps_the_old_version() {
    // the new archive cannot be fetched; the installed version must not be
    // removed either
    let mut h = Harness::new(MockFetcher::new(), RecordingPkgTool::new());
    h.seed_remote("mysql-5.1.25", &Harness::archive_body("mysql-5.1.25"), &[]);
    h.seed_local("mysql-5.1.20", &[], &[]);
    h.client.catalog().set_keep("mysql").unwrap();
    h.reload();

    let summary = h.client.upgrade().unwrap();

    assert!(summary.performed);
    assert!(h.tool.actions().is_empty());
    assert_eq!(summary.errors, 0);
}

#[test]
fn download_only_fills_the_cache_without_installing() {
    let fetcher = Harness::serve(MockFetcher::new(), "foo-1.0");
    let dir = TempDir::new().unwrap();
    let tool = Arc::new(RecordingPkgTool::new());
    let fetcher = Arc::new(fetcher);
    let mut client = PkgClient::builder()
        .db_path(dir.path().join("catalog.db"))
        .cache_dir(dir.path().join("cache"))
        .install_root(dir.path().to_path_buf())
        .repositories(vec![REPO.to_string()])
        .assume_yes(true)
        .download_only(true)
        .fetcher(Box::new(SharedFetcher(Arc::clone(&fetcher))))
        .pkg_tool(Box::new(SharedTool(Arc::clone(&tool))))
        .build()
        .unwrap();

    let body = Harness::archive_body("foo-1.0");
    let pkg = Package::new("foo-1.0", "a package", body.len() as i64, 100).unwrap();
    client.catalog().insert_remote_pkg(&pkg, REPO).unwrap();
    client.refresh_lists().unwrap();

    let summary = client.install(&["foo".to_string()]).unwrap();

    assert!(summary.performed);
    assert_eq!(summary.downloaded, 1);
    assert!(tool.actions().is_empty());
    assert!(client.cache().archive_path("foo-1.0").exists());
    // download-only must not pretend the package is user-requested
    assert!(client.show_keep().unwrap().is_empty());
}

#[test]
fn autoremove_deletes_only_orphans() {
    let mut h = Harness::new(MockFetcher::new(), RecordingPkgTool::new());
    h.seed_local("app-1.0", &["liba>=1.0"], &[]);
    h.seed_local("liba-1.0", &[], &["app-1.0"]);
    h.seed_local("orphan-1.0", &[], &[]);
    h.client.catalog().set_keep("app").unwrap();
    h.reload();

    let summary = h.client.autoremove().unwrap();

    assert!(summary.performed);
    assert_eq!(summary.removed, vec!["orphan-1.0"]);
    assert_eq!(h.tool.actions(), vec!["delete orphan-1.0"]);
}

#[test]
fn autoremove_orders_dependent_orphans_first() {
    let mut h = Harness::new(MockFetcher::new(), RecordingPkgTool::new());
    h.seed_local("keepme-1.0", &[], &[]);
    // stray-app depends on stray-lib; both are orphans
    h.seed_local("stray-app-1.0", &["stray-lib>=1.0"], &[]);
    h.seed_local("stray-lib-1.0", &[], &["stray-app-1.0"]);
    h.client.catalog().set_keep("keepme").unwrap();
    h.reload();

    let summary = h.client.autoremove().unwrap();
    assert_eq!(summary.removed, vec!["stray-app-1.0", "stray-lib-1.0"]);
}

#[test]
fn keep_export_and_import_round_trip() {
    let fetcher = Harness::serve(MockFetcher::new(), "foo-1.0");
    let mut h = Harness::new(fetcher, RecordingPkgTool::new());
    h.seed_remote("foo-1.0", &Harness::archive_body("foo-1.0"), &[]);
    h.seed_local("zlib-1.2", &[], &[]);
    h.reload();

    assert_eq!(
        h.client.keep(&["zlib".to_string()]).unwrap(),
        vec!["zlib"]
    );
    assert_eq!(h.client.export_keep().unwrap(), vec!["zlib"]);

    let list = h.dir.path().join("keep.txt");
    std::fs::write(&list, "# saved packages\nfoo\n\n").unwrap();
    let summary = h.client.import_keep(&list).unwrap();
    assert_eq!(summary.to_install, vec!["foo-1.0"]);
    assert_eq!(h.client.show_keep().unwrap(), vec!["foo", "zlib"]);

    assert_eq!(
        h.client.unkeep(&["zlib".to_string()]).unwrap(),
        vec!["zlib"]
    );
    assert_eq!(h.client.show_keep().unwrap(), vec!["foo"]);
}

#[test]
fn error_log_collects_tool_stderr() {
    let fetcher = Harness::serve(MockFetcher::new(), "grumpy-1.0");
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("install-err.log");
    let tool = Arc::new(RecordingPkgTool::new().with_stderr(
        "grumpy-1.0",
        "Warning: grumpy-1.0 was built for a platform\n",
    ));
    let mut client = PkgClient::builder()
        .db_path(dir.path().join("catalog.db"))
        .cache_dir(dir.path().join("cache"))
        .install_root(dir.path().to_path_buf())
        .repositories(vec![REPO.to_string()])
        .error_log(log.clone())
        .assume_yes(true)
        .fetcher(Box::new(SharedFetcher(Arc::new(fetcher))))
        .pkg_tool(Box::new(SharedTool(Arc::clone(&tool))))
        .build()
        .unwrap();

    let body = Harness::archive_body("grumpy-1.0");
    let pkg = Package::new("grumpy-1.0", "a package", body.len() as i64, 100).unwrap();
    client.catalog().insert_remote_pkg(&pkg, REPO).unwrap();
    client.refresh_lists().unwrap();

    let summary = client.install(&["grumpy".to_string()]).unwrap();
    assert_eq!(summary.warnings, 1);
    assert_eq!(summary.errors, 0);

    let logged = std::fs::read_to_string(&log).unwrap();
    assert!(logged.contains("---installing grumpy-1.0"));
    assert!(logged.contains("Warning"));
}

#[test]
fn failed_tool_steps_raise_the_error_count() {
    let fetcher = Harness::serve(MockFetcher::new(), "broken-1.0");
    let tool = RecordingPkgTool::new()
        .with_failure("broken-1.0")
        .with_stderr("broken-1.0", "pkg_add: 1 package addition failed\n");
    let mut h = Harness::new(fetcher, tool);
    h.seed_remote("broken-1.0", &Harness::archive_body("broken-1.0"), &[]);
    h.reload();

    let summary = h.client.install(&["broken".to_string()]).unwrap();
    assert!(summary.performed);
    assert_eq!(summary.errors, 1);
}

#[test]
fn list_search_and_avail_reflect_both_lists() {
    let mut h = Harness::new(MockFetcher::new(), RecordingPkgTool::new());
    h.seed_remote("foo-1.5", &Harness::archive_body("foo-1.5"), &[]);
    h.seed_remote("bar-2.0", &Harness::archive_body("bar-2.0"), &[]);
    h.seed_local("foo-1.0", &[], &[]);
    h.reload();

    assert_eq!(h.client.avail().len(), 2);
    assert_eq!(h.client.list(None).len(), 1);

    let lesser = h
        .client
        .list(Some(pkgsrc_toolkit::ListFilter::Lesser));
    assert_eq!(lesser.len(), 1);
    assert_eq!(lesser[0].full, "foo-1.5");

    let hits = h.client.search("^foo").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].status, Some('<'));
}

#[test]
fn show_dep_trees_walk_the_catalog() {
    let mut h = Harness::new(MockFetcher::new(), RecordingPkgTool::new());
    h.seed_remote("foo-1.0", &Harness::archive_body("foo-1.0"), &["bar>=2.0"]);
    h.seed_remote("bar-2.0", &Harness::archive_body("bar-2.0"), &[]);
    h.seed_local("libqux-1.0", &[], &["app-a-1.0"]);
    h.seed_local("app-a-1.0", &["libqux>=1.0"], &[]);
    h.reload();

    assert_eq!(
        h.client.show_direct_depends("foo").unwrap(),
        vec!["bar>=2.0"]
    );

    let tree = h.client.show_full_dep_tree("foo").unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].name, "bar");

    let rtree = h.client.show_rev_dep_tree("libqux").unwrap();
    assert_eq!(rtree.len(), 1);
    assert_eq!(rtree[0].depend, "app-a-1.0");
}

#[test]
fn clean_cache_empties_the_archive_directory() {
    let fetcher = Harness::serve(MockFetcher::new(), "foo-1.0");
    let mut h = Harness::new(fetcher, RecordingPkgTool::new());
    h.seed_remote("foo-1.0", &Harness::archive_body("foo-1.0"), &[]);
    h.reload();

    h.client.install(&["foo".to_string()]).unwrap();
    assert!(h.client.cache().archive_path("foo-1.0").exists());

    let freed = h.client.clean_cache().unwrap();
    assert!(freed > 0);
    assert!(!h.client.cache().archive_path("foo-1.0").exists());
}
