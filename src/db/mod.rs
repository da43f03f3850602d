//! SQLite-backed package catalog.
//!
//! One database file holds everything the client knows: configured
//! repositories, the remote and local package sets, their dependency
//! patterns, reverse dependencies, conflicts, requirements, provides, and
//! the keep flags. The catalog is rebuildable from the repository summaries
//! at any time, so durability is traded away for speed: large page cache,
//! exclusive locking, synchronous off, memory journal.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, params};

use crate::error::{PkgToolkitError, Result};
use crate::types::Package;

/// Bumped whenever the table layout changes; a mismatch forces a
/// destructive reset of the catalog file.
const SCHEMA_VERSION: i64 = 2;

/// Connection-wide tuning applied at open.
const PRAGMAS: &[&str] = &[
    "cache_size = 1000000",
    "locking_mode = EXCLUSIVE",
    "synchronous = OFF",
    "journal_mode = MEMORY",
];

/// Table layout for the catalog.
const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS repos (
        url TEXT PRIMARY KEY,
        mtime INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS local_pkg (
        full TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        version TEXT NOT NULL,
        comment TEXT NOT NULL DEFAULT '',
        file_size INTEGER NOT NULL DEFAULT 0,
        size_pkg INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS remote_pkg (
        full TEXT NOT NULL,
        name TEXT NOT NULL,
        version TEXT NOT NULL,
        comment TEXT NOT NULL DEFAULT '',
        file_size INTEGER NOT NULL DEFAULT 0,
        size_pkg INTEGER NOT NULL DEFAULT 0,
        repo_url TEXT NOT NULL,
        PRIMARY KEY (full, repo_url)
    );

    CREATE TABLE IF NOT EXISTS local_deps (
        full TEXT NOT NULL,
        pattern TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS remote_deps (
        full TEXT NOT NULL,
        pattern TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS local_reverse_deps (
        name TEXT NOT NULL,
        required_by TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS remote_conflicts (
        full TEXT NOT NULL,
        pattern TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS remote_requires (
        full TEXT NOT NULL,
        requirement TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS remote_provides (
        full TEXT NOT NULL,
        provision TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS local_provides (
        full TEXT NOT NULL,
        provision TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS keep_pkgs (
        name TEXT PRIMARY KEY
    );

    CREATE TABLE IF NOT EXISTS pkgdb (
        mtime INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS schema_info (
        version INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_remote_pkg_name ON remote_pkg (name);
    CREATE INDEX IF NOT EXISTS idx_remote_deps_full ON remote_deps (full);
    CREATE INDEX IF NOT EXISTS idx_local_deps_full ON local_deps (full);
    CREATE INDEX IF NOT EXISTS idx_local_reverse_name ON local_reverse_deps (name);
";

/// Handle on the catalog database.
#[derive(Debug)]
pub struct CatalogDb {
    conn: Connection,
    path: PathBuf,
}

impl CatalogDb {
    /// What: Open (and if necessary create) the catalog at a path.
    ///
    /// Inputs:
    /// - `path`: Catalog database file.
    ///
    /// Output:
    /// - Returns the handle, or `SchemaMismatch` when the file was written
    ///   by an incompatible version (the caller decides whether to
    ///   [`reset`](Self::reset)), or `Db` on any SQLite failure.
    ///
    /// Details:
    /// - Applies the speed-over-durability PRAGMA set before any query.
    /// - Creates missing tables and stamps the schema version on first use.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;

        for pragma in PRAGMAS {
            apply_pragma(&conn, pragma)?;
        }

        conn.execute_batch(SCHEMA)?;

        let db = Self {
            conn,
            path: path.to_path_buf(),
        };
        db.check_compat()?;
        Ok(db)
    }

    /// What: Destroy the catalog file and recreate an empty one.
    ///
    /// Details:
    /// - Used after the user confirms a schema-mismatch reset. The catalog
    ///   contents are rebuildable from the repository summaries.
    pub fn reset(self) -> Result<Self> {
        let path = self.path.clone();
        drop(self.conn);
        std::fs::remove_file(&path)?;
        tracing::warn!("catalog {} destroyed for schema reset", path.display());
        Self::open_at(&path)
    }

    /// Path of the underlying database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Verify the stored schema version, stamping fresh databases.
    fn check_compat(&self) -> Result<()> {
        let stored: Option<i64> = self
            .conn
            .query_row("SELECT version FROM schema_info", [], |r| r.get(0))
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        match stored {
            None => {
                self.conn.execute(
                    "INSERT INTO schema_info (version) VALUES (?1)",
                    params![SCHEMA_VERSION],
                )?;
                Ok(())
            }
            Some(v) if v == SCHEMA_VERSION => Ok(()),
            Some(v) => {
                tracing::error!("catalog schema version {v}, expected {SCHEMA_VERSION}");
                Err(PkgToolkitError::SchemaMismatch)
            }
        }
    }

    // --- repositories ---

    /// Record repository URLs, keeping already-known ones untouched.
    pub fn record_repositories(&self, urls: &[String]) -> Result<()> {
        for url in urls {
            self.conn.execute(
                "INSERT OR IGNORE INTO repos (url, mtime) VALUES (?1, 0)",
                params![url],
            )?;
        }
        Ok(())
    }

    /// All configured repositories with their summary mtimes.
    pub fn repositories(&self) -> Result<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare("SELECT url, mtime FROM repos")?;
        let rows = stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Stored summary mtime for one repository.
    pub fn repo_mtime(&self, url: &str) -> Result<Option<i64>> {
        optional(
            self.conn
                .query_row("SELECT mtime FROM repos WHERE url = ?1", params![url], |r| {
                    r.get(0)
                }),
        )
    }

    /// Update the summary mtime for one repository.
    pub fn set_repo_mtime(&self, url: &str, mtime: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE repos SET mtime = ?1 WHERE url = ?2",
            params![mtime, url],
        )?;
        Ok(())
    }

    /// Repository URL carrying a remote package, if any.
    pub fn repository_for(&self, full: &str) -> Result<Option<String>> {
        optional(self.conn.query_row(
            "SELECT repo_url FROM remote_pkg WHERE full = ?1 LIMIT 1",
            params![full],
            |r| r.get(0),
        ))
    }

    // --- package-database bookkeeping ---

    /// Recorded mtime of the low-level package database, if any.
    pub fn pkgdb_mtime(&self) -> Result<Option<i64>> {
        optional(
            self.conn
                .query_row("SELECT mtime FROM pkgdb", [], |r| r.get(0)),
        )
    }

    /// What: Record the low-level package database mtime.
    ///
    /// Output:
    /// - Returns `true` when the stored value changed, signalling that the
    ///   local package set needs re-ingestion.
    pub fn set_pkgdb_mtime(&self, mtime: i64) -> Result<bool> {
        let stored = self.pkgdb_mtime()?;
        if stored == Some(mtime) {
            return Ok(false);
        }
        self.conn.execute("DELETE FROM pkgdb", [])?;
        self.conn
            .execute("INSERT INTO pkgdb (mtime) VALUES (?1)", params![mtime])?;
        Ok(true)
    }

    // --- package sets ---

    /// All locally installed packages, unordered.
    pub fn local_packages(&self) -> Result<Vec<Package>> {
        self.query_packages("SELECT full, name, version, comment, file_size, size_pkg FROM local_pkg")
    }

    /// All remotely available packages, unordered.
    pub fn remote_packages(&self) -> Result<Vec<Package>> {
        self.query_packages(
            "SELECT full, name, version, comment, file_size, size_pkg FROM remote_pkg",
        )
    }

    /// Run a package-row query and collect the results.
    fn query_packages(&self, sql: &str) -> Result<Vec<Package>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |r| {
            Ok(Package {
                full: r.get(0)?,
                name: r.get(1)?,
                version: r.get(2)?,
                comment: r.get(3)?,
                file_size: r.get(4)?,
                size_pkg: r.get(5)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Insert or replace a local package row.
    pub fn insert_local_pkg(&self, pkg: &Package) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO local_pkg (full, name, version, comment, file_size, size_pkg)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                pkg.full,
                pkg.name,
                pkg.version,
                pkg.comment,
                pkg.file_size,
                pkg.size_pkg
            ],
        )?;
        Ok(())
    }

    /// Insert or replace a remote package row for one repository.
    pub fn insert_remote_pkg(&self, pkg: &Package, repo_url: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO remote_pkg
             (full, name, version, comment, file_size, size_pkg, repo_url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                pkg.full,
                pkg.name,
                pkg.version,
                pkg.comment,
                pkg.file_size,
                pkg.size_pkg,
                repo_url
            ],
        )?;
        Ok(())
    }

    /// Delete a local package row and its dependency records.
    pub fn delete_local_pkg(&self, full: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM local_pkg WHERE full = ?1", params![full])?;
        self.conn
            .execute("DELETE FROM local_deps WHERE full = ?1", params![full])?;
        self.conn.execute(
            "DELETE FROM local_provides WHERE full = ?1",
            params![full],
        )?;
        self.conn.execute(
            "DELETE FROM local_reverse_deps WHERE required_by = ?1",
            params![full],
        )?;
        Ok(())
    }

    // --- dependency records ---

    /// Record a dependency pattern of a remote package.
    pub fn add_remote_dep(&self, full: &str, pattern: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO remote_deps (full, pattern) VALUES (?1, ?2)",
            params![full, pattern],
        )?;
        Ok(())
    }

    /// Record a dependency pattern of a local package.
    pub fn add_local_dep(&self, full: &str, pattern: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO local_deps (full, pattern) VALUES (?1, ?2)",
            params![full, pattern],
        )?;
        Ok(())
    }

    /// Record that an installed package requires another installed package.
    pub fn add_local_reverse_dep(&self, name: &str, required_by: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO local_reverse_deps (name, required_by) VALUES (?1, ?2)",
            params![name, required_by],
        )?;
        Ok(())
    }

    /// Dependency patterns declared by a remote package.
    pub fn remote_deps_of(&self, full: &str) -> Result<Vec<String>> {
        self.string_column(
            "SELECT DISTINCT pattern FROM remote_deps WHERE full = ?1",
            full,
        )
    }

    /// Dependency patterns declared by a local package.
    pub fn local_deps_of(&self, full: &str) -> Result<Vec<String>> {
        self.string_column(
            "SELECT DISTINCT pattern FROM local_deps WHERE full = ?1",
            full,
        )
    }

    /// Full names of installed packages requiring a package name.
    pub fn local_reverse_deps(&self, name: &str) -> Result<Vec<String>> {
        self.string_column(
            "SELECT DISTINCT required_by FROM local_reverse_deps WHERE name = ?1",
            name,
        )
    }

    // --- conflicts / requirements / provides ---

    /// Record a conflict pattern declared by a remote package.
    pub fn add_remote_conflict(&self, full: &str, pattern: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO remote_conflicts (full, pattern) VALUES (?1, ?2)",
            params![full, pattern],
        )?;
        Ok(())
    }

    /// Record a shared-object requirement of a remote package.
    pub fn add_remote_require(&self, full: &str, requirement: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO remote_requires (full, requirement) VALUES (?1, ?2)",
            params![full, requirement],
        )?;
        Ok(())
    }

    /// Record a shared object provided by a remote package.
    pub fn add_remote_provide(&self, full: &str, provision: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO remote_provides (full, provision) VALUES (?1, ?2)",
            params![full, provision],
        )?;
        Ok(())
    }

    /// Record a shared object provided by an installed package.
    pub fn add_local_provide(&self, full: &str, provision: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO local_provides (full, provision) VALUES (?1, ?2)",
            params![full, provision],
        )?;
        Ok(())
    }

    /// Conflict patterns declared by a remote package.
    pub fn remote_conflicts_of(&self, full: &str) -> Result<Vec<String>> {
        self.string_column(
            "SELECT pattern FROM remote_conflicts WHERE full = ?1",
            full,
        )
    }

    /// Shared-object requirements of a remote package.
    pub fn remote_requires_of(&self, full: &str) -> Result<Vec<String>> {
        self.string_column(
            "SELECT requirement FROM remote_requires WHERE full = ?1",
            full,
        )
    }

    /// Shared objects provided by a remote package.
    pub fn remote_provides_of(&self, full: &str) -> Result<Vec<String>> {
        self.string_column(
            "SELECT provision FROM remote_provides WHERE full = ?1",
            full,
        )
    }

    /// Shared objects provided by an installed package.
    pub fn local_provides_of(&self, full: &str) -> Result<Vec<String>> {
        self.string_column(
            "SELECT provision FROM local_provides WHERE full = ?1",
            full,
        )
    }

    // --- keep flags ---

    /// Names of packages flagged as explicitly requested.
    pub fn kept_packages(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM keep_pkgs ORDER BY name")?;
        let rows = stmt.query_map([], |r| r.get(0))?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Flag a package name as explicitly requested.
    pub fn set_keep(&self, name: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO keep_pkgs (name) VALUES (?1)",
            params![name],
        )?;
        Ok(())
    }

    /// Drop the keep flag from a package name.
    pub fn unset_keep(&self, name: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM keep_pkgs WHERE name = ?1", params![name])?;
        Ok(())
    }

    /// Whether a package name carries the keep flag.
    pub fn is_kept(&self, name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM keep_pkgs WHERE name = ?1",
            params![name],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }

    /// Collect a single text column for one key.
    fn string_column(&self, sql: &str, key: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params![key], |r| r.get(0))?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }
}

/// Apply one PRAGMA, tolerating both value-returning and silent pragmas.
fn apply_pragma(conn: &Connection, pragma: &str) -> Result<()> {
    match conn.query_row(&format!("PRAGMA {pragma};"), [], |_| Ok(())) {
        Ok(()) => Ok(()),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Map `QueryReturnedNoRows` to `None`.
fn optional<T>(result: rusqlite::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_test_db(dir: &tempfile::TempDir) -> CatalogDb {
        CatalogDb::open_at(&dir.path().join("catalog.db")).unwrap()
    }

    fn pkg(full: &str, file_size: i64, size_pkg: i64) -> Package {
        Package::new(full, "a package", file_size, size_pkg).unwrap()
    }

    #[test]
    fn open_creates_and_reopens() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);
        db.insert_remote_pkg(&pkg("foo-1.0", 10, 20), "http://repo").unwrap();
        drop(db);

        let db = open_test_db(&dir);
        let remotes = db.remote_packages().unwrap();
        assert_eq!(remotes.len(), 1);
        assert_eq!(remotes[0].full, "foo-1.0");
    }

    #[test]
    fn schema_mismatch_is_detected_and_reset_recovers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        let db = CatalogDb::open_at(&path).unwrap();
        db.conn
            .execute("UPDATE schema_info SET version = 1", [])
            .unwrap();
        drop(db);

        let err = CatalogDb::open_at(&path).unwrap_err();
        assert!(matches!(err, PkgToolkitError::SchemaMismatch));

        // destroying the file recovers an empty, compatible catalog
        std::fs::remove_file(&path).unwrap();
        let db = CatalogDb::open_at(&path).unwrap();
        assert!(db.remote_packages().unwrap().is_empty());
    }

    #[test]
    fn reset_destroys_contents() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);
        db.insert_local_pkg(&pkg("foo-1.0", 10, 20)).unwrap();
        let db = db.reset().unwrap();
        assert!(db.local_packages().unwrap().is_empty());
    }

    #[test]
    fn repositories_are_recorded_once() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);
        let urls = vec!["http://a".to_string(), "http://b".to_string()];
        db.record_repositories(&urls).unwrap();
        db.record_repositories(&urls).unwrap();
        assert_eq!(db.repositories().unwrap().len(), 2);

        db.set_repo_mtime("http://a", 42).unwrap();
        assert_eq!(db.repo_mtime("http://a").unwrap(), Some(42));
        assert_eq!(db.repo_mtime("http://c").unwrap(), None);
    }

    #[test]
    fn pkgdb_mtime_reports_changes() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);
        assert!(db.set_pkgdb_mtime(100).unwrap());
        assert!(!db.set_pkgdb_mtime(100).unwrap());
        assert!(db.set_pkgdb_mtime(200).unwrap());
        assert_eq!(db.pkgdb_mtime().unwrap(), Some(200));
    }

    #[test]
    fn dependency_records_round_trip() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);
        db.add_remote_dep("foo-1.0", "bar>=2.0").unwrap();
        db.add_remote_dep("foo-1.0", "baz-[0-9]*").unwrap();
        db.add_local_reverse_dep("libqux", "app-a-1.0").unwrap();

        assert_eq!(
            db.remote_deps_of("foo-1.0").unwrap(),
            vec!["bar>=2.0", "baz-[0-9]*"]
        );
        assert!(db.remote_deps_of("bar-2.0").unwrap().is_empty());
        assert_eq!(
            db.local_reverse_deps("libqux").unwrap(),
            vec!["app-a-1.0"]
        );
    }

    #[test]
    fn delete_local_pkg_cleans_related_rows() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);
        db.insert_local_pkg(&pkg("app-a-1.0", 10, 20)).unwrap();
        db.add_local_dep("app-a-1.0", "libqux>=1").unwrap();
        db.add_local_reverse_dep("libqux", "app-a-1.0").unwrap();
        db.add_local_provide("app-a-1.0", "liba.so.1").unwrap();

        db.delete_local_pkg("app-a-1.0").unwrap();
        assert!(db.local_packages().unwrap().is_empty());
        assert!(db.local_deps_of("app-a-1.0").unwrap().is_empty());
        assert!(db.local_reverse_deps("libqux").unwrap().is_empty());
        assert!(db.local_provides_of("app-a-1.0").unwrap().is_empty());
    }

    #[test]
    fn keep_flags_round_trip() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);
        db.set_keep("foo").unwrap();
        db.set_keep("foo").unwrap();
        db.set_keep("bar").unwrap();
        assert_eq!(db.kept_packages().unwrap(), vec!["bar", "foo"]);
        assert!(db.is_kept("foo").unwrap());

        db.unset_keep("foo").unwrap();
        assert!(!db.is_kept("foo").unwrap());
    }

    #[test]
    fn repository_for_finds_owning_repo() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);
        db.insert_remote_pkg(&pkg("foo-1.0", 10, 20), "http://repo").unwrap();
        assert_eq!(
            db.repository_for("foo-1.0").unwrap(),
            Some("http://repo".to_string())
        );
        assert_eq!(db.repository_for("bar-1.0").unwrap(), None);
    }
}
