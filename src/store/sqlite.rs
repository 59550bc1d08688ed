//! Ranking databases stored as SQLite files.
//!
//! The database holds two tables:
//!
//!  - `motifs(idx, motifName)`: the features, one row each, with `idx` giving
//!    the row order of the ranking matrix.
//!  - `rankings(geneID, ranking)`: one row per gene, where `ranking` is a blob
//!    of little-endian signed integers, one per feature in `idx` order.
//!
//! Connections are always opened read-only and live only as long as a single
//! query.

use std::fs::File;
use std::path::{Path, PathBuf};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};

use super::{RankingStore, RowVisitor};
use crate::error::RankDbError;

// Total number of genes in the database.
const GENE_COUNT_QUERY: &str = "SELECT COUNT(*) FROM rankings;";

// Features in matrix row order.
const FEATURE_IDS_QUERY: &str = "SELECT motifName FROM motifs ORDER BY idx;";

// Genes in storage order.
const ALL_GENE_IDS_QUERY: &str = "SELECT geneID FROM rankings ORDER BY rowid;";

// The whole ranking table in storage order.
const ALL_RANKINGS_QUERY: &str = "SELECT geneID, ranking FROM rankings ORDER BY rowid;";

/// Quote a single identifier as an SQL string literal, doubling any embedded
/// single quotes.
pub fn quote_identifier(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Quote identifiers and join them with commas, for use in an `IN (...)` list.
pub fn quoted_csv<S: AsRef<str>>(values: &[S]) -> String {
    values
        .iter()
        .map(|v| quote_identifier(v.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

// Rankings for a set of genes, sorted by gene identifier.
fn rankings_query(genes: &[&str]) -> String {
    format!(
        "SELECT geneID, ranking FROM rankings WHERE geneID IN ({}) ORDER BY geneID;",
        quoted_csv(genes)
    )
}

/// A [`RankingStore`] backed by an SQLite file.
#[derive(Clone, Debug)]
pub struct SqliteRankingStore {
    path: PathBuf,
}

impl SqliteRankingStore {
    /// Create a store for the database in `path`.
    ///
    /// # Errors
    /// Returns [`RankDbError::NotFound`] if `path` is not an existing file
    /// this process can read. No connection is opened here.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, RankDbError> {
        let path = path.into();
        if !path.is_file() || File::open(&path).is_err() {
            return Err(RankDbError::NotFound(path));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Open a fresh read-only connection; it is closed when dropped.
    fn connect(&self) -> Result<Connection, RankDbError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        Ok(Connection::open_with_flags(&self.path, flags)?)
    }

    fn query_strings(&self, sql: &str) -> Result<Vec<String>, RankDbError> {
        let connection = self.connect()?;
        let mut statement = connection.prepare(sql)?;
        let values = statement
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(values)
    }

    fn visit_rows(&self, sql: &str, visit: &mut RowVisitor<'_>) -> Result<usize, RankDbError> {
        let connection = self.connect()?;
        let mut statement = connection.prepare(sql)?;
        let mut rows = statement.query([])?;
        let mut visited = 0;
        while let Some(row) = rows.next()? {
            let gene: String = row.get(0)?;
            match row.get_ref(1)? {
                ValueRef::Blob(blob) => visit(&gene, blob)?,
                _ => return Err(RankDbError::NotABlob(gene)),
            }
            visited += 1;
        }
        Ok(visited)
    }
}

impl RankingStore for SqliteRankingStore {
    fn count_rankings(&self) -> Result<usize, RankDbError> {
        let connection = self.connect()?;
        let count: i64 = connection.query_row(GENE_COUNT_QUERY, [], |row| row.get(0))?;
        usize::try_from(count).map_err(|_| RankDbError::InvalidGeneCount(count))
    }

    fn scan_features(&self) -> Result<Vec<String>, RankDbError> {
        self.query_strings(FEATURE_IDS_QUERY)
    }

    fn scan_genes(&self) -> Result<Vec<String>, RankDbError> {
        self.query_strings(ALL_GENE_IDS_QUERY)
    }

    fn scan_rankings(&self, visit: &mut RowVisitor<'_>) -> Result<usize, RankDbError> {
        self.visit_rows(ALL_RANKINGS_QUERY, visit)
    }

    fn query_rankings(
        &self,
        genes: &[&str],
        visit: &mut RowVisitor<'_>,
    ) -> Result<usize, RankDbError> {
        // SQLite ends a string literal at a NUL byte, and no stored
        // identifier can match one.
        let genes: Vec<&str> = genes
            .iter()
            .copied()
            .filter(|gene| !gene.contains('\0'))
            .collect();
        if genes.is_empty() {
            return Ok(0);
        }
        self.visit_rows(&rankings_query(&genes), visit)
    }
}
