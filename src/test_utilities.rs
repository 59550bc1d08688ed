//! Test cases and test utility functions.
//!
//! These write small ranking databases in the same SQLite layout the library
//! reads, so tests and benchmarks can run against real files.

use std::path::Path;

use indexmap::IndexMap;
use num_traits::NumCast;
use rand::seq::SliceRandom;
use rand::thread_rng;
use rusqlite::Connection;
use tempfile::NamedTempFile;

use crate::error::RankDbError;
use crate::rankings::decode::encode_blob;
use crate::traits::RankValue;

// Random database defaults for benchmarks.
pub const NRANDOM_FEATURES: usize = 100;
pub const NRANDOM_GENES: usize = 20_000;

/// Create an empty temporary file to hold a database.
pub fn temp_database_file() -> NamedTempFile {
    tempfile::Builder::new()
        .suffix(".db")
        .tempfile()
        .expect("could not create temporary database file")
}

/// Write a ranking database with raw (possibly malformed) blobs.
///
/// Features get `idx` values in slice order; genes are inserted in slice
/// order, which is also their storage order.
pub fn write_raw_database(
    path: impl AsRef<Path>,
    features: &[&str],
    rows: &[(&str, Vec<u8>)],
) -> Result<(), RankDbError> {
    let mut connection = Connection::open(path)?;
    connection.execute(
        "CREATE TABLE motifs (idx INTEGER PRIMARY KEY, motifName TEXT NOT NULL)",
        (),
    )?;
    connection.execute(
        "CREATE TABLE rankings (geneID TEXT PRIMARY KEY, ranking BLOB NOT NULL)",
        (),
    )?;

    let transaction = connection.transaction()?;
    {
        let mut insert =
            transaction.prepare("INSERT INTO motifs (idx, motifName) VALUES (?1, ?2)")?;
        for (idx, feature) in features.iter().enumerate() {
            insert.execute((idx as i64, feature))?;
        }
        let mut insert =
            transaction.prepare("INSERT INTO rankings (geneID, ranking) VALUES (?1, ?2)")?;
        for (gene, blob) in rows {
            insert.execute((gene, blob))?;
        }
    }
    transaction.commit()?;
    Ok(())
}

/// Write a ranking database, encoding each gene's ranks with the width of `T`.
pub fn write_database<T: RankValue>(
    path: impl AsRef<Path>,
    features: &[&str],
    rows: &[(&str, Vec<T>)],
) -> Result<(), RankDbError> {
    let raw: Vec<(&str, Vec<u8>)> = rows
        .iter()
        .map(|(gene, ranks)| (*gene, encode_blob(ranks)))
        .collect();
    write_raw_database(path, features, &raw)
}

/// The rankings of [`example_database`], in storage order: for each gene,
/// its rank under features `f1`, `f2`, `f3`.
pub fn example_rankings() -> IndexMap<&'static str, Vec<i16>> {
    let mut rankings = IndexMap::new();
    rankings.insert("g3", vec![2, 0, 2]);
    rankings.insert("g1", vec![0, 1, 3]);
    rankings.insert("g4", vec![3, 2, 1]);
    rankings.insert("g2", vec![1, 3, 0]);
    rankings
}

/// A database of three features (`f1`, `f2`, `f3`) and four genes, stored
/// in the order `g3`, `g1`, `g4`, `g2`.
pub fn example_database() -> NamedTempFile {
    let file = temp_database_file();
    let rows: Vec<(&str, Vec<i16>)> = example_rankings().into_iter().collect();
    write_database(file.path(), &["f1", "f2", "f3"], &rows)
        .expect("could not write example database");
    file
}

/// Random rankings: for each of `nfeatures` features, a random permutation of
/// `0..ngenes`. Returns the ranks per gene, i.e. `ngenes` vectors of length
/// `nfeatures`.
pub fn random_rankings<T: RankValue>(nfeatures: usize, ngenes: usize) -> Vec<Vec<T>> {
    let mut rng = thread_rng();
    let mut by_gene = vec![Vec::with_capacity(nfeatures); ngenes];
    let mut permutation: Vec<usize> = (0..ngenes).collect();
    for _ in 0..nfeatures {
        permutation.shuffle(&mut rng);
        for (gene, &rank) in permutation.iter().enumerate() {
            let rank = <T as NumCast>::from(rank).expect("rank does not fit the rank width");
            by_gene[gene].push(rank);
        }
    }
    by_gene
}

/// Write a random database of `nfeatures` × `ngenes` to a temporary file,
/// with features named `motif{i}` and genes named `gene{i}`.
pub fn random_database<T: RankValue>(nfeatures: usize, ngenes: usize) -> NamedTempFile {
    let file = temp_database_file();
    let features: Vec<String> = (0..nfeatures).map(|i| format!("motif{}", i)).collect();
    let genes: Vec<String> = (0..ngenes).map(|i| format!("gene{}", i)).collect();
    let rankings = random_rankings::<T>(nfeatures, ngenes);

    let feature_refs: Vec<&str> = features.iter().map(|f| f.as_str()).collect();
    let rows: Vec<(&str, Vec<T>)> = genes.iter().map(|g| g.as_str()).zip(rankings).collect();
    write_database(file.path(), &feature_refs, &rows).expect("could not write random database");
    file
}
