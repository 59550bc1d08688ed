//! The [`RankingDatabase`] type: a read-only view of a database of whole-genome
//! rankings.
//!
//! # Design
//!
//! A ranking database scores every gene of a genome against a fixed set of
//! regulatory features (e.g. transcription factor motifs) and stores each
//! gene's rank under every feature. Opening a database reads only the
//! metadata: the feature identifiers, in matrix row order, and the number of
//! genes. From the gene count the [`RankWidth`] of the stored ranks is derived
//! once; every later decode is dispatched on it.
//!
//! Two loads are supported:
//!
//!  - [`RankingDatabase::load_full`]: every gene, with columns in the store's
//!    gene index order.
//!  - [`RankingDatabase::load`]: only the genes of a [`GeneSignature`], with
//!    columns sorted by gene identifier. Requested genes that are absent from
//!    the database are silently left out.
//!
//! Each load returns a fresh [`RankingMatrix`]; nothing is shared between
//! calls, so loads can run concurrently from several threads.

use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

use log::{debug, warn};

use crate::error::RankDbError;
use crate::rankings::{ColumnDecoder, RankWidth, RankingMatrix};
use crate::signature::GeneSignature;
use crate::store::{RankingStore, SqliteRankingStore};
use crate::traits::RankValue;

/// A database of whole-genome rankings for a set of regulatory features.
pub struct RankingDatabase<S: RankingStore = SqliteRankingStore> {
    store: S,
    name: String,
    nomenclature: String,
    features: Vec<String>,
    gene_count: usize,
    width: RankWidth,
    // Filled on first call to `genes()`.
    genes: OnceLock<Vec<String>>,
}

impl RankingDatabase<SqliteRankingStore> {
    /// Open the SQLite ranking database in `path`.
    ///
    /// # Arguments
    /// * `path`: the database file.
    /// * `name`: a display name for the database.
    /// * `nomenclature`: the gene nomenclature of the database (e.g. `HGNC`).
    ///
    /// # Errors
    /// [`RankDbError::NotFound`] if `path` does not exist,
    /// [`RankDbError::InvalidArgument`] if `name` or `nomenclature` is empty,
    /// and [`RankDbError::Store`] if the metadata cannot be read.
    pub fn open(
        path: impl Into<PathBuf>,
        name: &str,
        nomenclature: &str,
    ) -> Result<Self, RankDbError> {
        let store = SqliteRankingStore::new(path)?;
        Self::with_store(store, name, nomenclature)
    }
}

impl<S: RankingStore> RankingDatabase<S> {
    /// Create a database over any [`RankingStore`], reading its metadata.
    pub fn with_store(store: S, name: &str, nomenclature: &str) -> Result<Self, RankDbError> {
        if name.is_empty() {
            return Err(RankDbError::InvalidArgument(
                "name must be specified".to_string(),
            ));
        }
        if nomenclature.is_empty() {
            return Err(RankDbError::InvalidArgument(
                "nomenclature must be specified".to_string(),
            ));
        }

        let features = store.scan_features()?;
        let gene_count = store.count_rankings()?;
        let width = RankWidth::for_gene_count(gene_count);
        debug!(
            "opened ranking database '{}': {} features, {} genes, {} ranks",
            name,
            features.len(),
            gene_count,
            width
        );

        Ok(Self {
            store,
            name: name.to_string(),
            nomenclature: nomenclature.to_string(),
            features,
            gene_count,
            width,
            genes: OnceLock::new(),
        })
    }

    /// The name of this database.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The nomenclature used for the gene identifiers.
    pub fn nomenclature(&self) -> &str {
        &self.nomenclature
    }

    /// The total number of genes ranked.
    pub fn total_genes(&self) -> usize {
        self.gene_count
    }

    /// The regulatory features with rankings in this database, in matrix row
    /// order.
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// The integer width ranks are stored with.
    pub fn rank_width(&self) -> RankWidth {
        self.width
    }

    /// All genes ranked in this database, in the store's gene index order.
    ///
    /// The list is read on first use and cached. Concurrent first calls may
    /// each query the store, but only one result is kept.
    pub fn genes(&self) -> Result<&[String], RankDbError> {
        if let Some(genes) = self.genes.get() {
            return Ok(genes.as_slice());
        }
        let genes = self.store.scan_genes()?;
        Ok(self.genes.get_or_init(|| genes).as_slice())
    }

    /// Load the whole database into memory.
    ///
    /// Returns a (features × genes) [`RankingMatrix`] whose columns follow the
    /// store's gene index order.
    pub fn load_full(&self) -> Result<RankingMatrix, RankDbError> {
        match self.width {
            RankWidth::Int16 => self.decode_full::<i16>(),
            RankWidth::Int32 => self.decode_full::<i32>(),
        }
    }

    /// Load the rankings of the genes in a signature for all features.
    ///
    /// Genes in the signature that are not in the database are left out, so
    /// the returned matrix may have fewer columns than the signature has
    /// genes. Columns are sorted by gene identifier.
    ///
    /// # Errors
    /// [`RankDbError::InvalidArgument`] if the signature is empty.
    pub fn load(&self, signature: &GeneSignature) -> Result<RankingMatrix, RankDbError> {
        if signature.nomenclature() != self.nomenclature {
            warn!(
                "gene signature '{}' uses nomenclature '{}', but database '{}' uses '{}'",
                signature.name(),
                signature.nomenclature(),
                self.name,
                self.nomenclature
            );
        }
        let genes: Vec<&str> = signature.genes().collect();
        self.load_genes(&genes)
    }

    /// Load the rankings of the given gene identifiers for all features.
    ///
    /// See [`RankingDatabase::load`].
    pub fn load_genes<G: AsRef<str>>(&self, genes: &[G]) -> Result<RankingMatrix, RankDbError> {
        if genes.is_empty() {
            return Err(RankDbError::InvalidArgument(
                "a gene signature must be supplied".to_string(),
            ));
        }
        let genes: Vec<&str> = genes.iter().map(|g| g.as_ref()).collect();
        match self.width {
            RankWidth::Int16 => self.decode_genes::<i16>(&genes),
            RankWidth::Int32 => self.decode_genes::<i32>(&genes),
        }
    }

    fn decode_full<T: RankValue>(&self) -> Result<RankingMatrix, RankDbError> {
        let mut decoder = ColumnDecoder::<T>::with_capacity(self.features.len(), self.gene_count);
        // Rows past the expected count are only counted, never decoded.
        let scanned = self.store.scan_rankings(&mut |gene, blob| {
            if decoder.len() == self.gene_count {
                return Ok(());
            }
            decoder.push(gene, blob)
        })?;
        if scanned != self.gene_count {
            return Err(RankDbError::GeneCountMismatch {
                expected: self.gene_count,
                found: scanned,
            });
        }

        let (genes, matrix) = decoder.finish()?;
        debug!(
            "loaded full ranking matrix of '{}': {} x {}",
            self.name,
            self.features.len(),
            genes.len()
        );
        Ok(RankingMatrix {
            features: self.features.clone(),
            genes,
            rankings: T::into_rankings(matrix),
        })
    }

    fn decode_genes<T: RankValue>(&self, genes: &[&str]) -> Result<RankingMatrix, RankDbError> {
        // The request size is only an upper bound on the columns returned.
        let capacity = genes.len().min(self.gene_count);
        let mut decoder = ColumnDecoder::<T>::with_capacity(self.features.len(), capacity);
        self.store
            .query_rankings(genes, &mut |gene, blob| decoder.push(gene, blob))?;

        let (found, matrix) = decoder.finish()?;
        debug!(
            "loaded {} of {} requested genes from '{}'",
            found.len(),
            genes.len(),
            self.name
        );
        Ok(RankingMatrix {
            features: self.features.clone(),
            genes: found,
            rankings: T::into_rankings(matrix),
        })
    }
}

impl<S: RankingStore> fmt::Display for RankingDatabase<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl<S: RankingStore> fmt::Debug for RankingDatabase<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RankingDatabase(name=\"{}\",n_features={})",
            self.name,
            self.features.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rankings::decode::encode_blob;
    use crate::rankings::Rankings;
    use crate::store::RowVisitor;
    use crate::test_utilities::{
        example_database, example_rankings, temp_database_file, write_database,
        write_raw_database,
    };
    use ndarray::array;

    fn open_example() -> (tempfile::NamedTempFile, RankingDatabase) {
        let file = example_database();
        let db = RankingDatabase::open(file.path(), "example", "HGNC").unwrap();
        (file, db)
    }

    #[test]
    fn test_open_metadata() {
        let (_file, db) = open_example();
        assert_eq!(db.name(), "example");
        assert_eq!(db.nomenclature(), "HGNC");
        assert_eq!(db.total_genes(), 4);
        assert_eq!(db.features(), &["f1", "f2", "f3"]);
        assert_eq!(db.rank_width(), RankWidth::Int16);
        assert_eq!(db.to_string(), "example");
        assert_eq!(
            format!("{:?}", db),
            "RankingDatabase(name=\"example\",n_features=3)"
        );
    }

    #[test]
    fn test_open_missing_file() {
        let err = RankingDatabase::open("tests_data/missing.db", "x", "HGNC").unwrap_err();
        assert!(matches!(err, RankDbError::NotFound(_)));
    }

    #[test]
    fn test_open_missing_file_reported_before_arguments() {
        let err = RankingDatabase::open("tests_data/missing.db", "", "").unwrap_err();
        assert!(matches!(err, RankDbError::NotFound(_)));
    }

    #[test]
    fn test_open_empty_name_or_nomenclature() {
        let file = example_database();
        let err = RankingDatabase::open(file.path(), "", "HGNC").unwrap_err();
        assert!(matches!(err, RankDbError::InvalidArgument(_)));
        let err = RankingDatabase::open(file.path(), "example", "").unwrap_err();
        assert!(matches!(err, RankDbError::InvalidArgument(_)));
    }

    #[test]
    fn test_open_not_a_database() {
        let file = temp_database_file();
        std::fs::write(file.path(), b"this is not an sqlite file, just some text").unwrap();
        let err = RankingDatabase::open(file.path(), "bad", "HGNC").unwrap_err();
        assert!(matches!(err, RankDbError::Store(_)));
    }

    #[test]
    fn test_genes_cached_in_index_order() {
        let (_file, db) = open_example();
        let genes = db.genes().unwrap();
        assert_eq!(genes, &["g3", "g1", "g4", "g2"]);
        // second call hits the cache and returns the same slice
        let again = db.genes().unwrap();
        assert!(std::ptr::eq(genes, again));
    }

    #[test]
    fn test_load_full() {
        let (_file, db) = open_example();
        let full = db.load_full().unwrap();
        assert_eq!(full.features, vec!["f1", "f2", "f3"]);
        assert_eq!(full.genes, vec!["g3", "g1", "g4", "g2"]);
        assert_eq!(full.rankings.shape(), (3, 4));

        let expected = example_rankings();
        for (col, gene) in full.genes.iter().enumerate() {
            let ranks = &expected[gene.as_str()];
            for (row, &rank) in ranks.iter().enumerate() {
                assert_eq!(full.rankings.get(row, col), Some(i32::from(rank)));
            }
        }
    }

    #[test]
    fn test_load_full_idempotent() {
        let (_file, db) = open_example();
        assert_eq!(db.load_full().unwrap(), db.load_full().unwrap());
    }

    #[test]
    fn test_load_subset() {
        let (_file, db) = open_example();
        let sub = db.load_genes(&["g4", "g2", "gX"]).unwrap();
        assert_eq!(sub.genes, vec!["g2", "g4"]);
        assert_eq!(sub.features, vec!["f1", "f2", "f3"]);
        assert_eq!(sub.rankings.shape(), (3, 2));
        assert_eq!(
            sub.rankings,
            Rankings::Int16(array![[1, 3], [3, 2], [0, 1]])
        );
    }

    #[test]
    fn test_load_signature() {
        let (_file, db) = open_example();
        let sig = GeneSignature::new("sig", "HGNC", ["g1", "g3"]).unwrap();
        let sub = db.load(&sig).unwrap();
        assert_eq!(sub.genes, vec!["g1", "g3"]);
        assert_eq!(sub.rank("f1", "g3"), Some(2));
    }

    #[test]
    fn test_load_nothing_matches() {
        let (_file, db) = open_example();
        let sub = db.load_genes(&["gX", "gY"]).unwrap();
        assert!(sub.genes.is_empty());
        assert_eq!(sub.rankings.shape(), (3, 0));
    }

    #[test]
    fn test_load_empty_request() {
        let (_file, db) = open_example();
        let err = db.load_genes::<&str>(&[]).unwrap_err();
        assert!(matches!(err, RankDbError::InvalidArgument(_)));
    }

    #[test]
    fn test_load_quoted_identifier() {
        let file = temp_database_file();
        write_database::<i16>(
            file.path(),
            &["f1", "f2"],
            &[("O'Brien1", vec![0, 1]), ("Smith", vec![1, 0])],
        )
        .unwrap();
        let db = RankingDatabase::open(file.path(), "quotes", "HGNC").unwrap();
        let sub = db.load_genes(&["O'Brien1"]).unwrap();
        assert_eq!(sub.genes, vec!["O'Brien1"]);
        assert_eq!(sub.rank("f2", "O'Brien1"), Some(1));
    }

    #[test]
    fn test_load_nul_identifier_dropped() {
        let (_file, db) = open_example();
        let sub = db.load_genes(&["g2", "bad\0id", "g4"]).unwrap();
        assert_eq!(sub.genes, vec!["g2", "g4"]);
        assert_eq!(sub.rankings.shape(), (3, 2));
    }

    #[test]
    fn test_load_bad_blob_length() {
        let file = temp_database_file();
        write_raw_database(
            file.path(),
            &["f1", "f2"],
            &[("g1", vec![0, 0, 1, 0]), ("g2", vec![1, 0, 0])],
        )
        .unwrap();
        let db = RankingDatabase::open(file.path(), "bad", "HGNC").unwrap();
        let err = db.load_full().unwrap_err();
        assert!(matches!(err, RankDbError::BlobLength { ref gene, .. } if gene == "g2"));
        assert!(err.is_decode_error());

        let err = db.load_genes(&["g2"]).unwrap_err();
        assert!(matches!(err, RankDbError::BlobLength { .. }));
        // rows that decode fine still load
        assert!(db.load_genes(&["g1"]).is_ok());
    }

    #[test]
    fn test_load_wrong_feature_count() {
        let file = temp_database_file();
        write_raw_database(
            file.path(),
            &["f1", "f2"],
            &[("g1", vec![0, 0, 1, 0, 2, 0])],
        )
        .unwrap();
        let db = RankingDatabase::open(file.path(), "bad", "HGNC").unwrap();
        let err = db.load_full().unwrap_err();
        assert!(matches!(
            err,
            RankDbError::RowLength {
                expected: 2,
                found: 3,
                ..
            }
        ));
    }

    // A store whose row count disagrees with its scan.
    struct MiscountedStore {
        count: usize,
        rows: Vec<(String, Vec<u8>)>,
    }

    impl RankingStore for MiscountedStore {
        fn count_rankings(&self) -> Result<usize, RankDbError> {
            Ok(self.count)
        }

        fn scan_features(&self) -> Result<Vec<String>, RankDbError> {
            Ok(vec!["f1".to_string()])
        }

        fn scan_genes(&self) -> Result<Vec<String>, RankDbError> {
            Ok(self.rows.iter().map(|(gene, _)| gene.clone()).collect())
        }

        fn scan_rankings(&self, visit: &mut RowVisitor<'_>) -> Result<usize, RankDbError> {
            for (gene, blob) in &self.rows {
                visit(gene, blob)?;
            }
            Ok(self.rows.len())
        }

        fn query_rankings(
            &self,
            _genes: &[&str],
            _visit: &mut RowVisitor<'_>,
        ) -> Result<usize, RankDbError> {
            Ok(0)
        }
    }

    #[test]
    fn test_load_full_gene_count_mismatch() {
        let rows: Vec<(String, Vec<u8>)> = (0..3i16)
            .map(|i| (format!("g{}", i), encode_blob(&[i])))
            .collect();
        for (count, found) in [(1, 3), (2, 3), (4, 3)] {
            let store = MiscountedStore {
                count,
                rows: rows.clone(),
            };
            let db = RankingDatabase::with_store(store, "miscounted", "HGNC").unwrap();
            let err = db.load_full().unwrap_err();
            assert!(
                matches!(err, RankDbError::GeneCountMismatch { expected, found: f } if expected == count && f == found),
                "{:?}",
                err
            );
            assert!(err.is_decode_error());
        }
    }

    #[test]
    fn test_int32_database() {
        let file = temp_database_file();
        let features = ["f1"];
        let ngenes = 32_769;
        let genes: Vec<String> = (0..ngenes).map(|i| format!("g{:05}", i)).collect();
        let rows: Vec<(&str, Vec<i32>)> = genes
            .iter()
            .enumerate()
            .map(|(i, g)| (g.as_str(), vec![(ngenes - 1 - i) as i32]))
            .collect();
        write_database::<i32>(file.path(), &features, &rows).unwrap();

        let db = RankingDatabase::open(file.path(), "wide", "HGNC").unwrap();
        assert_eq!(db.rank_width(), RankWidth::Int32);
        let sub = db.load_genes(&["g00000", "g32768"]).unwrap();
        assert_eq!(sub.rankings, Rankings::Int32(array![[32_768, 0]]));
    }

    #[test]
    fn test_concurrent_loads() {
        let (_file, db) = open_example();
        let reference = db.load_full().unwrap();
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| db.load_full().unwrap()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), reference);
            }
        });
    }
}
