//! Ranking matrices and the integer widths they are stored with.
//!
//! A ranking database stores, for every gene, one binary blob holding that
//! gene's rank under each feature. Loading turns these per-gene blobs into a
//! dense (features × genes) matrix, [`Rankings`], whose element type depends on
//! the [`RankWidth`] of the database. [`RankingMatrix`] pairs that matrix with
//! the feature and gene identifiers labelling its rows and columns.

use std::io::Write;

use ndarray::Array2;

use crate::error::RankDbError;
use crate::traits::TsvSerialize;

pub mod decode;

pub use decode::ColumnDecoder;

/// The number of genes up to which 16-bit ranks suffice.
///
/// Ranks are 0-based, so `2^15` genes need ranks `0..=32767`, which is
/// exactly `i16::MAX`.
pub const INT16_MAX_GENES: usize = 1 << 15;

/// The byte width of each rank stored in a database blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RankWidth {
    Int16,
    Int32,
}

impl RankWidth {
    /// Derive the width needed to store 0-based rankings of `gene_count` genes.
    pub fn for_gene_count(gene_count: usize) -> Self {
        if gene_count <= INT16_MAX_GENES {
            RankWidth::Int16
        } else {
            RankWidth::Int32
        }
    }

    /// Number of bytes per rank.
    pub fn bytes(&self) -> usize {
        match self {
            RankWidth::Int16 => 2,
            RankWidth::Int32 => 4,
        }
    }
}

impl std::fmt::Display for RankWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankWidth::Int16 => write!(f, "int16"),
            RankWidth::Int32 => write!(f, "int32"),
        }
    }
}

/// A dense (features × genes) matrix of rankings, tagged with its width.
#[derive(Clone, Debug, PartialEq)]
pub enum Rankings {
    Int16(Array2<i16>),
    Int32(Array2<i32>),
}

impl Rankings {
    pub fn width(&self) -> RankWidth {
        match self {
            Rankings::Int16(_) => RankWidth::Int16,
            Rankings::Int32(_) => RankWidth::Int32,
        }
    }

    /// The `(features, genes)` shape.
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Rankings::Int16(m) => m.dim(),
            Rankings::Int32(m) => m.dim(),
        }
    }

    /// The rank of gene column `gene` under feature row `feature`, widened to
    /// `i32`; `None` if either index is out of bounds.
    pub fn get(&self, feature: usize, gene: usize) -> Option<i32> {
        match self {
            Rankings::Int16(m) => m.get((feature, gene)).map(|&x| i32::from(x)),
            Rankings::Int32(m) => m.get((feature, gene)).copied(),
        }
    }

    /// Copy into an `i32` matrix regardless of the stored width.
    pub fn to_i32(&self) -> Array2<i32> {
        match self {
            Rankings::Int16(m) => m.mapv(i32::from),
            Rankings::Int32(m) => m.clone(),
        }
    }

    pub fn as_int16(&self) -> Option<&Array2<i16>> {
        match self {
            Rankings::Int16(m) => Some(m),
            Rankings::Int32(_) => None,
        }
    }

    pub fn as_int32(&self) -> Option<&Array2<i32>> {
        match self {
            Rankings::Int16(_) => None,
            Rankings::Int32(m) => Some(m),
        }
    }

    fn row_i32(&self, feature: usize) -> Vec<i32> {
        match self {
            Rankings::Int16(m) => m.row(feature).iter().map(|&x| i32::from(x)).collect(),
            Rankings::Int32(m) => m.row(feature).to_vec(),
        }
    }
}

/// The result of loading a ranking database: the feature identifiers (rows),
/// the gene identifiers (columns), and the rankings themselves.
///
/// Column `g` of `rankings` holds the ranks of `genes[g]`; row `f` holds the
/// ranks under `features[f]`. The gene vector is authoritative for the number
/// of columns.
#[derive(Clone, Debug, PartialEq)]
pub struct RankingMatrix {
    pub features: Vec<String>,
    pub genes: Vec<String>,
    pub rankings: Rankings,
}

impl RankingMatrix {
    pub fn nfeatures(&self) -> usize {
        self.features.len()
    }

    pub fn ngenes(&self) -> usize {
        self.genes.len()
    }

    pub fn width(&self) -> RankWidth {
        self.rankings.width()
    }

    /// Column index of `gene`, if it was loaded.
    pub fn gene_index(&self, gene: &str) -> Option<usize> {
        self.genes.iter().position(|g| g == gene)
    }

    /// Row index of `feature`.
    pub fn feature_index(&self, feature: &str) -> Option<usize> {
        self.features.iter().position(|f| f == feature)
    }

    /// Look up a rank by identifiers.
    pub fn rank(&self, feature: &str, gene: &str) -> Option<i32> {
        let row = self.feature_index(feature)?;
        let col = self.gene_index(gene)?;
        self.rankings.get(row, col)
    }

    /// Split into the `(features, genes, rankings)` triple.
    pub fn into_parts(self) -> (Vec<String>, Vec<String>, Rankings) {
        (self.features, self.genes, self.rankings)
    }

    /// Write the matrix as TSV: a header of `feature` followed by the gene
    /// identifiers, then one row per feature.
    pub fn to_tsv<W: Write>(&self, writer: &mut W) -> Result<(), RankDbError> {
        writeln!(writer, "feature\t{}", self.genes.as_slice().to_tsv())?;
        for (row, feature) in self.features.iter().enumerate() {
            let ranks = self.rankings.row_i32(row);
            writeln!(writer, "{}\t{}", feature, ranks.to_tsv())?;
        }
        Ok(())
    }

    /// Write the rankings (without identifiers) to a NumPy `.npy` file.
    #[cfg(feature = "npy")]
    pub fn write_npy(&self, path: impl AsRef<std::path::Path>) -> Result<(), RankDbError> {
        use ndarray_npy::write_npy;
        match &self.rankings {
            Rankings::Int16(m) => write_npy(path, m)?,
            Rankings::Int32(m) => write_npy(path, m)?,
        }
        Ok(())
    }
}
