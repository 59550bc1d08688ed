//! Decoding ranking blobs into matrix columns.

use ndarray::{Array2, ShapeBuilder};

use crate::error::RankDbError;
use crate::traits::RankValue;

/// Accumulates decoded ranking blobs, one gene (matrix column) at a time.
///
/// Columns are appended in the order rows are pushed, so column `g` of the
/// finished matrix is always the blob pushed at position `g`. Values are kept
/// column-major in a single buffer, which [`ColumnDecoder::finish`] turns into
/// an [`Array2`] without copying.
#[derive(Debug)]
pub struct ColumnDecoder<T: RankValue> {
    nfeatures: usize,
    genes: Vec<String>,
    values: Vec<T>,
}

impl<T: RankValue> ColumnDecoder<T> {
    /// Create a decoder for `nfeatures` ranks per blob, reserving room for
    /// `ngenes` columns up front.
    pub fn with_capacity(nfeatures: usize, ngenes: usize) -> Self {
        Self {
            nfeatures,
            genes: Vec::with_capacity(ngenes),
            values: Vec::with_capacity(nfeatures.saturating_mul(ngenes)),
        }
    }

    /// Number of columns decoded so far.
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Decode `blob` and append it as the next column, labelled `gene`.
    ///
    /// Fails if the blob length is not a multiple of the rank width, or if it
    /// holds a number of ranks other than the number of features. Nothing is
    /// appended on failure.
    pub fn push(&mut self, gene: &str, blob: &[u8]) -> Result<(), RankDbError> {
        let width = T::WIDTH.bytes();
        if blob.len() % width != 0 {
            return Err(RankDbError::BlobLength {
                gene: gene.to_string(),
                len: blob.len(),
                width,
            });
        }
        let found = blob.len() / width;
        if found != self.nfeatures {
            return Err(RankDbError::RowLength {
                gene: gene.to_string(),
                expected: self.nfeatures,
                found,
            });
        }

        let mut buf = blob;
        self.values.extend((0..found).map(|_| T::read_le(&mut buf)));
        self.genes.push(gene.to_string());
        Ok(())
    }

    /// Finish decoding, returning the gene identifiers and the
    /// (features × genes) matrix.
    pub fn finish(self) -> Result<(Vec<String>, Array2<T>), RankDbError> {
        let shape = (self.nfeatures, self.genes.len()).f();
        let matrix = Array2::from_shape_vec(shape, self.values)?;
        Ok((self.genes, matrix))
    }
}

/// Decode one blob into a vector of ranks, checking it against `nfeatures`.
pub fn decode_blob<T: RankValue>(
    gene: &str,
    blob: &[u8],
    nfeatures: usize,
) -> Result<Vec<T>, RankDbError> {
    let mut decoder = ColumnDecoder::<T>::with_capacity(nfeatures, 1);
    decoder.push(gene, blob)?;
    Ok(decoder.values)
}

/// Encode ranks in the on-disk blob format.
pub fn encode_blob<T: RankValue>(ranks: &[T]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(ranks.len() * T::WIDTH.bytes());
    for &rank in ranks {
        rank.write_le(&mut buf);
    }
    buf
}
