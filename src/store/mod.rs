//! The read-only queries a ranking database loader needs from its backing store.
//!
//! [`RankingStore`] is the seam between the decoding logic in
//! [`RankingDatabase`] and the file format the rankings live in. The only
//! implementation shipped is [`SqliteRankingStore`].
//!
//! [`RankingDatabase`]: crate::database::RankingDatabase

use crate::error::RankDbError;

pub mod sqlite;

pub use sqlite::SqliteRankingStore;

/// Visitor called once per ranking row with the gene identifier and its raw
/// blob. The blob is only borrowed for the duration of the call.
pub type RowVisitor<'a> = dyn FnMut(&str, &[u8]) -> Result<(), RankDbError> + 'a;

/// A read-only store of whole-genome rankings.
///
/// Implementations must not hold a session open between calls: every method
/// acquires whatever it needs and releases it before returning, on success and
/// on error alike.
pub trait RankingStore {
    /// Total number of genes with a stored ranking.
    fn count_rankings(&self) -> Result<usize, RankDbError>;

    /// Feature identifiers, ordered by the store's feature index.
    fn scan_features(&self) -> Result<Vec<String>, RankDbError>;

    /// Gene identifiers, ordered by the store's gene index.
    fn scan_genes(&self) -> Result<Vec<String>, RankDbError>;

    /// Visit every ranking row, ordered by the store's gene index. Returns
    /// the number of rows visited.
    fn scan_rankings(&self, visit: &mut RowVisitor<'_>) -> Result<usize, RankDbError>;

    /// Visit the ranking rows of the genes in `genes` that exist in the store,
    /// ordered by gene identifier (ascending). Identifiers not in the store
    /// are skipped. Returns the number of rows visited.
    fn query_rankings(&self, genes: &[&str], visit: &mut RowVisitor<'_>)
        -> Result<usize, RankDbError>;
}
