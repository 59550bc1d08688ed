pub mod commands;
pub mod database;
pub mod error;
pub mod io;
pub mod rankings;
pub mod reporting;
pub mod signature;
pub mod store;
pub mod test_utilities;
pub mod traits;

pub mod prelude {
    pub use crate::database::RankingDatabase;
    pub use crate::error::RankDbError;
    pub use crate::rankings::{RankWidth, RankingMatrix, Rankings};
    pub use crate::signature::GeneSignature;
    pub use crate::store::{RankingStore, SqliteRankingStore};
}
