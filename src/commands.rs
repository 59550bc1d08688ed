//! Implementations of the `rankdb` command line subcommands.
//!
//! Each command writes its output through an [`OutputFile`] (standard output
//! if no path is given) and returns a [`CommandOutput`] carrying any issues to
//! report to the user.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;

use crate::{
    database::RankingDatabase,
    error::RankDbError,
    io::OutputFile,
    reporting::{CommandOutput, Report},
    signature::GeneSignature,
};

/// Default gene nomenclature for databases and signatures.
pub const DEFAULT_NOMENCLATURE: &str = "HGNC";

/// Derive a database name from its file name, dropping the extension.
pub fn database_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Open the database at `path`, naming it after the file unless a name is given.
pub fn open_database(
    path: &PathBuf,
    name: Option<&str>,
    nomenclature: &str,
) -> Result<RankingDatabase, RankDbError> {
    let name = name.map_or_else(|| database_name_from_path(path), |n| n.to_string());
    RankingDatabase::open(path, &name, nomenclature)
}

fn output_writer(output: Option<&PathBuf>) -> Result<Box<dyn Write>, RankDbError> {
    let output_stream = output.map_or(OutputFile::new_stdout(None), |file| {
        OutputFile::new(file, None)
    });
    Ok(output_stream.writer()?)
}

/// Summarize a database: name, nomenclature, and matrix dimensions.
pub fn rankdb_info(
    db: &RankingDatabase,
    output: Option<&PathBuf>,
) -> Result<CommandOutput<()>, RankDbError> {
    let mut writer = output_writer(output)?;
    writeln!(writer, "name\t{}", db.name())?;
    writeln!(writer, "nomenclature\t{}", db.nomenclature())?;
    writeln!(writer, "features\t{}", db.features().len())?;
    writeln!(writer, "genes\t{}", db.total_genes())?;
    writeln!(writer, "rank_width\t{}", db.rank_width())?;
    writer.flush()?;
    Ok(CommandOutput::new((), Report::new()))
}

/// List the feature identifiers of a database, in matrix row order.
pub fn rankdb_features(
    db: &RankingDatabase,
    output: Option<&PathBuf>,
) -> Result<CommandOutput<()>, RankDbError> {
    let mut writer = output_writer(output)?;
    for feature in db.features() {
        writeln!(writer, "{}", feature)?;
    }
    writer.flush()?;
    Ok(CommandOutput::new((), Report::new()))
}

/// List the gene identifiers of a database, in storage order.
pub fn rankdb_genes(
    db: &RankingDatabase,
    output: Option<&PathBuf>,
) -> Result<CommandOutput<()>, RankDbError> {
    let mut writer = output_writer(output)?;
    for gene in db.genes()? {
        writeln!(writer, "{}", gene)?;
    }
    writer.flush()?;
    Ok(CommandOutput::new((), Report::new()))
}

/// Load a ranking matrix, either the whole database or just the genes of a
/// signature file, and write it as TSV.
///
/// Genes of the signature missing from the database are reported, not
/// treated as an error. If `npy` is set (requires the `npy` feature), the raw
/// rankings are also written to that `.npy` file.
pub fn rankdb_load(
    db: &RankingDatabase,
    signature: Option<&PathBuf>,
    output: Option<&PathBuf>,
    npy: Option<&PathBuf>,
) -> Result<CommandOutput<()>, RankDbError> {
    if let Some(path) = npy {
        check_npy_output(path)?;
    }
    let mut report = Report::new();

    let matrix = match signature {
        Some(path) => {
            let name = database_name_from_path(path);
            let signature = GeneSignature::from_file(path, &name, db.nomenclature())?;
            let matrix = db.load(&signature)?;
            let missing = signature.len().saturating_sub(matrix.ngenes());
            if missing > 0 {
                report.add_issue(format!(
                    "{} of {} genes in signature '{}' are not in database '{}'",
                    missing,
                    signature.len(),
                    signature.name(),
                    db.name()
                ));
            }
            matrix
        }
        None => db.load_full()?,
    };
    info!(
        "writing {} x {} ranking matrix",
        matrix.nfeatures(),
        matrix.ngenes()
    );

    let mut writer = output_writer(output)?;
    matrix.to_tsv(&mut writer)?;
    writer.flush()?;

    if let Some(path) = npy {
        write_npy(&matrix, path)?;
    }
    Ok(CommandOutput::new((), report))
}

#[cfg(feature = "npy")]
fn check_npy_output(_path: &Path) -> Result<(), RankDbError> {
    Ok(())
}

#[cfg(not(feature = "npy"))]
fn check_npy_output(_path: &Path) -> Result<(), RankDbError> {
    Err(RankDbError::InvalidArgument(
        "writing .npy files requires rankdb to be built with the 'npy' feature".to_string(),
    ))
}

#[cfg(feature = "npy")]
fn write_npy(matrix: &crate::rankings::RankingMatrix, path: &Path) -> Result<(), RankDbError> {
    matrix.write_npy(path)
}

#[cfg(not(feature = "npy"))]
fn write_npy(_matrix: &crate::rankings::RankingMatrix, path: &Path) -> Result<(), RankDbError> {
    check_npy_output(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utilities::example_database;

    #[test]
    fn test_database_name_from_path() {
        assert_eq!(
            database_name_from_path(Path::new("/data/hg38__refseq.genes_vs_motifs.rankings.feather")),
            "hg38__refseq.genes_vs_motifs.rankings"
        );
        assert_eq!(database_name_from_path(Path::new("mm10.db")), "mm10");
    }

    #[test]
    fn test_load_reports_missing_genes() {
        let file = example_database();
        let db = open_database(&file.path().to_path_buf(), Some("example"), "HGNC").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let signature = dir.path().join("sig.txt");
        std::fs::write(&signature, "g4\ngX\ng2\n").unwrap();
        let output = dir.path().join("out.tsv");

        let result = rankdb_load(&db, Some(&signature), Some(&output), None).unwrap();
        assert_eq!(result.report().issues().len(), 1);
        assert!(result.report().issues()[0].starts_with("1 of 3 genes"));

        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text, "feature\tg2\tg4\nf1\t1\t3\nf2\t3\t2\nf3\t0\t1\n");
    }

    #[cfg(not(feature = "npy"))]
    #[test]
    fn test_load_npy_rejected_before_output() {
        let file = example_database();
        let db = open_database(&file.path().to_path_buf(), Some("example"), "HGNC").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.tsv");
        let npy = dir.path().join("out.npy");

        let err = rankdb_load(&db, None, Some(&output), Some(&npy)).unwrap_err();
        assert!(matches!(err, RankDbError::InvalidArgument(_)));
        assert!(!output.exists());
        assert!(!npy.exists());
    }

    #[test]
    fn test_info() {
        let file = example_database();
        let db = open_database(&file.path().to_path_buf(), Some("example"), "MGI").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("info.tsv");
        let result = rankdb_info(&db, Some(&output)).unwrap();
        assert!(result.report().is_empty());
        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            text,
            "name\texample\nnomenclature\tMGI\nfeatures\t3\ngenes\t4\nrank_width\tint16\n"
        );
    }
}
