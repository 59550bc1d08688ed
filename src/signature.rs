//! Gene signatures: named, optionally weighted sets of gene identifiers.
//!
//! A [`GeneSignature`] is what a ranking database is queried with. Only its
//! identifiers matter for loading rankings; the weights are carried along for
//! downstream use.

use std::path::PathBuf;

use csv::ReaderBuilder;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::RankDbError;
use crate::io::InputFile;

/// The weight given to genes when none is specified.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// A named set of gene identifiers with a weight per gene.
///
/// Genes keep the order they were first added in. Adding a gene twice keeps
/// its first position and its last weight.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneSignature {
    name: String,
    nomenclature: String,
    genes: IndexMap<String, f64>,
}

/// One line of a gene signature file.
#[derive(Debug, Deserialize)]
struct SignatureRecord {
    gene: String,
    #[serde(default)]
    weight: Option<f64>,
}

impl GeneSignature {
    /// Create a signature from gene identifiers, each with weight
    /// [`DEFAULT_WEIGHT`].
    pub fn new<I, G>(name: &str, nomenclature: &str, genes: I) -> Result<Self, RankDbError>
    where
        I: IntoIterator<Item = G>,
        G: Into<String>,
    {
        Self::with_weights(
            name,
            nomenclature,
            genes.into_iter().map(|g| (g, DEFAULT_WEIGHT)),
        )
    }

    /// Create a signature from `(gene, weight)` pairs.
    pub fn with_weights<I, G>(name: &str, nomenclature: &str, genes: I) -> Result<Self, RankDbError>
    where
        I: IntoIterator<Item = (G, f64)>,
        G: Into<String>,
    {
        if name.is_empty() {
            return Err(RankDbError::InvalidArgument(
                "signature name must be specified".to_string(),
            ));
        }
        if nomenclature.is_empty() {
            return Err(RankDbError::InvalidArgument(
                "signature nomenclature must be specified".to_string(),
            ));
        }
        let genes = genes
            .into_iter()
            .map(|(gene, weight)| (gene.into(), weight))
            .collect();
        Ok(Self {
            name: name.to_string(),
            nomenclature: nomenclature.to_string(),
            genes,
        })
    }

    /// Read a signature from a tab-delimited file (plaintext or gzip-compressed)
    /// with one gene per line and an optional weight column. Lines starting
    /// with `#` are skipped.
    pub fn from_file(
        filepath: impl Into<PathBuf>,
        name: &str,
        nomenclature: &str,
    ) -> Result<Self, RankDbError> {
        let input_file = InputFile::new(filepath);
        let reader = input_file.reader()?;
        let mut rdr = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .comment(Some(b'#'))
            .flexible(true)
            .from_reader(reader);

        let mut genes = Vec::new();
        for result in rdr.deserialize() {
            let record: SignatureRecord = result?;
            let gene = record.gene.trim();
            if gene.is_empty() {
                continue;
            }
            genes.push((gene.to_string(), record.weight.unwrap_or(DEFAULT_WEIGHT)));
        }
        Self::with_weights(name, nomenclature, genes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nomenclature(&self) -> &str {
        &self.nomenclature
    }

    /// The gene identifiers, in insertion order.
    pub fn genes(&self) -> impl Iterator<Item = &str> + '_ {
        self.genes.keys().map(|g| g.as_str())
    }

    /// The `(gene, weight)` pairs, in insertion order.
    pub fn weights(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.genes.iter().map(|(g, &w)| (g.as_str(), w))
    }

    pub fn weight(&self, gene: &str) -> Option<f64> {
        self.genes.get(gene).copied()
    }

    pub fn contains(&self, gene: &str) -> bool {
        self.genes.contains_key(gene)
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}
