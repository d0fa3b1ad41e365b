//! CSV corpus reader with full input validation.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::TextError;

/// A labelled document collection loaded from CSV.
///
/// Documents, labels, and optional split values are stored in parallel
/// vectors in file order: `documents[i]` carries the label `labels[i]`.
#[derive(Debug)]
pub struct Corpus {
    /// Raw document texts in file order.
    pub documents: Vec<String>,
    /// Raw label strings, aligned with `documents`.
    pub labels: Vec<String>,
    /// Values of the split column, when one was requested.
    pub split_values: Option<Vec<String>>,
}

impl Corpus {
    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// `true` when the corpus holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Reads a labelled text corpus from a CSV file.
///
/// Columns are located by header name, so the file may carry any number of
/// extra columns in any order. Rows that lack one of the requested cells
/// are rejected rather than skipped.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`TextError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`TextError::CsvParse`] | Malformed CSV record |
/// | [`TextError::MissingColumn`] | Requested column absent from the header |
/// | [`TextError::MissingValue`] | Row too short, or a requested cell is blank |
/// | [`TextError::EmptyCorpus`] | Zero data rows after header |
pub struct CorpusReader {
    path: PathBuf,
    text_column: String,
    label_column: String,
    split_column: Option<String>,
}

impl CorpusReader {
    /// Create a new reader for the given CSV file and column names.
    pub fn new(path: &Path, text_column: &str, label_column: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            text_column: text_column.to_string(),
            label_column: label_column.to_string(),
            split_column: None,
        }
    }

    /// Also collect the named column for value-based splitting.
    #[must_use]
    pub fn with_split_column(mut self, name: &str) -> Self {
        self.split_column = Some(name.to_string());
        self
    }

    /// Read and validate the CSV file, returning a [`Corpus`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Corpus, TextError> {
        let file = std::fs::File::open(&self.path).map_err(|e| TextError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) tolerates ragged rows so that our own per-cell
        // MissingValue check fires instead of a low-level CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| TextError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        })?;
        let text_idx = self.column_index(header, &self.text_column)?;
        let label_idx = self.column_index(header, &self.label_column)?;
        let split_idx = match &self.split_column {
            Some(name) => Some(self.column_index(header, name)?),
            None => None,
        };
        debug!(text_idx, label_idx, ?split_idx, "located corpus columns");

        let mut documents = Vec::new();
        let mut labels = Vec::new();
        let mut split_values = split_idx.map(|_| Vec::new());

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| TextError::CsvParse {
                path: self.path.clone(),
                offset: e.position().map_or(0, |p| p.byte()),
                source: e,
            })?;

            documents.push(self.cell(&record, row_index, text_idx, &self.text_column)?);
            labels.push(self.cell(&record, row_index, label_idx, &self.label_column)?);
            if let (Some(values), Some(idx)) = (&mut split_values, split_idx) {
                let name = self.split_column.as_deref().unwrap_or_default();
                values.push(self.cell(&record, row_index, idx, name)?);
            }
        }

        if documents.is_empty() {
            return Err(TextError::EmptyCorpus {
                path: self.path.clone(),
            });
        }

        info!(n_documents = documents.len(), "corpus loaded");
        Ok(Corpus {
            documents,
            labels,
            split_values,
        })
    }

    fn column_index(&self, header: &csv::StringRecord, name: &str) -> Result<usize, TextError> {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| TextError::MissingColumn {
                path: self.path.clone(),
                column: name.to_string(),
            })
    }

    fn cell(
        &self,
        record: &csv::StringRecord,
        row_index: usize,
        idx: usize,
        column: &str,
    ) -> Result<String, TextError> {
        let raw = record.get(idx).unwrap_or("").trim();
        if raw.is_empty() {
            return Err(TextError::MissingValue {
                path: self.path.clone(),
                row_index,
                column: column.to_string(),
            });
        }
        Ok(raw.to_string())
    }
}

/// Read just the text column from a CSV file.
///
/// For prediction inputs, which carry no label column. Validation matches
/// [`CorpusReader::read`]: blank cells and short rows are rejected, and a
/// file with zero data rows is an error.
///
/// # Errors
///
/// Same variants as [`CorpusReader::read`], minus the label column checks.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_documents(path: &Path, text_column: &str) -> Result<Vec<String>, TextError> {
    let file = std::fs::File::open(path).map_err(|e| TextError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let header = rdr.headers().map_err(|e| TextError::CsvParse {
        path: path.to_path_buf(),
        offset: e.position().map_or(0, |p| p.byte()),
        source: e,
    })?;
    let text_idx = header
        .iter()
        .position(|h| h == text_column)
        .ok_or_else(|| TextError::MissingColumn {
            path: path.to_path_buf(),
            column: text_column.to_string(),
        })?;

    let mut documents = Vec::new();
    for (row_index, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| TextError::CsvParse {
            path: path.to_path_buf(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        })?;
        let raw = record.get(text_idx).unwrap_or("").trim();
        if raw.is_empty() {
            return Err(TextError::MissingValue {
                path: path.to_path_buf(),
                row_index,
                column: text_column.to_string(),
            });
        }
        documents.push(raw.to_string());
    }

    if documents.is_empty() {
        return Err(TextError::EmptyCorpus {
            path: path.to_path_buf(),
        });
    }
    info!(n_documents = documents.len(), "documents loaded");
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn read_valid_corpus() {
        let csv = "id,text,outcome\n1,the child walked,yes\n2,no speech observed,no\n";
        let f = write_csv(csv);
        let corpus = CorpusReader::new(f.path(), "text", "outcome").read().unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.documents[0], "the child walked");
        assert_eq!(corpus.labels, vec!["yes", "no"]);
        assert!(corpus.split_values.is_none());
    }

    #[test]
    fn columns_found_by_name_not_position() {
        let csv = "outcome,extra,text\nyes,x,alpha beta\nno,y,gamma delta\n";
        let f = write_csv(csv);
        let corpus = CorpusReader::new(f.path(), "text", "outcome").read().unwrap();
        assert_eq!(corpus.documents, vec!["alpha beta", "gamma delta"]);
        assert_eq!(corpus.labels, vec!["yes", "no"]);
    }

    #[test]
    fn split_column_collected_when_requested() {
        let csv = "text,outcome,year\nalpha,yes,2006\nbeta,no,2008\n";
        let f = write_csv(csv);
        let corpus = CorpusReader::new(f.path(), "text", "outcome")
            .with_split_column("year")
            .read()
            .unwrap();
        assert_eq!(
            corpus.split_values,
            Some(vec!["2006".to_string(), "2008".to_string()])
        );
    }

    #[test]
    fn quoted_commas_stay_in_one_cell() {
        let csv = "text,outcome\n\"walks, runs, and jumps\",yes\n";
        let f = write_csv(csv);
        let corpus = CorpusReader::new(f.path(), "text", "outcome").read().unwrap();
        assert_eq!(corpus.documents[0], "walks, runs, and jumps");
    }

    #[test]
    fn error_file_not_found() {
        let result = CorpusReader::new(Path::new("/nonexistent/corpus.csv"), "text", "y").read();
        assert!(matches!(result, Err(TextError::FileNotFound { .. })));
    }

    #[test]
    fn error_missing_text_column() {
        let csv = "id,outcome\n1,yes\n";
        let f = write_csv(csv);
        let err = CorpusReader::new(f.path(), "text", "outcome").read().unwrap_err();
        match err {
            TextError::MissingColumn { column, .. } => assert_eq!(column, "text"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn error_missing_split_column() {
        let csv = "text,outcome\nalpha,yes\n";
        let f = write_csv(csv);
        let err = CorpusReader::new(f.path(), "text", "outcome")
            .with_split_column("year")
            .read()
            .unwrap_err();
        match err {
            TextError::MissingColumn { column, .. } => assert_eq!(column, "year"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn error_blank_cell() {
        let csv = "text,outcome\nalpha,yes\n,no\n";
        let f = write_csv(csv);
        let err = CorpusReader::new(f.path(), "text", "outcome").read().unwrap_err();
        assert!(matches!(
            err,
            TextError::MissingValue { row_index: 1, .. }
        ));
    }

    #[test]
    fn error_short_row() {
        let csv = "text,outcome\nalpha,yes\nbeta\n";
        let f = write_csv(csv);
        let err = CorpusReader::new(f.path(), "text", "outcome").read().unwrap_err();
        match err {
            TextError::MissingValue { row_index, column, .. } => {
                assert_eq!(row_index, 1);
                assert_eq!(column, "outcome");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn error_empty_corpus() {
        let csv = "text,outcome\n";
        let f = write_csv(csv);
        let err = CorpusReader::new(f.path(), "text", "outcome").read().unwrap_err();
        assert!(matches!(err, TextError::EmptyCorpus { .. }));
    }

    #[test]
    fn documents_read_without_labels() {
        let csv = "id,text\n1,alpha beta\n2,gamma\n";
        let f = write_csv(csv);
        let docs = read_documents(f.path(), "text").unwrap();
        assert_eq!(docs, vec!["alpha beta", "gamma"]);
    }

    #[test]
    fn documents_reject_blank_cells() {
        let csv = "text\nalpha\n \n";
        let f = write_csv(csv);
        let err = read_documents(f.path(), "text").unwrap_err();
        assert!(matches!(err, TextError::MissingValue { row_index: 1, .. }));
    }

    #[test]
    fn documents_require_the_column() {
        let csv = "body\nalpha\n";
        let f = write_csv(csv);
        let err = read_documents(f.path(), "text").unwrap_err();
        assert!(matches!(err, TextError::MissingColumn { .. }));
    }
}
