//! FAQ corpus loader: CSV with `question` and `answer` columns.

use std::{fs::File, io::Read, path::Path};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::errors::RagError;
use crate::normalize::{normalize_block, normalize_inline};
use crate::record::FaqRecord;

/// Raw CSV row. Extra columns are ignored; column order is free.
#[derive(Debug, Deserialize)]
struct CsvRow {
    question: String,
    answer: String,
}

/// Reads the FAQ corpus from a CSV file.
///
/// # Errors
/// - [`RagError::Io`] if the file cannot be opened
/// - [`RagError::Csv`] if the header lacks `question`/`answer` or a row is malformed
pub fn load_corpus(path: impl AsRef<Path>) -> Result<Vec<FaqRecord>, RagError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "corpus::load_corpus");
    let file = File::open(path)?;
    let records = read_corpus(file)?;
    info!(path = %path.display(), records = records.len(), "FAQ corpus loaded");
    Ok(records)
}

/// Reads the FAQ corpus from any reader (header row required).
///
/// Rows with an empty question or answer after normalization are skipped.
pub fn read_corpus<R: Read>(reader: R) -> Result<Vec<FaqRecord>, RagError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let mut out = Vec::new();
    for (i, row) in rdr.deserialize::<CsvRow>().enumerate() {
        // Header is line 1.
        let line = i + 2;
        let row = row?;
        let question = normalize_inline(&row.question);
        let answer = normalize_block(&row.answer);
        if question.is_empty() || answer.is_empty() {
            warn!(line, "skipping FAQ row with empty question or answer");
            continue;
        }
        out.push(FaqRecord::new(question, answer));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_rows_in_order_and_ignores_extra_columns() {
        let csv = "id,answer,question\n1,March 31.,What is the deadline?\n2,\"Có, qua cổng\nđiện tử.\",Nộp online được không?\n";
        let recs = read_corpus(csv.as_bytes()).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].question(), "What is the deadline?");
        assert_eq!(recs[0].answer(), "March 31.");
        assert_eq!(recs[1].answer(), "Có, qua cổng\nđiện tử.");
    }

    #[test]
    fn skips_blank_fields_after_trimming() {
        let csv = "question,answer\n  ,orphan answer\nQ2,   \n  Q3  ,  A3  \n";
        let recs = read_corpus(csv.as_bytes()).unwrap();
        assert_eq!(recs, vec![FaqRecord::new("Q3", "A3")]);
    }

    #[test]
    fn header_only_yields_empty_corpus() {
        let recs = read_corpus("question,answer\n".as_bytes()).unwrap();
        assert!(recs.is_empty());
    }

    #[test]
    fn missing_column_is_a_csv_error() {
        let err = read_corpus("question,reply\nQ,A\n".as_bytes()).unwrap_err();
        assert!(matches!(err, RagError::Csv(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_corpus(dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, RagError::Io(_)));
    }

    #[test]
    fn loads_from_disk() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "question,answer").unwrap();
        writeln!(f, "Học phí bao nhiêu?,Khoảng 15 triệu/năm.").unwrap();
        let recs = load_corpus(f.path()).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].question(), "Học phí bao nhiêu?");
    }
}
