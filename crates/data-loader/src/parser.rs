//! Parser for the TMDB movies/credits CSV files.
//!
//! Two layers live here:
//! - CSV records: quoted fields may contain commas, doubled quotes and
//!   newlines. A broken record is a hard error for the whole file.
//! - Nested fields: `genres`, `keywords`, `cast` and `crew` cells hold JSON
//!   lists of objects. These are parsed defensively; a malformed cell yields
//!   an empty [`FieldParse`] carrying the reason, never an error.

use crate::error::{DataLoadError, Result};
use crate::types::{MovieId, RawCredits, RawMovie};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Number of billed actors kept from the cast list
pub const CAST_LIMIT: usize = 3;

/// Number of directors kept from the crew list
pub const DIRECTOR_LIMIT: usize = 2;

// =============================================================================
// CSV records
// =============================================================================

/// A single CSV record with the physical line it started on
#[derive(Debug, Clone, PartialEq)]
struct CsvRecord {
    line: usize,
    fields: Vec<String>,
}

/// A parsed CSV file: header plus data records
#[derive(Debug)]
struct CsvTable {
    file: String,
    columns: HashMap<String, usize>,
    records: Vec<CsvRecord>,
}

impl CsvTable {
    fn parse(content: &str, file: &str) -> Result<Self> {
        let mut records = split_records(content, file)?.into_iter();

        let header = records.next().ok_or_else(|| DataLoadError::ParseError {
            file: file.to_string(),
            line: 1,
            reason: "Missing header row".to_string(),
        })?;

        let columns: HashMap<String, usize> = header
            .fields
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim().to_string(), idx))
            .collect();

        let expected = header.fields.len();
        let records: Vec<CsvRecord> = records.collect();
        for record in &records {
            if record.fields.len() != expected {
                return Err(DataLoadError::FieldCountMismatch {
                    expected,
                    found: record.fields.len(),
                    line: record.line,
                });
            }
        }

        Ok(Self {
            file: file.to_string(),
            columns,
            records,
        })
    }

    fn column(&self, name: &str) -> Result<usize> {
        self.optional_column(name)
            .ok_or_else(|| DataLoadError::MissingColumn {
                file: self.file.clone(),
                column: name.to_string(),
            })
    }

    fn optional_column(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }
}

/// Read a whole file as text, replacing invalid UTF-8
fn read_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(DataLoadError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let mut file = File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Split CSV text into records.
///
/// Handles quoted fields (`"a, b"`), escaped quotes (`""`) and line breaks
/// inside quotes. Blank lines are skipped.
fn split_records(content: &str, file: &str) -> Result<Vec<CsvRecord>> {
    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;

    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            ',' => fields.push(std::mem::take(&mut field)),
            '"' if field.is_empty() => in_quotes = true,
            '\r' => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                push_record(&mut records, std::mem::take(&mut fields), record_line);
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(DataLoadError::ParseError {
            file: file.to_string(),
            line: record_line,
            reason: "Unterminated quoted field".to_string(),
        });
    }

    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        push_record(&mut records, fields, record_line);
    }

    Ok(records)
}

fn push_record(records: &mut Vec<CsvRecord>, fields: Vec<String>, line: usize) {
    // A blank line shows up as one empty field
    if fields.len() == 1 && fields[0].is_empty() {
        return;
    }
    records.push(CsvRecord { line, fields });
}

/// Text cell; empty cells are missing values
fn text_cell(record: &CsvRecord, idx: usize) -> Option<String> {
    let value = &record.fields[idx];
    if value.is_empty() {
        None
    } else {
        Some(value.clone())
    }
}

/// Numeric cell; empty cells read as the type's default
fn number_cell<T>(table: &CsvTable, record: &CsvRecord, idx: usize, column: &str) -> Result<T>
where
    T: FromStr + Default,
    T::Err: std::fmt::Display,
{
    let value = record.fields[idx].trim();
    if value.is_empty() {
        return Ok(T::default());
    }
    value.parse().map_err(|e| DataLoadError::ParseError {
        file: table.file.clone(),
        line: record.line,
        reason: format!("Invalid {}: {}", column, e),
    })
}

/// Optional id cell; accepts "19995" as well as "19995.0"
fn id_cell(
    table: &CsvTable,
    record: &CsvRecord,
    idx: Option<usize>,
) -> Result<Option<MovieId>> {
    let Some(idx) = idx else {
        return Ok(None);
    };
    let value = record.fields[idx].trim();
    if value.is_empty() {
        return Ok(None);
    }
    let parsed: f64 = value.parse().map_err(|e| DataLoadError::ParseError {
        file: table.file.clone(),
        line: record.line,
        reason: format!("Invalid movie id: {}", e),
    })?;
    if parsed < 0.0 || parsed > MovieId::MAX as f64 {
        return Err(DataLoadError::ParseError {
            file: table.file.clone(),
            line: record.line,
            reason: format!("Movie id out of range: {}", value),
        });
    }
    Ok(Some(parsed as MovieId))
}

/// Parse the movies CSV file (TMDB `tmdb_5000_movies.csv` layout)
pub fn parse_movies(path: &Path) -> Result<Vec<RawMovie>> {
    let content = read_file(path)?;
    let file = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "movies.csv".to_string());
    parse_movies_str(&content, &file)
}

/// Parse movies CSV text already in memory
pub fn parse_movies_str(content: &str, file: &str) -> Result<Vec<RawMovie>> {
    let table = CsvTable::parse(content, file)?;

    let id_col = table
        .optional_column("movie_id")
        .or_else(|| table.optional_column("id"));
    let title_col = table.column("title")?;
    let overview_col = table.column("overview")?;
    let genres_col = table.column("genres")?;
    let keywords_col = table.column("keywords")?;
    let vote_average_col = table.column("vote_average")?;
    let vote_count_col = table.column("vote_count")?;
    let popularity_col = table.column("popularity")?;
    let release_date_col = table.column("release_date")?;

    let mut movies = Vec::with_capacity(table.records.len());
    for record in &table.records {
        let vote_count: f64 = number_cell(&table, record, vote_count_col, "vote_count")?;
        movies.push(RawMovie {
            movie_id: id_cell(&table, record, id_col)?,
            title: record.fields[title_col].clone(),
            overview: text_cell(record, overview_col),
            genres: text_cell(record, genres_col),
            keywords: text_cell(record, keywords_col),
            vote_average: number_cell(&table, record, vote_average_col, "vote_average")?,
            vote_count: vote_count.max(0.0) as u32,
            popularity: number_cell(&table, record, popularity_col, "popularity")?,
            release_date: text_cell(record, release_date_col),
        });
    }
    Ok(movies)
}

/// Parse the credits CSV file (TMDB `tmdb_5000_credits.csv` layout)
pub fn parse_credits(path: &Path) -> Result<Vec<RawCredits>> {
    let content = read_file(path)?;
    let file = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "credits.csv".to_string());
    parse_credits_str(&content, &file)
}

/// Parse credits CSV text already in memory
pub fn parse_credits_str(content: &str, file: &str) -> Result<Vec<RawCredits>> {
    let table = CsvTable::parse(content, file)?;

    let id_col = table.optional_column("movie_id");
    let title_col = table.column("title")?;
    let cast_col = table.column("cast")?;
    let crew_col = table.column("crew")?;

    let mut credits = Vec::with_capacity(table.records.len());
    for record in &table.records {
        credits.push(RawCredits {
            movie_id: id_cell(&table, record, id_col)?,
            title: record.fields[title_col].clone(),
            cast: text_cell(record, cast_col),
            crew: text_cell(record, crew_col),
        });
    }
    Ok(credits)
}

// =============================================================================
// Nested fields
// =============================================================================

/// Outcome of parsing one nested field.
///
/// On failure `tokens` is empty and `error` says why. Callers keep the row
/// either way; the error is only for logging and bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldParse {
    pub tokens: Vec<String>,
    pub error: Option<String>,
}

impl FieldParse {
    fn ok(tokens: Vec<String>) -> Self {
        Self {
            tokens,
            error: None,
        }
    }

    fn failed(reason: impl Into<String>) -> Self {
        Self {
            tokens: Vec::new(),
            error: Some(reason.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Decode a cell into a JSON array
fn entity_list(text: Option<&str>) -> std::result::Result<Vec<Value>, String> {
    let text = text.ok_or_else(|| "missing value".to_string())?;
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(other) => Err(format!("expected a list, found {}", json_kind(&other))),
        Err(e) => Err(format!("invalid JSON: {}", e)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Non-empty `name` of an entity, or an error if the entry isn't an object
fn entity_name(entry: &Value, position: usize) -> std::result::Result<Option<String>, String> {
    let object = entry
        .as_object()
        .ok_or_else(|| format!("entry {} is not an object", position))?;
    Ok(object
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_string))
}

/// Names of every well-formed entry (genres, keywords)
///
/// Example: `[{"id": 28, "name": "Action"}]` -> `["Action"]`
pub fn parse_named_entities(text: Option<&str>) -> FieldParse {
    let items = match entity_list(text) {
        Ok(items) => items,
        Err(reason) => return FieldParse::failed(reason),
    };

    let mut names = Vec::new();
    for (position, entry) in items.iter().enumerate() {
        match entity_name(entry, position) {
            Ok(Some(name)) => names.push(name),
            Ok(None) => {}
            Err(reason) => return FieldParse::failed(reason),
        }
    }
    FieldParse::ok(names)
}

/// Names of the first [`CAST_LIMIT`] cast entries
pub fn parse_cast(text: Option<&str>) -> FieldParse {
    let items = match entity_list(text) {
        Ok(items) => items,
        Err(reason) => return FieldParse::failed(reason),
    };

    let mut names = Vec::new();
    for (position, entry) in items.iter().take(CAST_LIMIT).enumerate() {
        match entity_name(entry, position) {
            Ok(Some(name)) => names.push(name),
            Ok(None) => {}
            Err(reason) => return FieldParse::failed(reason),
        }
    }
    FieldParse::ok(names)
}

/// Names of crew members whose job is "Director", at most [`DIRECTOR_LIMIT`]
pub fn parse_directors(text: Option<&str>) -> FieldParse {
    let items = match entity_list(text) {
        Ok(items) => items,
        Err(reason) => return FieldParse::failed(reason),
    };

    let mut directors = Vec::new();
    for (position, entry) in items.iter().enumerate() {
        let Some(object) = entry.as_object() else {
            return FieldParse::failed(format!("entry {} is not an object", position));
        };
        if object.get("job").and_then(Value::as_str) != Some("Director") {
            continue;
        }
        if let Some(name) = object.get("name").and_then(Value::as_str) {
            directors.push(name.to_string());
        }
    }
    directors.truncate(DIRECTOR_LIMIT);
    FieldParse::ok(directors)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOVIES_CSV: &str = "\
budget,genres,id,keywords,overview,popularity,release_date,title,vote_average,vote_count
237000000,\"[{\"\"id\"\": 28, \"\"name\"\": \"\"Action\"\"}, {\"\"id\"\": 12, \"\"name\"\": \"\"Adventure\"\"}]\",19995,\"[{\"\"id\"\": 1463, \"\"name\"\": \"\"culture clash\"\"}]\",\"In the 22nd century, a paraplegic Marine
is dispatched to the moon Pandora.\",150.437577,2009-12-10,Avatar,7.2,11800
0,[],42,[],,1.5,,Untitled,,
";

    #[test]
    fn test_parse_movies_quoted_fields() {
        let movies = parse_movies_str(MOVIES_CSV, "movies.csv").unwrap();
        assert_eq!(movies.len(), 2);

        let avatar = &movies[0];
        assert_eq!(avatar.movie_id, Some(19995));
        assert_eq!(avatar.title, "Avatar");
        assert!(avatar.overview.as_deref().unwrap().contains("Marine\nis dispatched"));
        assert!(avatar.genres.as_deref().unwrap().starts_with("[{\"id\": 28"));
        assert_eq!(avatar.vote_count, 11800);
        assert_eq!(avatar.release_date.as_deref(), Some("2009-12-10"));

        // Empty cells are missing values, empty numbers default to zero
        let untitled = &movies[1];
        assert_eq!(untitled.overview, None);
        assert_eq!(untitled.genres.as_deref(), Some("[]"));
        assert_eq!(untitled.vote_average, 0.0);
        assert_eq!(untitled.vote_count, 0);
    }

    #[test]
    fn test_parse_movies_missing_column() {
        let err = parse_movies_str("title,overview\nA,x\n", "movies.csv").unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumn { ref column, .. } if column == "genres"));
    }

    #[test]
    fn test_field_count_mismatch() {
        let csv = "movie_id,title,cast,crew\n1,A,[],[]\n2,B,[]\n";
        let err = parse_credits_str(csv, "credits.csv").unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::FieldCountMismatch { expected: 4, found: 3, line: 3 }
        ));
    }

    #[test]
    fn test_unterminated_quote() {
        let csv = "movie_id,title,cast,crew\n1,\"A,[],[]\n";
        let err = parse_credits_str(csv, "credits.csv").unwrap_err();
        assert!(matches!(err, DataLoadError::ParseError { line: 2, .. }));
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let csv = "id,title,overview,genres,keywords,vote_average,vote_count,popularity,release_date\n\
                   1,A,x,[],[],high,1,1.0,\n";
        let err = parse_movies_str(csv, "movies.csv").unwrap_err();
        assert!(matches!(err, DataLoadError::ParseError { line: 2, .. }));
    }

    #[test]
    fn test_parse_named_entities() {
        let parsed = parse_named_entities(Some(
            r#"[{"id": 28, "name": "Action"}, {"id": 1}, {"id": 2, "name": ""}, {"id": 878, "name": "Science Fiction"}]"#,
        ));
        assert!(parsed.is_ok());
        assert_eq!(parsed.tokens, vec!["Action", "Science Fiction"]);
    }

    #[test]
    fn test_malformed_nested_field_degrades_to_empty() {
        for text in [None, Some("not json"), Some("{\"name\": \"x\"}"), Some("[1, 2]")] {
            let parsed = parse_named_entities(text);
            assert!(parsed.tokens.is_empty());
            assert!(parsed.error.is_some(), "expected a failure for {:?}", text);
        }
    }

    #[test]
    fn test_parse_cast_keeps_top_three() {
        let parsed = parse_cast(Some(
            r#"[{"name": "Sam Worthington"}, {"name": "Zoe Saldana"}, {"name": "Sigourney Weaver"}, {"name": "Stephen Lang"}, 7]"#,
        ));
        // Entries past the first three are never inspected
        assert!(parsed.is_ok());
        assert_eq!(
            parsed.tokens,
            vec!["Sam Worthington", "Zoe Saldana", "Sigourney Weaver"]
        );
    }

    #[test]
    fn test_parse_directors_caps_at_two() {
        let parsed = parse_directors(Some(
            r#"[{"job": "Producer", "name": "Jon Landau"},
                {"job": "Director", "name": "Lana Wachowski"},
                {"job": "Director", "name": "Lilly Wachowski"},
                {"job": "Director", "name": "Someone Else"}]"#,
        ));
        assert_eq!(parsed.tokens, vec!["Lana Wachowski", "Lilly Wachowski"]);
    }
}
