use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::IngestError;
use crate::models::{
    RawTable, UnitColumn, UnitId, ValidatedTable, COURSE_COLUMN, STUDENT_COLUMN, TEACHER_COLUMN,
};

fn unit_column_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^unit(\d+)_time$").expect("valid regex"))
}

/// Parses a `unit<N>_time` header into its unit id. `N` must be a positive integer.
pub fn parse_unit_header(header: &str) -> Option<UnitId> {
    let captures = unit_column_pattern().captures(header.trim())?;
    let number: u32 = captures.get(1)?.as_str().parse().ok()?;
    (number > 0).then_some(UnitId(number))
}

/// Reads delimited text into an untyped table. Short rows are allowed.
pub fn read_table<R: Read>(reader: R, delimiter: u8) -> Result<RawTable, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .headers()?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable { headers, rows })
}

pub fn read_path(path: &Path, delimiter: u8) -> Result<RawTable, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_table(file, delimiter)
}

/// Checks the mandatory identifying columns and discovers unit time columns,
/// ordered by unit number. Cells are not parsed here.
pub fn ingest(table: RawTable) -> Result<ValidatedTable, IngestError> {
    let located = [COURSE_COLUMN, TEACHER_COLUMN, STUDENT_COLUMN]
        .map(|name| (name, table.column_index(name)));
    let (course_index, teacher_index, student_index) = match located {
        [(_, Some(course)), (_, Some(teacher)), (_, Some(student))] => (course, teacher, student),
        _ => {
            let missing = located
                .iter()
                .filter(|(_, index)| index.is_none())
                .map(|(name, _)| name.to_string())
                .collect();
            return Err(IngestError::Schema { missing });
        }
    };

    let mut units: Vec<UnitColumn> = table
        .headers
        .iter()
        .enumerate()
        .filter_map(|(index, header)| {
            parse_unit_header(header).map(|unit| UnitColumn {
                unit,
                header: header.clone(),
                index,
            })
        })
        .collect();

    if units.is_empty() {
        return Err(IngestError::NoUnitColumns);
    }

    units.sort_by_key(|column| (column.unit, column.index));
    if let Some(pair) = units.windows(2).find(|pair| pair[0].unit == pair[1].unit) {
        return Err(IngestError::DuplicateUnit {
            unit: pair[0].unit.number(),
            first: pair[0].header.clone(),
            second: pair[1].header.clone(),
        });
    }

    debug!(
        units = ?units.iter().map(|column| column.header.as_str()).collect::<Vec<_>>(),
        "discovered unit columns"
    );
    info!(
        rows = table.rows.len(),
        units = units.len(),
        "validated course records"
    );

    Ok(ValidatedTable {
        course_index,
        teacher_index,
        student_index,
        table,
        units,
    })
}

pub fn load(path: &Path, delimiter: u8) -> Result<ValidatedTable, IngestError> {
    ingest(read_path(path, delimiter)?)
}
