//! Route list ingest.
//!
//! The route list is a CSV with the columns
//! `origin,destination,advance1,advance2,stay_days`.
//!
//! - **Strict schema**: missing columns are a configuration error (exit code 2)
//! - **Row-level validation**: bad rows are skipped and reported, never fatal

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{Route, is_iata_code};
use crate::error::AppError;

const REQUIRED_COLUMNS: [&str; 5] = ["origin", "destination", "advance1", "advance2", "stay_days"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct RouteList {
    pub routes: Vec<Route>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

pub fn load_routes(path: &Path) -> Result<RouteList, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::config(format!("Failed to open route list '{}': {e}", path.display()))
    })?;
    read_routes(file)
}

pub fn read_routes<R: Read>(source: R) -> Result<RouteList, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::config(format!("Failed to read route list headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for name in REQUIRED_COLUMNS {
        if !header_map.contains_key(name) {
            return Err(AppError::config(format!(
                "Route list is missing required column: `{name}`"
            )));
        }
    }

    let mut routes = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Data starts on line 2, after the header.
        let line = idx + 2;
        rows_read += 1;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_row(&record, &header_map));

        match parsed {
            Ok(route) => routes.push(route),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    Ok(RouteList {
        routes,
        row_errors,
        rows_read,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<Route, String> {
    let origin = parse_code(get_required(record, header_map, "origin")?, "origin")?;
    let destination = parse_code(get_required(record, header_map, "destination")?, "destination")?;
    let advance1 = parse_days(get_required(record, header_map, "advance1")?, "advance1")?;
    let advance2 = parse_days(get_required(record, header_map, "advance2")?, "advance2")?;
    let stay_days = parse_days(get_required(record, header_map, "stay_days")?, "stay_days")?;

    if stay_days == 0 {
        return Err("`stay_days` must be at least 1 (return must follow departure)".to_string());
    }

    Ok(Route {
        origin,
        destination,
        advance1,
        advance2,
        stay_days,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn parse_code(raw: &str, column: &str) -> Result<String, String> {
    let code = raw.to_ascii_uppercase();
    if is_iata_code(&code) {
        Ok(code)
    } else {
        Err(format!("`{column}` '{raw}' is not a 3-letter airport code"))
    }
}

fn parse_days(raw: &str, column: &str) -> Result<u32, String> {
    raw.parse::<u32>()
        .map_err(|_| format!("`{column}` '{raw}' is not a whole number of days"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_valid_routes() {
        let csv = "origin,destination,advance1,advance2,stay_days\nMAD,LIS,30,60,7\nbcn, ams ,14,28,3\n";
        let list = read_routes(csv.as_bytes()).unwrap();
        assert_eq!(list.rows_read, 2);
        assert!(list.row_errors.is_empty());
        assert_eq!(list.routes[1].origin, "BCN");
        assert_eq!(list.routes[1].destination, "AMS");
        assert_eq!(list.routes[0].advance_windows(), [30, 60]);
        assert_eq!(list.routes[0].stay_days, 7);
    }

    #[test]
    fn bad_rows_are_skipped_with_line_numbers() {
        let csv = "origin,destination,advance1,advance2,stay_days\n\
                   MAD,LIS,30,60,7\n\
                   MADRID,LIS,30,60,7\n\
                   MAD,LIS,-1,60,7\n\
                   MAD,LIS,30,60,0\n\
                   MAD,,30,60,7\n";
        let list = read_routes(csv.as_bytes()).unwrap();
        assert_eq!(list.routes.len(), 1);
        assert_eq!(list.rows_read, 5);
        let lines: Vec<usize> = list.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4, 5, 6]);
        assert!(list.row_errors[3].message.contains("destination"));
    }

    #[test]
    fn header_bom_and_case_are_tolerated() {
        let csv = "\u{feff}Origin,DESTINATION,advance1,advance2,Stay_Days\nAAA,BBB,30,60,7\n";
        let list = read_routes(csv.as_bytes()).unwrap();
        assert_eq!(list.routes.len(), 1);
    }

    #[test]
    fn missing_column_is_a_config_error() {
        let err = read_routes("origin,destination,advance1\nAAA,BBB,30\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_CONFIG);
        assert!(err.to_string().contains("advance2"));
    }
}
