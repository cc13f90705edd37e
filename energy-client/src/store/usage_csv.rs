use std::{fs::File, io, path::Path};

use csv::StringRecord;

use crate::{
    domain::{
        usage_record::{parse_timestamp, STORE_COLUMNS},
        UsageRecord, UserName,
    },
    error::ReadError,
};

/// Every well-formed row in the store, in file order.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub records: Vec<UsageRecord>,
    /// Rows skipped for a wrong column count or a missing/unparseable field.
    pub dropped_rows: usize,
}

impl StoreSnapshot {
    /// Rows logged by `user`, keeping file order.
    pub fn for_user(self, user: &UserName) -> Vec<UsageRecord> {
        self.records
            .into_iter()
            .filter(|r| user.matches(&r.user))
            .collect()
    }

    /// Distinct trimmed user names, in order of first appearance.
    pub fn users(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for r in &self.records {
            let name = r.user.trim();
            if !out.contains(&name) {
                out.push(name);
            }
        }
        out
    }
}

/// Load the rows logged by `user`.
///
/// A missing store is reported as `ReadError::StoreNotFound`; an existing
/// store with no matching rows yields an empty vector.
pub fn load_for_user(path: &Path, user: &UserName) -> Result<Vec<UsageRecord>, ReadError> {
    Ok(load_all(path)?.for_user(user))
}

/// Read the whole store permissively.
///
/// The first line is treated as the header, but only its width is used: the
/// canonical column names are assigned by position. Rows whose width differs
/// from the header's, rows that fail to decode and rows with an empty or
/// unparseable field are dropped. Only failures that prevent reading the file
/// at all are returned as errors.
pub fn load_all(path: &Path) -> Result<StoreSnapshot, ReadError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ReadError::StoreNotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(ReadError::StoreParse(format!("failed to open usage store: {e}")));
        }
    };

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let width = rdr
        .headers()
        .map_err(|e| ReadError::StoreParse(format!("failed to read store header: {e}")))?
        .len();

    let mut snapshot = StoreSnapshot::default();

    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) if e.is_io_error() => {
                return Err(ReadError::StoreParse(format!("failed to read store row: {e}")));
            }
            Err(_) => {
                snapshot.dropped_rows += 1;
                continue;
            }
        };

        match parse_row(&record, width) {
            Some(usage) => snapshot.records.push(usage),
            None => snapshot.dropped_rows += 1,
        }
    }

    Ok(snapshot)
}

/// Columns the header actually provides, named canonically.
fn column_names(width: usize) -> &'static [&'static str] {
    &STORE_COLUMNS[..width.min(STORE_COLUMNS.len())]
}

fn parse_row(record: &StringRecord, width: usize) -> Option<UsageRecord> {
    if record.len() != width {
        return None;
    }

    let columns = column_names(width);
    let field = |name: &str| -> Option<&str> {
        columns
            .iter()
            .position(|c| *c == name)
            .and_then(|idx| record.get(idx))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    let timestamp = parse_timestamp(field("Timestamp")?).ok()?;
    let user = field("User")?.to_string();
    let appliance = field("Appliance")?.to_string();
    let status: i64 = field("Status")?.parse().ok()?;
    let kw_rating = parse_finite(field("KW_Rating")?)?;
    let energy_kwh = parse_finite(field("Energy_kWh")?)?;

    Some(UsageRecord {
        timestamp,
        user,
        appliance,
        status,
        kw_rating,
        energy_kwh,
    })
}

fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}
