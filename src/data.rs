//! Data loading and tenure feature derivation using Polars

use crate::tenure::{attach_tenure_group, TenureGroup, TENURE_GROUP_COLUMN, TENURE_MONTHS_COLUMN};
use anyhow::Context;
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

pub const CHURN_LABEL_COLUMN: &str = "churn_label";
pub const PHONE_SERVICE_COLUMN: &str = "phone_service";
pub const INTERNET_SERVICE_COLUMN: &str = "internet_service";
pub const CITY_COLUMN: &str = "city";
pub const CLTV_COLUMN: &str = "cltv";

/// Category columns, loaded as strings
const CATEGORY_COLUMNS: [&str; 4] = [
    CHURN_LABEL_COLUMN,
    PHONE_SERVICE_COLUMN,
    INTERNET_SERVICE_COLUMN,
    CITY_COLUMN,
];

/// One customer row with the fields the reports read
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRecord {
    pub tenure_months: i64,
    pub churn_label: String,
    pub phone_service: String,
    pub internet_service: String,
    pub city: String,
    pub cltv: f64,
    pub tenure_group: TenureGroup,
}

/// Loaded churn dataset. Read-only once constructed.
#[derive(Debug, Clone)]
pub struct TelcoData {
    frame: DataFrame,
}

impl TelcoData {
    /// Wrap an already loaded frame, typing the required columns and
    /// attaching `tenure_group`
    pub fn from_frame(frame: DataFrame) -> crate::Result<Self> {
        for name in required_columns() {
            frame
                .column(name)
                .with_context(|| format!("Required column '{}' not found", name))?;
        }

        let mut typed = frame;
        for name in CATEGORY_COLUMNS {
            let cast = typed.column(name)?.cast(&DataType::String)?;
            typed.with_column(cast)?;
        }
        let tenure = typed
            .column(TENURE_MONTHS_COLUMN)?
            .strict_cast(&DataType::Int64)
            .with_context(|| format!("Column '{}' must hold integers", TENURE_MONTHS_COLUMN))?;
        typed.with_column(tenure)?;
        let cltv = typed
            .column(CLTV_COLUMN)?
            .strict_cast(&DataType::Float64)
            .with_context(|| format!("Column '{}' must be numeric", CLTV_COLUMN))?;
        typed.with_column(cltv)?;

        let frame = attach_tenure_group(typed)?;
        Ok(Self { frame })
    }

    /// Underlying frame, including the derived `tenure_group` column
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Declared category order of `tenure_group`
    pub fn tenure_group_order(&self) -> Vec<&'static str> {
        TenureGroup::order()
    }

    /// Typed view of every row
    pub fn records(&self) -> crate::Result<Vec<CustomerRecord>> {
        let tenure = self.frame.column(TENURE_MONTHS_COLUMN)?.i64()?;
        let churn = self.frame.column(CHURN_LABEL_COLUMN)?.str()?;
        let phone = self.frame.column(PHONE_SERVICE_COLUMN)?.str()?;
        let internet = self.frame.column(INTERNET_SERVICE_COLUMN)?.str()?;
        let city = self.frame.column(CITY_COLUMN)?.str()?;
        let cltv = self.frame.column(CLTV_COLUMN)?.f64()?;
        let group = self.frame.column(TENURE_GROUP_COLUMN)?.str()?;

        let mut records = Vec::with_capacity(self.len());
        for row in 0..self.len() {
            let tenure_group = required(group.get(row), TENURE_GROUP_COLUMN, row)?.parse()?;
            records.push(CustomerRecord {
                tenure_months: required(tenure.get(row), TENURE_MONTHS_COLUMN, row)?,
                churn_label: required(churn.get(row), CHURN_LABEL_COLUMN, row)?.to_string(),
                phone_service: required(phone.get(row), PHONE_SERVICE_COLUMN, row)?.to_string(),
                internet_service: required(internet.get(row), INTERNET_SERVICE_COLUMN, row)?
                    .to_string(),
                city: required(city.get(row), CITY_COLUMN, row)?.to_string(),
                cltv: required(cltv.get(row), CLTV_COLUMN, row)?,
                tenure_group,
            });
        }
        Ok(records)
    }
}

fn required<T>(value: Option<T>, column: &str, row: usize) -> crate::Result<T> {
    value.with_context(|| format!("Missing {} at row {}", column, row))
}

/// Columns every input file must provide
pub fn required_columns() -> [&'static str; 6] {
    [
        TENURE_MONTHS_COLUMN,
        CHURN_LABEL_COLUMN,
        PHONE_SERVICE_COLUMN,
        INTERNET_SERVICE_COLUMN,
        CITY_COLUMN,
        CLTV_COLUMN,
    ]
}

/// Load the churn CSV and derive the tenure band for every customer
///
/// # Arguments
/// * `file_path` - Path to a CSV file with a header row
///
/// # Returns
/// * `TelcoData` with typed columns and `tenure_group` attached
pub fn load_telco(file_path: impl AsRef<Path>) -> crate::Result<TelcoData> {
    let path = file_path.as_ref();
    info!(path = %path.display(), "loading churn dataset");

    // Infer over every row so a late decimal cltv does not fail an integer guess
    let frame = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(None)
        .finish()
        .and_then(|lazy| lazy.collect())
        .with_context(|| format!("Failed to read CSV file {}", path.display()))?;
    debug!(rows = frame.height(), columns = frame.width(), "csv parsed");

    let data = TelcoData::from_frame(frame)
        .with_context(|| format!("Invalid churn dataset {}", path.display()))?;
    info!(customers = data.len(), "dataset ready");

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenure::classify_tenure;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "customer_id,city,phone_service,internet_service,tenure_months,cltv,churn_label").unwrap();
        writeln!(file, "0001,Los Angeles,Yes,DSL,2,3239,Yes").unwrap();
        writeln!(file, "0002,Los Angeles,No,Fiber optic,24,2701,No").unwrap();
        writeln!(file, "0003,San Diego,Yes,No,48,5372.5,No").unwrap();
        writeln!(file, "0004,Fresno,Yes,Fiber optic,72,4003,Yes").unwrap();
        file
    }

    #[test]
    fn test_load_telco() {
        let test_file = create_test_csv();

        let data = load_telco(test_file.path()).unwrap();
        assert_eq!(data.len(), 4);
        assert!(data.frame().column(TENURE_GROUP_COLUMN).is_ok());
        assert_eq!(
            data.tenure_group_order(),
            vec!["< 1 Year", "1-2 Year", "2-4 Year", "4-5 Year", "> 5 Year"]
        );
    }

    #[test]
    fn test_records_carry_tenure_group() {
        let test_file = create_test_csv();
        let data = load_telco(test_file.path()).unwrap();

        let records = data.records().unwrap();
        assert_eq!(records.len(), 4);
        for record in &records {
            assert_eq!(record.tenure_group, classify_tenure(record.tenure_months));
        }
        assert_eq!(records[0].city, "Los Angeles");
        assert_eq!(records[2].cltv, 5372.5);
        assert_eq!(records[1].tenure_group, TenureGroup::OverFiveYears);
    }

    #[test]
    fn test_missing_column() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "city,tenure_months,churn_label").unwrap();
        writeln!(file, "Fresno,3,No").unwrap();

        let err = load_telco(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("not found"));
    }

    #[test]
    fn test_late_decimal_cltv_loads_as_float() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "city,phone_service,internet_service,tenure_months,cltv,churn_label").unwrap();
        for i in 0..150 {
            let cltv = if i == 120 { "4500.5".to_string() } else { (2000 + i).to_string() };
            writeln!(file, "Fresno,Yes,DSL,{},{},No", i % 72, cltv).unwrap();
        }

        let data = load_telco(file.path()).unwrap();
        assert_eq!(data.len(), 150);
        let records = data.records().unwrap();
        assert_eq!(records[120].cltv, 4500.5);
        assert_eq!(records[0].cltv, 2000.0);
    }

    #[test]
    fn test_records_report_null_category() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "city,phone_service,internet_service,tenure_months,cltv,churn_label").unwrap();
        writeln!(file, "Fresno,Yes,DSL,3,2500,No").unwrap();
        writeln!(file, ",Yes,DSL,30,2600,Yes").unwrap();

        let data = load_telco(file.path()).unwrap();
        let err = data.records().unwrap_err();
        assert!(err.to_string().contains("Missing city at row 1"));
    }

    #[test]
    fn test_missing_file() {
        assert!(load_telco("does/not/exist.csv").is_err());
    }
}
