use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::DataLoadError;
use crate::query::is_decade;

/// Column headers the loader looks up by name. Extra columns are ignored.
pub mod columns {
    pub const DECADE: &str = "Decade";
    pub const SUBREGION: &str = "UN_Geosheme_Subregion";
    pub const DISASTER_TYPE: &str = "Disaster_Type";
    pub const SCENARIO: &str = "RCP";
    pub const FINANCIAL: &str = "Financial_Impact";
    pub const HUMAN: &str = "Human_Impact";
    pub const LOW_OCCURRENCES: &str = "#LoDO";
    pub const MEDIUM_OCCURRENCES: &str = "#MeDO";
    pub const HIGH_OCCURRENCES: &str = "#HiDO";
    pub const TEMPERATURE: &str = "°C";
}

/// One decade × sub-region × disaster type × scenario row
#[derive(Clone, Debug, PartialEq)]
pub struct ImpactRecord {
    pub decade: i32,
    pub subregion: String,
    pub disaster_type: String,
    /// Climate scenario (RCP) code, 0 for the baseline
    pub scenario: f64,
    pub financial_impact: f64,
    pub human_impact: f64,
    pub low_occurrences: u32,
    pub medium_occurrences: u32,
    pub high_occurrences: u32,
    pub temperature_delta: f64,
}

/// How the dataset text is split into fields and numbers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub decimal: char,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            decimal: '.',
        }
    }
}

/// Header positions resolved once per file
struct ColumnIndex {
    decade: usize,
    subregion: usize,
    disaster_type: usize,
    scenario: usize,
    financial: usize,
    human: usize,
    low: usize,
    medium: usize,
    high: usize,
    temperature: usize,
}

impl ColumnIndex {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, DataLoadError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(DataLoadError::MissingColumn(name))
        };

        Ok(Self {
            decade: find(columns::DECADE)?,
            subregion: find(columns::SUBREGION)?,
            disaster_type: find(columns::DISASTER_TYPE)?,
            scenario: find(columns::SCENARIO)?,
            financial: find(columns::FINANCIAL)?,
            human: find(columns::HUMAN)?,
            low: find(columns::LOW_OCCURRENCES)?,
            medium: find(columns::MEDIUM_OCCURRENCES)?,
            high: find(columns::HIGH_OCCURRENCES)?,
            temperature: find(columns::TEMPERATURE)?,
        })
    }
}

/// Parses one field of a row, carrying the row number for error reports
struct FieldReader<'r> {
    record: &'r csv::StringRecord,
    row: u64,
    decimal: char,
}

impl FieldReader<'_> {
    fn raw(&self, idx: usize, column: &'static str) -> Result<&str, DataLoadError> {
        match self.record.get(idx) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(DataLoadError::EmptyField {
                row: self.row,
                column,
            }),
        }
    }

    fn text(&self, idx: usize, column: &'static str) -> Result<String, DataLoadError> {
        self.raw(idx, column).map(str::to_string)
    }

    fn number(&self, idx: usize, column: &'static str) -> Result<f64, DataLoadError> {
        let raw = self.raw(idx, column)?;
        parse_number(raw, self.decimal).ok_or_else(|| DataLoadError::NotNumeric {
            row: self.row,
            column,
            value: raw.to_string(),
        })
    }

    fn magnitude(&self, idx: usize, column: &'static str) -> Result<f64, DataLoadError> {
        let value = self.number(idx, column)?;
        if value < 0.0 {
            return Err(DataLoadError::Negative {
                row: self.row,
                column,
                value,
            });
        }
        Ok(value)
    }

    fn count(&self, idx: usize, column: &'static str) -> Result<u32, DataLoadError> {
        let value = self.magnitude(idx, column)?;
        if value.fract() != 0.0 || value > u32::MAX as f64 {
            return Err(DataLoadError::NotWhole {
                row: self.row,
                column,
                value,
            });
        }
        Ok(value as u32)
    }

    fn decade(&self, idx: usize) -> Result<i32, DataLoadError> {
        let value = self.number(idx, columns::DECADE)?;
        let decade = value as i32;
        if value.fract() != 0.0 || !is_decade(decade) {
            return Err(DataLoadError::InvalidDecade {
                row: self.row,
                value,
            });
        }
        Ok(decade)
    }
}

/// Parse a number written with the given decimal separator.
/// With a separator other than '.', a '.' anywhere in the field is rejected.
pub fn parse_number(raw: &str, decimal: char) -> Option<f64> {
    let value: f64 = if decimal == '.' {
        raw.parse().ok()?
    } else if raw.contains('.') {
        return None;
    } else {
        raw.replace(decimal, ".").parse().ok()?
    };
    value.is_finite().then_some(value)
}

/// Immutable in-memory table of impact records, in source order
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    records: Vec<ImpactRecord>,
}

impl Dataset {
    pub fn new(records: Vec<ImpactRecord>) -> Self {
        Self { records }
    }

    /// Load the dataset from a delimited text file
    pub fn load(path: &Path, options: &CsvOptions) -> Result<Self, DataLoadError> {
        let file = File::open(path).map_err(|source| DataLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = Self::from_reader(BufReader::new(file), options)?;
        tracing::info!(
            path = %path.display(),
            records = dataset.len(),
            "loaded impact dataset"
        );
        Ok(dataset)
    }

    /// Parse every row; the first bad row aborts the load
    pub fn from_reader<R: Read>(reader: R, options: &CsvOptions) -> Result<Self, DataLoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let index = ColumnIndex::resolve(csv_reader.headers()?)?;
        let mut records = Vec::new();

        for (i, result) in csv_reader.records().enumerate() {
            let record = result?;
            // Header is line 1
            let row = record.position().map_or(i as u64 + 2, |p| p.line());
            let fields = FieldReader {
                record: &record,
                row,
                decimal: options.decimal,
            };

            records.push(ImpactRecord {
                decade: fields.decade(index.decade)?,
                subregion: fields.text(index.subregion, columns::SUBREGION)?,
                disaster_type: fields.text(index.disaster_type, columns::DISASTER_TYPE)?,
                scenario: fields.number(index.scenario, columns::SCENARIO)?,
                financial_impact: fields.magnitude(index.financial, columns::FINANCIAL)?,
                human_impact: fields.magnitude(index.human, columns::HUMAN)?,
                low_occurrences: fields.count(index.low, columns::LOW_OCCURRENCES)?,
                medium_occurrences: fields.count(index.medium, columns::MEDIUM_OCCURRENCES)?,
                high_occurrences: fields.count(index.high, columns::HIGH_OCCURRENCES)?,
                temperature_delta: fields.number(index.temperature, columns::TEMPERATURE)?,
            });
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[ImpactRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct disaster types in the order they first appear
    pub fn disaster_types(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut types = Vec::new();
        for record in &self.records {
            if seen.insert(record.disaster_type.as_str()) {
                types.push(record.disaster_type.clone());
            }
        }
        types
    }

    /// Distinct scenario codes, ascending
    pub fn scenarios(&self) -> Vec<f64> {
        let mut codes: Vec<f64> = self.records.iter().map(|r| r.scenario).collect();
        codes.sort_by(f64::total_cmp);
        codes.dedup();
        codes
    }

    /// Distinct sub-regions, sorted
    pub fn subregions(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.records.iter().map(|r| r.subregion.as_str()).collect();
        set.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = concat!(
        "Decade,UN_Geosheme_Subregion,Disaster_Type,RCP,",
        "Financial_Impact,Human_Impact,#LoDO,#MeDO,#HiDO,°C"
    );

    fn parse(body: &str) -> Result<Dataset, DataLoadError> {
        let text = format!("{HEADER}\n{body}");
        Dataset::from_reader(text.as_bytes(), &CsvOptions::default())
    }

    #[test]
    fn test_loads_rows_in_order() {
        let ds = parse(
            "1900,Southern Asia,Droughts,0,1200.5,30,1,0,2,0.4\n\
             1910,Western Europe,Floods,2.6,80,4,0,1,0,1.1\n",
        )
        .unwrap();

        assert_eq!(ds.len(), 2);
        let first = &ds.records()[0];
        assert_eq!(first.decade, 1900);
        assert_eq!(first.subregion, "Southern Asia");
        assert_eq!(first.disaster_type, "Droughts");
        assert_eq!(first.scenario, 0.0);
        assert_eq!(first.financial_impact, 1200.5);
        assert_eq!(first.human_impact, 30.0);
        assert_eq!(
            (first.low_occurrences, first.medium_occurrences, first.high_occurrences),
            (1, 0, 2)
        );
        assert_eq!(first.temperature_delta, 0.4);
        assert_eq!(ds.records()[1].scenario, 2.6);
    }

    #[test]
    fn test_columns_found_by_name() {
        let text = concat!(
            "Extra,°C,#HiDO,#MeDO,#LoDO,Human_Impact,Financial_Impact,",
            "RCP,Disaster_Type,UN_Geosheme_Subregion,Decade\n",
            "x,-0.2,3,2,1,5,6,0,Floods,Melanesia,2050\n"
        );
        let ds = Dataset::from_reader(text.as_bytes(), &CsvOptions::default()).unwrap();
        let r = &ds.records()[0];
        assert_eq!(r.decade, 2050);
        assert_eq!(r.subregion, "Melanesia");
        assert_eq!(r.temperature_delta, -0.2);
        assert_eq!(r.high_occurrences, 3);
    }

    #[test]
    fn test_missing_column() {
        let text = "Decade,UN_Geosheme_Subregion,Disaster_Type\n1900,A,Floods\n";
        let err = Dataset::from_reader(text.as_bytes(), &CsvOptions::default()).unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumn("RCP")));
    }

    #[test]
    fn test_non_numeric_field_fails() {
        let err = parse("1900,A,Floods,0,lots,1,0,0,0,0\n").unwrap_err();
        match err {
            DataLoadError::NotNumeric { row, column, value } => {
                assert_eq!(row, 2);
                assert_eq!(column, columns::FINANCIAL);
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_and_nan_fields_fail() {
        assert!(matches!(
            parse("1900,A,Floods,0,,1,0,0,0,0\n").unwrap_err(),
            DataLoadError::EmptyField { .. }
        ));
        assert!(matches!(
            parse("1900,A,Floods,0,NaN,1,0,0,0,0\n").unwrap_err(),
            DataLoadError::NotNumeric { .. }
        ));
    }

    #[test]
    fn test_negative_and_fractional_counters_fail() {
        assert!(matches!(
            parse("1900,A,Floods,0,1,-1,0,0,0,0\n").unwrap_err(),
            DataLoadError::Negative { .. }
        ));
        assert!(matches!(
            parse("1900,A,Floods,0,1,1,0.5,0,0,0\n").unwrap_err(),
            DataLoadError::NotWhole { .. }
        ));
    }

    #[test]
    fn test_decade_outside_set_fails() {
        assert!(matches!(
            parse("1905,A,Floods,0,1,1,0,0,0,0\n").unwrap_err(),
            DataLoadError::InvalidDecade { .. }
        ));
        assert!(matches!(
            parse("2110,A,Floods,0,1,1,0,0,0,0\n").unwrap_err(),
            DataLoadError::InvalidDecade { .. }
        ));
    }

    #[test]
    fn test_ragged_row_fails() {
        assert!(matches!(
            parse("1900,A,Floods,0,1\n").unwrap_err(),
            DataLoadError::Csv(_)
        ));
    }

    #[test]
    fn test_comma_decimal_separator() {
        let text = HEADER.replace(',', ";")
            + "\n1900;A;Floods;2,6;1200,5;3;0;0;0;0,4\n";
        let options = CsvOptions {
            delimiter: b';',
            decimal: ',',
        };
        let ds = Dataset::from_reader(text.as_bytes(), &options).unwrap();
        let r = &ds.records()[0];
        assert_eq!(r.scenario, 2.6);
        assert_eq!(r.financial_impact, 1200.5);
        assert_eq!(r.temperature_delta, 0.4);
    }

    #[test]
    fn test_parse_number_rejects_foreign_separator() {
        assert_eq!(parse_number("1.5", '.'), Some(1.5));
        assert_eq!(parse_number("1,5", ','), Some(1.5));
        assert_eq!(parse_number("1.5", ','), None);
        assert_eq!(parse_number("1,5", '.'), None);
        assert_eq!(parse_number("inf", '.'), None);
    }

    #[test]
    fn test_distinct_values() {
        let ds = parse(
            "1900,B,Floods,4.5,1,1,0,0,0,0\n\
             1900,A,Droughts,0,1,1,0,0,0,0\n\
             1910,B,Floods,0,1,1,0,0,0,0\n",
        )
        .unwrap();
        assert_eq!(ds.disaster_types(), vec!["Floods", "Droughts"]);
        assert_eq!(ds.scenarios(), vec![0.0, 4.5]);
        assert_eq!(ds.subregions(), vec!["A", "B"]);
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "2000,Caribbean,Storms,0,10,2,1,1,1,0.9").unwrap();
        let ds = Dataset::load(file.path(), &CsvOptions::default()).unwrap();
        assert_eq!(ds.len(), 1);

        let missing = Dataset::load(Path::new("/nonexistent/impacts.csv"), &CsvOptions::default());
        assert!(matches!(missing.unwrap_err(), DataLoadError::Io { .. }));
    }
}
