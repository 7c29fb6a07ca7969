use thiserror::Error;

pub const MEAN_COLUMN: &str = "mean";
pub const STD_DEV_COLUMN: &str = "std. dev.";
pub const ENERGY_LOW_COLUMN: &str = "energy low [eV]";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("Column '{column}' has {found} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
    #[error("Column '{0}' appears more than once")]
    DuplicateColumn(String),
}

/// Numeric tally results, one row per output bin.
///
/// Only numeric columns are kept. The conversion pipeline reads `mean`,
/// `std. dev.` and, for spectra, `energy low [eV]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultsTable {
    columns: Vec<(String, Vec<f64>)>,
    rows: usize,
}

impl ResultsTable {
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> Result<Self, TableError> {
        let rows = columns.first().map(|(_, values)| values.len()).unwrap_or(0);
        for (i, (name, values)) in columns.iter().enumerate() {
            if values.len() != rows {
                return Err(TableError::LengthMismatch {
                    column: name.clone(),
                    expected: rows,
                    found: values.len(),
                });
            }
            if columns[..i].iter().any(|(other, _)| other == name) {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn from_mean(mean: Vec<f64>, std_dev: Option<Vec<f64>>) -> Result<Self, TableError> {
        let mut columns = vec![(MEAN_COLUMN.to_string(), mean)];
        if let Some(std_dev) = std_dev {
            columns.push((STD_DEV_COLUMN.to_string(), std_dev));
        }
        Self::from_columns(columns)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn mean(&self) -> Option<&[f64]> {
        self.column(MEAN_COLUMN)
    }

    pub fn std_dev(&self) -> Option<&[f64]> {
        self.column(STD_DEV_COLUMN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_mean_builds_mean_and_optional_std_dev_columns() {
        let table = ResultsTable::from_mean(vec![1.0, 2.0], Some(vec![0.1, 0.2])).unwrap();
        assert_eq!(table.rows(), 2);
        assert_eq!(table.mean(), Some(&[1.0, 2.0][..]));
        assert_eq!(table.std_dev(), Some(&[0.1, 0.2][..]));

        let table = ResultsTable::from_mean(vec![1.0], None).unwrap();
        assert!(table.std_dev().is_none());
    }

    #[test]
    fn from_columns_rejects_ragged_columns() {
        let result = ResultsTable::from_mean(vec![1.0, 2.0], Some(vec![0.1]));
        assert_eq!(
            result,
            Err(TableError::LengthMismatch {
                column: STD_DEV_COLUMN.to_string(),
                expected: 2,
                found: 1,
            })
        );
    }

    #[test]
    fn from_columns_rejects_duplicate_names() {
        let result = ResultsTable::from_columns(vec![
            ("mean".into(), vec![1.0]),
            ("mean".into(), vec![2.0]),
        ]);
        assert_eq!(result, Err(TableError::DuplicateColumn("mean".into())));
    }

    #[test]
    fn column_names_preserve_insertion_order() {
        let table = ResultsTable::from_columns(vec![
            (ENERGY_LOW_COLUMN.into(), vec![0.0]),
            (MEAN_COLUMN.into(), vec![1.0]),
        ])
        .unwrap();
        let names: Vec<_> = table.column_names().collect();
        assert_eq!(names, vec![ENERGY_LOW_COLUMN, MEAN_COLUMN]);
    }
}
