//! Normalized financial statements.
//!
//! A filing's report exposes a filing-specific set of statements whose names
//! are only known at runtime. [`StatementName`] wraps the discovered label and
//! [`StatementName::layout`] maps it to the extraction rules of its kind.

use chrono::NaiveDate;
use polars::prelude::{Column, DataFrame, PlSmallStr};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EnetError, Result};

/// Label of the statement of changes in equity.
pub const EQUITY_CHANGES: &str = "Demonstração das Mutações do Patrimônio Líquido";

/// Label of the cash flow statement.
pub const CASH_FLOW: &str = "Demonstração do Fluxo de Caixa";

/// Header given to the most recent value column.
pub const VALUE_COLUMN: &str = "value";

/// Name of a statement as listed by the filing's report page.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatementName(String);

impl StatementName {
    /// Wraps a discovered label, trimming surrounding whitespace.
    #[must_use]
    pub fn new(label: impl AsRef<str>) -> Self {
        Self(label.as_ref().trim().to_string())
    }

    /// Returns the label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the kind of statement this label denotes.
    #[must_use]
    pub fn kind(&self) -> StatementKind {
        match self.0.as_str() {
            EQUITY_CHANGES => StatementKind::EquityChanges,
            CASH_FLOW => StatementKind::CashFlow,
            _ => StatementKind::Standard,
        }
    }

    /// Returns the extraction rules for this statement.
    #[must_use]
    pub fn layout(&self) -> StatementLayout {
        self.kind().layout()
    }
}

impl fmt::Display for StatementName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StatementName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StatementName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Kinds of statement with distinct page layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementKind {
    /// Statement of changes in equity: legend table first, one column per
    /// equity component.
    EquityChanges,
    /// Cash flow statement: the unit sits one caption segment earlier.
    CashFlow,
    /// Every other statement, including ones not seen before.
    Standard,
}

impl StatementKind {
    /// Returns the extraction rules for this kind.
    #[must_use]
    pub const fn layout(&self) -> StatementLayout {
        match self {
            Self::EquityChanges => StatementLayout {
                table_index: 1,
                unit_segment: UnitSegment::Last,
                keep_all_columns: true,
            },
            Self::CashFlow => StatementLayout {
                table_index: 0,
                unit_segment: UnitSegment::SecondToLast,
                keep_all_columns: false,
            },
            Self::Standard => StatementLayout::DEFAULT,
        }
    }
}

/// Which `" - "`-separated caption segment holds the currency unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitSegment {
    /// The last segment.
    Last,
    /// The segment before the last.
    SecondToLast,
}

/// Extraction rules for one statement kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatementLayout {
    /// Index of the data table among the page's tables.
    pub table_index: usize,
    /// Caption segment holding the currency unit.
    pub unit_segment: UnitSegment,
    /// Keep every column instead of the account, description and most
    /// recent value columns.
    pub keep_all_columns: bool,
}

impl StatementLayout {
    /// Rules applied to statements without a special case.
    pub const DEFAULT: Self = Self {
        table_index: 0,
        unit_segment: UnitSegment::Last,
        keep_all_columns: false,
    };
}

/// A table cell after typing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    /// Account code or description.
    Text(String),
    /// Numeric amount; `None` when the cell could not be read as a number.
    Number(Option<f64>),
}

impl Cell {
    /// Returns the text of a text cell.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }

    /// Returns the amount of a numeric cell.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => *n,
            Self::Text(_) => None,
        }
    }
}

/// One row of a statement.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementRow {
    /// Cells in column order.
    pub cells: Vec<Cell>,
}

impl StatementRow {
    /// Creates a row from its cells.
    #[must_use]
    pub const fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Returns the account label (the first text cell).
    #[must_use]
    pub fn account(&self) -> Option<&str> {
        self.cells.iter().find_map(Cell::as_text)
    }

    /// Returns the most recent value (the last numeric cell).
    ///
    /// Only meaningful for statements trimmed to a single value column.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        self.cells
            .iter()
            .rev()
            .find(|c| matches!(c, Cell::Number(_)))
            .and_then(Cell::as_number)
    }
}

/// A normalized financial statement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// Statement name.
    pub name: StatementName,
    /// Reference date of the filing.
    pub reference_date: NaiveDate,
    /// Document version.
    pub version: Option<u32>,
    /// Currency unit applying to every amount (e.g. "Reais Mil").
    pub currency_unit: String,
    /// Column headers.
    pub columns: Vec<String>,
    /// Rows in page order.
    pub rows: Vec<StatementRow>,
}

impl Statement {
    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the statement has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the position of a column by header.
    #[must_use]
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == header)
    }

    /// Finds the first row whose account label matches.
    #[must_use]
    pub fn row(&self, account: &str) -> Option<&StatementRow> {
        self.rows.iter().find(|r| r.account() == Some(account))
    }

    /// Returns the most recent value of an account.
    #[must_use]
    pub fn value_of(&self, account: &str) -> Option<f64> {
        let idx = self.column_index(VALUE_COLUMN)?;
        self.row(account)?.cells.get(idx)?.as_number()
    }

    /// Converts the statement table into a DataFrame.
    ///
    /// Text columns become string columns and numeric columns nullable `f64`
    /// columns. Statement-level metadata is not repeated per row.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.columns.len());

        for (idx, header) in self.columns.iter().enumerate() {
            let is_text = self
                .rows
                .iter()
                .any(|r| matches!(r.cells.get(idx), Some(Cell::Text(_))));

            let column = if is_text {
                let values: Vec<String> = self
                    .rows
                    .iter()
                    .map(|r| {
                        r.cells
                            .get(idx)
                            .and_then(Cell::as_text)
                            .unwrap_or_default()
                            .to_string()
                    })
                    .collect();
                Column::new(PlSmallStr::from(header.as_str()), values)
            } else {
                let values: Vec<Option<f64>> = self
                    .rows
                    .iter()
                    .map(|r| r.cells.get(idx).and_then(Cell::as_number))
                    .collect();
                Column::new(PlSmallStr::from(header.as_str()), values)
            };
            columns.push(column);
        }

        DataFrame::new(columns).map_err(|e| EnetError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Statement {
        Statement {
            name: StatementName::new("Balanço Patrimonial Ativo"),
            reference_date: NaiveDate::from_ymd_opt(2021, 12, 31).unwrap(),
            version: Some(1),
            currency_unit: "Reais Mil".into(),
            columns: vec!["Conta".into(), "Descrição".into(), VALUE_COLUMN.into()],
            rows: vec![
                StatementRow::new(vec![
                    Cell::Text("1".into()),
                    Cell::Text("Ativo Total".into()),
                    Cell::Number(Some(1_234_567.0)),
                ]),
                StatementRow::new(vec![
                    Cell::Text("1.01".into()),
                    Cell::Text("Ativo Circulante".into()),
                    Cell::Number(None),
                ]),
            ],
        }
    }

    #[test]
    fn test_layout_lookup() {
        assert_eq!(
            StatementName::new(EQUITY_CHANGES).kind(),
            StatementKind::EquityChanges
        );
        assert_eq!(
            StatementName::new(format!(" {CASH_FLOW} ")).kind(),
            StatementKind::CashFlow
        );
        let unknown = StatementName::new("Demonstração do Valor Adicionado");
        assert_eq!(unknown.kind(), StatementKind::Standard);
        assert_eq!(unknown.kind().layout(), StatementLayout::DEFAULT);
        assert_eq!(StatementKind::EquityChanges.layout().table_index, 1);
        assert_eq!(
            StatementKind::CashFlow.layout().unit_segment,
            UnitSegment::SecondToLast
        );
    }

    #[test]
    fn test_row_accessors() {
        let statement = sample();
        assert_eq!(statement.rows[0].account(), Some("1"));
        assert_eq!(statement.rows[0].value(), Some(1_234_567.0));
        assert_eq!(statement.value_of("1"), Some(1_234_567.0));
        assert_eq!(statement.value_of("1.01"), None);
        assert_eq!(statement.value_of("9"), None);
    }

    #[test]
    fn test_to_dataframe() {
        let df = sample().to_dataframe().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 3);
        let values = df.column(VALUE_COLUMN).unwrap().f64().unwrap();
        assert_eq!(values.get(0), Some(1_234_567.0));
        assert_eq!(values.get(1), None);
    }
}
