//! Statement table normalization.
//!
//! A statement page holds one or more HTML tables and a caption
//! (`#TituloTabelaSemBorda`) whose `" - "`-separated segments carry the
//! currency unit. Extraction picks the data table, types its columns and
//! reduces it to the account, description and most recent value columns
//! unless the statement keeps every column.

use chrono::NaiveDate;
use enet_core::{
    Cell, EnetError, Result, Statement, StatementName, StatementRow, UnitSegment,
    statement::VALUE_COLUMN,
};
use scraper::{ElementRef, Html};
use tracing::{debug, instrument, trace};

use crate::dom::{children_named, selector, text_of};

/// Id of the statement caption.
pub const CAPTION_ID: &str = "TituloTabelaSemBorda";

/// Headers of columns kept as text.
pub const TEXT_COLUMNS: [&str; 4] = ["Conta", "Descrição", "Account", "Description"];

const CAPTION_SEPARATOR: &str = " - ";

/// Columns kept for statements reduced to their most recent value.
const REDUCED_WIDTH: usize = 3;

/// Normalizes statement pages into [`Statement`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementExtractor;

impl StatementExtractor {
    /// Create an extractor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Extract the statement `name` from its page markup.
    #[instrument(skip(self, html), fields(statement = %name))]
    pub fn extract(
        &self,
        name: &StatementName,
        html: &str,
        reference_date: NaiveDate,
        version: Option<u32>,
    ) -> Result<Statement> {
        let layout = name.layout();
        let document = Html::parse_document(html);

        let caption = selector(&format!("[id='{CAPTION_ID}']"))?;
        let caption = document
            .select(&caption)
            .next()
            .map(text_of)
            .ok_or_else(|| EnetError::Parse(format!("{name}: page has no {CAPTION_ID}")))?;
        let currency_unit = resolve_currency_unit(&caption, layout.unit_segment)?;

        let tables = selector("table")?;
        let table = document
            .select(&tables)
            .nth(layout.table_index)
            .ok_or_else(|| {
                EnetError::Parse(format!("{name}: page has no table #{}", layout.table_index))
            })?;

        let mut grid = read_grid(table);
        if grid.is_empty() {
            return Err(EnetError::Parse(format!("{name}: table is empty")));
        }
        let header = grid.remove(0);
        let width = grid.iter().map(Vec::len).chain([header.len()]).max().unwrap_or(0);

        let mut columns = header;
        for i in columns.len()..width {
            columns.push(format!("column_{i}"));
        }

        let text_columns = columns
            .iter()
            .map(|c| TEXT_COLUMNS.contains(&c.trim()))
            .collect::<Vec<_>>();

        let mut rows = grid
            .into_iter()
            .filter(|cells| cells.iter().any(|c| !c.is_empty()))
            .map(|mut cells| {
                cells.resize(width, String::new());
                let typed = cells
                    .into_iter()
                    .zip(&text_columns)
                    .map(|(raw, &is_text)| {
                        if is_text {
                            Cell::Text(raw)
                        } else {
                            Cell::Number(parse_amount(&raw))
                        }
                    })
                    .collect();
                StatementRow::new(typed)
            })
            .collect::<Vec<_>>();

        if !layout.keep_all_columns {
            if width < REDUCED_WIDTH {
                return Err(EnetError::Parse(format!(
                    "{name}: table has {width} columns, expected at least {REDUCED_WIDTH}"
                )));
            }
            columns.truncate(REDUCED_WIDTH);
            columns[REDUCED_WIDTH - 1] = VALUE_COLUMN.to_string();
            for row in &mut rows {
                row.cells.truncate(REDUCED_WIDTH);
            }
        }

        debug!(
            rows = rows.len(),
            columns = columns.len(),
            unit = %currency_unit,
            "Extracted statement"
        );

        Ok(Statement {
            name: name.clone(),
            reference_date,
            version,
            currency_unit,
            columns,
            rows,
        })
    }
}

/// Reads a table into rows of cell text, expanding column spans.
///
/// Only the table's own rows are read; nested tables are skipped.
fn read_grid(table: ElementRef<'_>) -> Vec<Vec<String>> {
    let sections = children_named(table, &["thead", "tbody", "tfoot"]);
    let rows = children_named(table, &["tr"])
        .chain(sections.flat_map(|s| children_named(s, &["tr"])))
        .collect::<Vec<_>>();

    rows.into_iter()
        .map(|tr| {
            let mut cells = Vec::new();
            for cell in children_named(tr, &["td", "th"]) {
                let span = cell
                    .value()
                    .attr("colspan")
                    .and_then(|s| s.trim().parse::<usize>().ok())
                    .unwrap_or(1)
                    .max(1);
                let text = text_of(cell);
                cells.extend(std::iter::repeat_n(text, span));
            }
            cells
        })
        .collect()
}

/// Picks the currency unit out of a statement caption.
///
/// The caption is split on `" - "`; parentheses are stripped from the chosen
/// segment.
pub fn resolve_currency_unit(caption: &str, segment: UnitSegment) -> Result<String> {
    let segments = caption.split(CAPTION_SEPARATOR).collect::<Vec<_>>();
    if segments.len() < 2 {
        return Err(EnetError::Parse(format!(
            "caption '{caption}' has no '{}' separator",
            CAPTION_SEPARATOR.trim()
        )));
    }

    let picked = match segment {
        UnitSegment::Last => segments[segments.len() - 1],
        UnitSegment::SecondToLast => segments[segments.len() - 2],
    };
    Ok(picked.replace(['(', ')'], "").trim().to_string())
}

/// Parses a Brazilian-formatted amount (`1.234,56`).
///
/// Anything that does not parse becomes `None`.
#[must_use]
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace('.', "").replace(',', ".");
    if cleaned.is_empty() {
        return None;
    }
    let parsed = cleaned.parse::<f64>().ok();
    if parsed.is_none() {
        trace!(raw, "Unparsable amount");
    }
    parsed
}
