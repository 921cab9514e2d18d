//! Row parser for the schedule page.
//!
//! The page carries one table, `table#runTable`. After the header row, rows
//! alternate between a game row and a `tr.second-row` info row:
//!
//! ```text
//! <tr><td class="start-time">2024-01-01T18:00:00Z</td><td>Mario</td><td>RunnerA</td>...</tr>
//! <tr class="second-row"><td class="text-right">1:30:00</td><td>Any% speedrun</td>...</tr>
//! ```
//!
//! Rows are classified by position: even rows are games, odd rows are info.
//! An odd row must also carry the `second-row` class, otherwise it is skipped.
use crate::RawRow;
use crate::client::{ApiError, ApiResult};
use log::warn;
use scraper::{ElementRef, Html, Selector};
use std::fmt;

const TABLE_SELECTOR: &str = "table#runTable";
const ROW_SELECTOR: &str = "tr, tr.second-row";

const GAME_TITLE_COLUMN: usize = 1;
const GAME_RUNNER_COLUMN: usize = 2;
const START_TIME_CLASS: &str = "start-time";
const INFO_DESCRIPTION_COLUMN: usize = 1;
const TIME_LABEL_CLASS: &str = "text-right";
const INFO_ROW_CLASS: &str = "second-row";

/// Why a single row was skipped. Never aborts the parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowParseError {
    MissingColumn { row: usize, column: usize },
    MissingCell { row: usize, class: &'static str },
    /// An info slot held a row without the info row class.
    MissingRowClass { row: usize, class: &'static str },
}

impl fmt::Display for RowParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowParseError::MissingColumn { row, column } => {
                write!(f, "row {row}: no column {column}")
            }
            RowParseError::MissingCell { row, class } => {
                write!(f, "row {row}: no td.{class} cell")
            }
            RowParseError::MissingRowClass { row, class } => {
                write!(f, "row {row}: expected a tr.{class} row")
            }
        }
    }
}

impl std::error::Error for RowParseError {}

pub type RowResult = Result<RawRow, RowParseError>;

/// A fetched schedule page with its run table located.
pub struct ScheduleDocument {
    html: Html,
    table: Selector,
    row: Selector,
}

impl ScheduleDocument {
    /// Parse markup and check that the run table is present.
    pub fn parse(body: &str) -> ApiResult<Self> {
        let table = Selector::parse(TABLE_SELECTOR)
            .map_err(|e| ApiError::Parsing(format!("invalid table selector: {e:?}")))?;
        let row = Selector::parse(ROW_SELECTOR)
            .map_err(|e| ApiError::Parsing(format!("invalid row selector: {e:?}")))?;

        let html = Html::parse_document(body);
        if html.select(&table).next().is_none() {
            return Err(ApiError::Parsing(format!("no {TABLE_SELECTOR} in document")));
        }

        Ok(Self { html, table, row })
    }

    /// Every row after the header, classified and extracted, in document order.
    /// A row that fails extraction yields an `Err` and still takes its slot in
    /// the even/odd sequence.
    pub fn rows(&self) -> impl Iterator<Item = RowResult> + '_ {
        self.html
            .select(&self.table)
            .take(1)
            .flat_map(|table| table.select(&self.row))
            .skip(1)
            .enumerate()
            .map(|(index, row)| classify_row(index, row))
    }

    /// Rows that extracted cleanly. Skipped rows are logged.
    pub fn valid_rows(&self) -> impl Iterator<Item = RawRow> + '_ {
        self.rows().filter_map(|result| match result {
            Ok(row) => Some(row),
            Err(e) => {
                warn!("skipping schedule row: {e}");
                None
            }
        })
    }
}

fn classify_row(index: usize, row: ElementRef<'_>) -> RowResult {
    let cells: Vec<ElementRef<'_>> = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "td")
        .collect();

    let column = |column: usize| {
        cells
            .get(column)
            .map(|el| cell_text(*el))
            .ok_or(RowParseError::MissingColumn { row: index, column })
    };
    let by_class = |class: &'static str| {
        cells
            .iter()
            .find(|el| el.value().classes().any(|c| c == class))
            .map(|el| cell_text(*el))
            .ok_or(RowParseError::MissingCell { row: index, class })
    };

    if index % 2 == 0 {
        Ok(RawRow::Game {
            title: column(GAME_TITLE_COLUMN)?,
            runner: column(GAME_RUNNER_COLUMN)?,
            start_time: by_class(START_TIME_CLASS)?,
        })
    } else {
        if !row.value().classes().any(|c| c == INFO_ROW_CLASS) {
            return Err(RowParseError::MissingRowClass { row: index, class: INFO_ROW_CLASS });
        }
        Ok(RawRow::Info {
            time_label: by_class(TIME_LABEL_CLASS)?,
            description: column(INFO_DESCRIPTION_COLUMN)?,
        })
    }
}

/// Cell text with whitespace collapsed, the way a browser would show it.
fn cell_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
