//! A list of records with a single-field search filter, shown through a
//! [`DataTable`].

use std::time::Instant;

use ratatui::crossterm::event::KeyEvent;
use rayon::prelude::*;
use tracing::{debug, error, trace};

use crate::record::{ColumnDescriptor, Row, RowId};
use crate::table::{DataTable, RowUpdate, TableView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matching {
    /// Case-insensitive substring test, for free text.
    CaseInsensitive,
    /// Plain substring test, for dates and other formatted strings.
    Plain,
}

/// Selects which field the search text is tested against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterMode {
    pub key: &'static str,
    pub label: &'static str,
    pub matching: Matching,
}

impl FilterMode {
    pub const fn new(key: &'static str, label: &'static str, matching: Matching) -> Self {
        Self {
            key,
            label,
            matching,
        }
    }

    pub fn matches(&self, row: &Row, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        let field = row.text(self.key);
        match self.matching {
            Matching::CaseInsensitive => field.to_lowercase().contains(&term.to_lowercase()),
            Matching::Plain => field.contains(term),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search_text: String,
    /// Index into the view's filter modes.
    pub mode: usize,
}

pub struct ListView {
    title: String,
    columns: Vec<ColumnDescriptor>,
    modes: Vec<FilterMode>,
    rows: Vec<Row>,
    visible: Vec<usize>, // Mapping of projection position to index in rows
    projection: Vec<Row>,
    filter: FilterState,
    table: DataTable,
    deletable: bool,
}

impl ListView {
    pub fn new(
        title: &str,
        columns: Vec<ColumnDescriptor>,
        modes: Vec<FilterMode>,
        rows: Vec<Row>,
        table: DataTable,
    ) -> Self {
        let mut view = Self {
            title: title.to_string(),
            columns,
            modes,
            rows,
            visible: Vec::new(),
            projection: Vec::new(),
            filter: FilterState::default(),
            table,
            deletable: false,
        };
        view.refresh();
        view
    }

    pub fn with_delete(mut self) -> Self {
        self.deletable = true;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// The authoritative, unfiltered sequence.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// The filtered projection, in authoritative order.
    pub fn filtered(&self) -> &[Row] {
        &self.projection
    }

    pub fn filter_state(&self) -> &FilterState {
        &self.filter
    }

    pub fn filter_mode(&self) -> Option<&FilterMode> {
        self.modes.get(self.filter.mode)
    }

    pub fn is_editing(&self) -> bool {
        self.table.is_editing()
    }

    pub fn render(&self) -> TableView {
        self.table.render(&self.columns, &self.projection)
    }

    pub fn set_search_text(&mut self, text: &str) {
        if self.filter.search_text != text {
            self.filter.search_text = text.to_string();
            self.refresh();
        }
    }

    pub fn clear_search(&mut self) {
        self.set_search_text("");
    }

    pub fn set_filter_mode(&mut self, key: &str) {
        if let Some(idx) = self.modes.iter().position(|m| m.key == key) {
            self.filter.mode = idx;
            self.refresh();
        }
    }

    pub fn cycle_filter_mode(&mut self) {
        if self.modes.is_empty() {
            return;
        }
        let next = self.modes[(self.filter.mode + 1) % self.modes.len()].key;
        self.set_filter_mode(next);
    }

    pub fn selected(&self) -> Option<&Row> {
        self.table
            .selected_row(self.projection.len())
            .and_then(|idx| self.projection.get(idx))
    }

    pub fn move_selection(&mut self, drow: isize, dcol: isize) {
        self.commit_edit();
        self.table
            .move_selection(self.projection.len(), self.columns.len(), drow, dcol);
    }

    pub fn select_first(&mut self) {
        self.commit_edit();
        self.table.select_first();
    }

    pub fn select_last(&mut self) {
        self.commit_edit();
        self.table.select_last(self.projection.len());
    }

    pub fn begin_edit(&mut self) {
        if let Some(update) = self.table.begin_edit_selected(&self.columns, &self.projection) {
            self.apply_update(update);
        }
    }

    pub fn edit_key(&mut self, key: KeyEvent) {
        if let Some(update) = self.table.edit_key(key, &self.columns, &self.projection) {
            self.apply_update(update);
        }
    }

    /// Focus loss: an open edit is kept, not thrown away.
    pub fn commit_edit(&mut self) {
        if let Some(update) = self.table.commit_edit(&self.projection) {
            self.apply_update(update);
        }
    }

    /// Replaces the record with the update's id. The positional index is
    /// ignored since it refers to the filtered projection.
    pub fn apply_update(&mut self, update: RowUpdate) -> bool {
        match self.rows.iter().position(|r| *r.id() == update.id) {
            Some(pos) => {
                trace!(
                    "Update row {} (projection {}, data {})",
                    update.id, update.index, pos
                );
                self.rows[pos] = update.row;
                self.refresh();
                true
            }
            None => {
                error!("Update for unknown row id {}", update.id);
                false
            }
        }
    }

    pub fn delete_row(&mut self, id: &RowId) -> Option<Row> {
        let pos = self.rows.iter().position(|r| r.id() == id)?;
        self.table.cancel_edit();
        let removed = self.rows.remove(pos);
        debug!("Deleted row {} from {}", id, self.title);
        self.refresh();
        Some(removed)
    }

    pub fn delete_selected(&mut self) -> Option<Row> {
        if !self.deletable {
            return None;
        }
        let id = self.selected()?.id().clone();
        self.delete_row(&id)
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
        self.refresh();
    }

    fn refresh(&mut self) {
        let start_time = Instant::now();
        let term = self.filter.search_text.as_str();
        self.visible = match self.modes.get(self.filter.mode) {
            Some(mode) if !term.is_empty() => self
                .rows
                .par_iter()
                .enumerate()
                .filter(|(_, row)| mode.matches(row, term))
                .map(|(idx, _)| idx)
                .collect(),
            _ => (0..self.rows.len()).collect(),
        };
        self.projection = self.visible.iter().map(|&idx| self.rows[idx].clone()).collect();
        self.table.clamp(self.projection.len());

        debug!(
            "{}: {} of {} rows match \"{}\" in {}us",
            self.title,
            self.visible.len(),
            self.rows.len(),
            term,
            start_time.elapsed().as_micros()
        );
    }
}
