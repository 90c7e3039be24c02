//! Generic data table.
//!
//! The table owns only transient interaction state: the keyboard selection,
//! the edit cursor and the edit buffer. Columns and rows are passed in on every
//! call by the owning view, and edits flow back out as [`RowUpdate`] values.

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use tracing::{debug, trace};

use crate::inputter::{InputEvent, Inputter};
use crate::record::{ColumnDescriptor, Row, RowId};

pub const ACTIONS_HEADER: &str = "Actions";

/// Renders the contents of the trailing action cell for one row.
pub type ActionRenderer = Box<dyn Fn(&Row, usize) -> Vec<String>>;

/// The single cell currently being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct EditCursor {
    pub row_index: usize,
    pub row_id: RowId,
    pub column_key: String,
}

/// Result of committing an edit. `index` is positional within the rows the
/// table was given; `id` is the stable record id and is what views should use.
#[derive(Debug, Clone, PartialEq)]
pub struct RowUpdate {
    pub index: usize,
    pub id: RowId,
    pub row: Row,
}

/// Everything the ui needs to draw one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableView {
    pub headers: Vec<String>,
    pub widths: Vec<Option<u16>>,
    pub body: Vec<Vec<String>>,
    /// Per data column: can the user start an edit there.
    pub editable: Vec<bool>,
    pub has_actions: bool,
    pub selected_row: Option<usize>,
    pub selected_column: usize,
    /// (row, column, buffer, cursor) of the open edit.
    pub editing: Option<(usize, usize, String, usize)>,
}

pub struct DataTable {
    accepts_updates: bool,
    action_renderer: Option<ActionRenderer>,
    edit: Option<EditCursor>,
    buffer: Inputter,
    curser_row: usize,
    curser_column: usize,
}

impl Default for DataTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DataTable {
    pub fn new() -> Self {
        Self {
            accepts_updates: false,
            action_renderer: None,
            edit: None,
            buffer: Inputter::default(),
            curser_row: 0,
            curser_column: 0,
        }
    }

    /// Registers the owning view as a receiver of row updates. Without it no
    /// cell can enter edit mode.
    pub fn with_row_updates(mut self) -> Self {
        self.accepts_updates = true;
        self
    }

    pub fn with_actions(mut self, renderer: impl Fn(&Row, usize) -> Vec<String> + 'static) -> Self {
        self.action_renderer = Some(Box::new(renderer));
        self
    }

    pub fn has_actions(&self) -> bool {
        self.action_renderer.is_some()
    }

    pub fn edit_cursor(&self) -> Option<&EditCursor> {
        self.edit.as_ref()
    }

    pub fn edit_buffer(&self) -> &str {
        self.buffer.value()
    }

    pub fn is_editing(&self) -> bool {
        self.edit.is_some()
    }

    pub fn render(&self, columns: &[ColumnDescriptor], rows: &[Row]) -> TableView {
        let mut headers: Vec<String> = columns.iter().map(|c| c.header.clone()).collect();
        let mut widths: Vec<Option<u16>> = columns.iter().map(|c| c.width).collect();
        if self.has_actions() {
            headers.push(ACTIONS_HEADER.to_string());
            widths.push(None);
        }

        let body = rows
            .iter()
            .enumerate()
            .map(|(ridx, row)| {
                let mut cells: Vec<String> = columns.iter().map(|c| row.text(&c.key)).collect();
                if let Some(renderer) = &self.action_renderer {
                    cells.push(renderer(row, ridx).join(" "));
                }
                cells
            })
            .collect();

        let editing = self.edit_cursor().and_then(|cursor| {
            let cidx = columns.iter().position(|c| c.key == cursor.column_key)?;
            (cursor.row_index < rows.len()).then(|| {
                (
                    cursor.row_index,
                    cidx,
                    self.edit_buffer().to_string(),
                    self.buffer.cursor(),
                )
            })
        });

        TableView {
            headers,
            widths,
            body,
            editable: columns
                .iter()
                .map(|c| c.editable && self.accepts_updates)
                .collect(),
            has_actions: self.has_actions(),
            selected_row: self.selected_row(rows.len()),
            selected_column: self.curser_column.min(columns.len().saturating_sub(1)),
            editing,
        }
    }

    /// Starts editing a cell. Does nothing when the column is not editable, no
    /// row updates are accepted, or the cell does not exist. An edit that is
    /// already open is committed first and its update returned.
    pub fn begin_edit(
        &mut self,
        columns: &[ColumnDescriptor],
        rows: &[Row],
        row_index: usize,
        column_key: &str,
    ) -> Option<RowUpdate> {
        if !self.accepts_updates {
            return None;
        }
        let column = columns.iter().find(|c| c.key == column_key)?;
        if !column.editable {
            return None;
        }
        let row = rows.get(row_index)?;
        let seed = match row.get(column_key) {
            Some(value) if !value.is_editable() => return None,
            Some(value) => value.to_string(),
            None => String::new(),
        };

        let previous = self.commit_edit(rows);
        trace!("Begin edit {}:{} \"{}\"", row_index, column_key, seed);
        self.edit = Some(EditCursor {
            row_index,
            row_id: row.id().clone(),
            column_key: column_key.to_string(),
        });
        self.buffer = Inputter::with_value(&seed);
        previous
    }

    pub fn begin_edit_selected(
        &mut self,
        columns: &[ColumnDescriptor],
        rows: &[Row],
    ) -> Option<RowUpdate> {
        let row = self.selected_row(rows.len())?;
        let key = columns.get(self.curser_column)?.key.clone();
        self.begin_edit(columns, rows, row, &key)
    }

    /// Closes the open edit and builds the updated row. The row is looked up
    /// in `rows`; if it is gone the edit is dropped.
    pub fn commit_edit(&mut self, rows: &[Row]) -> Option<RowUpdate> {
        let cursor = self.edit.take()?;
        let value = self.buffer.value().to_string();
        self.buffer.clear();

        let index = match rows.get(cursor.row_index) {
            Some(row) if *row.id() == cursor.row_id => cursor.row_index,
            _ => rows.iter().position(|r| *r.id() == cursor.row_id)?,
        };
        let mut row = rows[index].clone();
        let replaced = match row.get(&cursor.column_key) {
            Some(old) => old.replaced_by(&value),
            None => value.into(),
        };
        row.set(&cursor.column_key, replaced);
        debug!("Commit edit of {} \"{}\"", cursor.row_id, cursor.column_key);

        Some(RowUpdate {
            index,
            id: cursor.row_id,
            row,
        })
    }

    pub fn cancel_edit(&mut self) {
        if let Some(cursor) = self.edit.take() {
            trace!("Cancel edit of {} \"{}\"", cursor.row_id, cursor.column_key);
        }
        self.buffer.clear();
    }

    /// Feeds a key to the open edit. Enter commits, Esc cancels, Up/Down/Tab
    /// commit and move the selection.
    pub fn edit_key(
        &mut self,
        key: KeyEvent,
        columns: &[ColumnDescriptor],
        rows: &[Row],
    ) -> Option<RowUpdate> {
        if !self.is_editing() {
            return None;
        }
        match key.code {
            KeyCode::Up => {
                let update = self.commit_edit(rows);
                self.move_selection(rows.len(), columns.len(), -1, 0);
                update
            }
            KeyCode::Down => {
                let update = self.commit_edit(rows);
                self.move_selection(rows.len(), columns.len(), 1, 0);
                update
            }
            KeyCode::Tab => {
                let update = self.commit_edit(rows);
                self.move_selection(rows.len(), columns.len(), 0, 1);
                update
            }
            _ => match self.buffer.read(key) {
                InputEvent::Submitted => self.commit_edit(rows),
                InputEvent::Canceled => {
                    self.cancel_edit();
                    None
                }
                _ => None,
            },
        }
    }

    pub fn selected_row(&self, nrows: usize) -> Option<usize> {
        (nrows > 0).then(|| self.curser_row.min(nrows - 1))
    }

    pub fn selected_column(&self) -> usize {
        self.curser_column
    }

    pub fn move_selection(&mut self, nrows: usize, ncols: usize, drow: isize, dcol: isize) {
        self.curser_row = Self::step(self.curser_row, drow, nrows);
        self.curser_column = Self::step(self.curser_column, dcol, ncols);
    }

    pub fn select_first(&mut self) {
        self.curser_row = 0;
    }

    pub fn select_last(&mut self, nrows: usize) {
        self.curser_row = nrows.saturating_sub(1);
    }

    /// Keeps the selection inside a row sequence that may have shrunk.
    pub fn clamp(&mut self, nrows: usize) {
        self.curser_row = self.curser_row.min(nrows.saturating_sub(1));
    }

    fn step(pos: usize, delta: isize, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        pos.saturating_add_signed(delta).min(len - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CellValue;
    use ratatui::crossterm::event::KeyModifiers;

    fn columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("fileName", "File name").editable(true),
            ColumnDescriptor::new("uploadDate", "Date"),
            ColumnDescriptor::new("status", "Status"),
        ]
    }

    fn rows() -> Vec<Row> {
        vec![
            Row::new("1")
                .with("fileName", "Term Sheet 2025-A")
                .with("uploadDate", "2025-04-01")
                .with("status", "Validated"),
            Row::new("2")
                .with("fileName", "Contract")
                .with("uploadDate", "2025-03-25")
                .with("status", "Pending"),
        ]
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn render_produces_one_row_per_record_and_one_cell_per_column() {
        let table = DataTable::new();
        let view = table.render(&columns(), &rows());
        assert_eq!(view.headers, vec!["File name", "Date", "Status"]);
        assert_eq!(view.body.len(), 2);
        assert!(view.body.iter().all(|r| r.len() == 3));
        assert_eq!(view.body[1][0], "Contract");
    }

    #[test]
    fn render_adds_action_cell_when_renderer_present() {
        let table = DataTable::new().with_actions(|row, idx| vec![format!("#{idx}"), row.id().to_string()]);
        let view = table.render(&columns(), &rows());
        assert_eq!(view.headers.last().map(String::as_str), Some(ACTIONS_HEADER));
        assert!(view.body.iter().all(|r| r.len() == 4));
        assert_eq!(view.body[1][3], "#1 2");
    }

    #[test]
    fn render_empty_rows_keeps_headers() {
        let table = DataTable::new().with_actions(|_, _| vec!["x".into()]);
        let view = table.render(&columns(), &[]);
        assert_eq!(view.headers.len(), 4);
        assert!(view.body.is_empty());
        assert_eq!(view.selected_row, None);
    }

    #[test]
    fn begin_edit_on_non_editable_column_is_noop() {
        let mut table = DataTable::new().with_row_updates();
        assert_eq!(table.begin_edit(&columns(), &rows(), 0, "status"), None);
        assert!(table.edit_cursor().is_none());
    }

    #[test]
    fn begin_edit_without_update_receiver_is_noop() {
        let mut table = DataTable::new();
        table.begin_edit(&columns(), &rows(), 0, "fileName");
        assert!(table.edit_cursor().is_none());
        assert!(!table.render(&columns(), &rows()).editable[0]);
    }

    #[test]
    fn failed_begin_keeps_previous_cursor() {
        let mut table = DataTable::new().with_row_updates();
        table.begin_edit(&columns(), &rows(), 1, "fileName");
        let before = table.edit_cursor().cloned();
        table.begin_edit(&columns(), &rows(), 0, "uploadDate");
        assert_eq!(table.edit_cursor().cloned(), before);
    }

    #[test]
    fn begin_edit_seeds_buffer_with_cell_value() {
        let mut table = DataTable::new().with_row_updates();
        table.begin_edit(&columns(), &rows(), 1, "fileName");
        assert_eq!(table.edit_buffer(), "Contract");
        let cursor = table.edit_cursor().unwrap();
        assert_eq!(cursor.row_index, 1);
        assert_eq!(cursor.row_id.as_str(), "2");
        assert_eq!(cursor.column_key, "fileName");
    }

    #[test]
    fn commit_overwrites_only_the_edited_field() {
        let data = rows();
        let mut table = DataTable::new().with_row_updates();
        table.begin_edit(&columns(), &data, 0, "fileName");
        table.edit_key(key(KeyCode::End), &columns(), &data);
        for c in " v2".chars() {
            table.edit_key(key(KeyCode::Char(c)), &columns(), &data);
        }
        let update = table.edit_key(key(KeyCode::Enter), &columns(), &data).unwrap();

        let mut expected = data[0].clone();
        expected.set("fileName", CellValue::from("Term Sheet 2025-A v2"));
        assert_eq!(update.index, 0);
        assert_eq!(update.id.as_str(), "1");
        assert_eq!(update.row, expected);
        assert!(table.edit_cursor().is_none());

        // a second commit has nothing to report
        assert_eq!(table.commit_edit(&data), None);
    }

    #[test]
    fn cancel_never_reports_an_update() {
        let data = rows();
        let mut table = DataTable::new().with_row_updates();
        table.begin_edit(&columns(), &data, 0, "fileName");
        table.edit_key(key(KeyCode::Char('x')), &columns(), &data);
        assert_eq!(table.edit_key(key(KeyCode::Esc), &columns(), &data), None);
        assert!(table.edit_cursor().is_none());
        assert_eq!(table.commit_edit(&data), None);
    }

    #[test]
    fn beginning_a_new_edit_commits_the_previous_one() {
        let data = rows();
        let mut table = DataTable::new().with_row_updates();
        table.begin_edit(&columns(), &data, 0, "fileName");
        table.edit_key(key(KeyCode::Char('!')), &columns(), &data);
        let update = table.begin_edit(&columns(), &data, 1, "fileName").unwrap();
        assert_eq!(update.id.as_str(), "1");
        assert_eq!(update.row.text("fileName"), "Term Sheet 2025-A!");
        assert_eq!(table.edit_cursor().unwrap().row_index, 1);
    }

    #[test]
    fn commit_resolves_against_current_rows() {
        let data = rows();
        let mut table = DataTable::new().with_row_updates();
        table.begin_edit(&columns(), &data, 1, "fileName");

        // the row moved to the front before the commit
        let shifted = vec![data[1].clone()];
        let update = table.commit_edit(&shifted).unwrap();
        assert_eq!(update.index, 0);
        assert_eq!(update.id.as_str(), "2");

        // and vanished entirely
        table.begin_edit(&columns(), &data, 1, "fileName");
        assert_eq!(table.commit_edit(&data[..1]), None);
    }

    #[test]
    fn opaque_cells_cannot_be_edited() {
        let data = vec![Row::new("1").with("fileName", CellValue::Opaque("<blob>".into()))];
        let mut table = DataTable::new().with_row_updates();
        table.begin_edit(&columns(), &data, 0, "fileName");
        assert!(!table.is_editing());
    }

    #[test]
    fn moving_down_while_editing_commits() {
        let data = rows();
        let mut table = DataTable::new().with_row_updates();
        table.begin_edit_selected(&columns(), &data);
        let update = table.edit_key(key(KeyCode::Down), &columns(), &data);
        assert!(update.is_some());
        assert_eq!(table.selected_row(data.len()), Some(1));
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut table = DataTable::new();
        table.move_selection(2, 3, 5, 5);
        assert_eq!(table.selected_row(2), Some(1));
        assert_eq!(table.selected_column(), 2);
        table.move_selection(2, 3, -9, -9);
        assert_eq!(table.selected_row(2), Some(0));
        assert_eq!(table.selected_column(), 0);
        table.select_last(2);
        table.clamp(1);
        assert_eq!(table.selected_row(1), Some(0));
    }

    #[test]
    fn render_shows_edit_buffer_in_place() {
        let mut table = DataTable::new().with_row_updates();
        table.begin_edit(&columns(), &rows(), 1, "fileName");
        let view = table.render(&columns(), &rows());
        let (row, col, buffer, cursor) = view.editing.unwrap();
        assert_eq!((row, col), (1, 0));
        assert_eq!(buffer, table.edit_buffer());
        assert_eq!(cursor, buffer.chars().count());
    }
}
