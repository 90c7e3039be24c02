//! Domain records and the seeded views built from them.

use std::fmt;

use crate::list_view::{FilterMode, ListView, Matching};
use crate::record::{ColumnDescriptor, Row};
use crate::table::DataTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetStatus {
    Validated,
    Error,
    Pending,
}

impl fmt::Display for SheetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SheetStatus::Validated => "Validated",
            SheetStatus::Error => "Error",
            SheetStatus::Pending => "Pending",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseStatus {
    Valid,
    Invalid,
    Warning,
}

impl ClauseStatus {
    pub fn icon(&self) -> &'static str {
        match self {
            ClauseStatus::Valid => "✔",
            ClauseStatus::Invalid => "✘",
            ClauseStatus::Warning => "⚠",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "Valid" => Some(ClauseStatus::Valid),
            "Invalid" => Some(ClauseStatus::Invalid),
            "Warning" => Some(ClauseStatus::Warning),
            _ => None,
        }
    }
}

impl fmt::Display for ClauseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClauseStatus::Valid => "Valid",
            ClauseStatus::Invalid => "Invalid",
            ClauseStatus::Warning => "Warning",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TermSheet {
    pub id: String,
    pub file_name: String,
    pub upload_date: String,
    pub status: SheetStatus,
}

impl TermSheet {
    pub fn new(id: &str, file_name: &str, upload_date: &str, status: SheetStatus) -> Self {
        Self {
            id: id.to_string(),
            file_name: file_name.to_string(),
            upload_date: upload_date.to_string(),
            status,
        }
    }
}

impl From<TermSheet> for Row {
    fn from(sheet: TermSheet) -> Self {
        Row::new(sheet.id)
            .with("fileName", sheet.file_name)
            .with("uploadDate", sheet.upload_date)
            .with("status", sheet.status.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationClause {
    pub id: String,
    pub clause: String,
    pub date: String,
    pub status: ClauseStatus,
}

impl ValidationClause {
    pub fn new(id: &str, clause: &str, date: &str, status: ClauseStatus) -> Self {
        Self {
            id: id.to_string(),
            clause: clause.to_string(),
            date: date.to_string(),
            status,
        }
    }
}

impl From<ValidationClause> for Row {
    fn from(clause: ValidationClause) -> Self {
        Row::new(clause.id)
            .with("clause", clause.clause)
            .with("date", clause.date)
            .with("status", clause.status.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStat {
    pub id: &'static str,
    pub title: &'static str,
    pub count: u32,
    pub icon: &'static str,
}

pub fn dashboard_stats() -> Vec<DashboardStat> {
    vec![
        DashboardStat {
            id: "1",
            title: "Validated Term Sheets",
            count: 42,
            icon: "✔",
        },
        DashboardStat {
            id: "2",
            title: "Errors Caught",
            count: 12,
            icon: "⚠",
        },
        DashboardStat {
            id: "3",
            title: "Pending Validations",
            count: 5,
            icon: "◷",
        },
    ]
}

const SHEET_FILTERS: [FilterMode; 3] = [
    FilterMode::new("fileName", "Name", Matching::CaseInsensitive),
    FilterMode::new("uploadDate", "Date", Matching::Plain),
    FilterMode::new("status", "Status", Matching::CaseInsensitive),
];

const CLAUSE_FILTERS: [FilterMode; 3] = [
    FilterMode::new("clause", "Clause", Matching::CaseInsensitive),
    FilterMode::new("date", "Date", Matching::Plain),
    FilterMode::new("status", "Status", Matching::CaseInsensitive),
];

fn sheet_actions() -> DataTable {
    DataTable::new()
        .with_row_updates()
        .with_actions(|_, _| vec!["[v]iew".into(), "[e]dit".into(), "[d]elete".into()])
}

fn seed_sheets(n: usize) -> Vec<Row> {
    [
        TermSheet::new("1", "Term Sheet 2025-A", "2025-04-01", SheetStatus::Validated),
        TermSheet::new("2", "Financial Terms Q1", "2025-03-28", SheetStatus::Error),
        TermSheet::new("3", "Contract Agreement", "2025-03-25", SheetStatus::Pending),
        TermSheet::new("4", "Partnership Terms", "2025-03-20", SheetStatus::Validated),
    ]
    .into_iter()
    .take(n)
    .map(Row::from)
    .collect()
}

/// Dashboard list of every uploaded term sheet.
pub fn upload_history() -> ListView {
    let columns = vec![
        ColumnDescriptor::new("fileName", "File name").width(40).editable(true),
        ColumnDescriptor::new("uploadDate", "Date").width(20),
        ColumnDescriptor::new("status", "Status").width(20),
    ];
    ListView::new(
        "Upload History",
        columns,
        SHEET_FILTERS.to_vec(),
        seed_sheets(4),
        sheet_actions(),
    )
    .with_delete()
}

/// Upload page list. New uploads are appended here.
pub fn previous_uploads() -> ListView {
    let columns = vec![
        ColumnDescriptor::new("fileName", "File name").editable(true),
        ColumnDescriptor::new("uploadDate", "Date"),
        ColumnDescriptor::new("status", "Status"),
    ];
    ListView::new(
        "View Previous Uploads",
        columns,
        SHEET_FILTERS.to_vec(),
        seed_sheets(3),
        sheet_actions(),
    )
    .with_delete()
}

pub fn validation_report() -> ListView {
    let columns = vec![
        ColumnDescriptor::new("clause", "Clause").width(40).editable(true),
        ColumnDescriptor::new("date", "Date").width(20),
        ColumnDescriptor::new("status", "Status").width(20),
    ];
    let clauses = [
        ValidationClause::new("1", "Payment Terms Section 3.1", "2025-04-01", ClauseStatus::Valid),
        ValidationClause::new("2", "Warranty Section 5.2", "2025-03-28", ClauseStatus::Invalid),
        ValidationClause::new("3", "Term Length Section 1.3", "2025-03-25", ClauseStatus::Warning),
        ValidationClause::new("4", "Confidentiality Section 7.1", "2025-03-20", ClauseStatus::Valid),
    ];
    let table = DataTable::new().with_row_updates().with_actions(|row, _| {
        let icon = ClauseStatus::parse(&row.text("status"))
            .map(|s| s.icon())
            .unwrap_or(" ");
        vec![icon.to_string(), "[e]dit".into()]
    });
    ListView::new(
        "VALIDATION REPORT",
        columns,
        CLAUSE_FILTERS.to_vec(),
        clauses.into_iter().map(Row::from).collect(),
        table,
    )
}

/// Next free numeric id in a seeded list.
pub fn next_id(rows: &[Row]) -> String {
    let max = rows
        .iter()
        .filter_map(|r| r.id().as_str().parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    (max + 1).to_string()
}
