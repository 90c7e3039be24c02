use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use ratatui::crossterm::event::KeyEvent;
use tracing::{info, trace};

use crate::domain::TSError;
use crate::inputter::{InputEvent, Inputter};

pub const ACCEPTED_EXTENSIONS: &str = ".pdf,.doc,.docx,.xls,.xlsx";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    PDF,
    DOC,
    DOCX,
    XLS,
    XLSX,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileInfo {
    pub path: PathBuf,
    pub file_size: u64,
    pub file_type: FileType,
}

impl FileInfo {
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string()
    }

    /// Display name without extension, used as the term sheet name.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathInput {
    Editing,
    Selected,
    Rejected,
    Canceled,
}

#[derive(Default)]
pub struct FileUploader {
    pub path_input: Inputter,
    selected: Option<FileInfo>,
}

impl FileUploader {
    pub fn selected(&self) -> Option<&FileInfo> {
        self.selected.as_ref()
    }

    /// Feeds a key to the path prompt. Enter tries to select the typed path.
    pub fn read(&mut self, key: KeyEvent) -> (PathInput, Option<TSError>) {
        match self.path_input.read(key) {
            InputEvent::Submitted => {
                let raw = self.path_input.value().to_string();
                match self.select(&raw) {
                    Ok(_) => (PathInput::Selected, None),
                    Err(e) => (PathInput::Rejected, Some(e)),
                }
            }
            InputEvent::Canceled => (PathInput::Canceled, None),
            _ => (PathInput::Editing, None),
        }
    }

    pub fn select(&mut self, raw: &str) -> Result<&FileInfo, TSError> {
        let expanded = shellexpand::full(raw.trim())
            .map_err(|e| TSError::LoadingFailed(e.to_string()))?;
        let file_info = get_file_info(PathBuf::from(expanded.as_ref()))?;
        trace!("Selected {:?}", file_info);
        Ok(&*self.selected.insert(file_info))
    }

    /// Takes the selected file. Without a selection there is nothing to upload.
    pub fn submit(&mut self) -> Option<FileInfo> {
        let file = self.selected.take()?;
        info!(
            "Uploading {} ({:?}, {} bytes)",
            file.path.display(),
            file.file_type,
            file.file_size
        );
        self.path_input.clear();
        Some(file)
    }
}

fn detect_file_type(path: &Path) -> Result<FileType, TSError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("PDF") => Ok(FileType::PDF),
        Some("DOC") => Ok(FileType::DOC),
        Some("DOCX") => Ok(FileType::DOCX),
        Some("XLS") => Ok(FileType::XLS),
        Some("XLSX") => Ok(FileType::XLSX),
        _ => Err(TSError::UnknownFileType),
    }
}

fn get_file_info(path: PathBuf) -> Result<FileInfo, TSError> {
    let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TSError::FileNotFound,
        ErrorKind::PermissionDenied => TSError::PermissionDenied,
        _ => TSError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(TSError::LoadingFailed("Not a file!".into()));
    }

    let file_type = detect_file_type(&path)?;

    Ok(FileInfo {
        path,
        file_size: metadata.len(),
        file_type,
    })
}
