use super::error::LoadError;
use super::models::Conversation;
use super::parser::ExportParser;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

const CONVERSATIONS_DOCUMENT: &str = "conversations.json";

/// Read a ChatGPT export and return its conversations, newest first.
///
/// Accepts the export `.zip` (the first member named `*conversations.json` is
/// used) or a bare `conversations.json`.
pub fn load(path: &Path) -> Result<Vec<Conversation>, LoadError> {
    info!("Loading ChatGPT export from: {}", path.display());

    let json = match path.extension().and_then(|e| e.to_str()) {
        Some("zip") => read_archive(path)?,
        Some("json") => read_json_file(path)?,
        other => {
            let ext = other.map(|e| format!(".{e}")).unwrap_or_default();
            return Err(LoadError::UnsupportedFormat(ext));
        }
    };

    ExportParser::new().parse_export(&json)
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json_file(path: &Path) -> Result<Value, LoadError> {
    let reader = BufReader::new(open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

fn read_archive(path: &Path) -> Result<Value, LoadError> {
    let mut archive = zip::ZipArchive::new(BufReader::new(open(path)?))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if !entry.name().ends_with(CONVERSATIONS_DOCUMENT) {
            continue;
        }

        debug!("Reading {} from archive", entry.name());
        let mut raw = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut raw)
            .map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        return Ok(serde_json::from_slice(&raw)?);
    }

    Err(LoadError::MissingConversations)
}
