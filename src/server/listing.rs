use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::server::paths;

/// Extensions offered through the text viewer. Download is offered for every
/// file regardless.
pub const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "log", "json", "xml", "ini", "cfg", "conf", "md", "sh",
];

#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub size: String,
    pub mod_time: String,
    pub is_dir: bool,
    pub is_text: bool,
    pub path: String,
}

/// Reads the immediate children of `dir` into sorted view-model entries.
/// `name` and `segments` locate the directory in URL space so each entry
/// carries its own virtual path. Entries whose metadata cannot be read are
/// skipped.
pub fn list(dir: &Path, name: &str, segments: &[String]) -> io::Result<Vec<FileEntry>> {
    let mut entries = Vec::new();

    for entry in fs::read_dir(dir)? {
        let Ok(entry) = entry else { continue };
        let Ok(metadata) = entry.metadata() else {
            continue;
        };

        let file_name = entry.file_name().to_string_lossy().into_owned();
        let mut child = segments.to_vec();
        child.push(file_name.clone());

        entries.push(FileEntry {
            path: paths::virtual_path(name, &child),
            size: if metadata.is_dir() {
                String::new()
            } else {
                format_size(metadata.len())
            },
            mod_time: metadata.modified().map(format_mod_time).unwrap_or_default(),
            is_dir: metadata.is_dir(),
            is_text: is_text_file(&file_name),
            name: file_name,
        });
    }

    sort_entries(&mut entries);

    Ok(entries)
}

/// Directories first, then case-insensitive ascending by name.
pub fn sort_entries(entries: &mut [FileEntry]) {
    entries.sort_by(|a, b| match (a.is_dir, b.is_dir) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    });
}

pub fn is_text_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| TEXT_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

pub fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.1} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.1} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.1} KB", size as f64 / KB as f64)
    } else {
        format!("{} B", size)
    }
}

fn format_mod_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}
