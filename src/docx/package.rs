//! OOXML container I/O
//!
//! A DOCX file is a zip bundle of XML parts. The package keeps the entries
//! as an ordered list so the output archive preserves the input layout;
//! media entries are stored uncompressed the way word processors emit them.

use crate::domain::errors::{DocumentError, DocveilError, Result};
use std::io::{Cursor, Read, Write};
use std::path::Path;

/// Main WordprocessingML part
pub const MAIN_DOCUMENT: &str = "word/document.xml";

/// Core properties part (document metadata)
pub const CORE_PROPERTIES: &str = "docProps/core.xml";

/// Ordered list of `(entry_name, bytes)` read from a DOCX archive
#[derive(Debug, Clone)]
pub struct DocxPackage {
    entries: Vec<(String, Vec<u8>)>,
}

impl DocxPackage {
    /// Open a DOCX file from disk
    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| {
            DocumentError::UnreadableArchive(format!("{}: {}", path.display(), e))
        })?;
        Self::from_bytes(&data)
    }

    /// Read a DOCX archive from memory
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(Cursor::new(data))
            .map_err(|e| DocumentError::UnreadableArchive(e.to_string()))?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| DocumentError::UnreadableArchive(e.to_string()))?;
            let name = entry.name().to_string();
            let mut buf = Vec::new();
            entry
                .read_to_end(&mut buf)
                .map_err(|e| DocumentError::UnreadableArchive(format!("{name}: {e}")))?;
            entries.push((name, buf));
        }

        if !entries.iter().any(|(n, _)| n == MAIN_DOCUMENT) {
            return Err(DocumentError::MissingPart(MAIN_DOCUMENT.to_string()).into());
        }

        Ok(Self { entries })
    }

    /// Raw bytes of a part, if present
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d.as_slice())
    }

    /// UTF-8 content of a required part
    pub fn part_xml(&self, name: &str) -> Result<String> {
        let data = self
            .part(name)
            .ok_or_else(|| DocumentError::MissingPart(name.to_string()))?;
        String::from_utf8(data.to_vec()).map_err(|e| {
            DocumentError::MalformedXml {
                part: name.to_string(),
                detail: format!("invalid UTF-8: {e}"),
            }
            .into()
        })
    }

    /// Replace a part's content in place
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        if let Some((_, existing)) = self.entries.iter_mut().find(|(n, _)| n == name) {
            *existing = data;
        } else {
            self.entries.push((name.to_string(), data));
        }
    }

    /// Names of every entry, in archive order
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Header parts (`word/header*.xml`) in numeric order
    pub fn header_parts(&self) -> Vec<String> {
        self.numbered_parts("word/header")
    }

    /// Footer parts (`word/footer*.xml`) in numeric order
    pub fn footer_parts(&self) -> Vec<String> {
        self.numbered_parts("word/footer")
    }

    fn numbered_parts(&self, prefix: &str) -> Vec<String> {
        let mut names: Vec<(u32, String)> = self
            .entries
            .iter()
            .filter(|(n, _)| n.starts_with(prefix) && n.ends_with(".xml"))
            .map(|(n, _)| {
                let digits: String = n.chars().filter(|c| c.is_ascii_digit()).collect();
                (digits.parse::<u32>().unwrap_or(0), n.clone())
            })
            .collect();
        names.sort();
        names.into_iter().map(|(_, n)| n).collect()
    }

    /// Write the archive to disk. On failure any partial file is removed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Err(e) = self.write_to(path) {
            let _ = std::fs::remove_file(path);
            return Err(e);
        }
        Ok(())
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .map_err(|e| DocveilError::Output(format!("{}: {}", path.display(), e)))?;
        let mut zip = zip::ZipWriter::new(file);

        let deflated = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        let stored = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);

        for (name, data) in &self.entries {
            let opts = if name.starts_with("word/media/") {
                stored
            } else {
                deflated
            };
            zip.start_file(name.as_str(), opts)
                .map_err(|e| DocveilError::Output(format!("{name}: {e}")))?;
            zip.write_all(data)
                .map_err(|e| DocveilError::Output(format!("{name}: {e}")))?;
        }
        zip.finish()
            .map_err(|e| DocveilError::Output(e.to_string()))?;
        Ok(())
    }

    /// Serialize the archive to memory
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            let deflated = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated);
            for (name, data) in &self.entries {
                zip.start_file(name.as_str(), deflated)
                    .map_err(|e| DocveilError::Output(format!("{name}: {e}")))?;
                zip.write_all(data)
                    .map_err(|e| DocveilError::Output(format!("{name}: {e}")))?;
            }
            zip.finish()
                .map_err(|e| DocveilError::Output(e.to_string()))?;
        }
        Ok(buf.into_inner())
    }
}
