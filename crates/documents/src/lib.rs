pub mod blueprint;
pub mod crawl;
pub mod kind;
pub mod ocr;
pub mod text;

pub use blueprint::{estimate_area, parse_scale, AreaEstimate};
pub use crawl::{RegulationCrawler, ScrapedPage};
pub use kind::DocumentKind;
pub use ocr::{OcrEngine, PageLayout, TesseractCli};
pub use text::extract_text;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Regulation files (`.pdf`, `.docx`, `.txt`) directly inside `dir`, sorted by name.
pub fn list_rule_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read document directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            DocumentKind::from_path(path)
                .map(DocumentKind::is_rule_source)
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn should_list_only_rule_documents() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["b.txt", "a.pdf", "c.docx", "plan.png", "notes.md"] {
            std::fs::write(temp_dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(temp_dir.path().join("nested.txt")).unwrap();

        let files = list_rule_documents(temp_dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();

        assert_eq!(names, vec!["a.pdf", "b.txt", "c.docx"]);
    }

    #[test]
    fn should_fail_for_missing_directory() {
        assert!(list_rule_documents(Path::new("/nonexistent/documents")).is_err());
    }
}
