use std::path::Path;

/// File formats the pipeline can read text from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Text,
    Image,
}

impl DocumentKind {
    /// Detects the kind from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::Text),
            "png" | "jpg" | "jpeg" => Some(Self::Image),
            _ => None,
        }
    }

    /// Regulation sources accepted by ingestion. Images are only used as proofs.
    pub fn is_rule_source(self) -> bool {
        matches!(self, Self::Pdf | Self::Docx | Self::Text)
    }
}
