use crate::kind::DocumentKind;
use crate::ocr::{OcrEngine, PageLayout};
use anyhow::{Context, Result};
use image::{GrayImage, ImageFormat};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

const WORD_NAMESPACE: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Extracts plain text from a supported document. The result is trimmed; a
/// readable document without text yields an empty string.
pub async fn extract_text(path: &Path, ocr: &dyn OcrEngine) -> Result<String> {
    let kind = DocumentKind::from_path(path)
        .with_context(|| format!("Unsupported document type: {}", path.display()))?;

    let text = match kind {
        DocumentKind::Pdf => extract_pdf_text(path, ocr).await?,
        DocumentKind::Docx => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            extract_docx_text(&bytes)?
        }
        DocumentKind::Text => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        DocumentKind::Image => extract_image_text(path, ocr).await?,
    };

    Ok(text.trim().to_string())
}

/// Embedded PDF text, falling back to OCR of every rendered page when the PDF
/// has no text layer.
pub async fn extract_pdf_text(path: &Path, ocr: &dyn OcrEngine) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    // pdf-extract panics on some malformed files; a blocking task contains that.
    let embedded = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| anyhow::anyhow!("PDF text extraction aborted: {}", e))
        .and_then(|result| result.context("Failed to extract text from PDF"));

    match embedded {
        Ok(text) if !text.trim().is_empty() => return Ok(text),
        Ok(_) => info!("No embedded text in {}, running OCR", path.display()),
        Err(e) => warn!("{:#}; running OCR on {}", e, path.display()),
    }

    let pages_dir = tempfile::tempdir().context("Failed to create temporary directory")?;
    let pages = ocr.rasterize_pdf(path, pages_dir.path(), false).await?;

    let mut text = String::new();
    for page in &pages {
        text.push_str(&ocr.recognize(page, PageLayout::Auto).await?);
        text.push('\n');
    }
    Ok(text)
}

/// Paragraph text of `word/document.xml`, one paragraph per line.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .context("Failed to open DOCX archive")?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .context("DOCX archive has no word/document.xml")?
        .read_to_string(&mut xml)
        .context("Failed to read word/document.xml")?;

    let document = roxmltree::Document::parse(&xml).context("Failed to parse DOCX XML")?;

    let paragraphs: Vec<String> = document
        .descendants()
        .filter(|node| is_word_element(node, "p"))
        .map(|paragraph| {
            let mut text = String::new();
            for node in paragraph.descendants() {
                if is_word_element(&node, "t") {
                    text.push_str(node.text().unwrap_or_default());
                } else if is_word_element(&node, "tab") {
                    text.push('\t');
                }
            }
            text
        })
        .collect();

    Ok(paragraphs.join("\n"))
}

fn is_word_element(node: &roxmltree::Node, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && node.tag_name().namespace() == Some(WORD_NAMESPACE)
}

/// Grayscale + Otsu binarization, then OCR as a single text block.
pub async fn extract_image_text(path: &Path, ocr: &dyn OcrEngine) -> Result<String> {
    let source = path.to_path_buf();
    let binarized = tokio::task::spawn_blocking(move || -> Result<tempfile::NamedTempFile> {
        let image = image::open(&source)
            .with_context(|| format!("Failed to open image {}", source.display()))?;
        let binary = binarize(&image.to_luma8());

        let file = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .context("Failed to create temporary image")?;
        binary
            .save_with_format(file.path(), ImageFormat::Png)
            .context("Failed to write preprocessed image")?;
        Ok(file)
    })
    .await
    .map_err(|e| anyhow::anyhow!("Image preprocessing aborted: {}", e))??;

    ocr.recognize(binarized.path(), PageLayout::SingleBlock)
        .await
}

/// Global Otsu threshold: pixels above the level become white, the rest black.
pub fn binarize(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    threshold(gray, level, ThresholdType::Binary)
}
