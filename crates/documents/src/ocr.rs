use anyhow::{Context, Result};
use async_trait::async_trait;
use compliance_core::config::OcrConfig;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Tesseract page segmentation used for a recognition call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLayout {
    /// Tesseract's automatic segmentation.
    Auto,
    /// A single uniform block of text (`--oem 3 --psm 6`), used for scanned forms.
    SingleBlock,
}

/// Optical character recognition plus the PDF rasterization it depends on.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &Path, layout: PageLayout) -> Result<String>;

    /// Renders PDF pages to PNG files in `out_dir`, returned in page order.
    async fn rasterize_pdf(
        &self,
        pdf: &Path,
        out_dir: &Path,
        first_page_only: bool,
    ) -> Result<Vec<PathBuf>>;
}

/// OCR through the `tesseract` and `pdftoppm` command-line tools.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    tesseract_path: PathBuf,
    pdftoppm_path: PathBuf,
    dpi: u32,
    timeout: Duration,
}

impl TesseractCli {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            tesseract_path: PathBuf::from(&config.tesseract_path),
            pdftoppm_path: PathBuf::from(&config.pdftoppm_path),
            dpi: config.dpi,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    fn tesseract_args(image: &Path, layout: PageLayout) -> Vec<String> {
        let mut args = vec![image.to_string_lossy().to_string(), "stdout".to_string()];
        if layout == PageLayout::SingleBlock {
            args.extend(["--oem", "3", "--psm", "6"].map(String::from));
        }
        args
    }

    async fn run(&self, program: &Path, args: &[String]) -> Result<Vec<u8>> {
        debug!("Running {} {:?}", program.display(), args);
        let child = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to execute '{}'", program.display()))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .with_context(|| {
                format!(
                    "'{}' timed out after {} seconds",
                    program.display(),
                    self.timeout.as_secs()
                )
            })?
            .with_context(|| format!("Failed to wait for '{}'", program.display()))?;

        if !output.status.success() {
            anyhow::bail!(
                "'{}' failed with return code {}: {}",
                program.display(),
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl OcrEngine for TesseractCli {
    async fn recognize(&self, image: &Path, layout: PageLayout) -> Result<String> {
        let args = Self::tesseract_args(image, layout);
        let stdout = self.run(&self.tesseract_path, &args).await?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    async fn rasterize_pdf(
        &self,
        pdf: &Path,
        out_dir: &Path,
        first_page_only: bool,
    ) -> Result<Vec<PathBuf>> {
        let prefix = out_dir.join("page");
        let mut args = vec!["-r".to_string(), self.dpi.to_string(), "-png".to_string()];
        if first_page_only {
            args.extend(["-f", "1", "-l", "1"].map(String::from));
        }
        args.push(pdf.to_string_lossy().to_string());
        args.push(prefix.to_string_lossy().to_string());

        self.run(&self.pdftoppm_path, &args).await?;
        rendered_pages(out_dir).await
    }
}

/// Lists `page-N.png` files written by pdftoppm, ordered by page number.
async fn rendered_pages(out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pages = Vec::new();
    let mut entries = tokio::fs::read_dir(out_dir)
        .await
        .with_context(|| format!("Failed to list {}", out_dir.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let Some(number) = stem.strip_prefix("page-").and_then(|n| n.parse::<u32>().ok())
        else {
            continue;
        };
        if path.extension().and_then(|e| e.to_str()) == Some("png") {
            pages.push((number, path));
        }
    }

    pages.sort_by_key(|(number, _)| *number);
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}
