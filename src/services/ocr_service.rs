use crate::error::{AppError, AppResult};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Turns the pages of a PDF into text by looking at them rather than reading
/// their text layer.
pub trait OcrEngine: Send + Sync {
    /// Returns one string per page, in page order.
    fn recognize_pdf(&self, pdf_data: &[u8]) -> AppResult<Vec<String>>;

    fn is_available(&self) -> bool;
}

/// Rasterizes pages with poppler's `pdftoppm` and reads them with `tesseract`.
pub struct TesseractOcr {
    dpi: u32,
    language: String,
}

impl TesseractOcr {
    pub fn new(dpi: u32, language: impl Into<String>) -> Self {
        Self {
            dpi,
            language: language.into(),
        }
    }

    pub fn is_tesseract_available() -> bool {
        Command::new("tesseract")
            .arg("--version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    pub fn is_pdftoppm_available() -> bool {
        // pdftoppm prints its version to stderr and exits 0
        Command::new("pdftoppm")
            .arg("-v")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn rasterize(&self, pdf_path: &Path, out_dir: &Path) -> AppResult<Vec<PathBuf>> {
        let prefix = out_dir.join("page");
        let output = Command::new("pdftoppm")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg(pdf_path)
            .arg(&prefix)
            .output()
            .map_err(|e| AppError::ocr(format!("Failed to run pdftoppm: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::ocr(format!("pdftoppm failed: {}", stderr.trim())));
        }

        let mut pages: Vec<(usize, PathBuf)> = std::fs::read_dir(out_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter_map(|path| page_number(&path).map(|n| (n, path)))
            .collect();
        pages.sort_by_key(|(n, _)| *n);

        debug!("pdftoppm produced {} page images at {} DPI", pages.len(), self.dpi);
        Ok(pages.into_iter().map(|(_, path)| path).collect())
    }

    fn recognize_image(&self, image_path: &Path) -> AppResult<String> {
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|e| AppError::ocr(format!("Failed to run tesseract: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::ocr(format!("tesseract failed: {}", stderr.trim())));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new(200, "eng")
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize_pdf(&self, pdf_data: &[u8]) -> AppResult<Vec<String>> {
        let start = Instant::now();
        info!("Starting OCR extraction from PDF ({} bytes)", pdf_data.len());

        if !Self::is_tesseract_available() {
            return Err(AppError::ocr("Tesseract OCR not available on this system"));
        }
        if !Self::is_pdftoppm_available() {
            return Err(AppError::ocr("pdftoppm not available on this system"));
        }

        let workdir = tempfile::tempdir()
            .map_err(|e| AppError::ocr(format!("Failed to create temporary directory: {}", e)))?;
        let pdf_path = workdir.path().join("input.pdf");
        std::fs::write(&pdf_path, pdf_data)?;

        let images = self.rasterize(&pdf_path, workdir.path())?;
        if images.is_empty() {
            warn!("pdftoppm produced no page images");
        }

        let mut pages = Vec::with_capacity(images.len());
        for (index, image) in images.iter().enumerate() {
            let text = self.recognize_image(image)?;
            debug!(page = index + 1, chars = text.len(), "OCR page complete");
            pages.push(text);
        }

        info!(
            pages = pages.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "OCR extraction finished"
        );
        Ok(pages)
    }

    fn is_available(&self) -> bool {
        Self::is_tesseract_available() && Self::is_pdftoppm_available()
    }
}

/// `page-07.png` -> 7. Files that don't follow pdftoppm's naming are ignored.
fn page_number(path: &Path) -> Option<usize> {
    if path.extension().and_then(|e| e.to_str()) != Some("png") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    stem.strip_prefix("page-")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_numbers_sort_numerically_not_lexically() {
        assert_eq!(page_number(Path::new("/tmp/x/page-1.png")), Some(1));
        assert_eq!(page_number(Path::new("/tmp/x/page-010.png")), Some(10));
        assert_eq!(page_number(Path::new("/tmp/x/input.pdf")), None);
        assert_eq!(page_number(Path::new("/tmp/x/page-a.png")), None);
    }
}
