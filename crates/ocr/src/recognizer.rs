use image::DynamicImage;
use scanrename_core::TesseractConfig;
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image encode error: {0}")]
    ImageEncode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
}

/// Abstraction over an OCR engine: a loaded image in, the recognized text out.
pub trait TextRecognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

impl<F> TextRecognizer for F
where
    F: Fn(&DynamicImage) -> Result<String, OcrError>,
{
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        self(image)
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set string for every image.
pub struct MockRecognizer {
    pub text: String,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl TextRecognizer for MockRecognizer {
    fn recognize(&self, _image: &DynamicImage) -> Result<String, OcrError> {
        Ok(self.text.clone())
    }
}

// ── Command-line backend ───────────────────────────────────────────────────────

/// Runs an external `tesseract` executable on a temporary PNG copy of the image.
pub struct CommandRecognizer {
    command: String,
    data_path: Option<String>,
    lang: String,
}

impl CommandRecognizer {
    pub fn new(command: impl Into<String>, data_path: Option<String>, lang: &str) -> Self {
        Self { command: command.into(), data_path, lang: lang.to_string() }
    }

    pub fn from_config(config: &TesseractConfig) -> Self {
        Self::new(config.command.clone(), config.data_path.clone(), &config.lang)
    }
}

impl TextRecognizer for CommandRecognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let png = tempfile::Builder::new()
            .prefix("scanrename-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::ImageEncode(e.to_string()))?;
        image
            .save_with_format(png.path(), image::ImageFormat::Png)
            .map_err(|e| OcrError::ImageEncode(e.to_string()))?;

        let mut cmd = Command::new(&self.command);
        cmd.arg(png.path()).arg("stdout").arg("-l").arg(&self.lang);
        if let Some(dir) = &self.data_path {
            cmd.arg("--tessdata-dir").arg(dir);
        }

        let output = cmd
            .output()
            .map_err(|e| OcrError::Engine(format!("failed to run {}: {e}", self.command)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Engine(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrError, TextRecognizer};
    use image::DynamicImage;
    use leptess::LepTess;
    use scanrename_core::TesseractConfig;
    use std::io::Cursor;

    pub struct TesseractRecognizer {
        data_path: Option<String>,
        lang: String,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>, lang: &str) -> Self {
            Self { data_path, lang: lang.to_string() }
        }

        pub fn from_config(config: &TesseractConfig) -> Self {
            Self::new(config.data_path.clone(), &config.lang)
        }
    }

    impl TextRecognizer for TesseractRecognizer {
        fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
            let mut png = Vec::new();
            image
                .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
                .map_err(|e| OcrError::ImageEncode(e.to_string()))?;

            let mut lt = LepTess::new(self.data_path.as_deref(), &self.lang)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_image_from_mem(&png)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageBuffer, Luma};

    fn blank(width: u32) -> DynamicImage {
        let img: GrayImage = ImageBuffer::from_fn(width, 2, |_, _| Luma([255u8]));
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn mock_returns_preset_text() {
        let r = MockRecognizer::new("12/01/2023 Doe, Jane\nPk_4821_");
        assert_eq!(r.recognize(&blank(4)).unwrap(), "12/01/2023 Doe, Jane\nPk_4821_");
    }

    #[test]
    fn mock_ignores_image_content() {
        let r = MockRecognizer::new("hello");
        assert_eq!(r.recognize(&blank(1)).unwrap(), "hello");
        assert_eq!(r.recognize(&blank(9)).unwrap(), "hello");
    }

    #[test]
    fn closures_are_recognizers() {
        let r = |img: &DynamicImage| Ok::<_, OcrError>(format!("width {}", img.width()));
        assert_eq!(r.recognize(&blank(7)).unwrap(), "width 7");
    }

    #[cfg(unix)]
    #[test]
    fn command_backend_passes_png_and_language() {
        let r = CommandRecognizer::new("echo", None, "eng");
        let out = r.recognize(&blank(3)).unwrap();
        assert!(out.contains(".png stdout -l eng"), "got {out:?}");
    }

    #[cfg(unix)]
    #[test]
    fn command_backend_appends_tessdata_dir() {
        let r = CommandRecognizer::new("echo", Some("/opt/tessdata".into()), "deu");
        let out = r.recognize(&blank(3)).unwrap();
        assert!(out.trim_end().ends_with("-l deu --tessdata-dir /opt/tessdata"), "got {out:?}");
    }

    #[cfg(unix)]
    #[test]
    fn command_backend_failure_is_engine_error() {
        let r = CommandRecognizer::new("false", None, "eng");
        assert!(matches!(r.recognize(&blank(1)), Err(OcrError::Engine(_))));
    }

    #[test]
    fn missing_executable_is_engine_error() {
        let r = CommandRecognizer::new("scanrename-no-such-binary", None, "eng");
        assert!(matches!(r.recognize(&blank(1)), Err(OcrError::Engine(_))));
    }

    #[test]
    fn closure_errors_pass_through() {
        let r = |_: &DynamicImage| Err::<String, _>(OcrError::Engine("offline".into()));
        assert!(matches!(r.recognize(&blank(1)), Err(OcrError::Engine(_))));
    }
}
