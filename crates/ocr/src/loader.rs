use image::DynamicImage;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Cannot identify image file: {0}")]
    Unrecognized(String),
}

impl From<image::ImageError> for LoadError {
    fn from(e: image::ImageError) -> Self {
        LoadError::Unrecognized(e.to_string())
    }
}

/// Opens a source file as an image handle.
pub trait ImageLoader {
    fn load(&self, path: &Path) -> Result<DynamicImage, LoadError>;
}

/// Decodes files from disk with the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageFileLoader;

impl ImageLoader for ImageFileLoader {
    fn load(&self, path: &Path) -> Result<DynamicImage, LoadError> {
        Ok(image::open(path)?)
    }
}
