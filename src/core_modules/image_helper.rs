pub mod image_helper {
    use crate::error::{CompositeError, Result};
    use image::{DynamicImage, ImageError, ImageFormat, ImageReader, RgbaImage};
    use std::io::Cursor;
    use std::path::Path;

    /// Decodes the image at `path`, trusting its contents over its extension.
    pub fn load(path: &Path) -> Result<DynamicImage> {
        let unreadable = |source: ImageError| CompositeError::UnreadableImage {
            path: path.to_path_buf(),
            source,
        };

        ImageReader::open(path)
            .map_err(|e| unreadable(e.into()))?
            .with_guessed_format()
            .map_err(|e| unreadable(e.into()))?
            .decode()
            .map_err(unreadable)
    }

    pub fn encode(image: &RgbaImage, format: ImageFormat) -> std::result::Result<Vec<u8>, ImageError> {
        let mut cursor = Cursor::new(Vec::new());
        image.write_to(&mut cursor, format)?;
        Ok(cursor.into_inner())
    }

    /// Saves `image` in the format implied by the extension of `path`.
    ///
    /// The file is only touched once encoding has fully succeeded.
    pub fn save(path: &Path, image: &RgbaImage) -> Result<()> {
        let failure = |source: ImageError| CompositeError::OutputWriteFailure {
            path: path.to_path_buf(),
            source,
        };

        let format = ImageFormat::from_path(path).map_err(failure)?;
        let bytes = encode(image, format).map_err(failure)?;
        std::fs::write(path, bytes).map_err(|e| failure(e.into()))
    }
}
