// THEORY:
// The `composite` module turns an RGB-capture sprite into the sprite a composite
// video signal would show. Composite output smears each pixel into its right-hand
// neighbour, so the template is rebuilt from overlapping horizontal pairs: column
// `x` of the result is `Pixel::blend` of source columns `x` and `x + 1`. The
// result is one pixel narrower than the source and exactly as tall.
//
// Every output pixel depends only on its two source pixels, so the transform is
// a pure function of the input. Any colour type the decoder produced is first
// normalised to 8-bit RGBA; sources without an alpha channel come out opaque.

pub mod composite {
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::error::{CompositeError, Result};
    use image::{DynamicImage, RgbaImage};

    /// Width of the composite for a source of `source_width` pixels.
    pub fn composite_width(source_width: u32) -> Result<u32> {
        source_width
            .checked_sub(1)
            .ok_or(CompositeError::DegenerateWidth {
                width: source_width,
            })
    }

    /// Blends any decoded image into its composite.
    pub fn blend_image(image: &DynamicImage) -> Result<RgbaImage> {
        match image {
            DynamicImage::ImageRgba8(rgba) => blend_rgba(rgba),
            other => blend_rgba(&other.to_rgba8()),
        }
    }

    /// Blends an RGBA image into its composite. A 1-pixel-wide source yields an
    /// empty `0 x height` image.
    pub fn blend_rgba(source: &RgbaImage) -> Result<RgbaImage> {
        let width = composite_width(source.width())?;
        let height = source.height();
        let mut result = RgbaImage::new(width, height);

        for y in 0..height {
            for x in 0..width {
                let left = Pixel::from(*source.get_pixel(x, y));
                let right = Pixel::from(*source.get_pixel(x + 1, y));
                result.put_pixel(x, y, left.blend(&right).into());
            }
        }

        Ok(result)
    }
}
