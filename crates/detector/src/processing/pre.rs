use common::span;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use image::RgbImage;
use ndarray::{Array, IxDyn};

const LETTERBOX_COLOR: u8 = 114;

/// Geometry needed to map model-space boxes back onto the original image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformParams {
    pub orig_width: u32,
    pub orig_height: u32,
    pub input_width: u32,
    pub input_height: u32,
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl TransformParams {
    pub fn to_original_x(&self, x: f32) -> f32 {
        ((x - self.offset_x) / self.scale)
            .max(0.0)
            .min(self.orig_width as f32)
    }

    pub fn to_original_y(&self, y: f32) -> f32 {
        ((y - self.offset_y) / self.scale)
            .max(0.0)
            .min(self.orig_height as f32)
    }
}

pub struct PreProcessor {
    pub input_size: (u32, u32),
    rgb_buffer: Vec<u8>,
    letterboxed_buffer: Vec<u8>,
}

impl PreProcessor {
    pub fn new(input_size: (u32, u32)) -> Self {
        Self {
            input_size,
            rgb_buffer: Vec::new(),
            letterboxed_buffer: vec![LETTERBOX_COLOR; (input_size.0 * input_size.1 * 3) as usize],
        }
    }

    /// Letterbox `image` into the model input and return the NCHW tensor.
    pub fn preprocess(
        &mut self,
        image: &RgbImage,
    ) -> anyhow::Result<(Array<f32, IxDyn>, TransformParams)> {
        let _s = span!("preprocess");

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            anyhow::bail!("Cannot preprocess an empty {}x{} image", width, height);
        }

        tracing::trace!(width, height, "Preprocessing image dimensions");

        self.rgb_buffer.clear();
        self.rgb_buffer.extend_from_slice(image.as_raw());

        let transform = self.resize_and_letterbox(width, height)?;
        let input = self.normalize();

        Ok((input, transform))
    }

    fn resize_and_letterbox(&mut self, width: u32, height: u32) -> anyhow::Result<TransformParams> {
        let (input_width, input_height) = self.input_size;

        let scale = (input_width as f32 / width as f32).min(input_height as f32 / height as f32);
        let new_width = ((width as f32 * scale) as u32).clamp(1, input_width);
        let new_height = ((height as f32 * scale) as u32).clamp(1, input_height);

        let offset_x = (input_width - new_width) / 2;
        let offset_y = (input_height - new_height) / 2;

        let src = Image::from_slice_u8(width, height, &mut self.rgb_buffer, PixelType::U8x3)?;
        let mut resized = Image::new(new_width, new_height, PixelType::U8x3);

        Resizer::new().resize(
            &src,
            &mut resized,
            &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
        )?;

        self.letterboxed_buffer.fill(LETTERBOX_COLOR);

        let resized_data = resized.buffer();
        let stride = input_width * 3;
        let row_len = (new_width * 3) as usize;

        for y in 0..new_height {
            let src_row = (y * new_width * 3) as usize;
            let dst_row = ((y + offset_y) * stride + offset_x * 3) as usize;

            self.letterboxed_buffer[dst_row..dst_row + row_len]
                .copy_from_slice(&resized_data[src_row..src_row + row_len]);
        }

        Ok(TransformParams {
            orig_width: width,
            orig_height: height,
            input_width,
            input_height,
            scale,
            offset_x: offset_x as f32,
            offset_y: offset_y as f32,
        })
    }

    fn normalize(&self) -> Array<f32, IxDyn> {
        let (width, height) = (self.input_size.0 as usize, self.input_size.1 as usize);
        let mut input = Array::zeros(IxDyn(&[1, 3, height, width]));

        for (i, pixel) in self.letterboxed_buffer.chunks_exact(3).enumerate() {
            let (y, x) = (i / width, i % width);
            input[[0, 0, y, x]] = pixel[0] as f32 / 255.0;
            input[[0, 1, y, x]] = pixel[1] as f32 / 255.0;
            input[[0, 2, y, x]] = pixel[2] as f32 / 255.0;
        }

        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn landscape_image_is_padded_vertically() {
        let mut pre = PreProcessor::new((64, 64));
        let image = RgbImage::from_pixel(64, 32, Rgb([255, 0, 0]));

        let (input, transform) = pre.preprocess(&image).unwrap();

        assert_eq!(input.shape(), &[1, 3, 64, 64]);
        assert_eq!(transform.scale, 1.0);
        assert_eq!(transform.offset_x, 0.0);
        assert_eq!(transform.offset_y, 16.0);

        // Padding rows keep the letterbox grey, image rows carry the red channel
        let grey = LETTERBOX_COLOR as f32 / 255.0;
        assert!((input[[0, 0, 0, 10]] - grey).abs() < 1e-6);
        assert!((input[[0, 0, 32, 10]] - 1.0).abs() < 1e-6);
        assert!(input[[0, 1, 32, 10]].abs() < 1e-6);
    }

    #[test]
    fn large_image_is_scaled_down() {
        let mut pre = PreProcessor::new((64, 64));
        let image = RgbImage::from_pixel(32, 128, Rgb([10, 20, 30]));

        let (_, transform) = pre.preprocess(&image).unwrap();

        assert_eq!(transform.scale, 0.5);
        assert_eq!(transform.offset_x, 24.0);
        assert_eq!(transform.offset_y, 0.0);
        assert_eq!(transform.orig_width, 32);
        assert_eq!(transform.orig_height, 128);
    }

    #[test]
    fn extreme_aspect_ratio_keeps_one_pixel() {
        let mut pre = PreProcessor::new((64, 64));
        let image = RgbImage::from_pixel(1, 1000, Rgb([0, 0, 0]));

        let (input, transform) = pre.preprocess(&image).unwrap();

        assert_eq!(input.shape(), &[1, 3, 64, 64]);
        assert!(transform.scale < 0.1);
    }

    #[test]
    fn inverse_transform_clamps_to_image() {
        let transform = TransformParams {
            orig_width: 100,
            orig_height: 50,
            input_width: 64,
            input_height: 64,
            scale: 0.64,
            offset_x: 0.0,
            offset_y: 16.0,
        };

        assert_eq!(transform.to_original_x(32.0), 50.0);
        assert_eq!(transform.to_original_y(0.0), 0.0);
        assert_eq!(transform.to_original_y(64.0), 50.0);
        assert_eq!(transform.to_original_x(-5.0), 0.0);
    }
}
