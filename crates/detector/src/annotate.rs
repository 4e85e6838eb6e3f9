use crate::processing::post::Detection;
use image::{Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_hollow_rect_mut},
    rect::Rect,
};
use std::io::Cursor;

// Ultralytics default palette
const PALETTE: [[u8; 3]; 20] = [
    [0xFF, 0x38, 0x38],
    [0xFF, 0x9D, 0x97],
    [0xFF, 0x70, 0x1F],
    [0xFF, 0xB2, 0x1D],
    [0xCF, 0xD2, 0x31],
    [0x48, 0xF9, 0x0A],
    [0x92, 0xCC, 0x17],
    [0x3D, 0xDB, 0x86],
    [0x1A, 0x93, 0x34],
    [0x00, 0xD4, 0xBB],
    [0x2C, 0x99, 0xA8],
    [0x00, 0xC2, 0xFF],
    [0x34, 0x45, 0x93],
    [0x64, 0x73, 0xFF],
    [0x00, 0x18, 0xEC],
    [0x84, 0x38, 0xFF],
    [0x52, 0x00, 0x85],
    [0xCB, 0x38, 0xFF],
    [0xFF, 0x95, 0xC8],
    [0xFF, 0x37, 0xC7],
];

pub fn class_color(class_id: usize) -> Rgb<u8> {
    Rgb(PALETTE[class_id % PALETTE.len()])
}

/// Line width proportional to the image size, never thinner than 2px.
pub fn line_width(width: u32, height: u32) -> u32 {
    (((width + height) as f32 / 2.0 * 0.003).round() as u32).max(2)
}

/// Copy of `frame` with one coloured box and label tab per detection.
pub fn draw_detections(frame: &RgbImage, detections: &[Detection]) -> RgbImage {
    let mut canvas = frame.clone();
    let (width, height) = canvas.dimensions();
    let lw = line_width(width, height);

    for det in detections {
        let color = class_color(det.class_id);

        let x = det.x1.floor() as i32;
        let y = det.y1.floor() as i32;
        let box_w = ((det.x2 - det.x1).round() as u32).max(1);
        let box_h = ((det.y2 - det.y1).round() as u32).max(1);

        for t in 0..lw {
            if box_w <= 2 * t || box_h <= 2 * t {
                break;
            }
            let rect = Rect::at(x + t as i32, y + t as i32).of_size(box_w - 2 * t, box_h - 2 * t);
            draw_hollow_rect_mut(&mut canvas, rect, color);
        }

        // Tab sits above the box, or inside it when the box touches the top edge
        let tab_h = lw * 4;
        let tab_w = box_w.min(lw * 16);
        let tab_y = if y >= tab_h as i32 { y - tab_h as i32 } else { y };
        draw_filled_rect_mut(&mut canvas, Rect::at(x, tab_y).of_size(tab_w, tab_h), color);
    }

    canvas
}

pub fn encode_jpeg(frame: &RgbImage) -> anyhow::Result<Vec<u8>> {
    let mut jpeg_bytes = Cursor::new(Vec::new());
    frame.write_to(&mut jpeg_bytes, image::ImageFormat::Jpeg)?;
    Ok(jpeg_bytes.into_inner())
}

/// Draw `detections` over `frame` and encode the result as JPEG.
pub fn render_annotated_jpeg(frame: &RgbImage, detections: &[Detection]) -> anyhow::Result<Vec<u8>> {
    let _s = common::span_debug!("render_annotated_jpeg");
    encode_jpeg(&draw_detections(frame, detections))
}
