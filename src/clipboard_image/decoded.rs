//! # 解码结果模型
//!
//! `DecodedImage` 是链路中唯一的"归一化"图像表示：宽、高与 32 位 BGRA 像素
//! （自顶向下，行步长 `width * 4`）。剪贴板位图与图片文件都先转换到这里，
//! 再编码成容器文件或打包成 DIB。

use std::io::Write;

use image::codecs::bmp::BmpEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};

use super::ImageError;
use crate::config::ExportFormat;

/// 32 位 BGRA、自顶向下的内存位图。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    bgra: Vec<u8>,
}

fn expected_len(width: u32, height: u32) -> Result<usize, ImageError> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(4))
        .ok_or_else(|| ImageError::ResourceLimit("图片尺寸导致内存溢出风险".to_string()))
}

/// RGBA 与 BGRA 互转（交换 R/B 通道，原地）。
fn swap_red_blue(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
}

impl DecodedImage {
    /// 由 BGRA 字节构建，长度必须恰好为 `width * height * 4`。
    pub fn from_bgra(width: u32, height: u32, bgra: Vec<u8>) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidBitmap(format!("图片尺寸为零：{}x{}", width, height)));
        }
        let expected = expected_len(width, height)?;
        if bgra.len() != expected {
            return Err(ImageError::Decode(format!(
                "像素长度不匹配: 期望 {} 实际 {}",
                expected,
                bgra.len()
            )));
        }
        Ok(Self { width, height, bgra })
    }

    /// 由 RGBA 字节构建。
    pub fn from_rgba(width: u32, height: u32, mut rgba: Vec<u8>) -> Result<Self, ImageError> {
        swap_red_blue(&mut rgba);
        Self::from_bgra(width, height, rgba)
    }

    /// 任意解码结果转换为 BGRA（等价于不抖动的格式转换）。
    pub fn from_dynamic(image: DynamicImage) -> Result<Self, ImageError> {
        let rgba = image.into_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba(width, height, rgba.into_raw())
    }

    /// 纯色图像，`color` 为 BGRA。
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut bgra = Vec::with_capacity(count * 4);
        for _ in 0..count {
            bgra.extend_from_slice(&color);
        }
        Self { width, height, bgra }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    /// BGRA 像素字节。
    pub fn pixels(&self) -> &[u8] {
        &self.bgra
    }

    /// 读取 `(x, y)` 处像素（BGRA），越界返回 `None`。
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = y as usize * self.stride() + x as usize * 4;
        let px = &self.bgra[at..at + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// 转回 RGBA 字节，供编码器使用。
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut rgba = self.bgra.clone();
        swap_red_blue(&mut rgba);
        rgba
    }

    /// 按指定容器格式编码到 `writer`。
    pub fn encode<W: Write>(&self, format: ExportFormat, mut writer: W) -> Result<(), ImageError> {
        let rgba = self.to_rgba();
        match format {
            ExportFormat::Png => PngEncoder::new(&mut writer)
                .write_image(&rgba, self.width, self.height, ExtendedColorType::Rgba8)
                .map_err(|e| ImageError::Encode(format!("PNG 编码失败: {}", e)))?,
            ExportFormat::Bmp => BmpEncoder::new(&mut writer)
                .write_image(&rgba, self.width, self.height, ExtendedColorType::Rgba8)
                .map_err(|e| ImageError::Encode(format!("BMP 编码失败: {}", e)))?,
        }
        writer.flush()?;
        Ok(())
    }
}
