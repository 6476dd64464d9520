//! # 解码流水线模块
//!
//! ## 设计思路
//!
//! 将"文件 → 字节 → 图像 → BGRA"的过程集中管理，并在关键节点增加资源上限控制。
//! 优先读取头部尺寸做检查，再进行完整解码，降低异常输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. 读取文件字节
//! 2. 猜测格式并读取 header 尺寸
//! 3. 按像素 / 内存上限快速拒绝
//! 4. 完整解码并归一化为 `DecodedImage`

use std::fs;
use std::io::{Cursor, ErrorKind};
use std::path::Path;

use super::decoded::DecodedImage;
use super::ImageError;
use crate::config::BridgeConfig;

/// 读取并解码图片文件。
pub(crate) fn decode_file(path: &Path, config: &BridgeConfig) -> Result<DecodedImage, ImageError> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ImageError::FileSystem(format!("文件不存在：{}", path.display())),
        _ => ImageError::FileSystem(format!("读取文件失败：{}（{}）", path.display(), e)),
    })?;

    let (header_width, header_height) = inspect_dimensions_from_memory(&bytes)?;
    validate_limits(config, header_width, header_height)?;

    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| ImageError::Decode(format!("图片解码失败：{}", e)))?;
    let image = DecodedImage::from_dynamic(decoded)?;

    log::debug!(
        "图片文件解码成功 - {}x{} ({} 字节)",
        image.width(),
        image.height(),
        bytes.len()
    );

    Ok(image)
}

/// 仅通过内存中的图片头信息读取宽高。
fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), ImageError> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::Decode(format!("无法识别图片格式：{}", e)))?;

    if reader.format().is_none() {
        return Err(ImageError::Decode("无法识别图片格式".to_string()));
    }

    reader
        .into_dimensions()
        .map_err(|e| ImageError::Decode(format!("无法读取图片尺寸：{}", e)))
}

/// 校验尺寸非零，且像素数量与预计内存不超过配置上限。
pub(crate) fn validate_limits(config: &BridgeConfig, width: u32, height: u32) -> Result<(), ImageError> {
    if width == 0 || height == 0 {
        return Err(ImageError::InvalidBitmap(format!("图片尺寸为零：{}x{}", width, height)));
    }

    let pixels = (width as u64)
        .checked_mul(height as u64)
        .ok_or_else(|| ImageError::ResourceLimit("图片像素数溢出".to_string()))?;

    if pixels > config.max_decoded_pixels {
        return Err(ImageError::ResourceLimit(format!(
            "图片像素过大：{} 像素（限制：{} 像素）",
            pixels, config.max_decoded_pixels
        )));
    }

    let estimated = pixels
        .checked_mul(4)
        .ok_or_else(|| ImageError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

    if estimated > config.max_decoded_bytes {
        return Err(ImageError::ResourceLimit(format!(
            "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
            estimated as f64 / 1024.0 / 1024.0,
            config.max_decoded_bytes as f64 / 1024.0 / 1024.0
        )));
    }

    Ok(())
}
