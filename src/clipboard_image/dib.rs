//! # DIB 解析与构建模块
//!
//! ## 设计思路
//!
//! 剪贴板里的 `CF_DIB` / `CF_DIBV5` 是一块"信息头 + 调色板/位域掩码 + 像素"的连续内存。
//! `ClipboardBitmapView` 只借用这块内存，不复制；它的生命周期被限制在
//! 剪贴板打开期间（由 `ClipboardBackend::with_bitmap` 的闭包作用域保证）。
//!
//! ## 实现思路
//!
//! 1. 按小端序读取信息头字段，拒绝不支持的位深与压缩方式
//! 2. 计算像素数据偏移 = 头大小 + 调色板或掩码区大小，并保证不越过块大小
//! 3. 在前面补一个 14 字节 `BITMAPFILEHEADER`，交给 `image` 的 BMP 解码器
//!
//! 反方向（写入剪贴板）由 `build_dib` 生成自顶向下、未压缩、32 位的 DIB。

use image::ImageFormat;

use super::decoded::DecodedImage;
use super::ImageError;

/// `BITMAPINFOHEADER` 的大小。
pub const INFO_HEADER_SIZE: u32 = 40;
/// `BITMAPFILEHEADER` 的大小。
pub const FILE_HEADER_SIZE: usize = 14;

pub const BI_RGB: u32 = 0;
pub const BI_RLE8: u32 = 1;
pub const BI_RLE4: u32 = 2;
pub const BI_BITFIELDS: u32 = 3;
pub const BI_JPEG: u32 = 4;
pub const BI_PNG: u32 = 5;
pub const BI_ALPHABITFIELDS: u32 = 6;

/// 剪贴板位图支持的位深。
pub const SUPPORTED_BIT_COUNTS: [u16; 6] = [1, 4, 8, 16, 24, 32];

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_i32(bytes: &[u8], at: usize) -> i32 {
    read_u32(bytes, at) as i32
}

/// 位图信息头中与解码相关的字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DibHeader {
    /// `biSize`：40（INFO）、108（V4）、124（V5）等。
    pub size: u32,
    pub width: i32,
    /// 正值为自底向上，负值为自顶向下。
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: u32,
    pub size_image: u32,
    pub clr_used: u32,
}

impl DibHeader {
    /// 从内存块开头解析信息头。
    pub fn parse(bytes: &[u8]) -> Result<Self, ImageError> {
        if bytes.len() < INFO_HEADER_SIZE as usize {
            return Err(ImageError::InvalidBitmap(format!(
                "数据块过小：{} 字节，不足以容纳信息头",
                bytes.len()
            )));
        }

        let header = Self {
            size: read_u32(bytes, 0),
            width: read_i32(bytes, 4),
            height: read_i32(bytes, 8),
            planes: read_u16(bytes, 12),
            bit_count: read_u16(bytes, 14),
            compression: read_u32(bytes, 16),
            size_image: read_u32(bytes, 20),
            clr_used: read_u32(bytes, 32),
        };

        if header.size < INFO_HEADER_SIZE {
            return Err(ImageError::Unsupported(format!(
                "不支持的信息头大小：{}",
                header.size
            )));
        }
        if header.size as usize > bytes.len() {
            return Err(ImageError::InvalidBitmap(format!(
                "信息头大小 {} 超过数据块大小 {}",
                header.size,
                bytes.len()
            )));
        }
        if !SUPPORTED_BIT_COUNTS.contains(&header.bit_count) {
            return Err(ImageError::Unsupported(format!("不支持的位深：{}", header.bit_count)));
        }
        match header.compression {
            BI_RGB | BI_RLE8 | BI_RLE4 | BI_BITFIELDS | BI_ALPHABITFIELDS => {}
            BI_JPEG | BI_PNG => {
                return Err(ImageError::Unsupported("内嵌 JPEG/PNG 的 DIB".to_string()));
            }
            other => {
                return Err(ImageError::Unsupported(format!("未知压缩方式：{}", other)));
            }
        }
        if header.width <= 0 || header.height == 0 || header.height == i32::MIN {
            return Err(ImageError::InvalidBitmap(format!(
                "位图尺寸无效：{}x{}",
                header.width, header.height
            )));
        }

        Ok(header)
    }

    /// 调色板或位域掩码区的字节数。
    ///
    /// - 位深 <= 8：`biClrUsed` 非零时按其计数，否则 `2^bit_count` 项，每项 4 字节
    /// - 40 字节信息头 + `BI_BITFIELDS`：三个通道掩码，12 字节
    /// - 40 字节信息头 + `BI_ALPHABITFIELDS`：四个通道掩码，16 字节
    /// - 其它情况（含 V4/V5 头，掩码已在头内）：0
    pub fn color_table_size(&self) -> usize {
        if self.bit_count <= 8 {
            let max_entries = 1usize << self.bit_count;
            let entries = match self.clr_used as usize {
                0 => max_entries,
                used if used > max_entries => max_entries,
                used => used,
            };
            return entries * 4;
        }

        if self.size == INFO_HEADER_SIZE {
            match self.compression {
                BI_BITFIELDS => return 12,
                BI_ALPHABITFIELDS => return 16,
                _ => {}
            }
        }

        0
    }

    /// 像素数据相对于信息头起点的偏移。
    pub fn pixel_data_offset(&self) -> usize {
        self.size as usize + self.color_table_size()
    }

    pub fn is_top_down(&self) -> bool {
        self.height < 0
    }

    pub fn abs_height(&self) -> u32 {
        self.height.unsigned_abs()
    }

    /// 每行字节数（按 4 字节对齐）。
    pub fn stride(&self) -> usize {
        ((self.width as usize * self.bit_count as usize + 31) / 32) * 4
    }

    fn is_run_length_encoded(&self) -> bool {
        matches!(self.compression, BI_RLE8 | BI_RLE4)
    }
}

/// 剪贴板位图内存的只读视图。
///
/// 不拥有数据；必须在剪贴板打开、内存锁定期间创建并使用完毕。
#[derive(Debug, Clone, Copy)]
pub struct ClipboardBitmapView<'a> {
    header: DibHeader,
    bytes: &'a [u8],
}

impl<'a> ClipboardBitmapView<'a> {
    /// 解析并校验整块数据：像素偏移与像素区长度都不能越过块大小。
    pub fn parse(bytes: &'a [u8]) -> Result<Self, ImageError> {
        let header = DibHeader::parse(bytes)?;
        let offset = header.pixel_data_offset();
        if offset > bytes.len() {
            return Err(ImageError::InvalidBitmap(format!(
                "像素偏移 {} 超过数据块大小 {}",
                offset,
                bytes.len()
            )));
        }

        if !header.is_run_length_encoded() {
            let required = header
                .stride()
                .checked_mul(header.abs_height() as usize)
                .ok_or_else(|| ImageError::ResourceLimit("位图尺寸溢出".to_string()))?;
            let available = bytes.len() - offset;
            if available < required {
                return Err(ImageError::InvalidBitmap(format!(
                    "像素数据不完整：需要 {} 字节，实际 {} 字节",
                    required, available
                )));
            }
        }

        Ok(Self { header, bytes })
    }

    pub fn header(&self) -> &DibHeader {
        &self.header
    }

    pub fn width(&self) -> u32 {
        self.header.width as u32
    }

    pub fn height(&self) -> u32 {
        self.header.abs_height()
    }

    pub fn pixel_data_offset(&self) -> usize {
        self.header.pixel_data_offset()
    }

    /// 紧跟在调色板/掩码区之后的像素字节。
    pub fn pixel_data(&self) -> &'a [u8] {
        &self.bytes[self.pixel_data_offset()..]
    }

    /// 补上 `BITMAPFILEHEADER`，得到完整的 BMP 文件字节。
    pub fn to_bmp_file(&self) -> Vec<u8> {
        let total = FILE_HEADER_SIZE + self.bytes.len();
        let off_bits = FILE_HEADER_SIZE + self.pixel_data_offset();

        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(b"BM");
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&(off_bits as u32).to_le_bytes());
        out.extend_from_slice(self.bytes);
        out
    }

    /// 解码为 32 位 BGRA 图像（复制像素，之后可释放剪贴板）。
    ///
    /// 32 位 `BI_RGB` 直接按 BGRA 复制，保留第 4 字节的 alpha；
    /// 其余格式交给 `image` 的 BMP 解码器。
    pub fn decode(&self) -> Result<DecodedImage, ImageError> {
        if self.header.bit_count == 32 && self.header.compression == BI_RGB {
            return self.copy_bgra32();
        }

        let bmp = self.to_bmp_file();
        let decoded = image::load_from_memory_with_format(&bmp, ImageFormat::Bmp)
            .map_err(|e| ImageError::Decode(format!("剪贴板位图解码失败：{}", e)))?;
        DecodedImage::from_dynamic(decoded)
    }

    /// 逐行复制 32 位像素并翻转为自顶向下。
    ///
    /// 很多程序写入的 32 位 `BI_RGB` 第 4 字节全为 0（未使用），
    /// 此时视为不透明；只要有任一非零 alpha 就原样保留。
    fn copy_bgra32(&self) -> Result<DecodedImage, ImageError> {
        let width = self.width();
        let height = self.height();
        let row_len = width as usize * 4;
        let stride = self.header.stride();
        let pixels = self.pixel_data();

        let mut bgra = Vec::with_capacity(row_len * height as usize);
        for row in 0..height as usize {
            let src_row = if self.header.is_top_down() {
                row
            } else {
                height as usize - 1 - row
            };
            let start = src_row * stride;
            let line = pixels
                .get(start..start + row_len)
                .ok_or_else(|| ImageError::InvalidBitmap(format!("第 {} 行像素越界", src_row)))?;
            bgra.extend_from_slice(line);
        }

        if bgra.chunks_exact(4).all(|px| px[3] == 0) {
            for px in bgra.chunks_exact_mut(4) {
                px[3] = 255;
            }
        }

        DecodedImage::from_bgra(width, height, bgra)
    }
}

/// 构建可直接放入 `CF_DIB` 的数据块：40 字节信息头（自顶向下、BI_RGB、32 位）+ BGRA 像素。
pub fn build_dib(image: &DecodedImage) -> Result<Vec<u8>, ImageError> {
    let width = i32::try_from(image.width())
        .map_err(|_| ImageError::ResourceLimit(format!("宽度过大：{}", image.width())))?;
    let height = i32::try_from(image.height())
        .map_err(|_| ImageError::ResourceLimit(format!("高度过大：{}", image.height())))?;
    let pixels = image.pixels();
    let size_image = u32::try_from(pixels.len())
        .map_err(|_| ImageError::ResourceLimit("像素数据超过 4GB".to_string()))?;

    let mut out = Vec::with_capacity(INFO_HEADER_SIZE as usize + pixels.len());
    out.extend_from_slice(&INFO_HEADER_SIZE.to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    // 负高度 = 自顶向下
    out.extend_from_slice(&(-height).to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&32u16.to_le_bytes());
    out.extend_from_slice(&BI_RGB.to_le_bytes());
    out.extend_from_slice(&size_image.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(pixels);
    Ok(out)
}
