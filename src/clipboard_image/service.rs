//! # 服务层
//!
//! ## 设计思路
//!
//! `ClipboardImageService` 是挂在 `app.clipboard` 通道上的无状态请求处理器。
//! 每次调用在当前线程同步执行完毕，调用之间不保留任何状态。
//!
//! ## 失败语义
//!
//! - 剪贴板被占用、格式缺失、图片为空、解码/编码失败：降级为空列表或 `false`，并记 `warn` 日志
//! - 未知方法名：`NotImplemented`，与"没有数据"区分开
//! - 不做任何自动重试

use std::path::Path;

use serde_json::Value;

use super::backend::{ClipboardBackend, SystemClipboard};
use super::dib::{build_dib, ClipboardBitmapView};
use super::export::{system_tick_count, write_image_file};
use super::pipeline::{decode_file, validate_limits};
use super::ImageError;
use crate::channel::{extract_path, MethodCall, MethodCallHandler, MethodResult};
use crate::config::BridgeConfig;

/// 通道上支持的方法。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardMethod {
    GetClipboardImages,
    GetClipboardFiles,
    SetClipboardImage,
}

impl ClipboardMethod {
    /// 从方法名解析；未知名称返回 `None`。
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "getClipboardImages" => Some(Self::GetClipboardImages),
            "getClipboardFiles" => Some(Self::GetClipboardFiles),
            "setClipboardImage" => Some(Self::SetClipboardImage),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GetClipboardImages => "getClipboardImages",
            Self::GetClipboardFiles => "getClipboardFiles",
            Self::SetClipboardImage => "setClipboardImage",
        }
    }
}

/// 剪贴板图片服务。
pub struct ClipboardImageService<B: ClipboardBackend = SystemClipboard> {
    backend: B,
    config: BridgeConfig,
    ticks: fn() -> u64,
}

impl ClipboardImageService<SystemClipboard> {
    /// 使用当前平台系统剪贴板创建服务。
    pub fn system(config: BridgeConfig) -> Self {
        Self::new(SystemClipboard::default(), config)
    }
}

impl<B: ClipboardBackend> ClipboardImageService<B> {
    pub fn new(backend: B, config: BridgeConfig) -> Self {
        Self {
            backend,
            config,
            ticks: system_tick_count,
        }
    }

    /// 替换导出文件名使用的 tick 来源。
    pub fn with_tick_source(mut self, ticks: fn() -> u64) -> Self {
        self.ticks = ticks;
        self
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// `getClipboardImages`：导出剪贴板位图，返回 0 或 1 个文件路径。
    pub fn get_clipboard_images(&self) -> Vec<String> {
        match self.export_clipboard_image() {
            Ok(Some(path)) => vec![path],
            Ok(None) => {
                log::debug!("剪贴板中没有 CF_DIB / CF_DIBV5 位图");
                Vec::new()
            }
            Err(err) => {
                log::warn!("导出剪贴板图片失败 code={}：{}", err.code(), err);
                Vec::new()
            }
        }
    }

    /// `getClipboardFiles`：读取文件拖放列表。
    pub fn get_clipboard_files(&self) -> Vec<String> {
        match self.backend.file_drop_paths() {
            Ok(files) => {
                if !files.is_empty() {
                    log::info!("从剪贴板读取到 {} 个文件", files.len());
                }
                files
            }
            Err(err) => {
                log::warn!("读取剪贴板文件列表失败 code={}：{}", err.code(), err);
                Vec::new()
            }
        }
    }

    /// `setClipboardImage`：参数为路径字符串或带 `path` 键的映射。
    pub fn set_clipboard_image(&self, argument: Option<&Value>) -> bool {
        let Some(path) = extract_path(argument) else {
            log::warn!("setClipboardImage 缺少有效的 path 参数");
            return false;
        };

        match self.import_image_file(Path::new(path)) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("写入剪贴板图片失败 code={}：{}", err.code(), err);
                false
            }
        }
    }

    fn export_clipboard_image(&self) -> Result<Option<String>, ImageError> {
        // 剪贴板只在解析与像素复制期间保持打开
        let decoded = self.backend.with_bitmap(|format, bytes| {
            let view = ClipboardBitmapView::parse(bytes)?;
            log::debug!(
                "剪贴板位图 {}：{}x{} bpp={} compression={} offset={}",
                format.name(),
                view.width(),
                view.height(),
                view.header().bit_count,
                view.header().compression,
                view.pixel_data_offset()
            );
            validate_limits(&self.config, view.width(), view.height())?;
            view.decode()
        })?;

        let Some(decoded) = decoded else {
            return Ok(None);
        };
        let image = decoded?;

        let handle = write_image_file(
            &image,
            self.config.export_format,
            &self.config.export_dir(),
            &self.config.file_prefix,
            (self.ticks)(),
            self.config.max_name_attempts,
        )?;

        log::info!(
            "剪贴板图片已导出 - {}x{} -> {}",
            image.width(),
            image.height(),
            handle.path().display()
        );
        Ok(Some(handle.into_utf8()))
    }

    fn import_image_file(&self, path: &Path) -> Result<(), ImageError> {
        // 解码与 DIB 打包都在打开剪贴板之前完成，失败不会清空剪贴板
        let image = decode_file(path, &self.config)?;
        let dib = build_dib(&image)?;
        self.backend.set_bitmap(&dib)?;

        log::info!(
            "已写入剪贴板 CF_DIB - {}x{}（来源：{}）",
            image.width(),
            image.height(),
            path.display()
        );
        Ok(())
    }
}

impl<B: ClipboardBackend> MethodCallHandler for ClipboardImageService<B> {
    fn on_method_call(&self, call: &MethodCall) -> MethodResult {
        match ClipboardMethod::from_name(&call.method) {
            Some(ClipboardMethod::GetClipboardImages) => MethodResult::paths(self.get_clipboard_images()),
            Some(ClipboardMethod::GetClipboardFiles) => MethodResult::paths(self.get_clipboard_files()),
            Some(ClipboardMethod::SetClipboardImage) => {
                MethodResult::flag(self.set_clipboard_image(call.arguments.as_ref()))
            }
            None => {
                log::debug!("未实现的方法：{}", call.method);
                MethodResult::NotImplemented
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MethodPayload;
    use crate::clipboard_image::{BitmapFormat, DecodedImage, MemoryClipboard};
    use serde_json::json;

    #[test]
    fn method_names_round_trip() {
        for method in [
            ClipboardMethod::GetClipboardImages,
            ClipboardMethod::GetClipboardFiles,
            ClipboardMethod::SetClipboardImage,
        ] {
            assert_eq!(ClipboardMethod::from_name(method.as_str()), Some(method));
        }
        assert_eq!(ClipboardMethod::from_name("getClipboardVideo"), None);
    }

    #[test]
    fn unknown_method_is_not_implemented() {
        let service = ClipboardImageService::new(MemoryClipboard::new(), BridgeConfig::default());
        let result = service.on_method_call(&MethodCall::new("getClipboardVideo", None));
        assert_eq!(result, MethodResult::NotImplemented);
    }

    #[test]
    fn empty_clipboard_yields_empty_success() {
        let service = ClipboardImageService::new(MemoryClipboard::new(), BridgeConfig::default());
        let result = service.on_method_call(&MethodCall::new("getClipboardImages", None));
        assert_eq!(result, MethodResult::paths(Vec::new()));
    }

    #[test]
    fn corrupt_bitmap_degrades_to_empty_list() {
        let clipboard = MemoryClipboard::new();
        clipboard.put_bitmap(BitmapFormat::Dib, vec![0xFF; 12]);
        let service = ClipboardImageService::new(clipboard, BridgeConfig::default());
        assert!(service.get_clipboard_images().is_empty());
    }

    #[test]
    fn busy_clipboard_yields_false_for_import() {
        let clipboard = MemoryClipboard::new();
        clipboard.set_busy(true);
        let service = ClipboardImageService::new(clipboard, BridgeConfig::default());
        let result = service.on_method_call(&MethodCall::new("setClipboardImage", Some(json!("/tmp/x.png"))));
        assert_eq!(result, MethodResult::Success { payload: MethodPayload::Flag(false) });
    }

    #[test]
    fn oversized_clipboard_bitmap_is_refused() {
        let clipboard = MemoryClipboard::new();
        let dib = build_dib(&DecodedImage::solid(10, 10, [0, 0, 0, 255])).expect("dib");
        clipboard.put_bitmap(BitmapFormat::Dib, dib);

        let mut config = BridgeConfig::default();
        config.max_decoded_pixels = 50;
        let service = ClipboardImageService::new(clipboard, config);
        assert!(service.get_clipboard_images().is_empty());
    }
}
