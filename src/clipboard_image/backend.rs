//! # 剪贴板后端抽象
//!
//! ## 设计思路
//!
//! 服务层只依赖 `ClipboardBackend` 三个动作：访问位图、读取文件列表、写入位图。
//! 平台细节（打开/关闭剪贴板、全局内存加锁）全部收在实现内部。
//!
//! - `Win32Clipboard`：Windows 原生实现（见 `win32.rs`）
//! - `MemoryClipboard`：进程内实现，语义与系统剪贴板一致，用于测试与无剪贴板环境
//! - 非 Windows 平台的 `SystemClipboard` 为占位实现，所有操作返回 `Unsupported`
//!
//! ## 约定
//!
//! `with_bitmap` 的闭包在"剪贴板已打开、数据已加锁"期间执行，
//! 传入的切片在闭包返回后即失效，闭包内只做解析与像素复制。

use std::sync::{Arc, Mutex, MutexGuard};

use super::ImageError;

/// 剪贴板位图格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmapFormat {
    /// `CF_DIB`
    Dib,
    /// `CF_DIBV5`
    DibV5,
}

impl BitmapFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::Dib => "CF_DIB",
            Self::DibV5 => "CF_DIBV5",
        }
    }
}

/// 服务层依赖的剪贴板能力。
pub trait ClipboardBackend {
    /// 按 `CF_DIB` → `CF_DIBV5` 的优先级访问剪贴板位图。
    ///
    /// 没有任何位图格式时返回 `Ok(None)`。
    fn with_bitmap<R>(&self, visit: impl FnOnce(BitmapFormat, &[u8]) -> R) -> Result<Option<R>, ImageError>;

    /// 读取文件拖放列表（`CF_HDROP`），保持系统枚举顺序；没有时返回空列表。
    ///
    /// 读不出路径的空条目会被跳过，结果数量可能少于系统报告的条目数。
    fn file_drop_paths(&self) -> Result<Vec<String>, ImageError>;

    /// 清空剪贴板并以 `CF_DIB` 写入 `dib`。
    fn set_bitmap(&self, dib: &[u8]) -> Result<(), ImageError>;
}

impl<B: ClipboardBackend> ClipboardBackend for Arc<B> {
    fn with_bitmap<R>(&self, visit: impl FnOnce(BitmapFormat, &[u8]) -> R) -> Result<Option<R>, ImageError> {
        (**self).with_bitmap(visit)
    }

    fn file_drop_paths(&self) -> Result<Vec<String>, ImageError> {
        (**self).file_drop_paths()
    }

    fn set_bitmap(&self, dib: &[u8]) -> Result<(), ImageError> {
        (**self).set_bitmap(dib)
    }
}

#[derive(Debug, Default)]
struct MemoryClipboardState {
    bitmap: Option<(BitmapFormat, Vec<u8>)>,
    files: Vec<String>,
    busy: bool,
    reject_writes: bool,
}

/// 进程内剪贴板。
///
/// `set_busy(true)` 模拟被其他进程占用；`set_reject_writes(true)` 模拟
/// 清空成功但 `SetClipboardData` 失败的情形（剪贴板将保持为空）。
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    state: Mutex<MemoryClipboardState>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryClipboardState>, ImageError> {
        self.state
            .lock()
            .map_err(|_| ImageError::ClipboardBusy("内存剪贴板锁已中毒".to_string()))
    }

    fn open(&self) -> Result<MutexGuard<'_, MemoryClipboardState>, ImageError> {
        let state = self.lock()?;
        if state.busy {
            return Err(ImageError::ClipboardBusy("剪贴板被其他进程占用".to_string()));
        }
        Ok(state)
    }

    /// 放入位图数据（替换现有全部内容）。
    pub fn put_bitmap(&self, format: BitmapFormat, bytes: Vec<u8>) {
        if let Ok(mut state) = self.lock() {
            state.files.clear();
            state.bitmap = Some((format, bytes));
        }
    }

    /// 放入文件拖放列表（替换现有全部内容）。
    pub fn put_files(&self, files: Vec<String>) {
        if let Ok(mut state) = self.lock() {
            state.bitmap = None;
            state.files = files;
        }
    }

    pub fn clear(&self) {
        if let Ok(mut state) = self.lock() {
            state.bitmap = None;
            state.files.clear();
        }
    }

    pub fn set_busy(&self, busy: bool) {
        if let Ok(mut state) = self.lock() {
            state.busy = busy;
        }
    }

    pub fn set_reject_writes(&self, reject: bool) {
        if let Ok(mut state) = self.lock() {
            state.reject_writes = reject;
        }
    }

    /// 当前位图内容的副本。
    pub fn bitmap(&self) -> Option<(BitmapFormat, Vec<u8>)> {
        self.lock().ok().and_then(|state| state.bitmap.clone())
    }

    pub fn files(&self) -> Vec<String> {
        self.lock().map(|state| state.files.clone()).unwrap_or_default()
    }
}

impl ClipboardBackend for MemoryClipboard {
    fn with_bitmap<R>(&self, visit: impl FnOnce(BitmapFormat, &[u8]) -> R) -> Result<Option<R>, ImageError> {
        let state = self.open()?;
        Ok(state
            .bitmap
            .as_ref()
            .map(|(format, bytes)| visit(*format, bytes)))
    }

    fn file_drop_paths(&self) -> Result<Vec<String>, ImageError> {
        let state = self.open()?;
        Ok(state.files.clone())
    }

    fn set_bitmap(&self, dib: &[u8]) -> Result<(), ImageError> {
        let mut state = self.open()?;
        state.bitmap = None;
        state.files.clear();
        if state.reject_writes {
            return Err(ImageError::ClipboardBusy("SetClipboardData 失败".to_string()));
        }
        state.bitmap = Some((BitmapFormat::Dib, dib.to_vec()));
        Ok(())
    }
}

/// 非 Windows 平台的占位实现。
#[cfg(not(target_os = "windows"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedClipboard;

#[cfg(not(target_os = "windows"))]
impl ClipboardBackend for UnsupportedClipboard {
    fn with_bitmap<R>(&self, _visit: impl FnOnce(BitmapFormat, &[u8]) -> R) -> Result<Option<R>, ImageError> {
        Err(ImageError::Unsupported("剪贴板位图仅在 Windows 上支持".to_string()))
    }

    fn file_drop_paths(&self) -> Result<Vec<String>, ImageError> {
        Err(ImageError::Unsupported("文件拖放列表仅在 Windows 上支持".to_string()))
    }

    fn set_bitmap(&self, _dib: &[u8]) -> Result<(), ImageError> {
        Err(ImageError::Unsupported("剪贴板位图仅在 Windows 上支持".to_string()))
    }
}

/// 当前平台的系统剪贴板。
#[cfg(target_os = "windows")]
pub type SystemClipboard = super::win32::Win32Clipboard;
#[cfg(not(target_os = "windows"))]
pub type SystemClipboard = UnsupportedClipboard;
