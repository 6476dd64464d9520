//! # Windows 原生剪贴板后端
//!
//! ## 设计思路
//!
//! 剪贴板是系统级独占资源，一个没关掉的 `OpenClipboard` 会卡住所有其他进程。
//! 因此所有原生句柄都包在作用域守卫里，任何提前返回都会按获取的逆序释放：
//!
//! - `ClipboardSession`：`OpenClipboard` / `CloseClipboard`
//! - `LockedGlobal`：`GlobalLock` / `GlobalUnlock`
//! - `OwnedGlobal`：`GlobalAlloc` / `GlobalFree`，交给剪贴板后放弃所有权
//!
//! ## 实现思路
//!
//! 写入时先分配并填好全局内存，再打开剪贴板，使 Open→Empty→Set→Close 窗口尽量短。
//!
//! 错误日志字段沿用 `hr` / `code` 约定，便于检索。

use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;

use windows::Win32::Foundation::{GlobalFree, HANDLE, HGLOBAL};
use windows::Win32::System::DataExchange::{
    CloseClipboard, EmptyClipboard, GetClipboardData, IsClipboardFormatAvailable, OpenClipboard,
    SetClipboardData,
};
use windows::Win32::System::Memory::{GlobalAlloc, GlobalLock, GlobalSize, GlobalUnlock, GMEM_MOVEABLE};
use windows::Win32::System::Ole::{CF_DIB, CF_DIBV5, CF_HDROP};
use windows::Win32::System::SystemInformation::GetTickCount64;
use windows::Win32::UI::Shell::{DragQueryFileW, HDROP};

use super::backend::{BitmapFormat, ClipboardBackend};
use super::ImageError;

fn hresult_to_win32_code(hr: i32) -> Option<u32> {
    let value = hr as u32;
    if (value & 0xFFFF_0000) == 0x8007_0000 {
        Some(value & 0xFFFF)
    } else {
        None
    }
}

fn describe(operation: &str, err: &windows::core::Error) -> String {
    let hr = err.code().0;
    let code = hresult_to_win32_code(hr)
        .map(|c| c.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    format!("{}失败: hr=0x{:08X} code={} detail={}", operation, hr as u32, code, err.message())
}

fn format_id(format: BitmapFormat) -> u32 {
    match format {
        BitmapFormat::Dib => CF_DIB.0 as u32,
        BitmapFormat::DibV5 => CF_DIBV5.0 as u32,
    }
}

pub(crate) fn tick_count() -> u64 {
    unsafe { GetTickCount64() }
}

/// 打开的剪贴板；离开作用域时关闭。
struct ClipboardSession(());

impl ClipboardSession {
    fn open() -> Result<Self, ImageError> {
        unsafe { OpenClipboard(None) }
            .map_err(|e| ImageError::ClipboardBusy(describe("OpenClipboard", &e)))?;
        Ok(Self(()))
    }
}

impl Drop for ClipboardSession {
    fn drop(&mut self) {
        if let Err(e) = unsafe { CloseClipboard() } {
            log::warn!("{}", describe("CloseClipboard", &e));
        }
    }
}

/// 已加锁的全局内存块；离开作用域时解锁。
struct LockedGlobal {
    handle: HGLOBAL,
    ptr: *mut u8,
    len: usize,
}

impl LockedGlobal {
    /// # Safety
    ///
    /// `handle` 必须是有效的全局内存句柄，且在守卫存活期间不被释放。
    unsafe fn lock(handle: HGLOBAL) -> Result<Self, ImageError> {
        let ptr = unsafe { GlobalLock(handle) } as *mut u8;
        if ptr.is_null() {
            return Err(ImageError::InvalidBitmap("GlobalLock 返回空指针".to_string()));
        }
        let len = unsafe { GlobalSize(handle) };
        Ok(Self { handle, ptr, len })
    }

    fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}

impl Drop for LockedGlobal {
    fn drop(&mut self) {
        // 锁计数归零时 GlobalUnlock 也会返回"错误"，忽略即可
        let _ = unsafe { GlobalUnlock(self.handle) };
    }
}

/// 本进程拥有的全局内存；未交给剪贴板前离开作用域会被释放。
struct OwnedGlobal(Option<HGLOBAL>);

impl OwnedGlobal {
    fn alloc(len: usize) -> Result<Self, ImageError> {
        let handle = unsafe { GlobalAlloc(GMEM_MOVEABLE, len) }
            .map_err(|e| ImageError::ResourceLimit(describe("GlobalAlloc", &e)))?;
        Ok(Self(Some(handle)))
    }

    fn handle(&self) -> Result<HGLOBAL, ImageError> {
        self.0
            .ok_or_else(|| ImageError::InvalidBitmap("全局内存已移交".to_string()))
    }

    /// `SetClipboardData` 成功后内存归剪贴板所有。
    fn hand_over(&mut self) {
        self.0 = None;
    }
}

impl Drop for OwnedGlobal {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            let _ = unsafe { GlobalFree(Some(handle)) };
        }
    }
}

/// 截掉终止符后转为 UTF-8；空条目返回 `None`。
fn drop_entry_path(buf: &[u16], copied: usize) -> Option<String> {
    let wide = buf.get(..copied.min(buf.len()))?;
    let wide = wide.split(|&c| c == 0).next().unwrap_or_default();
    if wide.is_empty() {
        return None;
    }
    Some(OsString::from_wide(wide).to_string_lossy().into_owned())
}

fn available_bitmap_format() -> Option<BitmapFormat> {
    [BitmapFormat::Dib, BitmapFormat::DibV5]
        .into_iter()
        .find(|format| unsafe { IsClipboardFormatAvailable(format_id(*format)) }.is_ok())
}

/// Win32 剪贴板。
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32Clipboard;

impl ClipboardBackend for Win32Clipboard {
    fn with_bitmap<R>(&self, visit: impl FnOnce(BitmapFormat, &[u8]) -> R) -> Result<Option<R>, ImageError> {
        let _session = ClipboardSession::open()?;

        let Some(format) = available_bitmap_format() else {
            return Ok(None);
        };

        let handle = unsafe { GetClipboardData(format_id(format)) }
            .map_err(|e| ImageError::FormatUnavailable(describe("GetClipboardData", &e)))?;
        let locked = unsafe { LockedGlobal::lock(HGLOBAL(handle.0)) }?;

        log::debug!("剪贴板位图：format={} size={}", format.name(), locked.len);
        Ok(Some(visit(format, locked.as_slice())))
    }

    /// 按系统枚举顺序返回拖放路径。
    ///
    /// 长度为 0 的条目会被跳过（记 `warn`），此时返回的数量少于 `DragQueryFileW` 报告的条目数。
    fn file_drop_paths(&self) -> Result<Vec<String>, ImageError> {
        let _session = ClipboardSession::open()?;

        if unsafe { IsClipboardFormatAvailable(CF_HDROP.0 as u32) }.is_err() {
            return Ok(Vec::new());
        }

        let handle = unsafe { GetClipboardData(CF_HDROP.0 as u32) }
            .map_err(|e| ImageError::FormatUnavailable(describe("GetClipboardData(CF_HDROP)", &e)))?;
        let hdrop = HDROP(handle.0);

        let count = unsafe { DragQueryFileW(hdrop, u32::MAX, None) };
        let mut files = Vec::with_capacity(count as usize);
        for index in 0..count {
            let len = unsafe { DragQueryFileW(hdrop, index, None) };
            if len == 0 {
                log::warn!("CF_HDROP 第 {} 项长度为 0，跳过", index);
                continue;
            }

            let mut buf = vec![0u16; len as usize + 1];
            let copied = unsafe { DragQueryFileW(hdrop, index, Some(&mut buf)) };
            match drop_entry_path(&buf, copied as usize) {
                Some(path) => files.push(path),
                None => log::warn!("CF_HDROP 第 {} 项读取为空，跳过", index),
            }
        }

        Ok(files)
    }

    fn set_bitmap(&self, dib: &[u8]) -> Result<(), ImageError> {
        // 锁外准备好全部数据
        let mut global = OwnedGlobal::alloc(dib.len())?;
        {
            let mut locked = unsafe { LockedGlobal::lock(global.handle()?) }?;
            let target = locked
                .as_mut_slice()
                .get_mut(..dib.len())
                .ok_or_else(|| ImageError::ResourceLimit("全局内存小于请求大小".to_string()))?;
            target.copy_from_slice(dib);
        }

        let _session = ClipboardSession::open()?;
        unsafe { EmptyClipboard() }
            .map_err(|e| ImageError::ClipboardBusy(describe("EmptyClipboard", &e)))?;
        unsafe { SetClipboardData(CF_DIB.0 as u32, Some(HANDLE(global.handle()?.0))) }
            .map_err(|e| ImageError::ClipboardBusy(describe("SetClipboardData", &e)))?;
        global.hand_over();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{drop_entry_path, hresult_to_win32_code};

    #[test]
    fn hresult_to_win32_code_extracts_mapped_code() {
        let hr = 0x8007_058A_u32 as i32;
        assert_eq!(hresult_to_win32_code(hr), Some(1418));
        assert_eq!(hresult_to_win32_code(0x8000_4005_u32 as i32), None);
    }

    #[test]
    fn drop_entries_trim_terminator_and_skip_empty() {
        let wide: Vec<u16> = "C:\\照片\\猫.png\0".encode_utf16().collect();
        assert_eq!(drop_entry_path(&wide, wide.len() - 1).as_deref(), Some("C:\\照片\\猫.png"));

        assert_eq!(drop_entry_path(&[0], 0), None);
        assert_eq!(drop_entry_path(&[0, 0], 2), None);
    }
}
