//! # 剪贴板图片模块（clipboard_image）
//!
//! ## 设计思路
//!
//! 将"剪贴板位图 ⇄ 图片文件"的双向转换按职责拆分为多个子模块：
//!
//! - `service`：对外服务与方法分发（三个方法 + NotImplemented）
//! - `backend`：剪贴板能力抽象与进程内实现
//! - `win32`：Windows 原生实现（RAII 守卫管理剪贴板与全局内存）
//! - `dib`：DIB 信息头解析、像素偏移计算、DIB 构建
//! - `decoded`：归一化的 32 位 BGRA 图像与容器编码
//! - `pipeline`：图片文件解码与资源上限
//! - `export`：临时导出文件命名与写入事务
//! - `error`：错误模型
//!
//! ## 调用链
//!
//! ```text
//! MethodChannel（app.clipboard）
//!    ↓
//! service.rs（方法名分发）
//!    ├─ getClipboardImages: backend.with_bitmap → dib（视图+解码）→ export（PNG 文件）
//!    ├─ getClipboardFiles:  backend.file_drop_paths
//!    └─ setClipboardImage:  pipeline（解码文件）→ dib::build_dib → backend.set_bitmap
//!    ↓
//! MethodResult（失败降级为空列表 / false）
//! ```

mod backend;
mod decoded;
mod dib;
mod error;
mod export;
mod pipeline;
mod service;
#[cfg(target_os = "windows")]
mod win32;

pub use backend::{BitmapFormat, ClipboardBackend, MemoryClipboard, SystemClipboard};
#[cfg(not(target_os = "windows"))]
pub use backend::UnsupportedClipboard;
pub use decoded::DecodedImage;
pub use dib::{build_dib, ClipboardBitmapView, DibHeader, BI_BITFIELDS, BI_RGB, INFO_HEADER_SIZE};
pub use error::ImageError;
pub use export::{candidate_name, system_tick_count, FileImageHandle};
pub use service::{ClipboardImageService, ClipboardMethod};
#[cfg(target_os = "windows")]
pub use win32::Win32Clipboard;
