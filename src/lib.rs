//! # 剪贴板桥接服务库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │              嵌入应用（外部渲染引擎）                    │
//! │                                                          │
//! │   invokeMethod("app.clipboard", method, arguments)       │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ 方法通道（Success / Error / NotImplemented）
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            宿主 (Rust)                           │
//! │                                                          │
//! │  ┌─ shell ────────── 窗口外壳：引擎消息转发 + 通道注册    │
//! │  │                                                       │
//! │  ├─ channel ──────── MethodCall / MethodResult / 传输    │
//! │  │                                                       │
//! │  ├─ clipboard_image  剪贴板位图 ⇄ 图片文件（核心）       │
//! │  │   ├─ service       方法分发                           │
//! │  │   ├─ dib           DIB 解析 / 构建                    │
//! │  │   ├─ export        临时 PNG 文件                      │
//! │  │   └─ win32         RAII 剪贴板与全局内存              │
//! │  │                                                       │
//! │  ├─ config            BridgeConfig（JSON + 默认值）      │
//! │  └─ error             AppError（统一错误类型）           │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`config`] | 通道名、导出目录/格式、解码资源上限 |
//! | [`channel`] | 方法调用模型、处理器注册、按行 JSON 传输 |
//! | [`clipboard_image`] | `getClipboardImages` / `getClipboardFiles` / `setClipboardImage` |
//! | [`shell`] | 嵌入引擎的顶层窗口粘合层 |

pub mod error;
pub mod config;
pub mod channel;
pub mod clipboard_image;
pub mod shell;
