//! # 窗口外壳
//!
//! ## 设计思路
//!
//! 原生顶层窗口与嵌入渲染引擎都是外部协作者，这里只依赖两个最小接口：
//!
//! - `EngineHandle`：引擎句柄（处理窗口消息、重载字体、下一帧回调、强制重绘）
//! - `HostWindow`：宿主窗口（显示、默认消息处理）
//!
//! `EmbeddedWindow` 负责把三者粘起来：
//! 1. 创建时校验引擎就绪，注册剪贴板通道处理器
//! 2. 引擎完成首帧后再显示窗口，并主动请求一帧，避免首帧早于回调注册
//! 3. 窗口消息先交给引擎，`WM_FONTCHANGE` 时重载系统字体，其余交回宿主默认处理

use std::rc::Rc;

use crate::channel::{MethodCall, MethodCallHandler, MethodChannel, MethodResult};
use crate::error::AppError;

/// 系统字体变化消息。
pub const WM_FONTCHANGE: u32 = 0x001D;

/// 一条原始窗口消息。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowMessage {
    pub hwnd: isize,
    pub message: u32,
    pub wparam: usize,
    pub lparam: isize,
}

impl WindowMessage {
    pub fn new(hwnd: isize, message: u32, wparam: usize, lparam: isize) -> Self {
        Self {
            hwnd,
            message,
            wparam,
            lparam,
        }
    }
}

/// 嵌入渲染引擎句柄。
pub trait EngineHandle {
    /// 引擎与视图是否创建成功。
    fn is_ready(&self) -> bool;

    /// 让引擎（含其插件）先处理窗口消息；返回 `Some` 表示已消费。
    fn handle_top_level_window_proc(&mut self, message: &WindowMessage) -> Option<isize>;

    fn reload_system_fonts(&mut self);

    /// 注册下一帧完成后的一次性回调。
    fn set_next_frame_callback(&mut self, callback: Box<dyn FnOnce()>);

    fn force_redraw(&mut self);
}

/// 宿主顶层窗口。
pub trait HostWindow {
    fn show(&self);

    /// 宿主默认消息处理。
    fn default_window_proc(&self, message: &WindowMessage) -> isize;
}

/// 内嵌引擎的顶层窗口。
pub struct EmbeddedWindow<E: EngineHandle, W: HostWindow + 'static> {
    window: Rc<W>,
    engine: Option<E>,
    channel: MethodChannel,
}

impl<E: EngineHandle, W: HostWindow + 'static> EmbeddedWindow<E, W> {
    pub fn new(window: W, channel_name: impl Into<String>) -> Self {
        Self {
            window: Rc::new(window),
            engine: None,
            channel: MethodChannel::new(channel_name),
        }
    }

    /// 挂载引擎并注册通道处理器。
    pub fn on_create(&mut self, mut engine: E, handler: impl MethodCallHandler + 'static) -> Result<(), AppError> {
        if !engine.is_ready() {
            return Err(AppError::Window("嵌入引擎或视图创建失败".to_string()));
        }

        self.channel.set_method_call_handler(handler);

        let window = Rc::clone(&self.window);
        engine.set_next_frame_callback(Box::new(move || window.show()));
        // 首帧可能在回调注册前就已完成，这里确保还有一帧待渲染
        engine.force_redraw();

        self.engine = Some(engine);
        log::info!("窗口已创建，通道 {} 就绪", self.channel.name());
        Ok(())
    }

    pub fn on_destroy(&mut self) {
        self.engine = None;
        self.channel.clear_method_call_handler();
    }

    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    pub fn channel(&self) -> &MethodChannel {
        &self.channel
    }

    /// 窗口过程。
    pub fn message_handler(&mut self, message: &WindowMessage) -> isize {
        if let Some(engine) = self.engine.as_mut() {
            if let Some(result) = engine.handle_top_level_window_proc(message) {
                return result;
            }
            if message.message == WM_FONTCHANGE {
                engine.reload_system_fonts();
            }
        }

        self.window.default_window_proc(message)
    }

    /// 转发来自嵌入应用的方法调用。
    pub fn dispatch_method_call(&self, call: &MethodCall, reply: impl FnOnce(MethodResult)) {
        self.channel.handle_method_call(call, reply);
    }
}
