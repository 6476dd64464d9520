//! 方法通道：处理器注册与单次回复分发。

use super::{MethodCall, MethodResult};

/// 通道上的入站调用处理器。
pub trait MethodCallHandler {
    fn on_method_call(&self, call: &MethodCall) -> MethodResult;
}

impl<F> MethodCallHandler for F
where
    F: Fn(&MethodCall) -> MethodResult,
{
    fn on_method_call(&self, call: &MethodCall) -> MethodResult {
        self(call)
    }
}

/// 具名方法通道。
///
/// 未注册处理器时所有调用都回复 `NotImplemented`。
pub struct MethodChannel {
    name: String,
    handler: Option<Box<dyn MethodCallHandler>>,
}

impl MethodChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handler: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 注册（或替换）处理器。
    pub fn set_method_call_handler(&mut self, handler: impl MethodCallHandler + 'static) {
        log::debug!("通道 {} 注册处理器", self.name);
        self.handler = Some(Box::new(handler));
    }

    pub fn clear_method_call_handler(&mut self) {
        self.handler = None;
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// 分发调用；`reply` 恰好被调用一次。
    pub fn handle_method_call(&self, call: &MethodCall, reply: impl FnOnce(MethodResult)) {
        let result = match &self.handler {
            Some(handler) => handler.on_method_call(call),
            None => MethodResult::NotImplemented,
        };
        reply(result);
    }

    /// 同步调用并直接返回结果。
    pub fn invoke(&self, call: &MethodCall) -> MethodResult {
        let mut out = MethodResult::NotImplemented;
        self.handle_method_call(call, |result| out = result);
        out
    }
}
