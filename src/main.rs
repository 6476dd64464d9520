//! # 剪贴板桥接服务进程入口
//!
//! 以独立进程方式挂载 `app.clipboard` 通道：从标准输入逐行读取 JSON 调用，
//! 向标准输出逐行写回结果。日志走标准错误，保证标准输出只有回复。

use std::io;
use std::process::ExitCode;

use clipboard_bridge::channel::{transport, MethodChannel};
use clipboard_bridge::clipboard_image::ClipboardImageService;
use clipboard_bridge::config::BridgeConfig;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match BridgeConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            log::error!("加载配置失败: {err}");
            return ExitCode::FAILURE;
        }
    };
    log::info!(
        "setup: channel={} export_dir={} format={:?}",
        config.channel_name,
        config.export_dir().display(),
        config.export_format
    );

    let mut channel = MethodChannel::new(config.channel_name.clone());
    channel.set_method_call_handler(ClipboardImageService::system(config));

    let stdin = io::stdin();
    let stdout = io::stdout();
    match transport::serve(&channel, stdin.lock(), stdout.lock()) {
        Ok(handled) => {
            log::info!("输入结束，共处理 {handled} 个调用");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("通道传输失败: {err}");
            ExitCode::FAILURE
        }
    }
}
