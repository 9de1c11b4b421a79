// 日志工具模块
//
// 基于 flexi_logger：按大小轮转的文件输出，异步写入，可选地把告警复制到标准错误。
// 编解码器只通过 `log` 宏输出，未初始化时这些调用是空操作。

use std::sync::Mutex;

use flexi_logger::{
    detailed_format, Cleanup, Criterion, Duplicate, FileSpec, LogSpecification, Logger, LoggerHandle,
    Naming, WriteMode,
};

use crate::config::{Config, LogConfig};
use crate::core::codec::{CodecError, CodecResult};

/// 已启动的日志器；`shutdown` 时取出并刷新
static LOGGER: Mutex<Option<LoggerHandle>> = Mutex::new(None);

fn log_error(e: impl std::fmt::Display) -> CodecError {
    CodecError::Config(format!("logging: {}", e))
}

/// 解析日志级别描述，如 `info` 或 `warn, chcodec::format=debug`
pub fn parse_level(spec: &str) -> CodecResult<LogSpecification> {
    LogSpecification::parse(spec).map_err(log_error)
}

fn build_logger(log: &LogConfig) -> CodecResult<Logger> {
    // RUST_LOG 优先于配置文件
    let spec = LogSpecification::env_or_parse(&log.level).map_err(log_error)?;
    let logger = Logger::with(spec)
        .log_to_file(FileSpec::default().basename(&log.file).directory(&log.dir))
        .format(detailed_format)
        .rotate(
            Criterion::Size(log.max_file_size),
            Naming::Numbers,
            Cleanup::KeepLogFiles(log.max_files),
        )
        .write_mode(WriteMode::Async)
        .append();
    Ok(if log.duplicate_to_stderr {
        logger.duplicate_to_stderr(Duplicate::Warn)
    } else {
        logger
    })
}

/// 初始化日志系统
///
/// 已初始化时直接返回成功，保留第一次的配置。
///
/// # Examples
/// ```no_run
/// use chcodec::config::Config;
/// use chcodec::utils::logging;
///
/// let config = Config::default();
/// logging::init(&config).expect("日志初始化失败");
/// ```
pub fn init(config: &Config) -> CodecResult<()> {
    let mut guard = LOGGER.lock().map_err(log_error)?;
    if guard.is_some() {
        return Ok(());
    }
    let handle = build_logger(&config.log)?.start().map_err(log_error)?;
    *guard = Some(handle);
    drop(guard);

    log::info!(
        "chcodec logging to {}/{} (level {}, format {})",
        config.log.dir,
        config.log.file,
        config.log.level,
        config.codec.format
    );
    Ok(())
}

/// 刷新缓冲的日志并停止后台写线程
pub fn shutdown() {
    if let Ok(mut guard) = LOGGER.lock() {
        if let Some(handle) = guard.take() {
            handle.flush();
            handle.shutdown();
        }
    }
}

pub fn is_initialized() -> bool {
    LOGGER.lock().map(|guard| guard.is_some()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_level() {
        assert!(parse_level("info").is_ok());
        assert!(parse_level("warn, chcodec::format=debug").is_ok());
    }

    #[test]
    #[serial]
    fn test_logging_init_and_shutdown() {
        let dir = tempfile::tempdir().expect("Failed to create temporary directory");
        let mut config = Config::default();
        config.log.dir = dir.path().to_string_lossy().into_owned();
        config.log.level = "debug".to_string();

        init(&config).expect("日志初始化失败");
        assert!(is_initialized());
        log::debug!("native block 1: 2 columns x 3 rows");

        shutdown();
        assert!(!is_initialized());
    }
}
