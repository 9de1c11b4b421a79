use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::codec::{CodecError, CodecResult};
use crate::format::Format;

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub codec: CodecConfig,
    pub log: LogConfig,
}

/// 编解码相关配置
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct CodecConfig {
    /// 读写使用的格式
    pub format: Format,
    /// UInt8/16/32 解码为更宽的有符号整数
    pub widen_unsigned_types: bool,
    /// String/FixedString 解码为原始字节
    pub use_binary_string: bool,
    /// 服务端时区，Date 的线上表示以它为准
    pub server_time_zone: String,
    /// 未声明时区的 DateTime 列使用的时区
    pub use_time_zone: Option<String>,
    /// Date/Date32 换算到的时区
    pub date_time_zone: Option<String>,
    /// 列式格式写入时每块的行数
    pub block_rows: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            format: Format::RowBinary,
            widen_unsigned_types: false,
            use_binary_string: false,
            server_time_zone: "UTC".to_string(),
            use_time_zone: None,
            date_time_zone: None,
            block_rows: 65_536,
        }
    }
}

fn parse_zone(key: &str, name: &str) -> CodecResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| CodecError::Config(format!("{}: unknown time zone '{}'", key, name)))
}

impl CodecConfig {
    pub fn server_zone(&self) -> CodecResult<Tz> {
        parse_zone("server_time_zone", &self.server_time_zone)
    }

    pub fn use_zone(&self) -> CodecResult<Option<Tz>> {
        self.use_time_zone
            .as_deref()
            .map(|name| parse_zone("use_time_zone", name))
            .transpose()
    }

    pub fn date_zone(&self) -> CodecResult<Option<Tz>> {
        self.date_time_zone
            .as_deref()
            .map(|name| parse_zone("date_time_zone", name))
            .transpose()
    }

    pub fn validate(&self) -> CodecResult<()> {
        self.server_zone()?;
        self.use_zone()?;
        self.date_zone()?;
        if self.block_rows == 0 {
            return Err(CodecError::Config("block_rows must be positive".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub dir: String,
    pub file: String,
    pub max_file_size: u64,
    pub max_files: usize,
    /// 同时把 warn 及以上的日志输出到标准错误
    pub duplicate_to_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: "logs".to_string(),
            file: "chcodec".to_string(),
            max_file_size: 100 * 1024 * 1024, // 100MB
            max_files: 5,
            duplicate_to_stderr: false,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> CodecResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| CodecError::Config(e.to_string()))?;
        config.codec.validate()?;
        crate::utils::logging::parse_level(&config.log.level)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> CodecResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| CodecError::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }
}
