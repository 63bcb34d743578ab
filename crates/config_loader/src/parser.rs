//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use std::path::Path;

use contracts::{ContractError, MergeBlueprint};

/// UTF-8 BOM，部分 Windows 编辑器保存配置时会带上
const BOM: char = '\u{feff}';

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式 (大小写不敏感)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// 从路径推断格式
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse(format!(
                "cannot determine config format of {} (expected .toml or .json)",
                path.display()
            ))
        })?;

        Self::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    fn label(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<MergeBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| parse_error(ConfigFormat::Toml, e))
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<MergeBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| parse_error(ConfigFormat::Json, e))
}

/// 根据格式解析配置；开头的 BOM 会被忽略
pub fn parse(content: &str, format: ConfigFormat) -> Result<MergeBlueprint, ContractError> {
    let content = content.trim_start_matches(BOM);
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

fn parse_error<E>(format: ConfigFormat, err: E) -> ContractError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ContractError::ConfigParse {
        message: format!("{} parse error: {err}", format.label()),
        source: Some(Box::new(err)),
    }
}
