//! 配置校验模块
//!
//! 校验规则：
//! - 字段级规则 (validator derive)：至少一个输入文件、至少一个通道、frequency_hz > 0
//! - 通道名清洗后非空 (重复名只保留第一次出现，并给出提示)
//! - 触发需要时间通道 (timestamp 或 tick)，阈值必须有限
//! - 流式写出与触发互斥
//! - 分隔符不能与换行/引号冲突

use std::collections::HashSet;

use contracts::{clean_channel_name, ContractError, MergeBlueprint};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// 校验 MergeBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &MergeBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_selected_channels(blueprint)?;
    validate_trigger(blueprint)?;
    validate_streaming(blueprint)?;
    validate_delimiters(blueprint)?;
    Ok(())
}

/// 非致命提示：配置合法，但行为可能不符合预期
pub fn warnings(blueprint: &MergeBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.output.streaming && blueprint.output.frequency_hz.is_some() {
        warnings.push(
            "streaming with frequency_hz resamples on a grid anchored at the first file".into(),
        );
    }
    if blueprint.channels.timestamp.is_none() && blueprint.channels.tick.is_none() {
        warnings.push("no timestamp or tick channel: time columns will stay empty".into());
    }
    if blueprint.baseline.is_some() && blueprint.trigger.is_some() {
        warnings.push("explicit baseline is only used when the trigger is not found".into());
    }
    for name in duplicate_channels(blueprint) {
        warnings.push(format!(
            "channel '{name}' is selected more than once; only the first occurrence is kept"
        ));
    }

    warnings
}

/// 字段级规则
fn validate_fields(blueprint: &MergeBlueprint) -> Result<(), ContractError> {
    match blueprint.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let (field, message) = first_error(&errors, String::new())
                .unwrap_or_else(|| ("<root>".to_string(), errors.to_string()));
            Err(ContractError::config_validation(field, message))
        }
    }
}

/// 按字段路径排序后取第一个错误，保证输出稳定
fn first_error(errors: &ValidationErrors, prefix: String) -> Option<(String, String)> {
    let mut entries: Vec<_> = errors.errors().iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (name, kind) in entries {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };
        let found = match kind {
            ValidationErrorsKind::Field(list) => list.first().map(|e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                (path.clone(), message)
            }),
            ValidationErrorsKind::Struct(inner) => first_error(inner, path.clone()),
            ValidationErrorsKind::List(items) => items
                .iter()
                .find_map(|(idx, inner)| first_error(inner, format!("{path}[{idx}]"))),
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

/// 校验通道名清洗后非空；重复名由 `to_merge_config` 去重
fn validate_selected_channels(blueprint: &MergeBlueprint) -> Result<(), ContractError> {
    for (idx, raw) in blueprint.channels.selected.iter().enumerate() {
        if clean_channel_name(raw).is_empty() {
            return Err(ContractError::config_validation(
                format!("channels.selected[{idx}]"),
                "channel name is empty after cleaning",
            ));
        }
    }
    Ok(())
}

/// 清洗后重复的通道名 (第一次出现之后的每一次)
fn duplicate_channels(blueprint: &MergeBlueprint) -> Vec<String> {
    let mut seen = HashSet::new();
    blueprint
        .channels
        .selected
        .iter()
        .map(|raw| clean_channel_name(raw))
        .filter(|cleaned| !cleaned.is_empty() && !seen.insert(cleaned.clone()))
        .collect()
}

/// 校验触发配置
fn validate_trigger(blueprint: &MergeBlueprint) -> Result<(), ContractError> {
    let Some(trigger) = &blueprint.trigger else {
        return Ok(());
    };

    if !trigger.threshold.is_finite() {
        return Err(ContractError::config_validation(
            "trigger.threshold",
            format!("threshold must be finite, got {}", trigger.threshold),
        ));
    }

    if blueprint.channels.timestamp.is_none() && blueprint.channels.tick.is_none() {
        return Err(ContractError::config_validation(
            "trigger",
            "a trigger requires a timestamp or tick channel",
        ));
    }

    Ok(())
}

/// 流式写出不保留整次运行，不能做触发定位
fn validate_streaming(blueprint: &MergeBlueprint) -> Result<(), ContractError> {
    if blueprint.output.streaming && blueprint.trigger.is_some() {
        return Err(ContractError::config_validation(
            "output.streaming",
            "streaming is incompatible with a trigger (trigger search needs the whole run)",
        ));
    }
    Ok(())
}

/// 校验分隔符
fn validate_delimiters(blueprint: &MergeBlueprint) -> Result<(), ContractError> {
    let checks = [
        ("inputs.delimiter", blueprint.inputs.delimiter),
        ("output.delimiter", blueprint.output.delimiter),
    ];
    for (field, delimiter) in checks {
        if matches!(delimiter, '\n' | '\r' | '"') || !delimiter.is_ascii() {
            return Err(ContractError::config_validation(
                field,
                format!("unsupported delimiter {delimiter:?}"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        ChannelsConfig, ConfigVersion, InputsConfig, OutputConfig, TriggerConfig,
    };
    use std::path::PathBuf;

    fn minimal_blueprint() -> MergeBlueprint {
        MergeBlueprint {
            version: ConfigVersion::V1,
            inputs: InputsConfig {
                files: vec![PathBuf::from("run_01.csv")],
                delimiter: ',',
            },
            channels: ChannelsConfig {
                selected: vec!["Pressure".into(), "Temp".into()],
                timestamp: Some("Time".into()),
                tick: None,
            },
            trigger: None,
            output: OutputConfig {
                path: PathBuf::from("merged.csv"),
                frequency_hz: None,
                streaming: false,
                delimiter: ',',
            },
            baseline: None,
        }
    }

    #[test]
    fn test_valid_config() {
        let bp = minimal_blueprint();
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_invalid_frequency() {
        let mut bp = minimal_blueprint();
        bp.output.frequency_hz = Some(-5.0);
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("frequency_hz must be > 0"), "got: {err}");
        assert!(err.contains("output.frequency_hz"), "got: {err}");
    }

    #[test]
    fn test_no_input_files() {
        let mut bp = minimal_blueprint();
        bp.inputs.files.clear();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("at least one input file"), "got: {err}");
    }

    #[test]
    fn test_duplicate_channel_after_cleaning_is_kept_once() {
        let mut bp = minimal_blueprint();
        bp.channels.selected.push(" 'Pressure' ".into());

        assert!(validate(&bp).is_ok());
        let warnings = warnings(&bp);
        assert!(
            warnings.iter().any(|w| w.contains("'Pressure' is selected more than once")),
            "got: {warnings:?}"
        );
        let selected = bp.to_merge_config().selected_channels;
        assert_eq!(
            selected.iter().filter(|c| c.as_str() == "Pressure").count(),
            1
        );
    }

    #[test]
    fn test_channel_empty_after_cleaning() {
        let mut bp = minimal_blueprint();
        bp.channels.selected.push(" '' ".into());
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_trigger_requires_time_channel() {
        let mut bp = minimal_blueprint();
        bp.channels.timestamp = None;
        bp.trigger = Some(TriggerConfig {
            channel: "Trig".into(),
            threshold: 1.0,
        });
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("requires a timestamp or tick"), "got: {err}");
    }

    #[test]
    fn test_non_finite_threshold() {
        let mut bp = minimal_blueprint();
        bp.trigger = Some(TriggerConfig {
            channel: "Trig".into(),
            threshold: f64::NAN,
        });
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("must be finite"), "got: {err}");
    }

    #[test]
    fn test_streaming_with_trigger_rejected() {
        let mut bp = minimal_blueprint();
        bp.output.streaming = true;
        bp.trigger = Some(TriggerConfig {
            channel: "Trig".into(),
            threshold: 1.0,
        });
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("incompatible with a trigger"), "got: {err}");
    }

    #[test]
    fn test_bad_delimiter() {
        let mut bp = minimal_blueprint();
        bp.output.delimiter = '"';
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("output.delimiter"), "got: {err}");
    }

    #[test]
    fn test_streaming_frequency_warning() {
        let mut bp = minimal_blueprint();
        bp.output.streaming = true;
        bp.output.frequency_hz = Some(10.0);
        assert!(validate(&bp).is_ok());
        let warnings = warnings(&bp);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("anchored at the first file"));
    }
}
