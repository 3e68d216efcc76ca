//! 配置校验模块
//!
//! 校验规则：
//! - network: host 非空, max_datagram_size > 0, read_timeout_ms > 0
//! - queue: drop_oldest 时 capacity > 0
//! - dispatch: poll_interval_ms > 0
//! - layout: 字段位置互不重复, 至少一个油箱
//! - bus: rate_hz > 0, 绑定的参数名合法

use std::collections::HashMap;

use contracts::{ContractError, EfisBlueprint, ParameterKind, QueuePolicyKind};

/// 校验 EfisBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &EfisBlueprint) -> Result<(), ContractError> {
    validate_network(blueprint)?;
    validate_queue(blueprint)?;
    validate_dispatch(blueprint)?;
    validate_layout(blueprint)?;
    validate_bus(blueprint)?;
    Ok(())
}

/// 校验网络接收配置
fn validate_network(blueprint: &EfisBlueprint) -> Result<(), ContractError> {
    let network = &blueprint.network;
    if network.host.trim().is_empty() {
        return Err(ContractError::config_validation(
            "network.host",
            "host cannot be empty",
        ));
    }
    if network.max_datagram_size == 0 {
        return Err(ContractError::config_validation(
            "network.max_datagram_size",
            "max_datagram_size must be > 0",
        ));
    }
    // set_read_timeout rejects a zero duration
    if network.read_timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "network.read_timeout_ms",
            "read_timeout_ms must be > 0",
        ));
    }
    Ok(())
}

/// 校验队列策略
fn validate_queue(blueprint: &EfisBlueprint) -> Result<(), ContractError> {
    let queue = &blueprint.queue;
    if queue.policy == QueuePolicyKind::DropOldest && queue.capacity == 0 {
        return Err(ContractError::config_validation(
            "queue.capacity",
            "capacity must be > 0 for drop_oldest",
        ));
    }
    Ok(())
}

/// 校验分发节拍
fn validate_dispatch(blueprint: &EfisBlueprint) -> Result<(), ContractError> {
    if blueprint.dispatch.poll_interval_ms == 0 {
        return Err(ContractError::config_validation(
            "dispatch.poll_interval_ms",
            "poll_interval_ms must be > 0",
        ));
    }
    Ok(())
}

/// 校验帧字段布局
fn validate_layout(blueprint: &EfisBlueprint) -> Result<(), ContractError> {
    let layout = &blueprint.layout;
    if layout.fuel_tanks.is_empty() {
        return Err(ContractError::config_validation(
            "layout.fuel_tanks",
            "at least one fuel tank field is required",
        ));
    }

    let mut seen: HashMap<usize, &str> = HashMap::new();
    for (field, index) in layout.mapped_fields() {
        if let Some(previous) = seen.insert(index, field) {
            return Err(ContractError::config_validation(
                format!("layout.{field}"),
                format!("position {index} already used by {previous}"),
            ));
        }
    }
    Ok(())
}

/// 校验总线配置
fn validate_bus(blueprint: &EfisBlueprint) -> Result<(), ContractError> {
    let bus = &blueprint.bus;
    if !(bus.rate_hz > 0.0 && bus.rate_hz.is_finite()) {
        return Err(ContractError::config_validation(
            "bus.rate_hz",
            format!("rate_hz must be > 0, got {}", bus.rate_hz),
        ));
    }

    for (idx, binding) in bus.bindings.iter().flatten().enumerate() {
        if ParameterKind::from_name(&binding.parameter).is_none() {
            return Err(ContractError::config_validation(
                format!("bus.bindings[{idx}].parameter"),
                format!("unknown parameter '{}'", binding.parameter),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{BindingConfig, Instrument};

    #[test]
    fn test_default_blueprint_is_valid() {
        assert!(validate(&EfisBlueprint::default()).is_ok());
    }

    #[test]
    fn test_zero_read_timeout() {
        let mut bp = EfisBlueprint::default();
        bp.network.read_timeout_ms = 0;
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("network.read_timeout_ms"));
    }

    #[test]
    fn test_empty_host() {
        let mut bp = EfisBlueprint::default();
        bp.network.host = " ".to_string();
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_drop_oldest_needs_capacity() {
        let mut bp = EfisBlueprint::default();
        bp.queue.capacity = 0;
        assert!(validate(&bp).is_ok(), "capacity ignored when unbounded");

        bp.queue.policy = QueuePolicyKind::DropOldest;
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("queue.capacity"));
    }

    #[test]
    fn test_zero_poll_interval() {
        let mut bp = EfisBlueprint::default();
        bp.dispatch.poll_interval_ms = 0;
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_overlapping_layout_positions() {
        let mut bp = EfisBlueprint::default();
        bp.layout.rpm = bp.layout.egt;
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("already used"));

        let mut bp = EfisBlueprint::default();
        bp.layout.fuel_tanks = vec![12, 12];
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_no_fuel_tanks() {
        let mut bp = EfisBlueprint::default();
        bp.layout.fuel_tanks.clear();
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_bus_rate() {
        let mut bp = EfisBlueprint::default();
        bp.bus.rate_hz = 0.0;
        assert!(validate(&bp).is_err());
        bp.bus.rate_hz = f64::NAN;
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_unknown_binding_parameter() {
        let mut bp = EfisBlueprint::default();
        bp.bus.bindings = Some(vec![
            BindingConfig {
                parameter: "Heading".to_string(),
                instrument: Instrument::Heading,
            },
            BindingConfig {
                parameter: "Warp Factor".to_string(),
                instrument: Instrument::Rpm,
            },
        ]);
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("bus.bindings[1].parameter"));
    }
}
