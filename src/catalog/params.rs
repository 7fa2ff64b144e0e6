//! Parameter schemas and validation.
//!
//! Validation runs over the whole parameter set before any handler is
//! invoked, so a bad request never reaches the store.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::store::RobotId;

use super::handlers::HandlerError;

/// Expected type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Positive integer. Accepts JSON integers, whole floats and numeric strings.
    RobotId,
    /// Finite number. Accepts JSON numbers and numeric strings.
    Number,
    /// Finite number ≥ 0.
    NonNegative,
}

/// One declared parameter of a command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    /// Value used when the parameter is absent. `None` means required.
    pub default: Option<f64>,
}

impl ParamSpec {
    pub const fn required(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            default: None,
        }
    }

    pub const fn optional(name: &'static str, kind: ParamKind, default: f64) -> Self {
        Self {
            name,
            kind,
            default: Some(default),
        }
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Why a parameter set was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("missing required parameter '{0}'")]
    Missing(&'static str),

    #[error("invalid robot id")]
    InvalidRobotId,

    #[error("parameter '{0}' must be a number")]
    NotANumber(&'static str),

    #[error("parameter '{0}' must not be negative")]
    Negative(&'static str),
}

/// Validated, typed arguments for a handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    robot_id: Option<RobotId>,
    numbers: Vec<(&'static str, f64)>,
}

impl Args {
    pub fn robot_id(&self) -> Result<RobotId, HandlerError> {
        self.robot_id
            .ok_or_else(|| HandlerError::Argument("robotId".to_string()))
    }

    pub fn number(&self, name: &str) -> Result<f64, HandlerError> {
        self.numbers
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
            .ok_or_else(|| HandlerError::Argument(name.to_string()))
    }
}

/// Check `params` against `specs`. Unknown extra parameters are ignored and
/// `null` counts as absent.
pub fn validate(specs: &[ParamSpec], params: &Map<String, Value>) -> Result<Args, ParamError> {
    let mut args = Args::default();

    for spec in specs {
        let Some(value) = params.get(spec.name).filter(|value| !value.is_null()) else {
            match spec.default {
                Some(default) => {
                    args.numbers.push((spec.name, default));
                    continue;
                }
                None => return Err(ParamError::Missing(spec.name)),
            }
        };

        match spec.kind {
            ParamKind::RobotId => {
                args.robot_id = Some(parse_robot_id(value).ok_or(ParamError::InvalidRobotId)?);
            }
            ParamKind::Number => {
                let number = parse_number(value).ok_or(ParamError::NotANumber(spec.name))?;
                args.numbers.push((spec.name, number));
            }
            ParamKind::NonNegative => {
                let number = parse_number(value).ok_or(ParamError::NotANumber(spec.name))?;
                if number < 0.0 {
                    return Err(ParamError::Negative(spec.name));
                }
                args.numbers.push((spec.name, number));
            }
        }
    }

    Ok(args)
}

fn parse_robot_id(value: &Value) -> Option<RobotId> {
    let raw = match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 1.0 && *f <= f64::from(u32::MAX))
                .map(|f| f as u64)
        }),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    u32::try_from(raw).ok().and_then(RobotId::new)
}

fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|number| number.is_finite())
}
