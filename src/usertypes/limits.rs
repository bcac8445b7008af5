//! Types for transfer rates, rate limits and ports.

use std::sync::{Arc, Mutex, PoisonError};

use super::{
    convert::SharedConverter,
    error::{ValueError, ValueResult},
    multi::{MultiType, Union, UnionHooks},
    number::{NumberKind, NumberOptions, NUMBER_SYNTAX},
    types::{split_adjustment, BoolType, ConstantType, NumberType, ValueType},
    value::{Constant, Value},
};

/// Numbers measured in the unit and prefix of a [`SharedConverter`].
#[derive(Debug, Clone)]
pub struct BandwidthType {
    converter: SharedConverter,
}

impl BandwidthType {
    pub fn new(converter: SharedConverter) -> Self {
        Self { converter }
    }
}

impl ValueType for BandwidthType {
    fn typename(&self) -> String {
        "bandwidth".to_string()
    }

    fn syntax(&self) -> String {
        format!("{NUMBER_SYNTAX}[b|B]")
    }

    fn convert(&self, raw: &Value, current: Option<&Value>) -> ValueResult<Value> {
        let number = match raw {
            Value::Text(text) => match split_adjustment(text) {
                Some((op, amount)) => {
                    let base = match current.and_then(Value::as_number) {
                        Some(number) => self.converter.convert(number)?,
                        None => self.converter.convert_f64(0.0, None)?,
                    };
                    let amount = self.converter.parse(amount, None)?;
                    base.combine(&amount, op)?
                }
                None => self.converter.parse(text, None)?,
            },
            Value::Number(number) => self.converter.convert(number)?,
            _ => return Err(ValueError::invalid("Not a number")),
        };
        Ok(Value::Number(number))
    }

    fn validate(&self, value: &Value) -> ValueResult<()> {
        match value {
            Value::Number(_) => Ok(()),
            _ => Err(ValueError::invalid("Not a number")),
        }
    }

    fn holds(&self, value: &Value) -> bool {
        matches!(value, Value::Number(_))
    }

    fn string(&self, value: &Value) -> String {
        match value.as_number().map(|number| self.converter.convert(number)) {
            Some(Ok(number)) => number.to_string(),
            _ => value.to_string(),
        }
    }
}

/// Maps booleans and out-of-range numbers of a rate limit union onto
/// bandwidths and [`Constant::Unlimited`].
#[derive(Debug)]
pub struct RateLimitHooks {
    converter: SharedConverter,
    previous: Mutex<Option<Value>>,
}

impl RateLimitHooks {
    pub fn new(converter: SharedConverter) -> Self {
        Self {
            converter,
            previous: Mutex::new(None),
        }
    }

    fn previous_limit(&self) -> ValueResult<Value> {
        let previous = self
            .previous
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match previous {
            Some(value) => Ok(value),
            None => Ok(Value::Number(self.converter.convert_f64(0.0, None)?)),
        }
    }
}

impl UnionHooks for RateLimitHooks {
    fn convert(&self, members: &MultiType, raw: &Value, current: Option<&Value>) -> ValueResult<Value> {
        // adjustments only build on an actual bandwidth
        let baseline = current.filter(|value| value.as_number().is_some());
        let value = members.convert(raw, baseline)?;
        Ok(match value {
            Value::Bool(true) => self.previous_limit()?,
            Value::Bool(false) => Value::Constant(Constant::Unlimited),
            Value::Number(number) if number < 0.0 || number.is_infinite() => {
                Value::Constant(Constant::Unlimited)
            }
            other => other,
        })
    }

    fn committed(&self, members: &MultiType, value: &Value) {
        if value.as_number().is_some() {
            *self.previous.lock().unwrap_or_else(PoisonError::into_inner) = Some(value.clone());
        }
        members.committed(value);
    }
}

pub type RateLimitType = Union<RateLimitHooks>;

/// A boolean, `unlimited` or a bandwidth.
pub fn rate_limit(converter: SharedConverter) -> ValueResult<RateLimitType> {
    Union::new(
        vec![
            Arc::new(BoolType::new()),
            Arc::new(ConstantType(Constant::Unlimited)),
            Arc::new(BandwidthType::new(converter.clone())),
        ],
        RateLimitHooks::new(converter),
    )
}

/// A TCP port or `random`.
pub fn port() -> ValueResult<MultiType> {
    let number = NumberType::new(NumberKind::Int, NumberOptions::new().min(1.0).max(65535.0))?;
    MultiType::new(vec![Arc::new(number), Arc::new(ConstantType(Constant::Random))])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usertypes::{
        convert::{DataUnit, UnitConverter},
        number::Prefix,
    };

    fn text(value: &str) -> Value {
        Value::from(value)
    }

    #[test]
    fn bandwidth_parses_in_converter_unit() {
        let conv = SharedConverter::default();
        let ty = BandwidthType::new(conv.clone());
        let value = ty.parse(&text("100k"), None).unwrap();
        assert_eq!(ty.string(&value), "100kB");
        let value = ty.parse(&text("8Mb"), None).unwrap();
        assert_eq!(ty.string(&value), "1MB");
        conv.set_unit("bit").unwrap();
        assert_eq!(ty.string(&value), "8Mb");
        assert_eq!(ty.syntax(), "<NUMBER>[Ti|Gi|Mi|Ki|T|G|M|k][b|B]");
    }

    #[test]
    fn bandwidth_adjustment_converts_amount() {
        let conv = SharedConverter::new(UnitConverter::new(DataUnit::Byte, Prefix::Metric));
        let ty = BandwidthType::new(conv);
        let current = ty.parse(&text("1M"), None).unwrap();
        let value = ty.parse(&text("+=800kb"), Some(&current)).unwrap();
        assert_eq!(value.as_number().unwrap().value(), 1_100_000.0);
    }

    #[test]
    fn rate_limit_booleans_and_unlimited() {
        let ty = rate_limit(SharedConverter::default()).unwrap();
        assert_eq!(
            ty.parse(&text("off"), None).unwrap(),
            Value::Constant(Constant::Unlimited)
        );
        assert_eq!(
            ty.parse(&text("unlimited"), None).unwrap(),
            Value::Constant(Constant::Unlimited)
        );
        assert_eq!(
            ty.parse(&text("-1"), None).unwrap(),
            Value::Constant(Constant::Unlimited)
        );
        assert_eq!(ty.parse(&text("on"), None).unwrap(), Value::from(0.0));
    }

    #[test]
    fn rate_limit_true_restores_previous_bandwidth() {
        let ty = rate_limit(SharedConverter::default()).unwrap();
        let limit = ty.parse(&text("250k"), None).unwrap();
        ty.committed(&limit);
        let off = ty.parse(&text("false"), Some(&limit)).unwrap();
        ty.committed(&off);
        let on = ty.parse(&text("true"), Some(&off)).unwrap();
        assert_eq!(ty.string(&on), "250kB");
    }

    #[test]
    fn rate_limit_adjusts_from_zero_after_unlimited() {
        let ty = rate_limit(SharedConverter::default()).unwrap();
        let unlimited = Value::Constant(Constant::Unlimited);
        let value = ty.parse(&text("+=100kB"), Some(&unlimited)).unwrap();
        assert_eq!(value.as_number().unwrap().value(), 100_000.0);
        let value = ty.parse(&text("-=50k"), Some(&value)).unwrap();
        assert_eq!(ty.string(&value), "50kB");
        let value = ty.parse(&text("-=60k"), Some(&value)).unwrap();
        assert_eq!(value, Value::Constant(Constant::Unlimited));
    }

    #[test]
    fn rate_limit_error_lists_every_member() {
        let ty = rate_limit(SharedConverter::default()).unwrap();
        assert_eq!(
            ty.parse(&text("zzz"), None).unwrap_err().to_string(),
            "Not a boolean; Not 'unlimited'; Not a number"
        );
        assert_eq!(ty.typename(), "boolean or bandwidth");
    }

    #[test]
    fn port_accepts_numbers_and_random() {
        let ty = port().unwrap();
        assert_eq!(ty.parse(&text("51413"), None).unwrap(), Value::from(51413_i64));
        assert_eq!(
            ty.parse(&text("random"), None).unwrap(),
            Value::Constant(Constant::Random)
        );
        assert_eq!(
            ty.parse(&text("70000"), None).unwrap_err().to_string(),
            "Too big (maximum is 65535); Not 'random'"
        );
    }
}
