//! Bit/byte converters that decide how bandwidth and sizes are displayed.

use std::{
    fmt,
    str::FromStr,
    sync::{Arc, PoisonError, RwLock},
};

use once_cell::sync::Lazy;

use super::{
    error::{ValueError, ValueResult},
    number::{convert_unit, Number, NumberKind, NumberOptions, Prefix},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataUnit {
    Bit,
    #[default]
    Byte,
}

impl DataUnit {
    pub fn short(self) -> &'static str {
        match self {
            DataUnit::Bit => "b",
            DataUnit::Byte => "B",
        }
    }

    pub fn long(self) -> &'static str {
        match self {
            DataUnit::Bit => "bit",
            DataUnit::Byte => "byte",
        }
    }
}

impl FromStr for DataUnit {
    type Err = ValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "bit" | "bits" | "b" => Ok(DataUnit::Bit),
            "byte" | "bytes" | "B" => Ok(DataUnit::Byte),
            _ => Err(ValueError::invalid("Unit must be 'bit' or 'byte'")),
        }
    }
}

impl fmt::Display for DataUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.long())
    }
}

/// Converts numbers to one configured data unit and prefix family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnitConverter {
    unit: DataUnit,
    prefix: Prefix,
}

impl UnitConverter {
    pub fn new(unit: DataUnit, prefix: Prefix) -> Self {
        Self { unit, prefix }
    }

    pub fn unit(&self) -> DataUnit {
        self.unit
    }

    pub fn set_unit(&mut self, unit: &str) -> ValueResult<()> {
        self.unit = unit.parse()?;
        Ok(())
    }

    pub fn prefix(&self) -> Prefix {
        self.prefix
    }

    pub fn set_prefix(&mut self, prefix: &str) -> ValueResult<()> {
        self.prefix = match prefix {
            "binary" => Prefix::Binary,
            "metric" => Prefix::Metric,
            _ => return Err(ValueError::invalid("Prefix must be 'binary' or 'metric'")),
        };
        Ok(())
    }

    /// Convert `number` to the configured unit; a unitless number is assumed
    /// to already be in it.
    pub fn convert(&self, number: &Number) -> ValueResult<Number> {
        let target = self.unit.short();
        let given = number.unit().unwrap_or(target);
        if given != "b" && given != "B" {
            return Err(ValueError::invalid(format!(
                "Unit must be 'b' (bit) or 'B' (byte), not '{given}'"
            )));
        }
        let value = convert_unit(number.value(), given, target)?;
        let kind = if value.is_finite() && value.fract() == 0.0 {
            NumberKind::Int
        } else {
            NumberKind::Float
        };
        let options = NumberOptions::new()
            .unit(target)
            .prefix(self.prefix)
            .hide_unit(number.hide_unit());
        Number::from_f64(value, kind, &options)
    }

    /// Like [`convert`](Self::convert) for a raw magnitude measured in `unit`
    /// (the configured unit when `None`).
    pub fn convert_f64(&self, value: f64, unit: Option<&str>) -> ValueResult<Number> {
        let options = NumberOptions::new()
            .unit(unit.unwrap_or(self.unit.short()))
            .prefix(self.prefix);
        self.convert(&Number::from_f64(value, NumberKind::Float, &options)?)
    }

    /// Parse user input such as `"10MB"` or `"5 Mib"`.
    pub fn parse(&self, text: &str, unit: Option<&str>) -> ValueResult<Number> {
        let options = NumberOptions::new()
            .unit(unit.unwrap_or(self.unit.short()))
            .prefix(self.prefix);
        self.convert(&Number::parse(text, NumberKind::Float, &options)?)
    }
}

/// A [`UnitConverter`] shared between the settings that configure it and the
/// code that renders with it.
#[derive(Debug, Clone, Default)]
pub struct SharedConverter(Arc<RwLock<UnitConverter>>);

impl SharedConverter {
    pub fn new(converter: UnitConverter) -> Self {
        Self(Arc::new(RwLock::new(converter)))
    }

    pub fn snapshot(&self) -> UnitConverter {
        *self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_unit(&self, unit: &str) -> ValueResult<()> {
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_unit(unit)
    }

    pub fn set_prefix(&self, prefix: &str) -> ValueResult<()> {
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_prefix(prefix)
    }

    pub fn convert(&self, number: &Number) -> ValueResult<Number> {
        self.snapshot().convert(number)
    }

    pub fn convert_f64(&self, value: f64, unit: Option<&str>) -> ValueResult<Number> {
        self.snapshot().convert_f64(value, unit)
    }

    pub fn parse(&self, text: &str, unit: Option<&str>) -> ValueResult<Number> {
        self.snapshot().parse(text, unit)
    }
}

static BANDWIDTH: Lazy<SharedConverter> = Lazy::new(SharedConverter::default);
static SIZE: Lazy<SharedConverter> = Lazy::new(SharedConverter::default);

/// Process-wide converter for transfer rates.
pub fn bandwidth() -> SharedConverter {
    BANDWIDTH.clone()
}

/// Process-wide converter for data sizes.
pub fn size() -> SharedConverter {
    SIZE.clone()
}

/// The pair of converters settings and renderers agree on.
#[derive(Debug, Clone, Default)]
pub struct Converters {
    pub bandwidth: SharedConverter,
    pub size: SharedConverter,
}

impl Converters {
    pub fn global() -> Self {
        Self {
            bandwidth: bandwidth(),
            size: size(),
        }
    }
}
