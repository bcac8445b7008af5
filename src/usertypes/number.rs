//! Numbers that carry a unit label and a metric/binary prefix family.

use std::{cmp::Ordering, fmt, str::FromStr};

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::error::{ValueError, ValueResult};

const NOT_A_NUMBER: &str = "Not a number";

static NUMBER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*([-+]?(?:\d+\.\d+|\d+|\.\d+|inf)) ?(Ti|T|Gi|G|Mi|M|Ki|k|)([^\s0-9]*?)\s*$",
    )
    .unwrap_or_else(|err| panic!("invalid number pattern: {err}"))
});

const BINARY_PREFIXES: [(&str, f64); 4] = [
    ("Ti", 1_099_511_627_776.0),
    ("Gi", 1_073_741_824.0),
    ("Mi", 1_048_576.0),
    ("Ki", 1024.0),
];

const METRIC_PREFIXES: [(&str, f64); 4] = [
    ("T", 1e12),
    ("G", 1e9),
    ("M", 1e6),
    ("k", 1e3),
];

/// Syntax accepted by every number parser.
pub const NUMBER_SYNTAX: &str = "<NUMBER>[Ti|Gi|Mi|Ki|T|G|M|k]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Prefix {
    #[default]
    Metric,
    Binary,
    /// Render the plain magnitude.
    None,
}

impl Prefix {
    pub fn as_str(self) -> &'static str {
        match self {
            Prefix::Metric => "metric",
            Prefix::Binary => "binary",
            Prefix::None => "none",
        }
    }

    fn table(self) -> &'static [(&'static str, f64)] {
        match self {
            Prefix::Metric => &METRIC_PREFIXES,
            Prefix::Binary => &BINARY_PREFIXES,
            Prefix::None => &[],
        }
    }
}

impl FromStr for Prefix {
    type Err = ValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "metric" => Ok(Prefix::Metric),
            "binary" => Ok(Prefix::Binary),
            "none" => Ok(Prefix::None),
            _ => Err(ValueError::invalid("Prefix must be 'binary' or 'metric'")),
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a number rounds its magnitude to a whole value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Int,
    Float,
}

/// Construction options shared by [`Number`] and the number value types.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberOptions {
    pub unit: Option<String>,
    pub convert_to: Option<String>,
    pub prefix: Option<Prefix>,
    pub hide_unit: Option<bool>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub autolimit: bool,
}

impl NumberOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn convert_to(mut self, unit: impl Into<String>) -> Self {
        self.convert_to = Some(unit.into());
        self
    }

    pub fn prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    pub fn hide_unit(mut self, hide: bool) -> Self {
        self.hide_unit = Some(hide);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn autolimit(mut self, autolimit: bool) -> Self {
        self.autolimit = autolimit;
        self
    }

    pub(crate) fn check_range(&self) -> ValueResult<()> {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min > max => Err(ValueError::misconfigured(format!(
                "minimum {min} is larger than maximum {max}"
            ))),
            _ => Ok(()),
        }
    }
}

/// Binary operators understood by [`Number::combine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Rem,
    Pow,
}

impl Op {
    fn apply(self, lhs: f64, rhs: f64) -> ValueResult<f64> {
        let needs_divisor = matches!(self, Op::Div | Op::FloorDiv | Op::Rem);
        if needs_divisor && rhs == 0.0 {
            return Err(ValueError::invalid("Division by zero"));
        }
        Ok(match self {
            Op::Add => lhs + rhs,
            Op::Sub => lhs - rhs,
            Op::Mul => lhs * rhs,
            Op::Div => lhs / rhs,
            Op::FloorDiv => (lhs / rhs).floor(),
            // result takes the sign of the divisor
            Op::Rem => lhs - rhs * (lhs / rhs).floor(),
            Op::Pow => lhs.powf(rhs),
        })
    }
}

/// A magnitude with an optional unit label and a prefix family for rendering.
///
/// Comparisons only look at the magnitude. `Int` numbers are rounded half away
/// from zero when constructed.
#[derive(Debug, Clone)]
pub struct Number {
    value: f64,
    kind: NumberKind,
    unit: Option<String>,
    prefix: Prefix,
    hide_unit: bool,
}

impl Number {
    /// Parse strings like `"10.5Mi"`, `"3 KiB"` or `"-inf"`.
    ///
    /// A unit label found in the string wins over `options.unit`. A one-letter
    /// prefix selects the metric family, a two-letter one the binary family.
    pub fn parse(text: &str, kind: NumberKind, options: &NumberOptions) -> ValueResult<Self> {
        let caps = NUMBER_REGEX
            .captures(text)
            .ok_or_else(|| ValueError::invalid(NOT_A_NUMBER))?;
        let mut value: f64 = caps[1]
            .parse()
            .map_err(|_| ValueError::invalid(NOT_A_NUMBER))?;
        let mut prefix = options.prefix.unwrap_or_default();
        let token = caps.get(2).map_or("", |m| m.as_str());
        if !token.is_empty() {
            value *= multiplier(token)?;
            prefix = if token.len() == 2 {
                Prefix::Binary
            } else {
                Prefix::Metric
            };
        }
        let unit = caps
            .get(3)
            .map(|m| m.as_str())
            .filter(|label| !label.is_empty())
            .map(str::to_owned)
            .or_else(|| options.unit.clone());
        Self::finish(
            value,
            unit,
            prefix,
            options.hide_unit.unwrap_or(false),
            kind,
            options,
        )
    }

    pub fn from_f64(value: f64, kind: NumberKind, options: &NumberOptions) -> ValueResult<Self> {
        Self::finish(
            value,
            options.unit.clone(),
            options.prefix.unwrap_or_default(),
            options.hide_unit.unwrap_or(false),
            kind,
            options,
        )
    }

    /// Copy `source`, keeping its unit, prefix and `hide_unit` unless `options`
    /// overrides them.
    pub fn from_number(source: &Number, kind: NumberKind, options: &NumberOptions) -> ValueResult<Self> {
        Self::finish(
            source.value,
            options.unit.clone().or_else(|| source.unit.clone()),
            options.prefix.unwrap_or(source.prefix),
            options.hide_unit.unwrap_or(source.hide_unit),
            kind,
            options,
        )
    }

    fn finish(
        mut value: f64,
        mut unit: Option<String>,
        prefix: Prefix,
        hide_unit: bool,
        kind: NumberKind,
        options: &NumberOptions,
    ) -> ValueResult<Self> {
        if value.is_nan() {
            return Err(ValueError::invalid(NOT_A_NUMBER));
        }
        if let Some(target) = options.convert_to.as_deref() {
            match unit.as_deref() {
                Some(given) if given != target => value = convert_unit(value, given, target)?,
                _ => {}
            }
            unit = Some(target.to_owned());
        }
        if kind == NumberKind::Int {
            if !value.is_finite() {
                return Err(ValueError::invalid(NOT_A_NUMBER));
            }
            value = value.round();
        }
        if let Some(min) = options.min.filter(|min| value < *min) {
            if !options.autolimit {
                return Err(ValueError::invalid(format!("Too small (minimum is {min})")));
            }
            value = min;
        } else if let Some(max) = options.max.filter(|max| value > *max) {
            if !options.autolimit {
                return Err(ValueError::invalid(format!("Too big (maximum is {max})")));
            }
            value = max;
        }
        Ok(Self {
            value,
            kind,
            unit,
            prefix,
            hide_unit,
        })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn kind(&self) -> NumberKind {
        self.kind
    }

    /// The magnitude as an integer, if it is a finite whole number.
    pub fn as_i64(&self) -> Option<i64> {
        (self.value.is_finite() && self.value.fract() == 0.0).then_some(self.value as i64)
    }

    pub fn is_infinite(&self) -> bool {
        self.value.is_infinite()
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn set_unit(&mut self, unit: Option<String>) {
        self.unit = unit;
    }

    pub fn prefix(&self) -> Prefix {
        self.prefix
    }

    pub fn set_prefix(&mut self, prefix: Prefix) {
        self.prefix = prefix;
    }

    pub fn hide_unit(&self) -> bool {
        self.hide_unit
    }

    pub fn set_hide_unit(&mut self, hide: bool) {
        self.hide_unit = hide;
    }

    /// Magnitude with the largest fitting prefix, e.g. `"1.19Mi"`.
    pub fn without_unit(&self) -> String {
        let value = self.value;
        if value == 0.0 {
            return "0".to_string();
        }
        let abs = value.abs();
        if abs.is_finite() {
            if let Some((prefix, size)) = self.prefix.table().iter().find(|(_, size)| abs >= *size) {
                return format!("{}{}", pretty_float(value / size), prefix);
            }
        }
        pretty_float(value)
    }

    pub fn with_unit(&self) -> String {
        match &self.unit {
            Some(unit) => format!("{}{}", self.without_unit(), unit),
            None => self.without_unit(),
        }
    }

    /// Apply `op` with `other`, converting `other` to this number's unit first.
    ///
    /// Whole results come back as `Int`, everything else as `Float`. The result
    /// takes unit, prefix and `hide_unit` from `self`.
    pub fn combine(&self, other: &Number, op: Op) -> ValueResult<Number> {
        let rhs = match (self.unit.as_deref(), other.unit.as_deref()) {
            (Some(mine), Some(theirs)) if mine != theirs => convert_unit(other.value, theirs, mine)?,
            _ => other.value,
        };
        let result = if self.value == f64::INFINITY {
            f64::INFINITY
        } else {
            op.apply(self.value, rhs)?
        };
        Ok(self.derive(result))
    }

    /// Floor division and remainder in one go.
    pub fn divmod(&self, other: &Number) -> ValueResult<(Number, Number)> {
        Ok((self.combine(other, Op::FloorDiv)?, self.combine(other, Op::Rem)?))
    }

    pub fn floor(&self) -> Number {
        self.derive(self.value.floor())
    }

    pub fn ceil(&self) -> Number {
        self.derive(self.value.ceil())
    }

    pub fn round(&self) -> Number {
        self.derive(self.value.round())
    }

    fn derive(&self, value: f64) -> Number {
        let kind = if value.is_finite() && value.fract() == 0.0 {
            NumberKind::Int
        } else {
            NumberKind::Float
        };
        Number {
            value,
            kind,
            unit: self.unit.clone(),
            prefix: self.prefix,
            hide_unit: self.hide_unit,
        }
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number {
            value,
            kind: NumberKind::Float,
            unit: None,
            prefix: Prefix::Metric,
            hide_unit: false,
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number {
            value: value as f64,
            kind: NumberKind::Int,
            unit: None,
            prefix: Prefix::Metric,
            hide_unit: false,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hide_unit {
            f.write_str(&self.without_unit())
        } else {
            f.write_str(&self.with_unit())
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl PartialEq<f64> for Number {
    fn eq(&self, other: &f64) -> bool {
        self.value == *other
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl PartialOrd<f64> for Number {
    fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
        self.value.partial_cmp(other)
    }
}

fn multiplier(token: &str) -> ValueResult<f64> {
    let lower = token.to_ascii_lowercase();
    BINARY_PREFIXES
        .iter()
        .chain(METRIC_PREFIXES.iter())
        .find(|(prefix, _)| prefix.to_ascii_lowercase() == lower)
        .map(|(_, size)| *size)
        .ok_or_else(|| ValueError::invalid(NOT_A_NUMBER))
}

/// Only bit/byte conversions are known.
pub(crate) fn convert_unit(value: f64, from: &str, to: &str) -> ValueResult<f64> {
    match (from, to) {
        ("B", "b") => Ok(value * 8.0),
        ("b", "B") => Ok(value / 8.0),
        _ if from == to => Ok(value),
        _ => Err(ValueError::invalid(format!("Cannot convert {from} to {to}"))),
    }
}

/// Render a float with two decimals below 10, one below 100 and none above.
pub fn pretty_float(value: f64) -> String {
    let abs = value.abs();
    if abs.is_infinite() {
        return if value < 0.0 { "-∞" } else { "∞" }.to_string();
    }
    if abs == 0.0 {
        return "0".to_string();
    }
    let abs_r2 = round_to(abs, 2);
    if abs_r2 == abs.trunc() {
        format!("{value:.0}")
    } else if abs_r2 < 10.0 {
        format!("{value:.2}")
    } else if round_to(abs, 1) < 100.0 {
        format!("{value:.1}")
    } else {
        format!("{value:.0}")
    }
}

fn round_to(value: f64, digits: usize) -> f64 {
    format!("{value:.digits$}").parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float(text: &str) -> Number {
        Number::parse(text, NumberKind::Float, &NumberOptions::new()).unwrap()
    }

    fn float_with(text: &str, options: NumberOptions) -> ValueResult<Number> {
        Number::parse(text, NumberKind::Float, &options)
    }

    #[test]
    fn parses_prefixes_and_units() {
        for (input, expected) in [
            ("1", "1"),
            ("1 Apple", "1Apple"),
            ("2kT", "2kT"),
            ("3 KiB", "3KiB"),
            ("50Gp", "50Gp"),
            ("4MJ", "4MJ"),
            ("8.9TiV", "8.90TiV"),
            ("10.3x", "10.3x"),
            ("-10Ki", "-10Ki"),
        ] {
            assert_eq!(float(input).to_string(), expected, "input {input:?}");
        }
        assert_eq!(float("3 KiB").value(), 3072.0);
        assert_eq!(float("2kT").value(), 2000.0);
        assert_eq!(float("2kT").unit(), Some("T"));
        assert_eq!(float("1 Apple").unit(), Some("Apple"));
    }

    #[test]
    fn prefix_family_follows_token_length() {
        assert_eq!(float("1Ki").prefix(), Prefix::Binary);
        assert_eq!(float("1k").prefix(), Prefix::Metric);
        let binary = NumberOptions::new().prefix(Prefix::Binary);
        assert_eq!(float_with("1k", binary.clone()).unwrap().prefix(), Prefix::Metric);
        assert_eq!(float_with("2048", binary).unwrap().to_string(), "2Ki");
    }

    #[test]
    fn unit_in_string_beats_option() {
        let num = float_with("123kF", NumberOptions::new().unit("B")).unwrap();
        assert_eq!(num.to_string(), "123kF");
        let num = float_with("123k", NumberOptions::new().unit("B")).unwrap();
        assert_eq!(num.to_string(), "123kB");
    }

    #[test]
    fn rejects_garbage() {
        for input in ["", "foo", "1.2.3", "25xx02", "k"] {
            let err = Number::parse(input, NumberKind::Float, &NumberOptions::new()).unwrap_err();
            assert_eq!(err.to_string(), "Not a number", "input {input:?}");
        }
    }

    #[test]
    fn pretty_float_precision() {
        for (value, expected) in [
            (0.009, "0.01"),
            (0.09123, "0.09"),
            (5.001, "5"),
            (8.999, "9.00"),
            (1.1, "1.10"),
            (9.09123, "9.09"),
            (10.09123, "10.1"),
            (79.999, "80.0"),
            (99.09123, "99.1"),
            (99.95, "100"),
            (123.4, "123"),
        ] {
            assert_eq!(pretty_float(value), expected, "value {value}");
        }
    }

    #[test]
    fn powers_render_in_both_prefix_families() {
        for (value, metric, binary) in [
            (1000_f64, "1k", "1000"),
            (1024_f64.powi(1), "1.02k", "1Ki"),
            (1000_f64.powi(2), "1M", "977Ki"),
            (1024_f64.powi(2), "1.05M", "1Mi"),
            (1024_f64.powi(3), "1.07G", "1Gi"),
            (1000_f64.powi(4), "1T", "931Gi"),
            (1024_f64.powi(4), "1.10T", "1Ti"),
        ] {
            for prefix in [Prefix::Metric, Prefix::Binary] {
                let options = NumberOptions::new().prefix(prefix);
                let mut num = Number::from_f64(value, NumberKind::Float, &options).unwrap();
                let mut neg = Number::from_f64(-value, NumberKind::Float, &options).unwrap();
                num.set_prefix(Prefix::Metric);
                neg.set_prefix(Prefix::Metric);
                assert_eq!(num.without_unit(), metric);
                assert_eq!(neg.without_unit(), format!("-{metric}"));
                num.set_prefix(Prefix::Binary);
                neg.set_prefix(Prefix::Binary);
                assert_eq!(num.without_unit(), binary);
                assert_eq!(neg.without_unit(), format!("-{binary}"));
            }
        }
    }

    #[test]
    fn infinity_renders_as_symbol() {
        assert_eq!(float("inf").to_string(), "∞");
        assert_eq!(float("-inf").to_string(), "-∞");
        assert_eq!(float("INF").value(), f64::INFINITY);
        let err = Number::parse("inf", NumberKind::Int, &NumberOptions::new()).unwrap_err();
        assert_eq!(err.to_string(), "Not a number");
    }

    #[test]
    fn zero_has_no_prefix() {
        let num = float_with("0", NumberOptions::new().unit("B")).unwrap();
        assert_eq!(num.to_string(), "0B");
    }

    #[test]
    fn hide_unit_switches_display() {
        let num = float_with("10k", NumberOptions::new().unit("B").hide_unit(true)).unwrap();
        assert_eq!(num.to_string(), "10k");
        assert_eq!(num.with_unit(), "10kB");
    }

    #[test]
    fn prefix_none_renders_plain_magnitude() {
        let num = float_with("12345", NumberOptions::new().prefix(Prefix::None)).unwrap();
        assert_eq!(num.to_string(), "12345");
    }

    #[test]
    fn int_kind_rounds() {
        let num = Number::parse("2.6", NumberKind::Int, &NumberOptions::new()).unwrap();
        assert_eq!(num.value(), 3.0);
        assert_eq!(num.as_i64(), Some(3));
        let num = Number::from_f64(-2.5, NumberKind::Int, &NumberOptions::new()).unwrap();
        assert_eq!(num.value(), -3.0);
    }

    #[test]
    fn min_and_max() {
        let opts = NumberOptions::new().min(0.0).max(100.0);
        let err = float_with("-1", opts.clone()).unwrap_err();
        assert_eq!(err.to_string(), "Too small (minimum is 0)");
        let err = float_with("101", opts.clone()).unwrap_err();
        assert_eq!(err.to_string(), "Too big (maximum is 100)");
        let clamped = float_with("101", opts.autolimit(true)).unwrap();
        assert_eq!(clamped.value(), 100.0);
    }

    #[test]
    fn convert_to_bits() {
        let num = float_with("10k", NumberOptions::new().unit("B").convert_to("b")).unwrap();
        assert_eq!(num.value(), 80_000.0);
        assert_eq!(num.unit(), Some("b"));
        let num = float_with("10", NumberOptions::new().convert_to("b")).unwrap();
        assert_eq!(num.value(), 10.0);
        assert_eq!(num.unit(), Some("b"));
        let err = float_with("10X", NumberOptions::new().convert_to("b")).unwrap_err();
        assert_eq!(err.to_string(), "Cannot convert X to b");
    }

    #[test]
    fn copy_keeps_unit_and_prefix_unless_overridden() {
        let source = float_with("1Ki", NumberOptions::new().unit("B")).unwrap();
        let copy = Number::from_number(&source, NumberKind::Float, &NumberOptions::new()).unwrap();
        assert_eq!(copy.to_string(), "1KiB");
        let copy = Number::from_number(
            &source,
            NumberKind::Float,
            &NumberOptions::new().prefix(Prefix::Metric).unit("X"),
        )
        .unwrap();
        assert_eq!(copy.to_string(), "1.02kX");
    }

    #[test]
    fn arithmetic_result_kind_follows_wholeness() {
        let a = Number::from(2.5);
        let b = Number::from(1.5);
        let sum = a.combine(&b, Op::Add).unwrap();
        assert_eq!(sum.kind(), NumberKind::Int);
        assert_eq!(sum.value(), 4.0);

        let five = Number::from(5_i64);
        let rem = five.combine(&Number::from(0.3), Op::Rem).unwrap();
        assert_eq!(rem.kind(), NumberKind::Float);

        let one = Number::from(1_i64).combine(&Number::from(0.5), Op::Add).unwrap();
        assert_eq!(one.kind(), NumberKind::Float);
        assert_eq!(one.value(), 1.5);

        let inf = Number::from(f64::INFINITY).combine(&Number::from(2.0), Op::Div).unwrap();
        assert!(inf.is_infinite());
        assert_eq!(inf.kind(), NumberKind::Float);
    }

    #[test]
    fn remainder_takes_sign_of_divisor() {
        let rem = Number::from(-7_i64).combine(&Number::from(3_i64), Op::Rem).unwrap();
        assert_eq!(rem.value(), 2.0);
        let (quot, rem) = Number::from(7_i64).divmod(&Number::from(2_i64)).unwrap();
        assert_eq!((quot.value(), rem.value()), (3.0, 1.0));
        let err = Number::from(1_i64).combine(&Number::from(0_i64), Op::Div).unwrap_err();
        assert_eq!(err.to_string(), "Division by zero");
    }

    #[test]
    fn arithmetic_copies_presentation_from_left_operand() {
        let a = Number::from_f64(1e6, NumberKind::Float, &NumberOptions::new().prefix(Prefix::Binary)).unwrap();
        let b = Number::from_f64(
            250e3,
            NumberKind::Float,
            &NumberOptions::new().prefix(Prefix::Metric).hide_unit(true),
        )
        .unwrap();
        assert_eq!(a.combine(&b, Op::Add).unwrap().to_string(), "1.19Mi");
    }

    #[test]
    fn arithmetic_converts_to_common_unit() {
        let a = Number::from_f64(
            10e3,
            NumberKind::Float,
            &NumberOptions::new().unit("B").prefix(Prefix::Metric),
        )
        .unwrap();
        let b = Number::from_f64(
            10240.0,
            NumberKind::Float,
            &NumberOptions::new().unit("b").prefix(Prefix::Binary),
        )
        .unwrap();
        assert_eq!(a.combine(&b, Op::Add).unwrap().to_string(), "11.3kB");

        let apples = Number::from_f64(1.0, NumberKind::Float, &NumberOptions::new().unit("Apple")).unwrap();
        let err = a.combine(&apples, Op::Add).unwrap_err();
        assert_eq!(err.to_string(), "Cannot convert Apple to B");
    }

    #[test]
    fn rounding_helpers_produce_ints() {
        let num = Number::from(5.4);
        assert_eq!(num.round().kind(), NumberKind::Int);
        assert_eq!(num.floor().value(), 5.0);
        assert_eq!(num.ceil().value(), 6.0);
    }

    #[test]
    fn comparison_ignores_unit() {
        let bytes = float_with("1k", NumberOptions::new().unit("B")).unwrap();
        assert_eq!(bytes, 1000.0);
        assert!(bytes < float("2k"));
    }

    #[test]
    fn prefix_from_str() {
        assert_eq!("binary".parse::<Prefix>().unwrap(), Prefix::Binary);
        let err = "foo".parse::<Prefix>().unwrap_err();
        assert_eq!(err.to_string(), "Prefix must be 'binary' or 'metric'");
    }

    #[test]
    fn inverted_range_is_misconfigured() {
        let err = NumberOptions::new().min(10.0).max(1.0).check_range().unwrap_err();
        assert!(err.is_misconfigured());
    }
}
