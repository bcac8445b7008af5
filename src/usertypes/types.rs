use std::{
    collections::HashMap,
    fmt,
    path::{Component, Path, PathBuf},
};

use super::{
    error::{ValueError, ValueResult},
    number::{Number, NumberKind, NumberOptions, Op, Prefix, NUMBER_SYNTAX},
    value::{Constant, Value},
};

/// A configured type (with its options bound) that turns raw input into
/// [`Value`]s, validates them and renders them back.
pub trait ValueType: fmt::Debug + Send + Sync {
    /// Short name for help texts. Marker types return an empty string.
    fn typename(&self) -> String;

    /// Description of accepted input.
    fn syntax(&self) -> String;

    /// Turn `raw` into a native value. `current` is the value being replaced
    /// and serves as the baseline for relative input like `"+=10"`.
    fn convert(&self, raw: &Value, current: Option<&Value>) -> ValueResult<Value>;

    /// Check a native value against this type's constraints.
    fn validate(&self, value: &Value) -> ValueResult<()>;

    /// Whether `value` is a native value of this type.
    fn holds(&self, value: &Value) -> bool;

    fn string(&self, value: &Value) -> String {
        value.to_string()
    }

    /// Bring an existing value in line with this type's constraints.
    fn coerce(&self, value: Value) -> Value {
        value
    }

    /// Called after `value` has been stored by its owner.
    fn committed(&self, _value: &Value) {}

    /// Convert, then validate.
    fn parse(&self, raw: &Value, current: Option<&Value>) -> ValueResult<Value> {
        let value = self.convert(raw, current)?;
        self.validate(&value)?;
        Ok(value)
    }
}

/// Split `"+=10k"` into the operator and the amount.
pub(crate) fn split_adjustment(text: &str) -> Option<(Op, &str)> {
    let text = text.trim_start();
    if let Some(rest) = text.strip_prefix("+=") {
        Some((Op::Add, rest.trim()))
    } else {
        text.strip_prefix("-=").map(|rest| (Op::Sub, rest.trim()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct StringType {
    minlen: usize,
    maxlen: Option<usize>,
}

impl StringType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(minlen: usize, maxlen: Option<usize>) -> ValueResult<Self> {
        if let Some(max) = maxlen.filter(|max| minlen > *max) {
            return Err(ValueError::misconfigured(format!(
                "minimum length {minlen} is larger than maximum length {max}"
            )));
        }
        Ok(Self { minlen, maxlen })
    }
}

impl ValueType for StringType {
    fn typename(&self) -> String {
        "string".to_string()
    }

    fn syntax(&self) -> String {
        let singular = self.minlen <= 1 && self.maxlen.map_or(true, |max| max == 1);
        let chars = if singular { "character" } else { "characters" };
        let detail = match (self.minlen, self.maxlen) {
            (0, None) => return "string".to_string(),
            (min, None) => format!("at least {min} {chars}"),
            (0, Some(max)) => format!("at most {max} {chars}"),
            (min, Some(max)) if min == max => format!("{min} {chars}"),
            (min, Some(max)) => format!("{min}-{max} {chars}"),
        };
        format!("string ({detail})")
    }

    fn convert(&self, raw: &Value, _current: Option<&Value>) -> ValueResult<Value> {
        Ok(Value::Text(match raw {
            Value::Text(text) => text.clone(),
            other => other.to_string(),
        }))
    }

    fn validate(&self, value: &Value) -> ValueResult<()> {
        let text = value
            .as_str()
            .ok_or_else(|| ValueError::invalid("Not a string"))?;
        let len = text.chars().count();
        if let Some(max) = self.maxlen.filter(|max| len > *max) {
            return Err(ValueError::invalid(format!(
                "Too long (maximum length is {max})"
            )));
        }
        if len < self.minlen {
            return Err(ValueError::invalid(format!(
                "Too short (minimum length is {})",
                self.minlen
            )));
        }
        Ok(())
    }

    fn holds(&self, value: &Value) -> bool {
        matches!(value, Value::Text(_))
    }

    fn coerce(&self, value: Value) -> Value {
        let Value::Text(mut text) = value else {
            return value;
        };
        let len = text.chars().count();
        if let Some(max) = self.maxlen.filter(|max| len > *max) {
            text = text.chars().take(max).collect();
        } else if len < self.minlen {
            text.extend(std::iter::repeat(' ').take(self.minlen - len));
        }
        Value::Text(text)
    }
}

const DEFAULT_TRUE: [&str; 5] = ["enabled", "yes", "on", "true", "1"];
const DEFAULT_FALSE: [&str; 5] = ["disabled", "no", "off", "false", "0"];

#[derive(Debug, Clone)]
pub struct BoolType {
    truthy: Vec<String>,
    falsy: Vec<String>,
}

impl Default for BoolType {
    fn default() -> Self {
        Self {
            truthy: DEFAULT_TRUE.iter().map(|s| s.to_string()).collect(),
            falsy: DEFAULT_FALSE.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl BoolType {
    pub fn new() -> Self {
        Self::default()
    }

    /// Custom literal sets; the first literal of each renders the value.
    pub fn with_literals<T, F>(truthy: T, falsy: F) -> ValueResult<Self>
    where
        T: IntoIterator,
        T::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        let truthy: Vec<String> = truthy.into_iter().map(Into::into).collect();
        let falsy: Vec<String> = falsy.into_iter().map(Into::into).collect();
        if truthy.is_empty() || falsy.is_empty() {
            return Err(ValueError::misconfigured("Boolean literals must not be empty"));
        }
        Ok(Self { truthy, falsy })
    }

    fn literal(&self, state: bool) -> &str {
        let set = if state { &self.truthy } else { &self.falsy };
        set.first().map_or(if state { "true" } else { "false" }, String::as_str)
    }
}

impl ValueType for BoolType {
    fn typename(&self) -> String {
        "boolean".to_string()
    }

    fn syntax(&self) -> String {
        let mut pairs: Vec<String> = Vec::new();
        for (t, f) in self.truthy.iter().zip(&self.falsy) {
            let pair = format!("{t}/{f}");
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }
        pairs.join("|")
    }

    fn convert(&self, raw: &Value, _current: Option<&Value>) -> ValueResult<Value> {
        let not_bool = || ValueError::invalid("Not a boolean");
        match raw {
            Value::Bool(state) => Ok(Value::Bool(*state)),
            Value::Text(text) => {
                let folded = text.trim().to_lowercase();
                let matches = |set: &[String]| set.iter().any(|lit| lit.to_lowercase() == folded);
                if matches(&self.truthy) {
                    Ok(Value::Bool(true))
                } else if matches(&self.falsy) {
                    Ok(Value::Bool(false))
                } else {
                    Err(not_bool())
                }
            }
            _ => Err(not_bool()),
        }
    }

    fn validate(&self, value: &Value) -> ValueResult<()> {
        match value {
            Value::Bool(_) => Ok(()),
            _ => Err(ValueError::invalid("Not a boolean")),
        }
    }

    fn holds(&self, value: &Value) -> bool {
        matches!(value, Value::Bool(_))
    }

    fn string(&self, value: &Value) -> String {
        match value {
            Value::Bool(state) => self.literal(*state).to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PathType {
    mustexist: bool,
}

impl PathType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must_exist(mut self, mustexist: bool) -> Self {
        self.mustexist = mustexist;
        self
    }
}

impl ValueType for PathType {
    fn typename(&self) -> String {
        "path".to_string()
    }

    fn syntax(&self) -> String {
        "file system path".to_string()
    }

    fn convert(&self, raw: &Value, _current: Option<&Value>) -> ValueResult<Value> {
        let path = match raw {
            Value::Path(path) => path.clone(),
            Value::Text(text) => PathBuf::from(text),
            _ => return Err(ValueError::invalid("Not a path")),
        };
        Ok(Value::Path(expand_user(&normalize(&path))))
    }

    fn validate(&self, value: &Value) -> ValueResult<()> {
        let path = value
            .as_path()
            .ok_or_else(|| ValueError::invalid("Not a path"))?;
        if self.mustexist && !path.exists() {
            return Err(ValueError::invalid("No such file or directory"));
        }
        Ok(())
    }

    fn holds(&self, value: &Value) -> bool {
        matches!(value, Value::Path(_))
    }

    fn string(&self, value: &Value) -> String {
        match value {
            Value::Path(path) => tildify(path),
            other => other.to_string(),
        }
    }
}

/// Lexically clean up a path: drop `.` components and resolve `..` where possible.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

pub fn expand_user(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// Replace the home directory with `~`.
pub fn tildify(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(rest) = path.strip_prefix(&home) {
            if rest.as_os_str().is_empty() {
                return "~".to_string();
            }
            return format!("~/{}", rest.display());
        }
    }
    path.display().to_string()
}

/// A list of strings parsed from a separated string.
#[derive(Debug, Clone)]
pub struct TupleType {
    sep: String,
    options: Option<Vec<String>>,
    aliases: HashMap<String, String>,
    dedup: bool,
}

impl Default for TupleType {
    fn default() -> Self {
        Self {
            sep: ", ".to_string(),
            options: None,
            aliases: HashMap::new(),
            dedup: false,
        }
    }
}

impl TupleType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn separator(mut self, sep: impl Into<String>) -> Self {
        self.sep = sep.into();
        self
    }

    /// Restrict items to `options`; a sole `*` then selects all of them.
    pub fn options<I>(mut self, options: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    pub fn aliases<I, K, V>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.aliases = aliases
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Drop repeated items, keeping the first occurrence.
    pub fn dedup(mut self, dedup: bool) -> Self {
        self.dedup = dedup;
        self
    }

    fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let sep = self.sep.trim();
        if sep.is_empty() {
            text.split_whitespace().collect()
        } else {
            text.split(sep).map(str::trim).collect()
        }
    }

    fn invalid_items(&self, items: &[String]) -> Vec<String> {
        match &self.options {
            Some(options) => items
                .iter()
                .filter(|item| !options.contains(item))
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }
}

impl ValueType for TupleType {
    fn typename(&self) -> String {
        "list".to_string()
    }

    fn syntax(&self) -> String {
        let sep = self.sep.trim();
        format!("<OPTION>{sep}<OPTION>{sep}...")
    }

    fn convert(&self, raw: &Value, _current: Option<&Value>) -> ValueResult<Value> {
        let pieces: Vec<String> = match raw {
            Value::List(items) => items
                .iter()
                .flat_map(|item| self.split(item))
                .map(str::to_owned)
                .collect(),
            other => self
                .split(&other.to_string())
                .into_iter()
                .map(str::to_owned)
                .collect(),
        };
        let mut items: Vec<String> = Vec::with_capacity(pieces.len());
        for piece in pieces {
            let item = self.aliases.get(&piece).cloned().unwrap_or(piece);
            if self.dedup && items.contains(&item) {
                continue;
            }
            items.push(item);
        }
        if let Some(options) = &self.options {
            if items.len() == 1 && items[0] == "*" {
                items = options.clone();
            }
        }
        Ok(Value::List(items))
    }

    fn validate(&self, value: &Value) -> ValueResult<()> {
        let items = value
            .as_list()
            .ok_or_else(|| ValueError::invalid("Not a list"))?;
        let invalid = self.invalid_items(items);
        match invalid.len() {
            0 => Ok(()),
            1 => Err(ValueError::invalid(format!("Invalid option: {}", invalid[0]))),
            _ => Err(ValueError::invalid(format!(
                "Invalid options: {}",
                invalid.join(&self.sep)
            ))),
        }
    }

    fn holds(&self, value: &Value) -> bool {
        matches!(value, Value::List(_))
    }

    fn string(&self, value: &Value) -> String {
        match value {
            Value::List(items) => items.join(&self.sep),
            other => other.to_string(),
        }
    }

    fn coerce(&self, value: Value) -> Value {
        match (value, &self.options) {
            (Value::List(items), Some(options)) => {
                Value::List(items.into_iter().filter(|item| options.contains(item)).collect())
            }
            (value, _) => value,
        }
    }
}

/// One string out of a fixed set.
#[derive(Debug, Clone)]
pub struct OptionType {
    options: Vec<String>,
    aliases: HashMap<String, String>,
}

impl OptionType {
    pub fn new<I>(options: I) -> ValueResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let options: Vec<String> = options.into_iter().map(Into::into).collect();
        match options.as_slice() {
            [] => Err(ValueError::misconfigured("No options provided")),
            [only] => Err(ValueError::misconfigured(format!(
                "Only one option provided: {only}"
            ))),
            _ => Ok(Self {
                options,
                aliases: HashMap::new(),
            }),
        }
    }

    pub fn aliases<I, K, V>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.aliases = aliases
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    fn not_one_of(&self) -> ValueError {
        ValueError::invalid(format!("Not one of: {}", self.options.join(", ")))
    }
}

impl ValueType for OptionType {
    fn typename(&self) -> String {
        "option".to_string()
    }

    fn syntax(&self) -> String {
        self.options.join("|")
    }

    fn convert(&self, raw: &Value, _current: Option<&Value>) -> ValueResult<Value> {
        let text = raw.to_string();
        let text = self.aliases.get(&text).cloned().unwrap_or(text);
        if self.options.contains(&text) {
            Ok(Value::Text(text))
        } else {
            Err(self.not_one_of())
        }
    }

    fn validate(&self, value: &Value) -> ValueResult<()> {
        if self.holds(value) {
            Ok(())
        } else {
            Err(self.not_one_of())
        }
    }

    fn holds(&self, value: &Value) -> bool {
        value
            .as_str()
            .map_or(false, |text| self.options.iter().any(|opt| opt == text))
    }

    fn coerce(&self, value: Value) -> Value {
        if self.holds(&value) {
            value
        } else {
            Value::Text(self.options[0].clone())
        }
    }
}

/// Integer or float numbers with optional unit, bounds and relative adjustment.
#[derive(Debug, Clone)]
pub struct NumberType {
    kind: NumberKind,
    options: NumberOptions,
}

impl NumberType {
    pub fn new(kind: NumberKind, options: NumberOptions) -> ValueResult<Self> {
        options.check_range()?;
        Ok(Self { kind, options })
    }

    pub fn int() -> Self {
        Self {
            kind: NumberKind::Int,
            options: NumberOptions::new(),
        }
    }

    pub fn float() -> Self {
        Self {
            kind: NumberKind::Float,
            options: NumberOptions::new(),
        }
    }

    pub fn kind(&self) -> NumberKind {
        self.kind
    }

    pub fn options(&self) -> &NumberOptions {
        &self.options
    }

    fn check_bounds(&self, number: &Number) -> ValueResult<()> {
        let bounds = NumberOptions {
            min: self.options.min,
            max: self.options.max,
            ..NumberOptions::new()
        };
        Number::from_number(number, self.kind, &bounds).map(|_| ())
    }
}

impl ValueType for NumberType {
    fn typename(&self) -> String {
        match self.kind {
            NumberKind::Int => "integer".to_string(),
            NumberKind::Float => "number".to_string(),
        }
    }

    fn syntax(&self) -> String {
        NUMBER_SYNTAX.to_string()
    }

    fn convert(&self, raw: &Value, current: Option<&Value>) -> ValueResult<Value> {
        let number = match raw {
            Value::Text(text) => match split_adjustment(text) {
                Some((op, amount)) => {
                    let unbounded = NumberOptions {
                        min: None,
                        max: None,
                        ..self.options.clone()
                    };
                    let base = match current.and_then(Value::as_number) {
                        Some(number) => number.clone(),
                        None => Number::from_f64(0.0, self.kind, &unbounded)?,
                    };
                    let amount = Number::parse(amount, NumberKind::Float, &unbounded)?;
                    let result = base.combine(&amount, op)?;
                    Number::from_number(&result, self.kind, &self.options)?
                }
                None => Number::parse(text, self.kind, &self.options)?,
            },
            Value::Number(number) => Number::from_number(number, self.kind, &self.options)?,
            _ => return Err(ValueError::invalid("Not a number")),
        };
        Ok(Value::Number(number))
    }

    fn validate(&self, value: &Value) -> ValueResult<()> {
        let number = value
            .as_number()
            .ok_or_else(|| ValueError::invalid("Not a number"))?;
        self.check_bounds(number)
    }

    fn holds(&self, value: &Value) -> bool {
        matches!(value, Value::Number(_))
    }

    fn string(&self, value: &Value) -> String {
        let Some(number) = value.as_number() else {
            return value.to_string();
        };
        let shown = number.to_string();
        if self.kind == NumberKind::Float {
            return shown;
        }
        // prefixed integers must read back as the same integer
        match Number::parse(&shown, self.kind, &self.options) {
            Ok(parsed) if parsed.value() == number.value() => shown,
            _ => {
                let mut exact = number.clone();
                exact.set_prefix(Prefix::None);
                exact.to_string()
            }
        }
    }

    fn coerce(&self, value: Value) -> Value {
        let Value::Number(number) = value else {
            return value;
        };
        let clamping = NumberOptions {
            autolimit: true,
            ..self.options.clone()
        };
        match Number::from_number(&number, self.kind, &clamping) {
            Ok(clamped) => Value::Number(clamped),
            Err(_) => Value::Number(number),
        }
    }
}

/// Accepts exactly one [`Constant`], by value or by name.
#[derive(Debug, Clone, Copy)]
pub struct ConstantType(pub Constant);

impl ValueType for ConstantType {
    fn typename(&self) -> String {
        match self.0 {
            Constant::Random => "random".to_string(),
            _ => String::new(),
        }
    }

    fn syntax(&self) -> String {
        self.0.name().to_string()
    }

    fn convert(&self, raw: &Value, _current: Option<&Value>) -> ValueResult<Value> {
        let matches = match raw {
            Value::Constant(constant) => *constant == self.0,
            Value::Text(text) => text.trim().eq_ignore_ascii_case(self.0.name()),
            _ => false,
        };
        if matches {
            Ok(Value::Constant(self.0))
        } else {
            Err(ValueError::invalid(format!("Not '{}'", self.0.name())))
        }
    }

    fn validate(&self, value: &Value) -> ValueResult<()> {
        self.convert(value, None).map(|_| ())
    }

    fn holds(&self, value: &Value) -> bool {
        value.is(self.0)
    }
}
