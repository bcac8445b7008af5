use std::{fmt, sync::Arc};

use log::debug;

use super::{
    error::{ValueError, ValueResult},
    types::ValueType,
    value::Value,
};

/// Rendered in place of a value that was never set.
pub const UNSPECIFIED: &str = "<unspecified>";

pub type ChangeListener = Box<dyn Fn(&UserValue) -> ValueResult<()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

/// A named, described value with a default, backed by a [`ValueType`].
///
/// Listeners run after every successful change. A listener that returns an
/// error rolls the change back and the error is returned to the caller.
pub struct UserValue {
    name: String,
    description: String,
    ty: Arc<dyn ValueType>,
    default: Option<Value>,
    value: Option<Value>,
    previous: Option<Value>,
    listeners: Vec<(ListenerId, ChangeListener)>,
    next_listener: u64,
}

impl UserValue {
    pub fn new(name: impl Into<String>, ty: Arc<dyn ValueType>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            ty,
            default: None,
            value: None,
            previous: None,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn with_default(mut self, raw: impl Into<Value>) -> ValueResult<Self> {
        self.set_default(raw)?;
        Ok(self)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn value_type(&self) -> &Arc<dyn ValueType> {
        &self.ty
    }

    pub fn typename(&self) -> String {
        self.ty.typename()
    }

    pub fn syntax(&self) -> String {
        self.ty.syntax()
    }

    /// The current value, falling back to the default.
    pub fn get(&self) -> Option<&Value> {
        self.value.as_ref().or(self.default.as_ref())
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn previous(&self) -> Option<&Value> {
        self.previous.as_ref()
    }

    /// Convert and validate `raw`, store it and notify listeners.
    pub fn set(&mut self, raw: impl Into<Value>) -> ValueResult<()> {
        let raw = raw.into();
        let value = self.ty.parse(&raw, self.get())?;
        debug!("Setting {} = {}", self.name, self.ty.string(&value));
        self.store(value)
    }

    /// Store a value that has already been converted by this value's type.
    pub fn set_converted(&mut self, value: Value) -> ValueResult<()> {
        self.ty.validate(&value)?;
        self.store(value)
    }

    pub fn set_default(&mut self, raw: impl Into<Value>) -> ValueResult<()> {
        let raw = raw.into();
        let value = self
            .ty
            .parse(&raw, self.default.as_ref())
            .map_err(|err| match err {
                ValueError::Invalid(reason) => {
                    ValueError::invalid(format!("{} = {}: {}", self.name, raw, reason))
                }
                other => other,
            })?;
        self.default = Some(value);
        Ok(())
    }

    /// Drop the current value so the default shows through again.
    pub fn reset(&mut self) -> ValueResult<()> {
        match self.default.clone() {
            Some(default) => self.store(default),
            None => {
                self.previous = self.value.take();
                Ok(())
            }
        }
    }

    fn store(&mut self, value: Value) -> ValueResult<()> {
        let replaced = self.value.replace(value);
        let previous = std::mem::replace(&mut self.previous, replaced.clone());
        let notified = self
            .listeners
            .iter()
            .try_for_each(|(_, listener)| listener(self));
        if let Err(err) = notified {
            self.value = replaced;
            self.previous = previous;
            return Err(err);
        }
        if let Some(value) = &self.value {
            self.ty.committed(value);
        }
        Ok(())
    }

    /// Swap in a type with different constraints; the stored value and the
    /// default are coerced to fit.
    pub fn reconfigure(&mut self, ty: Arc<dyn ValueType>) {
        self.default = self.default.take().map(|value| ty.coerce(value));
        self.value = self.value.take().map(|value| ty.coerce(value));
        self.ty = ty;
    }

    pub fn on_change<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&UserValue) -> ValueResult<()> + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Current value as the user would type it.
    pub fn string(&self) -> String {
        self.get().map_or_else(|| UNSPECIFIED.to_string(), |value| self.render(value))
    }

    pub fn default_string(&self) -> String {
        self.default
            .as_ref()
            .map_or_else(|| UNSPECIFIED.to_string(), |value| self.render(value))
    }

    /// Render any input the way this value would; input the type rejects is
    /// shown as given.
    pub fn string_of(&self, raw: &Value) -> String {
        match self.ty.parse(raw, self.get()) {
            Ok(value) => self.render(&value),
            Err(_) => raw.to_string(),
        }
    }

    fn render(&self, value: &Value) -> String {
        let text = self.ty.string(value);
        if text.is_empty() || text.trim() != text {
            format!("'{text}'")
        } else {
            text
        }
    }
}

impl fmt::Debug for UserValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserValue")
            .field("name", &self.name)
            .field("type", &self.ty)
            .field("default", &self.default)
            .field("value", &self.value)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl fmt::Display for UserValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.string())
    }
}
