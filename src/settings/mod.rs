//! The registry of every setting a user can read or change.

pub mod defaults;
pub mod rcfile;

use std::collections::HashMap;

use log::{debug, warn};
use thiserror::Error;

use crate::{
    model::SettingSummary,
    usertypes::{RemoteValue, UserValue, Value, ValueError},
};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Unknown setting: {0}")]
    Unknown(String),
    #[error("{name} = {value}: {reason}")]
    Invalid {
        name: String,
        value: String,
        reason: String,
    },
    #[error("{0} has no default value")]
    NoDefault(String),
    #[error(transparent)]
    Value(#[from] ValueError),
}

pub type SettingsResult<T> = std::result::Result<T, SettingsError>;

/// A setting kept in this process or mirrored from the daemon.
#[derive(Debug)]
pub enum Setting {
    Local(UserValue),
    Remote(RemoteValue),
}

impl Setting {
    pub fn name(&self) -> &str {
        match self {
            Setting::Local(value) => value.name(),
            Setting::Remote(value) => value.name(),
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Setting::Local(value) => value.description(),
            Setting::Remote(value) => value.description(),
        }
    }

    pub fn typename(&self) -> String {
        match self {
            Setting::Local(value) => value.typename(),
            Setting::Remote(value) => value.typename(),
        }
    }

    pub fn syntax(&self) -> String {
        match self {
            Setting::Local(value) => value.syntax(),
            Setting::Remote(value) => value.syntax(),
        }
    }

    pub fn string(&self) -> String {
        match self {
            Setting::Local(value) => value.string(),
            Setting::Remote(value) => value.string(),
        }
    }

    pub fn default_string(&self) -> String {
        match self {
            Setting::Local(value) => value.default_string(),
            Setting::Remote(_) => String::new(),
        }
    }

    /// The value as stored, without fetching anything.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Setting::Local(value) => value.get(),
            Setting::Remote(value) => value.local().get(),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Setting::Remote(_))
    }

    pub fn summary(&self) -> SettingSummary {
        SettingSummary {
            name: self.name().to_string(),
            value: self.string(),
            default: self.default_string(),
            description: self.description().to_string(),
            syntax: self.syntax(),
        }
    }
}

/// Settings in the order they were added, looked up by name.
#[derive(Debug, Default)]
pub struct Settings {
    entries: Vec<Setting>,
    index: HashMap<String, usize>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a setting, replacing one with the same name in place.
    pub fn add(&mut self, setting: Setting) {
        let name = setting.name().to_string();
        match self.index.get(&name) {
            Some(&position) => self.entries[position] = setting,
            None => {
                self.index.insert(name, self.entries.len());
                self.entries.push(setting);
            }
        }
    }

    pub fn add_local(&mut self, value: UserValue) {
        self.add(Setting::Local(value));
    }

    pub fn add_remote(&mut self, value: RemoteValue) {
        self.add(Setting::Remote(value));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(Setting::name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Setting> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> SettingsResult<&Setting> {
        self.index
            .get(name)
            .map(|&position| &self.entries[position])
            .ok_or_else(|| SettingsError::Unknown(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> SettingsResult<&mut Setting> {
        match self.index.get(name) {
            Some(&position) => Ok(&mut self.entries[position]),
            None => Err(SettingsError::Unknown(name.to_string())),
        }
    }

    /// A local setting's value object, for reading typed values or adding
    /// listeners.
    pub fn local(&self, name: &str) -> SettingsResult<&UserValue> {
        match self.get(name)? {
            Setting::Local(value) => Ok(value),
            Setting::Remote(_) => Err(SettingsError::Unknown(name.to_string())),
        }
    }

    pub fn local_mut(&mut self, name: &str) -> SettingsResult<&mut UserValue> {
        match self.get_mut(name)? {
            Setting::Local(value) => Ok(value),
            Setting::Remote(_) => Err(SettingsError::Unknown(name.to_string())),
        }
    }

    /// Current value of `name`, fetched from the daemon for remote settings.
    pub async fn fetch(&mut self, name: &str) -> SettingsResult<String> {
        match self.get_mut(name)? {
            Setting::Local(value) => Ok(value.string()),
            Setting::Remote(value) => {
                value.get().await?;
                Ok(value.string())
            }
        }
    }

    /// Change `name` to `raw`, pushing remote settings to the daemon.
    pub async fn set(&mut self, name: &str, raw: &str) -> SettingsResult<()> {
        let result = match self.get_mut(name)? {
            Setting::Local(value) => value.set(raw),
            Setting::Remote(value) => value.set(raw).await,
        };
        result.map_err(|err| match err {
            ValueError::Invalid(reason) => SettingsError::Invalid {
                name: name.to_string(),
                value: raw.to_string(),
                reason,
            },
            other => SettingsError::Value(other),
        })?;
        debug!("{} = {}", name, self.get(name)?.string());
        Ok(())
    }

    pub fn reset(&mut self, name: &str) -> SettingsResult<()> {
        match self.get_mut(name)? {
            Setting::Local(value) => Ok(value.reset()?),
            Setting::Remote(_) => Err(SettingsError::NoDefault(name.to_string())),
        }
    }

    /// Load every remote setting, from the shared session cache where possible.
    ///
    /// Returns how many could not be loaded.
    pub async fn refresh_remote(&mut self) -> usize {
        let mut failed = 0;
        for setting in &mut self.entries {
            let Setting::Remote(value) = setting else {
                continue;
            };
            value.upgrade();
            if value.is_connected() {
                continue;
            }
            if let Err(err) = value.get().await {
                warn!("{err}");
                failed += 1;
            }
        }
        failed
    }

    pub fn summaries(&self) -> Vec<SettingSummary> {
        self.entries.iter().map(Setting::summary).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::usertypes::{NumberType, StringType};

    fn registry() -> Settings {
        let mut settings = Settings::new();
        settings.add_local(
            UserValue::new("foo", Arc::new(StringType::new()))
                .with_default("hello")
                .unwrap()
                .with_description("Foo text"),
        );
        settings.add_local(
            UserValue::new("bar", Arc::new(NumberType::int()))
                .with_default(3_i64)
                .unwrap(),
        );
        settings
    }

    #[test]
    fn keeps_insertion_order() {
        let mut settings = registry();
        assert_eq!(settings.names().collect::<Vec<_>>(), vec!["foo", "bar"]);
        settings.add_local(UserValue::new("foo", Arc::new(StringType::new())));
        assert_eq!(settings.names().collect::<Vec<_>>(), vec!["foo", "bar"]);
        assert_eq!(settings.len(), 2);
        assert_eq!(settings.get("foo").unwrap().string(), "<unspecified>");
    }

    #[test]
    fn unknown_names_are_errors() {
        let settings = registry();
        assert_eq!(
            settings.get("baz").unwrap_err().to_string(),
            "Unknown setting: baz"
        );
    }

    #[tokio::test]
    async fn set_and_reset_local_values() {
        let mut settings = registry();
        settings.set("bar", "+=4").await.unwrap();
        assert_eq!(settings.get("bar").unwrap().string(), "7");
        let err = settings.set("bar", "many").await.unwrap_err();
        assert_eq!(err.to_string(), "bar = many: Not a number");
        settings.reset("bar").unwrap();
        assert_eq!(settings.fetch("bar").await.unwrap(), "3");
    }

    #[test]
    fn summaries_render_values() {
        let settings = registry();
        let summaries = settings.summaries();
        assert_eq!(summaries[0].name, "foo");
        assert_eq!(summaries[0].value, "hello");
        assert_eq!(summaries[0].default, "hello");
        assert_eq!(summaries[0].description, "Foo text");
        assert_eq!(summaries[1].syntax, "<NUMBER>[Ti|Gi|Mi|Ki|T|G|M|k]");
    }
}
