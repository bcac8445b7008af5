//! Built-in local settings.

use std::{sync::Arc, time::Duration};

use crate::{
    sorters::{
        PeerSorting, SettingSorting, SortOrderType, SortOrders, Sorter, TorrentSorting,
        TrackerSorting,
    },
    usertypes::{
        Converters, NumberKind, NumberOptions, NumberType, OptionType, SharedConverter, UserValue,
        ValueError, ValueResult,
    },
};

use super::{Settings, SettingsError, SettingsResult};

fn units() -> ValueResult<OptionType> {
    Ok(OptionType::new(["bit", "byte"])?.aliases([("b", "bit"), ("B", "byte")]))
}

fn prefixes() -> ValueResult<OptionType> {
    OptionType::new(["metric", "binary"])
}

fn float(min: f64) -> ValueResult<NumberType> {
    NumberType::new(NumberKind::Float, NumberOptions::new().min(min))
}

fn text_of(value: &UserValue) -> ValueResult<String> {
    value
        .get()
        .and_then(|value| value.as_str())
        .map(str::to_string)
        .ok_or_else(|| ValueError::invalid("Not a string"))
}

fn unit_setting(name: &str, what: &str, converter: SharedConverter) -> ValueResult<UserValue> {
    let mut value = UserValue::new(name, Arc::new(units()?))
        .with_default("byte")?
        .with_description(format!("Unit for {what} ('bit' or 'byte')"));
    value.on_change(move |value| converter.set_unit(&text_of(value)?));
    Ok(value)
}

fn prefix_setting(name: &str, what: &str, converter: SharedConverter) -> ValueResult<UserValue> {
    let mut value = UserValue::new(name, Arc::new(prefixes()?))
        .with_default("metric")?
        .with_description(format!("Unit prefix for {what} ('metric' or 'binary')"));
    value.on_change(move |value| converter.set_prefix(&text_of(value)?));
    Ok(value)
}

fn sort_setting<S: SortOrders>(name: &str, default: &str, what: &str) -> ValueResult<UserValue> {
    Ok(UserValue::new(name, Arc::new(SortOrderType::<S>::new()))
        .with_default(default)?
        .with_description(format!("List of {what} sort orders")))
}

/// Every local setting with its default. Unit settings keep `converters`
/// in step with their values.
pub fn local_settings(converters: &Converters, timeout: Duration) -> ValueResult<Vec<UserValue>> {
    Ok(vec![
        UserValue::new("connect.timeout", Arc::new(float(0.0)?))
            .with_default(timeout.as_secs_f64())?
            .with_description("Number of seconds before connecting to Transmission daemon fails"),
        UserValue::new("tui.poll", Arc::new(float(0.1)?))
            .with_default(5.0)?
            .with_description("Interval in seconds between TUI updates"),
        unit_setting("unit.bandwidth", "bandwidth rates", converters.bandwidth.clone())?,
        prefix_setting("unitprefix.bandwidth", "bandwidth rates", converters.bandwidth.clone())?,
        unit_setting("unit.size", "sizes", converters.size.clone())?,
        prefix_setting("unitprefix.size", "sizes", converters.size.clone())?,
        sort_setting::<TorrentSorting>("sort.torrents", "name", "torrent")?,
        sort_setting::<PeerSorting>("sort.peers", "torrent", "peer")?,
        sort_setting::<TrackerSorting>("sort.trackers", "domain", "tracker")?,
        sort_setting::<SettingSorting>("sort.settings", "name", "setting")?,
    ])
}

/// A registry holding the local settings.
pub fn local_registry(converters: &Converters, timeout: Duration) -> ValueResult<Settings> {
    let mut settings = Settings::new();
    for value in local_settings(converters, timeout)? {
        settings.add_local(value);
    }
    Ok(settings)
}

/// The sorter configured in the `sort.*` setting `name`.
pub fn sorter<S: SortOrders>(settings: &Settings, name: &str) -> SettingsResult<Sorter<S>> {
    match settings.local(name)?.get() {
        Some(value) => Ok(SortOrderType::<S>::sorter(value)?),
        None => Err(SettingsError::NoDefault(name.to_string())),
    }
}
