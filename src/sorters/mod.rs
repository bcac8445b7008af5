//! Stable multi-key sorting of torrents, peers, trackers and settings.
//!
//! A [`Sorter`] is built from sort strings like `"name"` or `"!rate"` (a leading
//! `!` or `.` reverses). Each named order is applied as a full stable sort, so
//! the last order given is the primary key.

pub mod peer;
pub mod setting;
pub mod torrent;
pub mod tracker;

use std::{
    cmp::{Ordering, Reverse},
    collections::HashMap,
    fmt,
    marker::PhantomData,
    ops::{Add, Sub},
    time::Instant,
};

use log::debug;

use crate::usertypes::{TupleType, Value, ValueError, ValueResult, ValueType};

pub use peer::PeerSorting;
pub use setting::SettingSorting;
pub use torrent::TorrentSorting;
pub use tracker::TrackerSorting;

const INVERT_CHARS: [char; 2] = ['!', '.'];

/// A sortable key extracted from an item.
#[derive(Debug, Clone)]
pub enum SortKey {
    Number(f64),
    Text(String),
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => {
                a.partial_cmp(b).unwrap_or_else(|| a.total_cmp(b))
            }
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::Number(_), SortKey::Text(_)) => Ordering::Less,
            (SortKey::Text(_), SortKey::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}

impl From<i64> for SortKey {
    fn from(value: i64) -> Self {
        SortKey::Number(value as f64)
    }
}

impl From<f64> for SortKey {
    fn from(value: f64) -> Self {
        SortKey::Number(value)
    }
}

impl From<&str> for SortKey {
    fn from(value: &str) -> Self {
        SortKey::Text(value.to_string())
    }
}

impl From<String> for SortKey {
    fn from(value: String) -> Self {
        SortKey::Text(value)
    }
}

pub type KeyFn<T> = fn(&T) -> SortKey;

/// One named sort order: key functions applied in sequence, so the last key
/// decides first.
pub struct SortSpec<T> {
    keys: Vec<KeyFn<T>>,
    description: String,
    aliases: &'static [&'static str],
}

impl<T> SortSpec<T> {
    pub fn new(key: KeyFn<T>, description: impl Into<String>) -> Self {
        Self {
            keys: vec![key],
            description: description.into(),
            aliases: &[],
        }
    }

    /// Sort by `key` after the keys given so far.
    pub fn then(mut self, key: KeyFn<T>) -> Self {
        self.keys.push(key);
        self
    }

    pub fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn alias_names(&self) -> &'static [&'static str] {
        self.aliases
    }

    fn sort<U, G>(&self, items: &mut [U], reverse: bool, item_getter: &G)
    where
        G: Fn(&U) -> &T,
    {
        for key in &self.keys {
            if reverse {
                items.sort_by_cached_key(|item| Reverse(key(item_getter(item))));
            } else {
                items.sort_by_cached_key(|item| key(item_getter(item)));
            }
        }
    }
}

impl<T> fmt::Debug for SortSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortSpec")
            .field("keys", &self.keys.len())
            .field("description", &self.description)
            .field("aliases", &self.aliases)
            .finish()
    }
}

/// All sort orders known for one item type, by name and alias.
pub struct SortTable<T> {
    specs: Vec<(&'static str, SortSpec<T>)>,
    lookup: HashMap<&'static str, usize>,
}

impl<T> SortTable<T> {
    pub fn new(specs: Vec<(&'static str, SortSpec<T>)>) -> Self {
        let mut lookup = HashMap::new();
        for (index, (name, spec)) in specs.iter().enumerate() {
            lookup.insert(*name, index);
            for alias in spec.aliases {
                lookup.insert(*alias, index);
            }
        }
        Self { specs, lookup }
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    pub fn name(&self, index: usize) -> &'static str {
        self.specs[index].0
    }

    pub fn spec(&self, index: usize) -> &SortSpec<T> {
        &self.specs[index].1
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &SortSpec<T>)> {
        self.specs.iter().map(|(name, spec)| (*name, spec))
    }
}

/// Binds an item type to its table of sort orders.
pub trait SortOrders: 'static {
    type Item;

    /// Order applied first unless it is requested explicitly.
    const DEFAULT_SORT: Option<&'static str>;

    fn table() -> &'static SortTable<Self::Item>;
}

/// A resolved, deduplicated list of sort orders.
pub struct Sorter<S: SortOrders> {
    /// `(spec index, reversed)` in the order the user gave them.
    entries: Vec<(usize, bool)>,
    _orders: PhantomData<fn() -> S>,
}

impl<S: SortOrders> Sorter<S> {
    pub fn new<I>(sortstrings: I) -> ValueResult<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let table = S::table();
        let mut entries = Vec::new();
        for sortstring in sortstrings {
            let sortstring = sortstring.as_ref().trim();
            let (name, reverse) = match sortstring.strip_prefix(INVERT_CHARS) {
                Some(name) => (name, true),
                None => (sortstring, false),
            };
            let index = table
                .find(name)
                .ok_or_else(|| ValueError::invalid(format!("Unknown sort order: '{name}'")))?;
            entries.push((index, reverse));
        }
        Ok(Self::compose(entries))
    }

    /// Keep only the last mention of each order, at its position.
    fn compose(entries: Vec<(usize, bool)>) -> Self {
        let mut kept: Vec<(usize, bool)> = Vec::with_capacity(entries.len());
        for (index, reverse) in entries.into_iter().rev() {
            if !kept.iter().any(|(seen, _)| *seen == index) {
                kept.insert(0, (index, reverse));
            }
        }
        Self {
            entries: kept,
            _orders: PhantomData,
        }
    }

    /// Canonical sort strings, e.g. `["name", "!rate"]`.
    pub fn strings(&self) -> Vec<String> {
        let table = S::table();
        self.entries
            .iter()
            .map(|(index, reverse)| {
                let bang = if *reverse { "!" } else { "" };
                format!("{bang}{}", table.name(*index))
            })
            .collect()
    }

    fn applied(&self) -> Vec<(usize, bool)> {
        let mut applied = self.entries.clone();
        if let Some(index) = S::DEFAULT_SORT.and_then(|name| S::table().find(name)) {
            if !applied.iter().any(|(seen, _)| *seen == index) {
                applied.insert(0, (index, false));
            }
        }
        applied
    }

    pub fn apply(&self, mut items: Vec<S::Item>) -> Vec<S::Item> {
        self.apply_in_place(&mut items);
        items
    }

    pub fn apply_in_place(&self, items: &mut [S::Item]) {
        self.apply_by(items, |item| item);
    }

    /// Sort wrappers of items, reaching the item through `item_getter`.
    pub fn apply_by<U, G>(&self, items: &mut [U], item_getter: G)
    where
        G: Fn(&U) -> &S::Item,
    {
        let started = Instant::now();
        let table = S::table();
        for (index, reverse) in self.applied() {
            table.spec(index).sort(items, reverse, &item_getter);
        }
        debug!(
            "-> Sorted {} items by {} in {:.3}ms",
            items.len(),
            self,
            started.elapsed().as_secs_f64() * 1e3
        );
    }
}

impl<S: SortOrders> Clone for Sorter<S> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            _orders: PhantomData,
        }
    }
}

impl<S: SortOrders> Default for Sorter<S> {
    fn default() -> Self {
        Self::compose(Vec::new())
    }
}

impl<S: SortOrders> PartialEq for Sorter<S> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<S: SortOrders> fmt::Display for Sorter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.strings().join(","))
    }
}

impl<S: SortOrders> fmt::Debug for Sorter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sorter({:?})", self.strings())
    }
}

impl<S: SortOrders> Add for Sorter<S> {
    type Output = Sorter<S>;

    fn add(self, other: Self) -> Self::Output {
        let mut entries = self.entries;
        entries.extend(other.entries);
        Self::compose(entries)
    }
}

impl<S: SortOrders> Sub for Sorter<S> {
    type Output = Sorter<S>;

    /// Drop every order `other` mentions, reversed or not.
    fn sub(self, other: Self) -> Self::Output {
        let entries = self
            .entries
            .into_iter()
            .filter(|(index, _)| !other.entries.iter().any(|(theirs, _)| theirs == index))
            .collect();
        Self::compose(entries)
    }
}

/// Value type for settings that hold a list of sort orders.
pub struct SortOrderType<S> {
    list: TupleType,
    _orders: PhantomData<fn() -> S>,
}

impl<S> fmt::Debug for SortOrderType<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortOrderType").field("list", &self.list).finish()
    }
}

impl<S: SortOrders> SortOrderType<S> {
    pub fn new() -> Self {
        Self {
            list: TupleType::new(),
            _orders: PhantomData,
        }
    }

    pub fn sorter(value: &Value) -> ValueResult<Sorter<S>> {
        match value.as_list() {
            Some(items) => Sorter::new(items),
            None => Err(ValueError::invalid("Not a list")),
        }
    }
}

impl<S: SortOrders> Default for SortOrderType<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SortOrders> ValueType for SortOrderType<S> {
    fn typename(&self) -> String {
        "list".to_string()
    }

    fn syntax(&self) -> String {
        "[!]<ORDER>,[!]<ORDER>,...".to_string()
    }

    fn convert(&self, raw: &Value, current: Option<&Value>) -> ValueResult<Value> {
        let items = self.list.convert(raw, current)?;
        let sorter = Self::sorter(&items)?;
        Ok(Value::List(sorter.strings()))
    }

    fn validate(&self, value: &Value) -> ValueResult<()> {
        Self::sorter(value).map(|_| ())
    }

    fn holds(&self, value: &Value) -> bool {
        matches!(value, Value::List(_))
    }

    fn string(&self, value: &Value) -> String {
        self.list.string(value)
    }
}
