//! Values whose source of truth lives on the Transmission daemon.

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use log::{debug, warn};

use super::{
    error::{ValueError, ValueResult},
    multi::MultiType,
    types::{BoolType, ConstantType, PathType, ValueType},
    user::UserValue,
    value::{Constant, Value},
};
use crate::rpc::TransmissionError;

/// Reads and writes one setting on the daemon.
#[async_trait]
pub trait RemoteSetting: Send + Sync {
    /// A value already known from polling, if any. Used to leave the
    /// disconnected state without a round trip.
    fn cached(&self) -> Option<Value> {
        None
    }

    async fn fetch(&self) -> Result<Value, TransmissionError>;

    async fn push(&self, value: &Value) -> Result<(), TransmissionError>;
}

static DISCONNECTED: Value = Value::Constant(Constant::Disconnected);

/// How [`RemoteValue::set`] treats relative paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathMode {
    None,
    /// Join relative paths onto the current remote path.
    Complete,
    /// Like `Complete`, but booleans pass through untouched.
    Incomplete,
}

/// A [`UserValue`] mirror of a daemon setting.
///
/// It starts out [`Constant::Disconnected`]. Reading fetches from the daemon;
/// writing fetches a baseline first if needed, validates and stores locally,
/// then pushes.
pub struct RemoteValue {
    local: UserValue,
    inner: Arc<dyn ValueType>,
    source: Arc<dyn RemoteSetting>,
    path_mode: PathMode,
}

impl RemoteValue {
    pub fn new(name: impl Into<String>, ty: Arc<dyn ValueType>, source: Arc<dyn RemoteSetting>) -> ValueResult<Self> {
        Self::with_mode(name, ty, source, PathMode::None)
    }

    /// A remote directory; relative input is resolved against the current one.
    pub fn path_complete(name: impl Into<String>, source: Arc<dyn RemoteSetting>) -> ValueResult<Self> {
        Self::with_mode(name, Arc::new(PathType::new()), source, PathMode::Complete)
    }

    /// A remote directory that can also be switched off with a boolean.
    pub fn path_incomplete(name: impl Into<String>, source: Arc<dyn RemoteSetting>) -> ValueResult<Self> {
        let ty = MultiType::new(vec![Arc::new(BoolType::new()), Arc::new(PathType::new())])?;
        Self::with_mode(name, Arc::new(ty), source, PathMode::Incomplete)
    }

    fn with_mode(
        name: impl Into<String>,
        ty: Arc<dyn ValueType>,
        source: Arc<dyn RemoteSetting>,
        path_mode: PathMode,
    ) -> ValueResult<Self> {
        let local_type = MultiType::new(vec![
            Arc::new(ConstantType(Constant::Disconnected)),
            ty.clone(),
        ])?;
        let local = UserValue::new(name, Arc::new(local_type)).with_default(Constant::Disconnected)?;
        Ok(Self {
            local,
            inner: ty,
            source,
            path_mode,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.local.set_description(description);
        self
    }

    pub fn name(&self) -> &str {
        self.local.name()
    }

    pub fn description(&self) -> &str {
        self.local.description()
    }

    pub fn typename(&self) -> String {
        self.local.typename()
    }

    pub fn syntax(&self) -> String {
        self.local.syntax()
    }

    pub fn local(&self) -> &UserValue {
        &self.local
    }

    pub fn local_mut(&mut self) -> &mut UserValue {
        &mut self.local
    }

    pub fn is_connected(&self) -> bool {
        !self.current().is(Constant::Disconnected)
    }

    fn current(&self) -> &Value {
        self.local.get().unwrap_or(&DISCONNECTED)
    }

    /// Leave the disconnected state using the cached value, if the source has one.
    pub fn upgrade(&mut self) -> &Value {
        if !self.is_connected() {
            if let Some(cached) = self.source.cached() {
                if let Err(err) = self.store(&cached) {
                    warn!("Ignoring cached value for {}: {}", self.name(), err);
                }
            }
        }
        self.current()
    }

    /// Fetch from the daemon and remember the result.
    pub async fn get(&mut self) -> ValueResult<Value> {
        let fetched = self.source.fetch().await.map_err(|source| ValueError::Fetch {
            setting: self.name().to_string(),
            source,
        })?;
        self.store(&fetched)?;
        Ok(self.current().clone())
    }

    fn store(&mut self, raw: &Value) -> ValueResult<()> {
        let baseline = Some(self.current()).filter(|value| !value.is(Constant::Disconnected));
        let value = self.inner.parse(raw, baseline)?;
        self.local.set_converted(value)
    }

    /// Validate and store `raw` locally, then push it to the daemon.
    ///
    /// When the push fails the local value is kept and the error names the
    /// setting.
    pub async fn set(&mut self, raw: impl Into<Value> + Send) -> ValueResult<()> {
        if !self.is_connected() {
            self.get().await.map_err(|err| match err {
                ValueError::Fetch { setting, source } => ValueError::Remote { setting, source },
                other => other,
            })?;
        }
        let raw = self.resolve_path(raw.into());
        self.store(&raw)?;
        let value = self.current().clone();
        debug!("Pushing {} = {}", self.name(), self.local.string());
        self.source
            .push(&value)
            .await
            .map_err(|source| ValueError::Remote {
                setting: self.name().to_string(),
                source,
            })
    }

    fn resolve_path(&self, raw: Value) -> Value {
        if self.path_mode == PathMode::None {
            return raw;
        }
        let Value::Text(text) = &raw else {
            return raw;
        };
        if self.path_mode == PathMode::Incomplete && BoolType::new().parse(&raw, None).is_ok() {
            return raw;
        }
        let requested = PathBuf::from(text);
        if requested.is_absolute() || text.starts_with('~') {
            return raw;
        }
        match self.current() {
            Value::Path(base) => Value::Path(base.join(requested)),
            _ => raw,
        }
    }

    pub fn string(&self) -> String {
        self.local.string()
    }
}

impl std::fmt::Debug for RemoteValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteValue")
            .field("local", &self.local)
            .field("type", &self.inner)
            .field("path_mode", &self.path_mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::usertypes::{convert::SharedConverter, limits::rate_limit, types::NumberType};

    #[derive(Default)]
    struct FakeDaemon {
        stored: Mutex<Option<Value>>,
        pushed: Mutex<Vec<Value>>,
        cached: Option<Value>,
        fail_fetch: bool,
        fail_push: bool,
    }

    impl FakeDaemon {
        fn with(value: Value) -> Self {
            Self {
                stored: Mutex::new(Some(value)),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl RemoteSetting for FakeDaemon {
        fn cached(&self) -> Option<Value> {
            self.cached.clone()
        }

        async fn fetch(&self) -> Result<Value, TransmissionError> {
            if self.fail_fetch {
                return Err(TransmissionError::Rpc("daemon unreachable".to_string()));
            }
            self.stored
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| TransmissionError::Rpc("no value".to_string()))
        }

        async fn push(&self, value: &Value) -> Result<(), TransmissionError> {
            if self.fail_push {
                return Err(TransmissionError::Rpc("permission denied".to_string()));
            }
            self.pushed.lock().unwrap().push(value.clone());
            *self.stored.lock().unwrap() = Some(value.clone());
            Ok(())
        }
    }

    fn peers(daemon: Arc<FakeDaemon>) -> RemoteValue {
        RemoteValue::new("srv.limit.peers.global", Arc::new(NumberType::int()), daemon).unwrap()
    }

    #[tokio::test]
    async fn starts_disconnected_and_fetches() {
        let daemon = Arc::new(FakeDaemon::with(Value::from(200_i64)));
        let mut value = peers(daemon);
        assert!(!value.is_connected());
        assert_eq!(value.string(), "disconnected");
        assert_eq!(value.typename(), "integer");
        assert_eq!(value.get().await.unwrap(), Value::from(200_i64));
        assert!(value.is_connected());
    }

    #[tokio::test]
    async fn set_fetches_baseline_then_pushes() {
        let daemon = Arc::new(FakeDaemon::with(Value::from(200_i64)));
        let mut value = peers(daemon.clone());
        value.set("+=50").await.unwrap();
        assert_eq!(value.string(), "250");
        assert_eq!(*daemon.pushed.lock().unwrap(), vec![Value::from(250_i64)]);
    }

    #[tokio::test]
    async fn failed_baseline_fetch_names_setting() {
        let daemon = Arc::new(FakeDaemon {
            fail_fetch: true,
            ..FakeDaemon::default()
        });
        let mut value = peers(daemon);
        let err = value.set("10").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Can't change setting srv.limit.peers.global: rpc error: daemon unreachable"
        );
        assert!(!value.is_connected());
    }

    #[tokio::test]
    async fn failed_push_keeps_local_value() {
        let daemon = Arc::new(FakeDaemon {
            stored: Mutex::new(Some(Value::from(1_i64))),
            fail_push: true,
            ..FakeDaemon::default()
        });
        let mut value = peers(daemon);
        let err = value.set("5").await.unwrap_err();
        assert!(matches!(err, ValueError::Remote { .. }));
        assert_eq!(value.string(), "5");
    }

    #[tokio::test]
    async fn invalid_input_is_not_pushed() {
        let daemon = Arc::new(FakeDaemon::with(Value::from(1_i64)));
        let mut value = peers(daemon.clone());
        let err = value.set("many").await.unwrap_err();
        assert_eq!(err.to_string(), "Not a number");
        assert!(daemon.pushed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upgrade_uses_cached_value() {
        let daemon = Arc::new(FakeDaemon {
            cached: Some(Value::from(42_i64)),
            ..FakeDaemon::default()
        });
        let mut value = peers(daemon);
        assert_eq!(value.upgrade(), &Value::from(42_i64));
        assert!(value.is_connected());
    }

    #[tokio::test]
    async fn complete_path_joins_relative_input() {
        let daemon = Arc::new(FakeDaemon::with(Value::from("/srv/torrents")));
        let mut value = RemoteValue::path_complete("srv.path.complete", daemon.clone()).unwrap();
        value.set("music").await.unwrap();
        assert_eq!(
            daemon.pushed.lock().unwrap().last(),
            Some(&Value::Path(PathBuf::from("/srv/torrents/music")))
        );
        value.set("/data").await.unwrap();
        assert_eq!(value.string(), "/data");
    }

    #[tokio::test]
    async fn incomplete_path_passes_booleans_through() {
        let daemon = Arc::new(FakeDaemon::with(Value::from("/srv/incomplete")));
        let mut value = RemoteValue::path_incomplete("srv.path.incomplete", daemon.clone()).unwrap();
        value.set("off").await.unwrap();
        assert_eq!(daemon.pushed.lock().unwrap().last(), Some(&Value::Bool(false)));
        value.set("partial").await.unwrap();
        assert_eq!(
            daemon.pushed.lock().unwrap().last(),
            Some(&Value::Path(PathBuf::from("partial")))
        );
        value.set("more").await.unwrap();
        assert_eq!(
            daemon.pushed.lock().unwrap().last(),
            Some(&Value::Path(PathBuf::from("partial/more")))
        );
    }

    #[tokio::test]
    async fn rate_limit_adjustment_against_daemon() {
        let daemon = Arc::new(FakeDaemon::with(Value::Constant(Constant::Unlimited)));
        let ty = rate_limit(SharedConverter::default()).unwrap();
        let mut value = RemoteValue::new("srv.limit.rate.up", Arc::new(ty), daemon.clone()).unwrap();
        value.set("+=100kB").await.unwrap();
        let pushed = daemon.pushed.lock().unwrap().last().cloned().unwrap();
        assert_eq!(pushed.as_number().unwrap().value(), 100_000.0);
        assert_eq!(value.string(), "100kB");
    }
}
