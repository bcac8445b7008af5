//! Daemon settings exposed as `srv.*` remote values.

use std::{
    path::PathBuf,
    sync::{Arc, PoisonError, RwLock},
};

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::{json, Map, Value as JsonValue};

use crate::{
    rpc::{RpcResult, TransmissionClient, TransmissionError},
    usertypes::{
        number::convert_unit, port, rate_limit, BoolType, Constant, Converters, NumberKind,
        NumberOptions, NumberType, OptionType, RemoteSetting, RemoteValue, SharedConverter, Value,
        ValueResult,
    },
};

/// Daemon settings as reported by `session-get`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionPreferences {
    #[serde(rename = "download-dir", alias = "download_dir")]
    pub download_dir: Option<String>,
    #[serde(rename = "incomplete-dir", alias = "incomplete_dir")]
    pub incomplete_dir: Option<String>,
    #[serde(rename = "incomplete-dir-enabled", alias = "incomplete_dir_enabled")]
    pub incomplete_dir_enabled: Option<bool>,
    /// Kilobytes per second.
    #[serde(rename = "speed-limit-up", alias = "speed_limit_up")]
    pub speed_limit_up: Option<i64>,
    #[serde(rename = "speed-limit-up-enabled", alias = "speed_limit_up_enabled")]
    pub speed_limit_up_enabled: Option<bool>,
    #[serde(rename = "speed-limit-down", alias = "speed_limit_down")]
    pub speed_limit_down: Option<i64>,
    #[serde(rename = "speed-limit-down-enabled", alias = "speed_limit_down_enabled")]
    pub speed_limit_down_enabled: Option<bool>,
    #[serde(rename = "peer-port", alias = "peer_port")]
    pub peer_port: Option<i64>,
    #[serde(rename = "peer-port-random-on-start", alias = "peer_port_random_on_start")]
    pub peer_port_random_on_start: Option<bool>,
    #[serde(rename = "peer-limit-global", alias = "peer_limit_global")]
    pub peer_limit_global: Option<i64>,
    #[serde(rename = "peer-limit-per-torrent", alias = "peer_limit_per_torrent")]
    pub peer_limit_per_torrent: Option<i64>,
    pub encryption: Option<String>,
    #[serde(rename = "dht-enabled", alias = "dht_enabled")]
    pub dht_enabled: Option<bool>,
    #[serde(rename = "pex-enabled", alias = "pex_enabled")]
    pub pex_enabled: Option<bool>,
    #[serde(rename = "lpd-enabled", alias = "lpd_enabled")]
    pub lpd_enabled: Option<bool>,
}

pub const ENCRYPTION_MODES: [&str; 3] = ["required", "preferred", "tolerated"];

/// Which daemon setting a remote value mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKey {
    RateLimitUp,
    RateLimitDown,
    PathComplete,
    PathIncomplete,
    Port,
    PeerLimitGlobal,
    PeerLimitTorrent,
    Encryption,
    Dht,
    Pex,
    Lpd,
}

fn missing(field: &str) -> TransmissionError {
    TransmissionError::MissingField(field.to_string())
}

fn encode_error(value: &Value) -> TransmissionError {
    TransmissionError::Encode(value.to_string())
}

impl SessionKey {
    /// Setting name without the `srv.` prefix.
    pub fn name(self) -> &'static str {
        match self {
            SessionKey::RateLimitUp => "limit.rate.up",
            SessionKey::RateLimitDown => "limit.rate.down",
            SessionKey::PathComplete => "path.complete",
            SessionKey::PathIncomplete => "path.incomplete",
            SessionKey::Port => "port",
            SessionKey::PeerLimitGlobal => "limit.peers.global",
            SessionKey::PeerLimitTorrent => "limit.peers.torrent",
            SessionKey::Encryption => "encryption",
            SessionKey::Dht => "dht",
            SessionKey::Pex => "pex",
            SessionKey::Lpd => "lpd",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SessionKey::RateLimitUp => "Combined upload rate limit",
            SessionKey::RateLimitDown => "Combined download rate limit",
            SessionKey::PathComplete => "Where to put downloaded files",
            SessionKey::PathIncomplete => "Where to put incomplete files",
            SessionKey::Port => "Port used to communicate with peers",
            SessionKey::PeerLimitGlobal => "Maximum number connections for all torrents combined",
            SessionKey::PeerLimitTorrent => "Maximum number connections per torrent",
            SessionKey::Encryption => "Whether protocol encryption should be used",
            SessionKey::Dht => "Whether to use DHT to discover peers",
            SessionKey::Pex => "Whether to use peer exchange to discover peers",
            SessionKey::Lpd => "Whether to use local peer discovery",
        }
    }

    pub fn all() -> [SessionKey; 11] {
        [
            SessionKey::RateLimitUp,
            SessionKey::RateLimitDown,
            SessionKey::PathComplete,
            SessionKey::PathIncomplete,
            SessionKey::Port,
            SessionKey::PeerLimitGlobal,
            SessionKey::PeerLimitTorrent,
            SessionKey::Encryption,
            SessionKey::Dht,
            SessionKey::Pex,
            SessionKey::Lpd,
        ]
    }

    /// Read this setting from a `session-get` response.
    pub fn extract(self, prefs: &SessionPreferences, bandwidth: &SharedConverter) -> RpcResult<Value> {
        let rate = |limit: Option<i64>, enabled: Option<bool>, field: &str| -> RpcResult<Value> {
            match (enabled, limit) {
                (Some(false), _) => Ok(Value::Constant(Constant::Unlimited)),
                (Some(true), Some(kilobytes)) => bandwidth
                    .convert_f64(kilobytes as f64 * 1000.0, Some("B"))
                    .map(Value::Number)
                    .map_err(|err| TransmissionError::Rpc(err.to_string())),
                _ => Err(missing(field)),
            }
        };
        let flag = |value: Option<bool>, field: &str| value.map(Value::Bool).ok_or_else(|| missing(field));
        let count = |value: Option<i64>, field: &str| value.map(Value::from).ok_or_else(|| missing(field));
        match self {
            SessionKey::RateLimitUp => {
                rate(prefs.speed_limit_up, prefs.speed_limit_up_enabled, "speed-limit-up")
            }
            SessionKey::RateLimitDown => {
                rate(prefs.speed_limit_down, prefs.speed_limit_down_enabled, "speed-limit-down")
            }
            SessionKey::PathComplete => prefs
                .download_dir
                .as_ref()
                .map(|dir| Value::Path(PathBuf::from(dir)))
                .ok_or_else(|| missing("download-dir")),
            SessionKey::PathIncomplete => match (prefs.incomplete_dir_enabled, &prefs.incomplete_dir) {
                (Some(false), _) => Ok(Value::Bool(false)),
                (Some(true), Some(dir)) => Ok(Value::Path(PathBuf::from(dir))),
                _ => Err(missing("incomplete-dir")),
            },
            SessionKey::Port => match prefs.peer_port_random_on_start {
                Some(true) => Ok(Value::Constant(Constant::Random)),
                _ => count(prefs.peer_port, "peer-port"),
            },
            SessionKey::PeerLimitGlobal => count(prefs.peer_limit_global, "peer-limit-global"),
            SessionKey::PeerLimitTorrent => {
                count(prefs.peer_limit_per_torrent, "peer-limit-per-torrent")
            }
            SessionKey::Encryption => prefs
                .encryption
                .clone()
                .map(Value::Text)
                .ok_or_else(|| missing("encryption")),
            SessionKey::Dht => flag(prefs.dht_enabled, "dht-enabled"),
            SessionKey::Pex => flag(prefs.pex_enabled, "pex-enabled"),
            SessionKey::Lpd => flag(prefs.lpd_enabled, "lpd-enabled"),
        }
    }

    /// `session-set` arguments that apply `value`.
    pub fn arguments(self, value: &Value) -> RpcResult<Map<String, JsonValue>> {
        let object = match (self, value) {
            (SessionKey::RateLimitUp | SessionKey::RateLimitDown, _) => {
                let (limit, enabled) = match self {
                    SessionKey::RateLimitUp => ("speed-limit-up", "speed-limit-up-enabled"),
                    _ => ("speed-limit-down", "speed-limit-down-enabled"),
                };
                let mut map = Map::new();
                match value {
                    Value::Constant(Constant::Unlimited) => {
                        map.insert(enabled.to_string(), JsonValue::Bool(false));
                    }
                    Value::Number(number) => {
                        let bytes = convert_unit(number.value(), number.unit().unwrap_or("B"), "B")
                            .map_err(|_| encode_error(value))?;
                        let kilobytes = (bytes / 1000.0).round() as i64;
                        map.insert(limit.to_string(), json!(kilobytes));
                        map.insert(enabled.to_string(), JsonValue::Bool(true));
                    }
                    _ => return Err(encode_error(value)),
                }
                JsonValue::Object(map)
            }
            (SessionKey::PathComplete, Value::Path(path)) => {
                json!({ "download-dir": path.to_string_lossy() })
            }
            (SessionKey::PathIncomplete, Value::Bool(enabled)) => {
                json!({ "incomplete-dir-enabled": enabled })
            }
            (SessionKey::PathIncomplete, Value::Path(path)) => json!({
                "incomplete-dir": path.to_string_lossy(),
                "incomplete-dir-enabled": true,
            }),
            (SessionKey::Port, Value::Constant(Constant::Random)) => {
                json!({ "peer-port-random-on-start": true })
            }
            (SessionKey::Port, Value::Number(number)) => json!({
                "peer-port": number.as_i64(),
                "peer-port-random-on-start": false,
            }),
            (SessionKey::PeerLimitGlobal, Value::Number(number)) => {
                json!({ "peer-limit-global": number.as_i64() })
            }
            (SessionKey::PeerLimitTorrent, Value::Number(number)) => {
                json!({ "peer-limit-per-torrent": number.as_i64() })
            }
            (SessionKey::Encryption, Value::Text(mode)) => json!({ "encryption": mode }),
            (SessionKey::Dht, Value::Bool(enabled)) => json!({ "dht-enabled": enabled }),
            (SessionKey::Pex, Value::Bool(enabled)) => json!({ "pex-enabled": enabled }),
            (SessionKey::Lpd, Value::Bool(enabled)) => json!({ "lpd-enabled": enabled }),
            _ => return Err(encode_error(value)),
        };
        match object {
            JsonValue::Object(map) => Ok(map),
            _ => Err(encode_error(value)),
        }
    }
}

/// Settings reported by the last `session-get`, shared by every remote value.
#[derive(Debug, Default)]
pub struct SessionCache(RwLock<Option<SessionPreferences>>);

impl SessionCache {
    pub fn get(&self) -> Option<SessionPreferences> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn update(&self, prefs: SessionPreferences) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(prefs);
    }

    pub fn clear(&self) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// One daemon setting, read and written through the blocking RPC client.
pub struct SessionSetting {
    key: SessionKey,
    client: Arc<TransmissionClient>,
    cache: Arc<SessionCache>,
    bandwidth: SharedConverter,
}

impl SessionSetting {
    pub fn new(
        key: SessionKey,
        client: Arc<TransmissionClient>,
        cache: Arc<SessionCache>,
        bandwidth: SharedConverter,
    ) -> Self {
        Self {
            key,
            client,
            cache,
            bandwidth,
        }
    }
}

#[async_trait]
impl RemoteSetting for SessionSetting {
    fn cached(&self) -> Option<Value> {
        let prefs = self.cache.get()?;
        self.key.extract(&prefs, &self.bandwidth).ok()
    }

    async fn fetch(&self) -> Result<Value, TransmissionError> {
        let client = self.client.clone();
        let raw = tokio::task::spawn_blocking(move || client.session_get_raw(&[]))
            .await
            .map_err(|_| TransmissionError::Cancelled)??;
        let prefs: SessionPreferences = serde_json::from_value(JsonValue::Object(raw))?;
        let value = self.key.extract(&prefs, &self.bandwidth);
        self.cache.update(prefs);
        value
    }

    async fn push(&self, value: &Value) -> Result<(), TransmissionError> {
        let arguments = self.key.arguments(value)?;
        debug!("Sending srv.{} to {}", self.key.name(), self.client.endpoint());
        let client = self.client.clone();
        tokio::task::spawn_blocking(move || client.session_set(arguments))
            .await
            .map_err(|_| TransmissionError::Cancelled)??;
        // the daemon may adjust what it was given
        self.cache.clear();
        Ok(())
    }
}

/// Build the remote value for `key`, reading and writing through `source`.
pub fn remote_value(
    key: SessionKey,
    source: Arc<dyn RemoteSetting>,
    converters: &Converters,
) -> ValueResult<RemoteValue> {
    let name = format!("srv.{}", key.name());
    let remote = match key {
        SessionKey::RateLimitUp | SessionKey::RateLimitDown => {
            RemoteValue::new(name, Arc::new(rate_limit(converters.bandwidth.clone())?), source)?
        }
        SessionKey::PathComplete => RemoteValue::path_complete(name, source)?,
        SessionKey::PathIncomplete => RemoteValue::path_incomplete(name, source)?,
        SessionKey::Port => RemoteValue::new(name, Arc::new(port()?), source)?,
        SessionKey::PeerLimitGlobal | SessionKey::PeerLimitTorrent => {
            let count = NumberType::new(NumberKind::Int, NumberOptions::new().min(0.0))?;
            RemoteValue::new(name, Arc::new(count), source)?
        }
        SessionKey::Encryption => {
            RemoteValue::new(name, Arc::new(OptionType::new(ENCRYPTION_MODES)?), source)?
        }
        SessionKey::Dht | SessionKey::Pex | SessionKey::Lpd => {
            RemoteValue::new(name, Arc::new(BoolType::new()), source)?
        }
    };
    Ok(remote.with_description(key.description()))
}

/// Every `srv.*` value, backed by `client`.
pub fn session_values(
    client: Arc<TransmissionClient>,
    converters: &Converters,
) -> ValueResult<Vec<RemoteValue>> {
    let cache = Arc::new(SessionCache::default());
    SessionKey::all()
        .into_iter()
        .map(|key| {
            let source = SessionSetting::new(
                key,
                client.clone(),
                cache.clone(),
                converters.bandwidth.clone(),
            );
            remote_value(key, Arc::new(source), converters)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usertypes::Number;

    fn prefs() -> SessionPreferences {
        serde_json::from_value(json!({
            "download-dir": "/srv/torrents",
            "incomplete-dir": "/srv/incomplete",
            "incomplete-dir-enabled": false,
            "speed-limit-up": 250,
            "speed-limit-up-enabled": true,
            "speed-limit-down": 1000,
            "speed-limit-down-enabled": false,
            "peer_port": 51413,
            "peer-limit-global": 200,
            "encryption": "preferred",
            "dht-enabled": true
        }))
        .unwrap()
    }

    #[test]
    fn extracts_rate_limits_in_bytes() {
        let bandwidth = SharedConverter::default();
        let up = SessionKey::RateLimitUp.extract(&prefs(), &bandwidth).unwrap();
        assert_eq!(up.as_number().unwrap().value(), 250_000.0);
        let down = SessionKey::RateLimitDown.extract(&prefs(), &bandwidth).unwrap();
        assert_eq!(down, Value::Constant(Constant::Unlimited));
    }

    #[test]
    fn extracts_paths_and_flags() {
        let bandwidth = SharedConverter::default();
        assert_eq!(
            SessionKey::PathComplete.extract(&prefs(), &bandwidth).unwrap(),
            Value::Path(PathBuf::from("/srv/torrents"))
        );
        assert_eq!(
            SessionKey::PathIncomplete.extract(&prefs(), &bandwidth).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(SessionKey::Port.extract(&prefs(), &bandwidth).unwrap(), Value::from(51413_i64));
        assert_eq!(SessionKey::Dht.extract(&prefs(), &bandwidth).unwrap(), Value::Bool(true));
        let err = SessionKey::Pex.extract(&prefs(), &bandwidth).unwrap_err();
        assert_eq!(err.to_string(), "daemon did not report pex-enabled");
    }

    #[test]
    fn rate_limits_travel_as_kilobytes() {
        let bits = Number::from_f64(
            8_000_000.0,
            NumberKind::Int,
            &NumberOptions::new().unit("b"),
        )
        .unwrap();
        let args = SessionKey::RateLimitDown.arguments(&Value::Number(bits)).unwrap();
        assert_eq!(
            JsonValue::Object(args),
            json!({"speed-limit-down": 1000, "speed-limit-down-enabled": true})
        );
        let args = SessionKey::RateLimitUp
            .arguments(&Value::Constant(Constant::Unlimited))
            .unwrap();
        assert_eq!(JsonValue::Object(args), json!({"speed-limit-up-enabled": false}));
    }

    #[test]
    fn port_and_incomplete_dir_arguments() {
        let args = SessionKey::Port.arguments(&Value::Constant(Constant::Random)).unwrap();
        assert_eq!(JsonValue::Object(args), json!({"peer-port-random-on-start": true}));
        let args = SessionKey::PathIncomplete
            .arguments(&Value::Path(PathBuf::from("/tmp/part")))
            .unwrap();
        assert_eq!(
            JsonValue::Object(args),
            json!({"incomplete-dir": "/tmp/part", "incomplete-dir-enabled": true})
        );
        let err = SessionKey::Dht.arguments(&Value::from("yes")).unwrap_err();
        assert_eq!(err.to_string(), "cannot send yes to the daemon");
    }

    #[test]
    fn remote_values_are_named_and_described() {
        struct Offline;

        #[async_trait]
        impl RemoteSetting for Offline {
            async fn fetch(&self) -> Result<Value, TransmissionError> {
                Err(TransmissionError::Session)
            }

            async fn push(&self, _value: &Value) -> Result<(), TransmissionError> {
                Err(TransmissionError::Session)
            }
        }

        let converters = Converters::default();
        for key in SessionKey::all() {
            let value = remote_value(key, Arc::new(Offline), &converters).unwrap();
            assert_eq!(value.name(), format!("srv.{}", key.name()));
            assert_eq!(value.description(), key.description());
            assert!(!value.is_connected());
        }
    }
}
