//! Typed user values: parsing, validation and rendering of everything a user
//! can type into a setting.

pub mod convert;
pub mod error;
pub mod limits;
pub mod multi;
pub mod number;
pub mod remote;
pub mod types;
pub mod user;
pub mod value;

pub use convert::{Converters, DataUnit, SharedConverter, UnitConverter};
pub use error::{ValueError, ValueResult};
pub use limits::{port, rate_limit, BandwidthType, RateLimitHooks, RateLimitType};
pub use multi::{MultiType, Union, UnionHooks};
pub use number::{Number, NumberKind, NumberOptions, Op, Prefix};
pub use remote::{RemoteSetting, RemoteValue};
pub use types::{BoolType, ConstantType, NumberType, OptionType, PathType, StringType, TupleType, ValueType};
pub use user::{ListenerId, UserValue, UNSPECIFIED};
pub use value::{Constant, Value};
