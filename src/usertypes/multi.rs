use std::{fmt, sync::Arc};

use log::trace;

use super::{
    error::{ValueError, ValueResult},
    types::ValueType,
    value::Value,
};

/// Tries its member types in order and commits to the first one that accepts
/// the input.
#[derive(Debug, Clone)]
pub struct MultiType {
    members: Vec<Arc<dyn ValueType>>,
}

impl MultiType {
    pub fn new(members: Vec<Arc<dyn ValueType>>) -> ValueResult<Self> {
        if members.is_empty() {
            return Err(ValueError::misconfigured("No types provided"));
        }
        Ok(Self { members })
    }

    pub fn members(&self) -> &[Arc<dyn ValueType>] {
        &self.members
    }

    /// The member that `value` belongs to: the first holding member that also
    /// accepts it, else the first holding member.
    pub fn member_for(&self, value: &Value) -> Option<&Arc<dyn ValueType>> {
        let holding: Vec<&Arc<dyn ValueType>> =
            self.members.iter().filter(|member| member.holds(value)).collect();
        holding
            .iter()
            .copied()
            .find(|member| member.validate(value).is_ok())
            .or_else(|| holding.first().copied())
    }

    fn joined(&self, describe: impl Fn(&dyn ValueType) -> String) -> String {
        self.members
            .iter()
            .filter(|member| !member.typename().is_empty())
            .map(|member| describe(member.as_ref()))
            .collect::<Vec<_>>()
            .join(" or ")
    }
}

impl ValueType for MultiType {
    fn typename(&self) -> String {
        self.joined(|member| member.typename())
    }

    fn syntax(&self) -> String {
        self.joined(|member| member.syntax())
    }

    fn convert(&self, raw: &Value, current: Option<&Value>) -> ValueResult<Value> {
        let mut errors = Vec::with_capacity(self.members.len());
        for member in &self.members {
            match member.parse(raw, current) {
                Ok(value) => {
                    trace!("{raw:?} accepted as {}", member.typename());
                    return Ok(value);
                }
                Err(err) if err.is_misconfigured() => return Err(err),
                Err(err) => errors.push(err.to_string()),
            }
        }
        Err(ValueError::invalid(errors.join("; ")))
    }

    fn validate(&self, value: &Value) -> ValueResult<()> {
        let mut errors = Vec::new();
        for member in self.members.iter().filter(|member| member.holds(value)) {
            match member.validate(value) {
                Ok(()) => return Ok(()),
                Err(err) => errors.push(err.to_string()),
            }
        }
        if errors.is_empty() {
            Err(ValueError::invalid(format!("Not a {}", self.typename())))
        } else {
            Err(ValueError::invalid(errors.join("; ")))
        }
    }

    fn holds(&self, value: &Value) -> bool {
        self.member_for(value).is_some()
    }

    fn string(&self, value: &Value) -> String {
        match self.member_for(value) {
            Some(member) => member.string(value),
            None => value.to_string(),
        }
    }

    fn coerce(&self, value: Value) -> Value {
        match self.member_for(&value) {
            Some(member) => member.coerce(value),
            None => value,
        }
    }

    fn committed(&self, value: &Value) {
        if let Some(member) = self.member_for(value) {
            member.committed(value);
        }
    }
}

/// Hooks that wrap the whole union dispatch of a [`Union`].
///
/// Each hook runs once per call, no matter which member ends up handling the
/// value. The defaults just delegate to the members.
pub trait UnionHooks: fmt::Debug + Send + Sync {
    fn convert(&self, members: &MultiType, raw: &Value, current: Option<&Value>) -> ValueResult<Value> {
        members.convert(raw, current)
    }

    fn validate(&self, members: &MultiType, value: &Value) -> ValueResult<()> {
        members.validate(value)
    }

    fn string(&self, members: &MultiType, value: &Value) -> String {
        members.string(value)
    }

    fn committed(&self, members: &MultiType, value: &Value) {
        members.committed(value)
    }
}

/// A [`MultiType`] with custom behaviour layered on top through [`UnionHooks`].
#[derive(Debug)]
pub struct Union<H> {
    members: MultiType,
    hooks: H,
}

impl<H: UnionHooks> Union<H> {
    pub fn new(members: Vec<Arc<dyn ValueType>>, hooks: H) -> ValueResult<Self> {
        Ok(Self {
            members: MultiType::new(members)?,
            hooks,
        })
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn members(&self) -> &MultiType {
        &self.members
    }
}

impl<H: UnionHooks> ValueType for Union<H> {
    fn typename(&self) -> String {
        self.members.typename()
    }

    fn syntax(&self) -> String {
        self.members.syntax()
    }

    fn convert(&self, raw: &Value, current: Option<&Value>) -> ValueResult<Value> {
        self.hooks.convert(&self.members, raw, current)
    }

    fn validate(&self, value: &Value) -> ValueResult<()> {
        self.hooks.validate(&self.members, value)
    }

    fn holds(&self, value: &Value) -> bool {
        self.members.holds(value)
    }

    fn string(&self, value: &Value) -> String {
        self.hooks.string(&self.members, value)
    }

    fn coerce(&self, value: Value) -> Value {
        self.members.coerce(value)
    }

    fn committed(&self, value: &Value) {
        self.hooks.committed(&self.members, value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::usertypes::{
        convert::SharedConverter,
        limits::BandwidthType,
        number::{NumberKind, NumberOptions},
        types::{BoolType, ConstantType, NumberType, PathType, StringType},
        value::Constant,
    };

    fn text(value: &str) -> Value {
        Value::from(value)
    }

    fn bool_or_path() -> MultiType {
        MultiType::new(vec![Arc::new(BoolType::new()), Arc::new(PathType::new())]).unwrap()
    }

    #[test]
    fn first_accepting_member_wins() {
        let ty = bool_or_path();
        assert_eq!(ty.parse(&text("yes"), None).unwrap(), Value::Bool(true));
        assert!(matches!(ty.parse(&text("/tmp"), None).unwrap(), Value::Path(_)));
        assert_eq!(ty.string(&Value::Bool(true)), "enabled");
    }

    #[test]
    fn errors_from_all_members_are_joined() {
        let ty = MultiType::new(vec![
            Arc::new(BoolType::new()),
            Arc::new(ConstantType(Constant::Unlimited)),
            Arc::new(NumberType::float()),
        ])
        .unwrap();
        let err = ty.parse(&text("zzz"), None).unwrap_err();
        assert_eq!(err.to_string(), "Not a boolean; Not 'unlimited'; Not a number");
    }

    #[test]
    fn descriptors_skip_marker_types() {
        let ty = MultiType::new(vec![
            Arc::new(ConstantType(Constant::Disconnected)),
            Arc::new(BoolType::new()),
            Arc::new(NumberType::float()),
        ])
        .unwrap();
        assert_eq!(ty.typename(), "boolean or number");
        assert_eq!(
            ty.syntax(),
            "enabled/disabled|yes/no|on/off|true/false|1/0 or <NUMBER>[Ti|Gi|Mi|Ki|T|G|M|k]"
        );
    }

    #[test]
    fn members_of_the_same_kind_keep_their_own_limits() {
        let small = NumberType::new(NumberKind::Int, NumberOptions::new().max(10.0)).unwrap();
        let large = NumberType::new(NumberKind::Float, NumberOptions::new().min(100.0)).unwrap();
        let ty = MultiType::new(vec![Arc::new(small), Arc::new(large)]).unwrap();
        let value = ty.parse(&text("500"), None).unwrap();
        assert_eq!(value, Value::from(500.0));
        assert!(ty.validate(&value).is_ok());
        assert_eq!(ty.string(&value), "500");
        assert_eq!(ty.parse(&text("7"), None).unwrap(), Value::from(7_i64));
        assert_eq!(
            ty.parse(&text("50"), None).unwrap_err().to_string(),
            "Too big (maximum is 10); Too small (minimum is 100)"
        );
        assert_eq!(
            ty.validate(&Value::from(50.0)).unwrap_err().to_string(),
            "Too big (maximum is 10); Too small (minimum is 100)"
        );
    }

    #[test]
    fn bandwidth_union_falls_back_in_order() {
        let ty = MultiType::new(vec![
            Arc::new(BoolType::new()),
            Arc::new(ConstantType(Constant::Unlimited)),
            Arc::new(BandwidthType::new(SharedConverter::default())),
        ])
        .unwrap();
        assert_eq!(ty.parse(&text("yes"), None).unwrap(), Value::Bool(true));
        assert_eq!(
            ty.parse(&text("unlimited"), None).unwrap(),
            Value::Constant(Constant::Unlimited)
        );
        let value = ty.parse(&text("100kB"), None).unwrap();
        assert_eq!(value.as_number().map(|number| number.value()), Some(100_000.0));
        assert_eq!(ty.string(&value), "100kB");
    }

    #[test]
    fn empty_union_is_misconfigured() {
        assert!(MultiType::new(Vec::new()).unwrap_err().is_misconfigured());
    }

    #[derive(Debug, Default)]
    struct Counting {
        converts: AtomicUsize,
        strings: AtomicUsize,
    }

    impl UnionHooks for Arc<Counting> {
        fn convert(&self, members: &MultiType, raw: &Value, current: Option<&Value>) -> ValueResult<Value> {
            self.converts.fetch_add(1, Ordering::SeqCst);
            members.convert(raw, current)
        }

        fn string(&self, members: &MultiType, value: &Value) -> String {
            self.strings.fetch_add(1, Ordering::SeqCst);
            format!("<{}>", members.string(value))
        }
    }

    #[test]
    fn hooks_run_once_per_call() {
        let counter = Arc::new(Counting::default());
        let ty = Union::new(
            vec![
                Arc::new(BoolType::new()),
                Arc::new(NumberType::float()),
                Arc::new(StringType::new()),
            ],
            counter.clone(),
        )
        .unwrap();
        let value = ty.parse(&text("hello"), None).unwrap();
        assert_eq!(counter.converts.load(Ordering::SeqCst), 1);
        assert_eq!(ty.string(&value), "<hello>");
        assert_eq!(counter.strings.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn nested_unions_compose() {
        let inner_counter = Arc::new(Counting::default());
        let outer_counter = Arc::new(Counting::default());
        let inner = Union::new(
            vec![Arc::new(BoolType::new()), Arc::new(NumberType::int())],
            inner_counter.clone(),
        )
        .unwrap();
        let outer = Union::new(
            vec![Arc::new(ConstantType(Constant::Random)), Arc::new(inner)],
            outer_counter.clone(),
        )
        .unwrap();
        let value = outer.parse(&text("42"), None).unwrap();
        assert_eq!(value, Value::from(42_i64));
        assert_eq!(outer_counter.converts.load(Ordering::SeqCst), 1);
        assert_eq!(inner_counter.converts.load(Ordering::SeqCst), 1);
        assert_eq!(outer.string(&value), "<<42>>");
        assert_eq!(outer.typename(), "random or boolean or integer");
    }
}
