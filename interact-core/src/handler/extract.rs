//! Typed argument extraction for durable handlers.
//!
//! Each handler parameter carries a [`ParamSpec`] resolved at registration;
//! the router turns the component's data string into [`HandlerArgs`] with it.

use std::fmt;

use compact_str::CompactString;
use smallvec::SmallVec;

use component_id::split_segments;

use crate::error::{CoreError, CoreResult};

/// Target type of one extracted argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueType {
    #[default]
    Str,
    Int,
    Long,
    Bool,
}

impl ValueType {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Str => "string",
            Self::Int => "int",
            Self::Long => "long",
            Self::Bool => "bool",
        }
    }

    /// Convert raw text; bools are `true` only for a case-insensitive "true".
    pub fn convert(self, raw: &str) -> CoreResult<DataValue> {
        let conversion = || CoreError::Conversion {
            value: raw.into(),
            target: self.name(),
        };

        Ok(match self {
            Self::Str => DataValue::Str(raw.into()),
            Self::Int => DataValue::Int(raw.trim().parse().map_err(|_| conversion())?),
            Self::Long => DataValue::Long(raw.trim().parse().map_err(|_| conversion())?),
            Self::Bool => DataValue::Bool(raw.eq_ignore_ascii_case("true")),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataValue {
    Str(CompactString),
    Int(i32),
    Long(i64),
    Bool(bool),
}

impl DataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub const fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(v) => Some(*v),
            // widening is lossless
            Self::Int(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// The whole data string
    Whole,

    /// One segment of the data split on `delimiter`
    Segment {
        index: usize,
        delimiter: CompactString,
    },
}

/// Where an argument comes from and what it is converted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSpec {
    pub source: DataSource,

    /// Used when the data or segment is missing; empty means `None`
    pub default: CompactString,

    pub ty: ValueType,
}

impl DataSpec {
    pub fn whole() -> Self {
        Self {
            source: DataSource::Whole,
            default: CompactString::default(),
            ty: ValueType::Str,
        }
    }

    pub fn segment(index: usize) -> Self {
        Self {
            source: DataSource::Segment {
                index,
                delimiter: CompactString::const_new(":"),
            },
            ..Self::whole()
        }
    }

    /// Change the split delimiter; no effect on [`DataSource::Whole`].
    #[must_use]
    pub fn delimiter(mut self, delimiter: &str) -> Self {
        if let DataSource::Segment { delimiter: d, .. } = &mut self.source {
            *d = delimiter.into();
        }
        self
    }

    #[must_use]
    pub fn default_value(mut self, default: &str) -> Self {
        self.default = default.into();
        self
    }

    #[must_use]
    pub fn as_int(self) -> Self {
        self.typed(ValueType::Int)
    }

    #[must_use]
    pub fn as_long(self) -> Self {
        self.typed(ValueType::Long)
    }

    #[must_use]
    pub fn as_bool(self) -> Self {
        self.typed(ValueType::Bool)
    }

    #[must_use]
    pub fn typed(mut self, ty: ValueType) -> Self {
        self.ty = ty;
        self
    }

    /// Resolve against a binding's extracted data.
    pub fn extract(&self, data: Option<&str>) -> CoreResult<Option<DataValue>> {
        let raw = match data.filter(|d| !d.is_empty()) {
            None => None,
            Some(data) => match &self.source {
                DataSource::Whole => Some(data),
                DataSource::Segment { index, delimiter } => {
                    split_segments(data, delimiter).get(*index).copied()
                }
            },
        };

        match raw {
            Some(raw) => self.ty.convert(raw).map(Some),
            None if self.default.is_empty() => Ok(None),
            None => self.ty.convert(&self.default).map(Some),
        }
    }
}

/// One declared handler parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamSpec {
    Data(DataSpec),

    /// A parameter the router cannot supply; always `None`
    Unbound,
}

impl From<DataSpec> for ParamSpec {
    fn from(spec: DataSpec) -> Self {
        Self::Data(spec)
    }
}

/// Arguments extracted for one invocation, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerArgs(SmallVec<[Option<DataValue>; 4]>);

impl HandlerArgs {
    pub fn extract(params: &[ParamSpec], data: Option<&str>) -> CoreResult<Self> {
        params
            .iter()
            .map(|param| match param {
                ParamSpec::Data(spec) => spec.extract(data),
                ParamSpec::Unbound => Ok(None),
            })
            .collect::<CoreResult<SmallVec<_>>>()
            .map(Self)
    }

    pub fn get(&self, index: usize) -> Option<&DataValue> {
        self.0.get(index).and_then(Option::as_ref)
    }

    pub fn str(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(DataValue::as_str)
    }

    pub fn int(&self, index: usize) -> Option<i32> {
        self.get(index).and_then(DataValue::as_int)
    }

    pub fn long(&self, index: usize) -> Option<i64> {
        self.get(index).and_then(DataValue::as_long)
    }

    pub fn bool(&self, index: usize) -> Option<bool> {
        self.get(index).and_then(DataValue::as_bool)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_data_as_string() {
        let spec = DataSpec::whole();
        assert_eq!(
            spec.extract(Some("close:123")).unwrap(),
            Some(DataValue::Str("close:123".into()))
        );
    }

    #[test]
    fn segments_with_custom_delimiter() {
        let spec = DataSpec::segment(1).delimiter("|").as_long();
        assert_eq!(
            spec.extract(Some("page|9000000000")).unwrap(),
            Some(DataValue::Long(9_000_000_000))
        );
    }

    #[test]
    fn missing_data_uses_default_or_none() {
        let with_default = DataSpec::segment(2).default_value("7").as_int();
        let without = DataSpec::segment(2).as_int();

        assert_eq!(with_default.extract(Some("a:b")).unwrap(), Some(DataValue::Int(7)));
        assert_eq!(with_default.extract(None).unwrap(), Some(DataValue::Int(7)));
        assert_eq!(without.extract(Some("a:b")).unwrap(), None);
        assert_eq!(DataSpec::whole().extract(Some("")).unwrap(), None);
    }

    #[test]
    fn bad_number_is_a_conversion_error() {
        let err = DataSpec::whole().as_int().extract(Some("abc")).unwrap_err();
        assert!(matches!(err, CoreError::Conversion { target: "int", .. }));
    }

    #[test]
    fn bool_is_true_only_for_true() {
        let spec = DataSpec::whole().as_bool();
        assert_eq!(spec.extract(Some("TRUE")).unwrap(), Some(DataValue::Bool(true)));
        assert_eq!(spec.extract(Some("yes")).unwrap(), Some(DataValue::Bool(false)));
    }

    #[test]
    fn args_keep_declaration_order() {
        let params = [
            DataSpec::segment(0).into(),
            ParamSpec::Unbound,
            DataSpec::segment(1).as_int().into(),
        ];
        let args = HandlerArgs::extract(&params, Some("close:123")).unwrap();

        assert_eq!(args.len(), 3);
        assert_eq!(args.str(0), Some("close"));
        assert_eq!(args.get(1), None);
        assert_eq!(args.int(2), Some(123));
        assert_eq!(args.long(2), Some(123));
    }
}
