//! Durable handler declarations and their resolved bindings.

use std::{borrow::Cow, fmt, future::Future, sync::Arc};

use compact_str::{CompactString, format_compact};

use component_id::{ComponentId, ComponentKind, DELIMITER};

use super::extract::{HandlerArgs, ParamSpec};
use crate::{callback::entry::CallbackFuture, event::SharedEvent};

/// Callable behind a durable handler.
pub type HandlerInvoker = Arc<dyn Fn(SharedEvent, HandlerArgs) -> CallbackFuture + Send + Sync>;

/// Wrap an async closure as a [`HandlerInvoker`].
pub fn handler_fn<F, Fut>(f: F) -> HandlerInvoker
where
    F: Fn(SharedEvent, HandlerArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |event, args| Box::pin(f(event, args)))
}

/// What a handler declaration listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerTarget {
    Button,

    /// Both string and entity select menus
    SelectMenu,

    Modal,
}

impl HandlerTarget {
    pub const fn kinds(self) -> &'static [ComponentKind] {
        match self {
            Self::Button => &[ComponentKind::Button],
            Self::SelectMenu => &[ComponentKind::StringSelect, ComponentKind::EntitySelect],
            Self::Modal => &[ComponentKind::Modal],
        }
    }
}

/// Registration-time description of one handler.
pub struct HandlerSpec {
    pub target: HandlerTarget,
    pub value: CompactString,
    pub pattern: bool,
    pub name: CompactString,
    pub params: Vec<ParamSpec>,
    pub invoker: HandlerInvoker,
}

impl HandlerSpec {
    /// Exact-match handler for `value`.
    pub fn new(target: HandlerTarget, value: &str, invoker: HandlerInvoker) -> Self {
        Self {
            target,
            value: value.into(),
            pattern: false,
            name: value.into(),
            params: Vec::new(),
            invoker,
        }
    }

    /// Treat `value` as an identity prefix.
    #[must_use]
    pub fn pattern(mut self) -> Self {
        self.pattern = true;
        self
    }

    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.into();
        self
    }

    /// Append the next declared parameter.
    #[must_use]
    pub fn param(mut self, param: impl Into<ParamSpec>) -> Self {
        self.params.push(param.into());
        self
    }
}

impl fmt::Debug for HandlerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerSpec")
            .field("target", &self.target)
            .field("value", &self.value)
            .field("pattern", &self.pattern)
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Object contributing a group of handlers, registered in one call.
pub trait HandlerSource: Send + Sync + 'static {
    /// Owner label used in logs and binding names.
    fn source_name(&self) -> &str;

    fn handlers(self: Arc<Self>) -> Vec<HandlerSpec>;
}

/// One resolved (kind, value) entry of the registry. Immutable.
pub struct HandlerBinding {
    owner: CompactString,
    method: CompactString,
    value: CompactString,
    pattern: bool,
    kind: ComponentKind,
    params: Arc<[ParamSpec]>,
    invoker: HandlerInvoker,
}

impl HandlerBinding {
    pub(crate) fn new(
        owner: &str,
        spec: &HandlerSpec,
        kind: ComponentKind,
        params: Arc<[ParamSpec]>,
    ) -> Self {
        Self {
            owner: owner.into(),
            method: spec.name.clone(),
            value: spec.value.clone(),
            pattern: spec.pattern,
            kind,
            params,
            invoker: Arc::clone(&spec.invoker),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub const fn is_pattern(&self) -> bool {
        self.pattern
    }

    pub const fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// `owner::method`, for logs.
    pub fn handler_name(&self) -> CompactString {
        format_compact!("{}::{}", self.owner, self.method)
    }

    pub(crate) fn matches(&self, identity: &str) -> bool {
        if self.pattern {
            identity.starts_with(self.value.as_str())
        } else {
            identity == self.value.as_str()
        }
    }

    /// Data string handed to extraction.
    ///
    /// For a prefix binding matched by a longer identity this is the rest of
    /// the identity, joined with the payload if any. Otherwise the payload.
    pub fn extract_data<'a>(&self, id: &'a ComponentId) -> Option<Cow<'a, str>> {
        let rest = id
            .identity()
            .strip_prefix(self.value.as_str())
            .filter(|rest| self.pattern && !rest.is_empty());

        if let Some(rest) = rest {
            return Some(match id.payload() {
                Some(payload) => Cow::Owned(format!("{rest}{DELIMITER}{payload}")),
                None => Cow::Borrowed(rest),
            });
        }

        id.payload().map(Cow::Borrowed)
    }

    pub(crate) fn invoke(&self, event: SharedEvent, args: HandlerArgs) -> CallbackFuture {
        (self.invoker)(event, args)
    }
}

impl fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBinding")
            .field("handler", &self.handler_name())
            .field("value", &self.value)
            .field("pattern", &self.pattern)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
