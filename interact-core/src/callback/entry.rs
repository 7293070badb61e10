//! One registered ephemeral callback and its invocation accounting.

use std::{
    any::Any,
    collections::HashMap,
    fmt,
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
    time::{Duration, Instant},
};

use compact_str::CompactString;
use futures::future::BoxFuture;

use super::context::CallbackContext;
use crate::event::{MessageLocation, SharedEvent};

pub type CallbackFuture = BoxFuture<'static, anyhow::Result<()>>;

/// Closure-style handler stored for a single component.
pub type ComponentCallback = Arc<dyn Fn(SharedEvent, CallbackContext) -> CallbackFuture + Send + Sync>;

/// Wrap an async closure as a [`ComponentCallback`].
pub fn callback_fn<F, Fut>(f: F) -> ComponentCallback
where
    F: Fn(SharedEvent, CallbackContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |event, context| Box::pin(f(event, context)))
}

type AttributeMap = HashMap<CompactString, Arc<dyn Any + Send + Sync>>;

/// Immutable, type-erased values attached to a callback at registration.
#[derive(Clone, Default)]
pub struct Attributes(Arc<AttributeMap>);

impl Attributes {
    pub fn insert<V: Any + Send + Sync>(&mut self, key: impl Into<CompactString>, value: V) {
        Arc::make_mut(&mut self.0).insert(key.into(), Arc::new(value));
    }

    /// Value under `key` if present and of type `T`.
    #[must_use]
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.0.get(key).and_then(|v| (**v).downcast_ref::<T>())
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(CompactString::as_str)
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys()).finish()
    }
}

pub struct CallbackEntry {
    callback: ComponentCallback,
    ttl: Duration,
    max_invocations: u32,
    invocation_count: AtomicU32,
    exhausted: AtomicBool,
    location: Option<MessageLocation>,
    attributes: Attributes,
    created_at: Instant,
}

impl CallbackEntry {
    /// Unbounded entry living for `ttl`.
    #[must_use]
    pub fn new(callback: ComponentCallback, ttl: Duration) -> Self {
        Self {
            callback,
            ttl,
            max_invocations: 0,
            invocation_count: AtomicU32::new(0),
            exhausted: AtomicBool::new(false),
            location: None,
            attributes: Attributes::default(),
            created_at: Instant::now(),
        }
    }

    /// Bound the number of invocations; `0` means only the TTL applies.
    #[must_use]
    pub fn with_max_invocations(mut self, max: u32) -> Self {
        self.max_invocations = max;
        self
    }

    /// Message whose components are disabled when this entry is evicted.
    #[must_use]
    pub fn with_location(mut self, location: Option<MessageLocation>) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn callback(&self) -> &ComponentCallback {
        &self.callback
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    #[must_use]
    pub const fn max_invocations(&self) -> u32 {
        self.max_invocations
    }

    #[must_use]
    pub fn invocation_count(&self) -> u32 {
        self.invocation_count.load(Ordering::Acquire)
    }

    #[must_use]
    pub const fn location(&self) -> Option<MessageLocation> {
        self.location
    }

    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    #[must_use]
    pub const fn created_at(&self) -> Instant {
        self.created_at
    }

    #[must_use]
    pub fn remaining_time(&self) -> Duration {
        self.ttl.saturating_sub(self.created_at.elapsed())
    }

    #[must_use]
    pub fn has_remaining_invocations(&self) -> bool {
        self.max_invocations == 0 || self.invocation_count() < self.max_invocations
    }

    /// `None` for unbounded entries.
    #[must_use]
    pub fn remaining_invocations(&self) -> Option<u32> {
        (self.max_invocations > 0)
            .then(|| self.max_invocations.saturating_sub(self.invocation_count()))
    }

    /// Claim one invocation of a bounded entry.
    ///
    /// Returns the new count, or `None` once all invocations are taken. The
    /// check and the increment are one CAS, so at most `max` claims succeed.
    pub(crate) fn try_claim(&self) -> Option<u32> {
        let max = self.max_invocations;
        self.invocation_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                (count < max).then(|| count + 1)
            })
            .ok()
            .map(|previous| previous + 1)
    }

    pub(crate) fn mark_exhausted(&self) {
        self.exhausted.store(true, Ordering::Release);
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::Acquire)
    }
}

impl fmt::Debug for CallbackEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackEntry")
            .field("ttl", &self.ttl)
            .field("max_invocations", &self.max_invocations)
            .field("invocation_count", &self.invocation_count())
            .field("location", &self.location)
            .field("attributes", &self.attributes)
            .finish_non_exhaustive()
    }
}
