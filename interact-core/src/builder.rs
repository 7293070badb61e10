//! Fluent construction of component ids, registering callbacks on the way.
//!
//! ```rust,ignore
//! let ids = IdFactory::new(store.clone());
//! let confirm = ids
//!     .callback(ComponentKind::Button)
//!     .on_interact(callback_fn(|event, _ctx| async move {
//!         event.reply_ephemeral("Deleted").await
//!     }))
//!     .max_invocations(1)
//!     .disable_on_expire(channel_id, message_id)
//!     .build()
//!     .await?;
//! let close = ids.stateless(ComponentKind::Button, "ticket-close").with_data("123").build().await?;
//! ```

use std::time::Duration;

use compact_str::CompactString;
use tracing::debug;

use component_id::{ComponentId, ComponentKind};

use crate::{
    callback::{
        entry::{Attributes, CallbackEntry, ComponentCallback},
        store::{CALLBACK_ID_LENGTH, CallbackStore},
    },
    error::{CoreError, CoreResult},
    event::MessageLocation,
};

/// Placeholder callback identity used to check the length limit before
/// anything is registered.
const PROBE_ID: &str = "00000000";
const _: () = assert!(PROBE_ID.len() == CALLBACK_ID_LENGTH);

#[derive(Debug, Clone)]
pub struct IdFactory {
    store: CallbackStore,
}

impl IdFactory {
    pub fn new(store: CallbackStore) -> Self {
        Self { store }
    }

    pub fn component(&self, kind: ComponentKind) -> ComponentIdBuilder<'_> {
        ComponentIdBuilder {
            store: &self.store,
            kind,
            id: None,
            data: None,
            callback: None,
            ttl: None,
            max_invocations: None,
            attributes: Attributes::default(),
            location: None,
        }
    }

    /// Builder for a callback component; set the callback with `on_interact`.
    pub fn callback(&self, kind: ComponentKind) -> ComponentIdBuilder<'_> {
        self.component(kind)
    }

    pub fn stateless(&self, kind: ComponentKind, id: &str) -> ComponentIdBuilder<'_> {
        self.component(kind).with_id(id)
    }
}

/// One component id under construction. A callback takes precedence over a
/// stateless id when both are set.
pub struct ComponentIdBuilder<'a> {
    store: &'a CallbackStore,
    kind: ComponentKind,
    id: Option<CompactString>,
    data: Option<String>,
    callback: Option<ComponentCallback>,
    ttl: Option<Duration>,
    max_invocations: Option<u32>,
    attributes: Attributes,
    location: Option<MessageLocation>,
}

impl ComponentIdBuilder<'_> {
    #[must_use]
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Payload made of `parts` joined with `:`.
    #[must_use]
    pub fn with_data_parts<I, S>(mut self, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = parts
            .into_iter()
            .map(|part| part.as_ref().to_owned())
            .collect::<Vec<_>>()
            .join(":");
        self.data = Some(joined);
        self
    }

    #[must_use]
    pub fn on_interact(mut self, callback: ComponentCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    #[must_use]
    pub fn expire_after(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// `0` leaves the callback bounded only by its TTL.
    #[must_use]
    pub fn max_invocations(mut self, max: u32) -> Self {
        self.max_invocations = Some(max);
        self
    }

    #[must_use]
    pub fn with_context<V: std::any::Any + Send + Sync>(mut self, key: &str, value: V) -> Self {
        self.attributes.insert(key, value);
        self
    }

    /// Disable the message's components once the callback is gone. Ignored
    /// when either id is zero.
    #[must_use]
    pub fn disable_on_expire(mut self, channel_id: u64, message_id: u64) -> Self {
        self.location = MessageLocation::new(channel_id, message_id);
        self
    }

    /// Register the callback, if any, and return the wire id.
    pub async fn build(self) -> CoreResult<String> {
        let data = self.data.as_deref().filter(|d| !d.is_empty());

        let Some(callback) = self.callback else {
            let id = self.id.as_deref().ok_or_else(|| {
                CoreError::InvalidComponent("component needs a callback or an id".into())
            })?;
            return Ok(ComponentId::stateless(self.kind, id, data).encode()?);
        };

        ComponentId::callback(self.kind, PROBE_ID, data).encode()?;

        let modal = self.kind == ComponentKind::Modal;
        let max = self.max_invocations.unwrap_or(if modal { 1 } else { 0 });
        let ttl = self.ttl.unwrap_or(self.store.config().default_ttl);
        // modals are not attached to a message
        let location = if modal { None } else { self.location };

        let entry = CallbackEntry::new(callback, ttl)
            .with_max_invocations(max)
            .with_location(location)
            .with_attributes(self.attributes);

        let callback_id = self.store.register(entry).await;
        debug!(kind = ?self.kind, callback_id = %callback_id, "Built callback component");

        Ok(ComponentId::callback(self.kind, &callback_id, data).encode()?)
    }
}

#[cfg(test)]
mod tests {
    use component_id::{IdError, RoutingKind};

    use super::*;
    use crate::{callback::entry::callback_fn, config::CallbackConfig};

    fn factory() -> IdFactory {
        IdFactory::new(CallbackStore::new(CallbackConfig::default()))
    }

    fn noop() -> ComponentCallback {
        callback_fn(|_event, _context| async { Ok(()) })
    }

    #[tokio::test]
    async fn stateless_id_with_parts() {
        let raw = factory()
            .stateless(ComponentKind::Button, "ticket-close")
            .with_data_parts(["123", "urgent"])
            .build()
            .await
            .unwrap();

        assert_eq!(raw, "sc:btn:ticket-close:123:urgent");
    }

    #[tokio::test]
    async fn callback_id_registers_entry() {
        let ids = factory();
        let raw = ids
            .callback(ComponentKind::Button)
            .on_interact(noop())
            .with_data("user:456")
            .with_context("page", 2_u32)
            .disable_on_expire(10, 20)
            .build()
            .await
            .unwrap();

        let id = ComponentId::parse(&raw);
        assert_eq!(id.routing(), RoutingKind::Callback);
        assert_eq!(id.payload(), Some("user:456"));

        let entry = ids.store.get(id.identity()).await.unwrap();
        assert_eq!(entry.ttl(), Duration::from_secs(900));
        assert_eq!(entry.max_invocations(), 0);
        assert_eq!(entry.location(), MessageLocation::new(10, 20));
        assert_eq!(entry.attributes().get::<u32>("page"), Some(&2));
    }

    #[tokio::test]
    async fn modal_callbacks_are_single_use_without_location() {
        let ids = factory();
        let raw = ids
            .callback(ComponentKind::Modal)
            .on_interact(noop())
            .disable_on_expire(10, 20)
            .build()
            .await
            .unwrap();

        let entry = ids.store.get(ComponentId::parse(&raw).identity()).await.unwrap();
        assert_eq!(entry.max_invocations(), 1);
        assert_eq!(entry.location(), None);
    }

    #[tokio::test]
    async fn oversized_payload_fails_before_registering() {
        let ids = factory();
        let err = ids
            .callback(ComponentKind::Button)
            .on_interact(noop())
            .with_data("x".repeat(100))
            .build()
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Id(IdError::LimitExceeded { .. })));
        ids.store.run_pending_tasks().await;
        assert_eq!(ids.store.size(), 0);
        assert_eq!(ids.store.stats().registered, 0);
    }

    #[tokio::test]
    async fn needs_callback_or_id() {
        let err = factory()
            .component(ComponentKind::Button)
            .with_data("1")
            .build()
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::InvalidComponent(_)));
    }
}
