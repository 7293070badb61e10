//! src/router/interaction_router.rs
//! ============================================================================
//! # InteractionRouter: decode, classify, dispatch, respond
//!
//! Entry point for every inbound component interaction. Callback ids resolve
//! through the [`CallbackStore`], stateless ids through the
//! [`HandlerRegistry`]. Handler failures and panics stay inside the dispatch;
//! the only visible effects are the handler's own and an optional ephemeral
//! notice.

use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use compact_str::CompactString;
use futures::FutureExt;
use tracing::{debug, error, instrument, warn};

use component_id::{ComponentId, RoutingKind};

use super::outcome::{DispatchOutcome, RouterStats};
use crate::{
    callback::{context::CallbackContext, entry::CallbackFuture, store::CallbackStore},
    config::ComponentConfig,
    error::CoreError,
    event::SharedEvent,
    handler::{extract::HandlerArgs, registry::HandlerRegistry},
};

pub struct InteractionRouter {
    store: CallbackStore,
    registry: Arc<HandlerRegistry>,
    enabled: bool,
    expired_message: String,
    unknown_message: String,
    error_message: String,
    stats: RouterStats,
}

impl InteractionRouter {
    pub fn new(config: &ComponentConfig, store: CallbackStore, registry: Arc<HandlerRegistry>) -> Self {
        Self {
            store,
            registry,
            enabled: config.enabled,
            expired_message: config.callback.expired_message.clone(),
            unknown_message: config.handler.unknown_message.clone(),
            error_message: config.handler.error_message.clone(),
            stats: RouterStats::default(),
        }
    }

    pub fn store(&self) -> &CallbackStore {
        &self.store
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    pub fn stats(&self) -> &RouterStats {
        &self.stats
    }

    /// Route one interaction event. Never fails; every path ends in an outcome.
    #[instrument(skip(self, event), fields(component_id = %event.component_id()))]
    pub async fn dispatch(&self, event: SharedEvent) -> DispatchOutcome {
        let outcome = self.route(event).await;
        self.stats.record(outcome);

        debug!(
            marker = "ROUTER",
            operation_type = "dispatch_complete",
            outcome = %outcome,
            "Dispatch finished"
        );

        outcome
    }

    async fn route(&self, event: SharedEvent) -> DispatchOutcome {
        if !self.enabled {
            return DispatchOutcome::IgnoredForeign;
        }

        let id = ComponentId::parse(event.component_id());
        if !id.is_valid() {
            debug!("Ignoring component id not produced by this library");
            return DispatchOutcome::IgnoredForeign;
        }

        match id.routing() {
            RoutingKind::Callback => self.dispatch_callback(event, id).await,
            RoutingKind::Stateless => self.dispatch_handler(event, id).await,
            RoutingKind::Unknown => DispatchOutcome::IgnoredForeign,
        }
    }

    async fn dispatch_callback(&self, event: SharedEvent, id: ComponentId) -> DispatchOutcome {
        let Some(entry) = self.store.get(id.identity()).await else {
            debug!(callback_id = id.identity(), "Callback expired or unknown");
            self.notify(&event, &self.expired_message).await;
            return DispatchOutcome::ExpiredCallback;
        };

        let handler: CompactString = id.identity().into();
        let callback = Arc::clone(entry.callback());
        let context = CallbackContext::new(id, entry, self.store.clone());
        let target = Arc::clone(&event);

        let result = Self::guarded(&handler, move || callback(target, context)).await;
        self.finish(&event, result, DispatchOutcome::HandledByCallback).await
    }

    async fn dispatch_handler(&self, event: SharedEvent, id: ComponentId) -> DispatchOutcome {
        let Some(binding) = self.registry.find_handler(&id) else {
            debug!(kind = ?id.kind(), identity = id.identity(), "No handler found");
            self.notify(&event, &self.unknown_message).await;
            return DispatchOutcome::UnknownHandler;
        };

        let handler = binding.handler_name();
        let data = binding.extract_data(&id);

        let args = match HandlerArgs::extract(binding.params(), data.as_deref()) {
            Ok(args) => args,
            Err(e) => {
                let result = Err(CoreError::handler_failed(handler, e.to_string()));
                return self.finish(&event, result, DispatchOutcome::HandledByHandler).await;
            }
        };

        let target = Arc::clone(&event);
        let result = Self::guarded(&handler, move || binding.invoke(target, args)).await;
        self.finish(&event, result, DispatchOutcome::HandledByHandler).await
    }

    /// Run a handler body, turning returned errors and panics into `CoreError`.
    async fn guarded<F>(handler: &str, body: F) -> Result<(), CoreError>
    where
        F: FnOnce() -> CallbackFuture + Send,
    {
        match AssertUnwindSafe(async move { body().await }).catch_unwind().await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(CoreError::handler_failed(handler, format!("{e:#}"))),
            Err(panic) => Err(CoreError::handler_failed(
                handler,
                format!("panicked: {}", panic_message(panic.as_ref())),
            )),
        }
    }

    async fn finish(
        &self,
        event: &SharedEvent,
        result: Result<(), CoreError>,
        handled: DispatchOutcome,
    ) -> DispatchOutcome {
        let Err(e) = result else {
            return handled;
        };

        error!(
            marker = "ROUTER",
            operation_type = "handler_failed",
            error = %e,
            "Error handling component interaction"
        );

        if !event.is_acknowledged() {
            self.notify(event, &self.error_message).await;
        }

        DispatchOutcome::HandlerError
    }

    async fn notify(&self, event: &SharedEvent, message: &str) {
        if message.is_empty() {
            return;
        }

        if let Err(e) = event.reply_ephemeral(message).await {
            warn!(error = %e, "Failed to send ephemeral notice");
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}

impl std::fmt::Debug for InteractionRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionRouter")
            .field("enabled", &self.enabled)
            .field("store", &self.store)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
