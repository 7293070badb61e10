//! # interact-core - routing for interactive message components
//!
//! Buttons, select menus and modals carry a compact id (see the
//! `component-id` crate). This crate resolves an interaction to either an
//! ephemeral callback held in the [`CallbackStore`] or a durable handler in
//! the [`HandlerRegistry`], and runs it through the [`InteractionRouter`].

pub mod error;

pub mod config;

pub mod logging;
pub use logging::Logger;

pub mod event;
pub use event::{ComponentDisabler, InteractionEvent, MessageLocation, SharedEvent};

pub mod callback {
    pub mod context;
    pub use context::CallbackContext;

    pub mod entry;
    pub use entry::{Attributes, CallbackEntry, ComponentCallback, callback_fn};

    pub mod store;
    pub use store::{CallbackStore, EvictionCause};
}

pub mod handler {
    pub mod binding;
    pub use binding::{HandlerBinding, HandlerSource, HandlerSpec, HandlerTarget, handler_fn};

    pub mod extract;
    pub use extract::{DataSpec, DataValue, HandlerArgs, ParamSpec, ValueType};

    pub mod registry;
    pub use registry::HandlerRegistry;
}

pub mod router {
    pub mod interaction_router;
    pub use interaction_router::InteractionRouter;

    pub mod outcome;
    pub use outcome::{DispatchOutcome, RouterStats};
}

pub mod builder;
pub use builder::IdFactory;

#[cfg(test)]
pub(crate) mod testing;

pub use callback::CallbackStore;
pub use component_id::{ComponentId, ComponentKind, RoutingKind};
pub use error::{CoreError, CoreResult, DisableError};
pub use handler::HandlerRegistry;
pub use router::{DispatchOutcome, InteractionRouter};

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        callback::{CallbackEntry, callback_fn},
        config::ComponentConfig,
        handler::{DataSpec, HandlerSpec, HandlerTarget, handler_fn},
        testing::RecordingEvent,
    };

    // Register, encode, decode, resolve once, remove.
    #[tokio::test]
    async fn callback_lifecycle_end_to_end() {
        let store = CallbackStore::new(ComponentConfig::default().callback);
        let id = store
            .register(CallbackEntry::new(
                callback_fn(|_event, _context| async { Ok(()) }),
                Duration::from_secs(300),
            ))
            .await;

        let raw = ComponentId::callback(ComponentKind::Button, &id, None)
            .encode()
            .unwrap();
        let decoded = ComponentId::parse(&raw);

        assert!(decoded.is_callback());
        assert_eq!(decoded.identity(), id.as_str());
        assert!(store.get(decoded.identity()).await.is_some());
        assert!(store.remove(decoded.identity()).await);
        assert!(store.get(decoded.identity()).await.is_none());
    }

    #[tokio::test]
    async fn factory_built_ids_route_to_their_handlers() {
        let config = ComponentConfig::default();
        let store = CallbackStore::new(config.callback.clone());
        let registry = std::sync::Arc::new(HandlerRegistry::new());
        registry.register(
            HandlerSpec::new(
                HandlerTarget::Button,
                "ticket-",
                handler_fn(|event, args| async move {
                    event
                        .reply_ephemeral(args.str(0).unwrap_or_default())
                        .await
                }),
            )
            .pattern()
            .param(DataSpec::whole()),
        );
        let router = InteractionRouter::new(&config, store.clone(), registry);
        let ids = IdFactory::new(store);

        let stateless = ids
            .stateless(ComponentKind::Button, "ticket-close")
            .with_data("123")
            .build()
            .await
            .unwrap();
        let event = RecordingEvent::new(stateless);
        assert_eq!(router.dispatch(event.shared()).await, DispatchOutcome::HandledByHandler);
        assert_eq!(event.replies(), vec!["close:123".to_string()]);

        let single_use = ids
            .callback(ComponentKind::Modal)
            .on_interact(callback_fn(|event, context| async move {
                event.reply_ephemeral(context.callback_id()).await
            }))
            .build()
            .await
            .unwrap();
        let first = RecordingEvent::new(single_use.as_str());
        let second = RecordingEvent::new(single_use.as_str());

        assert_eq!(router.dispatch(first.shared()).await, DispatchOutcome::HandledByCallback);
        assert_eq!(router.dispatch(second.shared()).await, DispatchOutcome::ExpiredCallback);
        assert_eq!(first.replies(), vec![ComponentId::parse(&single_use).identity().to_string()]);
    }
}
