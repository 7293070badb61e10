//! src/main.rs
//! Console host for the interaction router: prints a few demo component ids,
//! then dispatches every raw id read from stdin and reports the outcome.

use std::{
    any::Any,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use interact_core::{
    CallbackStore, ComponentDisabler, ComponentKind, DisableError, HandlerRegistry, IdFactory,
    InteractionEvent, InteractionRouter, Logger, MessageLocation,
    callback::callback_fn,
    config::Config,
    handler::{DataSpec, HandlerSource, HandlerSpec, HandlerTarget, handler_fn},
};

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> Result<()> {
    let config = Config::load().await.context("Failed to load configuration")?;
    Logger::init_tracing(&config.logging).context("Failed to initialize logging")?;

    let store = CallbackStore::with_disabler(
        config.components.callback.clone(),
        Arc::new(ConsoleDisabler),
    );
    let registry = Arc::new(HandlerRegistry::new());
    registry.register_handlers(Arc::new(TicketHandlers));

    let router = InteractionRouter::new(&config.components, store.clone(), Arc::clone(&registry));
    let ids = IdFactory::new(store.clone());

    print_demo_ids(&ids).await?;
    info!(handlers = registry.handler_count(), "Interaction router ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let raw = line.trim();
        if raw.is_empty() {
            continue;
        }

        let event = Arc::new(ConsoleEvent::new(raw));
        let outcome = router.dispatch(event).await;
        println!("=> {outcome}");
    }

    store.run_pending_tasks().await;
    info!(
        dispatched = router.stats().total(),
        live_callbacks = store.size(),
        "Input closed, shutting down"
    );
    Ok(())
}

async fn print_demo_ids(ids: &IdFactory) -> Result<()> {
    let close = ids
        .stateless(ComponentKind::Button, "ticket-close")
        .with_data("123")
        .build()
        .await?;

    let once = ids
        .callback(ComponentKind::Button)
        .on_interact(callback_fn(|event, context| async move {
            let greeting = context.attribute_or("greeting", &"hello");
            event.reply_ephemeral(&format!("{greeting} from a single-use button")).await
        }))
        .with_context("greeting", "hi")
        .max_invocations(1)
        .expire_after(Duration::from_secs(120))
        .disable_on_expire(1, 1)
        .build()
        .await?;

    let counter = ids
        .callback(ComponentKind::Button)
        .on_interact(callback_fn(|event, context| async move {
            let left = context
                .remaining_invocations()
                .map_or_else(|| "unbounded".to_string(), |n| n.to_string());
            event.reply_ephemeral(&format!("clicked, {left} clicks left")).await
        }))
        .max_invocations(3)
        .build()
        .await?;

    println!("Paste any of these ids (or your own) and press enter:");
    for raw in [close, once, counter] {
        println!("  {raw}");
    }
    Ok(())
}

/// Stateless demo handlers.
struct TicketHandlers;

impl HandlerSource for TicketHandlers {
    fn source_name(&self) -> &str {
        "TicketHandlers"
    }

    fn handlers(self: Arc<Self>) -> Vec<HandlerSpec> {
        vec![
            HandlerSpec::new(
                HandlerTarget::Button,
                "ticket-",
                handler_fn(|event, args| async move {
                    let action = args.str(0).unwrap_or("?");
                    let ticket = args.long(1);
                    event
                        .reply_ephemeral(&format!("ticket action '{action}' on {ticket:?}"))
                        .await
                }),
            )
            .pattern()
            .named("on_ticket")
            .param(DataSpec::segment(0))
            .param(DataSpec::segment(1).as_long()),
            HandlerSpec::new(
                HandlerTarget::SelectMenu,
                "ticket-priority",
                handler_fn(|event, args| async move {
                    let priority = args.str(0).unwrap_or("normal");
                    event.reply_ephemeral(&format!("priority set to {priority}")).await
                }),
            )
            .named("on_priority")
            .param(DataSpec::whole().default_value("normal")),
        ]
    }
}

#[derive(Debug)]
struct ConsoleEvent {
    component_id: String,
    acknowledged: AtomicBool,
}

impl ConsoleEvent {
    fn new(raw: &str) -> Self {
        Self {
            component_id: raw.to_string(),
            acknowledged: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl InteractionEvent for ConsoleEvent {
    fn component_id(&self) -> &str {
        &self.component_id
    }

    fn is_acknowledged(&self) -> bool {
        self.acknowledged.load(Ordering::Acquire)
    }

    async fn reply_ephemeral(&self, content: &str) -> Result<()> {
        self.acknowledged.store(true, Ordering::Release);
        println!("[ephemeral] {content}");
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Stands in for the gateway call that edits a message's components.
struct ConsoleDisabler;

#[async_trait]
impl ComponentDisabler for ConsoleDisabler {
    async fn disable_at(&self, location: MessageLocation) -> Result<(), DisableError> {
        warn!(%location, "Disabling components (console host has no real messages)");
        Ok(())
    }
}
