//! Gateway event handlers.
//!
//! The [`Dispatcher`] receives decoded gateway events and routes them to the
//! message and member handlers. Handler errors are logged and counted here;
//! they never reach the gateway connection.

mod commands;
mod member;
mod message;

pub use commands::{Command, MAX_MESSAGE_LEN, parse_user_ref, split_message};
pub use member::handle_member_add;
pub use message::handle_message;

use async_trait::async_trait;
use floodgate_proto::Event;
use std::sync::Arc;

use crate::error::HandlerError;
use crate::network::EventSink;
use crate::state::BotState;

/// Everything a handler needs.
#[derive(Clone)]
pub struct Context {
    pub state: Arc<BotState>,
}

/// Routes gateway events to handlers.
#[derive(Clone)]
pub struct Dispatcher {
    ctx: Context,
}

impl Dispatcher {
    pub fn new(state: Arc<BotState>) -> Self {
        Self {
            ctx: Context { state },
        }
    }

    /// Handle one event to completion.
    pub async fn handle(&self, event: Event) {
        let name = event.name().to_string();
        let result = match event {
            Event::Ready(ready) => {
                tracing::info!(user = %ready.user.id, username = %ready.user.username, "Gateway session ready");
                self.ctx.state.set_bot_user(ready.user.id);
                Ok(())
            }
            Event::MessageCreate(msg) => handle_message(&self.ctx, &msg).await,
            Event::MemberAdd(evt) => handle_member_add(&self.ctx, &evt).await,
            Event::Other(_) => Ok(()),
        };

        if let Err(e) = result {
            report(&name, &e);
        }
    }
}

fn report(event: &str, error: &HandlerError) {
    crate::metrics::record_handler_error(event, error.error_code());
    tracing::warn!(event, code = error.error_code(), error = %error, "Event handler failed");
}

#[async_trait]
impl EventSink for Dispatcher {
    async fn dispatch(&self, event: Event) {
        self.handle(event).await;
    }
}
