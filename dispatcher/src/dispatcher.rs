//! [`Dispatcher`]: routes each update to the chat's active conversation or to a command route.

use std::collections::HashMap;
use std::sync::Arc;

use bot_api::ApiClient;
use bot_core::{Result, Update};
use conversations::ConversationRuntime;
use tracing::{debug, info, instrument};

use crate::command::parse_command;
use crate::context::Context;
use crate::handler::{CommandHandler, ErrorSink, TracingErrorSink};

/// What a command is bound to.
#[derive(Clone)]
pub enum Route {
    /// Run a plain handler.
    Command(Arc<dyn CommandHandler>),
    /// Enter the named conversation.
    EnterConversation(String),
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Command(handler) => f
                .debug_tuple("Command")
                .field(&std::any::type_name_of_val(handler.as_ref()))
                .finish(),
            Route::EnterConversation(name) => f.debug_tuple("EnterConversation").field(name).finish(),
        }
    }
}

/// Routes updates: active conversation first, then commands; anything else is ignored.
#[derive(Clone)]
pub struct Dispatcher {
    api: ApiClient,
    conversations: ConversationRuntime,
    routes: HashMap<String, Route>,
    bot_username: Option<String>,
    error_sink: Arc<dyn ErrorSink>,
}

impl Dispatcher {
    pub fn new(api: ApiClient, conversations: ConversationRuntime) -> Self {
        Self {
            api,
            conversations,
            routes: HashMap::new(),
            bot_username: None,
            error_sink: Arc::new(TracingErrorSink),
        }
    }

    /// Binds `/name` to a handler. A later binding for the same name wins.
    pub fn command(mut self, name: impl Into<String>, handler: Arc<dyn CommandHandler>) -> Self {
        self.routes.insert(name.into(), Route::Command(handler));
        self
    }

    /// Binds `/name` to entering a registered conversation.
    pub fn conversation_command(
        mut self,
        name: impl Into<String>,
        conversation: impl Into<String>,
    ) -> Self {
        self.routes
            .insert(name.into(), Route::EnterConversation(conversation.into()));
        self
    }

    /// Username used to accept `/cmd@username` and reject commands addressed to other bots.
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    pub fn with_error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.error_sink = sink;
        self
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn conversations(&self) -> &ConversationRuntime {
        &self.conversations
    }

    /// Handles one update and returns the handler's error, if any.
    #[instrument(skip(self, update), fields(update_id = update.update_id))]
    pub async fn handle_update(&self, update: &Update) -> Result<()> {
        info!(
            chat_id = ?update.chat_id(),
            user_id = ?update.from().map(|u| u.id),
            "step: dispatch started"
        );

        if self.conversations.resume(update, &self.api).await? {
            info!("step: dispatch finished, handled by active conversation");
            return Ok(());
        }

        let Some(text) = update.text() else {
            debug!("Update has no message text, ignoring");
            return Ok(());
        };
        let Some(command) = parse_command(text, self.bot_username.as_deref()) else {
            debug!("Message is not a command for this bot, ignoring");
            return Ok(());
        };
        let Some(route) = self.routes.get(&command.name).cloned() else {
            debug!(command = %command.name, "No route for command, ignoring");
            return Ok(());
        };

        info!(command = %command.name, route = ?route, "step: command matched");
        match route {
            Route::Command(handler) => {
                let ctx = Context::new(update.clone(), self.api.clone(), Some(command));
                handler.handle(&ctx).await?;
            }
            Route::EnterConversation(name) => {
                self.conversations.enter(&name, update, &self.api).await?;
            }
        }
        info!("step: dispatch finished");
        Ok(())
    }

    /// Handles one update and reports an error to the sink instead of returning it.
    pub async fn dispatch(&self, update: &Update) {
        if let Err(e) = self.handle_update(update).await {
            self.error_sink.report(update, &e);
        }
    }
}
