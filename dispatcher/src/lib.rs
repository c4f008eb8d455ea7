//! # dispatcher
//!
//! Maps each inbound [`bot_core::Update`] to exactly one handler invocation: the chat's active conversation
//! if there is one, otherwise the route bound to the message's command. Errors are returned from
//! [`Dispatcher::handle_update`] and reported to an [`ErrorSink`] by [`Dispatcher::dispatch`].

mod command;
mod context;
mod dispatcher;
mod handler;

pub use command::{parse_command, Command};
pub use context::Context;
pub use dispatcher::{Dispatcher, Route};
pub use handler::{CommandHandler, ErrorSink, TracingErrorSink};
