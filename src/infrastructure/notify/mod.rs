//! Alert delivery infrastructure.

pub mod dispatcher;
pub mod log_channel;
pub mod webhook;

pub use dispatcher::NotificationDispatcher;
pub use log_channel::LogChannel;
pub use webhook::WebhookChannel;
