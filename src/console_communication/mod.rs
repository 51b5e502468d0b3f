//! Operator console surface: the HTTP endpoint, the operations behind it and
//! the persisted settings they work on.

mod console_endpoint;
mod console_messenger;
mod precland_messages;
mod settings_store;

pub(crate) use console_endpoint::ConsoleEndpoint;
pub(crate) use console_messenger::ConsoleMessenger;
pub(crate) use settings_store::SettingsStore;

#[cfg(test)]
mod tests;
