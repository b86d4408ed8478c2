//! Command Processor
//!
//! Executes parsed commands against the plugin manager. Structural changes
//! are persisted after they succeed; a failed save is logged and the command
//! is still acknowledged.

use std::sync::Arc;
use std::time::Duration;

use super::{Command, DurationValue, Response};
use crate::error::{Error, Result};
use crate::plugin::PluginMgr;

/// Outcome of a successful command
struct Applied {
    response: Response,
    persist: bool,
}

impl Applied {
    fn read(response: Response) -> Self {
        Self {
            response,
            persist: false,
        }
    }

    fn changed(response: Response) -> Self {
        Self {
            response,
            persist: true,
        }
    }
}

/// Turns remote command lines into plugin manager operations
#[derive(Debug, Clone)]
pub struct CommandProcessor {
    plugins: Arc<PluginMgr>,
}

impl CommandProcessor {
    pub fn new(plugins: Arc<PluginMgr>) -> Self {
        Self { plugins }
    }

    /// Parse and execute one command line
    pub async fn execute(&self, line: &str) -> Response {
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(e) => {
                tracing::debug!(line, error = %e, "Rejected command");
                return Response::nack(Error::Parse(e));
            }
        };

        match self.apply(command.clone()) {
            Ok(applied) => {
                if applied.persist {
                    self.persist(&command).await;
                }
                applied.response
            }
            Err(e) => {
                tracing::debug!(command = command.name(), error = %e, "Command failed");
                Response::nack(e)
            }
        }
    }

    async fn persist(&self, command: &Command) {
        if let Err(e) = self.plugins.save().await {
            tracing::error!(command = command.name(), error = %e, "Failed to save arrangement");
        }
    }

    fn apply(&self, command: Command) -> Result<Applied> {
        let plugins = &self.plugins;

        let applied = match command {
            Command::Install { type_name } => {
                let info = plugins.install_enabled(&type_name)?;
                Applied::changed(Response::ack().with(info.slot).with(info.uid))
            }
            Command::Uninstall { uid } => {
                plugins.uninstall(uid)?;
                Applied::changed(Response::ack())
            }
            Command::Enable { uid } => {
                plugins.enable(uid)?;
                Applied::changed(Response::ack())
            }
            Command::Disable { uid } => {
                plugins.disable(uid)?;
                Applied::changed(Response::ack())
            }
            Command::Lock { uid } => {
                plugins.lock(uid)?;
                Applied::changed(Response::ack())
            }
            Command::Unlock { uid } => {
                plugins.unlock(uid)?;
                Applied::changed(Response::ack())
            }
            Command::Move { uid, slot, swap } => {
                let slot = plugins.move_plugin(uid, slot, swap)?;
                Applied::changed(Response::ack().with(slot))
            }
            Command::Duration { uid, value: None } => {
                let effective = plugins.duration(uid)?;
                Applied::read(Response::ack().with(millis(effective)))
            }
            Command::Duration {
                uid,
                value: Some(value),
            } => {
                let duration = match value {
                    DurationValue::Default => None,
                    DurationValue::Custom(duration) => Some(duration),
                };
                let effective = plugins.set_duration(uid, duration)?;
                Applied::changed(Response::ack().with(millis(effective)))
            }
            Command::Alias { uid, alias: None } => {
                let alias = plugins.alias(uid)?;
                Applied::read(Response::ack().with_quoted(&alias))
            }
            Command::Alias {
                uid,
                alias: Some(alias),
            } => {
                plugins.set_alias(uid, &alias)?;
                Applied::changed(Response::ack().with_quoted(&alias))
            }
            Command::Activate { slot } => {
                plugins.display().activate_slot(slot)?;
                Applied::read(Response::ack())
            }
            Command::Slots => {
                let slots = plugins.display().slots();
                let mut response = Response::ack().with(slots.len());
                for slot in slots {
                    response = match slot.plugin {
                        Some(info) => response
                            .with_quoted(&info.type_name)
                            .with(info.uid)
                            .with(u8::from(info.enabled))
                            .with(u8::from(info.locked))
                            .with(slot.view_duration_ms),
                        None => response.with_quoted("").with(0).with(0).with(0).with(0),
                    };
                }
                Applied::read(response)
            }
            Command::Plugins => {
                let response = plugins
                    .registry()
                    .type_names()
                    .iter()
                    .fold(Response::ack(), |response, name| response.with_quoted(name));
                Applied::read(response)
            }
            Command::Topics { uid } => {
                let response = plugins
                    .topics(uid)?
                    .iter()
                    .fold(Response::ack(), |response, topic| response.with_quoted(topic));
                Applied::read(response)
            }
            Command::GetTopic { uid, topic } => {
                let value = plugins.get_topic(uid, &topic)?;
                Applied::read(Response::ack().with_quoted(&value.to_string()))
            }
            Command::SetTopic { uid, topic, value } => {
                plugins.set_topic(uid, &topic, &value)?;
                Applied::read(Response::ack())
            }
        };

        Ok(applied)
    }
}

/// Duration in milliseconds for replies, 0 meaning infinite
fn millis(duration: Option<Duration>) -> u128 {
    duration.map_or(0, |d| d.as_millis())
}
