//! Command dispatch
//!
//! Routes verified `COMMAND` payloads to named effectors. The payload's
//! `command` string selects the effector; the whole payload is passed as
//! its arguments. The table starts empty: hosts register the effectors
//! they actually have (motor control, camera, ...).

use std::collections::BTreeMap;

use fieldnode_core::{NodeError, NodeResult, Payload};

/// Payload field naming the effector to invoke
pub const COMMAND_FIELD: &str = "command";

/// An actuator reachable by command
pub trait Effector {
    fn invoke(&mut self, args: &Payload) -> NodeResult<()>;
}

impl<F> Effector for F
where
    F: FnMut(&Payload) -> NodeResult<()>,
{
    fn invoke(&mut self, args: &Payload) -> NodeResult<()> {
        self(args)
    }
}

/// Name-to-effector table
#[derive(Default)]
pub struct CommandDispatcher {
    effectors: BTreeMap<String, Box<dyn Effector>>,
}

impl CommandDispatcher {
    /// Create a dispatcher with no effectors
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an effector under a command name, replacing any previous one
    pub fn register(&mut self, command: impl Into<String>, effector: impl Effector + 'static) {
        let command = command.into();
        tracing::debug!(command = %command, "effector registered");
        self.effectors.insert(command, Box::new(effector));
    }

    pub fn contains(&self, command: &str) -> bool {
        self.effectors.contains_key(command)
    }

    /// Registered command names, sorted
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.effectors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.effectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effectors.is_empty()
    }

    /// Look up the payload's command and invoke its effector
    ///
    /// Returns the command name on success. A payload without a string
    /// `command` field is a protocol error; an unregistered name is
    /// `UnknownCommand`. Effector failures come back as `Effector`.
    pub fn dispatch(&mut self, payload: &Payload) -> NodeResult<String> {
        let command = payload
            .get_str(COMMAND_FIELD)
            .ok_or_else(|| NodeError::Protocol(format!("COMMAND payload has no '{}' string", COMMAND_FIELD)))?;

        let effector = self
            .effectors
            .get_mut(command)
            .ok_or_else(|| NodeError::UnknownCommand(command.to_string()))?;

        match effector.invoke(payload) {
            Ok(()) => Ok(command.to_string()),
            Err(err @ NodeError::Effector { .. }) => Err(err),
            Err(err) => Err(NodeError::Effector {
                command: command.to_string(),
                reason: err.to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("commands", &self.effectors.keys().collect::<Vec<_>>())
            .finish()
    }
}
