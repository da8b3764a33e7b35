//! URL location capability.
//!
//! The core never touches browser history directly. It asks the shell to
//! replace the current location; the shell must not push a new history
//! entry, so back/forward skips intermediate region edits.

use crux_core::capability::{CapabilityContext, Operation};
use crux_core::macros::Capability;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationOperation {
    Replace { path: String },
}

impl LocationOperation {
    pub fn path(&self) -> &str {
        match self {
            LocationOperation::Replace { path } => path,
        }
    }
}

impl Operation for LocationOperation {
    type Output = ();
}

#[derive(Capability)]
pub struct Location<Ev> {
    context: CapabilityContext<LocationOperation, Ev>,
}

impl<Ev> Location<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<LocationOperation, Ev>) -> Self {
        Self { context }
    }

    /// Replace the current location with `path` without adding a history
    /// entry.
    pub fn replace(&self, path: impl Into<String>) {
        let ctx = self.context.clone();
        let operation = LocationOperation::Replace { path: path.into() };
        self.context.spawn(async move {
            ctx.notify_shell(operation).await;
        });
    }
}
