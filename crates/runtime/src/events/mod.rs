//! Stage notifications: event types, the bus contract and its in-process
//! implementation.

mod bus;
mod recorder;
mod registry;
mod types;

pub use bus::{NotificationBus, NotificationError, ScopeGuard, SilentBus};
pub use recorder::EventRecorder;
pub use registry::{EventRegistry, StageListener, Subscription};
pub use types::{EventKind, EventScope, StageEvent, Verdict};
