//! Strut Core - Component Framework
//!
//! The ownership/registry/lifecycle core: a component base that gives
//! every UI component a globally unique identity, automatic tracking
//! of every resource it acquires, and a deterministic cascading
//! teardown protocol that cooperates across independently-constructed
//! component trees by scanning the live DOM.

mod component;
mod error;
mod messages;
mod registry;
mod runtime;

pub use component::{ComponentCore, FORBIDDEN_ID_PREFIX, Identity, Lifecycle};
pub use error::{ErrorKind, UiError, UiResult, ensure, fail};
pub use messages::{interpolate, register_messages, resolve_template};
pub use registry::Registry;
pub use runtime::Runtime;
