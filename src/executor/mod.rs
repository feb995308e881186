//! External command execution: host-shell delegation and the internal
//! PATH-resolving executor (§4.5).

mod external;

pub use external::{execute, spawn_background};
