/*!

An implementation of the RPL routing protocol's control plane (RFC 6550):
DODAG formation and maintenance, objective-function-driven parent
selection, and DAO/DCO downward-route bookkeeping, all behind a small set
of collaborator traits so the engine has no IPv6 stack, neighbor table,
or timer implementation of its own.

See the `external` module for the seams this crate expects its host to
fill in, and `node::Node` for the entry point.
*/

pub mod config;
pub mod dao_state;
pub mod external;
pub mod handlers;
pub mod lollipop;
pub mod model;
pub mod node;
pub mod of;
pub mod stats;
pub mod wire;

pub use config::Config;
pub use node::{Collaborators, Node};
pub use stats::Stats;
