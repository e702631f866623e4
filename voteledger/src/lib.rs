#[macro_use]
extern crate serde;

mod audit;
mod cast;
mod election;
mod encoding;
mod error;
mod ledger;
mod receipt;
mod store;
mod verify;
mod vote;

pub use audit::*;
pub use cast::*;
pub use election::*;
pub use encoding::*;
pub use error::*;
pub use ledger::*;
pub use receipt::*;
pub use store::*;
pub use verify::*;
pub use vote::*;
