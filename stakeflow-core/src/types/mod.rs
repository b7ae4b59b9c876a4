pub use amount::*;
pub use identifiers::*;
pub use kind::*;
pub use pool::*;

mod amount;
mod identifiers;
mod kind;
mod pool;
