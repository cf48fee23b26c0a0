//! Core Primitives
//!
//! Leaf utilities with no knowledge of match documents:
//! identity hashing, the wall clock, and the symbol-list parser.

pub mod clock;
pub mod hash;
pub mod symbol;

pub use clock::{Clock, SystemClock, FixedClock};
pub use hash::{IdentityHasher, IdentityHash};
pub use symbol::{Symbol, SymbolError, MAX_SYMBOL_DEPTH, parse_symbol, symbol_set};
