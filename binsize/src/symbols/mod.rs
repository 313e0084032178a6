//! # Symbol Table Input
//!
//! Produces the raw symbol listing for the target library and turns it into
//! [`Record`](crate::domain::Record)s.
//!
//! - **`dump`**: runs `nm -C -S` (or opens a pre-dumped listing) and yields lines
//! - **`parser`**: fixed line grammar, skip routing and the ICU data rule
//!
//! ```text
//! 0167b39c 00000018 t ACCESS_DESCRIPTION_free
//! └──┬───┘ └──┬───┘ │ └─────────┬──────────┘
//!  address   size  type        name
//! ```

pub mod dump;
pub mod parser;

pub use dump::{SymbolDump, SymbolSource};
pub use parser::{IcuDataRule, LineRecordParser, ParsedLine};
