//! Host-visible register banks and DMA stream windows.
//!
//! Components hand their registers to the [`CsrManager`] as named groups with
//! application-wide unique IDs. The manager lays the groups out end to end in
//! the CSR word space, generates the address decoder behind the bus bridge's
//! CSR interface and reports each group's address range. The
//! [`StreamManager`] does the same for DMA stream endpoints, one fixed-size
//! window each.

#![warn(missing_docs)]

pub mod csr;
pub mod error;
pub mod register;
pub mod stream;
pub mod symtab;

pub use csr::{CsrBus, CsrManager, GroupAllocation, RegisterGroup, MASTER_NAME};
pub use error::BankError;
pub use register::{prefixed, Register, RegisterKind};
pub use stream::{StreamActor, StreamDirection, StreamEndpoint, StreamManager, STREAM_FIELD};
pub use symtab::{format_symtab, SymbolEntry, SymbolKind};
