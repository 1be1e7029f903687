//! Tint SDK - Script parsing and standard output templates.
//!
//! Provides the script type, opcode definitions, script chunk parsing, and
//! the standard locking-script templates (P2PK, P2PKH, P2SH, bare multisig,
//! null-data) used by the transaction builder for signing dispatch and size
//! estimation.

pub mod chunk;
pub mod opcodes;
pub mod script;
pub mod template;

mod error;
pub use chunk::ScriptChunk;
pub use error::ScriptError;
pub use script::Script;
pub use template::ScriptTemplate;
