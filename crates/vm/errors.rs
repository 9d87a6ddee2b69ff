use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum VmError {
    /// A guest pointer pair failed the bounds check. Always fatal.
    #[error("bad memory: guest pointer out of bounds")]
    BadMemory,

    /// `cb_alloc` returned something other than an i32.
    #[error("cb_alloc returned incorrect type")]
    BadCallbackReturn,

    /// The guest invoked `abort`.
    #[error("guest called abort")]
    Abort,

    /// `eosio_assert_message` failed; carries the guest-supplied message
    /// verbatim.
    #[error("{0}")]
    Assert(String),

    /// Interpreter-raised fault (division by zero, invalid opcode, ...).
    #[error("guest trap: {0}")]
    Trap(String),

    /// The module imported an `env` function the host does not provide.
    #[error("unknown host import: env.{0}")]
    UnknownImport(String),

    /// A host call was invoked with the wrong arity or argument types.
    #[error("{0}")]
    BadArguments(&'static str),

    #[error("failed to read module {path}: {source}")]
    ModuleRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot session failed underneath a `query_database` call.
    #[error("database error: {0}")]
    Database(String),
}
