//! The escrow ledger seam.
//!
//! Resolution instructs the ledger that holds submitter stakes to refund,
//! forfeit, or pay a bounty. Commands are fire-and-forget: the engine's state is
//! already terminal when a command is dispatched, and confirmations come back
//! later as [`EscrowReceipt`]s.

pub mod command;
pub mod error;

pub use command::{EscrowCommand, EscrowCommandKind, EscrowReceipt};
pub use error::EscrowError;

/// Anything that can carry out escrow commands (an on-chain escrow contract, a
/// custodial ledger, a test double).
pub trait EscrowLedger: Send + Sync {
    /// Hand a command to the ledger. Returning `Ok` means the command was
    /// accepted for execution, not that it has settled.
    fn dispatch(&self, command: EscrowCommand) -> Result<(), EscrowError>;

    /// Human-readable name of this ledger.
    fn name(&self) -> &str;
}
