//! Nullable escrow ledger: records commands instead of moving funds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use whistle_escrow::{EscrowCommand, EscrowError, EscrowLedger};

/// Records every dispatched command. Can be switched into a failing mode to
/// exercise ledger outages.
#[derive(Default)]
pub struct NullEscrow {
    commands: Mutex<Vec<EscrowCommand>>,
    failing: AtomicBool,
}

impl NullEscrow {
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger that rejects every command as unavailable.
    pub fn failing() -> Self {
        let escrow = Self::default();
        escrow.set_failing(true);
        escrow
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Commands accepted so far, in dispatch order.
    pub fn commands(&self) -> Vec<EscrowCommand> {
        self.commands
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl EscrowLedger for NullEscrow {
    fn dispatch(&self, command: EscrowCommand) -> Result<(), EscrowError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EscrowError::Unavailable("null-escrow switched off".into()));
        }
        self.commands
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(command);
        Ok(())
    }

    fn name(&self) -> &str {
        "null-escrow"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use whistle_types::{Amount, EvidenceId};

    fn forfeit() -> EscrowCommand {
        EscrowCommand::Forfeit {
            evidence_id: EvidenceId::from_sequence(1),
            amount: Amount::new(25),
        }
    }

    #[test]
    fn records_commands() {
        let escrow = NullEscrow::new();
        escrow.dispatch(forfeit()).unwrap();
        assert_eq!(escrow.commands(), vec![forfeit()]);
    }

    #[test]
    fn failing_mode_rejects() {
        let escrow = NullEscrow::failing();
        assert!(escrow.dispatch(forfeit()).is_err());
        assert!(escrow.commands().is_empty());
        escrow.set_failing(false);
        escrow.dispatch(forfeit()).unwrap();
        assert_eq!(escrow.commands().len(), 1);
    }
}
