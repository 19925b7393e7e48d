//! Trading universe derived from the position ledger.
//!
//! The daily scan evaluates whatever is currently held, so that dead
//! crosses can exit existing positions. When the ledger is empty (fresh
//! start) a fixed target list from configuration seeds the universe.

use async_trait::async_trait;
use tracing::{info, warn};

use super::{DataSourceError, Target, UniverseSource};
use crate::ledger::PositionLedger;

/// Universe source backed by the ledger with a configured fallback.
pub struct LedgerUniverse {
    ledger: PositionLedger,
    fallback: Vec<Target>,
}

impl LedgerUniverse {
    pub fn new(ledger: PositionLedger, fallback: Vec<Target>) -> Self {
        Self { ledger, fallback }
    }
}

#[async_trait]
impl UniverseSource for LedgerUniverse {
    async fn targets(&self) -> Result<Vec<Target>, DataSourceError> {
        let positions = self.ledger.list_positions()?;
        if !positions.is_empty() {
            info!(count = positions.len(), "Universe derived from held positions");
            // No display names in the ledger; the symbol stands in.
            return Ok(positions
                .into_iter()
                .map(|p| Target::new(p.symbol.clone(), p.symbol))
                .collect());
        }

        warn!(
            count = self.fallback.len(),
            "No held positions — using fixed target list"
        );
        Ok(self.fallback.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
