//! Funding input selection.
//!
//! [`FundingSelector`] asks the ledger for unspent outputs covering a spend
//! and turns them into transaction inputs plus a change amount. The
//! ledger's answer is re-checked locally: a selection that does not cover
//! the requirement is [`Error::InsufficientFunds`], whatever the node says.
//!
//! [`select_from_candidates`] is the node-side half, used by
//! [`crate::ledger::MemoryLedger`] to answer UTXO queries.

use tracing::debug;

use crate::error::{Error, Result};
use crate::ledger::{LedgerRpc, UtxoQuery};
use crate::transaction::{TxInput, TxOutput, Utxo};

/// Different strategies for input selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputSelectionStrategy {
    /// Selects unspent outputs with highest value first
    #[default]
    HighestValueFirst,
    /// Selects unspent outputs with lowest value first
    LowestValueFirst,
    /// Selects unspent outputs in the order the ledger holds them
    OldestFirst,
}

impl InputSelectionStrategy {
    fn order(self, candidates: &mut [Utxo]) {
        match self {
            InputSelectionStrategy::HighestValueFirst => {
                candidates.sort_by(|a, b| b.amount.cmp(&a.amount))
            }
            InputSelectionStrategy::LowestValueFirst => {
                candidates.sort_by(|a, b| a.amount.cmp(&b.amount))
            }
            InputSelectionStrategy::OldestFirst => {}
        }
    }
}

/// Picks candidates, in strategy order, until `required` is covered.
pub fn select_from_candidates(
    mut candidates: Vec<Utxo>,
    required: u64,
    strategy: InputSelectionStrategy,
) -> Result<Vec<Utxo>> {
    strategy.order(&mut candidates);

    let mut selected = Vec::new();
    let mut total: u64 = 0;
    for utxo in candidates {
        if total >= required {
            break;
        }
        total = total.saturating_add(utxo.amount);
        selected.push(utxo);
    }

    if total < required {
        return Err(Error::InsufficientFunds {
            required,
            available: total,
        });
    }
    Ok(selected)
}

/// Inputs chosen to fund a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FundingSelection {
    pub inputs: Vec<TxInput>,
    /// Sum of `inputs`.
    pub total: u64,
    /// `total - required`; returned to the spender.
    pub change: u64,
}

impl FundingSelection {
    /// The change output for `spender`, or `None` when the inputs match the
    /// requirement exactly.
    pub fn change_output(&self, spender: &str) -> Option<TxOutput> {
        (self.change > 0).then(|| TxOutput::new(spender, self.change))
    }
}

/// Funding queries against one chain.
pub struct FundingSelector<'a> {
    ledger: &'a dyn LedgerRpc,
    bcname: &'a str,
}

impl<'a> FundingSelector<'a> {
    pub fn new(ledger: &'a dyn LedgerRpc, bcname: &'a str) -> Self {
        Self { ledger, bcname }
    }

    /// Selects inputs owned by `spender` covering `required`.
    ///
    /// A zero requirement selects nothing and makes no ledger call.
    pub async fn select_inputs(&self, spender: &str, required: u64) -> Result<FundingSelection> {
        if required == 0 {
            return Ok(FundingSelection::default());
        }

        let selection = self
            .ledger
            .select_utxo(UtxoQuery {
                bcname: self.bcname.to_string(),
                address: spender.to_string(),
                total_amount: required,
            })
            .await?;

        let inputs: Vec<TxInput> = selection.utxos.iter().map(Utxo::to_input).collect();
        let total = inputs
            .iter()
            .try_fold(0u64, |acc, input| acc.checked_add(input.amount))
            .ok_or_else(|| Error::Serialization("selected amounts overflow u64".to_string()))?;
        if total < required {
            return Err(Error::InsufficientFunds {
                required,
                available: total,
            });
        }

        debug!(
            spender,
            required,
            total,
            inputs = inputs.len(),
            "selected funding inputs"
        );
        Ok(FundingSelection {
            inputs,
            total,
            change: total - required,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ledger::MemoryLedger;

    fn utxo(tag: u8, amount: u64) -> Utxo {
        Utxo {
            ref_txid: vec![tag; 32],
            ref_offset: 0,
            to_addr: "alice".into(),
            amount,
        }
    }

    #[test]
    fn highest_value_first_uses_fewest_inputs() {
        let picked = select_from_candidates(
            vec![utxo(1, 10), utxo(2, 50), utxo(3, 30)],
            60,
            InputSelectionStrategy::HighestValueFirst,
        )
        .unwrap();
        let amounts: Vec<u64> = picked.iter().map(|u| u.amount).collect();
        assert_eq!(amounts, vec![50, 30]);
    }

    #[test]
    fn lowest_value_first_consumes_dust() {
        let picked = select_from_candidates(
            vec![utxo(1, 10), utxo(2, 50), utxo(3, 30)],
            35,
            InputSelectionStrategy::LowestValueFirst,
        )
        .unwrap();
        let amounts: Vec<u64> = picked.iter().map(|u| u.amount).collect();
        assert_eq!(amounts, vec![10, 30]);
    }

    #[test]
    fn shortfall_reports_available_total() {
        let err = select_from_candidates(
            vec![utxo(1, 10), utxo(2, 20)],
            100,
            InputSelectionStrategy::OldestFirst,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientFunds {
                required: 100,
                available: 30
            }
        ));
    }

    #[tokio::test]
    async fn exact_cover_has_no_change() {
        let ledger = Arc::new(MemoryLedger::new("xuper"));
        ledger.fund("alice", 70);
        let selector = FundingSelector::new(ledger.as_ref(), "xuper");

        let selection = selector.select_inputs("alice", 70).await.unwrap();
        assert_eq!(selection.total, 70);
        assert_eq!(selection.change, 0);
        assert!(selection.change_output("alice").is_none());
    }

    #[tokio::test]
    async fn surplus_becomes_change_for_spender() {
        let ledger = Arc::new(MemoryLedger::new("xuper"));
        ledger.fund("XC1234567890123456@xuper", 100);
        let selector = FundingSelector::new(ledger.as_ref(), "xuper");

        let selection = selector
            .select_inputs("XC1234567890123456@xuper", 60)
            .await
            .unwrap();
        assert_eq!(selection.change, 40);
        let change = selection.change_output("XC1234567890123456@xuper").unwrap();
        assert_eq!(change.to_addr, "XC1234567890123456@xuper");
        assert_eq!(change.amount, 40);
    }

    #[tokio::test]
    async fn zero_requirement_skips_the_ledger() {
        let ledger = MemoryLedger::new("xuper");
        let selector = FundingSelector::new(&ledger, "xuper");
        let selection = selector.select_inputs("alice", 0).await.unwrap();
        assert!(selection.inputs.is_empty());
        assert_eq!(ledger.call_count("select_utxo"), 0);
    }
}
