//! Ranked traversal over the line items of one reconciliation round

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::money::fraction_digit_sum;
use crate::types::*;

/// The three traversal cursors of a [`SelectionSequencer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cursor {
    /// Round-robin over all ranks
    Cyclic,
    /// Walks up from rank 0
    Low,
    /// Walks down from the last rank
    High,
}

impl Cursor {
    /// The cursor walking from the other end
    pub fn opposite(self) -> Self {
        match self {
            Cursor::Low => Cursor::High,
            Cursor::High => Cursor::Low,
            Cursor::Cyclic => Cursor::Cyclic,
        }
    }
}

/// A line item's slot in the ranking
#[derive(Debug, Clone, PartialEq)]
pub struct RankedItem {
    pub rank: usize,
    /// Original position of the line item
    pub index: usize,
    /// Current local-currency value
    pub value: BigDecimal,
}

/// Ordered set of line items with cyclic, low-end and high-end cursors.
///
/// Ranks are unique: items with the same ranking key keep their original index order.
/// The low and high cursors walk towards each other and share one budget of `len` items,
/// so no item is handed out twice between them.
/// Values are addressed by original index so the caller never has to know an item's rank.
#[derive(Debug, Clone)]
pub struct SelectionSequencer {
    /// Sorted by rank; `items[r].rank == r`
    items: Vec<RankedItem>,
    /// `positions[index]` is the rank of the item with that original index
    positions: Vec<usize>,
    current_rank: Option<usize>,
    min_pointer: usize,
    /// One past the next rank handed out by [`next_from_high`](Self::next_from_high)
    max_pointer: usize,
}

impl SelectionSequencer {
    /// Rank `values` (indexed by original position) by `keys`, ascending or descending
    pub fn from_keys(
        values: Vec<BigDecimal>,
        keys: &[u32],
        ascending: bool,
    ) -> ReconcileResult<Self> {
        if values.len() != keys.len() {
            return Err(ReconcileError::InvalidInput(format!(
                "{} ranking keys for {} values",
                keys.len(),
                values.len()
            )));
        }
        Ok(Self::ranked(values, keys, ascending))
    }

    /// Rank local values by the fraction digit-sum of their reference-currency equivalent
    pub fn by_reference_fraction(
        values_local: Vec<BigDecimal>,
        exchange_rate: &BigDecimal,
        ascending: bool,
    ) -> Self {
        let keys: Vec<u32> = values_local
            .iter()
            .map(|value| fraction_digit_sum(&(value / exchange_rate)))
            .collect();
        Self::ranked(values_local, &keys, ascending)
    }

    /// `keys` holds one entry per value
    fn ranked(values: Vec<BigDecimal>, keys: &[u32], ascending: bool) -> Self {
        let mut order: Vec<usize> = (0..values.len()).collect();
        if ascending {
            order.sort_by_key(|&index| keys[index]);
        } else {
            order.sort_by(|&a, &b| keys[b].cmp(&keys[a]));
        }

        let mut positions = vec![0; values.len()];
        for (rank, &index) in order.iter().enumerate() {
            positions[index] = rank;
        }

        let mut slots: Vec<Option<BigDecimal>> = values.into_iter().map(Some).collect();
        let items: Vec<RankedItem> = order
            .iter()
            .enumerate()
            .map(|(rank, &index)| RankedItem {
                rank,
                index,
                value: slots[index].take().unwrap_or_default(),
            })
            .collect();

        let len = items.len();
        Self {
            items,
            positions,
            current_rank: None,
            min_pointer: 0,
            max_pointer: len,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in rank order
    pub fn items(&self) -> &[RankedItem] {
        &self.items
    }

    /// Advance the cyclic cursor, wrapping after the last rank
    pub fn next(&mut self) -> ReconcileResult<&RankedItem> {
        if self.items.is_empty() {
            return Err(self.exhausted(Cursor::Cyclic));
        }
        let rank = match self.current_rank {
            Some(rank) if rank + 1 < self.items.len() => rank + 1,
            _ => 0,
        };
        self.current_rank = Some(rank);
        Ok(&self.items[rank])
    }

    /// Hand out the item at the low pointer and move the pointer up
    pub fn next_from_low(&mut self) -> ReconcileResult<&RankedItem> {
        if self.min_pointer >= self.max_pointer {
            return Err(self.exhausted(Cursor::Low));
        }
        let rank = self.min_pointer;
        self.min_pointer += 1;
        Ok(&self.items[rank])
    }

    /// Hand out the item at the high pointer and move the pointer down
    pub fn next_from_high(&mut self) -> ReconcileResult<&RankedItem> {
        if self.max_pointer <= self.min_pointer {
            return Err(self.exhausted(Cursor::High));
        }
        self.max_pointer -= 1;
        Ok(&self.items[self.max_pointer])
    }

    /// Dispatch to the traversal named by `cursor`
    pub fn next_from(&mut self, cursor: Cursor) -> ReconcileResult<&RankedItem> {
        match cursor {
            Cursor::Cyclic => self.next(),
            Cursor::Low => self.next_from_low(),
            Cursor::High => self.next_from_high(),
        }
    }

    /// Items a cursor can still hand out before it is exhausted.
    ///
    /// The low and high cursors draw from the same range between the pointers.
    pub fn remaining(&self, cursor: Cursor) -> usize {
        match cursor {
            Cursor::Cyclic => self.items.len(),
            Cursor::Low | Cursor::High => self.max_pointer - self.min_pointer,
        }
    }

    /// Original index of the item under the cyclic cursor
    pub fn current_item_index(&self) -> Option<usize> {
        self.current_rank.map(|rank| self.items[rank].index)
    }

    pub fn value_at_index(&self, index: usize) -> ReconcileResult<&BigDecimal> {
        let rank = self.rank_of(index)?;
        Ok(&self.items[rank].value)
    }

    /// Overwrite the value of the item with original index `index`
    pub fn set_value_at_index(&mut self, index: usize, value: BigDecimal) -> ReconcileResult<()> {
        let rank = self.rank_of(index)?;
        self.items[rank].value = value;
        Ok(())
    }

    /// Current values ordered by original index
    pub fn into_values(self) -> Vec<BigDecimal> {
        let mut slots: Vec<Option<BigDecimal>> = vec![None; self.items.len()];
        for item in self.items {
            slots[item.index] = Some(item.value);
        }
        slots.into_iter().map(Option::unwrap_or_default).collect()
    }

    fn rank_of(&self, index: usize) -> ReconcileResult<usize> {
        self.positions
            .get(index)
            .copied()
            .ok_or(ReconcileError::UnknownLineItem(index))
    }

    fn exhausted(&self, cursor: Cursor) -> ReconcileError {
        ReconcileError::ExhaustedSequence {
            cursor,
            len: self.items.len(),
        }
    }
}
