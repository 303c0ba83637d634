use std::fmt;

/// Identifies one in-flight operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct OpId(u64);

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

/// Handed out when an operation starts, presented again when it settles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Ticket {
    pub(crate) id: OpId,
    epoch: u64,
}

/// Ordered record of operations that have been applied speculatively but not
/// settled yet.
///
/// The epoch moves forward whenever the owner adopts authoritative state
/// wholesale (`rebase`). Tickets from an older epoch are stale: their
/// confirmations must not change state any more.
pub(crate) struct Ledger<Op> {
    next_id: u64,
    epoch: u64,
    entries: Vec<(OpId, Op)>,
}

impl<Op> Default for Ledger<Op> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Op> Ledger<Op> {
    pub(crate) fn new() -> Self {
        Ledger {
            next_id: 1,
            epoch: 0,
            entries: Vec::new(),
        }
    }

    /// Record a new in-flight operation.
    pub(crate) fn push(&mut self, op: Op) -> Ticket {
        let id = OpId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, op));
        Ticket {
            id,
            epoch: self.epoch,
        }
    }

    pub(crate) fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.epoch == self.epoch
    }

    /// Remove the operation behind `ticket`. `None` if it was already
    /// abandoned or the ticket is stale.
    pub(crate) fn settle(&mut self, ticket: &Ticket) -> Option<Op> {
        if !self.is_current(ticket) {
            return None;
        }
        let index = self.entries.iter().position(|(id, _)| *id == ticket.id)?;
        Some(self.entries.remove(index).1)
    }

    /// Forget every in-flight operation, keeping the epoch. Their
    /// confirmations still count when they arrive.
    pub(crate) fn abandon_all(&mut self) {
        self.entries.clear();
    }

    /// Forget every in-flight operation and start a new epoch.
    pub(crate) fn rebase(&mut self) {
        self.entries.clear();
        self.epoch += 1;
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Op> {
        self.entries.iter().map(|(_, op)| op)
    }

    /// Operations with their ids, oldest first.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (OpId, &Op)> {
        self.entries.iter().map(|(id, op)| (*id, op))
    }

    pub(crate) fn last(&self) -> Option<(OpId, &Op)> {
        self.entries.last().map(|(id, op)| (*id, op))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
