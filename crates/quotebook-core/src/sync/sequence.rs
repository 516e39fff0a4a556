//! Per-class sequence numbers
//!
//! Every remote call that feeds the store takes a `Ticket` before it is
//! issued. When it completes, the ticket is compared with the latest one
//! issued for the same class; an older ticket means a newer call has
//! superseded it and the result is dropped.

use std::fmt;

/// Independent concurrency domains
///
/// List and search share `Catalog` because they write the same view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceClass {
    Catalog,
    Random,
    External,
}

impl fmt::Display for SequenceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceClass::Catalog => write!(f, "catalog"),
            SequenceClass::Random => write!(f, "random"),
            SequenceClass::External => write!(f, "external"),
        }
    }
}

/// Proof of issue for one remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    class: SequenceClass,
    number: u64,
}

impl Ticket {
    pub fn class(&self) -> SequenceClass {
        self.class
    }

    pub fn number(&self) -> u64 {
        self.number
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.class, self.number)
    }
}

/// Latest issued number for each class
#[derive(Debug, Clone, Default)]
pub struct SequenceTracker {
    catalog: u64,
    random: u64,
    external: u64,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next ticket for `class`, superseding all earlier ones
    pub fn issue(&mut self, class: SequenceClass) -> Ticket {
        let slot = self.slot_mut(class);
        *slot += 1;
        Ticket {
            class,
            number: *slot,
        }
    }

    /// Whether no newer ticket has been issued for the ticket's class
    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.number >= self.latest(ticket.class)
    }

    pub fn latest(&self, class: SequenceClass) -> u64 {
        match class {
            SequenceClass::Catalog => self.catalog,
            SequenceClass::Random => self.random,
            SequenceClass::External => self.external,
        }
    }

    fn slot_mut(&mut self, class: SequenceClass) -> &mut u64 {
        match class {
            SequenceClass::Catalog => &mut self.catalog,
            SequenceClass::Random => &mut self.random,
            SequenceClass::External => &mut self.external,
        }
    }
}
