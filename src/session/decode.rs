/// Which asynchronous decode a ticket belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DecodeKind {
    /// Product photo.
    Product,
    /// Uploaded design.
    Design,
}

/// Handle for one in-flight decode.
///
/// A ticket is current until another decode of the same kind is started; completing a ticket that
/// is no longer current has no effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DecodeTicket {
    kind: DecodeKind,
    generation: u64,
}

impl DecodeTicket {
    /// Kind of decode.
    pub fn kind(&self) -> DecodeKind {
        self.kind
    }

    /// Generation the ticket was issued at.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Result of completing a decode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// The decoded image was applied and the frame rebuilt.
    Applied,
    /// A newer decode of the same kind superseded this one; nothing changed.
    Stale,
    /// Decoding failed; the previous state and frame were kept.
    Failed(String),
}

impl DecodeOutcome {
    /// `true` for [`DecodeOutcome::Applied`].
    pub fn is_applied(&self) -> bool {
        matches!(self, DecodeOutcome::Applied)
    }
}

/// Per-kind generation counters.
#[derive(Clone, Debug, Default)]
pub(crate) struct DecodeGuard {
    product: u64,
    design: u64,
}

impl DecodeGuard {
    /// Start a decode of `kind`, superseding any earlier one of that kind.
    pub(crate) fn issue(&mut self, kind: DecodeKind) -> DecodeTicket {
        let slot = self.slot_mut(kind);
        *slot += 1;
        DecodeTicket {
            kind,
            generation: *slot,
        }
    }

    pub(crate) fn is_current(&self, ticket: DecodeTicket) -> bool {
        let current = match ticket.kind {
            DecodeKind::Product => self.product,
            DecodeKind::Design => self.design,
        };
        ticket.generation == current
    }

    fn slot_mut(&mut self, kind: DecodeKind) -> &mut u64 {
        match kind {
            DecodeKind::Product => &mut self.product,
            DecodeKind::Design => &mut self.design,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/decode.rs"]
mod tests;
