//! Latched interrupt request lines.

/// Interrupt kinds serviced by the CPU.
///
/// Fixed vectors: NMI at $FFFA/B, RESET at $FFFC/D, IRQ/BRK at $FFFE/F.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    Irq,
    Nmi,
    Reset,
}

/// Pending interrupt request latches.
///
/// Producers call `request`; the CPU polls `get` before each instruction
/// fetch and calls `service` once a line has been handled. Requests are
/// idempotent per kind, and at most one kind is serviced per CPU step.
#[derive(Debug, Default, Clone)]
pub struct InterruptLines {
    irq: bool,
    nmi: bool,
    reset: bool,
}

impl InterruptLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a line pending.
    pub fn request(&mut self, kind: Interrupt) {
        match kind {
            Interrupt::Irq => self.irq = true,
            Interrupt::Nmi => self.nmi = true,
            Interrupt::Reset => self.reset = true,
        }
    }

    /// Clear a line once serviced.
    pub fn service(&mut self, kind: Interrupt) {
        match kind {
            Interrupt::Irq => self.irq = false,
            Interrupt::Nmi => self.nmi = false,
            Interrupt::Reset => self.reset = false,
        }
    }

    /// The highest-priority pending line: RESET > NMI > IRQ.
    pub fn get(&self) -> Option<Interrupt> {
        if self.reset {
            Some(Interrupt::Reset)
        } else if self.nmi {
            Some(Interrupt::Nmi)
        } else if self.irq {
            Some(Interrupt::Irq)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_lines_have_nothing_pending() {
        assert_eq!(InterruptLines::new().get(), None);
    }

    #[test]
    fn test_priority_reset_over_nmi_over_irq() {
        let mut lines = InterruptLines::new();
        lines.request(Interrupt::Irq);
        assert_eq!(lines.get(), Some(Interrupt::Irq));

        lines.request(Interrupt::Nmi);
        assert_eq!(lines.get(), Some(Interrupt::Nmi));

        lines.request(Interrupt::Reset);
        assert_eq!(lines.get(), Some(Interrupt::Reset));
    }

    #[test]
    fn test_service_clears_only_that_kind() {
        let mut lines = InterruptLines::new();
        lines.request(Interrupt::Nmi);
        lines.request(Interrupt::Irq);

        lines.service(Interrupt::Nmi);
        assert_eq!(lines.get(), Some(Interrupt::Irq));

        lines.service(Interrupt::Irq);
        assert_eq!(lines.get(), None);
    }

    #[test]
    fn test_request_is_idempotent() {
        let mut lines = InterruptLines::new();
        lines.request(Interrupt::Irq);
        lines.request(Interrupt::Irq);

        lines.service(Interrupt::Irq);
        assert_eq!(lines.get(), None);
    }
}
