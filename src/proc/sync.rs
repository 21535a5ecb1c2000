/*!
Edge-triggered synchronization rules

A [`SyncRule`] lives outside the combinational decision tree: it carries
the register updates and memory writes a process performs when its trigger
fires. Cleanup only ever scrubs no-op updates out of these rules; their
trigger semantics belong to the host.
*/
use super::Action;
use crate::sig::Sig;
use crate::{debug_from_display, quick_display};

/// The trigger of a synchronization rule
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum SyncKind {
    /// Level-sensitive on logic low
    Low,
    /// Level-sensitive on logic high
    High,
    /// Rising edge
    Posedge,
    /// Falling edge
    Negedge,
    /// Any edge
    Edge,
    /// Always active
    Always,
    /// Initialization time
    Init,
}

quick_display!(SyncKind, k, fmt => match k {
    SyncKind::Low => write!(fmt, "low"),
    SyncKind::High => write!(fmt, "high"),
    SyncKind::Posedge => write!(fmt, "posedge"),
    SyncKind::Negedge => write!(fmt, "negedge"),
    SyncKind::Edge => write!(fmt, "edge"),
    SyncKind::Always => write!(fmt, "always"),
    SyncKind::Init => write!(fmt, "init"),
});

/// A write into a host-owned memory, performed when the owning rule fires
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct MemWrite {
    /// The host-facing name of the memory
    memid: String,
    /// The written address
    address: Sig,
    /// The written data word
    data: Sig,
    /// The per-bit write enable
    enable: Sig,
}

impl MemWrite {
    /// Create a memory write
    pub fn new<S: Into<String>>(memid: S, address: Sig, data: Sig, enable: Sig) -> MemWrite {
        MemWrite {
            memid: memid.into(),
            address,
            data,
            enable,
        }
    }
    /// Get the name of the written memory
    #[inline]
    pub fn memid(&self) -> &str {
        &self.memid
    }
    /// Get the written address
    #[inline]
    pub fn address(&self) -> &Sig {
        &self.address
    }
    /// Get the written data word
    #[inline]
    pub fn data(&self) -> &Sig {
        &self.data
    }
    /// Get the per-bit write enable
    #[inline]
    pub fn enable(&self) -> &Sig {
        &self.enable
    }
}

quick_display!(MemWrite, m, fmt => write!(
    fmt,
    "memwr {} (addr={} data={} en={})",
    m.memid, m.address, m.data, m.enable
));
debug_from_display!(MemWrite);

/// A synchronization rule: a trigger plus the updates it performs
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct SyncRule {
    /// The trigger kind
    kind: SyncKind,
    /// The trigger signal
    signal: Sig,
    /// The register updates performed when the trigger fires
    actions: Vec<Action>,
    /// The memory writes performed when the trigger fires
    mem_writes: Vec<MemWrite>,
}

impl SyncRule {
    /// Create a rule firing on `kind` of `signal`, with no updates yet
    pub fn new(kind: SyncKind, signal: Sig) -> SyncRule {
        SyncRule {
            kind,
            signal,
            actions: Vec::new(),
            mem_writes: Vec::new(),
        }
    }
    /// Get the trigger kind of this rule
    #[inline]
    pub fn kind(&self) -> SyncKind {
        self.kind
    }
    /// Get the trigger signal of this rule
    #[inline]
    pub fn signal(&self) -> &Sig {
        &self.signal
    }
    /// Get the register updates of this rule
    #[inline]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }
    /// Get the memory writes of this rule
    #[inline]
    pub fn mem_writes(&self) -> &[MemWrite] {
        &self.mem_writes
    }
    /// Append a register update to this rule
    pub fn push_action(&mut self, action: Action) {
        self.actions.push(action)
    }
    /// Append a memory write to this rule
    pub fn push_mem_write(&mut self, write: MemWrite) {
        self.mem_writes.push(write)
    }
    /// Whether this rule performs no updates at all
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.mem_writes.is_empty()
    }
    pub(crate) fn actions_mut(&mut self) -> &mut Vec<Action> {
        &mut self.actions
    }
}

quick_display!(SyncRule, s, fmt => write!(fmt, "sync {} {}", s.kind, s.signal));
debug_from_display!(SyncRule);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sig::WireId;

    #[test]
    fn sync_rule_emptiness() {
        let clk = Sig::wire(WireId(0), 1);
        let mut rule = SyncRule::new(SyncKind::Posedge, clk.clone());
        assert!(rule.is_empty());

        rule.push_mem_write(MemWrite::new(
            "$mem",
            Sig::wire(WireId(1), 4),
            Sig::wire(WireId(2), 8),
            Sig::from_const(0xff, 8).unwrap(),
        ));
        assert!(!rule.is_empty());
        assert_eq!(rule.kind(), SyncKind::Posedge);
        assert_eq!(rule.to_string(), "sync posedge { $w0[0] }");
    }
}
