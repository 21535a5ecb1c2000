/*!
The process decision tree

A [`Process`] models one procedural block: a root [`Case`] holding ordered
assignments and nested [`Switch`]es, plus the edge-triggered
[`SyncRule`](sync::SyncRule)s updating state elements. Every node is owned
outright by its parent; the tree has no sharing and no cycles, and
deleting a subtree invalidates nothing else.
*/
use crate::sig::Sig;
use crate::{debug_from_display, quick_display};
use itertools::Itertools;
use smallvec::SmallVec;
use std::fmt::{self, Formatter};

pub mod sync;
pub use self::sync::{MemWrite, SyncKind, SyncRule};

/// A single assignment of a source expression onto a target bit-range
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Action {
    /// The assigned bit-range
    target: Sig,
    /// The driving expression
    source: Sig,
}

impl Action {
    /// Create an assignment of `source` onto `target`
    pub fn new(target: Sig, source: Sig) -> Action {
        Action { target, source }
    }
    /// Get the assigned bit-range
    #[inline]
    pub fn target(&self) -> &Sig {
        &self.target
    }
    /// Get the driving expression
    #[inline]
    pub fn source(&self) -> &Sig {
        &self.source
    }
    /// Whether this assignment does nothing, i.e. targets zero bits
    #[inline]
    pub fn is_noop(&self) -> bool {
        self.target.is_empty()
    }
}

quick_display!(Action, a, fmt => write!(fmt, "assign {} = {}", a.target, a.source));
debug_from_display!(Action);

/// A branch body: ordered assignments plus ordered nested switches
#[derive(Clone, Default, Eq, PartialEq, Hash)]
pub struct Case {
    /// The assignments of this case
    actions: Vec<Action>,
    /// The nested conditionals of this case
    switches: Vec<Switch>,
}

impl Case {
    /// Create an empty case
    #[inline]
    pub fn new() -> Case {
        Case::default()
    }
    /// Whether this case has no assignments and no switches
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.switches.is_empty()
    }
    /// Get the assignments of this case
    #[inline]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }
    /// Get the nested switches of this case
    #[inline]
    pub fn switches(&self) -> &[Switch] {
        &self.switches
    }
    /// Append an assignment to this case
    pub fn push_action(&mut self, action: Action) {
        self.actions.push(action)
    }
    /// Append a nested switch to this case
    pub fn push_switch(&mut self, switch: Switch) {
        self.switches.push(switch)
    }
    /// Count the switches of this case's subtree
    pub fn switch_count(&self) -> usize {
        self.switches
            .iter()
            .map(|sw| {
                1 + sw
                    .branches()
                    .iter()
                    .map(|b| b.body().switch_count())
                    .sum::<usize>()
            })
            .sum()
    }
    pub(crate) fn actions_mut(&mut self) -> &mut Vec<Action> {
        &mut self.actions
    }
    pub(crate) fn switches_mut(&mut self) -> &mut Vec<Switch> {
        &mut self.switches
    }
    pub(crate) fn take_switches(&mut self) -> Vec<Switch> {
        std::mem::take(&mut self.switches)
    }
    pub(crate) fn into_parts(self) -> (Vec<Action>, Vec<Switch>) {
        (self.actions, self.switches)
    }
}

/// A conditional node selecting among ordered branches by a selector expression
///
/// Branch order encodes priority: the first branch whose pattern matches
/// wins. The `full` attribute claims the branches cover every selector
/// value; the `parallel` attribute claims they are mutually exclusive. The
/// two claims are independent and drive different cleanup rules.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Switch {
    /// The selector expression
    selector: Sig,
    /// Whether the branches cover every selector value
    full: bool,
    /// Whether the branches are mutually exclusive
    parallel: bool,
    /// The branches of this switch, in priority order
    branches: Vec<Branch>,
}

impl Switch {
    /// Create a switch over a selector, with no branches and neither claim
    pub fn new(selector: Sig) -> Switch {
        Switch {
            selector,
            full: false,
            parallel: false,
            branches: Vec::new(),
        }
    }
    /// Get the selector of this switch
    #[inline]
    pub fn selector(&self) -> &Sig {
        &self.selector
    }
    /// Whether the branches claim to cover every selector value
    #[inline]
    pub fn full(&self) -> bool {
        self.full
    }
    /// Whether the branches claim to be mutually exclusive
    #[inline]
    pub fn parallel(&self) -> bool {
        self.parallel
    }
    /// Set the full-coverage claim
    pub fn set_full(&mut self, full: bool) {
        self.full = full
    }
    /// Set the mutual-exclusion claim
    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel
    }
    /// Get the branches of this switch, in priority order
    #[inline]
    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }
    /// Whether this switch has no branches left
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
    /// Append a branch at the lowest priority
    ///
    /// Every pattern must have the selector's width; a disagreement is a
    /// malformed tree on the host's side.
    pub fn push_branch(&mut self, branch: Branch) {
        for pattern in branch.patterns() {
            debug_assert_eq!(
                pattern.width(),
                self.selector.width(),
                "Branch pattern width disagrees with the selector width"
            );
        }
        self.branches.push(branch)
    }
    pub(crate) fn branches_mut(&mut self) -> &mut Vec<Branch> {
        &mut self.branches
    }
    pub(crate) fn clear_selector(&mut self) {
        self.selector.clear()
    }
}

/// A switch child: match patterns plus a body
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Branch {
    /// The match patterns of this branch; empty means "always matches"
    patterns: SmallVec<[Sig; 4]>,
    /// The body of this branch
    body: Case,
}

impl Branch {
    /// Create a branch matching any of `patterns`, with the given body
    ///
    /// An empty pattern sequence creates the default branch.
    pub fn new<I: IntoIterator<Item = Sig>>(patterns: I, body: Case) -> Branch {
        Branch {
            patterns: patterns.into_iter().collect(),
            body,
        }
    }
    /// Get the match patterns of this branch
    #[inline]
    pub fn patterns(&self) -> &[Sig] {
        &self.patterns
    }
    /// Get the body of this branch
    #[inline]
    pub fn body(&self) -> &Case {
        &self.body
    }
    /// Whether this branch matches unconditionally
    #[inline]
    pub fn is_unconditional(&self) -> bool {
        self.patterns.is_empty()
    }
    pub(crate) fn patterns_mut(&mut self) -> &mut SmallVec<[Sig; 4]> {
        &mut self.patterns
    }
    pub(crate) fn body_mut(&mut self) -> &mut Case {
        &mut self.body
    }
    pub(crate) fn into_body(self) -> Case {
        self.body
    }
}

/// A procedural block: one root case plus edge-triggered update rules
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Process {
    /// The host-facing name of this process
    name: String,
    /// The root of the decision tree
    root: Case,
    /// The synchronization rules of this process
    syncs: Vec<SyncRule>,
}

impl Process {
    /// Create an empty process with a given name
    pub fn new<S: Into<String>>(name: S) -> Process {
        Process {
            name: name.into(),
            root: Case::new(),
            syncs: Vec::new(),
        }
    }
    /// Get the name of this process
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Get the root case of this process
    #[inline]
    pub fn root(&self) -> &Case {
        &self.root
    }
    /// Get the root case of this process for tree construction
    #[inline]
    pub fn root_mut(&mut self) -> &mut Case {
        &mut self.root
    }
    /// Get the synchronization rules of this process
    #[inline]
    pub fn syncs(&self) -> &[SyncRule] {
        &self.syncs
    }
    /// Append a synchronization rule to this process
    pub fn push_sync(&mut self, sync: SyncRule) {
        self.syncs.push(sync)
    }
    /// Whether this process has nothing left: no sync rules, an empty root
    ///
    /// A fully empty process is the host's cue to delete the process
    /// altogether.
    pub fn is_fully_empty(&self) -> bool {
        self.syncs.is_empty() && self.root.is_empty()
    }
    /// Count the switches of this process's decision tree
    pub fn switch_count(&self) -> usize {
        self.root.switch_count()
    }
    pub(crate) fn syncs_mut(&mut self) -> &mut Vec<SyncRule> {
        &mut self.syncs
    }
}

fn pad(fmt: &mut Formatter, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        write!(fmt, "  ")?;
    }
    Ok(())
}

fn write_case(case: &Case, fmt: &mut Formatter, depth: usize) -> fmt::Result {
    for action in case.actions() {
        pad(fmt, depth)?;
        writeln!(fmt, "{}", action)?;
    }
    for switch in case.switches() {
        write_switch(switch, fmt, depth)?;
    }
    Ok(())
}

fn write_switch(switch: &Switch, fmt: &mut Formatter, depth: usize) -> fmt::Result {
    pad(fmt, depth)?;
    write!(fmt, "switch {}", switch.selector())?;
    if switch.full() {
        write!(fmt, " full")?;
    }
    if switch.parallel() {
        write!(fmt, " parallel")?;
    }
    writeln!(fmt)?;
    for branch in switch.branches() {
        write_branch(branch, fmt, depth + 1)?;
    }
    Ok(())
}

fn write_branch(branch: &Branch, fmt: &mut Formatter, depth: usize) -> fmt::Result {
    pad(fmt, depth)?;
    if branch.is_unconditional() {
        writeln!(fmt, "branch")?;
    } else {
        writeln!(fmt, "branch {}", branch.patterns().iter().format(", "))?;
    }
    write_case(branch.body(), fmt, depth + 1)
}

impl fmt::Display for Case {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        write_case(self, fmt, 0)
    }
}
debug_from_display!(Case);

impl fmt::Display for Switch {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        write_switch(self, fmt, 0)
    }
}
debug_from_display!(Switch);

impl fmt::Display for Branch {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        write_branch(self, fmt, 0)
    }
}
debug_from_display!(Branch);

impl fmt::Display for Process {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        writeln!(fmt, "process {}", self.name)?;
        write_case(&self.root, fmt, 1)?;
        for sync in self.syncs() {
            pad(fmt, 1)?;
            writeln!(fmt, "sync {} {}", sync.kind(), sync.signal())?;
            for action in sync.actions() {
                pad(fmt, 2)?;
                writeln!(fmt, "update {} = {}", action.target(), action.source())?;
            }
            for memwr in sync.mem_writes() {
                pad(fmt, 2)?;
                writeln!(
                    fmt,
                    "memwr {} (addr={} data={} en={})",
                    memwr.memid(),
                    memwr.address(),
                    memwr.data(),
                    memwr.enable()
                )?;
            }
        }
        Ok(())
    }
}
debug_from_display!(Process);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sig::WireId;

    fn assign(wire: u32) -> Action {
        Action::new(
            Sig::wire(WireId(wire), 1),
            Sig::from_const(1, 1).unwrap(),
        )
    }

    #[test]
    fn emptiness_ignores_patterns() {
        let branch = Branch::new(vec![Sig::from_const(1, 1).unwrap()], Case::new());
        assert!(branch.body().is_empty());
        assert!(!branch.is_unconditional());

        let mut case = Case::new();
        assert!(case.is_empty());
        case.push_action(assign(0));
        assert!(!case.is_empty());
    }

    #[test]
    fn switch_counting_recurses() {
        let mut inner = Switch::new(Sig::wire(WireId(1), 1));
        inner.push_branch(Branch::new(None, Case::new()));
        let mut body = Case::new();
        body.push_switch(inner);
        let mut outer = Switch::new(Sig::wire(WireId(0), 2));
        outer.push_branch(Branch::new(
            vec![Sig::from_const(0b01, 2).unwrap()],
            body,
        ));

        let mut proc = Process::new("$test");
        proc.root_mut().push_switch(outer);
        assert_eq!(proc.switch_count(), 2);
        assert!(!proc.is_fully_empty());
        assert!(Process::new("$nil").is_fully_empty());
    }

    #[test]
    fn process_dump_is_indented() {
        let mut sw = Switch::new(Sig::from_const(0b10, 2).unwrap());
        sw.set_full(true);
        let mut body = Case::new();
        body.push_action(assign(2));
        sw.push_branch(Branch::new(vec![Sig::from_const(0b10, 2).unwrap()], body));
        let mut proc = Process::new("$p");
        proc.root_mut().push_switch(sw);

        let dump = proc.to_string();
        assert_eq!(
            dump,
            "process $p\n  switch 2'10 full\n    branch 2'10\n      assign { $w2[0] } = 1'1\n"
        );
    }
}
