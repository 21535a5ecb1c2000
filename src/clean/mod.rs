/*!
Structural cleanup of process decision trees

The pass walks a process's tree and removes structure that cannot affect
the modelled behavior: no-op assignments, branches a constant selector can
never reach, switches whose last branch has been pruned away, and
single-branch switches that can be folded into their parent case. One
sweep is a single top-down walk; [`Process::clean`] repeats sweeps until
one of them changes nothing.

# Implementation Notes
Empty-branch removal depends on the coverage claims a switch carries:

- `full`: branches may only be removed if *every* branch is empty —
  dropping some but not all would break the completeness claim.
- `parallel` (and not `full`): any empty branch may be removed.
- neither: only trailing empty branches may be removed; an empty branch
  in the middle still shadows lower-priority branches.

A branch is empty when its body is, regardless of its pattern list.
*/
use crate::proc::{Case, Process, Switch};
use log::{debug, info};

/// A recursion budget for descending a process tree
///
/// Replaces a signed depth sentinel: [`DepthLimit::UNBOUNDED`] never runs
/// out, `bounded(0)` forbids descending at all.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DepthLimit(Option<u32>);

impl DepthLimit {
    /// No recursion bound
    pub const UNBOUNDED: DepthLimit = DepthLimit(None);
    /// Descend at most `levels` levels
    #[inline]
    pub fn bounded(levels: u32) -> DepthLimit {
        DepthLimit(Some(levels))
    }
    /// The budget one level down, or `None` when the budget is exhausted
    #[inline]
    fn descend(self) -> Option<DepthLimit> {
        match self.0 {
            None => Some(DepthLimit(None)),
            Some(0) => None,
            Some(levels) => Some(DepthLimit(Some(levels - 1))),
        }
    }
}

/// Mutable state of one cleanup sweep
#[derive(Debug, Default)]
struct Sweep {
    /// Whether this sweep has edited the tree
    changed: bool,
    /// Switches removed by this sweep
    removed: usize,
}

impl Sweep {
    /// Clean one case: drop no-op assignments, delete empty switches, and
    /// descend into the rest.
    fn case(&mut self, case: &mut Case, depth: DepthLimit) {
        let live_actions = case.actions().len();
        case.actions_mut().retain(|action| !action.is_noop());
        if case.actions().len() != live_actions {
            self.changed = true;
        }

        let pending = case.take_switches();
        let mut kept = Vec::with_capacity(pending.len());
        for mut switch in pending {
            if switch.is_empty() {
                self.changed = true;
                self.removed += 1;
                continue;
            }
            let inner = match depth.descend() {
                Some(inner) => inner,
                None => {
                    kept.push(switch);
                    continue;
                }
            };
            let first_in_parent = kept.is_empty();
            match self.switch(&mut switch, first_in_parent, inner) {
                Some(body) => {
                    // Inlining: the sole branch's assignments go to the
                    // parent's tail, its switches ahead of everything that
                    // followed the inlined switch. The emptied switch
                    // stays for the next sweep to delete and count.
                    let (actions, switches) = body.into_parts();
                    case.actions_mut().extend(actions);
                    kept.extend(switches);
                    kept.push(switch);
                }
                None => kept.push(switch),
            }
        }
        *case.switches_mut() = kept;
    }

    /// Clean one switch: resolve a constant selector, fold a sole
    /// unconditional branch into the parent, otherwise descend into the
    /// branches and prune the empty ones.
    ///
    /// Returns the body to splice into the parent case when the switch
    /// collapses to its sole branch.
    fn switch(
        &mut self,
        switch: &mut Switch,
        first_in_parent: bool,
        depth: DepthLimit,
    ) -> Option<Case> {
        if !switch.selector().is_empty() && switch.selector().is_fully_def() {
            self.resolve_constant(switch);
        }

        if first_in_parent
            && switch.branches().len() == 1
            && (switch.selector().is_empty() || switch.branches()[0].is_unconditional())
        {
            self.changed = true;
            return switch.branches_mut().pop().map(|branch| branch.into_body());
        }

        if let Some(inner) = depth.descend() {
            for branch in switch.branches_mut() {
                self.case(branch.body_mut(), inner);
            }
        }

        if switch.full() {
            if !switch.branches().is_empty()
                && switch.branches().iter().all(|b| b.body().is_empty())
            {
                switch.branches_mut().clear();
                self.changed = true;
            }
        } else if switch.parallel() {
            let live_branches = switch.branches().len();
            switch.branches_mut().retain(|b| !b.body().is_empty());
            if switch.branches().len() != live_branches {
                self.changed = true;
            }
        } else {
            while switch
                .branches()
                .last()
                .map_or(false, |b| b.body().is_empty())
            {
                switch.branches_mut().pop();
                self.changed = true;
            }
        }
        None
    }

    /// Judge the branches of a switch whose selector is a fully defined
    /// constant: erase patterns that can never match, delete branches left
    /// without any pattern, and once a pattern is known to match, delete
    /// everything it shadows.
    fn resolve_constant(&mut self, switch: &mut Switch) {
        let selector = switch.selector().clone();
        let mut matched = None;
        let mut ix = 0;
        while matched.is_none() && ix < switch.branches().len() {
            if switch.branches()[ix].patterns().is_empty() {
                // An unconditional branch always matches, but it is not a
                // static match: the branches it shadows are left to the
                // pruning policies.
                break;
            }
            let branch = &mut switch.branches_mut()[ix];
            let mut hit = false;
            let mut jx = 0;
            while jx < branch.patterns().len() {
                let pattern = &branch.patterns()[jx];
                if !pattern.is_fully_def() {
                    // Cannot be judged statically
                    jx += 1;
                    continue;
                }
                if *pattern == selector {
                    hit = true;
                    break;
                }
                branch.patterns_mut().remove(jx);
                self.changed = true;
            }
            if hit {
                branch.patterns_mut().clear();
                self.changed = true;
                matched = Some(ix);
            } else if branch.patterns().is_empty() {
                // Every pattern was a concrete mismatch
                switch.branches_mut().remove(ix);
                self.changed = true;
            } else {
                ix += 1;
            }
        }
        if let Some(found) = matched {
            if switch.branches().len() > found + 1 {
                switch.branches_mut().truncate(found + 1);
                self.changed = true;
            }
            if found == 0 {
                switch.clear_selector();
                self.changed = true;
            }
        }
    }
}

impl Process {
    /// Clean this process's tree, returning the number of removed switches
    ///
    /// Sync rules are scrubbed first: zero-width updates are dropped, and
    /// rules performing no updates at all are deleted. The decision tree
    /// is then swept until a sweep changes nothing. The host is expected
    /// to delete the process itself if [`Process::is_fully_empty`] holds
    /// afterwards.
    ///
    /// `depth` bounds how far each sweep descends; `quiet` suppresses the
    /// summary log line.
    pub fn clean(&mut self, depth: DepthLimit, quiet: bool) -> usize {
        for rule in self.syncs_mut().iter_mut() {
            rule.actions_mut().retain(|action| !action.is_noop());
        }
        self.syncs_mut().retain(|rule| !rule.is_empty());

        let mut removed = 0;
        loop {
            let mut sweep = Sweep::default();
            sweep.case(self.root_mut(), depth);
            removed += sweep.removed;
            if !sweep.changed {
                break;
            }
            debug!(
                "cleanup sweep on `{}` removed {} switch(es)",
                self.name(),
                sweep.removed
            );
        }
        if removed > 0 && !quiet {
            info!(
                "Found and cleaned up {} empty switch{} in `{}`",
                removed,
                if removed == 1 { "" } else { "es" },
                self.name()
            );
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proc::{Action, Branch};
    use crate::sig::{Bit, Sig, SigBit, WireId};
    use pretty_assertions::assert_eq;

    fn assign(wire: u32) -> Action {
        Action::new(Sig::wire(WireId(wire), 1), Sig::from_const(1, 1).unwrap())
    }

    fn body(wire: u32) -> Case {
        let mut case = Case::new();
        case.push_action(assign(wire));
        case
    }

    /// A switch the cleanup cannot touch, used to pin a position in a
    /// parent's switch list.
    fn guard_switch() -> Switch {
        let mut sw = Switch::new(Sig::wire(WireId(100), 1));
        sw.push_branch(Branch::new(vec![Sig::from_const(1, 1).unwrap()], body(101)));
        sw
    }

    #[test]
    fn resolution_erases_only_concrete_mismatches() {
        // Selector 2'01; the don't-care pattern 2'x1 cannot be judged and
        // must survive, the concrete mismatch 2'10 must not.
        let dont_care = Sig::from_bits(vec![
            SigBit::Const(Bit::One),
            SigBit::Const(Bit::X),
        ]);
        let mut sw = Switch::new(Sig::from_const(0b01, 2).unwrap());
        sw.push_branch(Branch::new(
            vec![dont_care.clone(), Sig::from_const(0b10, 2).unwrap()],
            body(0),
        ));

        let mut proc = Process::new("$resolve");
        proc.root_mut().push_switch(guard_switch());
        proc.root_mut().push_switch(sw);
        let removed = proc.clean(DepthLimit::UNBOUNDED, true);

        assert_eq!(removed, 0);
        let sw = &proc.root().switches()[1];
        assert_eq!(sw.branches().len(), 1);
        assert_eq!(sw.branches()[0].patterns(), &[dont_care]);
        assert!(!sw.selector().is_empty());
    }

    #[test]
    fn default_branch_stops_resolution() {
        // The default branch shadows the concrete match below it; neither
        // may be deleted, and the selector must be kept.
        let selector = Sig::from_const(0b01, 2).unwrap();
        let mut sw = Switch::new(selector.clone());
        sw.push_branch(Branch::new(None, body(0)));
        sw.push_branch(Branch::new(vec![selector.clone()], body(1)));

        let mut proc = Process::new("$default");
        proc.root_mut().push_switch(sw);
        let removed = proc.clean(DepthLimit::UNBOUNDED, true);

        assert_eq!(removed, 0);
        let sw = &proc.root().switches()[0];
        assert_eq!(sw.selector(), &selector);
        assert_eq!(sw.branches().len(), 2);
        assert_eq!(sw.branches()[1].patterns(), &[selector]);
    }

    #[test]
    fn depth_limit_stops_descent() {
        let nested_empty = Switch::new(Sig::wire(WireId(1), 1));
        let mut branch_body = body(2);
        branch_body.push_switch(nested_empty);
        let mut sw = Switch::new(Sig::wire(WireId(0), 1));
        sw.push_branch(Branch::new(
            vec![Sig::from_const(1, 1).unwrap()],
            branch_body,
        ));
        let mut proc = Process::new("$deep");
        proc.root_mut().push_switch(sw);

        // A zero budget cleans the root case only
        let mut bounded = proc.clone();
        assert_eq!(bounded.clean(DepthLimit::bounded(0), true), 0);
        assert_eq!(bounded.switch_count(), 2);

        // One level reaches the switch but not its branch bodies
        let mut shallow = proc.clone();
        assert_eq!(shallow.clean(DepthLimit::bounded(1), true), 0);
        assert_eq!(shallow.switch_count(), 2);

        // Unbounded cleaning deletes the nested empty switch; the branch
        // keeps its assignment, so the outer switch survives
        assert_eq!(proc.clean(DepthLimit::UNBOUNDED, true), 1);
        assert_eq!(proc.switch_count(), 1);
        assert_eq!(proc.root().switches()[0].branches().len(), 1);
    }

    #[test]
    fn depth_limits_compose_with_sweeps() {
        // The budget is per sweep, so a bound deep enough to reach the
        // empty switch converges to the same tree as unbounded cleaning.
        let nested_empty = Switch::new(Sig::wire(WireId(1), 1));
        let mut branch_body = Case::new();
        branch_body.push_switch(nested_empty);
        let mut sw = Switch::new(Sig::wire(WireId(0), 1));
        sw.push_branch(Branch::new(
            vec![Sig::from_const(1, 1).unwrap()],
            branch_body,
        ));
        let mut proc = Process::new("$converge");
        proc.root_mut().push_switch(sw);

        assert_eq!(proc.clean(DepthLimit::bounded(2), true), 2);
        assert!(proc.is_fully_empty());
    }
}
