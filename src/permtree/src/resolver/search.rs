//! Backtracking search for the best-ranked descent

use tracing::trace;

use super::candidate::{Candidate, Inherited, Step};
use crate::tree::Node;

/// Depth-first search over every descent consistent with a query path
///
/// Children are visited literal first, so full-length candidates are met in
/// rank order and the first one ends the search.
pub(crate) struct Search<'q> {
    segments: &'q [String],
    route: Vec<Step>,
    best: Option<Candidate>,
}

impl<'q> Search<'q> {
    pub fn new(segments: &'q [String]) -> Self {
        Self {
            segments,
            route: Vec::with_capacity(segments.len()),
            best: None,
        }
    }

    /// Runs the search from `root` and returns the winning candidate
    pub fn run(mut self, root: &Node) -> Option<Candidate> {
        self.descend(root, None);
        self.best
    }

    /// Returns `true` once a full candidate has been found
    fn descend(&mut self, node: &Node, inherited: Option<Inherited>) -> bool {
        let depth = self.route.len();
        let inherited = node
            .permission()
            .map(|permission| Inherited { depth, permission })
            .or(inherited);

        if depth == self.segments.len() {
            self.offer(node, inherited, true);
            return true;
        }

        let segment = &self.segments[depth];
        let mut extended = false;

        if let Some(child) = node.literal(segment) {
            extended = true;
            if self.step(Step::Literal, child, inherited) {
                return true;
            }
        }

        if let Some(child) = node.wildcard() {
            extended = true;
            if self.step(Step::Wildcard, child, inherited) {
                return true;
            }
        }

        if !extended {
            self.offer(node, inherited, false);
        }

        false
    }

    fn step(&mut self, step: Step, child: &Node, inherited: Option<Inherited>) -> bool {
        self.route.push(step);
        let done = self.descend(child, inherited);
        self.route.pop();
        done
    }

    fn offer(&mut self, node: &Node, inherited: Option<Inherited>, full: bool) {
        let candidate = Candidate {
            route: self.route.clone(),
            full,
            terminal: node.permission(),
            inherited,
        };

        trace!(
            "Candidate route={:?} full={} terminal={:?}",
            candidate.route, candidate.full, candidate.terminal
        );

        let better = match &self.best {
            Some(best) => candidate.outranks(best),
            None => true,
        };
        if better {
            self.best = Some(candidate);
        }
    }
}
