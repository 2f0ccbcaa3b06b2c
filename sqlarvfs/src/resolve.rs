use tracing::debug;

use super::node::{path_of, Node, NodeId, ResolveState};
use super::open::ArchiveOptions;

// Resolves symlinks to their final, non-symlink targets.
//
// This runs once, after every row has been inserted. Each symlink is marked in progress while its
// target is being looked up, so a chain that loops back on itself is detected regardless of how
// long it is. Symlinks found along the way are resolved on an explicit stack rather than through
// recursion, so chain length is bounded only by memory.
#[derive(Debug)]
pub(crate) struct Resolver<'a> {
    nodes: &'a mut [Node],
    options: &'a ArchiveOptions,
}

// A symlink whose target path is partway through being looked up.
#[derive(Debug)]
struct Frame {
    link: NodeId,
    segments: Vec<String>,
    next: usize,
    current: NodeId,
}

#[derive(Debug)]
enum Step {
    // The lookup finished, successfully or not.
    Done(Option<NodeId>),

    // The lookup is blocked on a symlink which hasn't been resolved yet.
    Descend(NodeId),
}

impl<'a> Resolver<'a> {
    pub fn new(nodes: &'a mut [Node], options: &'a ArchiveOptions) -> Self {
        Self { nodes, options }
    }

    // Resolve every symlink in the tree, returning the number that are broken.
    pub fn resolve_all(&mut self) -> usize {
        let mut broken = 0;

        for index in 0..self.nodes.len() {
            let id = NodeId::new(index);

            if self.nodes[index].as_symlink().is_some() && self.resolve(id).is_none() {
                broken += 1;
            }
        }

        broken
    }

    // Resolve a single symlink. Resolving the same symlink again returns the cached target.
    pub fn resolve(&mut self, id: NodeId) -> Option<NodeId> {
        let symlink = self.nodes[id.index()].as_symlink()?;

        match symlink.state {
            ResolveState::Resolved => return symlink.resolved,
            // We've come back around to a symlink we're still resolving.
            ResolveState::InProgress => return None,
            ResolveState::NotResolved => {}
        }

        let mut stack = vec![self.start(id)];

        while let Some(frame) = stack.last_mut() {
            match self.step(frame) {
                Step::Done(resolved) => {
                    if let Some(frame) = stack.pop() {
                        self.finish(frame.link, resolved);
                    }
                }
                Step::Descend(link) => {
                    let frame = self.start(link);
                    stack.push(frame);
                }
            }
        }

        self.nodes[id.index()]
            .as_symlink()
            .and_then(|symlink| symlink.resolved)
    }

    fn set_state(&mut self, id: NodeId, state: ResolveState, resolved: Option<NodeId>) {
        if let Some(symlink) = self.nodes[id.index()].as_symlink_mut() {
            symlink.state = state;
            symlink.resolved = resolved;
        }
    }

    fn start(&mut self, link: NodeId) -> Frame {
        let node = &self.nodes[link.index()];
        let parent = node.parent.unwrap_or(NodeId::ROOT);
        let target = node
            .as_symlink()
            .map(|symlink| symlink.target.as_str())
            .unwrap_or_default();

        let segments = path_of(self.nodes, parent)
            .resolve(target)
            .segments()
            .map(str::to_owned)
            .collect();

        self.set_state(link, ResolveState::InProgress, None);

        Frame {
            link,
            segments,
            next: 0,
            current: NodeId::ROOT,
        }
    }

    fn finish(&mut self, link: NodeId, resolved: Option<NodeId>) {
        self.set_state(link, ResolveState::Resolved, resolved);

        if resolved.is_none() {
            if let Some(symlink) = self.nodes[link.index()].as_symlink() {
                debug!(
                    path = %path_of(self.nodes, link),
                    target = %symlink.target,
                    "Symbolic link is broken or recursive."
                );
            }
        }
    }

    // Advance a lookup as far as it can go without resolving another symlink. This is the same
    // walk as `Tree::find_path`, always dereferencing the last segment.
    fn step(&self, frame: &mut Frame) -> Step {
        loop {
            if let Some(symlink) = self.nodes[frame.current.index()].as_symlink() {
                match (symlink.state, symlink.resolved) {
                    (ResolveState::Resolved, Some(target)) => frame.current = target,
                    (ResolveState::Resolved, None) | (ResolveState::InProgress, _) => {
                        return Step::Done(None)
                    }
                    (ResolveState::NotResolved, _) => return Step::Descend(frame.current),
                }
            }

            let Some(segment) = frame.segments.get(frame.next) else {
                return Step::Done(Some(frame.current));
            };

            let child = self.nodes[frame.current.index()]
                .as_dir()
                .and_then(|dir| dir.index.get(self.options.fold(segment).as_ref()));

            match child {
                Some(&child) => {
                    frame.current = child;
                    frame.next += 1;
                }
                None => return Step::Done(None),
            }
        }
    }
}
