//! The ASN.1 tree and its structural operations.
//!
//! A [`Tree`] holds its nodes in an arena: a slot vector indexed by
//! [`NodeId`] handles. The parent relation is kept as a handle
//! back-reference, so the tree stays free of ownership cycles; a node is
//! owned exactly once, through the child list of its parent.
//!
//! Besides the arena itself this module carries the structural collaborators
//! of the value codec: dotted-path lookup, subtree copy and deletion, and
//! the SEQUENCE OF / SET OF growth step that clones the template element
//! under a generated `?N` name.

use std::collections::VecDeque;
use bytes::Bytes;
use crate::error::Error;
use crate::node::{Flags, Node, NodeType};
use crate::xerr;


//------------ NodeId --------------------------------------------------------

/// A handle addressing one node of a [`Tree`].
///
/// Handles are only meaningful for the tree that issued them. A handle to a
/// deleted subtree becomes dangling; using it is safe but will fail or
/// address an unrelated node after slot reuse.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NodeId(usize);


//------------ Tree ----------------------------------------------------------

/// A tree of ASN.1 elements.
///
/// A tree is built once from a type definition, either programmatically via
/// [`add_child`][Self::add_child] and friends or by an external grammar
/// compiler, and then instantiated into working copies whose values are
/// manipulated through
/// [`write_value`][Self::write_value] and
/// [`read_value`][Self::read_value].
///
/// A tree is a mutable, unsynchronized resource. All operations assume
/// exclusive access for their duration, which Rust's borrow rules enforce
/// within a process.
#[derive(Clone, Debug)]
pub struct Tree {
    /// The node arena. Freed slots are `None` and listed in `free`.
    nodes: Vec<Option<Node>>,

    /// Indexes of freed slots available for reuse.
    free: Vec<usize>,

    /// The root node.
    root: NodeId,
}

/// # Building and Instantiating
///
impl Tree {
    /// Creates a new tree holding a single root node.
    pub fn new(typ: NodeType, name: Option<&str>) -> Self {
        Tree {
            nodes: vec![Some(Node::new(typ, name))],
            free: Vec::new(),
            root: NodeId(0),
        }
    }

    /// Returns the handle of the root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Appends a new child to `parent` and returns its handle.
    ///
    /// The child is added after all existing children. Pseudo-children must
    /// therefore be added before content children.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is dangling.
    pub fn add_child(
        &mut self, parent: NodeId, typ: NodeType, name: Option<&str>,
    ) -> NodeId {
        let mut node = Node::new(typ, name);
        node.parent = Some(parent);
        let id = self.alloc(node);
        self.node_mut(parent).children.push(id);
        id
    }

    /// Adds the given flags to a node.
    pub fn set_flags(&mut self, id: NodeId, flags: Flags) {
        self.node_mut(id).flags.insert(flags);
    }

    /// Sets the textual value of a node.
    ///
    /// This is the builder-side way to give TAG children their tag number
    /// and DEFAULT and CONSTANT children their declared value.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        self.node_mut(id).value =
            Some(Bytes::copy_from_slice(text.as_bytes()));
    }

    /// Creates a working copy of this definition tree.
    ///
    /// The copy is fully independent; the definition is never mutated by
    /// value operations on its instances.
    pub fn instantiate(&self) -> Self {
        self.clone()
    }
}

/// # Access
///
impl Tree {
    /// Returns a reference to a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` is dangling.
    pub fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.0].as_ref().expect("dangling node id")
    }

    /// Returns a reference to a node if the handle is live.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(|slot| slot.as_ref())
    }

    /// Returns the children of a node in declaration order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Returns an iterator over the non-pseudo children of a node.
    pub fn content_children(
        &self, id: NodeId,
    ) -> impl Iterator<Item = NodeId> + '_ {
        self.node(id).children.iter().copied().filter(move |&child| {
            !self.node(child).node_type().is_pseudo()
        })
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.0].as_mut().expect("dangling node id")
    }

    /// Installs a fully built value on a node.
    ///
    /// `None` clears the stored value, which for an element with a DEFAULT
    /// means "equal to the default".
    pub(crate) fn set_value(&mut self, id: NodeId, value: Option<Bytes>) {
        self.node_mut(id).value = value;
    }

    /// Returns the DEFAULT pseudo-child of a node, if declared.
    pub(crate) fn default_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).children.iter().copied().find(|&child| {
            self.node(child).node_type() == NodeType::Default
        })
    }

    /// Returns the declared value of the CONSTANT child named `name`.
    pub(crate) fn constant_value(
        &self, id: NodeId, name: &str,
    ) -> Option<&[u8]> {
        self.node(id).children.iter().copied().find_map(|child| {
            let node = self.node(child);
            if node.node_type() == NodeType::Constant
                && node.name() == Some(name)
            {
                node.value()
            }
            else {
                None
            }
        })
    }

    /// Returns the dotted name of a node seen from the root.
    ///
    /// Unnamed nodes along the way are skipped. If no node on the path has
    /// a name at all, returns `"ROOT"`.
    pub fn hierarchical_name(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current);
            if let Some(name) = node.name() {
                parts.push(name);
            }
            cursor = node.parent;
        }
        if parts.is_empty() {
            return String::from("ROOT")
        }
        parts.reverse();
        parts.join(".")
    }
}

/// # Path Lookup
///
impl Tree {
    /// Resolves a dotted path to a node handle.
    ///
    /// Each segment is matched against the names of the current node's
    /// children. The special segment `?LAST` selects the current last
    /// child, which for a grown SEQUENCE OF or SET OF is the most recently
    /// appended element. The empty path addresses the root.
    pub fn find(&self, path: &str) -> Result<NodeId, Error> {
        let mut current = self.root;
        if path.is_empty() {
            return Ok(current)
        }
        for segment in path.split('.') {
            current = self.find_child(current, segment)?;
        }
        Ok(current)
    }

    fn find_child(&self, parent: NodeId, segment: &str) -> Result<NodeId, Error> {
        if segment == "?LAST" {
            match self.node(parent).children.last() {
                Some(&last) => return Ok(last),
                None => xerr!(return Err(Error::ElementNotFound)),
            }
        }
        let found = self.node(parent).children.iter().copied().find(|&child| {
            self.node(child).name() == Some(segment)
        });
        match found {
            Some(found) => Ok(found),
            None => xerr!(Err(Error::ElementNotFound)),
        }
    }
}

/// # Structural Mutation
///
impl Tree {
    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                NodeId(idx)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    /// Deletes a node and its whole subtree.
    ///
    /// The node is detached from its parent's child list and every slot of
    /// the subtree is freed for reuse. The root cannot be deleted.
    pub fn delete_subtree(&mut self, id: NodeId) -> Result<(), Error> {
        let parent = match self.node(id).parent {
            Some(parent) => parent,
            None => xerr!(return Err(Error::Generic)),
        };
        self.node_mut(parent).children.retain(|&child| child != id);
        self.free_subtree(id);
        Ok(())
    }

    fn free_subtree(&mut self, id: NodeId) {
        // A worklist instead of recursion: tree depth is input-controlled.
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let children =
                std::mem::take(&mut self.node_mut(current).children);
            stack.extend(children);
            self.nodes[current.0] = None;
            self.free.push(current.0);
        }
    }

    /// Deep-copies the subtree below `src` and returns the detached copy.
    ///
    /// The copy has no parent until it is attached. The traversal is
    /// breadth-first, which keeps sibling order and avoids recursing to
    /// input-controlled depth.
    fn copy_subtree(&mut self, src: NodeId) -> NodeId {
        let mut node = self.node(src).clone();
        let children = std::mem::take(&mut node.children);
        node.parent = None;
        let copy = self.alloc(node);

        let mut queue: VecDeque<(NodeId, NodeId)> =
            children.into_iter().map(|child| (child, copy)).collect();
        while let Some((src_child, parent_copy)) = queue.pop_front() {
            let mut node = self.node(src_child).clone();
            let grandchildren = std::mem::take(&mut node.children);
            node.parent = Some(parent_copy);
            let child_copy = self.alloc(node);
            self.node_mut(parent_copy).children.push(child_copy);
            queue.extend(
                grandchildren.into_iter().map(|child| (child, child_copy))
            );
        }
        copy
    }

    /// Grows a SEQUENCE OF or SET OF by one element.
    ///
    /// The template element, the first child after the leading
    /// pseudo-children, is deep-copied and appended as the new last child.
    /// Its name is the numeric suffix of the previous last child's name
    /// incremented by one, starting at `?1` when the template itself is
    /// still the last child.
    pub(crate) fn append_sequence_set(
        &mut self, id: NodeId,
    ) -> Result<NodeId, Error> {
        let template = match self.content_children(id).next() {
            Some(template) => template,
            None => xerr!(return Err(Error::Generic)),
        };
        let name = match self.node(id).children.last() {
            Some(&last) => next_element_name(self.node(last).name()),
            None => xerr!(return Err(Error::Generic)),
        };
        let copy = self.copy_subtree(template);
        let node = self.node_mut(copy);
        node.parent = Some(id);
        node.name = Some(name);
        self.node_mut(id).children.push(copy);
        Ok(copy)
    }
}

/// Returns the generated name following that of the current last element.
fn next_element_name(last: Option<&str>) -> String {
    let next = last
        .and_then(|name| name.get(1..))
        .and_then(|suffix| suffix.parse::<u64>().ok())
        .map_or(1, |n| n + 1);
    format!("?{}", next)
}


//============ Tests =========================================================
