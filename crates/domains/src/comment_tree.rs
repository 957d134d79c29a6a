//! # Comment Tree Builder
//!
//! Comments are stored flat with a parent-id edge. Everything here turns that
//! flat set into the nested, depth-annotated projection clients read, or walks
//! the edges for depth and cascading deletion. All walks use explicit
//! work-lists, so an adversarially deep thread costs heap, not stack.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::models::{Comment, CommentId, CommentNode};

/// Result of assembling one post's comments.
#[derive(Debug, Default)]
pub struct CommentTree {
    /// Root comments in supplied order, each with nested replies.
    pub roots: Vec<CommentNode>,
    /// Comments that no root reaches: their parent is missing from the
    /// supplied set, or the parent chain loops. This is a data-integrity
    /// fault and should never be non-empty when the full set was supplied.
    pub orphans: Vec<Comment>,
}

impl CommentTree {
    pub fn is_consistent(&self) -> bool {
        self.orphans.is_empty()
    }
}

fn children_index(comments: &[Comment]) -> HashMap<CommentId, Vec<CommentId>> {
    let mut children: HashMap<CommentId, Vec<CommentId>> = HashMap::new();
    for comment in comments {
        if let Some(parent) = comment.parent_id {
            children.entry(parent).or_default().push(comment.id);
        }
    }
    children
}

/// Builds the display forest for one post.
///
/// Replies keep the order in which comments were supplied. Depth is 0 for
/// roots and parent depth + 1 otherwise.
pub fn build_tree(comments: Vec<Comment>) -> CommentTree {
    let children = children_index(&comments);
    let root_ids: Vec<CommentId> = comments
        .iter()
        .filter(|c| c.parent_id.is_none())
        .map(|c| c.id)
        .collect();

    // Breadth-first from the roots: annotates depth and yields an order in
    // which every node comes after its parent.
    let mut depths: HashMap<CommentId, usize> = HashMap::with_capacity(comments.len());
    let mut order: Vec<CommentId> = Vec::with_capacity(comments.len());
    let mut queue: VecDeque<(CommentId, usize)> = root_ids.iter().map(|&id| (id, 0)).collect();
    while let Some((id, depth)) = queue.pop_front() {
        if depths.insert(id, depth).is_some() {
            continue;
        }
        order.push(id);
        if let Some(replies) = children.get(&id) {
            queue.extend(replies.iter().map(|&reply| (reply, depth + 1)));
        }
    }

    let mut reachable: HashMap<CommentId, Comment> = HashMap::with_capacity(order.len());
    let mut orphans = Vec::new();
    for comment in comments {
        if depths.contains_key(&comment.id) && !reachable.contains_key(&comment.id) {
            reachable.insert(comment.id, comment);
        } else {
            orphans.push(comment);
        }
    }

    // Bottom-up: walking the breadth-first order backwards guarantees every
    // reply is assembled before its parent claims it.
    let mut built: HashMap<CommentId, CommentNode> = HashMap::with_capacity(order.len());
    for id in order.iter().rev() {
        let Some(comment) = reachable.remove(id) else {
            continue;
        };
        let mut node = CommentNode::leaf(comment, depths[id]);
        if let Some(replies) = children.get(id) {
            node.replies = replies.iter().filter_map(|r| built.remove(r)).collect();
        }
        built.insert(*id, node);
    }

    let roots = root_ids.iter().filter_map(|id| built.remove(id)).collect();
    CommentTree { roots, orphans }
}

/// Maps each comment id to its parent id.
pub fn parent_index(comments: &[Comment]) -> HashMap<CommentId, Option<CommentId>> {
    comments.iter().map(|c| (c.id, c.parent_id)).collect()
}

/// Counts hops from `id` up to a comment without a parent.
///
/// Returns `None` if `id` or any ancestor is missing from the index, or if
/// the chain is longer than the index (a cycle).
pub fn depth_of(id: CommentId, parents: &HashMap<CommentId, Option<CommentId>>) -> Option<usize> {
    let mut depth = 0;
    let mut current = *parents.get(&id)?;
    while let Some(parent) = current {
        depth += 1;
        if depth > parents.len() {
            return None;
        }
        current = *parents.get(&parent)?;
    }
    Some(depth)
}

/// The subtree rooted at `root`, ordered so that every reply precedes its
/// parent and `root` comes last. Safe to delete front to back under
/// referential constraints.
pub fn deletion_order(root: CommentId, comments: &[Comment]) -> Vec<CommentId> {
    let children = children_index(comments);
    let mut visited = HashSet::new();
    let mut preorder = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        preorder.push(id);
        if let Some(replies) = children.get(&id) {
            stack.extend(replies.iter().copied());
        }
    }
    // In pre-order every ancestor precedes its descendants; reversed, every
    // descendant precedes its ancestors.
    preorder.reverse();
    preorder
}
