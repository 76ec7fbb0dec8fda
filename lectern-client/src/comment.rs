use std::collections::HashMap;

use crate::api::{Comment, CommentId};

/// Replies can be composed on comments up to this depth (roots are depth 0)
pub const MAX_REPLY_DEPTH: usize = 2;

pub fn can_reply(depth: usize) -> bool {
    depth < MAX_REPLY_DEPTH
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommentNode {
    pub comment: Comment,

    /// Direct replies, in the order the server listed them
    pub children: Vec<CommentNode>,
}

impl CommentNode {
    pub fn id(&self) -> CommentId {
        self.comment.id
    }

    pub fn reply_count(&self) -> usize {
        self.children.len()
    }

    /// Depth-first walk over this node and all its replies, along with their
    /// depth relative to this node
    pub fn walk(&self) -> impl Iterator<Item = (usize, &CommentNode)> {
        let mut stack = vec![(0, self)];
        std::iter::from_fn(move || {
            let (depth, node) = stack.pop()?;
            stack.extend(node.children.iter().rev().map(|c| (depth + 1, c)));
            Some((depth, node))
        })
    }
}

/// Nest a flat list of comments under their direct parents.
///
/// Roots and replies keep the relative order of `comments`. A reply whose
/// parent is not part of `comments` is dropped, along with anything that
/// replies to it.
pub fn build_tree(comments: Vec<Comment>) -> Vec<CommentNode> {
    let total = comments.len();
    let index: HashMap<CommentId, usize> = comments
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id, i))
        .collect();

    let mut roots = Vec::new();
    let mut children = vec![Vec::new(); total];
    for (i, c) in comments.iter().enumerate() {
        match c.parent {
            None => roots.push(i),
            Some(parent) => match index.get(&parent) {
                Some(&p) => children[p].push(i),
                None => tracing::debug!(comment=?c.id, ?parent, "dropping orphan reply"),
            },
        }
    }

    let mut slots = comments.into_iter().map(Some).collect::<Vec<_>>();
    let tree = roots
        .into_iter()
        .filter_map(|r| assemble(r, &mut slots, &children))
        .collect::<Vec<_>>();

    let kept: usize = tree.iter().map(|n| n.walk().count()).sum();
    if kept != total {
        tracing::debug!(
            dropped = total - kept,
            total,
            "some comments were not reachable from a root"
        );
    }
    tree
}

fn assemble(
    idx: usize,
    slots: &mut [Option<Comment>],
    children: &[Vec<usize>],
) -> Option<CommentNode> {
    let comment = slots[idx].take()?;
    let children = children[idx]
        .iter()
        .filter_map(|&c| assemble(c, slots, children))
        .collect();
    Some(CommentNode { comment, children })
}
