//! The reference document tree: traversal, text access and transaction application.

use crate::document::node::{Block, Node};
use crate::document::transaction::{Mapping, ReplaceStep, StepMap, Transaction};
use crate::document::BlockInfo;
use crate::error::{Result, RichfindError};

const HEADING_MARKER: &str = "# ";

/// A document: the ordered children of an implicit root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    children: Vec<Node>,
}

/// Outcome of applying a transaction to a document.
#[derive(Debug, Clone)]
pub struct Applied {
    pub document: Document,
    pub mapping: Mapping,
    /// Steps that undo the transaction when applied to `document`
    pub inverse: Transaction,
}

impl Document {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    /// Build a document with one block per line. Lines starting with `"# "` become
    /// headings, everything else a paragraph.
    pub fn from_text(text: &str) -> Self {
        let children = text
            .lines()
            .map(|line| match line.strip_prefix(HEADING_MARKER) {
                Some(title) => Node::heading(title),
                None => Node::paragraph(line),
            })
            .collect();
        Self { children }
    }

    /// Inverse of [`Document::from_text`] for documents built from text.
    ///
    /// Other blocks contribute their text, one line per top-level node.
    pub fn to_text(&self) -> String {
        let lines: Vec<String> = self
            .children
            .iter()
            .map(|node| match node {
                Node::Block(block) if block.kind == "heading" => {
                    format!("{}{}", HEADING_MARKER, collect_text(&block.children))
                }
                Node::Block(block) => collect_text(&block.children),
                Node::Text(text) => text.clone(),
            })
            .collect();
        lines.join("\n")
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn size(&self) -> usize {
        self.children.iter().map(Node::size).sum()
    }

    pub fn walk_text(&self, visit: &mut dyn FnMut(usize, &str)) {
        walk_text_nodes(&self.children, 0, visit);
    }

    pub fn walk_blocks(&self, visit: &mut dyn FnMut(&BlockInfo<'_>)) {
        walk_block_nodes(&self.children, 0, 0, visit);
    }

    pub fn text_between(&self, from: usize, to: usize) -> Option<String> {
        if from > to || to > self.size() {
            return None;
        }
        let mut out = String::new();
        self.walk_text(&mut |start, text| {
            let len = text.chars().count();
            let end = start + len;
            if end <= from || start >= to {
                return;
            }
            let skip = from.saturating_sub(start);
            let take = to.min(end) - start.max(from);
            out.extend(text.chars().skip(skip).take(take));
        });
        Some(out)
    }

    /// Apply every step of `transaction` to a copy of this document.
    pub fn apply(&self, transaction: &Transaction) -> Result<Applied> {
        let mut next = self.clone();
        let mut mapping = Mapping::new();
        let mut inverse = Vec::with_capacity(transaction.len());

        for step in transaction.steps() {
            let ReplaceStep { from, to, text } = step;
            if from > to {
                return Err(RichfindError::InvalidRange {
                    from: *from,
                    to: *to,
                });
            }
            let removed = replace_text(&mut next.children, 0, *from, *to, text).ok_or(
                RichfindError::InvalidRange {
                    from: *from,
                    to: *to,
                },
            )?;
            let inserted = text.chars().count();
            mapping.push(StepMap {
                from: *from,
                old_len: to - from,
                new_len: inserted,
            });
            inverse.push(ReplaceStep::new(*from, from + inserted, removed));
        }

        inverse.reverse();
        Ok(Applied {
            document: next,
            mapping,
            inverse: Transaction::from_steps(inverse),
        })
    }
}

fn collect_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    walk_text_nodes(nodes, 0, &mut |_, text| out.push_str(text));
    out
}

fn walk_text_nodes(nodes: &[Node], mut pos: usize, visit: &mut dyn FnMut(usize, &str)) -> usize {
    for node in nodes {
        match node {
            Node::Text(text) => {
                if !text.is_empty() {
                    visit(pos, text);
                }
                pos += text.chars().count();
            }
            Node::Block(block) => {
                pos = walk_text_nodes(&block.children, pos + 1, visit) + 1;
            }
        }
    }
    pos
}

fn walk_block_nodes(
    nodes: &[Node],
    mut pos: usize,
    depth: usize,
    visit: &mut dyn FnMut(&BlockInfo<'_>),
) -> usize {
    for node in nodes {
        match node {
            Node::Text(text) => pos += text.chars().count(),
            Node::Block(Block {
                kind,
                protected,
                children,
            }) => {
                let end = pos + node.size();
                visit(&BlockInfo {
                    kind,
                    from: pos,
                    to: end,
                    depth,
                    protected: *protected,
                });
                walk_block_nodes(children, pos + 1, depth + 1, visit);
                pos = end;
            }
        }
    }
    pos
}

/// Replace `from..to` inside the single text leaf that contains it.
///
/// Returns the removed text, or `None` when no leaf contains the whole range.
fn replace_text(
    nodes: &mut Vec<Node>,
    mut pos: usize,
    from: usize,
    to: usize,
    insert: &str,
) -> Option<String> {
    for i in 0..nodes.len() {
        let end = pos + nodes[i].size();
        let hit = match &mut nodes[i] {
            Node::Text(text) if from >= pos && to <= end => {
                let removed = splice_chars(text, from - pos, to - pos, insert);
                Some((removed, text.is_empty()))
            }
            Node::Block(block) if from > pos && to < end => {
                return replace_text(&mut block.children, pos + 1, from, to, insert);
            }
            _ => None,
        };
        if let Some((removed, now_empty)) = hit {
            if now_empty {
                nodes.remove(i);
            }
            return Some(removed);
        }
        pos = end;
    }
    None
}

fn splice_chars(text: &mut String, from: usize, to: usize, insert: &str) -> String {
    let start = byte_index(text, from);
    let end = byte_index(text, to);
    let removed = text[start..end].to_string();
    text.replace_range(start..end, insert);
    removed
}

fn byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(byte, _)| byte)
}
