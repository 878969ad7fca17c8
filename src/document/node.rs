//! Node types of the reference document tree.

/// A node in the document tree: either a text run or a block with children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Block(Block),
}

/// A structural node (paragraph, heading, table cell, footer, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: String,
    /// Replacement inside a protected block is refused
    pub protected: bool,
    pub children: Vec<Node>,
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn block(kind: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Block(Block {
            kind: kind.into(),
            protected: false,
            children,
        })
    }

    /// A paragraph holding a single text run (no children when `text` is empty).
    pub fn paragraph(text: &str) -> Self {
        Self::block("paragraph", Self::runs(text))
    }

    /// A heading holding a single text run.
    pub fn heading(text: &str) -> Self {
        Self::block("heading", Self::runs(text))
    }

    /// Mark a block as protected. Text nodes are returned unchanged.
    pub fn protected(self) -> Self {
        match self {
            Node::Block(mut block) => {
                block.protected = true;
                Node::Block(block)
            }
            text => text,
        }
    }

    /// Number of positions the node occupies.
    pub fn size(&self) -> usize {
        match self {
            Node::Text(text) => text.chars().count(),
            Node::Block(block) => 2 + block.children.iter().map(Node::size).sum::<usize>(),
        }
    }

    fn runs(text: &str) -> Vec<Node> {
        if text.is_empty() {
            Vec::new()
        } else {
            vec![Node::text(text)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_count_characters_and_boundaries() {
        assert_eq!(Node::text("héllo").size(), 5);
        assert_eq!(Node::paragraph("abc").size(), 5);
        assert_eq!(Node::paragraph("").size(), 2);

        let nested = Node::block(
            "table",
            vec![Node::block("cell", vec![Node::text("ab"), Node::text("c")])],
        );
        assert_eq!(nested.size(), 7);
    }

    #[test]
    fn protected_only_applies_to_blocks() {
        match Node::paragraph("x").protected() {
            Node::Block(block) => assert!(block.protected),
            Node::Text(_) => panic!("expected block"),
        }
        assert_eq!(Node::text("x").protected(), Node::text("x"));
    }
}
