//! Documentation and decorator association.
//!
//! While the walker moves through nodes that precede a declaration, leading
//! comment lines and decorators accumulate here. Creating a declaration
//! takes the buffer; anything non-attachable in between (an unrelated
//! statement, an import) clears it, so stale documentation never leaks onto
//! a later declaration.
//!
//! Decorators are kept in the exact order encountered in source (top to
//! bottom), which corresponds to innermost-applied-last.

use symdex_core::graph::Decorator;

/// Pending attachment state for the next declaration.
#[derive(Debug, Default)]
pub struct Associator {
    doc_lines: Vec<String>,
    decorators: Vec<Decorator>,
}

impl Associator {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer one leading comment line. Comment markers are stripped.
    pub fn push_comment(&mut self, text: &str) {
        let stripped = text.trim().trim_start_matches('#').trim();
        self.doc_lines.push(stripped.to_string());
    }

    /// Buffer one decorator, preserving source order.
    pub fn push_decorator(&mut self, decorator: Decorator) {
        self.decorators.push(decorator);
    }

    /// Take the buffer for attachment to a declaration, clearing it.
    pub fn take(&mut self) -> (Option<String>, Vec<Decorator>) {
        let doc = if self.doc_lines.is_empty() {
            None
        } else {
            Some(self.doc_lines.join("\n"))
        };
        self.doc_lines.clear();
        (doc, std::mem::take(&mut self.decorators))
    }

    /// Drop the buffer without attachment (unrelated content intervened).
    pub fn clear(&mut self) {
        self.doc_lines.clear();
        self.decorators.clear();
    }

    /// Whether anything is buffered.
    pub fn has_pending(&self) -> bool {
        !self.doc_lines.is_empty() || !self.decorators.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use symdex_core::span::Span;

    #[test]
    fn comments_join_into_one_block() {
        let mut assoc = Associator::new();
        assoc.push_comment("# Parses a token stream.");
        assoc.push_comment("#   Returns None at EOF.");
        let (doc, decorators) = assoc.take();
        assert_eq!(
            doc.as_deref(),
            Some("Parses a token stream.\nReturns None at EOF.")
        );
        assert!(decorators.is_empty());
        assert!(!assoc.has_pending());
    }

    #[test]
    fn decorator_order_is_source_order() {
        let mut assoc = Associator::new();
        assoc.push_decorator(Decorator::from_source("@retry(times=3)", Span::new(0, 15)));
        assoc.push_decorator(Decorator::from_source("@timer", Span::new(16, 22)));
        let (_, decorators) = assoc.take();
        assert_eq!(decorators[0].name, "retry");
        assert_eq!(decorators[1].name, "timer");
        assert!(decorators[0].span.start < decorators[1].span.start);
    }

    #[test]
    fn clear_drops_stale_buffer() {
        let mut assoc = Associator::new();
        assoc.push_comment("# about the wrong thing");
        assoc.clear();
        let (doc, decorators) = assoc.take();
        assert_eq!(doc, None);
        assert!(decorators.is_empty());
    }

    #[test]
    fn take_resets_for_next_declaration() {
        let mut assoc = Associator::new();
        assoc.push_comment("# first");
        let _ = assoc.take();
        let (doc, _) = assoc.take();
        assert_eq!(doc, None);
    }
}
