/// Read position over the whitespace-split tokens of a page translation.
///
/// Tokens are borrowed from the translated text and never copied; consuming
/// tokens only moves the position forward.
#[derive(Debug, Clone)]
pub struct TokenCursor<'a> {
    tokens: Vec<&'a str>,
    position: usize,
}

impl<'a> TokenCursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            tokens: text.split_whitespace().collect(),
            position: 0,
        }
    }

    /// Tokens not consumed yet
    pub fn remaining(&self) -> &[&'a str] {
        &self.tokens[self.position..]
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.tokens.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn total(&self) -> usize {
        self.tokens.len()
    }

    /// Consume up to `count` tokens and return them
    pub fn take(&mut self, count: usize) -> &[&'a str] {
        let start = self.position;
        self.position = (start + count).min(self.tokens.len());
        &self.tokens[start..self.position]
    }

    /// Consume everything left
    pub fn take_rest(&mut self) -> &[&'a str] {
        let rest = self.tokens.len() - self.position;
        self.take(rest)
    }
}
