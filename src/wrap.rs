/// Splits overlong subtitle text into two lines at a word boundary near the middle
#[derive(Debug, Clone, Copy)]
pub struct LineWrapper {
    max_width: usize,
}

impl Default for LineWrapper {
    fn default() -> Self {
        Self { max_width: 42 }
    }
}

impl LineWrapper {
    pub fn new(max_width: usize) -> Self {
        Self { max_width }
    }

    /// Return `sentence` unchanged if it fits, otherwise as exactly two lines
    pub fn wrap(&self, sentence: &str) -> String {
        let words: Vec<&str> = sentence.split_whitespace().collect();
        let single_line = words.join(" ");
        let length = single_line.chars().count();

        if length <= self.max_width || words.len() < 2 {
            return single_line;
        }

        let midpoint = length / 2;
        let mut cumulative = 0;
        for (i, word) in words.iter().enumerate() {
            cumulative += word.chars().count() + usize::from(i > 0);

            if cumulative >= midpoint {
                // Split after the word that reaches the midpoint, unless that empties the second line
                let split = if i + 1 < words.len() { i + 1 } else { i };
                return format!("{}\n{}", words[..split].join(" "), words[split..].join(" "));
            }
        }

        single_line
    }
}
