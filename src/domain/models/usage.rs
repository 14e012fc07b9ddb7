use serde::{Deserialize, Serialize};

/// Token counts reported by a generation call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub const fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub const fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    /// Fold another call's usage into this running total.
    pub fn accumulate(&mut self, other: &Self) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate() {
        let mut total = TokenUsage::default();
        total.accumulate(&TokenUsage::new(100, 40));
        total.accumulate(&TokenUsage::new(20, 10));
        assert_eq!(total, TokenUsage::new(120, 50));
        assert_eq!(total.total(), 170);
    }
}
