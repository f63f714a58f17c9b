//! Reasoner request/response types
//!
//! Provider-agnostic: the pipeline only ever sees a prompt, a schema, and a
//! structured JSON result with its cost.

use serde::{Deserialize, Serialize};

/// A structured reasoning request - everything needed for one call
#[derive(Debug, Clone)]
pub struct ReasonerRequest {
    /// Rendered prompt text (from Handlebars template)
    pub prompt: String,

    /// JSON schema the result must conform to
    pub schema: serde_json::Value,

    /// Max tokens for the response (from config)
    pub max_tokens: u32,
}

impl ReasonerRequest {
    /// Create a request with the default token budget
    pub fn new(prompt: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            prompt: prompt.into(),
            schema,
            max_tokens: 8192,
        }
    }
}

/// The structured result of one reasoner call
#[derive(Debug, Clone)]
pub struct StructuredResult {
    /// JSON value conforming to the requested schema
    pub value: serde_json::Value,

    /// What the call cost
    pub cost: CallCost,
}

/// Cost accounting for reasoner calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CallCost {
    /// Number of reasoner calls made
    pub calls: u32,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl CallCost {
    /// A zero cost (no call was made)
    pub fn zero() -> Self {
        Self::default()
    }

    /// Sum two costs
    pub fn add(self, other: CallCost) -> Self {
        Self {
            calls: self.calls + other.calls,
            input_tokens: self.input_tokens + other.input_tokens,
            output_tokens: self.output_tokens + other.output_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_cost_zero() {
        let cost = CallCost::zero();
        assert_eq!(cost.calls, 0);
        assert_eq!(cost.input_tokens, 0);
        assert_eq!(cost.output_tokens, 0);
    }

    #[test]
    fn test_call_cost_add() {
        let a = CallCost {
            calls: 1,
            input_tokens: 100,
            output_tokens: 50,
        };
        let b = CallCost {
            calls: 1,
            input_tokens: 200,
            output_tokens: 25,
        };
        let sum = a.add(b);
        assert_eq!(sum.calls, 2);
        assert_eq!(sum.input_tokens, 300);
        assert_eq!(sum.output_tokens, 75);
    }
}
