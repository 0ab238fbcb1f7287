//! Numeric tools: averages and sequences.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Tool;
use crate::resources::ResourceStore;

/// Average a list of numbers.
pub struct CalculateAverage;

#[async_trait]
impl Tool for CalculateAverage {
    fn name(&self) -> &str {
        "calculate_average"
    }

    fn description(&self) -> &str {
        "Calculate the average of a list of numbers. Returns the arithmetic mean."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "numbers": {
                    "type": "array",
                    "items": {"type": "number"},
                    "description": "The numbers to average"
                }
            },
            "required": ["numbers"]
        })
    }

    async fn execute(&self, args: Value, _store: &ResourceStore) -> anyhow::Result<String> {
        let numbers = parse_numbers(&args["numbers"])?;
        if numbers.is_empty() {
            return Err(anyhow::anyhow!("Cannot average an empty list"));
        }
        let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
        Ok(mean.to_string())
    }
}

fn parse_numbers(value: &Value) -> anyhow::Result<Vec<f64>> {
    let items = value
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("'numbers' must be an array"))?;
    items
        .iter()
        .map(|v| {
            v.as_f64()
                .ok_or_else(|| anyhow::anyhow!("'numbers' must contain only numbers, got {}", v))
        })
        .collect()
}

/// Generate the Fibonacci sequence.
pub struct Fibonacci;

#[async_trait]
impl Tool for Fibonacci {
    fn name(&self) -> &str {
        "fibonacci"
    }

    fn description(&self) -> &str {
        "Generate the first n Fibonacci numbers. Returns them as a JSON array."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "n": {
                    "type": "integer",
                    "description": "How many Fibonacci numbers to generate"
                }
            },
            "required": ["n"]
        })
    }

    async fn execute(&self, args: Value, _store: &ResourceStore) -> anyhow::Result<String> {
        let n = args["n"]
            .as_i64()
            .ok_or_else(|| anyhow::anyhow!("'n' must be an integer"))?;
        if n > 92 {
            // fib(93) overflows u64
            return Err(anyhow::anyhow!("'n' must be at most 92"));
        }
        let sequence = fibonacci_sequence(n.max(0) as usize);
        Ok(serde_json::to_string(&sequence)?)
    }
}

fn fibonacci_sequence(n: usize) -> Vec<u64> {
    let mut sequence = Vec::with_capacity(n);
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 0..n {
        sequence.push(a);
        let next = a + b;
        a = b;
        b = next;
    }
    sequence
}
