use serde::{Deserialize, Serialize};

/// A single provider score, kept on the provider's own scale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub source: String,
    pub value: f64,
    pub max: f64,
}
