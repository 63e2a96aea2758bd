//! Natural-language side of wapi-nlp.
//!
//! Free text like "Create a network with CIDR 10.0.0.0/24" becomes an
//! [`EntitySet`](wn_protocol::EntitySet) (pattern extraction) and an intent
//! (one of the registered operation names) through a tiered classifier:
//!
//! - **Keyword**: verb and object-name heuristics, local and free.
//! - **Zero-shot**: hosted text classifier over the candidate names.
//! - **LLM**: OpenAI-compatible chat completion for whatever is left.

pub mod classify;
pub mod entities;
pub mod error;
pub mod pipeline;
pub mod suggestions;

pub use classify::{Classification, TextClassifier};
pub use entities::{EntityExtractor, EntityTagger, NoopTagger};
pub use error::{NlpError, NlpResult};
pub use pipeline::QueryPipeline;
