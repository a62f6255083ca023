//! # Jarvis
//!
//! Retrieval-augmented question answering over a hosted vector index.
//!
//! A question is embedded, its nearest documents are fetched from the vector
//! index, and the question plus retrieved context is handed to a language
//! model. The answer comes back with the sources it was grounded in.
//!
//! ## Architecture
//!
//! ```text
//!                  ┌────────────┐
//!   HTTP / CLI ──▶ │ Assistant  │──▶ Embedder (OpenAI / Ollama / local)
//!                  │  (rag)     │──▶ VectorIndex (Pinecone / memory)
//!                  └────────────┘──▶ LanguageModel (Anthropic / OpenAI / Ollama)
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Request, response, and index types |
//! | [`embedding`] | Embedder abstraction |
//! | [`index`] | Vector index abstraction |
//! | [`llm`] | Language-model clients |
//! | [`rag`] | Retrieval orchestration |
//! | [`seed`] | Sample data for empty indexes |
//! | [`server`] | HTTP API |

pub mod config;
pub mod embedding;
pub mod index;
pub mod llm;
pub mod models;
pub mod rag;
pub mod seed;
pub mod server;
