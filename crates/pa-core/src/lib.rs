//! pa-core: Phone Agent Core Library
//!
//! Configuration, the language-model client, reply generation and the
//! customer record store shared by the other phone-agent crates.

pub mod config;
pub mod customer;
pub mod error;
pub mod llm;
pub mod reply;

pub use config::{
    AudioConfig, AudioNaming, Config, CustomersConfig, LlmConfig, LlmProvider, ServerConfig,
    SpeechConfig, SpeechProvider, TwilioConfig,
};
pub use customer::{Customer, CustomerStore, InMemoryCustomerStore, SqliteCustomerStore};
pub use error::{Error, Result};
pub use llm::{LlmClient, Message, MessageContent};
pub use reply::{FailureKind, LlmReplyGenerator, ReplyGenerator, ReplyOutcome};
