pub mod cloudflare;
pub mod config;
pub mod error;
pub mod kv;
pub mod model;

pub use cloudflare::{CloudflareClient, CloudflareKv, WorkersAiClient};
pub use config::{Config, KvBackend};
pub use error::{ServiceError, ServiceResult};
pub use kv::{KvStore, MemoryKv};
pub use model::{ChatMessage, ModelOutput, ModelRequest, TextModel};
