//! Collaborator traits: mail dispatch and blob storage.
//!
//! Both are plumbing around the core and are consumed through these
//! traits only; the in-tree implementations live with the service
//! layer.

use serde_json::Value;

use crate::error::LyceumResult;

/// An email to be rendered and delivered by the mail collaborator.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub recipient: String,
    /// Template identifier, resolved by the delivery side.
    pub template: &'static str,
    pub subject: String,
    /// Template context (tokens, links).
    pub context: Value,
}

impl OutgoingMail {
    pub fn new(recipient: impl Into<String>, template: &'static str, subject: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            template,
            subject: subject.into(),
            context: Value::Null,
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }
}

/// Best-effort mail delivery. Callers dispatch fire-and-forget; a
/// failure here must never roll back the mutation that triggered it.
pub trait Mailer: Send + Sync + 'static {
    fn send(&self, mail: OutgoingMail) -> impl Future<Output = Result<(), String>> + Send;
}

/// External object storage for document files.
///
/// `get` and `delete` fail with `BlobMissing` when the key is absent,
/// distinctly from transport errors.
pub trait BlobStore: Send + Sync {
    fn put(&self, key: &str, bytes: Vec<u8>) -> impl Future<Output = LyceumResult<String>> + Send;
    fn get(&self, key: &str) -> impl Future<Output = LyceumResult<Vec<u8>>> + Send;
    fn delete(&self, key: &str) -> impl Future<Output = LyceumResult<()>> + Send;
}
