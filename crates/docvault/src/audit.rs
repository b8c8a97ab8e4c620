//! Audit sink: fire-and-forget operation records.
//!
//! The vault records who did what to which document; where those records go
//! is the deployment's concern. The default sink writes structured tracing
//! events.

use docvault_core::{now_millis, ActorId, DocumentId, GroupId};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Login,
    LoginRejected,
    Upload,
    UploadRolledBack,
    Download,
    UrlIssued,
    UrlDownload,
}

impl AuditAction {
    fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "login",
            AuditAction::LoginRejected => "login-rejected",
            AuditAction::Upload => "upload",
            AuditAction::UploadRolledBack => "upload-rolled-back",
            AuditAction::Download => "download",
            AuditAction::UrlIssued => "url-issued",
            AuditAction::UrlDownload => "url-download",
        }
    }
}

/// One audit record.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub action: AuditAction,
    /// The acting identity, when the operation had one.
    pub actor: Option<ActorId>,
    pub username: Option<String>,
    pub document: Option<DocumentId>,
    pub group: Option<GroupId>,
    /// When the event was recorded (Unix ms).
    pub at: i64,
}

impl AuditEvent {
    /// Create an event stamped with the current time.
    pub fn new(action: AuditAction) -> Self {
        Self {
            action,
            actor: None,
            username: None,
            document: None,
            group: None,
            at: now_millis(),
        }
    }

    pub fn actor(mut self, id: ActorId, username: &str) -> Self {
        self.actor = Some(id);
        self.username = Some(username.to_string());
        self
    }

    pub fn document(mut self, id: DocumentId) -> Self {
        self.document = Some(id);
        self
    }

    pub fn group(mut self, id: GroupId) -> Self {
        self.group = Some(id);
        self
    }
}

/// Fire-and-forget audit record consumer.
///
/// Implementations must not block and must not fail the calling operation.
pub trait AuditSink: Send + Sync {
    /// Record one event.
    fn record(&self, event: AuditEvent);
}

/// Audit sink that emits structured tracing events.
#[derive(Debug, Default, Clone)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        tracing::info!(
            action = event.action.as_str(),
            actor = event.actor.map(|a| a.to_string()),
            username = event.username.as_deref(),
            document = event.document.map(|d| d.to_string()),
            group = event.group.map(|g| g.to_string()),
            at = event.at,
            "audit"
        );
    }
}
