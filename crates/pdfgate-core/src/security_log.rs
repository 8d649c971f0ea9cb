use std::fmt;

use tracing::Level;

#[derive(Debug, Clone, Copy)]
pub enum SecurityDomain {
    Actions,
    Encryption,
    Document,
    Config,
}

impl SecurityDomain {
    pub fn as_str(self) -> &'static str {
        match self {
            SecurityDomain::Actions => "pdf.actions",
            SecurityDomain::Encryption => "pdf.encryption",
            SecurityDomain::Document => "pdf.document",
            SecurityDomain::Config => "runtime.config",
        }
    }
}

impl fmt::Display for SecurityDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured event tagged `security = true` so it can be routed apart
/// from ordinary diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct SecurityEvent<'a> {
    pub level: Level,
    pub domain: SecurityDomain,
    pub kind: &'a str,
    pub path: Option<&'a str>,
    pub object_id: Option<&'a str>,
    pub location: Option<&'a str>,
    pub message: &'a str,
}

impl<'a> SecurityEvent<'a> {
    pub fn new(level: Level, domain: SecurityDomain, kind: &'a str, message: &'a str) -> Self {
        Self { level, domain, kind, path: None, object_id: None, location: None, message }
    }

    pub fn emit(self) {
        match self.level {
            Level::TRACE => tracing::event!(
                Level::TRACE,
                security = true,
                domain = %self.domain,
                kind = self.kind,
                path = self.path,
                object_id = self.object_id,
                location = self.location,
                "{message}",
                message = self.message
            ),
            Level::DEBUG => tracing::event!(
                Level::DEBUG,
                security = true,
                domain = %self.domain,
                kind = self.kind,
                path = self.path,
                object_id = self.object_id,
                location = self.location,
                "{message}",
                message = self.message
            ),
            Level::INFO => tracing::event!(
                Level::INFO,
                security = true,
                domain = %self.domain,
                kind = self.kind,
                path = self.path,
                object_id = self.object_id,
                location = self.location,
                "{message}",
                message = self.message
            ),
            Level::WARN => tracing::event!(
                Level::WARN,
                security = true,
                domain = %self.domain,
                kind = self.kind,
                path = self.path,
                object_id = self.object_id,
                location = self.location,
                "{message}",
                message = self.message
            ),
            Level::ERROR => tracing::event!(
                Level::ERROR,
                security = true,
                domain = %self.domain,
                kind = self.kind,
                path = self.path,
                object_id = self.object_id,
                location = self.location,
                "{message}",
                message = self.message
            ),
        }
    }
}
