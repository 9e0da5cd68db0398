// 📤 Delivery Boundary - hand a finished document to the outside world
//
// The report pipeline ends at "produce document bytes"; this module owns
// what happens next. A delivery target takes the payload plus a suggested
// file name and reports back success, failure or user cancellation. None of
// those outcomes touches registry state: the payload stays reusable for a
// retry.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Fixed file name for the PDF report
pub const REPORT_FILE_NAME: &str = "reporte_ganadero.pdf";

/// Fixed file name for the CSV listing
pub const CSV_FILE_NAME: &str = "reporte_ganadero.csv";

/// What became of a delivery attempt. Never fatal: the presentation layer
/// may show it, log it, or retry with the same payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Payload landed at this path (or was accepted by the share target)
    Delivered(PathBuf),
    /// The user backed out of the platform share dialog
    Cancelled,
    /// The target rejected the payload
    Failed(String),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered(_))
    }

    pub fn describe(&self) -> String {
        match self {
            DeliveryOutcome::Delivered(path) => format!("Guardado en {}", path.display()),
            DeliveryOutcome::Cancelled => "Compartir cancelado".to_string(),
            DeliveryOutcome::Failed(reason) => format!("No se pudo exportar: {reason}"),
        }
    }
}

/// A place finished documents can go: the platform share sheet, a download
/// directory, a test double.
pub trait DeliveryTarget {
    fn name(&self) -> &str;

    fn deliver(&self, file_name: &str, payload: &[u8]) -> DeliveryOutcome;
}

// ============================================================================
// LOCAL FILE TARGET
// ============================================================================

/// Writes payloads into a local directory under their suggested name.
/// This is both the default target and the fallback when no share
/// mechanism is available.
pub struct LocalDirTarget {
    dir: PathBuf,
}

impl LocalDirTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        LocalDirTarget { dir: dir.into() }
    }

    /// Platform download directory, falling back to the current directory
    pub fn default_dir() -> Self {
        let dir = dirs::download_dir().unwrap_or_else(|| PathBuf::from("."));
        LocalDirTarget::new(dir)
    }

    fn write(&self, file_name: &str, payload: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let path = self.dir.join(file_name);
        std::fs::write(&path, payload)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(path)
    }
}

impl DeliveryTarget for LocalDirTarget {
    fn name(&self) -> &str {
        "local"
    }

    fn deliver(&self, file_name: &str, payload: &[u8]) -> DeliveryOutcome {
        match self.write(file_name, payload) {
            Ok(path) => {
                info!(path = %path.display(), "report saved");
                DeliveryOutcome::Delivered(path)
            }
            Err(e) => DeliveryOutcome::Failed(format!("{e:#}")),
        }
    }
}

/// Prefer the share target when one is available; otherwise save locally.
///
/// Cancellation of the share dialog is a final outcome, not a trigger for
/// the fallback: the user said no, and the payload remains in hand for an
/// explicit retry.
pub fn deliver_or_save(
    share: Option<&dyn DeliveryTarget>,
    local: &LocalDirTarget,
    file_name: &str,
    payload: &[u8],
) -> DeliveryOutcome {
    match share {
        Some(target) => target.deliver(file_name, payload),
        None => local.deliver(file_name, payload),
    }
}

/// Convenience for callers that already know the destination directory
pub fn save_to_dir(dir: &Path, file_name: &str, payload: &[u8]) -> DeliveryOutcome {
    LocalDirTarget::new(dir).deliver(file_name, payload)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct CancellingTarget;

    impl DeliveryTarget for CancellingTarget {
        fn name(&self) -> &str {
            "share"
        }

        fn deliver(&self, _file_name: &str, _payload: &[u8]) -> DeliveryOutcome {
            DeliveryOutcome::Cancelled
        }
    }

    #[test]
    fn test_local_target_writes_payload() {
        let dir = tempfile::tempdir().unwrap();
        let target = LocalDirTarget::new(dir.path());

        let outcome = target.deliver(REPORT_FILE_NAME, b"%PDF-1.4 test");
        match outcome {
            DeliveryOutcome::Delivered(path) => {
                assert_eq!(path, dir.path().join(REPORT_FILE_NAME));
                assert_eq!(std::fs::read(path).unwrap(), b"%PDF-1.4 test");
            }
            other => panic!("expected Delivered, got {other:?}"),
        }
    }

    #[test]
    fn test_redelivery_overwrites_with_same_name() {
        let dir = tempfile::tempdir().unwrap();
        let target = LocalDirTarget::new(dir.path());

        target.deliver(CSV_FILE_NAME, b"first");
        let outcome = target.deliver(CSV_FILE_NAME, b"second");

        assert!(outcome.is_delivered());
        assert_eq!(
            std::fs::read(dir.path().join(CSV_FILE_NAME)).unwrap(),
            b"second"
        );
    }

    #[test]
    fn test_unwritable_dir_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let target = LocalDirTarget::new(&blocker);
        let outcome = target.deliver(REPORT_FILE_NAME, b"payload");
        assert!(matches!(outcome, DeliveryOutcome::Failed(_)));
    }

    #[test]
    fn test_share_cancellation_does_not_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalDirTarget::new(dir.path());

        let outcome = deliver_or_save(
            Some(&CancellingTarget),
            &local,
            REPORT_FILE_NAME,
            b"payload",
        );

        assert_eq!(outcome, DeliveryOutcome::Cancelled);
        assert!(!dir.path().join(REPORT_FILE_NAME).exists());
    }

    #[test]
    fn test_no_share_target_saves_locally() {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalDirTarget::new(dir.path());

        let outcome = deliver_or_save(None, &local, REPORT_FILE_NAME, b"payload");
        assert!(outcome.is_delivered());
        assert!(dir.path().join(REPORT_FILE_NAME).exists());
    }
}
