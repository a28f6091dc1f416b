//! Acquisition of ranked records through the conversion/download site.
//!
//! Each item runs a small state machine: submit the link to the converter,
//! wait for the in-progress indicator to clear, poll the destination
//! directory for the arrived file, then rename it into a collision-free
//! canonical location. One wall-clock deadline bounds the whole item end to
//! end, so the run makes forward progress even under repeated stalls. Items
//! run strictly one after another; a failed or timed-out item is logged and
//! skipped, never aborting the batch.

pub mod files;

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::browser::BrowserSession;
use crate::config::AcquireConfig;
use crate::error::{AcquireError, AcquirePhase, BrowserError};
use crate::models::{DocumentRecord, RankedRecord};

/// Aggregate outcome of an acquisition run.
#[derive(Debug, Default)]
pub struct AcquireReport {
    pub completed: Vec<DocumentRecord>,
    pub timed_out: usize,
    pub failed: usize,
}

impl AcquireReport {
    /// Fold one item outcome into the report.
    pub fn record(&mut self, outcome: Result<DocumentRecord, AcquireError>) {
        match outcome {
            Ok(document) => self.completed.push(document),
            Err(AcquireError::TimedOut { .. }) => self.timed_out += 1,
            Err(AcquireError::Failed { .. }) => self.failed += 1,
        }
    }

    pub fn attempted(&self) -> usize {
        self.completed.len() + self.timed_out + self.failed
    }
}

/// Drives the per-item download workflow over a browser session.
pub struct AcquisitionOrchestrator<'a, B: BrowserSession> {
    session: &'a B,
    config: &'a AcquireConfig,
    /// Root the stored `file_path` is relative to.
    download_root: PathBuf,
    /// Query-keyed directory downloads arrive in.
    download_dir: PathBuf,
}

impl<'a, B: BrowserSession> AcquisitionOrchestrator<'a, B> {
    pub fn new(
        session: &'a B,
        config: &'a AcquireConfig,
        download_root: &Path,
        download_dir: &Path,
    ) -> Self {
        Self {
            session,
            config,
            download_root: download_root.to_path_buf(),
            download_dir: download_dir.to_path_buf(),
        }
    }

    /// Acquire every record in ranked order.
    ///
    /// A later item never starts before the earlier one reaches a terminal
    /// state. `on_item` runs after each item reaches one, for progress
    /// display.
    pub async fn acquire_all(
        &self,
        records: &[RankedRecord],
        mut on_item: impl FnMut(),
    ) -> AcquireReport {
        let mut report = AcquireReport::default();
        for (index, record) in records.iter().enumerate() {
            info!(
                "Acquiring {}/{}: {}",
                index + 1,
                records.len(),
                record.url
            );
            let started = std::time::Instant::now();
            let outcome = self.acquire_one(record).await;
            match &outcome {
                Ok(document) => info!(
                    "Acquired {} in {:.2}s",
                    document.file_path,
                    started.elapsed().as_secs_f64()
                ),
                Err(e) => warn!("Skipping {}: {}", record.url, e),
            }
            report.record(outcome);
            on_item();
        }
        report
    }

    /// Run one item through the state machine.
    ///
    /// `Submitted -> AwaitingReady -> Polling -> Completed | TimedOut | Failed`
    pub async fn acquire_one(
        &self,
        record: &RankedRecord,
    ) -> Result<DocumentRecord, AcquireError> {
        let deadline = Instant::now() + Duration::from_secs(self.config.item_timeout_secs);
        self.submit(record, deadline).await?;
        self.await_ready(deadline).await?;
        self.poll_for_file(record, deadline).await
    }

    fn remaining(&self, deadline: Instant) -> Duration {
        deadline.saturating_duration_since(Instant::now())
    }

    /// Per-affordance wait bound, clamped to what is left of the item
    /// deadline at the moment the wait starts.
    fn affordance_bound(&self, deadline: Instant) -> Duration {
        Duration::from_secs(self.config.affordance_timeout_secs).min(self.remaining(deadline))
    }

    /// Hand the record's URL to the converter: navigate, fill the input
    /// field, click the trigger. A missing affordance fails the item.
    async fn submit(
        &self,
        record: &RankedRecord,
        deadline: Instant,
    ) -> Result<(), AcquireError> {
        let phase = AcquirePhase::Submitted;
        let failed = |reason: String| AcquireError::Failed { phase, reason };

        self.session
            .navigate(&self.config.converter_url)
            .await
            .map_err(|e| failed(e.to_string()))?;

        let input = self
            .session
            .wait_for(&self.config.input_selector, self.affordance_bound(deadline))
            .await
            .map_err(|e| failed(e.to_string()))?;
        self.session
            .clear_and_type(&input, &record.url)
            .await
            .map_err(|e| failed(e.to_string()))?;

        let trigger = self
            .session
            .wait_for(&self.config.trigger_selector, self.affordance_bound(deadline))
            .await
            .map_err(|e| failed(e.to_string()))?;
        self.session
            .click(&trigger)
            .await
            .map_err(|e| failed(e.to_string()))?;
        Ok(())
    }

    /// Wait for the in-progress indicator to clear, bounded by the item
    /// deadline.
    async fn await_ready(&self, deadline: Instant) -> Result<(), AcquireError> {
        match self
            .session
            .wait_for_absent(&self.config.busy_selector, self.remaining(deadline))
            .await
        {
            Ok(()) => Ok(()),
            Err(BrowserError::Timeout { .. }) => Err(AcquireError::TimedOut {
                phase: AcquirePhase::AwaitingReady,
                limit_secs: self.config.item_timeout_secs,
            }),
            Err(e) => Err(AcquireError::Failed {
                phase: AcquirePhase::AwaitingReady,
                reason: e.to_string(),
            }),
        }
    }

    /// Poll the destination directory until a matching file arrives, then
    /// claim it under a collision-free canonical name.
    async fn poll_for_file(
        &self,
        record: &RankedRecord,
        deadline: Instant,
    ) -> Result<DocumentRecord, AcquireError> {
        let phase = AcquirePhase::Polling;
        let poll_interval = Duration::from_secs(self.config.poll_interval_secs);

        loop {
            match files::find_by_extension(&self.download_dir, &self.config.file_extension) {
                Ok(Some(arrived)) => {
                    let desired = self.download_dir.join(record.file_name());
                    let destination = files::claim(&arrived, &desired).map_err(|e| {
                        AcquireError::Failed {
                            phase,
                            reason: format!("rename failed: {}", e),
                        }
                    })?;

                    let file_name = destination
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    let file_path = destination
                        .strip_prefix(&self.download_root)
                        .unwrap_or(&destination)
                        .to_string_lossy()
                        .into_owned();
                    return Ok(DocumentRecord::from_ranked(record, file_name, file_path));
                }
                Ok(None) => {}
                Err(e) => {
                    return Err(AcquireError::Failed {
                        phase,
                        reason: e.to_string(),
                    })
                }
            }

            if Instant::now() >= deadline {
                return Err(AcquireError::TimedOut {
                    phase,
                    limit_secs: self.config.item_timeout_secs,
                });
            }
            tokio::time::sleep(poll_interval.min(self.remaining(deadline))).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{FakeBrowser, FakeElement};

    const CONVERTER: &str = "https://converter.test/submit";

    fn config() -> AcquireConfig {
        AcquireConfig {
            converter_url: CONVERTER.to_string(),
            affordance_timeout_secs: 5,
            item_timeout_secs: 30,
            poll_interval_secs: 1,
            ..AcquireConfig::default()
        }
    }

    fn ranked(url: &str) -> RankedRecord {
        RankedRecord {
            title: "Cours de Java".to_string(),
            url: url.to_string(),
            views: 100,
            pages: 20,
            upload_date: "N/A".to_string(),
        }
    }

    fn converter_page() -> Vec<(&'static str, FakeElement)> {
        vec![
            ("#link", FakeElement::new("input")),
            ("button[type='submit']", FakeElement::new("trigger")),
        ]
    }

    #[tokio::test]
    async fn completed_item_claims_and_renames_the_file() {
        let config = config();
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("cours_de_java");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("ilide.info-raw-download.pdf"), b"pdf bytes").unwrap();

        let session = FakeBrowser::new().page(CONVERTER, converter_page());
        let orchestrator =
            AcquisitionOrchestrator::new(&session, &config, root.path(), &dir);

        let record = ranked("https://example.com/document/123/cours-java");
        let document = orchestrator.acquire_one(&record).await.unwrap();

        assert_eq!(document.file_name, "COURS_JAVA.pdf");
        assert_eq!(document.file_path, "cours_de_java/COURS_JAVA.pdf");
        assert_eq!(document.title.as_deref(), Some("Cours de Java"));
        assert!(dir.join("COURS_JAVA.pdf").exists());
        assert!(!dir.join("ilide.info-raw-download.pdf").exists());

        // The link was typed into the input and the trigger clicked
        let typed = session.typed.lock().unwrap();
        assert_eq!(
            typed.as_slice(),
            &[(
                "input".to_string(),
                "https://example.com/document/123/cours-java".to_string()
            )]
        );
        assert_eq!(session.clicked.lock().unwrap().as_slice(), &["trigger".to_string()]);
    }

    #[tokio::test]
    async fn second_completion_gets_a_suffixed_name() {
        let config = config();
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("cours_de_java");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("COURS_JAVA.pdf"), b"earlier run").unwrap();
        std::fs::write(dir.join("arrival.pdf"), b"new file").unwrap();

        let session = FakeBrowser::new().page(CONVERTER, converter_page());
        let orchestrator =
            AcquisitionOrchestrator::new(&session, &config, root.path(), &dir);

        let record = ranked("https://example.com/document/123/cours-java");
        let document = orchestrator.acquire_one(&record).await.unwrap();

        // Deterministic claim: lexicographically first match is the leftover
        // COURS_JAVA.pdf, which renames onto the _1 slot
        assert_eq!(document.file_name, "COURS_JAVA_1.pdf");
        assert!(dir.join("COURS_JAVA_1.pdf").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn never_ready_item_times_out_within_bound() {
        let config = config();
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("cours");
        std::fs::create_dir_all(&dir).unwrap();

        let session = FakeBrowser::new()
            .page(CONVERTER, converter_page())
            .vanish_after(".spinner", u32::MAX);
        let orchestrator =
            AcquisitionOrchestrator::new(&session, &config, root.path(), &dir);

        let err = orchestrator
            .acquire_one(&ranked("https://example.com/document/1/x"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AcquireError::TimedOut {
                phase: AcquirePhase::AwaitingReady,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn file_that_never_arrives_times_out_in_polling() {
        let config = config();
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("cours");
        std::fs::create_dir_all(&dir).unwrap();

        let session = FakeBrowser::new().page(CONVERTER, converter_page());
        let orchestrator =
            AcquisitionOrchestrator::new(&session, &config, root.path(), &dir);

        let err = orchestrator
            .acquire_one(&ranked("https://example.com/document/1/x"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AcquireError::TimedOut {
                phase: AcquirePhase::Polling,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_affordance_fails_the_item() {
        let config = config();
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("cours");
        std::fs::create_dir_all(&dir).unwrap();

        // Converter page exists but has no input field
        let session = FakeBrowser::new().page(CONVERTER, vec![]);
        let orchestrator =
            AcquisitionOrchestrator::new(&session, &config, root.path(), &dir);

        let err = orchestrator
            .acquire_one(&ranked("https://example.com/document/1/x"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AcquireError::Failed {
                phase: AcquirePhase::Submitted,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn late_affordance_waits_stay_inside_the_item_deadline() {
        let config = AcquireConfig {
            converter_url: CONVERTER.to_string(),
            affordance_timeout_secs: 20,
            item_timeout_secs: 25,
            poll_interval_secs: 1,
            ..AcquireConfig::default()
        };
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("cours");
        std::fs::create_dir_all(&dir).unwrap();

        // The input shows up late (18s in, 72 checks at 250ms) and the
        // trigger never does; the trigger wait must be clamped to the 7s
        // left on the deadline, not granted a fresh 20s bound.
        let session = FakeBrowser::new()
            .page(CONVERTER, vec![])
            .appear_after("#link", 72);
        let orchestrator =
            AcquisitionOrchestrator::new(&session, &config, root.path(), &dir);

        let started = Instant::now();
        let err = orchestrator
            .acquire_one(&ranked("https://example.com/document/1/x"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AcquireError::Failed {
                phase: AcquirePhase::Submitted,
                ..
            }
        ));
        assert!(started.elapsed() <= Duration::from_secs(config.item_timeout_secs));
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_item_does_not_block_later_items() {
        let config = config();
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("cours");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("arrival.pdf"), b"second item's file").unwrap();

        // The spinner stays up long enough to time the first item out
        // (30s deadline / 250ms checks = 120 checks), then clears while the
        // second item is waiting.
        let session = FakeBrowser::new()
            .page(CONVERTER, converter_page())
            .vanish_after(".spinner", 180);
        let orchestrator =
            AcquisitionOrchestrator::new(&session, &config, root.path(), &dir);

        let records = vec![
            ranked("https://example.com/document/1/first"),
            ranked("https://example.com/document/2/second"),
        ];
        let report = orchestrator.acquire_all(&records, || {}).await;

        assert_eq!(report.attempted(), 2);
        assert_eq!(report.timed_out, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(report.completed.len(), 1);
        assert_eq!(
            report.completed[0].source_url.as_deref(),
            Some("https://example.com/document/2/second")
        );
    }
}
