//! Background Analysis Module
//!
//! Runs one screenshot analysis on a worker thread so the UI stays
//! responsive. Each job carries the generation it was started for; the
//! session uses it to discard results that arrive after a reset.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use crate::ai::analyzer::Analyzer;
use crate::ai::client::AiError;
use crate::image::ImagePayload;
use crate::models::RequirementItem;

pub type AnalysisResult = Result<Vec<RequirementItem>, AiError>;

/// An analysis running on a worker thread
pub struct AnalysisJob {
    generation: u64,
    result_rx: mpsc::Receiver<AnalysisResult>,
    thread_handle: Option<JoinHandle<()>>,
}

impl AnalysisJob {
    /// Start analyzing `image` in the background
    pub fn spawn(
        analyzer: Analyzer,
        image: ImagePayload,
        api_key: Option<String>,
        generation: u64,
    ) -> Self {
        let (result_tx, result_rx) = mpsc::channel();

        let thread_handle = thread::spawn(move || {
            log::debug!("Analysis job {} started", generation);
            let result = analyzer.analyze(&image, api_key.as_deref());
            if let Err(e) = &result {
                log::warn!("Analysis job {} failed: {}", generation, e);
            }
            // Receiver gone means the job was abandoned
            let _ = result_tx.send(result);
        });

        Self {
            generation,
            result_rx,
            thread_handle: Some(thread_handle),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Poll for the result without blocking
    ///
    /// Returns `None` while the analysis is still running.
    pub fn try_finish(&mut self) -> Option<AnalysisResult> {
        match self.result_rx.try_recv() {
            Ok(result) => {
                self.join();
                Some(result)
            }
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => {
                self.join();
                Some(Err(AiError::RequestFailed(
                    "Analysis worker exited without a result".to_string(),
                )))
            }
        }
    }

    /// Block until the analysis finishes
    pub fn wait(mut self) -> AnalysisResult {
        let result = self.result_rx.recv().unwrap_or_else(|_| {
            Err(AiError::RequestFailed(
                "Analysis worker exited without a result".to_string(),
            ))
        });
        self.join();
        result
    }

    fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AnalysisJob {
    fn drop(&mut self) {
        // An abandoned job is left to finish on its own; its send fails
        // harmlessly once the receiver is gone
        if let Some(handle) = self.thread_handle.take() {
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::client::MockVisionClient;
    use crate::image::DEFAULT_MAX_IMAGE_BYTES;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn png() -> ImagePayload {
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.push(0);
        ImagePayload::from_bytes(bytes, DEFAULT_MAX_IMAGE_BYTES).unwrap()
    }

    fn poll(job: &mut AnalysisJob) -> AnalysisResult {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(result) = job.try_finish() {
                return result;
            }
            assert!(Instant::now() < deadline, "analysis did not finish");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_job_delivers_items() {
        let analyzer = Analyzer::new(Arc::new(MockVisionClient::new(
            r#"[{"region": "Nav", "functionName": "Login"}]"#,
        )));
        let mut job = AnalysisJob::spawn(analyzer, png(), Some("key".to_string()), 7);
        assert_eq!(job.generation(), 7);

        let items = poll(&mut job).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].function_name, "Login");
    }

    #[test]
    fn test_job_delivers_errors() {
        let analyzer = Analyzer::new(Arc::new(MockVisionClient::new("[]")));
        let job = AnalysisJob::spawn(analyzer, png(), None, 1);
        assert!(matches!(job.wait(), Err(AiError::MissingCredential)));
    }
}
