//! Poll-loop test suite for the booking caller.  Every polling test runs on
//! tokio's paused clock, so deadlines measured in minutes finish in
//! microseconds and nothing here ever sleeps for real.

use async_trait::async_trait;
use maitred::caller::{await_transcript, call_and_transcribe, place_call};
use maitred::providers::{CallStatus, VoiceProvider};
use maitred::{BookingDetails, CallJobStatus, ConciergeError, PollPolicy};
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn details() -> BookingDetails {
    BookingDetails {
        phone_number: "+33601420712".into(),
        venue_name: "Restaurant Dupont".into(),
        party_size: 2,
        date: "2025-10-19".into(),
        time: "19:00".into(),
        reservation_name: "Mr Dupont".into(),
    }
}

fn quick_policy() -> PollPolicy {
    PollPolicy {
        interval: Duration::from_secs(2),
        deadline: Duration::from_secs(60),
    }
}

/// How the mock answers the corrected-transcript fetch.
enum Corrected {
    Entries(Vec<&'static str>),
    Empty,
    Fails,
}

/// Voice provider double: completes after a configurable number of status
/// polls, with configurable corrected-transcript behavior.
struct MockVoice {
    reject_placement: bool,
    /// Polls that report "not done yet" before the call completes.
    pending_polls: usize,
    /// Status string reported once pending polls are exhausted.
    terminal_status: &'static str,
    /// Leading status fetches that error out (transient network trouble).
    flaky_polls: usize,
    corrected: Corrected,
    status_calls: AtomicUsize,
}

impl MockVoice {
    fn completing_after(pending_polls: usize, corrected: Corrected) -> Self {
        Self {
            reject_placement: false,
            pending_polls,
            terminal_status: "completed",
            flaky_polls: 0,
            corrected,
            status_calls: AtomicUsize::new(0),
        }
    }

    fn polls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VoiceProvider for MockVoice {
    async fn start_call(
        &self,
        _phone_number: &str,
        _script: &str,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        if self.reject_placement {
            return Err("voice provider rejected the call (status: error)".into());
        }
        Ok("call-123".to_string())
    }

    async fn call_status(
        &self,
        _call_id: &str,
    ) -> Result<CallStatus, Box<dyn Error + Send + Sync>> {
        let poll = self.status_calls.fetch_add(1, Ordering::SeqCst);
        if poll < self.flaky_polls {
            return Err("connection reset".into());
        }
        if poll < self.flaky_polls + self.pending_polls {
            return Ok(CallStatus {
                completed: false,
                status: Some("in-progress".to_string()),
                ..CallStatus::default()
            });
        }
        if self.terminal_status != "completed" {
            return Ok(CallStatus {
                completed: false,
                status: Some(self.terminal_status.to_string()),
                ..CallStatus::default()
            });
        }
        Ok(CallStatus {
            completed: true,
            status: Some("completed".to_string()),
            concatenated_transcript: Some("full raw transcript".to_string()),
            summary: Some("Table for 2 booked under Mr Dupont.".to_string()),
        })
    }

    async fn corrected_transcript(
        &self,
        _call_id: &str,
    ) -> Result<Vec<String>, Box<dyn Error + Send + Sync>> {
        match &self.corrected {
            Corrected::Entries(parts) => Ok(parts.iter().map(|p| p.to_string()).collect()),
            Corrected::Empty => Ok(Vec::new()),
            Corrected::Fails => Err("correction service is down".into()),
        }
    }
}

/// A provider that never completes, for the timeout path.
struct NeverCompletes {
    status_calls: AtomicUsize,
}

#[async_trait]
impl VoiceProvider for NeverCompletes {
    async fn start_call(
        &self,
        _phone_number: &str,
        _script: &str,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        Ok("call-forever".to_string())
    }

    async fn call_status(
        &self,
        _call_id: &str,
    ) -> Result<CallStatus, Box<dyn Error + Send + Sync>> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        Ok(CallStatus {
            completed: false,
            status: Some("in-progress".to_string()),
            ..CallStatus::default()
        })
    }

    async fn corrected_transcript(
        &self,
        _call_id: &str,
    ) -> Result<Vec<String>, Box<dyn Error + Send + Sync>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn place_call_returns_a_pending_job() {
    let provider = MockVoice::completing_after(0, Corrected::Empty);
    let job = place_call(&provider, &details()).await.unwrap();
    assert_eq!(job.call_id, "call-123");
    assert_eq!(job.status, CallJobStatus::Pending);
    assert!(job.transcript.is_none());
}

#[tokio::test]
async fn rejected_placement_is_fatal_for_the_attempt() {
    let provider = MockVoice {
        reject_placement: true,
        ..MockVoice::completing_after(0, Corrected::Empty)
    };
    let err = place_call(&provider, &details()).await.unwrap_err();
    assert!(matches!(err, ConciergeError::CallPlacement(_)));
}

#[tokio::test(start_paused = true)]
async fn polls_until_completed_then_returns_the_summary() {
    let provider = MockVoice::completing_after(3, Corrected::Fails);
    let mut job = place_call(&provider, &details()).await.unwrap();

    let transcript = await_transcript(&provider, &mut job, quick_policy())
        .await
        .unwrap();

    // Correction failed, so the completion payload's summary comes back.
    assert_eq!(transcript, "Table for 2 booked under Mr Dupont.");
    assert_eq!(job.status, CallJobStatus::Completed);
    assert_eq!(job.transcript.as_deref(), Some(transcript.as_str()));
    assert_eq!(provider.polls(), 4);
}

#[tokio::test(start_paused = true)]
async fn corrected_transcript_wins_when_available() {
    let provider = MockVoice::completing_after(
        1,
        Corrected::Entries(vec!["Hello?", "A table for 2, please.", "Noted!"]),
    );
    let mut job = place_call(&provider, &details()).await.unwrap();

    let transcript = await_transcript(&provider, &mut job, quick_policy())
        .await
        .unwrap();
    assert_eq!(transcript, "Hello?\nA table for 2, please.\nNoted!");
}

#[tokio::test(start_paused = true)]
async fn empty_correction_falls_back_to_the_completion_payload() {
    let provider = MockVoice::completing_after(0, Corrected::Empty);
    let mut job = place_call(&provider, &details()).await.unwrap();

    let transcript = await_transcript(&provider, &mut job, quick_policy())
        .await
        .unwrap();
    assert_eq!(transcript, "Table for 2 booked under Mr Dupont.");
}

#[tokio::test(start_paused = true)]
async fn transient_status_errors_do_not_abort_the_wait() {
    let provider = MockVoice {
        flaky_polls: 2,
        ..MockVoice::completing_after(1, Corrected::Empty)
    };
    let mut job = place_call(&provider, &details()).await.unwrap();

    let transcript = await_transcript(&provider, &mut job, quick_policy())
        .await
        .unwrap();
    assert_eq!(transcript, "Table for 2 booked under Mr Dupont.");
    assert_eq!(job.status, CallJobStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn deadline_elapsing_is_a_timeout_and_the_job_is_marked() {
    let provider = NeverCompletes {
        status_calls: AtomicUsize::new(0),
    };
    let mut job = place_call(&provider, &details()).await.unwrap();

    let policy = PollPolicy {
        interval: Duration::from_secs(2),
        deadline: Duration::from_secs(10),
    };
    let err = await_transcript(&provider, &mut job, policy)
        .await
        .unwrap_err();

    match err {
        ConciergeError::CallTimeout { call_id, waited } => {
            assert_eq!(call_id, "call-forever");
            assert_eq!(waited, Duration::from_secs(10));
        }
        other => panic!("expected CallTimeout, got {:?}", other),
    }
    assert_eq!(job.status, CallJobStatus::TimedOut);
    // The poll cadence is one probe every interval until the deadline.
    assert_eq!(provider.status_calls.load(Ordering::SeqCst), 6);
}

#[tokio::test(start_paused = true)]
async fn provider_reported_failure_ends_the_job_as_failed() {
    let provider = MockVoice {
        terminal_status: "failed",
        ..MockVoice::completing_after(1, Corrected::Empty)
    };
    let mut job = place_call(&provider, &details()).await.unwrap();

    let err = await_transcript(&provider, &mut job, quick_policy())
        .await
        .unwrap_err();
    assert!(matches!(err, ConciergeError::CallPlacement(_)));
    assert_eq!(job.status, CallJobStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn call_and_transcribe_goes_end_to_end() {
    let provider = MockVoice::completing_after(2, Corrected::Entries(vec!["All booked."]));
    let job = call_and_transcribe(&provider, &details(), quick_policy())
        .await
        .unwrap();
    assert_eq!(job.status, CallJobStatus::Completed);
    assert_eq!(job.transcript.as_deref(), Some("All booked."));
}
