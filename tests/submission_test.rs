use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use jobfair_backend::dto::application_dto::ApplyRequest;
use jobfair_backend::models::upload::{CvFile, UploadedFile};
use jobfair_backend::models::vacancy::Vacancy;
use jobfair_backend::services::catalog_service::normalize;
use jobfair_backend::services::submission_service::{
    ApplicationForm, LinkOpener, SubmissionService, SubmissionTransport, SubmitError, SubmitOutcome,
};
use serde_json::json;

#[derive(Debug, Clone, PartialEq)]
enum Event {
    UploadStarted(String),
    UploadFinished,
    Apply(ApplyRequest),
}

/// Records every call in order; the upload yields before finishing.
#[derive(Clone, Default)]
struct RecordingTransport {
    events: Arc<Mutex<Vec<Event>>>,
    fail_upload: bool,
    fail_apply: bool,
}

impl RecordingTransport {
    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubmissionTransport for RecordingTransport {
    async fn upload(&self, job_id: &str, file: &CvFile) -> Result<UploadedFile, SubmitError> {
        self.events
            .lock()
            .unwrap()
            .push(Event::UploadStarted(job_id.to_string()));
        tokio::task::yield_now().await;
        self.events.lock().unwrap().push(Event::UploadFinished);
        if self.fail_upload {
            return Err(SubmitError::Transport("Upload failed".into()));
        }
        Ok(UploadedFile {
            url: format!("https://files.test/{}", file.filename),
            storage_id: format!("cvs/{}/1-{}", job_id, file.filename),
        })
    }

    async fn apply(&self, request: &ApplyRequest) -> Result<(), SubmitError> {
        self.events.lock().unwrap().push(Event::Apply(request.clone()));
        if self.fail_apply {
            return Err(SubmitError::Rejected("Could not save application".into()));
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
struct RecordingOpener {
    opened: Arc<Mutex<Vec<String>>>,
}

impl LinkOpener for RecordingOpener {
    fn open(&self, url: &str) {
        self.opened.lock().unwrap().push(url.to_string());
    }
}

fn vacancy(apply_link: Option<&str>) -> Vacancy {
    let mut raw = json!({
        "id": "42",
        "title": "Data Analyst",
        "company": "Numbers Ltd",
        "location": "Lisbon",
        "type": "Internship",
        "tags": "SQL, Python",
    });
    if let Some(link) = apply_link {
        raw["applyLink"] = json!(link);
    }
    normalize(&raw)
}

fn form() -> ApplicationForm {
    ApplicationForm {
        name: "Grace Hopper".into(),
        email: "grace@example.com".into(),
        phone: "(555) 010-0200".into(),
        cv: Some(CvFile {
            bytes: Bytes::from_static(b"PK\x03\x04"),
            filename: "grace.docx".into(),
            content_type:
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document".into(),
        }),
    }
}

#[tokio::test]
async fn upload_finishes_before_apply_is_built() {
    let transport = RecordingTransport::default();
    let mut service = SubmissionService::new(transport.clone(), RecordingOpener::default());
    let mut form = form();

    let outcome = service.submit(&vacancy(None), &mut form).await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Recorded);

    let events = transport.events();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0], Event::UploadStarted("42".into()));
    assert_eq!(events[1], Event::UploadFinished);
    let Event::Apply(request) = &events[2] else {
        panic!("expected apply last, got {events:?}");
    };
    assert_eq!(request.job_id.as_deref(), Some("42"));
    assert_eq!(request.job_title.as_deref(), Some("Data Analyst"));
    assert_eq!(request.job_type.as_deref(), Some("Internship"));
    assert_eq!(request.tags.as_deref(), Some("SQL,Python"));
    assert_eq!(request.cv_url.as_deref(), Some("https://files.test/grace.docx"));
    assert_eq!(request.cv_blob_id.as_deref(), Some("cvs/42/1-grace.docx"));

    assert!(service.is_submitted("42"));
    assert!(form.name.is_empty() && form.phone.is_empty() && form.cv.is_none());
}

#[tokio::test]
async fn upload_failure_stops_the_submission() {
    let transport = RecordingTransport {
        fail_upload: true,
        ..Default::default()
    };
    let mut service = SubmissionService::new(transport.clone(), RecordingOpener::default());
    let mut form = form();

    let err = service.submit(&vacancy(None), &mut form).await.unwrap_err();
    assert_eq!(err, SubmitError::Transport("Upload failed".into()));
    assert!(!transport.events().iter().any(|e| matches!(e, Event::Apply(_))));
    assert!(!service.is_submitted("42"));
    assert!(form.cv.is_some());
}

#[tokio::test]
async fn apply_failure_leaves_the_form_for_a_retry() {
    let transport = RecordingTransport {
        fail_apply: true,
        ..Default::default()
    };
    let mut service = SubmissionService::new(transport.clone(), RecordingOpener::default());
    let mut form = form();

    let err = service.submit(&vacancy(None), &mut form).await.unwrap_err();
    assert_eq!(err, SubmitError::Rejected("Could not save application".into()));
    assert_eq!(transport.events().len(), 3);
    assert!(!service.is_submitted("42"));
    assert_eq!(form.email, "grace@example.com");
}

#[tokio::test]
async fn external_apply_link_skips_validation_and_network() {
    let transport = RecordingTransport::default();
    let opener = RecordingOpener::default();
    let mut service = SubmissionService::new(transport.clone(), opener.clone());
    let mut empty = ApplicationForm::default();

    let outcome = service
        .submit(&vacancy(Some("https://careers.test/apply")), &mut empty)
        .await
        .unwrap();

    let expected = "https://careers.test/apply?jobId=42&jobTitle=Data+Analyst&company=Numbers+Ltd&location=Lisbon&type=Internship";
    assert_eq!(outcome, SubmitOutcome::Redirected(expected.to_string()));
    assert_eq!(*opener.opened.lock().unwrap(), vec![expected.to_string()]);
    assert!(transport.events().is_empty());
    assert!(service.is_submitted("42"));
}

#[tokio::test]
async fn repeat_submissions_are_allowed() {
    let transport = RecordingTransport::default();
    let mut service = SubmissionService::new(transport.clone(), RecordingOpener::default());

    service.submit(&vacancy(None), &mut form()).await.unwrap();
    service.submit(&vacancy(None), &mut form()).await.unwrap();

    let applies = transport
        .events()
        .into_iter()
        .filter(|e| matches!(e, Event::Apply(_)))
        .count();
    assert_eq!(applies, 2);
}
