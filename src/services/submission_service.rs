use std::borrow::Cow;
use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::{multipart, Client};
use validator::{Validate, ValidationError};

use crate::dto::application_dto::{ApplyRequest, ApplyResponse, UploadResponse};
use crate::models::upload::{CvFile, UploadedFile};
use crate::models::vacancy::Vacancy;
use crate::utils::validation::{self, MAX_CV_BYTES};

pub const UPLOAD_FAILED: &str = "Upload failed";
pub const APPLY_FAILED: &str = "Could not save application";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// Input rejected before any request was sent.
    #[error("{0}")]
    Validation(String),
    /// The request never produced a usable response.
    #[error("{0}")]
    Transport(String),
    /// The server answered with `ok: false`.
    #[error("{0}")]
    Rejected(String),
}

fn message_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(message_error("blank", "Please enter your full name."));
    }
    Ok(())
}

fn email_shape(value: &str) -> Result<(), ValidationError> {
    if !validation::is_email_shaped(value) {
        return Err(message_error("email", "Please enter a valid email address."));
    }
    Ok(())
}

fn phone_shape(value: &str) -> Result<(), ValidationError> {
    if !validation::is_phone_shaped(value) {
        return Err(message_error("phone", "Please enter a valid phone number."));
    }
    Ok(())
}

/// What the candidate typed into the apply form.
#[derive(Debug, Clone, Default, Validate)]
pub struct ApplicationForm {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(custom(function = "email_shape"))]
    pub email: String,
    #[validate(custom(function = "phone_shape"))]
    pub phone: String,
    pub cv: Option<CvFile>,
}

impl ApplicationForm {
    /// First problem in form order, phrased for the candidate.
    pub fn check(&self) -> Result<(), SubmitError> {
        if let Err(errors) = self.validate() {
            let field_errors = errors.field_errors();
            for field in ["name", "email", "phone"] {
                let first = field_errors
                    .iter()
                    .find(|(name, _)| name.to_string() == field)
                    .and_then(|(_, errs)| errs.first());
                if let Some(err) = first {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Please check your {}.", field));
                    return Err(SubmitError::Validation(message));
                }
            }
        }

        let Some(cv) = &self.cv else {
            return Err(SubmitError::Validation("Please attach your CV.".into()));
        };
        if !validation::is_accepted_cv_type(&cv.content_type) {
            return Err(SubmitError::Validation(
                "Your CV must be a PDF, DOC or DOCX file.".into(),
            ));
        }
        if cv.size() > MAX_CV_BYTES {
            return Err(SubmitError::Validation(
                "Your CV must be 10 MB or smaller.".into(),
            ));
        }
        Ok(())
    }
}

/// The two network calls of a submission.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionTransport: Send + Sync {
    async fn upload(&self, job_id: &str, file: &CvFile) -> Result<UploadedFile, SubmitError>;
    async fn apply(&self, request: &ApplyRequest) -> Result<(), SubmitError>;
}

/// Hands an external apply link to whatever can open it.
pub trait LinkOpener: Send + Sync {
    fn open(&self, url: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Upload (if any) and apply both succeeded.
    Recorded,
    /// The vacancy applies elsewhere; this URL was opened instead.
    Redirected(String),
}

/// The vacancy's external link with the job snapshot appended as query parameters.
/// Links that do not parse as absolute URLs get the query appended verbatim.
pub fn external_apply_url(link: &str, vacancy: &Vacancy) -> String {
    let pairs = [
        ("jobId", vacancy.id.as_str()),
        ("jobTitle", vacancy.title.as_str()),
        ("company", vacancy.company.as_str()),
        ("location", vacancy.location.as_str()),
        ("type", vacancy.job_type.as_str()),
    ];

    match url::Url::parse(link) {
        Ok(mut url) => {
            url.query_pairs_mut().extend_pairs(pairs);
            url.to_string()
        }
        Err(_) => {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(pairs)
                .finish();
            let separator = if link.contains('?') { '&' } else { '?' };
            format!("{}{}{}", link, separator, query)
        }
    }
}

/// Drives one candidate's submissions: upload the CV, then record the application.
///
/// The upload always finishes before the apply request is built. An uploaded file
/// is not removed if the apply step then fails, and nothing is retried.
pub struct SubmissionService<T, O> {
    transport: T,
    opener: O,
    submitted: HashSet<String>,
}

impl<T: SubmissionTransport, O: LinkOpener> SubmissionService<T, O> {
    pub fn new(transport: T, opener: O) -> Self {
        Self {
            transport,
            opener,
            submitted: HashSet::new(),
        }
    }

    pub fn is_submitted(&self, job_id: &str) -> bool {
        self.submitted.contains(job_id)
    }

    /// On success the form is cleared and the job is marked as applied to.
    /// Repeat submissions for the same job are allowed.
    pub async fn submit(
        &mut self,
        vacancy: &Vacancy,
        form: &mut ApplicationForm,
    ) -> Result<SubmitOutcome, SubmitError> {
        if let Some(link) = vacancy.apply_link.as_deref().filter(|l| !l.trim().is_empty()) {
            let url = external_apply_url(link, vacancy);
            self.opener.open(&url);
            self.finish(vacancy, form);
            return Ok(SubmitOutcome::Redirected(url));
        }

        form.check()?;

        let uploaded = match &form.cv {
            Some(cv) => Some(self.transport.upload(&vacancy.id, cv).await?),
            None => None,
        };

        let request = ApplyRequest::for_vacancy(
            vacancy,
            form.name.trim(),
            form.email.trim(),
            form.phone.trim(),
            uploaded.as_ref(),
        );
        self.transport.apply(&request).await?;

        tracing::info!(job_id = %vacancy.id, "Application submitted");
        self.finish(vacancy, form);
        Ok(SubmitOutcome::Recorded)
    }

    fn finish(&mut self, vacancy: &Vacancy, form: &mut ApplicationForm) {
        self.submitted.insert(vacancy.id.clone());
        *form = ApplicationForm::default();
    }
}

/// Talks to the upload and apply endpoints of a running server.
#[derive(Clone)]
pub struct HttpSubmissionTransport {
    client: Client,
    base_url: String,
}

impl HttpSubmissionTransport {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

fn transport_error(err: reqwest::Error, fallback: &str) -> SubmitError {
    let message = err.to_string();
    SubmitError::Transport(if message.is_empty() {
        fallback.to_string()
    } else {
        message
    })
}

/// Server error message when present, else the body text, else `fallback`.
fn rejection(error: Option<String>, body: &str, fallback: &str) -> SubmitError {
    let message = error
        .filter(|e| !e.trim().is_empty())
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| fallback.to_string());
    SubmitError::Rejected(message)
}

#[async_trait]
impl SubmissionTransport for HttpSubmissionTransport {
    async fn upload(&self, job_id: &str, file: &CvFile) -> Result<UploadedFile, SubmitError> {
        let part = multipart::Part::bytes(file.bytes.to_vec())
            .file_name(file.filename.clone())
            .mime_str(&file.content_type)
            .map_err(|e| transport_error(e, UPLOAD_FAILED))?;
        let form = multipart::Form::new()
            .text("jobId", job_id.to_string())
            .part("file", part);

        let resp = self
            .client
            .post(format!("{}/api/upload", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error(e, UPLOAD_FAILED))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| transport_error(e, UPLOAD_FAILED))?;

        match serde_json::from_str::<UploadResponse>(&body) {
            Ok(parsed) if status.is_success() && parsed.ok => Ok(UploadedFile {
                url: parsed.cv_url.unwrap_or_default(),
                storage_id: parsed.cv_blob_id.unwrap_or_default(),
            }),
            Ok(parsed) => Err(rejection(parsed.error, "", UPLOAD_FAILED)),
            Err(_) => Err(rejection(None, &body, UPLOAD_FAILED)),
        }
    }

    async fn apply(&self, request: &ApplyRequest) -> Result<(), SubmitError> {
        let resp = self
            .client
            .post(format!("{}/api/apply", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(e, APPLY_FAILED))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| transport_error(e, APPLY_FAILED))?;

        match serde_json::from_str::<ApplyResponse>(&body) {
            Ok(parsed) if status.is_success() && parsed.ok => Ok(()),
            Ok(parsed) => Err(rejection(parsed.error, "", APPLY_FAILED)),
            Err(_) => Err(rejection(None, &body, APPLY_FAILED)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use mockall::Sequence;

    struct NoopOpener;

    impl LinkOpener for NoopOpener {
        fn open(&self, _url: &str) {}
    }

    fn vacancy() -> Vacancy {
        crate::services::catalog_service::normalize(&serde_json::json!({
            "id": "job-1",
            "title": "Backend Engineer",
            "company": "Acme",
            "tags": ["Rust", "Postgres"],
        }))
    }

    fn form() -> ApplicationForm {
        ApplicationForm {
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            phone: "+1 555 0100".into(),
            cv: Some(CvFile {
                bytes: Bytes::from_static(b"%PDF-1.7"),
                filename: "ada.pdf".into(),
                content_type: "application/pdf".into(),
            }),
        }
    }

    #[tokio::test]
    async fn upload_result_flows_into_apply() {
        let mut seq = Sequence::new();
        let mut transport = MockSubmissionTransport::new();
        transport
            .expect_upload()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|job_id, file| job_id.to_string() == "job-1" && file.filename == "ada.pdf")
            .returning(|_, _| {
                Ok(UploadedFile {
                    url: "https://blob/cv.pdf".into(),
                    storage_id: "cvs/job-1/1-ada.pdf".into(),
                })
            });
        transport
            .expect_apply()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| {
                req.cv_url.as_deref() == Some("https://blob/cv.pdf")
                    && req.cv_blob_id.as_deref() == Some("cvs/job-1/1-ada.pdf")
                    && req.tags.as_deref() == Some("Rust,Postgres")
                    && req.job_title.as_deref() == Some("Backend Engineer")
            })
            .returning(|_| Ok(()));

        let mut service = SubmissionService::new(transport, NoopOpener);
        let mut form = form();
        let outcome = service.submit(&vacancy(), &mut form).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Recorded);
        assert!(service.is_submitted("job-1"));
        assert!(form.name.is_empty() && form.email.is_empty() && form.cv.is_none());
    }

    #[tokio::test]
    async fn failed_upload_never_reaches_apply() {
        let mut transport = MockSubmissionTransport::new();
        transport
            .expect_upload()
            .returning(|_, _| Err(SubmitError::Rejected(UPLOAD_FAILED.into())));
        transport.expect_apply().times(0);

        let mut service = SubmissionService::new(transport, NoopOpener);
        let mut form = form();
        let err = service.submit(&vacancy(), &mut form).await.unwrap_err();

        assert_eq!(err, SubmitError::Rejected("Upload failed".into()));
        assert!(!service.is_submitted("job-1"));
        assert_eq!(form.name, "Ada Lovelace");
    }

    async fn rejected_before_sending(form: ApplicationForm) -> SubmitError {
        let mut transport = MockSubmissionTransport::new();
        transport.expect_upload().times(0);
        transport.expect_apply().times(0);
        let mut service = SubmissionService::new(transport, NoopOpener);
        let mut form = form;
        service.submit(&vacancy(), &mut form).await.unwrap_err()
    }

    fn invalid(message: &str) -> SubmitError {
        SubmitError::Validation(message.to_string())
    }

    #[tokio::test]
    async fn invalid_input_makes_no_calls() {
        let mut f = form();
        f.name = "  ".into();
        assert_eq!(rejected_before_sending(f).await, invalid("Please enter your full name."));

        let mut f = form();
        f.email = "ada@example".into();
        assert_eq!(rejected_before_sending(f).await, invalid("Please enter a valid email address."));

        let mut f = form();
        f.phone = "12-34".into();
        assert_eq!(rejected_before_sending(f).await, invalid("Please enter a valid phone number."));

        let mut f = form();
        f.cv = None;
        assert_eq!(rejected_before_sending(f).await, invalid("Please attach your CV."));

        let mut f = form();
        if let Some(cv) = f.cv.as_mut() {
            cv.content_type = "image/png".into();
        }
        assert_eq!(
            rejected_before_sending(f).await,
            invalid("Your CV must be a PDF, DOC or DOCX file.")
        );

        let mut f = form();
        if let Some(cv) = f.cv.as_mut() {
            cv.bytes = Bytes::from(vec![0u8; MAX_CV_BYTES as usize + 1]);
        }
        assert_eq!(rejected_before_sending(f).await, invalid("Your CV must be 10 MB or smaller."));
    }

    #[test]
    fn name_is_checked_before_email() {
        let f = ApplicationForm::default();
        assert_eq!(f.check(), Err(invalid("Please enter your full name.")));
    }

    #[test]
    fn external_url_appends_job_metadata() {
        let mut v = vacancy();
        v.location = "Remote / EU".into();
        let url = external_apply_url("https://jobs.example.com/apply?src=fair", &v);
        assert_eq!(
            url,
            "https://jobs.example.com/apply?src=fair&jobId=job-1&jobTitle=Backend+Engineer&company=Acme&location=Remote+%2F+EU&type=Full-time"
        );
        assert!(external_apply_url("not a url", &v).starts_with("not a url?jobId=job-1"));
    }

    #[test]
    fn external_url_keeps_metadata_out_of_the_fragment() {
        let url = external_apply_url("https://jobs.example.com/apply#form", &vacancy());
        assert_eq!(
            url,
            "https://jobs.example.com/apply?jobId=job-1&jobTitle=Backend+Engineer&company=Acme&location=&type=Full-time#form"
        );
        let parsed = url::Url::parse(&url).unwrap();
        assert_eq!(parsed.fragment(), Some("form"));
        assert!(parsed.query_pairs().any(|(k, v)| k == "jobId" && v == "job-1"));
    }

    #[test]
    fn rejection_prefers_server_message() {
        assert_eq!(
            rejection(Some("No file uploaded".into()), "", UPLOAD_FAILED),
            SubmitError::Rejected("No file uploaded".into())
        );
        assert_eq!(
            rejection(None, "Bad Gateway", APPLY_FAILED),
            SubmitError::Rejected("Bad Gateway".into())
        );
        assert_eq!(
            rejection(Some(" ".into()), "", APPLY_FAILED),
            SubmitError::Rejected(APPLY_FAILED.into())
        );
    }
}
