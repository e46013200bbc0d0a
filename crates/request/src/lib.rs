//! Analysis request shape and submit-time validation.
//!
//! An analysis request pairs one job description (typed text, an uploaded
//! requirement file, or both) with one or more résumés. Validation runs
//! before any network call is made.

use serde::{Deserialize, Serialize};
use skillmatch_model::{JobRequirement, ParsedCandidateProfile};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Please add at least one resume")]
    NoResumes,
    #[error("Please provide a job description or upload a requirement file")]
    NoJobDescription,
    #[error("Too many resumes: {count} submitted, limit is {limit}")]
    TooManyResumes { count: usize, limit: usize },
}

/// A file as the user uploaded it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub filename: String,
    #[serde(default, skip_serializing)]
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// Read a file from disk, keeping only its final path component as the name.
    pub fn read(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self { filename, content })
    }

    /// Content decoded as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }
}

/// The job side of a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<UploadedFile>,
}

impl JobDescription {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            file: None,
        }
    }

    pub fn from_file(file: UploadedFile) -> Self {
        Self {
            text: None,
            file: Some(file),
        }
    }

    /// Typed text that is not just whitespace.
    pub fn manual_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn is_present(&self) -> bool {
        self.file.is_some() || self.manual_text().is_some()
    }

    /// An uploaded file takes precedence over typed text.
    pub fn is_uploaded(&self) -> bool {
        self.file.is_some()
    }

    /// The text the job is described by.
    pub fn content(&self) -> String {
        match &self.file {
            Some(file) => file.text(),
            None => self.text.clone().unwrap_or_default(),
        }
    }
}

/// One résumé and what parsing extracted from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeSubmission {
    pub file: UploadedFile,
    #[serde(default)]
    pub profile: ParsedCandidateProfile,
}

impl ResumeSubmission {
    pub fn new(file: UploadedFile, profile: ParsedCandidateProfile) -> Self {
        Self { file, profile }
    }

    pub fn filename(&self) -> &str {
        &self.file.filename
    }
}

/// One batch: a job against résumés, in the order the user added them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub job: JobDescription,
    #[serde(default)]
    pub requirement: JobRequirement,
    #[serde(default)]
    pub resumes: Vec<ResumeSubmission>,
}

impl AnalysisRequest {
    pub fn new(job: JobDescription, requirement: JobRequirement) -> Self {
        Self {
            job,
            requirement,
            resumes: Vec::new(),
        }
    }

    pub fn with_resume(mut self, resume: ResumeSubmission) -> Self {
        self.resumes.push(resume);
        self
    }

    /// Check the request before any remote call is made.
    ///
    /// `max_resumes` of `None` means no limit.
    pub fn validate(&self, max_resumes: Option<usize>) -> Result<(), RequestError> {
        if self.resumes.is_empty() {
            return Err(RequestError::NoResumes);
        }

        if !self.job.is_present() {
            return Err(RequestError::NoJobDescription);
        }

        if let Some(limit) = max_resumes {
            if self.resumes.len() > limit {
                return Err(RequestError::TooManyResumes {
                    count: self.resumes.len(),
                    limit,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resume(name: &str) -> ResumeSubmission {
        ResumeSubmission::new(UploadedFile::new(name, b"resume body".to_vec()), ParsedCandidateProfile::default())
    }

    #[test]
    fn test_valid_request() {
        let request = AnalysisRequest::new(JobDescription::from_text("Senior designer"), JobRequirement::default())
            .with_resume(resume("a.pdf"));
        assert_eq!(request.validate(None), Ok(()));
    }

    #[test]
    fn test_no_resumes() {
        let request = AnalysisRequest::new(JobDescription::from_text("Senior designer"), JobRequirement::default());
        assert_eq!(request.validate(None), Err(RequestError::NoResumes));
    }

    #[test]
    fn test_blank_job_text_is_missing() {
        let request = AnalysisRequest::new(JobDescription::from_text("   "), JobRequirement::default())
            .with_resume(resume("a.pdf"));
        assert_eq!(request.validate(None), Err(RequestError::NoJobDescription));
    }

    #[test]
    fn test_requirement_file_is_enough() {
        let job = JobDescription::from_file(UploadedFile::new("jd.txt", b"Figma, Sketch".to_vec()));
        let request = AnalysisRequest::new(job, JobRequirement::default()).with_resume(resume("a.pdf"));
        assert_eq!(request.validate(None), Ok(()));
        assert!(request.job.is_uploaded());
        assert_eq!(request.job.content(), "Figma, Sketch");
    }

    #[test]
    fn test_resume_limit() {
        let request = AnalysisRequest::new(JobDescription::from_text("jd"), JobRequirement::default())
            .with_resume(resume("a.pdf"))
            .with_resume(resume("b.pdf"));
        assert_eq!(
            request.validate(Some(1)),
            Err(RequestError::TooManyResumes { count: 2, limit: 1 })
        );
        assert_eq!(request.validate(Some(2)), Ok(()));
    }

    #[test]
    fn test_empty_resume_file_is_not_rejected() {
        // Empty files fail per item during analysis, not the whole request.
        let empty = ResumeSubmission::new(UploadedFile::new("b.pdf", Vec::new()), ParsedCandidateProfile::default());
        let request = AnalysisRequest::new(JobDescription::from_text("jd"), JobRequirement::default())
            .with_resume(resume("a.pdf"))
            .with_resume(empty);
        assert_eq!(request.validate(None), Ok(()));
    }
}
