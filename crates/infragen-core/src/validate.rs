//! Response validation: a cheap check that generated text looks like
//! Terraform.
//!
//! The check is advisory by default. What a miss does is decided by the
//! configured [`ValidationPolicy`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::DomainProfile;
use crate::invoker::GenerationOutcome;

/// Reason appended to the error envelope when a miss is rejected.
pub const REJECTED_REASON: &str = "generated response does not look like Terraform code";

/// What the validator found in a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationVerdict<'a> {
    /// A fenced block tagged with one of the profile's fence tags.
    pub fenced_block: bool,
    /// The first validation keyword found, if any.
    pub keyword: Option<&'a str>,
}

impl ValidationVerdict<'_> {
    pub fn is_valid(&self) -> bool {
        self.fenced_block || self.keyword.is_some()
    }
}

/// Inspect `text` for a tagged fence or a domain keyword.
pub fn check_response<'p>(profile: &'p DomainProfile, text: &str) -> ValidationVerdict<'p> {
    let fenced_block = profile
        .fence_tags
        .iter()
        .any(|tag| text.contains(&format!("```{tag}")));

    let lower = text.to_lowercase();
    let keyword = profile
        .validation_keywords
        .iter()
        .find(|k| lower.contains(k.as_str()))
        .map(String::as_str);

    ValidationVerdict {
        fenced_block,
        keyword,
    }
}

/// Whether `text` plausibly satisfies the profile's output contract.
pub fn looks_valid(profile: &DomainProfile, text: &str) -> bool {
    check_response(profile, text).is_valid()
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// What to do when a successful generation fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Skip the check.
    Ignore,
    /// Log a warning and return the text anyway.
    #[default]
    Warn,
    /// Turn the miss into a failure outcome.
    Reject,
}

impl fmt::Display for ValidationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ignore => "ignore",
            Self::Warn => "warn",
            Self::Reject => "reject",
        };
        f.write_str(s)
    }
}

impl FromStr for ValidationPolicy {
    type Err = ValidationPolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ignore" => Ok(Self::Ignore),
            "warn" => Ok(Self::Warn),
            "reject" => Ok(Self::Reject),
            other => Err(ValidationPolicyParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`ValidationPolicy`] string.
#[derive(Debug, Clone)]
pub struct ValidationPolicyParseError(pub String);

impl fmt::Display for ValidationPolicyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid validation policy: {:?} (expected ignore, warn, or reject)",
            self.0
        )
    }
}

impl std::error::Error for ValidationPolicyParseError {}

/// Apply `policy` to an outcome. Failures pass through untouched.
pub fn apply_policy(
    policy: ValidationPolicy,
    profile: &DomainProfile,
    outcome: GenerationOutcome,
) -> GenerationOutcome {
    let Some(text) = outcome.text() else {
        return outcome;
    };

    if policy == ValidationPolicy::Ignore {
        debug!("response validation skipped");
        return outcome;
    }

    let verdict = check_response(profile, text);
    if verdict.is_valid() {
        debug!(
            fenced_block = verdict.fenced_block,
            keyword = verdict.keyword.unwrap_or(""),
            "response looks valid"
        );
        return outcome;
    }

    match policy {
        ValidationPolicy::Reject => {
            warn!("generated response does not look like Terraform code; rejecting");
            GenerationOutcome::failure(REJECTED_REASON)
        }
        _ => {
            warn!("generated response may not contain valid Terraform code");
            outcome
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> DomainProfile {
        DomainProfile::terraform()
    }

    #[test]
    fn fenced_hcl_block_is_valid_without_keywords() {
        let text = "```hcl\nfoo = \"bar\"\n```";
        let profile = profile();
        let verdict = check_response(&profile, text);
        assert!(verdict.fenced_block);
        assert!(verdict.keyword.is_none());
        assert!(verdict.is_valid());
    }

    #[test]
    fn terraform_fence_tag_is_accepted() {
        assert!(looks_valid(&profile(), "```terraform\nx = 1\n```"));
    }

    #[test]
    fn plain_keyword_is_valid() {
        let profile = profile();
        let verdict = check_response(&profile, "You need a PROVIDER block first.");
        assert!(!verdict.fenced_block);
        assert_eq!(verdict.keyword, Some("provider"));
        assert!(verdict.is_valid());
    }

    #[test]
    fn neither_fence_nor_keyword_is_invalid() {
        assert!(!looks_valid(&profile(), "Hello! How can I help you today?"));
        assert!(!looks_valid(&profile(), "```python\nprint('hi')\n```"));
    }

    #[test]
    fn warn_keeps_invalid_text() {
        let outcome = GenerationOutcome::success("hello there");
        let out = apply_policy(ValidationPolicy::Warn, &profile(), outcome.clone());
        assert_eq!(out, outcome);
    }

    #[test]
    fn ignore_keeps_invalid_text() {
        let outcome = GenerationOutcome::success("hello there");
        let out = apply_policy(ValidationPolicy::Ignore, &profile(), outcome.clone());
        assert_eq!(out, outcome);
    }

    #[test]
    fn reject_turns_miss_into_failure() {
        let out = apply_policy(
            ValidationPolicy::Reject,
            &profile(),
            GenerationOutcome::success("hello there"),
        );
        assert!(!out.succeeded());
        assert_eq!(out.failure_reason(), Some(REJECTED_REASON));
    }

    #[test]
    fn reject_keeps_valid_text() {
        let outcome = GenerationOutcome::success("resource \"aws_s3_bucket\" \"b\" {}");
        let out = apply_policy(ValidationPolicy::Reject, &profile(), outcome.clone());
        assert_eq!(out, outcome);
    }

    #[test]
    fn failures_pass_through() {
        let outcome = GenerationOutcome::failure("boom");
        let out = apply_policy(ValidationPolicy::Reject, &profile(), outcome.clone());
        assert_eq!(out, outcome);
    }

    #[test]
    fn policy_parse_and_default() {
        assert_eq!(ValidationPolicy::default(), ValidationPolicy::Warn);
        assert_eq!("reject".parse::<ValidationPolicy>().unwrap(), ValidationPolicy::Reject);
        assert!("retry".parse::<ValidationPolicy>().is_err());
    }
}
