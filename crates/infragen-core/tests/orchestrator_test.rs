//! End-to-end orchestrator tests with an in-memory invoker.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use infragen_core::conversation::ContextOptions;
use infragen_core::envelope::ERROR_PREFIX;
use infragen_core::invoker::{GenerationInvoker, GenerationOutcome, InvocationMode};
use infragen_core::validate::ValidationPolicy;
use infragen_core::{ConversationTurn, GenerationRequest, Orchestrator, Role};

// ===========================================================================
// Test invoker
// ===========================================================================

/// Records every prompt and answers with a fixed outcome.
struct RecordingInvoker {
    outcome: GenerationOutcome,
    prompts: Mutex<Vec<String>>,
}

impl RecordingInvoker {
    fn new(outcome: GenerationOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationInvoker for RecordingInvoker {
    fn mode(&self) -> InvocationMode {
        InvocationMode::Direct
    }

    async fn invoke(&self, prompt: &str) -> GenerationOutcome {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.outcome.clone()
    }
}

fn turn(role: Role, content: &str) -> ConversationTurn {
    ConversationTurn {
        id: format!("turn-{}", content.len()),
        project_id: "p1".to_string(),
        role,
        content: content.to_string(),
        created_at: Utc::now(),
    }
}

const BUCKET_HCL: &str =
    "```hcl\n# S3 bucket\nresource \"aws_s3_bucket\" \"this\" {\n  bucket = \"example\"\n}\n```";

// ===========================================================================
// Scenarios
// ===========================================================================

#[tokio::test]
async fn scenario_a_fresh_request() {
    let invoker = RecordingInvoker::new(GenerationOutcome::success(BUCKET_HCL));
    let orchestrator = Orchestrator::new(invoker.clone());

    let envelope = orchestrator
        .handle(&GenerationRequest::new("create an S3 bucket", "p1"))
        .await;

    assert!(envelope.response.contains("resource"));
    assert!(envelope.response.contains("```hcl"));

    let prompts = invoker.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(!prompts[0].contains("Previous"));
    assert!(prompts[0].contains("INFRASTRUCTURE REQUEST: create an S3 bucket"));
}

#[tokio::test]
async fn scenario_b_prior_vpc_is_carried() {
    let invoker = RecordingInvoker::new(GenerationOutcome::success(BUCKET_HCL));
    let orchestrator = Orchestrator::new(invoker.clone());

    let request = GenerationRequest::new("add a subnet", "p1").with_history(vec![
        turn(Role::User, "create a VPC"),
        turn(
            Role::Assistant,
            "```hcl\nresource \"aws_vpc\" \"main\" {\n  cidr_block = \"10.0.0.0/16\"\n}\n```",
        ),
    ]);
    orchestrator.handle(&request).await;

    let prompt = &invoker.prompts()[0];
    assert!(prompt.contains("Previous request: create a VPC"));
    let vpc_line = prompt
        .lines()
        .find(|l| l.starts_with("Previous Terraform response:"))
        .expect("prompt should reference the prior VPC response");
    assert!(vpc_line.contains("```hcl"));
    assert!(prompt.contains("resource \"aws_vpc\""));
    assert!(prompt.contains("INFRASTRUCTURE REQUEST: add a subnet"));
}

#[tokio::test]
async fn scenario_c_backend_exception_becomes_text() {
    let invoker = RecordingInvoker::new(GenerationOutcome::failure("model overloaded"));
    let orchestrator = Orchestrator::new(invoker);

    let envelope = orchestrator
        .handle(&GenerationRequest::new("create an S3 bucket", "p1"))
        .await;

    assert_eq!(
        envelope.response,
        "An error occurred while processing your request: model overloaded"
    );
}

#[tokio::test]
async fn chatty_assistant_turns_are_not_carried() {
    let invoker = RecordingInvoker::new(GenerationOutcome::success(BUCKET_HCL));
    let orchestrator = Orchestrator::new(invoker.clone());

    let request = GenerationRequest::new("make it private", "p1").with_history(vec![
        turn(Role::Assistant, "Sure! Anything else?"),
        turn(Role::Assistant, "Happy to help."),
    ]);
    orchestrator.handle(&request).await;

    assert!(!invoker.prompts()[0].contains("Previous"));
}

#[tokio::test]
async fn invalid_text_is_returned_under_default_policy() {
    let invoker = RecordingInvoker::new(GenerationOutcome::success("I cannot help with that."));
    let orchestrator = Orchestrator::new(invoker);
    assert_eq!(orchestrator.validation_policy(), ValidationPolicy::Warn);

    let envelope = orchestrator.handle(&GenerationRequest::new("x", "p1")).await;
    assert_eq!(envelope.response, "I cannot help with that.");
}

#[tokio::test]
async fn reject_policy_maps_invalid_text_to_error() {
    let invoker = RecordingInvoker::new(GenerationOutcome::success("I cannot help with that."));
    let orchestrator =
        Orchestrator::new(invoker).with_validation_policy(ValidationPolicy::Reject);

    let envelope = orchestrator.handle(&GenerationRequest::new("x", "p1")).await;
    assert!(envelope.response.starts_with(ERROR_PREFIX));
    assert!(envelope.response.ends_with("does not look like Terraform code"));
}

#[tokio::test]
async fn context_bound_applies_to_prompt() {
    let invoker = RecordingInvoker::new(GenerationOutcome::success(BUCKET_HCL));
    let orchestrator = Orchestrator::new(invoker.clone()).with_context_options(ContextOptions {
        max_assistant_chars: 20,
        ..ContextOptions::default()
    });

    let long = format!("resource \"aws_vpc\" \"main\" {{ {} }}", "x".repeat(1_000));
    let request = GenerationRequest::new("add a subnet", "p1")
        .with_history(vec![turn(Role::Assistant, &long)]);
    orchestrator.handle(&request).await;

    let prompt = &invoker.prompts()[0];
    let line = prompt
        .lines()
        .find(|l| l.starts_with("Previous Terraform response: "))
        .unwrap();
    let body = line.trim_start_matches("Previous Terraform response: ");
    assert_eq!(body, "resource \"aws_vpc\" \"...");
}

#[tokio::test]
async fn build_prompt_matches_what_is_sent() {
    let invoker = RecordingInvoker::new(GenerationOutcome::success(BUCKET_HCL));
    let orchestrator = Orchestrator::new(invoker.clone());
    let request = GenerationRequest::new("add a subnet", "p1")
        .with_history(vec![turn(Role::User, "create a VPC")]);

    let expected = orchestrator.build_prompt(&request);
    orchestrator.handle(&request).await;
    assert_eq!(invoker.prompts()[0], expected);
    assert_eq!(orchestrator.build_prompt(&request), expected);
}

#[tokio::test]
async fn concurrent_requests_are_independent() {
    let invoker = RecordingInvoker::new(GenerationOutcome::success(BUCKET_HCL));
    let orchestrator = Arc::new(Orchestrator::new(invoker.clone()));

    let handles = (0..8).map(|i| {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            orchestrator
                .handle(&GenerationRequest::new(format!("bucket {i}"), format!("p{i}")))
                .await
        })
    });
    let envelopes = futures::future::join_all(handles).await;

    assert!(envelopes.into_iter().all(|e| e.unwrap().response == BUCKET_HCL));
    let prompts = invoker.prompts();
    assert_eq!(prompts.len(), 8);
    for i in 0..8 {
        assert!(
            prompts
                .iter()
                .any(|p| p.contains(&format!("Project ID: p{i}\n")))
        );
    }
}
