//! Prompt assembly: pure logic, no I/O.
//!
//! Combines the task heading, project identifier, optional context block,
//! the literal user request and the profile's fixed output requirements
//! into one instruction string. Identical inputs always produce identical
//! output.

use crate::conversation::ContextBlock;
use crate::domain::DomainProfile;

/// Assemble the instruction payload sent to the generation backend.
pub fn assemble_prompt(
    profile: &DomainProfile,
    context: &ContextBlock,
    project_id: &str,
    request: &str,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(&profile.task_heading);
    prompt.push_str("\n\n");
    prompt.push_str(&format!("Project ID: {project_id}\n\n"));

    if !context.is_empty() {
        prompt.push_str(&context.render());
        prompt.push_str("\n\n");
    }

    prompt.push_str(&format!("{}: {request}\n\n", profile.request_label));

    prompt.push_str("Requirements:\n");
    for requirement in &profile.requirements {
        prompt.push_str(&format!("- {requirement}\n"));
    }
    prompt.push('\n');
    prompt.push_str(&profile.closing_line);

    prompt
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::conversation::{ContextOptions, ConversationTurn, Role, build_context};

    fn vpc_history() -> Vec<ConversationTurn> {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        vec![
            ConversationTurn {
                id: "1".to_string(),
                project_id: "p1".to_string(),
                role: Role::User,
                content: "create a VPC".to_string(),
                created_at: at,
            },
            ConversationTurn {
                id: "2".to_string(),
                project_id: "p1".to_string(),
                role: Role::Assistant,
                content: "```hcl\nresource \"aws_vpc\" \"main\" {\n  cidr_block = \"10.0.0.0/16\"\n}\n```"
                    .to_string(),
                created_at: at,
            },
        ]
    }

    #[test]
    fn empty_context_has_no_previous_section() {
        let profile = DomainProfile::terraform();
        let prompt = assemble_prompt(&profile, &ContextBlock::default(), "p1", "create an S3 bucket");
        assert!(!prompt.contains("Previous"));
        assert!(prompt.contains("Project ID: p1"));
        assert!(prompt.contains("INFRASTRUCTURE REQUEST: create an S3 bucket"));
    }

    #[test]
    fn layout_without_context() {
        let profile = DomainProfile::terraform();
        let prompt = assemble_prompt(&profile, &ContextBlock::default(), "p1", "make a bucket");
        let expected = "Generate Terraform code for the following infrastructure request:\n\n\
Project ID: p1\n\n\
INFRASTRUCTURE REQUEST: make a bucket\n\n\
Requirements:\n\
- Generate complete, valid Terraform code\n\
- Use appropriate cloud provider (AWS/Azure/GCP)\n\
- Include all necessary resources, variables, and outputs\n\
- Add descriptive comments\n\
- Follow Terraform best practices\n\
- Make reasonable assumptions if details are missing\n\n\
Generate the Terraform configuration now:";
        assert_eq!(prompt, expected);
    }

    #[test]
    fn context_precedes_request() {
        let profile = DomainProfile::terraform();
        let context = build_context(&profile, &vpc_history(), &ContextOptions::default());
        let prompt = assemble_prompt(&profile, &context, "p1", "add a subnet");

        let context_at = prompt.find("Previous request: create a VPC").unwrap();
        let vpc_at = prompt.find("Previous Terraform response: ```hcl").unwrap();
        let request_at = prompt.find("INFRASTRUCTURE REQUEST: add a subnet").unwrap();
        assert!(context_at < vpc_at);
        assert!(vpc_at < request_at);
        assert!(prompt.contains("aws_vpc"));
    }

    #[test]
    fn assembly_is_deterministic() {
        let profile = DomainProfile::terraform();
        let context = build_context(&profile, &vpc_history(), &ContextOptions::default());
        let a = assemble_prompt(&profile, &context, "p1", "add a subnet");
        let b = assemble_prompt(&profile, &context, "p1", "add a subnet");
        assert_eq!(a, b);
    }
}
