//! Domain profile: every Terraform-specific constant in one place.
//!
//! The context builder, prompt assembler and response validator are written
//! against a [`DomainProfile`] rather than hard-coded strings, so the wording
//! of the prompt and the validation vocabulary can be inspected (and tested)
//! without reaching into each component.

/// Vocabulary and wording for one generation domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainProfile {
    /// Short identifier reported by `/health` (e.g. `terraform_generator`).
    pub name: String,
    /// Human-readable specialization reported by `/health`.
    pub specialization: String,
    /// Display name of the generation identity.
    pub display_name: String,
    /// System instructions for the generation identity.
    pub agent_instructions: String,
    /// Assistant turns containing any of these (case-insensitively) are
    /// carried forward into the context block.
    pub context_keywords: Vec<String>,
    /// Label used for assistant turns in the context block.
    pub assistant_label: String,
    /// Heading placed above the context lines.
    pub context_heading: String,
    /// Fence tags (```` ```hcl ````) the validator accepts.
    pub fence_tags: Vec<String>,
    /// Keywords the validator accepts when no fenced block is present.
    pub validation_keywords: Vec<String>,
    /// First line of the assembled prompt.
    pub task_heading: String,
    /// Label preceding the literal user request.
    pub request_label: String,
    /// Fixed output requirements listed at the end of the prompt.
    pub requirements: Vec<String>,
    /// Last line of the assembled prompt.
    pub closing_line: String,
}

impl DomainProfile {
    /// The Terraform / HCL profile.
    pub fn terraform() -> Self {
        Self {
            name: "terraform_generator".to_string(),
            specialization: "Infrastructure as Code".to_string(),
            display_name: "Terraform Infrastructure Generator".to_string(),
            agent_instructions: TERRAFORM_INSTRUCTIONS.to_string(),
            context_keywords: strings(&["terraform", "resource"]),
            assistant_label: "Previous Terraform response".to_string(),
            context_heading: "Previous infrastructure requests and configurations:".to_string(),
            fence_tags: strings(&["hcl", "terraform"]),
            validation_keywords: strings(&[
                "terraform",
                "resource",
                "provider",
                "variable",
                "output",
                "data",
                "module",
                "locals",
            ]),
            task_heading: "Generate Terraform code for the following infrastructure request:"
                .to_string(),
            request_label: "INFRASTRUCTURE REQUEST".to_string(),
            requirements: strings(&[
                "Generate complete, valid Terraform code",
                "Use appropriate cloud provider (AWS/Azure/GCP)",
                "Include all necessary resources, variables, and outputs",
                "Add descriptive comments",
                "Follow Terraform best practices",
                "Make reasonable assumptions if details are missing",
            ]),
            closing_line: "Generate the Terraform configuration now:".to_string(),
        }
    }
}

impl Default for DomainProfile {
    fn default() -> Self {
        Self::terraform()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

const TERRAFORM_INSTRUCTIONS: &str = r#"You are a specialized Terraform code generator. Your ONLY job is to generate Terraform configurations based on user requests.

STRICT RULES:
1. ALWAYS respond with valid Terraform (.tf) code
2. Use proper Terraform syntax and best practices
3. Include provider configurations when needed
4. Add meaningful variable definitions
5. Include outputs for important resources
6. Add comments explaining the infrastructure components
7. Use appropriate resource naming conventions
8. Consider security best practices in your configurations

SUPPORTED PROVIDERS:
- AWS (aws)
- Azure (azurerm)
- Google Cloud (google)
- Kubernetes (kubernetes)
- Helm (helm)

RESPONSE FORMAT:
Always structure your response as:
```hcl
# Brief description of what this infrastructure does

# Provider configuration
terraform {
  required_providers {
    # provider blocks
  }
}

# Variables (if needed)
variable "example" {
  description = "Description"
  type        = string
  default     = "default_value"
}

# Resources
resource "provider_resource" "name" {
  # resource configuration
}

# Outputs (if needed)
output "example" {
  description = "Description"
  value       = resource.provider_resource.name.attribute
}
```

DO NOT:
- Provide explanations outside of Terraform comments
- Suggest manual steps or CLI commands
- Generate anything other than Terraform code
- Ask questions - make reasonable assumptions and document them in comments

When conversation history is provided, build upon previous Terraform configurations and maintain consistency."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terraform_profile_is_default() {
        assert_eq!(DomainProfile::default(), DomainProfile::terraform());
    }

    #[test]
    fn instructions_show_an_hcl_fence() {
        let profile = DomainProfile::terraform();
        assert!(profile.agent_instructions.contains("```hcl"));
        assert!(profile.fence_tags.iter().any(|t| t == "hcl"));
    }
}
