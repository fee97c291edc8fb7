use serde::Serialize;
use std::fmt;

use super::Contract;
use crate::interaction::{Request, Response};

const MAX_NAME_LEN: usize = 255;
const VALID_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

/// One structural problem, located by a JSON-ish path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub location: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

pub(super) fn issues(contract: &Contract) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    check_name(&mut issues, "consumer", &contract.consumer.name);
    check_name(&mut issues, "provider", &contract.provider.name);

    if contract.interactions.is_empty() {
        issues.push(ValidationIssue::new(
            "interactions",
            "at least one interaction is required",
        ));
    }

    for (i, interaction) in contract.interactions.iter().enumerate() {
        let at = format!("interactions[{}]", i);
        if interaction.description.trim().is_empty() {
            issues.push(ValidationIssue::new(&at, "description is required"));
        }
        check_request(&mut issues, &at, &interaction.request);
        check_response(&mut issues, &at, &interaction.response);
    }

    issues
}

fn check_name(issues: &mut Vec<ValidationIssue>, role: &str, name: &str) {
    if name.trim().is_empty() {
        issues.push(ValidationIssue::new(role, format!("{} name is required", role)));
    } else if name.chars().count() > MAX_NAME_LEN {
        issues.push(ValidationIssue::new(
            role,
            format!("{} name exceeds {} characters", role, MAX_NAME_LEN),
        ));
    }
}

fn check_request(issues: &mut Vec<ValidationIssue>, at: &str, request: &Request) {
    let method = request.method.to_uppercase();
    if !VALID_METHODS.contains(&method.as_str()) {
        issues.push(ValidationIssue::new(
            format!("{}.request", at),
            format!("invalid HTTP method '{}'", request.method),
        ));
    }

    if request.path.is_empty() {
        issues.push(ValidationIssue::new(
            format!("{}.request", at),
            "path is required",
        ));
    } else if !request.path.starts_with('/') {
        issues.push(ValidationIssue::new(
            format!("{}.request", at),
            format!("path '{}' must start with '/'", request.path),
        ));
    }
}

fn check_response(issues: &mut Vec<ValidationIssue>, at: &str, response: &Response) {
    if !(100..=599).contains(&response.status) {
        issues.push(ValidationIssue::new(
            format!("{}.response", at),
            format!("invalid status code {}", response.status),
        ));
    }
}
