//! Output formatting utilities

use crate::application::{CheckReport, TagSummary};

/// Format the registered tags for display
pub fn format_tag_list(tags: &[TagSummary]) -> String {
    if tags.is_empty() {
        return "No tags registered".to_string();
    }

    let mut output = String::new();
    for tag in tags {
        output.push_str(&format!("{:<10} {}", tag.name, tag.kind));
        if !tag.branches.is_empty() {
            output.push_str(&format!("  branches: {}", tag.branches.join(", ")));
        }
        if !tag.governs.is_empty() {
            output.push_str(&format!("  governs: {}", tag.governs.join(", ")));
        }
        if !tag.governed_by.is_empty() {
            output.push_str(&format!("  inside: {}", tag.governed_by.join(", ")));
        }
        output.push('\n');
    }
    output
}

/// Format check results, one line per template
pub fn format_check_reports(reports: &[CheckReport]) -> String {
    if reports.is_empty() {
        return "No templates found".to_string();
    }

    let mut output = String::new();
    for report in reports {
        match &report.error {
            None => output.push_str(&format!("ok    {}\n", report.path.display())),
            Some(error) => {
                output.push_str(&format!("FAIL  {}: {}\n", report.path.display(), error))
            }
        }
    }
    output
}
