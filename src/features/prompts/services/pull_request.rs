//! Titles, commit messages and Markdown bodies for prompt pull requests.

use std::fmt::Write;

use crate::features::prompts::models::{LocalizedContent, Prompt};
use crate::features::prompts::services::submission_service::Operation;
use crate::shared::constants::PROMPT_SCHEMA_VERSION;

pub fn title(operation: Operation, prompt: &Prompt) -> String {
    match operation {
        Operation::Create => format!("Add prompt: {}", prompt.title),
        Operation::Update => format!("Update prompt: {}", prompt.title),
    }
}

pub fn commit_message(operation: Operation, prompt: &Prompt) -> String {
    match operation {
        Operation::Create => format!("feat(prompts): add new prompt \"{}\"", prompt.title),
        Operation::Update => format!("feat(prompts): update prompt \"{}\"", prompt.title),
    }
}

/// Code fence longer than any backtick run inside `text`
fn fence(text: &str) -> String {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

fn write_content(body: &mut String, content: &LocalizedContent) {
    for (language, text) in content.iter().filter(|(_, t)| !t.trim().is_empty()) {
        let fence = fence(text);
        let _ = writeln!(body, "**{}**\n{}text\n{}\n{}\n", language, fence, text, fence);
    }
}

/// Markdown summary a reviewer reads before merging
pub fn body(
    operation: Operation,
    prompt: &Prompt,
    path: &str,
    previous_path: Option<&str>,
) -> String {
    let mut body = String::new();

    let heading = match operation {
        Operation::Create => "### 📥 New prompt submitted for review",
        Operation::Update => "### ✏️ Prompt update submitted for review",
    };
    let _ = writeln!(body, "{}\n", heading);
    let _ = writeln!(body, "**File:** `{}`", path);
    if let Some(previous) = previous_path.filter(|p| *p != path) {
        let _ = writeln!(body, "**Moved from:** `{}`", previous);
    }
    let _ = writeln!(body, "**Title:** {}", prompt.title);
    let _ = writeln!(
        body,
        "**Version:** `{}` | **Category:** `{}`",
        prompt.version, prompt.category
    );

    let tags = if prompt.tags.is_empty() {
        "_none_".to_string()
    } else {
        prompt
            .tags
            .iter()
            .map(|t| format!("`{}`", t))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let _ = writeln!(body, "**Tags:** {}\n", tags);

    let _ = writeln!(body, "**Description:**");
    match prompt.description.as_deref() {
        Some(description) => {
            for line in description.lines() {
                let _ = writeln!(body, "> {}", line);
            }
        }
        None => {
            let _ = writeln!(body, "> Not provided");
        }
    }
    body.push('\n');

    if prompt.content.values().any(|t| !t.trim().is_empty()) {
        let _ = writeln!(body, "#### Content\n");
        write_content(&mut body, &prompt.content);
    }

    if !prompt.prompt_variants.is_empty() {
        let _ = writeln!(
            body,
            "---\n### ✨ Prompt variants ({})\n",
            prompt.prompt_variants.len()
        );
        for variant in &prompt.prompt_variants {
            let id = &variant.variant_id;
            let _ = write!(body, "#### Type: `{}`, ID: `{}`", id.kind, id.id);
            if let Some(priority) = id.priority {
                let _ = write!(body, ", Priority: `{}`", priority);
            }
            body.push_str("\n\n");
            write_content(&mut body, &variant.content);
        }
    }

    if !prompt.variables.is_empty() {
        let _ = writeln!(body, "---\n### 🔧 Variables ({})\n", prompt.variables.len());
        for variable in &prompt.variables {
            let _ = write!(body, "- `{}`", variable.name);
            if !variable.description.is_empty() {
                let _ = write!(body, ": {}", variable.description);
            }
            if !variable.default_value.is_empty() {
                let _ = write!(body, " (default: `{}`)", variable.default_value);
            }
            body.push('\n');
        }
        body.push('\n');
    }

    if !prompt.compatible_models.is_empty() {
        let _ = writeln!(
            body,
            "**Compatible models:** {}\n",
            prompt.compatible_models.join(", ")
        );
    }

    let _ = write!(
        body,
        "---\n*Created automatically from a prompt submission (schema v{}). Review the file and merge to publish.*",
        PROMPT_SCHEMA_VERSION
    );
    body
}
