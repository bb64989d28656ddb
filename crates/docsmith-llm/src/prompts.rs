//! Prompt templates for docstring generation

use docsmith_docstring::DocKind;

/// System prompt for class docstrings
pub const CLASS_SYSTEM_PROMPT: &str = "You are an expert Python developer. Write clear and concise class-level \
docstrings that include only the description of the class, following PEP 257 conventions. \
**Do not include any attributes or methods in the docstring.** \
Focus on summarizing what the class represents or does.";

/// System prompt for function and method docstrings
pub const FUNCTION_SYSTEM_PROMPT: &str = "You are an expert Python developer. Write clear and comprehensive \
docstrings in the Google style guide format, including descriptions of parameters, return values, \
and any exceptions raised. Do not include the function signature in the docstring.";

/// Few-shot example shown with class requests
pub const CLASS_EXAMPLE: &str = r#"class RateLimiter:
    """Limits how often an operation may run within a sliding time window.

    Callers ask the limiter for permission before each operation; requests
    beyond the configured budget are rejected until older ones expire.
    """

    def __init__(self, limit, window_seconds):
        self.limit = limit
        self.window_seconds = window_seconds
        self.calls = []
"#;

/// Few-shot example shown with function and method requests
pub const FUNCTION_EXAMPLE: &str = r#"def parse_duration(text: str) -> int:
    """Convert a duration such as "1h30m" into seconds.

    Args:
        text (str): Duration made of number and unit pairs, where the unit
            is one of "h", "m" or "s".

    Returns:
        int: Total number of seconds.

    Raises:
        ValueError: If the text is empty or contains an unknown unit.
    """
    if not text:
        raise ValueError("empty duration")
    total, number = 0, ""
    for ch in text:
        if ch.isdigit():
            number += ch
        elif ch in UNITS:
            total += int(number) * UNITS[ch]
            number = ""
        else:
            raise ValueError(f"unknown unit {ch!r}")
    return total
"#;

/// System prompt for a fragment kind
pub fn system_prompt(kind: DocKind) -> &'static str {
    match kind {
        DocKind::Class => CLASS_SYSTEM_PROMPT,
        DocKind::Function | DocKind::Method => FUNCTION_SYSTEM_PROMPT,
    }
}

/// Build the user prompt for one fragment
pub fn build_user_prompt(fragment: &str, kind: DocKind) -> String {
    match kind {
        DocKind::Class => format!(
            "Here is an example of a class with its docstring:\n{CLASS_EXAMPLE}\n\n\
             Now, please generate a docstring for the following class, including only the description. \
             Do not include any attributes or methods. \
             Do not include the class signature in the docstring.\n\n{fragment}\n\nDocstring:"
        ),
        DocKind::Function | DocKind::Method => format!(
            "Here is an example of a {kind} with its docstring:\n{FUNCTION_EXAMPLE}\n\n\
             Now, please generate a docstring for the following code, including parameter descriptions, \
             return types, and any raises clauses. \
             Do not include the function signature in the docstring. \
             Ensure the docstring adheres to PEP 257 conventions.\n\n{fragment}\n\nDocstring:"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_prompt_forbids_members() {
        let prompt = build_user_prompt("class A:\n    pass\n", DocKind::Class);
        assert!(prompt.contains("Do not include any attributes or methods"));
        assert!(prompt.ends_with("class A:\n    pass\n\n\nDocstring:"));
        assert!(system_prompt(DocKind::Class).contains("class-level"));
    }

    #[test]
    fn test_function_prompt_asks_for_google_style() {
        let prompt = build_user_prompt("def f(x):\n    return x\n", DocKind::Method);
        assert!(prompt.starts_with("Here is an example of a method"));
        assert!(prompt.contains("raises clauses"));
        assert!(system_prompt(DocKind::Function).contains("Google style"));
    }
}
