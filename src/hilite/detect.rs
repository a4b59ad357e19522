//! Language detection
//!
//!     Two sources of a language id, both cheap and heuristic:
//!
//!     - detect_language:     substring checks on the snippet itself
//!     - language_from_class: a `lang-x` / `language-x` entry of a class attribute

use once_cell::sync::Lazy;
use regex::Regex;

static CLASS_LANGUAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|\s)lang(?:uage)?-([\w-]+)(?:\s|$)").unwrap()
});

/// Guess the language of a code snippet.
///
/// Checks run in order and the first hit wins; anything unrecognized is javascript.
pub fn detect_language(snippet: &str) -> &'static str {
    if snippet.contains("def ") || (snippet.contains("import ") && snippet.contains(':')) {
        "python"
    } else if snippet.contains("public class ") || snippet.contains("public static void") {
        "java"
    } else if snippet.contains("#include") || snippet.contains("int main(") {
        "cpp"
    } else {
        "javascript"
    }
}

/// Language id named by a class attribute, lowercased
pub fn language_from_class(class_attr: &str) -> Option<String> {
    CLASS_LANGUAGE
        .captures(class_attr)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language("def f(x):\n    return x"), "python");
        assert_eq!(detect_language("import os\nif x: pass"), "python");
        assert_eq!(detect_language("public class Main {}"), "java");
        assert_eq!(detect_language("#include <stdio.h>"), "cpp");
        assert_eq!(detect_language("int main() { return 0; }"), "cpp");
        assert_eq!(detect_language("const x = 1;"), "javascript");
    }

    #[test]
    fn test_python_check_comes_first() {
        // "import " alone is not enough, but "def " always is
        assert_eq!(detect_language("import java.util.List;"), "javascript");
        assert_eq!(detect_language("public class A { def}"), "java");
        assert_eq!(detect_language("public class A { def x }"), "python");
    }

    #[test]
    fn test_language_from_class() {
        assert_eq!(language_from_class("language-Python"), Some("python".to_string()));
        assert_eq!(language_from_class("line-numbers lang-cpp"), Some("cpp".to_string()));
        assert_eq!(language_from_class("x language-c++"), None);
        assert_eq!(language_from_class("highlight-js"), None);
        assert_eq!(language_from_class(""), None);
    }
}
