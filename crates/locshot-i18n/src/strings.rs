//! String normalization used when comparing records against UI text.

use std::sync::LazyLock;

use regex::Regex;

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("valid link pattern"));
static CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]*)`").expect("valid code pattern"));
static STRONG_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid strong pattern"));
static STRONG_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__([^_]+)__").expect("valid strong pattern"));
static EMPHASIS_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\s][^*]*)\*").expect("valid emphasis pattern"));
// `\b` keeps snake_case identifiers intact.
static EMPHASIS_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b_([^_]+)_\b").expect("valid emphasis pattern"));
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]{0,3}#{1,6}[ \t]+").expect("valid heading pattern"));

/// Strip markdown markup that is not displayed.
///
/// Links become their text; code spans, strong and emphasis markers, and
/// heading hashes are removed. Text without markup is returned unchanged.
pub fn remove_markdown_formatting(input: &str) -> String {
    let s = LINK.replace_all(input, "${1}");
    let s = CODE.replace_all(&s, "${1}");
    let s = STRONG_STAR.replace_all(&s, "${1}");
    let s = STRONG_UNDERSCORE.replace_all(&s, "${1}");
    let s = EMPHASIS_STAR.replace_all(&s, "${1}");
    let s = EMPHASIS_UNDERSCORE.replace_all(&s, "${1}");
    HEADING.replace_all(&s, "").into_owned()
}

/// True when `s` carries nothing language-specific.
///
/// Whitespace, punctuation, symbols, and digits read the same in every
/// locale, so such strings cannot tell one localization from another. The
/// empty string counts as locale-shared.
pub fn string_has_only_locale_shared_content(s: &str) -> bool {
    !s.chars().any(char::is_alphabetic)
}

/// `ui_string` with the first occurrence of `localized` cut out.
///
/// Surrounding whitespace is kept verbatim, so `"Cancel (⌘.)"` minus
/// `"Cancel"` is `" (⌘.)"`. Returns `ui_string` unchanged when `localized`
/// is empty or absent.
pub fn ui_string_by_removing_localized_string(ui_string: &str, localized: &str) -> String {
    if localized.is_empty() {
        return ui_string.to_string();
    }
    match ui_string.find(localized) {
        Some(start) => {
            let mut out = String::with_capacity(ui_string.len() - localized.len());
            out.push_str(&ui_string[..start]);
            out.push_str(&ui_string[start + localized.len()..]);
            out
        }
        None => ui_string.to_string(),
    }
}
