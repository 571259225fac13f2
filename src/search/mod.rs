//! Search and replace over document text.
//!
//! Matching is line by line on `\n`, the same split the document store
//! uses, so a match's `line` is a document line index. Columns and lengths
//! count characters. Empty matches (possible with regex queries like `a*`)
//! are skipped by both search and replace.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::SearchError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub use_regex: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMatch {
    /// 0-based line index.
    pub line: usize,
    /// 0-based character column.
    pub column: usize,
    /// Match length in characters.
    pub length: usize,
    pub text: String,
    pub line_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceResult {
    pub new_content: String,
    pub replaced_count: usize,
}

fn build_pattern(query: &str, options: &SearchOptions) -> Result<Regex, SearchError> {
    let body = if options.use_regex {
        format!("(?:{query})")
    } else {
        regex::escape(query)
    };
    let pattern = if options.whole_word {
        format!(r"\b{body}\b")
    } else {
        body
    };
    Ok(RegexBuilder::new(&pattern)
        .case_insensitive(!options.case_sensitive)
        .build()?)
}

/// Every non-empty match of `query` in `content`, in document order.
///
/// # Errors
/// Returns [`SearchError::InvalidPattern`] for a regex query that does not
/// compile.
pub fn search_in_content(
    query: &str,
    content: &str,
    options: &SearchOptions,
) -> Result<Vec<SearchMatch>, SearchError> {
    if query.is_empty() {
        return Ok(Vec::new());
    }
    let re = build_pattern(query, options)?;
    let mut matches = Vec::new();
    for (line, line_text) in content.split('\n').enumerate() {
        for found in re.find_iter(line_text).filter(|m| !m.is_empty()) {
            matches.push(SearchMatch {
                line,
                column: line_text[..found.start()].chars().count(),
                length: found.as_str().chars().count(),
                text: found.as_str().to_string(),
                line_text: line_text.to_string(),
            });
        }
    }
    Ok(matches)
}

/// Replace every non-empty match. Regex queries expand `$1`-style group
/// references in `replacement`; plain queries insert it literally.
///
/// # Errors
/// Returns [`SearchError::InvalidPattern`] for a regex query that does not
/// compile.
pub fn replace_in_content(
    query: &str,
    replacement: &str,
    content: &str,
    options: &SearchOptions,
) -> Result<ReplaceResult, SearchError> {
    if query.is_empty() {
        return Ok(ReplaceResult {
            new_content: content.to_string(),
            replaced_count: 0,
        });
    }
    let re = build_pattern(query, options)?;
    let mut new_content = String::with_capacity(content.len());
    let mut replaced_count = 0;
    let mut last = 0;
    for caps in re.captures_iter(content) {
        let Some(whole) = caps.get(0).filter(|m| !m.is_empty()) else {
            continue;
        };
        new_content.push_str(&content[last..whole.start()]);
        if options.use_regex {
            caps.expand(replacement, &mut new_content);
        } else {
            new_content.push_str(replacement);
        }
        last = whole.end();
        replaced_count += 1;
    }
    new_content.push_str(&content[last..]);
    Ok(ReplaceResult {
        new_content,
        replaced_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASE: SearchOptions = SearchOptions {
        case_sensitive: true,
        whole_word: false,
        use_regex: false,
    };

    #[test]
    fn test_search_is_case_insensitive_by_default() {
        let matches = search_in_content("foo", "Foo bar\nbaz FOO", &SearchOptions::default()).unwrap();
        let found: Vec<(usize, usize)> = matches.iter().map(|m| (m.line, m.column)).collect();
        assert_eq!(found, vec![(0, 0), (1, 4)]);
        assert_eq!(matches[1].text, "FOO");
        assert_eq!(matches[1].line_text, "baz FOO");
    }

    #[test]
    fn test_search_case_sensitive() {
        let matches = search_in_content("foo", "Foo foo", &CASE).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].column, 4);
    }

    #[test]
    fn test_search_columns_count_chars() {
        let matches = search_in_content("b", "日本 b", &CASE).unwrap();
        assert_eq!(matches[0].column, 3);
        assert_eq!(matches[0].length, 1);
    }

    #[test]
    fn test_whole_word() {
        let options = SearchOptions {
            whole_word: true,
            ..SearchOptions::default()
        };
        let matches = search_in_content("cat", "cat concat cats cat.", &options).unwrap();
        let columns: Vec<usize> = matches.iter().map(|m| m.column).collect();
        assert_eq!(columns, vec![0, 16]);
    }

    #[test]
    fn test_plain_query_escapes_regex_syntax() {
        let matches = search_in_content("a.b", "a.b axb", &SearchOptions::default()).unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_empty_query_and_empty_matches() {
        assert!(search_in_content("", "abc", &SearchOptions::default()).unwrap().is_empty());
        let regex = SearchOptions {
            use_regex: true,
            ..SearchOptions::default()
        };
        let matches = search_in_content("x*", "axxb", &regex).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "xx");
    }

    #[test]
    fn test_invalid_regex_is_an_error() {
        let regex = SearchOptions {
            use_regex: true,
            ..SearchOptions::default()
        };
        assert!(matches!(
            search_in_content("(", "x", &regex),
            Err(SearchError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_replace_counts_and_keeps_lines() {
        let result = replace_in_content("a", "bb", "a\nxa\n", &CASE).unwrap();
        assert_eq!(result.new_content, "bb\nxbb\n");
        assert_eq!(result.replaced_count, 2);
    }

    #[test]
    fn test_replace_literal_does_not_expand_groups() {
        let result = replace_in_content("cost", "$5", "cost", &CASE).unwrap();
        assert_eq!(result.new_content, "$5");
    }

    #[test]
    fn test_replace_regex_expands_groups() {
        let regex = SearchOptions {
            use_regex: true,
            case_sensitive: true,
            whole_word: false,
        };
        let result = replace_in_content(r"(\w+)@(\w+)", "$2 at $1", "me@home", &regex).unwrap();
        assert_eq!(result.new_content, "home at me");
        assert_eq!(result.replaced_count, 1);
    }

    #[test]
    fn test_replace_empty_query_is_unchanged() {
        let result = replace_in_content("", "x", "abc", &CASE).unwrap();
        assert_eq!(result.new_content, "abc");
        assert_eq!(result.replaced_count, 0);
    }
}
