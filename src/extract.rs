// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Recovery of the superset metric document from its C host header.
//!
//! The header embeds the YAML as a preprocessor macro made of adjacent string
//! literals joined by line continuations:
//!
//! ```text
//! #define INTERNAL_YAML "" \
//!         "version: 16\n" \
//!         "metrics:\n"
//! ```
//!
//! This adapter only turns host text into a candidate document string. It
//! knows nothing about the document's structure.

use regex::Regex;
use tracing::debug;

use crate::error::Error;

/// Extracts and un-escapes the string literals of the named macro.
///
/// The first line containing `#define <macro_name>` starts the declaration;
/// lines ending in a backslash continue it. The declaration must begin with
/// `#define <macro_name> ""`, and every double-quoted segment after that
/// prefix is concatenated in order.
///
/// # Errors
///
/// Returns [`Error::Extraction`] when the macro is missing, the declaration
/// has an unexpected shape, a literal is unterminated, or no literal follows
/// the prefix.
///
/// # Examples
///
/// ```
/// use pgcontrib::extract_embedded_document;
///
/// let header = "#define INTERNAL_YAML \"\" \\\n  \"version: 16\\n\"\n";
/// let document = extract_embedded_document(header, "INTERNAL_YAML",).expect("extracted",);
/// assert_eq!(document, "version: 16\n");
/// ```
pub fn extract_embedded_document(host: &str, macro_name: &str,) -> Result<String, Error,>
{
    let marker = format!("#define {macro_name}");
    let mut lines = host.lines().skip_while(|line| !line.contains(marker.as_str(),),);

    let first = lines
        .next()
        .ok_or_else(|| Error::extraction(format!("could not find {macro_name} macro"),),)?;

    let mut declaration = String::new();
    for line in std::iter::once(first,).chain(lines,) {
        let trimmed = line.trim_end();
        match trimmed.strip_suffix('\\',) {
            Some(continued,) => declaration.push_str(continued,),
            None => {
                declaration.push_str(trimmed,);
                break;
            }
        }
    }

    let prefix = Regex::new(&format!(r#"^#define\s+{}\s+"""#, regex::escape(macro_name)),)
        .map_err(|error| Error::extraction(format!("invalid macro name: {error}"),),)?;
    let body_start = prefix
        .find(&declaration,)
        .map(|found| found.end(),)
        .ok_or_else(|| Error::extraction(format!("unexpected {macro_name} macro format"),),)?;

    let segments = collect_string_segments(&declaration[body_start..],)?;
    if segments.is_empty() {
        return Err(Error::extraction(format!(
            "could not extract string literals from {macro_name} macro"
        ),),);
    }

    debug!("Extracted {} string segments from {}", segments.len(), macro_name);
    Ok(segments.concat(),)
}

/// Splits the declaration body into un-escaped string literal contents.
///
/// Text outside of literals is ignored. Recognized escapes are `\n`, `\t`,
/// `\r`, `\\` and `\"`; any other backslash is kept literally and the next
/// character is processed as ordinary text.
fn collect_string_segments(body: &str,) -> Result<Vec<String,>, Error,>
{
    let mut segments = Vec::new();
    let mut current: Option<String,> = None;
    let mut chars = body.chars().peekable();

    while let Some(character,) = chars.next() {
        let Some(segment,) = current.as_mut() else {
            if character == '"' {
                current = Some(String::new(),);
            }
            continue;
        };

        match character {
            '\\' => {
                let unescaped = match chars.peek() {
                    Some('n',) => Some('\n',),
                    Some('t',) => Some('\t',),
                    Some('r',) => Some('\r',),
                    Some('\\',) => Some('\\',),
                    Some('"',) => Some('"',),
                    _ => None,
                };
                match unescaped {
                    Some(value,) => {
                        segment.push(value,);
                        chars.next();
                    }
                    None => segment.push('\\',),
                }
            }
            '"' => {
                if let Some(finished,) = current.take() {
                    segments.push(finished,);
                }
            }
            other => segment.push(other,),
        }
    }

    if current.is_some() {
        return Err(Error::extraction("unterminated string literal in macro body",),);
    }

    Ok(segments,)
}

#[cfg(test)]
mod tests
{
    use super::{collect_string_segments, extract_embedded_document};
    use crate::Error;

    const HEADER: &str = r#"#ifndef PGEXPORTER_INTERNAL_H
#define PGEXPORTER_INTERNAL_H

#define INTERNAL_YAML "" \
        "version: 16\n" \
        "metrics:\n" \
        "  - tag: pg_stat\n" \
        "    queries:\n" \
        "      - query: SELECT \"name\" FROM t;\n"

#endif
"#;

    #[test]
    fn extracts_concatenated_segments()
    {
        let document = extract_embedded_document(HEADER, "INTERNAL_YAML",).expect("extracted",);
        assert_eq!(
            document,
            "version: 16\nmetrics:\n  - tag: pg_stat\n    queries:\n      - query: SELECT \"name\" FROM t;\n"
        );
    }

    #[test]
    fn stops_at_first_line_without_continuation()
    {
        let header = "#define INTERNAL_YAML \"\" \\\n  \"a\"\n  \"b\"\n";
        let document = extract_embedded_document(header, "INTERNAL_YAML",).expect("extracted",);
        assert_eq!(document, "a");
    }

    #[test]
    fn unescapes_known_sequences()
    {
        let segments = collect_string_segments(r#""a\nb\tc\rd\\e\"f""#,).expect("segments",);
        assert_eq!(segments, vec!["a\nb\tc\rd\\e\"f".to_owned()]);
    }

    #[test]
    fn keeps_unknown_escapes_literally()
    {
        let segments = collect_string_segments(r#""\d+\x""#,).expect("segments",);
        assert_eq!(segments, vec![r"\d+\x".to_owned()]);
    }

    #[test]
    fn ignores_text_between_literals()
    {
        let segments = collect_string_segments(r#" "one"   /* gap */ "two" "#,).expect("segments",);
        assert_eq!(segments, vec!["one".to_owned(), "two".to_owned()]);
    }

    #[test]
    fn reports_missing_macro()
    {
        let error = extract_embedded_document("#define OTHER \"\"\n", "INTERNAL_YAML",)
            .expect_err("expected extraction error",);
        match error {
            Error::Extraction {
                message,
            } => assert_eq!(message, "could not find INTERNAL_YAML macro"),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn reports_unexpected_declaration_format()
    {
        let error = extract_embedded_document("#define INTERNAL_YAML \"version: 1\"\n", "INTERNAL_YAML",)
            .expect_err("expected extraction error",);
        assert!(error.to_string().contains("unexpected INTERNAL_YAML macro format"));
    }

    #[test]
    fn reports_declaration_without_segments()
    {
        let error = extract_embedded_document("#define INTERNAL_YAML \"\"\n", "INTERNAL_YAML",)
            .expect_err("expected extraction error",);
        assert!(error.to_string().contains("could not extract string literals"));
    }

    #[test]
    fn reports_unterminated_literal()
    {
        let error =
            extract_embedded_document("#define INTERNAL_YAML \"\" \"open\n", "INTERNAL_YAML",)
                .expect_err("expected extraction error",);
        assert!(error.to_string().contains("unterminated string literal"));
    }
}
