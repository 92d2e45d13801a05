//! Compact s-expression notation for trees.
//!
//! Used to write trees by hand in tests and fix providers, and to dump a
//! snapshot for inspection.
//!
//! ## Grammar
//!
//! ```text
//! <element> := "(" <kind> (<item>)* ")"
//! <item>    := <element> | <string>
//! <string>  := '"' (char | '\"' | '\\' | '\n' | '\t' | '\r')* '"'
//! ```
//!
//! A string that is entirely whitespace and comments becomes trivia. Any
//! other string is one token, with surrounding whitespace split off as
//! trivia; its kind is inferred from its text. A token kind used as an
//! element, as in `(identifier "var")`, forces the kind.
//!
//! ## Example
//!
//! ```text
//! (if_statement "if " "(" (identifier_name "x") ") "
//!   (expression_statement
//!     (invocation_expression (identifier_name "Foo") (argument_list "(" ")")) ";"))
//! ```

use std::sync::Arc;

use winnow::ascii::multispace0;
use winnow::combinator::{alt, preceded, repeat};
use winnow::error::{ErrMode, ParserError};
use winnow::prelude::*;
use winnow::token::{any, take_till, take_while};
use winnow::ModalResult;

use super::builder::TreeBuilder;
use super::green::{GreenNode, Trivia};
use super::kinds::{is_keyword, SyntaxKind};
use super::syntax::SyntaxTree;
use super::trivia::{is_trivia, lex_trivia};
use super::TreeError;

#[derive(Debug)]
struct Element {
    kind: String,
    /// Input length remaining where the kind name starts.
    rest_at_kind: usize,
    items: Vec<Item>,
}

#[derive(Debug)]
enum Item {
    Node(Element),
    Text(String),
}

/// Parse notation into a green subtree.
pub fn parse_green(input: &str) -> Result<Arc<GreenNode>, TreeError> {
    let trimmed = input.trim();
    let element = parse_element.parse(trimmed).map_err(|e| TreeError::Notation {
        offset: e.offset(),
        message: "expected `(kind ...)` with quoted strings".to_string(),
    })?;

    let mut builder = TreeBuilder::new();
    emit(&element, trimmed.len(), &mut builder)?;
    builder.finish()
}

/// Parse notation into a tree for `path`.
pub fn parse_tree(path: &str, input: &str) -> Result<SyntaxTree, TreeError> {
    Ok(SyntaxTree::new(path, parse_green(input)?))
}

/// Render a subtree as notation, one interior node per line.
pub fn to_notation(node: &GreenNode) -> String {
    let mut out = String::new();
    write_element(node, 0, &mut out);
    out
}

/// Infer a token kind from its text.
pub fn classify_token(text: &str) -> SyntaxKind {
    let mut chars = text.chars();
    let first = chars.next().unwrap_or(' ');
    if first == '"' || text.starts_with("@\"") || text.starts_with("$\"") {
        SyntaxKind::StringLiteral
    } else if first == '\'' {
        SyntaxKind::CharacterLiteral
    } else if first.is_ascii_digit() {
        SyntaxKind::NumericLiteral
    } else if is_keyword(text) {
        SyntaxKind::Keyword
    } else if (first.is_alphabetic() || first == '_' || first == '@')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
    {
        SyntaxKind::Identifier
    } else {
        SyntaxKind::Punctuation
    }
}

// ============================================================================
// Reading
// ============================================================================

fn emit(element: &Element, total: usize, builder: &mut TreeBuilder) -> Result<(), TreeError> {
    let offset = total - element.rest_at_kind;
    let kind = SyntaxKind::from_name(&element.kind).ok_or_else(|| TreeError::Notation {
        offset,
        message: format!("unknown kind '{}'", element.kind),
    })?;

    if kind.is_token() {
        return match element.items.as_slice() {
            [Item::Text(text)] => emit_text(text, Some(kind), offset, builder),
            _ => Err(TreeError::Notation {
                offset,
                message: format!("token kind '{}' takes exactly one string", kind),
            }),
        };
    }

    builder.start_node(kind)?;
    for item in &element.items {
        match item {
            Item::Node(child) => emit(child, total, builder)?,
            Item::Text(text) => emit_text(text, None, offset, builder)?,
        }
    }
    builder.finish_node()
}

fn emit_text(
    text: &str,
    kind: Option<SyntaxKind>,
    offset: usize,
    builder: &mut TreeBuilder,
) -> Result<(), TreeError> {
    if kind.is_none() && is_trivia(text) {
        builder.trivia_all(lex_trivia(text, offset)?);
        return Ok(());
    }

    const SPACE: [char; 4] = [' ', '\t', '\r', '\n'];
    let start = text.len() - text.trim_start_matches(SPACE).len();
    let end = text.trim_end_matches(SPACE).len();
    if start >= end {
        return Err(TreeError::Notation {
            offset,
            message: "token text is empty".to_string(),
        });
    }

    let core = &text[start..end];
    builder.trivia_all(lex_trivia(&text[..start], offset)?);
    builder.token(kind.unwrap_or_else(|| classify_token(core)), core)?;
    builder.trivia_all(lex_trivia(&text[end..], offset)?);
    Ok(())
}

fn parse_element(input: &mut &str) -> ModalResult<Element> {
    let _ = '('.parse_next(input)?;
    let _ = multispace0.parse_next(input)?;
    let rest_at_kind = input.len();
    let kind: &str =
        take_while(1.., |c: char| c.is_ascii_lowercase() || c == '_').parse_next(input)?;
    let items: Vec<Item> = repeat(0.., preceded(multispace0, parse_item)).parse_next(input)?;
    let _ = multispace0.parse_next(input)?;
    let _ = ')'.parse_next(input)?;
    Ok(Element {
        kind: kind.to_string(),
        rest_at_kind,
        items,
    })
}

fn parse_item(input: &mut &str) -> ModalResult<Item> {
    alt((parse_element.map(Item::Node), parse_quoted.map(Item::Text))).parse_next(input)
}

fn parse_quoted(input: &mut &str) -> ModalResult<String> {
    let _ = '"'.parse_next(input)?;
    let mut out = String::new();
    loop {
        let chunk: &str = take_till(0.., |c| c == '"' || c == '\\').parse_next(input)?;
        out.push_str(chunk);
        match any.parse_next(input)? {
            '"' => return Ok(out),
            _ => match any.parse_next(input)? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '"' => out.push('"'),
                '\\' => out.push('\\'),
                _ => return Err(ErrMode::from_input(input)),
            },
        }
    }
}

// ============================================================================
// Writing
// ============================================================================

fn write_element(node: &GreenNode, depth: usize, out: &mut String) {
    if let Some((leading, text, trailing)) = node.token_parts() {
        if !leading.is_empty() {
            write_trivia(leading, out);
            out.push(' ');
        }
        if classify_token(text) == node.kind() {
            write_quoted(text, out);
        } else {
            out.push('(');
            out.push_str(node.kind().name());
            out.push(' ');
            write_quoted(text, out);
            out.push(')');
        }
        if !trailing.is_empty() {
            out.push(' ');
            write_trivia(trailing, out);
        }
        return;
    }

    out.push('(');
    out.push_str(node.kind().name());
    for child in node.children() {
        if child.is_token() {
            out.push(' ');
            write_element(child, depth + 1, out);
        } else {
            out.push('\n');
            out.push_str(&"  ".repeat(depth + 1));
            write_element(child, depth + 1, out);
        }
    }
    out.push(')');
}

fn write_trivia(pieces: &[Trivia], out: &mut String) {
    let text: String = pieces.iter().map(|t| t.text.as_str()).collect();
    write_quoted(&text, out);
}

fn write_quoted(text: &str, out: &mut String) {
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    const IF_STATEMENT: &str = r#"
        (if_statement "if " "(" (identifier_name "x") ") "
          (expression_statement
            (invocation_expression (identifier_name "Foo") (argument_list "(" ")")) ";"))
    "#;

    mod reading {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn parses_nested_elements() {
            let root = parse_green(IF_STATEMENT).unwrap();
            assert_eq!(root.kind(), SyntaxKind::IfStatement);
            assert_eq!(root.text(), "if (x) Foo();");
            let tokens = root.tokens();
            assert_eq!(tokens[0].kind(), SyntaxKind::Keyword);
            assert_eq!(tokens[0].trailing_width(), 1);
            assert_eq!(tokens[2].kind(), SyntaxKind::Identifier);
        }

        #[test]
        fn trivia_strings_attach_by_line() {
            let root = parse_green(
                r#"(block "{" "\n" "    " (expression_statement (identifier_name "a") ";") "\n" "}")"#,
            )
            .unwrap();
            assert_eq!(root.text(), "{\n    a;\n}");
            let tokens = root.tokens();
            assert_eq!(tokens[0].trailing_trivia().len(), 1);
            assert_eq!(tokens[1].leading_trivia().len(), 1);
        }

        #[test]
        fn escapes_and_forced_kinds() {
            let root =
                parse_green(r#"(literal_expression (identifier "\"a\\b\"") )"#).unwrap();
            let tokens = root.tokens();
            assert_eq!(tokens[0].kind(), SyntaxKind::Identifier);
            assert_eq!(tokens[0].token_text(), Some("\"a\\b\""));
        }

        #[test]
        fn comments_become_trivia() {
            let root = parse_green(r#"(block "{" " // open\n" "}")"#).unwrap();
            assert_eq!(root.tokens()[0].trailing_trivia().len(), 3);
        }

        #[test]
        fn classify_by_text() {
            assert_eq!(classify_token("int"), SyntaxKind::Keyword);
            assert_eq!(classify_token("Int32"), SyntaxKind::Identifier);
            assert_eq!(classify_token("_x1"), SyntaxKind::Identifier);
            assert_eq!(classify_token("42"), SyntaxKind::NumericLiteral);
            assert_eq!(classify_token("\"s\""), SyntaxKind::StringLiteral);
            assert_eq!(classify_token("'c'"), SyntaxKind::CharacterLiteral);
            assert_eq!(classify_token("=="), SyntaxKind::Punctuation);
        }
    }

    mod errors {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn unknown_kind_reports_offset() {
            let err = parse_green(r#"(block (lambda "x"))"#).unwrap_err();
            match err {
                TreeError::Notation { offset, message } => {
                    assert_eq!(offset, 8);
                    assert!(message.contains("lambda"));
                }
                other => panic!("unexpected error: {:?}", other),
            }
        }

        #[test]
        fn unbalanced_parens() {
            assert!(matches!(
                parse_green(r#"(block "{""#),
                Err(TreeError::Notation { .. })
            ));
        }

        #[test]
        fn token_kind_needs_one_string() {
            assert!(parse_green(r#"(block (identifier "a" "b"))"#).is_err());
        }
    }

    mod writing {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn dump_reads_back_to_same_text() {
            let source = r#"(class_declaration "\n" "/// <summary/>\n" "public " "class " (identifier "C") " " "{" "}" "\n")"#;
            let root = parse_green(source).unwrap();
            let dumped = to_notation(&root);
            let reread = parse_green(&dumped).unwrap();
            assert_eq!(reread.text(), root.text());
            assert_eq!(reread.tokens().len(), root.tokens().len());
        }

        #[test]
        fn dump_forces_kind_when_text_disagrees() {
            let root = parse_green(r#"(identifier_name (identifier "get"))"#).unwrap();
            let dumped = to_notation(&root);
            assert_eq!(dumped, r#"(identifier_name (identifier "get"))"#);
        }
    }
}
