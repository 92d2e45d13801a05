//! Trivia lexing and attachment.
//!
//! Every byte of a unit that no token covers must be whitespace, a line
//! break or a comment. The lexer turns such a gap into trivia pieces; the
//! attachment rule then decides which token owns each piece.

use super::green::Trivia;
use super::kinds::TriviaKind;
use super::TreeError;

/// Lex a gap between tokens into trivia pieces.
///
/// `base` is the absolute offset of `text`, used only for error reporting.
pub fn lex_trivia(text: &str, base: usize) -> Result<Vec<Trivia>, TreeError> {
    let mut pieces = Vec::new();
    let mut rest = text;
    let mut offset = base;

    while !rest.is_empty() {
        let (kind, len) = next_piece(rest).ok_or_else(|| TreeError::SpanInvariant {
            offset,
            message: format!("text {:?} is not covered by a token", preview(rest)),
        })?;
        if len == 0 {
            return Err(TreeError::SpanInvariant {
                offset,
                message: "unterminated block comment".to_string(),
            });
        }
        pieces.push(Trivia::new(kind, &rest[..len]));
        rest = &rest[len..];
        offset += len;
    }

    Ok(pieces)
}

/// True if `text` lexes entirely as trivia.
pub fn is_trivia(text: &str) -> bool {
    lex_trivia(text, 0).is_ok()
}

fn next_piece(rest: &str) -> Option<(TriviaKind, usize)> {
    let bytes = rest.as_bytes();
    match bytes[0] {
        b' ' | b'\t' => {
            let len = bytes
                .iter()
                .position(|b| *b != b' ' && *b != b'\t')
                .unwrap_or(bytes.len());
            Some((TriviaKind::Whitespace, len))
        }
        b'\r' if bytes.get(1) == Some(&b'\n') => Some((TriviaKind::EndOfLine, 2)),
        b'\r' | b'\n' => Some((TriviaKind::EndOfLine, 1)),
        b'/' if rest.starts_with("/*") => {
            // Zero length marks an unterminated comment.
            let len = rest[2..].find("*/").map(|i| i + 4).unwrap_or(0);
            Some((TriviaKind::MultiLineComment, len))
        }
        b'/' if rest.starts_with("//") => {
            let len = rest.find(['\r', '\n']).unwrap_or(rest.len());
            let kind = if rest.starts_with("///") && !rest.starts_with("////") {
                TriviaKind::DocComment
            } else {
                TriviaKind::SingleLineComment
            };
            Some((kind, len))
        }
        _ => None,
    }
}

fn preview(text: &str) -> String {
    text.chars().take(16).collect()
}

/// Split the trivia between two tokens.
///
/// The earlier token keeps everything up to and including the first line
/// break as trailing trivia; the rest leads the later token.
pub fn split_at_line_end(mut pieces: Vec<Trivia>) -> (Vec<Trivia>, Vec<Trivia>) {
    match pieces.iter().position(|t| t.kind == TriviaKind::EndOfLine) {
        Some(i) => {
            let leading = pieces.split_off(i + 1);
            (pieces, leading)
        }
        None => (pieces, Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(pieces: &[Trivia]) -> Vec<TriviaKind> {
        pieces.iter().map(|t| t.kind).collect()
    }

    mod lexing {
        use super::*;

        #[test]
        fn whitespace_and_line_breaks() {
            let pieces = lex_trivia("  \r\n\t\n", 0).unwrap();
            assert_eq!(
                kinds(&pieces),
                vec![
                    TriviaKind::Whitespace,
                    TriviaKind::EndOfLine,
                    TriviaKind::Whitespace,
                    TriviaKind::EndOfLine,
                ]
            );
            assert_eq!(pieces[1].text, "\r\n");
        }

        #[test]
        fn comments_stop_before_line_end() {
            let pieces = lex_trivia("// note\n/// <summary/>\n//// old\n", 0).unwrap();
            assert_eq!(
                kinds(&pieces),
                vec![
                    TriviaKind::SingleLineComment,
                    TriviaKind::EndOfLine,
                    TriviaKind::DocComment,
                    TriviaKind::EndOfLine,
                    TriviaKind::SingleLineComment,
                    TriviaKind::EndOfLine,
                ]
            );
            assert_eq!(pieces[0].text, "// note");
        }

        #[test]
        fn block_comment_spans_lines() {
            let pieces = lex_trivia("/* a\n b */ ", 0).unwrap();
            assert_eq!(pieces[0].kind, TriviaKind::MultiLineComment);
            assert_eq!(pieces[0].text, "/* a\n b */");
        }

        #[test]
        fn unterminated_block_comment_fails() {
            let err = lex_trivia(" /* open", 10).unwrap_err();
            assert!(matches!(err, TreeError::SpanInvariant { offset: 11, .. }));
        }

        #[test]
        fn stray_text_fails_with_offset() {
            let err = lex_trivia("  x", 4).unwrap_err();
            match err {
                TreeError::SpanInvariant { offset, message } => {
                    assert_eq!(offset, 6);
                    assert!(message.contains("\"x\""));
                }
                other => panic!("unexpected error: {:?}", other),
            }
        }

        #[test]
        fn is_trivia_checks_whole_text() {
            assert!(is_trivia(" \n// c"));
            assert!(is_trivia(""));
            assert!(!is_trivia(" ;"));
        }
    }

    mod attachment {
        use super::*;

        #[test]
        fn trailing_takes_through_first_line_break() {
            let pieces = lex_trivia(" // c\n    ", 0).unwrap();
            let (trailing, leading) = split_at_line_end(pieces);
            assert_eq!(
                kinds(&trailing),
                vec![
                    TriviaKind::Whitespace,
                    TriviaKind::SingleLineComment,
                    TriviaKind::EndOfLine,
                ]
            );
            assert_eq!(kinds(&leading), vec![TriviaKind::Whitespace]);
        }

        #[test]
        fn same_line_gap_is_all_trailing() {
            let pieces = lex_trivia(" /* c */ ", 0).unwrap();
            let (trailing, leading) = split_at_line_end(pieces);
            assert_eq!(trailing.len(), 3);
            assert!(leading.is_empty());
        }
    }
}
