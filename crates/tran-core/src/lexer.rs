//! Lexer for the Tran language.
//!
//! Raw tokens come from `logos`. The [`Lexer`] wrapper turns line breaks and
//! leading whitespace into NEWLINE/INDENT/DEDENT tokens, drops brace comments
//! and splits the `accessor:`/`mutator:` keywords from their colon.

use std::fmt;

use logos::Logos;

use crate::error::{Error, Result};
use crate::span::{Position, Span};

/// Number of columns that make up one indentation level.
pub const INDENT_WIDTH: usize = 4;

/// Token kinds for the Tran language.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r]+")]
pub enum TokenKind {
    // Keywords
    #[token("accessor:")]
    Accessor,

    #[token("mutator:")]
    Mutator,

    #[token("class")]
    Class,

    #[token("interface")]
    Interface,

    #[token("implements")]
    Implements,

    #[token("loop")]
    Loop,

    #[token("if")]
    If,

    #[token("else")]
    Else,

    #[token("shared")]
    Shared,

    #[token("construct")]
    Construct,

    #[token("new")]
    New,

    #[token("private")]
    Private,

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("and")]
    #[token("&&")]
    And,

    #[token("or")]
    #[token("||")]
    Or,

    #[token("not")]
    #[token("!")]
    Not,

    // Punctuation
    #[token(".")]
    Dot,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    // Operators
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Times,

    #[token("/")]
    Divide,

    #[token("%")]
    Modulo,

    #[token("=")]
    Assign,

    #[token("==")]
    Equal,

    #[token("!=")]
    NotEqual,

    #[token("<")]
    LessThan,

    #[token("<=")]
    LessThanEqual,

    #[token(">")]
    GreaterThan,

    #[token(">=")]
    GreaterThanEqual,

    #[token("\n")]
    Newline,

    #[regex(r"[a-zA-Z]+")]
    Word,

    // A second decimal point starts a new number: `3.6.8` is `3.6` then `.8`.
    #[regex(r"[0-9]+(\.[0-9]+)?")]
    #[regex(r"\.[0-9]+")]
    Number,

    #[regex(r#""[^"]*""#)]
    QuotedString,

    #[regex(r"'[^']'")]
    QuotedCharacter,

    #[token("{", skip_comment)]
    Comment,

    // Synthesized from leading whitespace
    Indent,
    Dedent,
}

/// Consume a brace comment up to its balanced closing brace.
fn skip_comment(lex: &mut logos::Lexer<TokenKind>) -> bool {
    let mut depth = 1usize;
    for (idx, ch) in lex.remainder().char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    lex.bump(idx + 1);
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

impl TokenKind {
    /// Upper-case name used in diagnostics and token dumps.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Accessor => "ACCESSOR",
            TokenKind::Mutator => "MUTATOR",
            TokenKind::Class => "CLASS",
            TokenKind::Interface => "INTERFACE",
            TokenKind::Implements => "IMPLEMENTS",
            TokenKind::Loop => "LOOP",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::Shared => "SHARED",
            TokenKind::Construct => "CONSTRUCT",
            TokenKind::New => "NEW",
            TokenKind::Private => "PRIVATE",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::Not => "NOT",
            TokenKind::Dot => "DOT",
            TokenKind::Colon => "COLON",
            TokenKind::Comma => "COMMA",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Times => "TIMES",
            TokenKind::Divide => "DIVIDE",
            TokenKind::Modulo => "MODULO",
            TokenKind::Assign => "ASSIGN",
            TokenKind::Equal => "EQUAL",
            TokenKind::NotEqual => "NOTEQUAL",
            TokenKind::LessThan => "LESSTHAN",
            TokenKind::LessThanEqual => "LESSTHANEQUAL",
            TokenKind::GreaterThan => "GREATERTHAN",
            TokenKind::GreaterThanEqual => "GREATERTHANEQUAL",
            TokenKind::Newline => "NEWLINE",
            TokenKind::Word => "WORD",
            TokenKind::Number => "NUMBER",
            TokenKind::QuotedString => "QUOTEDSTRING",
            TokenKind::QuotedCharacter => "QUOTEDCHARACTER",
            TokenKind::Comment => "COMMENT",
            TokenKind::Indent => "INDENT",
            TokenKind::Dedent => "DEDENT",
        }
    }

    /// Tokens that end a simple statement.
    pub fn is_terminator(&self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::Dedent)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A token with its kind, literal text, and source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    pub fn line(&self) -> usize {
        self.span.line()
    }

    pub fn column(&self) -> usize {
        self.span.column()
    }
}

/// Lexer for the Tran language.
pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, TokenKind>,
    current_line: usize,
    line_start_offset: usize,
    at_line_start: bool,
    indent_level: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            inner: TokenKind::lexer(source),
            current_line: 1,
            line_start_offset: 0,
            at_line_start: true,
            indent_level: 0,
        }
    }

    /// Columns count characters, not bytes.
    fn position(&self, offset: usize) -> Position {
        let column = match self.source.get(self.line_start_offset..offset) {
            Some(prefix) => prefix.chars().count(),
            None => offset.saturating_sub(self.line_start_offset),
        };
        Position::new(self.current_line, column + 1, offset)
    }

    fn span(&self, range: std::ops::Range<usize>) -> Span {
        Span::new(self.position(range.start), self.position(range.end))
    }

    /// Account for line breaks inside a multi-line token.
    fn advance_lines(&mut self, start: usize, text: &str) {
        for (idx, ch) in text.char_indices() {
            if ch == '\n' {
                self.current_line += 1;
                self.line_start_offset = start + idx + 1;
            }
        }
    }

    /// Indentation level of the current line. A tab counts as four spaces.
    fn measure_indentation(&self) -> usize {
        let mut width = 0;
        for ch in self.source[self.line_start_offset..].chars() {
            match ch {
                ' ' => width += 1,
                '\t' => width += INDENT_WIDTH,
                _ => break,
            }
        }
        width / INDENT_WIDTH
    }

    /// Emit the INDENT or DEDENT tokens that move the running level to `level`.
    fn indent_to(&mut self, level: usize, span: Span, tokens: &mut Vec<Token>) {
        while self.indent_level < level {
            self.indent_level += 1;
            tokens.push(Token::new(TokenKind::Indent, "", span));
        }
        while self.indent_level > level {
            self.indent_level -= 1;
            tokens.push(Token::new(TokenKind::Dedent, "", span));
        }
    }

    fn error_for(&self, offset: usize, slice: &str) -> Error {
        let span = Span::point(self.position(offset));
        let message = match slice.chars().next() {
            Some('"') => "unterminated string literal".to_string(),
            Some('\'') => "character literal must contain exactly one character".to_string(),
            Some('{') => "unterminated comment".to_string(),
            Some('&') => "expected '&&'".to_string(),
            Some('|') => "expected '||'".to_string(),
            Some(c @ ('[' | ']' | '}')) => format!("unmatched bracket '{}'", c),
            Some(c) => format!("unexpected character '{}'", c),
            None => "unexpected end of input".to_string(),
        };
        tracing::debug!(line = span.line(), column = span.column(), %message, "lexical error");
        Error::lexical(message, span)
    }

    /// Tokenize the entire source.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        while let Some(result) = self.inner.next() {
            let range = self.inner.span();
            let text = self.inner.slice();
            let kind = match result {
                Ok(kind) => kind,
                Err(()) => return Err(self.error_for(range.start, text)),
            };

            match kind {
                TokenKind::Newline => {
                    tokens.push(Token::new(TokenKind::Newline, "", self.span(range.clone())));
                    self.current_line += 1;
                    self.line_start_offset = range.end;
                    self.at_line_start = true;
                }
                TokenKind::Comment => {
                    self.advance_lines(range.start, text);
                }
                _ => {
                    let span = self.span(range.clone());
                    if self.at_line_start {
                        self.at_line_start = false;
                        let level = self.measure_indentation();
                        self.indent_to(level, Span::point(span.start), &mut tokens);
                    }

                    match kind {
                        TokenKind::QuotedString | TokenKind::QuotedCharacter => {
                            let inner = &text[1..text.len() - 1];
                            tokens.push(Token::new(kind, inner, span));
                            self.advance_lines(range.start, text);
                        }
                        TokenKind::Accessor | TokenKind::Mutator => {
                            // `accessor:` is one keyword followed by its own COLON token.
                            let colon = self.span(range.end - 1..range.end);
                            tokens.push(Token::new(kind, text, span));
                            tokens.push(Token::new(TokenKind::Colon, ":", colon));
                        }
                        _ => tokens.push(Token::new(kind, text, span)),
                    }
                }
            }
        }

        // Close any indentation still open at end of input
        let end = Span::point(self.position(self.source.len()));
        self.indent_to(0, end, &mut tokens);

        tracing::trace!(count = tokens.len(), "lexed source");
        Ok(tokens)
    }
}

/// Tokenize source text.
pub fn lex(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).unwrap().iter().map(|t| t.kind).collect()
    }

    fn render(source: &str) -> String {
        kinds(source)
            .iter()
            .map(|k| k.name())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn texts(source: &str) -> Vec<String> {
        lex(source).unwrap().into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_simple_words() {
        let tokens = lex("jhdgf cd efshhs gjdjh").unwrap();
        assert_eq!(tokens.len(), 4);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Word));
        assert_eq!(texts("jhdgf cd efshhs gjdjh"), vec!["jhdgf", "cd", "efshhs", "gjdjh"]);
    }

    #[test]
    fn test_words_match_whitespace_split() {
        for source in ["a b c", "one", "alpha beta gamma delta", "x y"] {
            let expected: Vec<_> = source.split(' ').map(String::from).collect();
            assert_eq!(texts(source), expected);
            assert!(kinds(source).iter().all(|k| *k == TokenKind::Word));
        }
    }

    #[test]
    fn test_multiline_newlines() {
        let source = "jhg hggy huhygv njnyg\ngvyvchgvgbjm\nhbv iuhhj jhghj \n\nuyguvb";
        let tokens = lex(source).unwrap();
        assert_eq!(tokens.len(), 13);
        assert_eq!(tokens[4].kind, TokenKind::Newline);
        assert_eq!(tokens[5].text, "gvyvchgvgbjm");
        assert_eq!(tokens[10].kind, TokenKind::Newline);
        assert_eq!(tokens[11].kind, TokenKind::Newline);
        assert_eq!(tokens[12].text, "uyguvb");
        assert_eq!(tokens[12].line(), 5);
    }

    #[test]
    fn test_keywords() {
        let source = "class interface implements loop if else shared construct new private true false";
        insta::assert_snapshot!(
            render(source),
            @"CLASS INTERFACE IMPLEMENTS LOOP IF ELSE SHARED CONSTRUCT NEW PRIVATE TRUE FALSE"
        );
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert_eq!(kinds("Class IF"), vec![TokenKind::Word, TokenKind::Word]);
        assert_eq!(kinds("classy"), vec![TokenKind::Word]);
    }

    #[test]
    fn test_boolean_operator_spellings() {
        assert_eq!(
            kinds("and && or || not !"),
            vec![
                TokenKind::And,
                TokenKind::And,
                TokenKind::Or,
                TokenKind::Or,
                TokenKind::Not,
                TokenKind::Not,
            ]
        );
    }

    #[test]
    fn test_accessor_and_mutator_fold_colon() {
        let tokens = lex("accessor: accessor mutator: mutator").unwrap();
        let got: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            got,
            vec![
                TokenKind::Accessor,
                TokenKind::Colon,
                TokenKind::Word,
                TokenKind::Mutator,
                TokenKind::Colon,
                TokenKind::Word,
            ]
        );
        assert_eq!(tokens[2].text, "accessor");
        assert_eq!(tokens[5].text, "mutator");
    }

    #[test]
    fn test_comments_are_elided() {
        assert_eq!(lex("a {anything with no braces} b").unwrap().len(), 2);
        assert_eq!(texts("a {anything with no braces} b"), texts("a b"));
        assert_eq!(texts("jhdgf {cd efsh      h s} gjdjh 9.2"), vec!["jhdgf", "gjdjh", "9.2"]);
    }

    #[test]
    fn test_nested_comment_spanning_lines() {
        let source = "jsh{loop keepGoing\n    if n >= 15\n        keepGoing = false\n}";
        let tokens = lex(source).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "jsh");
        assert_eq!(lex("{jnjdubdbbf} {{}{}{}{}}").unwrap().len(), 0);
    }

    #[test]
    fn test_comment_advances_line_numbers() {
        let tokens = lex("{one\ntwo} word").unwrap();
        assert_eq!(tokens[0].line(), 2);
    }

    #[test]
    fn test_unbalanced_comments_fail() {
        for source in ["{{}", " {jnjdubdbbf", "{fjushd} {dkfj{{{{{}}{}"] {
            let err = lex(source).unwrap_err();
            assert!(err.is_lexical(), "{source:?} gave {err:?}");
            assert_eq!(err.message(), "unterminated comment");
        }
        let err = lex("jsh{loop keepGoing\n    if n >= 15\n").unwrap_err();
        assert!(err.is_lexical());
    }

    #[test]
    fn test_stray_characters_fail() {
        let err = lex(" [").unwrap_err();
        assert!(err.is_lexical());
        assert_eq!(err.span().unwrap().column(), 2);

        assert!(lex("a } b").unwrap_err().is_lexical());
        assert!(lex("x ; y").unwrap_err().is_lexical());
    }

    #[test]
    fn test_single_ampersand_and_pipe_fail() {
        assert_eq!(lex("a & b").unwrap_err().message(), "expected '&&'");
        assert_eq!(lex("a | b").unwrap_err().message(), "expected '||'");
    }

    #[test]
    fn test_numbers() {
        assert_eq!(texts("9 2 3 6"), vec!["9", "2", "3", "6"]);
        assert_eq!(texts("9.2 3.6"), vec!["9.2", "3.6"]);
        assert!(kinds("9 2.5 .7").iter().all(|k| *k == TokenKind::Number));
    }

    #[test]
    fn test_second_decimal_point_starts_new_number() {
        assert_eq!(texts("3.6.8"), vec!["3.6", ".8"]);
        assert_eq!(texts("9.2 3.6.8"), vec!["9.2", "3.6", ".8"]);
        assert_eq!(
            texts("9.2 3.6.8.8.99 2.5"),
            vec!["9.2", "3.6", ".8", ".8", ".99", "2.5"]
        );
        assert!(kinds("3.6.8.8.99").iter().all(|k| *k == TokenKind::Number));
    }

    #[test]
    fn test_number_followed_by_method_name() {
        assert_eq!(
            kinds("3.times"),
            vec![TokenKind::Number, TokenKind::Dot, TokenKind::Word]
        );
    }

    #[test]
    fn test_mixed_operators() {
        let tokens = lex("x==.5 m=1- zk7").unwrap();
        let got: Vec<_> = tokens.iter().map(|t| (t.kind, t.text.as_str())).collect();
        assert_eq!(
            got,
            vec![
                (TokenKind::Word, "x"),
                (TokenKind::Equal, "=="),
                (TokenKind::Number, ".5"),
                (TokenKind::Word, "m"),
                (TokenKind::Assign, "="),
                (TokenKind::Number, "1"),
                (TokenKind::Minus, "-"),
                (TokenKind::Word, "zk"),
                (TokenKind::Number, "7"),
            ]
        );
    }

    #[test]
    fn test_comparison_operators() {
        insta::assert_snapshot!(
            render("a < b <= c > d >= e != f == g"),
            @"WORD LESSTHAN WORD LESSTHANEQUAL WORD GREATERTHAN WORD GREATERTHANEQUAL WORD NOTEQUAL WORD EQUAL WORD"
        );
    }

    #[test]
    fn test_quoted_strings_span_lines() {
        let tokens = lex("test \"hello\nworld\" \"th\nere\" 1.2").unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[1].kind, TokenKind::QuotedString);
        assert_eq!(tokens[1].text, "hello\nworld");
        assert_eq!(tokens[2].text, "th\nere");
        assert_eq!(tokens[3].kind, TokenKind::Number);
        assert_eq!(tokens[3].line(), 3);
    }

    #[test]
    fn test_empty_string_literal() {
        let tokens = lex("\"\"").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::QuotedString);
        assert_eq!(tokens[0].text, "");
    }

    #[test]
    fn test_unterminated_string_fails() {
        let err = lex("\"{{}").unwrap_err();
        assert!(err.is_lexical());
        assert_eq!(err.message(), "unterminated string literal");
    }

    #[test]
    fn test_character_literals() {
        let tokens = lex("'a' 'Z'").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::QuotedCharacter);
        assert_eq!(tokens[0].text, "a");
        assert_eq!(tokens[1].text, "Z");

        for source in ["'ab'", "''", "'a"] {
            let err = lex(source).unwrap_err();
            assert!(err.is_lexical(), "{source:?}");
        }
    }

    #[test]
    fn test_interface_scenario() {
        insta::assert_snapshot!(
            render("interface someName\n\tcrazystuff()"),
            @"INTERFACE WORD NEWLINE INDENT WORD LPAREN RPAREN DEDENT"
        );
    }

    #[test]
    fn test_carriage_returns_are_ignored() {
        let tokens = lex("interface someName\r\n\tupdateClock()\r\n\tsquare() : number s").unwrap();
        assert_eq!(tokens.len(), 15);
        assert_eq!(tokens[7].kind, TokenKind::Newline);
        assert_eq!(tokens[11].kind, TokenKind::Colon);
        assert_eq!(tokens[14].kind, TokenKind::Dedent);
    }

    #[test]
    fn test_tab_indentation() {
        let source = "loop keepGoing\n\tif n >= 15\n\t\tkeepGoing = false\n";
        assert_eq!(lex(source).unwrap().len(), 16);
        let spaced = "loop keepGoing\n    if n >= 15\n        keepGoing = false\n";
        assert_eq!(kinds(source), kinds(spaced));
    }

    #[test]
    fn test_dedent_between_declarations() {
        let source = "interface someName\n    square() : number s\nclass TranExample implements someName\n\tnumber m\n\t\taccessor:";
        let tokens = lex(source).unwrap();
        assert_eq!(tokens.len(), 26);
        assert_eq!(tokens[10].kind, TokenKind::Newline);
        assert_eq!(tokens[11].kind, TokenKind::Dedent);
        assert_eq!(tokens[12].kind, TokenKind::Class);
        assert_eq!(tokens[17].kind, TokenKind::Indent);
        assert_eq!(tokens[22].kind, TokenKind::Accessor);
        assert_eq!(tokens[24].kind, TokenKind::Dedent);
        assert_eq!(tokens[25].kind, TokenKind::Dedent);
    }

    #[test]
    fn test_multi_level_dedent() {
        let source = "a\n        b\nc";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Word,
                TokenKind::Newline,
                TokenKind::Indent,
                TokenKind::Indent,
                TokenKind::Word,
                TokenKind::Newline,
                TokenKind::Dedent,
                TokenKind::Dedent,
                TokenKind::Word,
            ]
        );
    }

    #[test]
    fn test_blank_lines_do_not_change_indentation() {
        let source = "a\n    b\n\n      \n    c";
        let got = kinds(source);
        let indents = got.iter().filter(|k| **k == TokenKind::Indent).count();
        assert_eq!(indents, 1);
    }

    #[test]
    fn test_indents_and_dedents_balance() {
        let sources = [
            "class A\n    shared start()\n        x = 1\n",
            "a\n\tb\n\t\tc\n\t\t\td",
            "a\n    b\nc\n    d\n        e\n",
            "interface I\n    m()\n",
            "",
        ];
        for source in sources {
            let got = kinds(source);
            let indents = got.iter().filter(|k| **k == TokenKind::Indent).count();
            let dedents = got.iter().filter(|k| **k == TokenKind::Dedent).count();
            assert_eq!(indents, dedents, "{source:?}");
        }
    }

    #[test]
    fn test_token_positions() {
        let tokens = lex("class Foo\n    bar()").unwrap();
        assert_eq!((tokens[0].line(), tokens[0].column()), (1, 1));
        assert_eq!((tokens[1].line(), tokens[1].column()), (1, 7));
        assert_eq!((tokens[4].line(), tokens[4].column()), (2, 5));
    }

    #[test]
    fn test_columns_count_characters() {
        let tokens = lex("x = \"héllo\" y").unwrap();
        assert_eq!(tokens[3].text, "y");
        assert_eq!(tokens[3].column(), 13);

        let tokens = lex("{ ünïcode } z").unwrap();
        assert_eq!(tokens[0].text, "z");
        assert_eq!(tokens[0].column(), 13);
    }
}
