//! Locating positions in a tree by what the surrounding text means: word boundaries and the
//! bracket that closes a code block.

use crate::Tree;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenRole {
    #[default]
    None,
    Comment,
    String,
    Keyword,
    Number,
    Operator,
    Identifier,
}

/// A classified range of chars, `start` inclusive and `end` exclusive.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    pub start: usize,
    pub end: usize,
    pub role: TokenRole,
}

/// Supplies syntax information for the text in a tree, usually backed by a syntax parser.
pub trait TokenClassifier {
    /// Returns the token covering `pos`, or a default token if there is none.
    fn token_at_position(&self, pos: usize) -> Token;
}

/// Finds the bracket matching the one at `pos`. Opening brackets (`(`, `[`, `{`) are matched by
/// scanning forward and closing ones by scanning backward.
///
/// With a classifier, only brackets in the same string or comment token as the one at `pos` are
/// counted, so a bracket inside a string literal never matches one in code and vice versa.
pub fn matching_code_block_delimiter(
    tree: &Tree,
    classifier: Option<&dyn TokenClassifier>,
    pos: usize,
) -> Option<usize> {
    let start_token = string_or_comment_token_at(classifier, pos);
    let delimiters = match tree.reader_at_position(pos).next()? {
        '(' => Delimiters::forward('(', ')'),
        ')' => Delimiters::backward('(', ')'),
        '[' => Delimiters::forward('[', ']'),
        ']' => Delimiters::backward('[', ']'),
        '{' => Delimiters::forward('{', '}'),
        '}' => Delimiters::backward('{', '}'),
        _ => return None,
    };

    let mut depth = 1usize;
    let mut track = |delim_pos: usize, ch: char| {
        if ch != delimiters.nest && ch != delimiters.unnest {
            return false;
        }
        if string_or_comment_token_at(classifier, delim_pos) != start_token {
            return false;
        }
        if ch == delimiters.nest {
            depth += 1;
        } else {
            depth -= 1;
        }
        depth == 0
    };

    if delimiters.is_forward {
        let mut reader = tree.reader_at_position(pos + 1);
        loop {
            let delim_pos = reader.position();
            if track(delim_pos, reader.next()?) {
                return Some(delim_pos);
            }
        }
    } else {
        let mut reader = tree.reverse_reader_at_position(pos);
        loop {
            let ch = reader.next()?;
            if track(reader.position(), ch) {
                return Some(reader.position());
            }
        }
    }
}

struct Delimiters {
    is_forward: bool,
    // the delimiter that opens another level in the scan direction
    nest: char,
    unnest: char,
}

impl Delimiters {
    fn forward(open: char, close: char) -> Self {
        Self {
            is_forward: true,
            nest: open,
            unnest: close,
        }
    }

    fn backward(open: char, close: char) -> Self {
        Self {
            is_forward: false,
            nest: close,
            unnest: open,
        }
    }
}

fn string_or_comment_token_at(classifier: Option<&dyn TokenClassifier>, pos: usize) -> Token {
    let Some(classifier) = classifier else {
        return Token::default();
    };
    let token = classifier.token_at_position(pos);
    match token.role {
        TokenRole::Comment | TokenRole::String => token,
        _ => Token::default(),
    }
}

/// Start of the next word after `pos`. A word starts at a non-whitespace char that follows a char
/// of another class, or that starts a syntax token. The start of an empty line also counts.
/// Stops on the last char of the text if there is no next word.
pub fn next_word_start(
    tree: &Tree,
    classifier: Option<&dyn TokenClassifier>,
    pos: usize,
) -> usize {
    let mut reader = tree.reader_at_position(pos);
    let Some(mut prev) = reader.next() else {
        return pos;
    };
    let mut prev_pos = pos;
    let mut seen_newline = prev == '\n';

    loop {
        let char_pos = reader.position();
        let Some(ch) = reader.next() else {
            return prev_pos;
        };
        if ch == '\n' {
            if seen_newline {
                return char_pos;
            }
            seen_newline = true;
        }
        if !ch.is_whitespace() && is_word_boundary(classifier, prev, ch, char_pos) {
            return char_pos;
        }
        prev = ch;
        prev_pos = char_pos;
    }
}

/// Last char of the word that ends after `pos`. Empty lines are not word boundaries here.
pub fn next_word_end(
    tree: &Tree,
    classifier: Option<&dyn TokenClassifier>,
    pos: usize,
) -> usize {
    let mut reader = tree.reader_at_position(pos);
    let Some(mut prev) = reader.next() else {
        return pos;
    };
    let mut prev_pos = pos;

    loop {
        let char_pos = reader.position();
        let Some(ch) = reader.next() else {
            return prev_pos;
        };
        if prev_pos > pos
            && !prev.is_whitespace()
            && is_word_boundary(classifier, prev, ch, char_pos)
        {
            return prev_pos;
        }
        prev = ch;
        prev_pos = char_pos;
    }
}

/// Start of the word before `pos`, or of the word `pos` is in if `pos` is not its first char.
/// Empty lines count as words. Returns 0 if there is no such word.
pub fn prev_word_start(
    tree: &Tree,
    classifier: Option<&dyn TokenClassifier>,
    pos: usize,
) -> usize {
    let mut reader = tree.reverse_reader_at_position(pos);
    // the char right after the one just read
    let mut next: Option<char> = None;

    while let Some(ch) = reader.next() {
        let char_pos = reader.position();
        if let Some(next) = next {
            let word_starts =
                !next.is_whitespace() && is_word_boundary(classifier, ch, next, char_pos + 1);
            let empty_line = ch == '\n' && next == '\n';
            if word_starts || empty_line {
                return char_pos + 1;
            }
        }
        next = Some(ch);
    }
    0
}

/// First char of the word or whitespace run holding `pos`, never crossing a line break.
pub fn current_word_start(
    tree: &Tree,
    classifier: Option<&dyn TokenClassifier>,
    pos: usize,
) -> usize {
    let Some(mut next) = tree.reader_at_position(pos).next() else {
        return pos;
    };
    if next == '\n' {
        return pos;
    }

    let mut start = pos;
    let mut reader = tree.reverse_reader_at_position(pos);
    while let Some(ch) = reader.next() {
        if ch == '\n' || is_word_boundary(classifier, ch, next, start) {
            break;
        }
        start = reader.position();
        next = ch;
    }
    start
}

/// Position just past the word or whitespace run holding `pos`, never crossing a line break.
pub fn current_word_end(
    tree: &Tree,
    classifier: Option<&dyn TokenClassifier>,
    pos: usize,
) -> usize {
    let mut reader = tree.reader_at_position(pos);
    let Some(mut prev) = reader.next() else {
        return pos;
    };
    if prev == '\n' {
        return pos;
    }

    loop {
        let char_pos = reader.position();
        match reader.next() {
            Some(ch) if ch != '\n' && !is_word_boundary(classifier, prev, ch, char_pos) => {
                prev = ch;
            }
            _ => return char_pos,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Whitespace,
    Punctuation,
    Word,
}

impl CharClass {
    fn of(ch: char) -> Self {
        if ch.is_whitespace() {
            CharClass::Whitespace
        } else if ch.is_alphanumeric() || ch == '_' {
            CharClass::Word
        } else {
            CharClass::Punctuation
        }
    }
}

/// Whether a word boundary lies between the adjacent chars `left` and `right`, where `right` is
/// at `right_pos`.
fn is_word_boundary(
    classifier: Option<&dyn TokenClassifier>,
    left: char,
    right: char,
    right_pos: usize,
) -> bool {
    CharClass::of(left) != CharClass::of(right) || is_token_start(classifier, right_pos)
}

fn is_token_start(classifier: Option<&dyn TokenClassifier>, pos: usize) -> bool {
    classifier.is_some_and(|classifier| {
        let token = classifier.token_at_position(pos);
        token.role != TokenRole::None && token.start == pos && token.end > pos
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedTokens(Vec<Token>);

    impl TokenClassifier for FixedTokens {
        fn token_at_position(&self, pos: usize) -> Token {
            self.0
                .iter()
                .find(|token| token.start <= pos && pos < token.end)
                .copied()
                .unwrap_or_default()
        }
    }

    fn token(start: usize, end: usize, role: TokenRole) -> Token {
        Token { start, end, role }
    }

    #[test]
    fn test_matching_delimiter_without_classifier() {
        let test_cases = [
            ("empty", "", 0, None),
            ("not a delimiter", "abc", 1, None),
            ("past end", "()", 5, None),
            ("paren forward", "(abc)", 0, Some(4)),
            ("paren backward", "(abc)", 4, Some(0)),
            ("bracket forward", "x[1, 2]", 1, Some(6)),
            ("brace backward", "{ a }", 4, Some(0)),
            ("nested forward", "{[()]}", 0, Some(5)),
            ("nested inner", "{[()]}", 1, Some(4)),
            ("nested backward", "{[()]}", 3, Some(2)),
            ("same kind nested", "((a)(b))", 0, Some(7)),
            ("same kind nested backward", "((a)(b))", 6, Some(4)),
            ("unmatched open", "((a)", 0, None),
            ("unmatched close", "a))", 2, None),
            ("other kinds ignored", "(]})", 0, Some(3)),
            ("multi-byte text", "(£፴\u{10AAAA})", 0, Some(4)),
        ];

        for (name, text, pos, expected) in test_cases {
            let tree = Tree::from(text);
            assert_eq!(
                matching_code_block_delimiter(&tree, None, pos),
                expected,
                "{name}"
            );
        }
    }

    #[test]
    fn test_matching_delimiter_skips_strings() {
        // f("(", x)
        let tree = Tree::from("f(\"(\", x)");
        let classifier = FixedTokens(vec![token(2, 5, TokenRole::String)]);
        assert_eq!(
            matching_code_block_delimiter(&tree, Some(&classifier), 1),
            Some(8)
        );
        assert_eq!(
            matching_code_block_delimiter(&tree, Some(&classifier), 8),
            Some(1)
        );
        // the bracket inside the string has no partner in that string
        assert_eq!(
            matching_code_block_delimiter(&tree, Some(&classifier), 3),
            None
        );
        // without syntax information the string bracket counts
        assert_eq!(matching_code_block_delimiter(&tree, None, 1), None);
    }

    #[test]
    fn test_matching_delimiter_skips_comments() {
        // (a // )\n)
        let tree = Tree::from("(a // )\n)");
        let classifier = FixedTokens(vec![token(3, 7, TokenRole::Comment)]);
        assert_eq!(
            matching_code_block_delimiter(&tree, Some(&classifier), 0),
            Some(8)
        );
        assert_eq!(
            matching_code_block_delimiter(&tree, Some(&classifier), 6),
            None
        );
    }

    #[test]
    fn test_matching_delimiter_ignores_other_roles() {
        let tree = Tree::from("(x)");
        let classifier = FixedTokens(vec![
            token(0, 1, TokenRole::Operator),
            token(1, 2, TokenRole::Identifier),
            token(2, 3, TokenRole::Operator),
        ]);
        assert_eq!(
            matching_code_block_delimiter(&tree, Some(&classifier), 0),
            Some(2)
        );
    }

    #[test]
    fn test_matching_delimiter_across_leaves() {
        let body = "(x)".repeat(500);
        let text = format!("{{{body}}}");
        let tree = Tree::from(text.as_str());
        let close = text.chars().count() - 1;
        assert_eq!(matching_code_block_delimiter(&tree, None, 0), Some(close));
        assert_eq!(matching_code_block_delimiter(&tree, None, close), Some(0));
        assert_eq!(matching_code_block_delimiter(&tree, None, 301), Some(303));
    }

    type WordLocator = fn(&Tree, Option<&dyn TokenClassifier>, usize) -> usize;

    // (name, text, with syntax tokens, pos, expected)
    type WordCase = (&'static str, &'static str, bool, usize, usize);

    fn syntax_tokens(text: &str) -> Vec<Token> {
        use TokenRole::*;
        match text {
            "123+456" => vec![token(0, 3, Number), token(3, 4, Operator), token(4, 7, Number)],
            "123    +      456" => vec![
                token(0, 3, Number),
                token(7, 8, Operator),
                token(14, 17, Number),
            ],
            "//    foobar" => vec![token(0, 12, Comment)],
            "// abcd" => vec![token(0, 7, Comment)],
            "\"    abcd    \"" => vec![token(0, 14, String)],
            "iffoo" => vec![token(0, 2, Keyword), token(2, 5, Identifier)],
            _ => panic!("no syntax tokens for {text:?}"),
        }
    }

    fn check_word_cases(locate: WordLocator, cases: &[WordCase]) {
        for &(name, text, with_syntax, pos, expected) in cases {
            let tree = Tree::from(text);
            let classifier = with_syntax.then(|| FixedTokens(syntax_tokens(text)));
            let classifier = classifier
                .as_ref()
                .map(|classifier| classifier as &dyn TokenClassifier);
            assert_eq!(locate(&tree, classifier, pos), expected, "{name}");
        }
    }

    #[test]
    fn test_next_word_start() {
        check_word_cases(
            next_word_start,
            &[
                ("empty", "", false, 0, 0),
                ("from current word, same line", "abc   defg   hij", false, 1, 6),
                ("from whitespace, same line", "abc   defg   hij", false, 4, 6),
                ("from different line", "abc\n   123", false, 1, 7),
                ("to empty line", "abc\n\n   123", false, 1, 4),
                ("empty line to next word", "abc\n\n   123", false, 4, 8),
                ("multiple empty lines", "\n\n\n\n", false, 1, 2),
                ("next syntax token", "123+456", true, 1, 3),
                ("next syntax token skip empty", "123    +      456", true, 1, 7),
                ("syntax token starts with whitespace", "//    foobar", true, 0, 6),
                ("adjacent tokens of one char class", "iffoo", true, 0, 2),
                ("punctuation without syntax", "abc+def", false, 0, 3),
                ("last word stops on last char", "abc def", false, 5, 6),
            ],
        );
    }

    #[test]
    fn test_next_word_end() {
        check_word_cases(
            next_word_end,
            &[
                ("empty", "", false, 0, 0),
                ("from start of current word", "abc   defg   hij", false, 6, 9),
                ("from middle of current word", "abc   defg   hij", false, 7, 9),
                ("from end of current word", "abc   defg   hij", false, 2, 9),
                ("from whitespace", "abc   defg   hij", false, 4, 9),
                ("past empty line", "abc\n\n   123   xyz", false, 2, 10),
                ("empty line to next word", "abc\n\n   123  xyz", false, 4, 10),
                ("next syntax token", "123+456", true, 2, 3),
                ("next syntax token skip empty", "123    +      456", true, 2, 7),
                ("syntax token ends with whitespace", "\"    abcd    \"", true, 8, 13),
                ("end of current syntax token", "123+456", true, 0, 2),
            ],
        );
    }

    #[test]
    fn test_prev_word_start() {
        check_word_cases(
            prev_word_start,
            &[
                ("empty", "", false, 0, 0),
                ("from current word, same line", "abc   defg   hij", false, 6, 0),
                ("from whitespace, same line", "abc   defg   hij", false, 12, 6),
                ("from different line", "abc\n   123", false, 7, 0),
                ("to empty line", "abc\n\n   123", false, 8, 4),
                ("empty line to prev word", "abc\n\n   123", false, 4, 0),
                ("multiple empty lines", "\n\n\n\n", false, 2, 1),
                ("prev syntax token", "123+456", true, 4, 3),
                ("prev syntax token skip empty", "123    +      456", true, 14, 7),
                ("syntax token starts with whitespace", "// abcd", true, 3, 0),
                ("adjacent tokens of one char class", "iffoo", true, 4, 2),
                ("middle of word to its start", "abc def", false, 5, 4),
            ],
        );
    }

    #[test]
    fn test_current_word_start() {
        check_word_cases(
            current_word_start,
            &[
                ("empty", "", false, 0, 0),
                ("start of document", "abc   defg   hij", false, 0, 0),
                ("start of word in middle of document", "abc   defg   hij", false, 6, 6),
                ("middle of word", "abc   defg   hij", false, 8, 6),
                ("end of word", "abc   defg   hij", false, 9, 6),
                ("start of whitespace", "abc   defg   hij", false, 3, 3),
                ("middle of whitespace", "abc   defg   hij", false, 4, 3),
                ("end of whitespace", "abc   defg   hij", false, 5, 3),
                ("word at start of line", "abc\nxyz", false, 5, 4),
                ("whitespace at start of line", "abc\n    xyz", false, 6, 4),
                ("empty line", "abc\n\n   123", false, 4, 4),
                ("adjacent syntax tokens", "123+456", true, 5, 4),
                ("adjacent tokens of one char class", "iffoo", true, 3, 2),
            ],
        );
    }

    #[test]
    fn test_current_word_end() {
        check_word_cases(
            current_word_end,
            &[
                ("empty", "", false, 0, 0),
                ("end of document", "abc   defg   hijk", false, 14, 17),
                ("start of word in middle of document", "abc   defg   hij", false, 6, 10),
                ("middle of word", "abc   defg   hij", false, 7, 10),
                ("end of word", "abc   defg   hij", false, 9, 10),
                ("start of whitespace", "abc   defg   hij", false, 3, 6),
                ("middle of whitespace", "abc   defg   hij", false, 4, 6),
                ("end of whitespace", "abc   defg   hij", false, 5, 6),
                ("word before end of line", "abc\nxyz", false, 1, 3),
                ("whitespace at end of line", "abc     \nxyz", false, 4, 8),
                ("empty line", "abc\n\n   123", false, 4, 4),
                ("adjacent syntax tokens", "123+456", true, 1, 3),
                ("adjacent tokens of one char class", "iffoo", true, 0, 2),
            ],
        );
    }

    #[test]
    fn test_word_locators_across_leaves() {
        let words: Vec<String> = (0..200)
            .map(|i| format!("w{i:03}éßx"))
            .collect();
        let text = words.join(" ");
        let tree = Tree::from(text.as_str());
        let word_len = 7;

        for i in 0..words.len() - 1 {
            let start = i * (word_len + 1);
            let end = start + word_len;
            assert_eq!(next_word_start(&tree, None, start), end + 1);
            assert_eq!(next_word_end(&tree, None, start), end - 1);
            assert_eq!(current_word_start(&tree, None, end - 1), start);
            assert_eq!(current_word_end(&tree, None, start), end);
            assert_eq!(prev_word_start(&tree, None, end + 1), start);
        }
    }
}
