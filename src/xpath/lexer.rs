//! Tokenizer for selector expressions.

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Comma,
    Pipe,
    Dot,
    DotDot,
    DoubleColon,
    Star,
    Plus,
    Minus,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Literal(String),
    Number(f64),
    Name(String),
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

pub(crate) fn tokenize(src: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let (token, width) = match (c, next) {
            ('/', Some('/')) => (Token::DoubleSlash, 2),
            ('/', _) => (Token::Slash, 1),
            ('[', _) => (Token::LBracket, 1),
            (']', _) => (Token::RBracket, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('@', _) => (Token::At, 1),
            (',', _) => (Token::Comma, 1),
            ('|', _) => (Token::Pipe, 1),
            ('*', _) => (Token::Star, 1),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('=', _) => (Token::Eq, 1),
            ('!', Some('=')) => (Token::NotEq, 2),
            ('<', Some('=')) => (Token::LtEq, 2),
            ('<', _) => (Token::Lt, 1),
            ('>', Some('=')) => (Token::GtEq, 2),
            ('>', _) => (Token::Gt, 1),
            (':', Some(':')) => (Token::DoubleColon, 2),
            ('.', Some('.')) => (Token::DotDot, 2),
            ('.', Some(d)) if d.is_ascii_digit() => {
                let (number, width) = lex_number(&chars[i..]);
                (Token::Number(number), width)
            }
            ('.', _) => (Token::Dot, 1),
            ('"' | '\'', _) => {
                let close = chars[i + 1..]
                    .iter()
                    .position(|&q| q == c)
                    .ok_or_else(|| format!("unterminated string literal at offset {i}"))?;
                let literal: String = chars[i + 1..i + 1 + close].iter().collect();
                (Token::Literal(literal), close + 2)
            }
            (d, _) if d.is_ascii_digit() => {
                let (number, width) = lex_number(&chars[i..]);
                (Token::Number(number), width)
            }
            (s, _) if is_name_start(s) => {
                let width = lex_name(&chars[i..]);
                (Token::Name(chars[i..i + width].iter().collect()), width)
            }
            (other, _) => return Err(format!("unexpected character `{other}` at offset {i}")),
        };

        tokens.push(token);
        i += width;
    }

    Ok(tokens)
}

fn lex_number(chars: &[char]) -> (f64, usize) {
    let mut width = 0;
    let mut seen_dot = false;
    while let Some(&c) = chars.get(width) {
        if c.is_ascii_digit() {
            width += 1;
        } else if c == '.' && !seen_dot && chars.get(width + 1) != Some(&'.') {
            seen_dot = true;
            width += 1;
        } else {
            break;
        }
    }
    let text: String = chars[..width].iter().collect();
    (text.parse().unwrap_or(f64::NAN), width)
}

/// Width of a name, allowing one `prefix:local` colon but never `::`.
fn lex_name(chars: &[char]) -> usize {
    let mut width = 1;
    while let Some(&c) = chars.get(width) {
        if is_name_char(c) {
            width += 1;
        } else if c == ':'
            && chars.get(width + 1).is_some_and(|&n| is_name_start(n))
            && !chars[..width].contains(&':')
        {
            width += 1;
        } else {
            break;
        }
    }
    width
}
