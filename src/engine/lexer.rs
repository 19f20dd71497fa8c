//! Tokenizer for the calculator language

use super::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// Numeric literal with the significant figures it was written with
    Number { value: f64, sigfigs: u32 },
    Str(String),
    Ident(String),
    Let,
    Return,
    True,
    False,
    And,
    Or,
    Not,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
    Comma,
    Assign,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Newline or `;`
    Separator,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    /// Character offset of the token start
    pub pos: usize,
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>, EvalError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;

        let token = match c {
            '\n' | ';' => {
                i += 1;
                Token::Separator
            }
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            c if c.is_ascii_digit() || (c == '.' && peek_digit(&chars, i + 1)) => {
                let (token, next) = lex_number(&chars, i)?;
                i = next;
                token
            }
            '"' => {
                let (text, next) = lex_string(&chars, i)?;
                i = next;
                Token::Str(text)
            }
            c if c.is_alphabetic() || c == '_' => {
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                keyword(&word).unwrap_or(Token::Ident(word))
            }
            _ => {
                let (token, width) = lex_operator(&chars, i).ok_or_else(|| EvalError::Syntax {
                    position: i,
                    message: format!("unexpected character '{}'", c),
                })?;
                i += width;
                token
            }
        };

        tokens.push(Spanned { token, pos: start });
    }

    tokens.push(Spanned {
        token: Token::Eof,
        pos: chars.len(),
    });
    Ok(tokens)
}

fn peek_digit(chars: &[char], i: usize) -> bool {
    chars.get(i).is_some_and(char::is_ascii_digit)
}

fn keyword(word: &str) -> Option<Token> {
    Some(match word {
        "let" => Token::Let,
        "return" => Token::Return,
        "true" => Token::True,
        "false" => Token::False,
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        _ => return None,
    })
}

fn lex_operator(chars: &[char], i: usize) -> Option<(Token, usize)> {
    let next = chars.get(i + 1).copied();
    let pair = match (chars[i], next) {
        ('=', Some('=')) => Some(Token::Eq),
        ('!', Some('=')) => Some(Token::Ne),
        ('<', Some('=')) => Some(Token::Le),
        ('>', Some('=')) => Some(Token::Ge),
        _ => None,
    };
    if let Some(token) = pair {
        return Some((token, 2));
    }

    let single = match chars[i] {
        '+' => Token::Plus,
        '-' => Token::Minus,
        '*' => Token::Star,
        '/' => Token::Slash,
        '%' => Token::Percent,
        '^' => Token::Caret,
        '(' => Token::LParen,
        ')' => Token::RParen,
        ',' => Token::Comma,
        '=' => Token::Assign,
        '<' => Token::Lt,
        '>' => Token::Gt,
        _ => return None,
    };
    Some((single, 1))
}

fn lex_number(chars: &[char], start: usize) -> Result<(Token, usize), EvalError> {
    let mut i = start;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if i < chars.len() && chars[i] == '.' {
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
    }
    let mantissa_end = i;

    // exponent only when digits follow, so `2e` stays `2` then ident `e`
    if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
        let mut j = i + 1;
        if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
            j += 1;
        }
        if peek_digit(chars, j) {
            while j < chars.len() && chars[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }

    let text: String = chars[start..i].iter().collect();
    let value = text.parse::<f64>().map_err(|_| EvalError::Syntax {
        position: start,
        message: format!("invalid number '{}'", text),
    })?;
    let mantissa: String = chars[start..mantissa_end].iter().collect();

    Ok((
        Token::Number {
            value,
            sigfigs: count_sigfigs(&mantissa),
        },
        i,
    ))
}

/// Significant figures of a written number: leading zeros never count,
/// trailing zeros count only when a decimal point is present.
pub(crate) fn count_sigfigs(mantissa: &str) -> u32 {
    let has_point = mantissa.contains('.');
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let digits = digits.trim_start_matches('0');
    let digits = if has_point {
        digits
    } else {
        digits.trim_end_matches('0')
    };
    (digits.len() as u32).max(1)
}

fn lex_string(chars: &[char], start: usize) -> Result<(String, usize), EvalError> {
    let mut text = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        match chars[i] {
            '"' => return Ok((text, i + 1)),
            '\\' => {
                let escaped = chars.get(i + 1).ok_or_else(|| EvalError::Syntax {
                    position: i,
                    message: "unterminated escape".to_string(),
                })?;
                text.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => *other,
                });
                i += 2;
            }
            c => {
                text.push(c);
                i += 1;
            }
        }
    }

    Err(EvalError::Syntax {
        position: start,
        message: "unterminated string".to_string(),
    })
}
