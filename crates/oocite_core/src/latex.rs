/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Conversion of LaTeX-encoded field values into inline markup.
//!
//! Font commands become markup tags, escaped specials become plain characters,
//! and protective braces are dropped. Characters that are significant to the
//! markup parser are escaped so field content can never open a tag.

/// Converts a LaTeX field value into inline markup.
pub fn to_markup(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());
    let mut pos = 0;
    convert(&chars, &mut pos, &mut out, false);
    out
}

/// Converts a LaTeX field value into plain text.
pub fn to_plain_text(value: &str) -> String {
    crate::markup::to_plain_text(&to_markup(value))
}

fn font_tag(command: &str) -> Option<&'static str> {
    Some(match command {
        "emph" | "textit" | "textsl" => "i",
        "textbf" => "b",
        "textsc" => "smallcaps",
        "texttt" => "tt",
        "textsuperscript" => "sup",
        "textsubscript" => "sub",
        "underline" => "u",
        "sout" => "s",
        _ => return None,
    })
}

fn symbol(command: &str) -> Option<&'static str> {
    Some(match command {
        "ss" => "ß",
        "o" => "ø",
        "O" => "Ø",
        "aa" => "å",
        "AA" => "Å",
        "ae" => "æ",
        "AE" => "Æ",
        "oe" => "œ",
        "OE" => "Œ",
        "l" => "ł",
        "L" => "Ł",
        "ldots" | "dots" => "…",
        "textendash" => "–",
        "textemdash" => "—",
        "LaTeX" => "LaTeX",
        "TeX" => "TeX",
        _ => return None,
    })
}

fn convert(chars: &[char], pos: &mut usize, out: &mut String, in_group: bool) {
    while *pos < chars.len() {
        let c = chars[*pos];
        *pos += 1;
        match c {
            '\\' => command(chars, pos, out),
            '{' => convert(chars, pos, out, true),
            '}' if in_group => return,
            '}' | '$' => {}
            '~' => out.push('\u{a0}'),
            '-' => {
                let mut run = 1;
                while chars.get(*pos) == Some(&'-') {
                    run += 1;
                    *pos += 1;
                }
                match run {
                    1 => out.push('-'),
                    2 => out.push('–'),
                    3 => out.push('—'),
                    n => out.extend(std::iter::repeat('-').take(n)),
                }
            }
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

fn command(chars: &[char], pos: &mut usize, out: &mut String) {
    let Some(&next) = chars.get(*pos) else {
        return;
    };
    if next.is_ascii_alphabetic() {
        let start = *pos;
        while chars.get(*pos).is_some_and(char::is_ascii_alphabetic) {
            *pos += 1;
        }
        let name: String = chars[start..*pos].iter().collect();
        if let Some(tag) = font_tag(&name) {
            out.push_str(&format!("<{tag}>"));
            if chars.get(*pos) == Some(&'{') {
                *pos += 1;
                convert(chars, pos, out, true);
            }
            out.push_str(&format!("</{tag}>"));
        } else if name == "c" {
            let letter = accent_argument(chars, pos);
            push_accented(out, 'c', letter);
        } else if let Some(sym) = symbol(&name) {
            out.push_str(sym);
            if chars.get(*pos) == Some(&' ') {
                *pos += 1;
            }
        } else {
            // Unknown command: keep its argument text, drop the command.
            tracing::debug!(command = %name, "dropping unknown LaTeX command");
        }
        return;
    }
    *pos += 1;
    match next {
        '&' => out.push_str("&amp;"),
        '%' | '$' | '#' | '_' | '{' | '}' => out.push(next),
        '\\' | ' ' => out.push(' '),
        '"' | '\'' | '`' | '^' | '~' | '=' | '.' => {
            let letter = accent_argument(chars, pos);
            push_accented(out, next, letter);
        }
        other => out.push(other),
    }
}

fn accent_argument(chars: &[char], pos: &mut usize) -> Option<char> {
    match chars.get(*pos) {
        Some('{') => {
            let letter = chars.get(*pos + 1).copied().filter(|c| *c != '}');
            while *pos < chars.len() && chars[*pos] != '}' {
                *pos += 1;
            }
            *pos += 1;
            letter
        }
        Some(' ') => {
            *pos += 1;
            accent_argument(chars, pos)
        }
        Some(&c) => {
            *pos += 1;
            Some(c)
        }
        None => None,
    }
}

fn push_accented(out: &mut String, mark: char, letter: Option<char>) {
    let Some(letter) = letter else {
        return;
    };
    let precomposed = match (mark, letter) {
        ('"', 'a') => 'ä',
        ('"', 'e') => 'ë',
        ('"', 'i') => 'ï',
        ('"', 'o') => 'ö',
        ('"', 'u') => 'ü',
        ('"', 'y') => 'ÿ',
        ('"', 'A') => 'Ä',
        ('"', 'E') => 'Ë',
        ('"', 'I') => 'Ï',
        ('"', 'O') => 'Ö',
        ('"', 'U') => 'Ü',
        ('\'', 'a') => 'á',
        ('\'', 'e') => 'é',
        ('\'', 'i') => 'í',
        ('\'', 'o') => 'ó',
        ('\'', 'u') => 'ú',
        ('\'', 'y') => 'ý',
        ('\'', 'c') => 'ć',
        ('\'', 'n') => 'ń',
        ('\'', 's') => 'ś',
        ('\'', 'z') => 'ź',
        ('\'', 'A') => 'Á',
        ('\'', 'E') => 'É',
        ('\'', 'I') => 'Í',
        ('\'', 'O') => 'Ó',
        ('\'', 'U') => 'Ú',
        ('`', 'a') => 'à',
        ('`', 'e') => 'è',
        ('`', 'i') => 'ì',
        ('`', 'o') => 'ò',
        ('`', 'u') => 'ù',
        ('`', 'A') => 'À',
        ('`', 'E') => 'È',
        ('^', 'a') => 'â',
        ('^', 'e') => 'ê',
        ('^', 'i') => 'î',
        ('^', 'o') => 'ô',
        ('^', 'u') => 'û',
        ('~', 'a') => 'ã',
        ('~', 'n') => 'ñ',
        ('~', 'o') => 'õ',
        ('~', 'N') => 'Ñ',
        ('c', 'c') => 'ç',
        ('c', 'C') => 'Ç',
        ('c', 's') => 'ş',
        _ => {
            let combining = match mark {
                '"' => '\u{308}',
                '\'' => '\u{301}',
                '`' => '\u{300}',
                '^' => '\u{302}',
                '~' => '\u{303}',
                '=' => '\u{304}',
                '.' => '\u{307}',
                _ => '\u{327}',
            };
            out.push(letter);
            out.push(combining);
            return;
        }
    };
    out.push(precomposed);
}
