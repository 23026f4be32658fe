//! Call-expression candidates.
//!
//! The shape being matched is: identifier, optional generic-argument list,
//! opening parenthesis — `greet(`, `x.save(`, `compare<Foo, Bar>(`. This is
//! a lexical approximation, not a parse: it happily matches a parenthesized
//! expression after an unrelated identifier, and misses calls with no
//! leading identifier (computed member access, immediately-invoked
//! expressions). Misses stay missed; false matches die during validation
//! because their reference lookups return no definition.

use super::{Candidate, CandidateStrategy, is_ident_byte};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
static KEYWORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();

fn identifier_regex() -> &'static Regex {
    IDENTIFIER.get_or_init(|| Regex::new(r"[A-Za-z_$][A-Za-z0-9_$]*").expect("valid regex"))
}

/// Control-flow and operator keywords that precede a `(` without being
/// calls. Anything not listed still gets screened by validation.
fn keywords() -> &'static HashSet<&'static str> {
    KEYWORDS.get_or_init(|| {
        HashSet::from([
            "await", "catch", "do", "else", "for", "if", "in", "instanceof", "new", "of",
            "return", "switch", "typeof", "void", "while", "yield",
        ])
    })
}

/// How far a generic-argument list may run before the scan gives up on it.
const MAX_GENERIC_ARGS_LEN: usize = 256;

/// Lexical call-expression scan.
pub struct CallCandidates;

impl CandidateStrategy for CallCandidates {
    fn candidates(&self, text: &str) -> Vec<Candidate> {
        let bytes = text.as_bytes();
        let mut out = Vec::new();

        for found in identifier_regex().find_iter(text) {
            // A match starting right after an identifier byte is the tail
            // of a longer token (`9abc`), not a name.
            if found.start() > 0 && is_ident_byte(bytes[found.start() - 1]) {
                continue;
            }
            if keywords().contains(found.as_str()) {
                continue;
            }

            let mut next = skip_spaces(bytes, found.end());
            if next < bytes.len() && bytes[next] == b'<' {
                match skip_generic_args(bytes, next) {
                    Some(after) => next = skip_spaces(bytes, after),
                    None => continue,
                }
            }

            if next < bytes.len() && bytes[next] == b'(' {
                out.push(Candidate {
                    name: found.as_str().to_string(),
                    start: found.start(),
                    end: found.end(),
                });
            }
        }

        out
    }
}

fn skip_spaces(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    i
}

/// Skip a balanced `<...>` starting at `open`. Returns the index after the
/// closing `>`, or `None` when the brackets do not close plausibly —
/// a bare comparison like `a < b (x)` runs into `(` and gives up.
fn skip_generic_args(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let limit = bytes.len().min(open + MAX_GENERIC_ARGS_LEN);

    let mut i = open;
    while i < limit {
        match bytes[i] {
            b'<' => depth += 1,
            b'>' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            b'(' | b')' | b'{' | b'}' | b';' | b'\n' => return None,
            _ => {}
        }
        i += 1;
    }
    None
}
