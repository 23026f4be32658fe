//! Heritage-clause candidates.
//!
//! Given a type declaration's text, extract the names listed after
//! `extends`/`implements` in the header (everything before the opening body
//! brace). The tokenizer tracks angle-bracket depth so that a generic
//! argument list contributes nothing: `Foo<Bar, Baz>` is one name, `Foo`.
//! A dotted path (`ns.Base`) is one token anchored at its last segment,
//! which is where a definition lookup resolves the actual type.

use super::{Candidate, CandidateStrategy, is_ident_start, is_ident_byte};

/// Heritage-clause tokenizer.
pub struct HeritageCandidates;

fn is_clause_keyword(word: &str) -> bool {
    word == "extends" || word == "implements"
}

impl CandidateStrategy for HeritageCandidates {
    fn candidates(&self, text: &str) -> Vec<Candidate> {
        let header_end = text.find('{').unwrap_or(text.len());
        let header = &text[..header_end];
        let bytes = header.as_bytes();

        let mut out = Vec::new();
        let mut depth = 0usize;
        let mut in_clause = false;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'<' => {
                    depth += 1;
                    i += 1;
                }
                b'>' => {
                    depth = depth.saturating_sub(1);
                    i += 1;
                }
                byte if is_ident_start(byte) => {
                    let start = i;
                    while i < bytes.len() && is_ident_byte(bytes[i]) {
                        i += 1;
                    }
                    let word = &header[start..i];

                    if depth > 0 {
                        continue;
                    }
                    if is_clause_keyword(word) {
                        in_clause = true;
                        continue;
                    }
                    if !in_clause {
                        continue;
                    }
                    // A segment followed by `.` is a qualifier; the token
                    // anchors at the path's last segment.
                    if i < bytes.len() && bytes[i] == b'.' {
                        continue;
                    }

                    out.push(Candidate {
                        name: word.to_string(),
                        start,
                        end: i,
                    });
                }
                _ => i += 1,
            }
        }

        out
    }
}
