//! Splitting text into separator and value tokens

/// A token and the byte offset where it starts in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span<'a> {
    pub offset: usize,
    pub text: &'a str,
}

/// Split `input` at any of `separators`
///
/// Each separator character becomes its own token. Runs between separators
/// are trimmed and dropped when empty.
pub(crate) fn split_tokens<'a>(input: &'a str, separators: &[char]) -> Vec<Span<'a>> {
    let mut tokens = Vec::new();
    let mut start = 0;

    for (index, chr) in input.char_indices() {
        if separators.contains(&chr) {
            push_value(&mut tokens, input, start, index);
            tokens.push(Span {
                offset: index,
                text: &input[index..index + chr.len_utf8()],
            });
            start = index + chr.len_utf8();
        }
    }
    push_value(&mut tokens, input, start, input.len());

    tokens
}

fn push_value<'a>(tokens: &mut Vec<Span<'a>>, input: &'a str, start: usize, end: usize) {
    let raw = &input[start..end];
    let trimmed = raw.trim_start();
    let offset = start + (raw.len() - trimmed.len());
    let trimmed = trimmed.trim_end();
    if !trimmed.is_empty() {
        tokens.push(Span {
            offset,
            text: trimmed,
        });
    }
}
