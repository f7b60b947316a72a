use std::io::{self, BufRead};

/// Yields the lines of a buffered source as raw byte chunks.
///
/// A chunk ends after a `\n`, at EOF, or once it holds `max - 1` bytes,
/// whichever comes first. Over-long lines therefore come back as several
/// consecutive chunks, and every chunk counts as one line. Concatenating the
/// chunks reproduces the source byte for byte.
pub struct LineReader<R> {
    inner: R,
    limit: usize,
    done: bool,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R, max: usize) -> Self {
        Self {
            inner,
            limit: max.saturating_sub(1).max(1),
            done: false,
        }
    }

    fn read_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();

        while line.len() < self.limit {
            let available = match self.inner.fill_buf() {
                Ok(available) => available,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            if available.is_empty() {
                break;
            }

            let room = self.limit - line.len();
            let window = &available[..available.len().min(room)];
            match window.iter().position(|&byte| byte == b'\n') {
                Some(newline) => {
                    line.extend_from_slice(&window[..=newline]);
                    self.inner.consume(newline + 1);
                    return Ok(Some(line));
                }
                None => {
                    let taken = window.len();
                    line.extend_from_slice(window);
                    self.inner.consume(taken);
                }
            }
        }

        if line.is_empty() {
            Ok(None)
        } else {
            Ok(Some(line))
        }
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_chunk() {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Drops a trailing `\n`, and a `\r` right before it.
pub fn strip_terminator(line: &[u8]) -> &[u8] {
    match line.strip_suffix(b"\n") {
        Some(rest) => rest.strip_suffix(b"\r").unwrap_or(rest),
        None => line,
    }
}

pub fn is_header(line: &[u8]) -> bool {
    line.first() == Some(&b'[')
}

/// Only lines opening with `0-9`, `a-z` or `A-Z` can carry a key.
pub fn is_pair_candidate(line: &[u8]) -> bool {
    line.first().is_some_and(|byte| byte.is_ascii_alphanumeric())
}

pub fn is_blank(line: &[u8]) -> bool {
    strip_terminator(line).is_empty()
}

/// Name between the brackets of a `[name]` header, if the line is one.
pub fn header_name(line: &[u8]) -> Option<&[u8]> {
    strip_terminator(line)
        .strip_prefix(b"[")?
        .strip_suffix(b"]")
        .filter(|name| !name.is_empty())
}

/// Checks whether `line` assigns `key` and returns the offset where its value
/// starts.
///
/// The key must sit at the very start of the line and be followed by zero or
/// more spaces and then `=`. Spaces after the `=` are skipped. The returned
/// offset indexes into the terminator-stripped line.
pub fn match_key(line: &[u8], key: &[u8]) -> Option<usize> {
    if !is_pair_candidate(line) {
        return None;
    }
    let content = strip_terminator(line);
    if content.len() <= key.len() {
        return None;
    }

    let rest = content.strip_prefix(key)?;
    let padding = rest.iter().take_while(|&&byte| byte == b' ').count();
    if rest.get(padding) != Some(&b'=') {
        return None;
    }

    let value_start = key.len() + padding + 1;
    let spaces = content[value_start..]
        .iter()
        .take_while(|&&byte| byte == b' ')
        .count();
    Some(value_start + spaces)
}

/// Value carried by `line` for `key`, with leading spaces and the terminator
/// removed.
pub fn value_of<'a>(line: &'a [u8], key: &[u8]) -> Option<&'a [u8]> {
    let offset = match_key(line, key)?;
    Some(&strip_terminator(line)[offset..])
}

/// Renders `key=value` followed by `ending`.
pub fn format_pair(key: &str, value: &str, ending: &[u8]) -> Vec<u8> {
    let mut line = Vec::with_capacity(key.len() + value.len() + 1 + ending.len());
    line.extend_from_slice(key.as_bytes());
    line.push(b'=');
    line.extend_from_slice(value.as_bytes());
    line.extend_from_slice(ending);
    line
}

/// Renders `[name]` followed by `ending`.
pub fn format_header(name: &str, ending: &[u8]) -> Vec<u8> {
    let mut line = Vec::with_capacity(name.len() + 2 + ending.len());
    line.push(b'[');
    line.extend_from_slice(name.as_bytes());
    line.push(b']');
    line.extend_from_slice(ending);
    line
}
