// SPDX-License-Identifier: GPL-3.0-or-later

//! Streaming reader of JSON arrays.
//!
//! Compilation databases of large projects can be huge. The elements are
//! deserialized one by one, so a malformed element can be reported on its
//! own and the whole array is never held in memory.

use serde::de::DeserializeOwned;
use std::io;

/// Deserialize elements of a JSON array as an iterator.
///
/// from https://github.com/serde-rs/json/issues/404#issuecomment-892957228
///
/// The first error ends the iteration after it was yielded. Elements are
/// best read as `serde_json::Value` and checked one by one afterwards.
///
/// # Note
/// Works well with self-delimited types, like strings, objects, arrays.
pub fn deserialize_seq<T, R>(reader: R) -> impl Iterator<Item = Result<T, serde_json::Error>>
where
    T: DeserializeOwned,
    R: io::Read,
{
    let mut reader = PeekableReader::new(reader);
    let mut state = State::AtStart;
    std::iter::from_fn(move || {
        let result = yield_next_obj(&mut reader, &mut state);
        if result.is_err() {
            state = State::Failed;
        }
        result.transpose()
    })
}

// A wrapper around a reader that allows peeking at the next byte without consuming it
struct PeekableReader<R> {
    reader: R,
    peeked: Option<u8>,
}

impl<R: io::Read> PeekableReader<R> {
    fn new(reader: R) -> Self {
        PeekableReader { reader, peeked: None }
    }

    fn peek(&mut self) -> Result<u8, serde_json::Error> {
        match self.peeked {
            Some(byte) => Ok(byte),
            None => {
                let byte = self.read_byte()?;
                self.peeked = Some(byte);
                Ok(byte)
            }
        }
    }

    fn consume(&mut self) -> Result<u8, serde_json::Error> {
        match self.peeked.take() {
            Some(byte) => Ok(byte),
            None => self.read_byte(),
        }
    }

    fn read_byte(&mut self) -> Result<u8, serde_json::Error> {
        let mut byte = 0u8;
        self.reader
            .read_exact(std::slice::from_mut(&mut byte))
            .map_err(serde_json::Error::io)?;
        Ok(byte)
    }

    fn peek_skipping_ws(&mut self) -> Result<u8, serde_json::Error> {
        loop {
            let byte = self.peek()?;
            if !byte.is_ascii_whitespace() {
                return Ok(byte);
            }
            self.consume()?;
        }
    }

    fn consume_skipping_ws(&mut self) -> Result<u8, serde_json::Error> {
        self.peek_skipping_ws()?;
        self.consume()
    }
}

impl<R: io::Read> io::Read for PeekableReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if let Some(byte) = self.peeked.take() {
            buf[0] = byte;
            return Ok(1);
        }
        self.reader.read(buf)
    }
}

enum State {
    AtStart,
    AtMiddle,
    Finished,
    Failed,
}

fn yield_next_obj<T, R>(
    reader: &mut PeekableReader<R>,
    state: &mut State,
) -> Result<Option<T>, serde_json::Error>
where
    T: DeserializeOwned,
    R: io::Read,
{
    match state {
        State::AtStart => {
            let bracket = reader.consume_skipping_ws()?;
            if bracket != b'[' {
                *state = State::Failed;
                return Err(serde::de::Error::custom("expected `[`"));
            }

            if reader.peek_skipping_ws()? == b']' {
                reader.consume()?;
                *state = State::Finished;
                return Ok(None);
            }

            *state = State::AtMiddle;
            deserialize_single(reader).map(Some)
        }
        State::AtMiddle => {
            let delimiter = reader.consume_skipping_ws()?;
            match delimiter {
                b',' => deserialize_single(reader).map(Some),
                b']' => {
                    *state = State::Finished;
                    Ok(None)
                }
                _ => {
                    *state = State::Failed;
                    Err(serde::de::Error::custom("expected `,` or `]`"))
                }
            }
        }
        State::Finished | State::Failed => Ok(None),
    }
}

fn deserialize_single<T, R>(reader: &mut PeekableReader<R>) -> Result<T, serde_json::Error>
where
    T: DeserializeOwned,
    R: io::Read,
{
    let next_obj = serde_json::Deserializer::from_reader(reader).into_iter::<T>().next();
    match next_obj {
        Some(result) => result,
        None => Err(serde::de::Error::custom("premature EOF")),
    }
}
