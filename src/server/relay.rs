//! SSE relay from the gateway token stream to the browser.
//!
//! Every token becomes one `data: {"content": ...}` frame, in arrival order,
//! and the stream always ends with `data: [DONE]`. A failure after the first
//! token is reported as a single `data: {"error": ...}` frame before the
//! terminator; failures before the first token never reach this module.

use axum::response::sse::{ Event, Sse };
use futures::stream::{ self, Stream, StreamExt };
use futures::future;
use log::{ error, info };
use serde::Serialize;
use serde_json::json;
use serde_json::ser::Formatter;
use std::convert::Infallible;
use std::io;

use crate::llm::chat::{ ChatError, TokenStream };
use crate::models::chat::StreamChunk;

pub const DONE_SENTINEL: &str = "[DONE]";

/// Frame payload layout expected by the browser client: `", "` and `": "`
/// separators, non-ASCII characters escaped as `\uXXXX`.
struct FrameFormatter;

impl Formatter for FrameFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
        where W: ?Sized + io::Write
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
        where W: ?Sized + io::Write
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
        where W: ?Sized + io::Write
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
        where W: ?Sized + io::Write
    {
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

pub fn frame_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, FrameFormatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn chunk_event(content: String) -> Event {
    let data = frame_json(&(StreamChunk { content })).unwrap_or_default();
    Event::default().data(data)
}

pub fn error_event(err: &ChatError) -> Event {
    let data = frame_json(&json!({ "error": err.to_string() })).unwrap_or_default();
    Event::default().data(data)
}

pub fn done_event() -> Event {
    Event::default().data(DONE_SENTINEL)
}

/// `first` is the already-awaited first item of `rest`'s source, so the caller
/// can reject a failing stream before any SSE framing is sent.
pub fn relay_events(
    request_id: String,
    first: Option<Result<String, ChatError>>,
    rest: TokenStream
) -> impl Stream<Item = Result<Event, Infallible>> + Send {
    let done_id = request_id.clone();

    stream
        ::iter(first)
        .chain(rest)
        .scan(false, move |failed, item| {
            if *failed {
                return future::ready(None);
            }
            let event = match item {
                Ok(token) => chunk_event(token),
                Err(e) => {
                    error!("[{}] Gateway stream failed mid-response: {}", request_id, e);
                    *failed = true;
                    error_event(&e)
                }
            };
            future::ready(Some(Ok(event)))
        })
        .chain(
            stream::once(async move {
                info!("[{}] Stream finished", done_id);
                Ok(done_event())
            })
        )
}

pub fn relay(
    request_id: String,
    first: Option<Result<String, ChatError>>,
    rest: TokenStream
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send> {
    Sse::new(relay_events(request_id, first, rest))
}
