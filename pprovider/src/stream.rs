//! Streaming chunk contracts and in-memory stream utilities.
//!
//! ```rust
//! use pprovider::{BoxedChunkStream, StreamChunk, VecChunkStream};
//!
//! let stream = VecChunkStream::new(vec![Ok(StreamChunk::TextDelta("hello".into()))]);
//! let _boxed: BoxedChunkStream<'static> = Box::pin(stream);
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::{ProviderError, StopReason, TokenUsage};

/// One fragment of an incrementally-built tool call. Fragments for a given
/// `index` are contiguous, but different indices may interleave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallDelta {
    pub index: u32,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments_fragment: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    TextDelta(String),
    ThinkingDelta(String),
    ToolCallDelta(ToolCallDelta),
    Usage(TokenUsage),
    Completed { stop_reason: StopReason },
}

/// Provider stream contract.
///
/// Invariants for consumers:
/// - Chunks are emitted in source order.
/// - Delta chunks may appear zero or more times.
/// - `Completed`, when present, arrives after all deltas for the response.
/// - Once the stream yields `None`, it must not yield additional items.
pub trait ChunkStream: Stream<Item = Result<StreamChunk, ProviderError>> + Send {}

impl<T> ChunkStream for T where T: Stream<Item = Result<StreamChunk, ProviderError>> + Send {}

pub type BoxedChunkStream<'a> = Pin<Box<dyn ChunkStream + 'a>>;

#[derive(Debug)]
pub struct VecChunkStream {
    chunks: VecDeque<Result<StreamChunk, ProviderError>>,
}

impl VecChunkStream {
    pub fn new(chunks: Vec<Result<StreamChunk, ProviderError>>) -> Self {
        Self {
            chunks: chunks.into(),
        }
    }
}

impl Stream for VecChunkStream {
    type Item = Result<StreamChunk, ProviderError>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<StreamChunk, ProviderError>>> {
        Poll::Ready(self.chunks.pop_front())
    }
}
