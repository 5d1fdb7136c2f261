#[cfg(test)]
use std::collections::VecDeque;
use std::fmt::{self, Display};

use bytes::Bytes;
use reqwest::Response;

/// The transport failed while reading the response body.
#[derive(Debug, PartialEq, Eq)]
pub struct Error(pub String);

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An adapter for streaming byte chunks.
pub enum Chunks {
    Response(Response),
    #[cfg(test)]
    VecDeque(VecDeque<Result<Bytes, Error>>),
}

impl Chunks {
    pub fn from_response(response: Response) -> Self {
        Chunks::Response(response)
    }

    /// Feeds the given byte chunks, as if each of them were one network
    /// read.
    #[cfg(test)]
    pub fn from_vec_deque(vec: VecDeque<Bytes>) -> Self {
        Chunks::VecDeque(vec.into_iter().map(Ok).collect())
    }

    /// Like [`Chunks::from_vec_deque`] but the reads may fail.
    #[cfg(test)]
    pub fn from_results(vec: VecDeque<Result<Bytes, Error>>) -> Self {
        Chunks::VecDeque(vec)
    }

    #[inline]
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, Error> {
        match self {
            Chunks::Response(response) => {
                response.chunk().await.map_err(|err| Error(err.to_string()))
            }
            #[cfg(test)]
            Chunks::VecDeque(vec) => vec.pop_front().transpose(),
        }
    }
}
