//! Raw vector producers feeding the ingest driver.
//!
//! A source hands over one undecoded payload per ingest tick; decoding and
//! validation happen in [`payload`] on the driver's side.

pub mod channel;
pub mod payload;
pub mod synthetic;

pub use channel::ChannelSource;
pub use payload::{decode_payload, encode_payload, PayloadError};
pub use synthetic::SyntheticSource;

/// A producer of raw vector payloads.
///
/// `read` is called once per ingest tick and must not block; `None` means
/// nothing is available this tick.
pub trait Source: Send {
    fn read(&mut self) -> Option<String>;
}

impl<F> Source for F
where
    F: FnMut() -> Option<String> + Send,
{
    fn read(&mut self) -> Option<String> {
        self()
    }
}
