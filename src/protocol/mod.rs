//! Wire protocol spoken by the crowd simulator.
//!
//! The simulator writes a one-off handshake followed by an unbounded sequence
//! of tagged messages. Integers are big-endian, doubles use the producer's
//! native byte order (see [`FloatOrder`]).
//!
//! # Stream Layout
//!
//! ```text
//! Handshake (once):
//!   Scene file name: u16 length + bytes (not NUL-terminated)
//!   Scene scale: f64
//!   Density min threshold: f64
//!   Density max threshold: f64
//!
//! Messages (repeated):
//!   Tag: u8
//!   0 = CurrentTime  timestamp: f64
//!   1 = Locations    count: i32, count * (x: i16, y: i16, heading: f64)
//!   2 = DensityMap   count: i32, count * (x: i16, y: i16, density: f64)
//!   3 = Statistics   min: f64, max: f64, count: i32, avg: f64,
//!                    variance: f64, std_deviation: f64
//! ```
//!
//! There are no framing markers, so a decode error cannot be recovered from.

mod message;
mod reader;
mod writer;

pub use message::{
    CURRENT_TIME_TAG, DENSITY_MAP_TAG, DecodeError, DecodeLimits, DensitySample, InitMessage,
    LOCATIONS_TAG, Message, MessageDecoder, PersonPose, STATISTICS_TAG, Statistics,
};
pub use reader::{ByteReader, FloatOrder, StreamError};
pub use writer::MessageWriter;
