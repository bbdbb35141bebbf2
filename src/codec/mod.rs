//! Reference codecs
//!
//! Ready-made encoders and decoders for JSON APIs. Any function with the
//! encoder or decoder signature can be used instead.

pub mod json;

pub use json::{
    JsonDecoder, StatusError, decode_json_response, encode_json_request,
    encode_json_request_with_headers,
};
