//! Negotiation: per-exchange opt-in through one request/response header pair.
//!
//! ```text
//! client ── Accept-Encoding: pingproto/1.0 ──▶ server
//! client ◀── Content-Encoding: pingproto/1.0 ── server   (only if advertised)
//! ```
//!
//! The outcome is decided once, when the response headers are inspected, and
//! holds for the rest of the exchange. A missing or unknown token is never an
//! error: both sides fall back to passing bytes through untouched.
//!
//! Only header types come from `http`; moving the bytes is left to whatever
//! client/server the caller already has (see `RoundTrip`).

pub mod client;
pub mod server;

pub use client::{ClientBody, HttpClient, ResponseBody, RoundTrip};
pub use server::{try_content_encoding, ServerBody};

use http::header::{ACCEPT_ENCODING, CONTENT_ENCODING};
use http::HeaderMap;

use crate::constants::PROTOCOL_TOKEN;

/// True if any `Accept-Encoding` value lists the pingproto token.
///
/// Values are comma separated codings with optional `;q=` weights. A weight of
/// zero is an explicit refusal.
pub fn accepts_pingproto(headers: &HeaderMap) -> bool {
    headers
        .get_all(ACCEPT_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(coding_accepts_token)
}

/// True if the response marks its body as pingproto framed.
pub fn is_pingproto_response(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v.trim().eq_ignore_ascii_case(PROTOCOL_TOKEN))
}

fn coding_accepts_token(item: &str) -> bool {
    let mut parts = item.split(';');
    let coding = parts.next().unwrap_or_default().trim();
    if !coding.eq_ignore_ascii_case(PROTOCOL_TOKEN) {
        return false;
    }
    !parts.any(|param| is_zero_weight(param.trim()))
}

fn is_zero_weight(param: &str) -> bool {
    let Some((name, value)) = param.split_once('=') else {
        return false;
    };
    name.trim().eq_ignore_ascii_case("q")
        && value.trim().parse::<f32>().map_or(false, |q| q == 0.0)
}
