//! Delivery orchestrators
//!
//! - [`DirectDelivery`]: client-supplied GeoJSON in, archive bytes streamed
//!   straight back as the response body.
//! - [`InversionDelivery`]: a source URL in, the pending object location
//!   out immediately; fetch, conversion and upload run after the response.
//!
//! Both own their job's identity and every scratch path derived from it.

pub mod direct;
pub mod inversion;

pub use direct::{DirectDelivery, DirectJob};
pub use inversion::{InversionDelivery, InversionJob};
