//! pa-telephony: Twilio voice integration for phone-agent
//!
//! Places outbound calls through the Twilio REST API and renders the
//! TwiML documents returned from the call webhook.

pub mod error;
pub mod twilio;
pub mod twiml;

pub use error::{Result, TelephonyError};
pub use twilio::{CallPlacer, TwilioClient};
pub use twiml::{Twiml, Verb};
