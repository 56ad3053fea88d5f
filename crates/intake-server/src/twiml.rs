//! Minimal TwiML document builder for the telephony webhook responses.
//!
//! Each webhook reply is an XML document instructing the telephony platform
//! what to do next: speak text, gather one utterance or keypress and POST it
//! to an action URL, redirect to another endpoint, or hang up. Only the
//! verbs this server emits are modeled; no crate in our stack covers TwiML,
//! so the documents are written by hand with proper escaping.

use axum::http::header;
use axum::response::{IntoResponse, Response};

/// What kind of caller input a Gather accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatherInput {
    Speech,
    Dtmf,
    SpeechDtmf,
}

impl GatherInput {
    fn attr(self) -> &'static str {
        match self {
            Self::Speech => "speech",
            Self::Dtmf => "dtmf",
            Self::SpeechDtmf => "speech dtmf",
        }
    }
}

/// A TwiML `<Response>` document under construction.
#[derive(Debug, Clone, Default)]
pub struct Twiml {
    body: String,
    terminates: bool,
}

impl Twiml {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a `<Say>` verb.
    pub fn say(mut self, text: &str) -> Self {
        self.body
            .push_str(&format!("<Say>{}</Say>", escape(text)));
        self
    }

    /// Appends a `<Gather>` that speaks `prompt` and POSTs the caller's input
    /// to `action`. Falls through to the next verb if the caller stays silent
    /// past the timeout.
    pub fn gather(mut self, input: GatherInput, action: &str, timeout_secs: u64, prompt: &str) -> Self {
        self.body.push_str(&format!(
            "<Gather input=\"{}\" action=\"{}\" method=\"POST\" timeout=\"{}\" speechTimeout=\"auto\"><Say>{}</Say></Gather>",
            input.attr(),
            escape(action),
            timeout_secs,
            escape(prompt),
        ));
        self
    }

    /// Appends a `<Redirect>` to another webhook endpoint.
    pub fn redirect(mut self, url: &str) -> Self {
        self.body.push_str(&format!(
            "<Redirect method=\"POST\">{}</Redirect>",
            escape(url)
        ));
        self
    }

    /// Appends a `<Hangup/>`.
    pub fn hangup(mut self) -> Self {
        self.body.push_str("<Hangup/>");
        self.terminates = true;
        self
    }

    /// Whether this document ends the call.
    pub fn terminates(&self) -> bool {
        self.terminates
    }

    /// Renders the complete document.
    pub fn build(&self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response>{}</Response>",
            self.body
        )
    }
}

impl IntoResponse for Twiml {
    fn into_response(self) -> Response {
        (
            [(header::CONTENT_TYPE, "application/xml")],
            self.build(),
        )
            .into_response()
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
