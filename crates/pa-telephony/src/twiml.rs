//! TwiML voice response documents

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::error::{Result, TelephonyError};

/// One instruction inside a `<Response>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    /// Speak text with the provider's built-in voice
    Say(String),
    /// Play the audio at a URL
    Play(String),
    /// Fetch further instructions from a URL
    Redirect(String),
}

impl Verb {
    fn tag(&self) -> &'static str {
        match self {
            Verb::Say(_) => "Say",
            Verb::Play(_) => "Play",
            Verb::Redirect(_) => "Redirect",
        }
    }

    fn content(&self) -> &str {
        match self {
            Verb::Say(text) | Verb::Play(text) | Verb::Redirect(text) => text,
        }
    }
}

/// Builder for a TwiML `<Response>` document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Twiml {
    verbs: Vec<Verb>,
}

impl Twiml {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(mut self, text: impl Into<String>) -> Self {
        self.verbs.push(Verb::Say(text.into()));
        self
    }

    pub fn play(mut self, url: impl Into<String>) -> Self {
        self.verbs.push(Verb::Play(url.into()));
        self
    }

    pub fn redirect(mut self, url: impl Into<String>) -> Self {
        self.verbs.push(Verb::Redirect(url.into()));
        self
    }

    /// Render the document. No XML declaration is emitted.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());

        write(&mut writer, Event::Start(BytesStart::new("Response")))?;
        for verb in &self.verbs {
            write(&mut writer, Event::Start(BytesStart::new(verb.tag())))?;
            write(&mut writer, Event::Text(BytesText::new(verb.content())))?;
            write(&mut writer, Event::End(BytesEnd::new(verb.tag())))?;
        }
        write(&mut writer, Event::End(BytesEnd::new("Response")))?;

        String::from_utf8(writer.into_inner()).map_err(|e| TelephonyError::Markup(e.to_string()))
    }
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| TelephonyError::Markup(e.to_string()))
}
