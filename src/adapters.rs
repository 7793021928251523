//! Host-facing adapter traits.
//!
//! OCR and speech are platform services; the core stays testable by talking
//! to them through these seams. Hosts plug in real engines, tests plug in
//! fakes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("No images supplied for recognition")]
    NoImages,

    #[error("OCR engine is busy with another scan")]
    Busy,

    #[error("OCR engine failed: {0}")]
    Engine(String),
}

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("Speech recognition failed: {0}")]
    Recognition(String),
}

/// Text recognition over one or more captured images (one medication list or
/// document can span several photos). Implementations return the concatenated
/// page text in capture order.
pub trait OcrAdapter {
    fn recognize(&self, images: &[Vec<u8>]) -> Result<String, OcrError>;
}

/// Text-to-speech sink. `speak` replaces any utterance still in flight;
/// assistant messages must never queue up behind each other.
pub trait SpeechSynth {
    fn speak(&mut self, text: &str) -> Result<(), VoiceError>;
    fn cancel(&mut self) -> Result<(), VoiceError>;
}

/// Speech-to-text source. Engines stop spontaneously after silence; the
/// bridge below owns the restart policy.
pub trait SpeechRecognizer {
    fn start(&mut self) -> Result<(), VoiceError>;
    fn stop(&mut self) -> Result<(), VoiceError>;
}

/// Keeps a recognizer running for as long as the patient wants the microphone
/// open. Engines end sessions on their own after a pause; the bridge restarts
/// them while `should_listen` holds, and a reported engine error drops the
/// microphone rather than looping on a broken device.
pub struct SpeechBridge<R: SpeechRecognizer> {
    recognizer: R,
    should_listen: bool,
}

impl<R: SpeechRecognizer> SpeechBridge<R> {
    pub fn new(recognizer: R) -> Self {
        Self {
            recognizer,
            should_listen: false,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.should_listen
    }

    /// Toggle the microphone. Idempotent in both directions.
    pub fn set_listening(&mut self, listening: bool) -> Result<(), VoiceError> {
        if listening == self.should_listen {
            return Ok(());
        }
        if listening {
            self.recognizer.start()?;
        } else {
            self.recognizer.stop()?;
        }
        self.should_listen = listening;
        tracing::debug!(listening, "microphone state changed");
        Ok(())
    }

    /// The engine ended a session on its own (silence timeout). Restart it if
    /// the patient still wants to be heard.
    pub fn on_recognizer_ended(&mut self) -> Result<(), VoiceError> {
        if self.should_listen {
            self.recognizer.start()?;
        }
        Ok(())
    }

    /// The engine reported an error. The microphone goes off; the patient can
    /// re-enable it explicitly.
    pub fn on_recognizer_error(&mut self, message: &str) {
        tracing::warn!(error = message, "speech recognition error, microphone off");
        self.should_listen = false;
    }
}
