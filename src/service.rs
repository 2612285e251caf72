use crate::geo::transform_batch;
use crate::input;
use crate::parser::parse_batch;
use crate::recognition::RecognitionResult;
use crate::render::{self, RenderedFile};
use crate::session::{OutputMode, SessionStore, WizardStep};
use crate::utils::Result;
use tracing::info;

#[derive(Debug, Clone)]
pub enum ConversionOutput {
    Inline(String),
    File(RenderedFile),
}

/// The coordinate-conversion pipeline behind all input channels: wizard
/// configuration per user, then parse → gate → transform → render. All
/// network collaborators live outside this type, so the whole pipeline runs
/// without I/O.
#[derive(Clone, Default)]
pub struct ConversionService {
    sessions: SessionStore,
}

impl ConversionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub async fn open(&self, user_id: i64) -> WizardStep {
        self.sessions
            .update(user_id, |s| {
                s.wizard.begin();
                s.wizard.step()
            })
            .await
    }

    pub async fn select_source(&self, user_id: i64, key: &str) -> Result<WizardStep> {
        self.sessions
            .update(user_id, |s| s.wizard.select_source(key))
            .await
    }

    pub async fn select_dest(&self, user_id: i64, key: &str) -> Result<WizardStep> {
        self.sessions
            .update(user_id, |s| s.wizard.select_dest(key))
            .await
    }

    pub async fn select_zone(&self, user_id: i64, zone: u32) -> Result<WizardStep> {
        self.sessions
            .update(user_id, |s| s.wizard.select_zone(zone))
            .await
    }

    pub async fn select_output(&self, user_id: i64, mode: OutputMode) -> Result<WizardStep> {
        self.sessions
            .update(user_id, |s| s.wizard.select_output(mode))
            .await
    }

    pub async fn confirm_ready(&self, user_id: i64) -> Result<WizardStep> {
        self.sessions
            .update(user_id, |s| s.wizard.confirm_ready())
            .await
    }

    pub async fn reset(&self, user_id: i64) {
        self.sessions.reset(user_id).await;
    }

    pub async fn setup_summary(&self, user_id: i64) -> (WizardStep, String) {
        self.sessions
            .update(user_id, |s| (s.wizard.step(), s.wizard.setup().summary()))
            .await
    }

    /// Convert a typed text message.
    pub async fn convert_text(&self, user_id: i64, text: &str) -> Result<ConversionOutput> {
        let hint = self
            .sessions
            .update(user_id, |s| s.last_file_hint.clone())
            .await;
        self.convert(user_id, text, hint.as_deref()).await
    }

    /// Convert an uploaded delimited file; its name becomes the output hint.
    pub async fn convert_file(
        &self,
        user_id: i64,
        name: &str,
        bytes: &[u8],
    ) -> Result<ConversionOutput> {
        let text = input::text_from_file(bytes);
        self.sessions
            .update(user_id, |s| s.last_file_hint = Some(name.to_string()))
            .await;
        self.convert(user_id, &text, Some(name)).await
    }

    /// Convert recognized photo text, gated on the uncertainty placeholder
    /// before anything is parsed.
    pub async fn convert_recognized(
        &self,
        user_id: i64,
        result: &RecognitionResult,
    ) -> Result<ConversionOutput> {
        let text = input::accept_recognized(result)?.to_string();
        self.convert(user_id, &text, None).await
    }

    async fn convert(
        &self,
        user_id: i64,
        text: &str,
        name_hint: Option<&str>,
    ) -> Result<ConversionOutput> {
        let (source, dest, mode) = self
            .sessions
            .update(user_id, |s| s.wizard.ensure_ready())
            .await?;

        let points = parse_batch(text)?;
        let transformed = transform_batch(&points, &source, &dest)?;

        info!(
            user_id,
            points = transformed.len(),
            source = %source.code,
            dest = %dest.code,
            "batch converted"
        );

        match mode {
            OutputMode::Inline => Ok(ConversionOutput::Inline(render::render_inline(
                &transformed,
            ))),
            OutputMode::File => Ok(ConversionOutput::File(render::render_file(
                &transformed,
                name_hint,
            )?)),
        }
    }
}
