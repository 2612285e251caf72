use crate::geo::catalog::{self, CrsEntry, CrsFamily, CrsRef};
use crate::utils::{GeoAssistError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Inline,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Unconfigured,
    SourcePending,
    SourceZonePending,
    DestPending,
    DestZonePending,
    OutputPending,
    Ready,
    AwaitingInput,
}

/// The per-session conversion configuration. Carried inside the session and
/// passed to whatever renders it; nothing here is process-global.
#[derive(Debug, Clone, Default)]
pub struct ConversionSetup {
    pub source: Option<CrsRef>,
    pub dest: Option<CrsRef>,
    pub output: Option<OutputMode>,
}

impl ConversionSetup {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.source.is_none() {
            missing.push("source system");
        }
        if self.dest.is_none() {
            missing.push("destination system");
        }
        if self.output.is_none() {
            missing.push("output mode");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn summary(&self) -> String {
        let unset = "—";
        format!(
            "source: {}; destination: {}; output: {}",
            self.source.as_ref().map(|c| c.label.as_str()).unwrap_or(unset),
            self.dest.as_ref().map(|c| c.label.as_str()).unwrap_or(unset),
            match self.output {
                Some(OutputMode::Inline) => "inline table",
                Some(OutputMode::File) => "file",
                None => unset,
            },
        )
    }
}

#[derive(Debug, Clone)]
pub struct Wizard {
    step: WizardStep,
    setup: ConversionSetup,
    pending_zoned: Option<&'static CrsEntry>,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            step: WizardStep::Unconfigured,
            setup: ConversionSetup::default(),
            pending_zoned: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn setup(&self) -> &ConversionSetup {
        &self.setup
    }

    /// Enter the conversion feature: a fresh, empty configuration.
    pub fn begin(&mut self) {
        *self = Self::new();
        self.step = WizardStep::SourcePending;
    }

    /// Return to the top menu. Valid from any state; discards everything.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn select_source(&mut self, key: &str) -> Result<WizardStep> {
        if self.step != WizardStep::SourcePending {
            return Err(GeoAssistError::ValidationError(
                "source selection is not expected now".to_string(),
            ));
        }
        let entry = catalog::lookup(key)?;
        match entry.family {
            CrsFamily::Simple => {
                self.setup.source = Some(entry.resolve(None)?);
                self.step = WizardStep::DestPending;
            }
            CrsFamily::Zoned => {
                self.pending_zoned = Some(entry);
                self.step = WizardStep::SourceZonePending;
            }
        }
        Ok(self.step)
    }

    pub fn select_dest(&mut self, key: &str) -> Result<WizardStep> {
        if self.step != WizardStep::DestPending {
            return Err(GeoAssistError::ValidationError(
                "destination selection is not expected now".to_string(),
            ));
        }
        let entry = catalog::lookup(key)?;
        match entry.family {
            CrsFamily::Simple => {
                self.setup.dest = Some(entry.resolve(None)?);
                self.step = WizardStep::OutputPending;
            }
            CrsFamily::Zoned => {
                self.pending_zoned = Some(entry);
                self.step = WizardStep::DestZonePending;
            }
        }
        Ok(self.step)
    }

    /// Complete a pending zoned selection. An out-of-range zone leaves the
    /// wizard exactly where it was: nothing is stored.
    pub fn select_zone(&mut self, zone: u32) -> Result<WizardStep> {
        let entry = match (self.step, self.pending_zoned) {
            (WizardStep::SourceZonePending, Some(entry))
            | (WizardStep::DestZonePending, Some(entry)) => entry,
            _ => {
                return Err(GeoAssistError::ValidationError(
                    "zone selection is not expected now".to_string(),
                ))
            }
        };

        let resolved = entry.resolve(Some(zone))?;
        match self.step {
            WizardStep::SourceZonePending => {
                self.setup.source = Some(resolved);
                self.step = WizardStep::DestPending;
            }
            WizardStep::DestZonePending => {
                self.setup.dest = Some(resolved);
                self.step = WizardStep::OutputPending;
            }
            _ => unreachable!(),
        }
        self.pending_zoned = None;
        Ok(self.step)
    }

    pub fn select_output(&mut self, mode: OutputMode) -> Result<WizardStep> {
        if self.step != WizardStep::OutputPending {
            return Err(GeoAssistError::ValidationError(
                "output selection is not expected now".to_string(),
            ));
        }
        self.setup.output = Some(mode);
        self.step = WizardStep::Ready;
        Ok(self.step)
    }

    /// Explicit confirmation after which input channels stay open until reset.
    pub fn confirm_ready(&mut self) -> Result<WizardStep> {
        if self.step != WizardStep::Ready {
            return Err(GeoAssistError::ValidationError(
                "configuration is not complete yet".to_string(),
            ));
        }
        self.step = WizardStep::AwaitingInput;
        Ok(self.step)
    }

    /// Gate for coordinate input. Anything before READY is rejected with the
    /// missing fields named; no transform is attempted.
    pub fn ensure_ready(&self) -> Result<(CrsRef, CrsRef, OutputMode)> {
        if !matches!(self.step, WizardStep::Ready | WizardStep::AwaitingInput) {
            return Err(GeoAssistError::SetupIncomplete {
                missing: self.setup.missing_fields(),
            });
        }
        match (&self.setup.source, &self.setup.dest, self.setup.output) {
            (Some(source), Some(dest), Some(output)) => {
                Ok((source.clone(), dest.clone(), output))
            }
            _ => Err(GeoAssistError::SetupIncomplete {
                missing: self.setup.missing_fields(),
            }),
        }
    }
}
