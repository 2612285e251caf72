pub mod assistant;
pub mod cadastre;
pub mod docwatch;
pub mod geo;
pub mod input;
pub mod parser;
pub mod recognition;
pub mod render;
pub mod server;
pub mod service;
pub mod session;
pub mod usage;
pub mod utils;

pub use geo::{transform_batch, CrsFamily, CrsRef, Point};
pub use parser::{dms_to_decimal, parse_batch};
pub use recognition::{RecognitionResult, UNCERTAIN_CHAR};
pub use render::{render_file, render_inline, RenderedFile};
pub use service::{ConversionOutput, ConversionService};
pub use session::{ConversionSetup, OutputMode, SessionStore, Wizard, WizardStep};
pub use utils::{AppConfig, GeoAssistError, Result};
