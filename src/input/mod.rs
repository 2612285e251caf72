use crate::recognition::{RecognitionResult, UNCERTAIN_CHAR};
use crate::utils::{GeoAssistError, Result};

/// Decode an uploaded delimited file: strip a UTF-8 BOM if present, then read
/// lossily so one bad byte does not reject a whole table.
pub fn text_from_file(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Gate for recognized text: anything containing the uncertainty placeholder
/// goes back to the user for correction, never into the parser.
pub fn accept_recognized(result: &RecognitionResult) -> Result<&str> {
    if result.text.contains(UNCERTAIN_CHAR) {
        return Err(GeoAssistError::RecognitionUncertain);
    }
    Ok(&result.text)
}
