use crate::geo::Point;
use crate::utils::{GeoAssistError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-+]?\d+(?:[.,]\d+)?").unwrap());

static DMS_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[°º'′´"″]|\b[NSEWnsew]\b|\b[СЮВЗсювз]\b"#).unwrap());

static DMS_GROUP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"([+-]?\d{1,3})[\s°º:]+(\d{1,2}(?:[.,]\d+)?)['′´\s:]*(\d{1,2}(?:[.,]\d+)?)?["″\s]*([NSEWnsewСЮВЗсювз])?"#,
    )
    .unwrap()
});

#[derive(Debug, Clone)]
struct NumToken {
    value: f64,
    signed: bool,
    has_fraction: bool,
    digits: usize,
}

/// Parse freeform text into an ordered list of points without being told the
/// notation. Lines are classified independently; lines that parse to nothing
/// are skipped, but a batch where no line parses fails as a whole. A final
/// pass over the entire text as one token stream catches inputs where values
/// are split across lines.
pub fn parse_batch(text: &str) -> Result<Vec<Point>> {
    let mut points = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(point) = parse_line(line) {
            points.push(point);
        }
    }

    if points.is_empty() {
        if let Some(fallback) = scan_token_stream(text) {
            return Ok(fallback);
        }
        return Err(GeoAssistError::NoCoordinatesRecognized);
    }

    Ok(points)
}

/// `degrees + minutes/60 + seconds/3600`, negated when the degree value is
/// negative or the hemisphere letter denotes south or west.
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64, hemisphere: Option<char>) -> f64 {
    let magnitude = degrees.abs() + minutes / 60.0 + seconds / 3600.0;
    let southern_or_western = matches!(
        hemisphere,
        Some('S') | Some('s') | Some('W') | Some('w') | Some('Ю') | Some('ю') | Some('З')
            | Some('з')
    );
    if degrees.is_sign_negative() || southern_or_western {
        -magnitude
    } else {
        magnitude
    }
}

fn parse_line(line: &str) -> Option<Point> {
    let tokens = number_tokens(line);
    let dms_candidate = DMS_MARKER_RE.is_match(line) || tokens.len() >= 3;

    if dms_candidate {
        if let Some(point) = parse_dms_line(line) {
            return Some(point);
        }
    }

    parse_decimal_tokens(&tokens)
}

fn parse_dms_line(line: &str) -> Option<Point> {
    let mut groups = Vec::new();
    for caps in DMS_GROUP_RE.captures_iter(line) {
        let degrees: f64 = caps.get(1)?.as_str().parse().ok()?;
        let minutes = parse_number(caps.get(2)?.as_str())?;
        let seconds = caps
            .get(3)
            .map(|m| parse_number(m.as_str()))
            .unwrap_or(Some(0.0))?;
        let hemisphere = caps.get(4).and_then(|m| m.as_str().chars().next());

        if degrees.abs() > 180.0 || minutes >= 60.0 || seconds >= 60.0 {
            return None;
        }
        groups.push(dms_to_decimal(degrees, minutes, seconds, hemisphere));
    }

    if groups.len() == 2 {
        Some(Point::new(groups[0], groups[1]))
    } else {
        None
    }
}

fn parse_decimal_tokens(tokens: &[NumToken]) -> Option<Point> {
    // Photographed tables often prefix a row number; a short bare integer in
    // front of two fractional values is taken as that index, not as X.
    let tokens = if tokens.len() >= 3
        && looks_like_row_index(&tokens[0])
        && tokens[1].has_fraction
        && tokens[2].has_fraction
    {
        &tokens[1..]
    } else {
        tokens
    };

    if tokens.len() >= 2 {
        Some(Point::new(tokens[0].value, tokens[1].value))
    } else {
        None
    }
}

fn looks_like_row_index(token: &NumToken) -> bool {
    !token.signed && !token.has_fraction && token.digits <= 4
}

fn scan_token_stream(text: &str) -> Option<Vec<Point>> {
    let tokens = number_tokens(text);
    if tokens.len() < 2 {
        return None;
    }
    let points: Vec<Point> = tokens
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0].value, pair[1].value))
        .collect();
    Some(points)
}

fn number_tokens(text: &str) -> Vec<NumToken> {
    NUMBER_RE
        .find_iter(text)
        .filter_map(|m| {
            let raw = m.as_str();
            let value = parse_number(raw)?;
            let signed = raw.starts_with('-') || raw.starts_with('+');
            let has_fraction = raw.contains('.') || raw.contains(',');
            let digits = raw
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '-' || *c == '+')
                .filter(|c| c.is_ascii_digit())
                .count();
            Some(NumToken {
                value,
                signed,
                has_fraction,
                digits,
            })
        })
        .collect()
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn dms_conversion_round_trip() {
        assert!(close(dms_to_decimal(40.0, 30.0, 0.0, Some('N')), 40.5));
        assert!(close(dms_to_decimal(40.0, 30.0, 0.0, Some('S')), -40.5));
        assert!(close(dms_to_decimal(-40.0, 30.0, 0.0, None), -40.5));
        assert!(close(dms_to_decimal(77.0, 5.0, 28.0, None), 77.0 + 5.0 / 60.0 + 28.0 / 3600.0));
    }

    #[test]
    fn mixed_dms_and_decimal_lines() {
        let batch = parse_batch("77 05 28 63 13 44\n77.1 63.2").unwrap();
        assert_eq!(batch.len(), 2);
        assert!(close(batch[0].x, 77.0 + 5.0 / 60.0 + 28.0 / 3600.0));
        assert!(close(batch[0].y, 63.0 + 13.0 / 60.0 + 44.0 / 3600.0));
        assert!(close(batch[1].x, 77.1));
        assert!(close(batch[1].y, 63.2));
    }

    #[test]
    fn marker_notation_with_hemispheres() {
        let batch = parse_batch("59°57′ N 30°19′ E").unwrap();
        assert_eq!(batch.len(), 1);
        assert!(close(batch[0].x, 59.95));
        assert!(close(batch[0].y, 30.0 + 19.0 / 60.0));
    }

    #[test]
    fn southern_and_western_hemispheres_negate() {
        let batch = parse_batch("33 51 54 S 151 12 34 W").unwrap();
        assert_eq!(batch.len(), 1);
        assert!(batch[0].x < 0.0);
        assert!(batch[0].y < 0.0);
    }

    #[test]
    fn plain_metric_pair() {
        let batch = parse_batch("72853345 551668").unwrap();
        assert_eq!(batch.len(), 1);
        assert!(close(batch[0].x, 72_853_345.0));
        assert!(close(batch[0].y, 551_668.0));
    }

    #[test]
    fn comma_decimal_separator() {
        let batch = parse_batch("55,7558 37,6173").unwrap();
        assert_eq!(batch.len(), 1);
        assert!(close(batch[0].x, 55.7558));
        assert!(close(batch[0].y, 37.6173));
    }

    #[test]
    fn leading_row_index_is_skipped() {
        let batch = parse_batch("1 7285334.5 551668.2\n2 7285401.8 551700.9").unwrap();
        assert_eq!(batch.len(), 2);
        assert!(close(batch[0].x, 7_285_334.5));
        assert!(close(batch[1].y, 551_700.9));
    }

    #[test]
    fn long_integer_is_not_a_row_index() {
        // first token has too many digits to be an index; taken as X
        let batch = parse_batch("7285334 551668.2 100.0").unwrap();
        assert!(close(batch[0].x, 7_285_334.0));
        assert!(close(batch[0].y, 551_668.2));
    }

    #[test]
    fn unparseable_lines_are_skipped_within_a_batch() {
        let batch = parse_batch("точка опоры\n77.1 63.2\n---").unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn empty_batch_fails_as_a_whole() {
        assert!(matches!(
            parse_batch("нет данных"),
            Err(GeoAssistError::NoCoordinatesRecognized)
        ));
        assert!(matches!(
            parse_batch("\n  \n"),
            Err(GeoAssistError::NoCoordinatesRecognized)
        ));
    }

    #[test]
    fn bare_signs_are_not_numbers() {
        assert!(matches!(
            parse_batch("+ -"),
            Err(GeoAssistError::NoCoordinatesRecognized)
        ));
    }

    #[test]
    fn token_stream_fallback_pairs_values_across_lines() {
        let batch = parse_batch("X=7285334.5\nY=551668.2").unwrap();
        assert_eq!(batch.len(), 1);
        assert!(close(batch[0].x, 7_285_334.5));
        assert!(close(batch[0].y, 551_668.2));
    }

    #[test]
    fn labeled_single_line_pair() {
        let batch = parse_batch("X=728533.45 Y=551668.2").unwrap();
        assert_eq!(batch.len(), 1);
        assert!(close(batch[0].x, 728_533.45));
    }

    #[test]
    fn order_is_preserved() {
        let batch = parse_batch("10.0 1.0\n20.0 2.0\n30.0 3.0").unwrap();
        let xs: Vec<f64> = batch.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![10.0, 20.0, 30.0]);
    }
}
