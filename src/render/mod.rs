use crate::geo::Point;
use crate::utils::Result;

const DELIMITER: u8 = b';';
/// UTF-8 BOM so spreadsheet imports pick the right code page.
const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
const DEFAULT_STEM: &str = "coordinates";
const CONVERTED_SUFFIX: &str = "_converted.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Monospace-friendly inline table: one `N;X;Y` row per point, 1-based index,
/// fixed six fractional digits.
pub fn render_inline(points: &[Point]) -> String {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{};{:.6};{:.6}", i + 1, p.x, p.y))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Same table as a downloadable `;`-delimited file with a header row and a
/// UTF-8 BOM prepended.
pub fn render_file(points: &[Point], name_hint: Option<&str>) -> Result<RenderedFile> {
    let mut bytes = BOM.to_vec();
    {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .from_writer(&mut bytes);
        writer.write_record(["N", "X", "Y"])?;
        for (i, p) in points.iter().enumerate() {
            writer.write_record(&[
                (i + 1).to_string(),
                format!("{:.6}", p.x),
                format!("{:.6}", p.y),
            ])?;
        }
        writer.flush()?;
    }

    Ok(RenderedFile {
        filename: derive_filename(name_hint),
        bytes,
    })
}

/// Sanitize the original filename (or fall back to a generic stem) and mark
/// the result as converted.
pub fn derive_filename(hint: Option<&str>) -> String {
    let stem = hint
        .map(|h| h.rsplit_once('.').map(|(s, _)| s).unwrap_or(h))
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_STEM);

    let clean: String = stem
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();

    format!("{}{}", clean, CONVERTED_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Point> {
        vec![
            Point::new(37.617314, 55.755826),
            Point::new(30.316229, 59.938732),
        ]
    }

    #[test]
    fn inline_rows_are_ordered_and_fixed_precision() {
        let table = render_inline(&sample());
        let rows: Vec<&str> = table.lines().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], "1;37.617314;55.755826");
        assert_eq!(rows[1], "2;30.316229;59.938732");
    }

    #[test]
    fn inline_pads_to_six_fractional_digits() {
        let table = render_inline(&[Point::new(40.5, -3.0)]);
        assert_eq!(table, "1;40.500000;-3.000000");
    }

    #[test]
    fn file_starts_with_bom_and_header() {
        let file = render_file(&sample(), None).unwrap();
        assert_eq!(&file.bytes[..3], &[0xEF, 0xBB, 0xBF]);
        let text = std::str::from_utf8(&file.bytes[3..]).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("N;X;Y"));
        assert_eq!(lines.next(), Some("1;37.617314;55.755826"));
        assert_eq!(lines.next(), Some("2;30.316229;59.938732"));
    }

    #[test]
    fn filename_is_sanitized_and_suffixed() {
        assert_eq!(
            derive_filename(Some("точки (вынос).txt")),
            "точки__вынос__converted.csv"
        );
        assert_eq!(derive_filename(Some("survey.csv")), "survey_converted.csv");
        assert_eq!(derive_filename(None), "coordinates_converted.csv");
    }
}
