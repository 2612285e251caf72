use geoassist::recognition::RecognitionResult;
use geoassist::service::{ConversionOutput, ConversionService};
use geoassist::session::OutputMode;
use geoassist::GeoAssistError;

async fn configure(
    service: &ConversionService,
    user: i64,
    source: &str,
    source_zone: Option<u32>,
    dest: &str,
    mode: OutputMode,
) {
    service.open(user).await;
    service.select_source(user, source).await.unwrap();
    if let Some(zone) = source_zone {
        service.select_zone(user, zone).await.unwrap();
    }
    service.select_dest(user, dest).await.unwrap();
    service.select_output(user, mode).await.unwrap();
    service.confirm_ready(user).await.unwrap();
}

fn inline_rows(output: ConversionOutput) -> Vec<String> {
    match output {
        ConversionOutput::Inline(table) => table.lines().map(|l| l.to_string()).collect(),
        ConversionOutput::File(_) => panic!("expected inline output"),
    }
}

#[tokio::test]
async fn input_before_ready_is_rejected_with_missing_fields() {
    let service = ConversionService::new();
    service.open(1).await;

    match service.convert_text(1, "55.75 37.61").await.unwrap_err() {
        GeoAssistError::SetupIncomplete { missing } => {
            assert_eq!(missing.len(), 3);
        }
        other => panic!("unexpected error: {other}"),
    }

    service.select_source(1, "wgs84").await.unwrap();
    service.select_dest(1, "sk42").await.unwrap();
    match service.convert_text(1, "55.75 37.61").await.unwrap_err() {
        GeoAssistError::SetupIncomplete { missing } => {
            assert_eq!(missing, vec!["output mode"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn metric_zone_input_converts_to_geographic_inline() {
    let service = ConversionService::new();
    configure(&service, 7, "sk42_gk", Some(7), "wgs84", OutputMode::Inline).await;

    let rows = inline_rows(
        service
            .convert_text(7, "7500000 6200000")
            .await
            .unwrap(),
    );
    assert_eq!(rows.len(), 1);

    let fields: Vec<&str> = rows[0].split(';').collect();
    assert_eq!(fields[0], "1");
    let lon: f64 = fields[1].parse().unwrap();
    let lat: f64 = fields[2].parse().unwrap();
    assert!(lon.abs() <= 180.0 && lat.abs() <= 90.0);
    // zone 7 false easting sits on the 39°E central meridian
    assert!((lon - 39.0).abs() < 1.0, "lon {lon}");
    assert!((54.0..58.0).contains(&lat), "lat {lat}");
}

#[tokio::test]
async fn mixed_notation_batch_keeps_count_and_order() {
    let service = ConversionService::new();
    configure(&service, 2, "wgs84", None, "wgs84", OutputMode::Inline).await;

    let rows = inline_rows(
        service
            .convert_text(2, "77 05 28 63 13 44\n77.1 63.2")
            .await
            .unwrap(),
    );
    assert_eq!(rows.len(), 2);
    assert!(rows[0].starts_with("1;"));
    assert!(rows[1].starts_with("2;"));

    let first_x: f64 = rows[0].split(';').nth(1).unwrap().parse().unwrap();
    let second_x: f64 = rows[1].split(';').nth(1).unwrap().parse().unwrap();
    assert!((first_x - (77.0 + 5.0 / 60.0 + 28.0 / 3600.0)).abs() < 1e-5);
    assert!((second_x - 77.1).abs() < 1e-5);
}

#[tokio::test]
async fn uncertain_recognition_never_reaches_the_transform() {
    let service = ConversionService::new();
    configure(&service, 3, "sk42_gk", Some(7), "wgs84", OutputMode::Inline).await;

    let recognized = RecognitionResult {
        text: "X=728533?5 Y=55166?".to_string(),
    };
    assert!(matches!(
        service.convert_recognized(3, &recognized).await.unwrap_err(),
        GeoAssistError::RecognitionUncertain
    ));

    // the same digits without uncertainty go through
    let certain = RecognitionResult {
        text: "7285334.5 551668.2".to_string(),
    };
    assert!(service.convert_recognized(3, &certain).await.is_ok());
}

#[tokio::test]
async fn zone_out_of_range_is_rejected_before_anything_is_stored() {
    let service = ConversionService::new();
    service.open(4).await;
    service.select_source(4, "utm").await.unwrap();

    assert!(matches!(
        service.select_zone(4, 65).await.unwrap_err(),
        GeoAssistError::InvalidZone(65)
    ));
    let (_, summary) = service.setup_summary(4).await;
    assert!(summary.starts_with("source: —"));
}

#[tokio::test]
async fn file_upload_produces_a_bom_prefixed_named_file() {
    let service = ConversionService::new();
    service.open(5).await;
    service.select_source(5, "wgs84").await.unwrap();
    service.select_dest(5, "utm").await.unwrap();
    service.select_zone(5, 31).await.unwrap();
    service.select_output(5, OutputMode::File).await.unwrap();
    service.confirm_ready(5).await.unwrap();

    let content = "3.0 10.0\n3.0 20.0\n";
    let output = service
        .convert_file(5, "полевые точки.txt", content.as_bytes())
        .await
        .unwrap();

    let file = match output {
        ConversionOutput::File(file) => file,
        ConversionOutput::Inline(_) => panic!("expected file output"),
    };
    assert_eq!(&file.bytes[..3], &[0xEF, 0xBB, 0xBF]);
    assert!(file.filename.ends_with("_converted.csv"));
    assert!(!file.filename.contains(' '));

    let text = String::from_utf8_lossy(&file.bytes[3..]).to_string();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "N;X;Y");
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("1;"));
    assert!(lines[2].starts_with("2;"));
}

#[tokio::test]
async fn reset_discards_in_flight_configuration() {
    let service = ConversionService::new();
    configure(&service, 6, "wgs84", None, "sk42", OutputMode::Inline).await;
    assert!(service.convert_text(6, "55.75 37.61").await.is_ok());

    service.reset(6).await;
    assert!(matches!(
        service.convert_text(6, "55.75 37.61").await.unwrap_err(),
        GeoAssistError::SetupIncomplete { .. }
    ));
}

#[tokio::test]
async fn sessions_do_not_leak_between_users() {
    let service = ConversionService::new();
    configure(&service, 10, "wgs84", None, "sk42", OutputMode::Inline).await;

    // a different user starts from scratch
    assert!(matches!(
        service.convert_text(11, "55.75 37.61").await.unwrap_err(),
        GeoAssistError::SetupIncomplete { .. }
    ));
    let (_, summary) = service.setup_summary(11).await;
    assert_eq!(summary, "source: —; destination: —; output: —");
}
