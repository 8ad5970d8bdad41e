//! Decoding synthetic MSLMA messages.

use bytes::Bytes;
use mslp_charts::{decode_mslp, decode_mslp_bytes, DecodeError};
use mslp_common::{GridCell, GridCoordinates};
use test_utils::{assert_approx_eq, create_ramp_grid, with_missing, Grib2Builder};

#[test]
fn test_latlon_field_in_hpa_with_axes() {
    let data = create_ramp_grid(4, 3, 100_000.0, 102_000.0);
    let bytes = Grib2Builder::mslma_latlon(4, 3).with_data(data.clone()).build();

    let field = decode_mslp_bytes(Bytes::from(bytes)).unwrap();

    assert_eq!((field.width(), field.height()), (4, 3));
    for (got, expected) in field.values().iter().zip(&data) {
        assert_approx_eq!(*got, expected / 100.0, 0.01);
    }

    match field.coordinates() {
        GridCoordinates::Regular {
            latitudes,
            longitudes,
        } => {
            assert_eq!(latitudes.len(), 3);
            assert_eq!(longitudes.len(), 4);
            assert_approx_eq!(latitudes[0], 50.0, 1e-6);
            assert_approx_eq!(latitudes[2], 48.0, 1e-6);
            // 250E wraps into the western hemisphere
            assert_approx_eq!(longitudes[0], -110.0, 1e-6);
            assert_approx_eq!(longitudes[3], -107.0, 1e-6);
        }
        other => panic!("expected regular coordinates, got {other:?}"),
    }
}

#[test]
fn test_south_to_north_rows_are_flipped() {
    let data = create_ramp_grid(4, 3, 100_000.0, 102_000.0);
    let bytes = Grib2Builder::mslma_latlon(4, 3)
        .with_scanning_mode(0x40)
        .with_data(data.clone())
        .build();

    let field = decode_mslp_bytes(Bytes::from(bytes)).unwrap();

    // Last scanned row becomes row 0
    assert_approx_eq!(field.value(GridCell::new(0, 0)), data[8] / 100.0, 0.01);
    assert_approx_eq!(field.value(GridCell::new(2, 3)), data[3] / 100.0, 0.01);

    let (north, _) = field.location(GridCell::new(0, 0));
    let (south, _) = field.location(GridCell::new(2, 0));
    assert!(north > south);
}

#[test]
fn test_lambert_field_is_curvilinear_north_up() {
    let data = create_ramp_grid(3, 2, 99_000.0, 103_000.0);
    let bytes = Grib2Builder::mslma_lambert(3, 2).with_data(data.clone()).build();

    let field = decode_mslp_bytes(Bytes::from(bytes)).unwrap();

    assert!(matches!(
        field.coordinates(),
        GridCoordinates::Curvilinear { .. }
    ));
    assert_approx_eq!(field.value(GridCell::new(0, 0)), data[3] / 100.0, 0.01);
    assert_approx_eq!(field.value(GridCell::new(1, 0)), data[0] / 100.0, 0.01);

    // The first scanned point is the south-west corner of the HRRR grid
    let (lat, lon) = field.location(GridCell::new(1, 0));
    assert_approx_eq!(lat, 21.138123, 1e-3);
    assert_approx_eq!(lon, -122.719528, 1e-3);

    let (north_lat, _) = field.location(GridCell::new(0, 0));
    assert!(north_lat > lat);
}

#[test]
fn test_missing_points_are_nan() {
    let data = with_missing(create_ramp_grid(4, 3, 100_000.0, 102_000.0), 4, &[(1, 2)]);
    let bytes = Grib2Builder::mslma_latlon(4, 3).with_data(data).build();

    let field = decode_mslp_bytes(Bytes::from(bytes)).unwrap();

    assert!(field.value(GridCell::new(1, 2)).is_nan());
    assert_eq!(field.values().iter().filter(|v| v.is_nan()).count(), 1);
}

#[test]
fn test_selects_mslma_among_other_messages() {
    let prmsl = Grib2Builder::mslma_latlon(2, 2)
        .with_parameter(3, 1)
        .with_data(vec![90_000.0; 4])
        .build();
    let surface = Grib2Builder::mslma_latlon(2, 2)
        .with_level(1, 0)
        .with_data(vec![95_000.0; 4])
        .build();
    let mslma = Grib2Builder::mslma_latlon(2, 2)
        .with_data(vec![101_000.0, 101_100.0, 101_200.0, 101_300.0])
        .build();

    let mut file = prmsl;
    file.extend(surface);
    file.extend(mslma);

    let field = decode_mslp_bytes(Bytes::from(file)).unwrap();
    assert_approx_eq!(field.values()[0], 1010.0, 0.01);
    assert_approx_eq!(field.values()[3], 1013.0, 0.01);
}

#[test]
fn test_no_mslma_message_is_field_not_found() {
    let bytes = Grib2Builder::mslma_latlon(2, 2).with_parameter(3, 1).build();

    assert!(matches!(
        decode_mslp_bytes(Bytes::from(bytes)),
        Err(DecodeError::FieldNotFound)
    ));
    assert!(matches!(
        decode_mslp_bytes(Bytes::new()),
        Err(DecodeError::FieldNotFound)
    ));
}

#[test]
fn test_unsupported_grid_template() {
    let bytes = Grib2Builder::mslma_latlon(3, 3)
        .with_polar_stereographic_grid()
        .build();

    assert!(matches!(
        decode_mslp_bytes(Bytes::from(bytes)),
        Err(DecodeError::UnsupportedTemplate(20))
    ));
}

#[test]
fn test_unsupported_scanning_mode() {
    let bytes = Grib2Builder::mslma_latlon(3, 3)
        .with_scanning_mode(0x80)
        .build();

    assert!(matches!(
        decode_mslp_bytes(Bytes::from(bytes)),
        Err(DecodeError::UnsupportedScanMode(0x80))
    ));
}

#[test]
fn test_truncated_file_is_grib_error() {
    let mut bytes = Grib2Builder::mslma_latlon(4, 3).build();
    bytes.truncate(bytes.len() - 10);

    assert!(matches!(
        decode_mslp_bytes(Bytes::from(bytes)),
        Err(DecodeError::Grib(_))
    ));
}

#[tokio::test]
async fn test_decode_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hrrr.t12z.wrfsfcf00.grib2");
    std::fs::write(&path, Grib2Builder::mslma_latlon(4, 3).build()).unwrap();

    let field = decode_mslp(&path).await.unwrap();
    assert_approx_eq!(field.values()[0], 1013.25, 0.01);

    let missing = dir.path().join("missing.grib2");
    assert!(matches!(
        decode_mslp(&missing).await,
        Err(DecodeError::Io { .. })
    ));
}
