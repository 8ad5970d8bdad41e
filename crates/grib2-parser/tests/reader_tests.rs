//! Reader tests against synthetic messages from the test-utils builder.

use std::sync::Arc;

use bytes::Bytes;
use grib2_parser::{unpack_with_grib, Grib2Error, Grib2Reader, Grib2Tables, GridTemplate};
use test_utils::{assert_approx_eq, create_pressure_systems, with_missing, Grib2Builder};

fn reader(data: Vec<u8>) -> Grib2Reader {
    Grib2Reader::new(Bytes::from(data), Arc::new(Grib2Tables::ncep()))
}

#[test]
fn test_message_metadata() {
    let data = Grib2Builder::mslma_latlon(5, 4)
        .with_reference_time(2024, 6, 15, 18)
        .with_forecast_hour(7)
        .build();

    let msg = reader(data).next_message().unwrap().unwrap();

    assert_eq!(msg.parameter(), "MSLMA");
    assert_eq!(msg.level(), "mean sea level");
    assert_eq!(msg.identification.center, 7);
    assert_eq!(
        msg.identification.reference_time.to_rfc3339(),
        "2024-06-15T18:00:00+00:00"
    );
    assert_eq!(msg.product_definition.forecast_time, 7);
    assert_eq!(msg.grid_definition.dims(), (5, 4));
    assert!(msg.matches(grib2_parser::tables::MSLMA, 101));
    assert!(!msg.matches((0, 3, 1), 101));
}

#[test]
fn test_latlon_grid_definition() {
    let data = Grib2Builder::mslma_latlon(5, 4).build();
    let msg = reader(data).next_message().unwrap().unwrap();

    match &msg.grid_definition.grid {
        GridTemplate::LatLon(grid) => {
            assert_eq!((grid.ni, grid.nj), (5, 4));
            assert_approx_eq!(grid.la1, 50.0, 1e-9);
            assert_approx_eq!(grid.lo1, 250.0, 1e-9);
            assert_approx_eq!(grid.la2, 47.0, 1e-9);
            assert_approx_eq!(grid.lo2, 254.0, 1e-9);
            assert_approx_eq!(grid.di, 1.0, 1e-9);
            assert_eq!(grid.scanning_mode, 0);
        }
        other => panic!("expected lat/lon grid, got {:?}", other),
    }
}

#[test]
fn test_lambert_grid_definition() {
    let data = Grib2Builder::mslma_lambert(6, 4).build();
    let msg = reader(data).next_message().unwrap().unwrap();

    assert_eq!(msg.grid_definition.template, 30);
    assert_eq!(msg.grid_definition.earth_radius(), 6_371_229.0);
    match &msg.grid_definition.grid {
        GridTemplate::Lambert(grid) => {
            assert_eq!((grid.nx, grid.ny), (6, 4));
            assert_approx_eq!(grid.la1, 21.138123, 1e-9);
            assert_approx_eq!(grid.lo1, 237.280472, 1e-9);
            assert_approx_eq!(grid.lov, 262.5, 1e-9);
            assert_approx_eq!(grid.latin1, 38.5, 1e-9);
            assert_approx_eq!(grid.latin2, 38.5, 1e-9);
            assert_approx_eq!(grid.dx, 3000.0, 1e-9);
            assert_eq!(grid.scanning_mode, 0x40);
        }
        other => panic!("expected Lambert grid, got {:?}", other),
    }
}

#[test]
fn test_unpack_pressure_field() {
    let values = create_pressure_systems(12, 9);
    let data = Grib2Builder::mslma_latlon(12, 9)
        .with_data(values.clone())
        .build();

    let msg = reader(data).next_message().unwrap().unwrap();
    let unpacked = msg.unpack_data().unwrap();

    assert_eq!(unpacked.len(), values.len());
    for (got, expected) in unpacked.iter().zip(&values) {
        // 16-bit packing of a ~40 hPa range keeps well under 0.1 Pa error
        assert_approx_eq!(*got, *expected, 0.1);
    }
}

#[test]
fn test_unpack_with_bitmap() {
    let mut values = create_pressure_systems(4, 3);
    values[5] = f32::NAN;
    let data = Grib2Builder::mslma_latlon(4, 3)
        .with_data(values.clone())
        .build();

    let msg = reader(data).next_message().unwrap().unwrap();
    assert!(msg.bitmap.is_some());
    assert_eq!(msg.data_representation.num_data_points, 11);

    let unpacked = msg.unpack_data().unwrap();
    assert!(unpacked[5].is_nan());
    assert_approx_eq!(unpacked[6], values[6], 0.1);
    assert_eq!(unpacked.iter().filter(|v| v.is_nan()).count(), 1);
}

#[test]
fn test_grib_crate_decoding_matches_native() {
    let values = with_missing(create_pressure_systems(24, 12), 24, &[(0, 5)]);
    let data = Grib2Builder::mslma_latlon(24, 12)
        .with_data(values.clone())
        .build();

    let msg = reader(data).next_message().unwrap().unwrap();
    assert!(msg.bitmap.is_some());

    let native = msg.unpack_data().unwrap();
    let external = unpack_with_grib(msg.raw()).unwrap();

    assert_eq!(native.len(), 288);
    assert_eq!(external.len(), native.len());
    for (i, (a, b)) in native.iter().zip(&external).enumerate() {
        if i == 5 {
            assert!(a.is_nan() && b.is_nan());
        } else {
            assert_approx_eq!(*a, *b, 1e-3);
            assert_approx_eq!(*a, values[i], 0.1);
        }
    }
}

#[test]
fn test_multiple_messages() {
    let mut data = Grib2Builder::mslma_latlon(3, 3)
        .with_parameter(0, 0)
        .with_level(103, 2)
        .build();
    data.extend(Grib2Builder::mslma_latlon(3, 3).build());

    let messages: Vec<_> = reader(data).collect::<Result<_, _>>().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].parameter(), "TMP");
    assert_eq!(messages[0].level(), "2 m above ground");
    assert_eq!(messages[1].parameter(), "MSLMA");
}

#[test]
fn test_empty_input_has_no_messages() {
    assert!(reader(Vec::new()).next_message().unwrap().is_none());
    assert!(reader(b"not a grib file".to_vec())
        .next_message()
        .unwrap()
        .is_none());
}

#[test]
fn test_truncated_message() {
    let mut data = Grib2Builder::mslma_latlon(3, 3).build();
    data.truncate(data.len() - 10);

    let result = reader(data).next_message();
    assert!(matches!(result, Err(Grib2Error::Truncated { .. })));
}

#[test]
fn test_iterator_stops_after_error() {
    let mut data = Grib2Builder::mslma_latlon(3, 3).build();
    let len = data.len();
    data[len - 1] = b'X';

    let mut reader = reader(data);
    assert!(matches!(reader.next(), Some(Err(Grib2Error::InvalidFormat(_)))));
    assert!(reader.next().is_none());
}

#[test]
fn test_real_hrrr_file() {
    let path = test_utils::require_test_file!("hrrr_mslma_sample.grib2");
    let data = std::fs::read(path).unwrap();

    let msg = reader(data)
        .find(|m| m.as_ref().map(|m| m.parameter() == "MSLMA").unwrap_or(true))
        .expect("MSLMA message")
        .unwrap();

    let values = msg.unpack_data().unwrap();
    let (ni, nj) = msg.grid_definition.dims();
    assert_eq!(values.len(), ni * nj);
    // Mean sea-level pressure in Pa
    assert!(values
        .iter()
        .filter(|v| !v.is_nan())
        .all(|v| *v > 85_000.0 && *v < 110_000.0));
}
