use aruco_nav::markers::{builtins, ArucoDetector, Dictionary, DetectorParams};
use aruco_nav::{generate_marker, DictionarySource, GenerateError, GenerateRequest};

#[test]
fn writes_named_png_with_requested_size() {
    let dir = tempfile::tempdir().expect("tempdir");
    let req = GenerateRequest {
        out_dir: dir.path().to_path_buf(),
        ..GenerateRequest::default()
    };
    let marker = generate_marker(&req).expect("generate");

    assert!(marker.path.is_absolute());
    assert_eq!(
        marker.path.file_name().and_then(|n| n.to_str()),
        Some("aruco_marker_id_42.png")
    );

    let img = image::open(&marker.path).expect("png").to_luma8();
    assert_eq!(img.dimensions(), (500, 500));
    assert_eq!(img.as_raw(), &marker.image.data);
}

#[test]
fn written_marker_is_detectable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let req = GenerateRequest {
        id: 199,
        side_px: 200,
        out_dir: dir.path().to_path_buf(),
        ..GenerateRequest::default()
    };
    let marker = generate_marker(&req).expect("generate");

    let printed = image::open(&marker.path).expect("png").to_luma8();
    let mut page = image::GrayImage::from_pixel(300, 300, image::Luma([255]));
    image::imageops::overlay(&mut page, &printed, 50, 50);

    let det = ArucoDetector::new(builtins::DICT_6X6_250, DetectorParams::default())
        .expect("detector")
        .detect_markers_image(&page);
    assert_eq!(det.ids, vec![199]);
}

#[test]
fn dictionary_file_source() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dict_path = dir.path().join("tiny.json");
    let tiny = Dictionary {
        name: "TINY_4X4".into(),
        marker_size: 4,
        max_correction_bits: 1,
        codes: vec![0b1010_0101_1100_0011u64, 0b0110_1001_0011_1100].into(),
    };
    std::fs::write(&dict_path, tiny.to_json_string().expect("json")).expect("write");

    let req = GenerateRequest {
        dictionary: DictionarySource::File(dict_path),
        id: 1,
        side_px: 60,
        out_dir: dir.path().to_path_buf(),
        ..GenerateRequest::default()
    };
    let marker = generate_marker(&req).expect("generate");
    assert_eq!((marker.image.width, marker.image.height), (60, 60));

    let out_of_range = GenerateRequest { id: 2, ..req };
    assert!(matches!(
        generate_marker(&out_of_range),
        Err(GenerateError::Render(_))
    ));
}
