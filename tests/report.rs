use drawing_metadata_retriever::config::Config;
use drawing_metadata_retriever::pipeline::run;
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Minimal little-endian TIFF block with an IFD0 carrying dimensions, artist and copyright.
///
/// Strings are always stored by offset, so each must be at least 4 bytes long.
fn tiff_ifd0(width: u16, height: u16, artist: &str, copyright: &str) -> Vec<u8> {
    let artist = [artist.as_bytes(), b"\0"].concat();
    let copyright = [copyright.as_bytes(), b"\0"].concat();

    let entries: u16 = 4;
    let data_start = 8 + 2 + 12 * entries as u32 + 4;
    let artist_off = data_start;
    let copyright_off = artist_off + artist.len() as u32;

    let mut out = Vec::new();
    out.extend_from_slice(b"II");
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&8u32.to_le_bytes());
    out.extend_from_slice(&entries.to_le_bytes());

    let mut entry = |tag: u16, kind: u16, count: u32, value: u32| {
        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(&kind.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&value.to_le_bytes());
    };
    entry(0x0100, 3, 1, width as u32);
    entry(0x0101, 3, 1, height as u32);
    entry(0x013B, 2, artist.len() as u32, artist_off);
    entry(0x8298, 2, copyright.len() as u32, copyright_off);

    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&artist);
    out.extend_from_slice(&copyright);
    out
}

/// A real JPEG with an APP1 EXIF segment spliced in after SOI.
fn jpeg_with_exif(pixels: (u32, u32), tiff: &[u8]) -> Vec<u8> {
    let mut jpeg = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(pixels.0, pixels.1))
        .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
        .unwrap();
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

    let len = (2 + 6 + tiff.len()) as u16;
    let mut app1 = vec![0xFF, 0xE1];
    app1.extend_from_slice(&len.to_be_bytes());
    app1.extend_from_slice(b"Exif\0\0");
    app1.extend_from_slice(tiff);

    [&jpeg[..2], app1.as_slice(), &jpeg[2..]].concat()
}

fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &b in bytes {
        crc ^= b as u32;
        for _ in 0..8 {
            crc = if crc & 1 == 1 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
        }
    }
    !crc
}

/// A real PNG with an `eXIf` chunk inserted right after IHDR.
fn png_with_exif(pixels: (u32, u32), exif: &[u8]) -> Vec<u8> {
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(pixels.0, pixels.1))
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();
    // 8-byte signature, then IHDR: length, type, 13 data bytes, CRC
    assert_eq!(&png[12..16], b"IHDR");
    let ihdr_end = 8 + 4 + 4 + 13 + 4;

    let body = [b"eXIf".as_slice(), exif].concat();
    let mut chunk = (exif.len() as u32).to_be_bytes().to_vec();
    chunk.extend_from_slice(&body);
    chunk.extend_from_slice(&crc32(&body).to_be_bytes());

    [&png[..ihdr_end], chunk.as_slice(), &png[ihdr_end..]].concat()
}

fn png(path: &Path, width: u32, height: u32) {
    RgbImage::new(width, height)
        .save_with_format(path, ImageFormat::Png)
        .unwrap();
}

fn read_records(path: &Path) -> Vec<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .unwrap();
    rdr.records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

fn config_for(out: &Path) -> Config {
    let mut config = Config::default();
    config.output.file = out.to_string_lossy().into_owned();
    config
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap()
}

fn folder_row(path: &Path) -> Vec<String> {
    vec![path.to_string_lossy().into_owned()]
}

fn blank_row() -> Vec<String> {
    vec![String::new()]
}

#[test]
fn root_pictures_come_first_then_each_folder_once() {
    let art = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let root = absolute(art.path());
    let sub = root.join("a-sub");
    let deep = sub.join("deep");
    fs::create_dir_all(&deep).unwrap();

    png(&root.join("b.png"), 4, 3);
    png(&root.join("Z.PNG"), 5, 6);
    fs::write(root.join("notes.txt"), b"not a picture").unwrap();
    png(&sub.join("c.png"), 7, 8);
    fs::write(sub.join("palette.aco"), b"nope").unwrap();
    png(&deep.join("d.png"), 1, 2);

    let report = out.path().join("report.csv");
    let summary = run(&root, &config_for(&report)).unwrap();
    assert_eq!(summary.rows.len(), 4);
    assert_eq!(summary.unreadable, 0);

    let records = read_records(&report);
    let size = |p: PathBuf| fs::metadata(p).unwrap().len().to_string();
    let row = |name: &str, w: &str, h: &str, size: String| -> Vec<String> {
        vec![name.into(), w.into(), h.into(), String::new(), String::new(), size]
    };

    assert_eq!(
        records,
        vec![
            vec![
                "File".to_string(),
                "Width".into(),
                "Height".into(),
                "Artist".into(),
                "Copyright".into(),
                "Filesize (bytes)".into(),
            ],
            folder_row(&root),
            row("Z.PNG", "5", "6", size(root.join("Z.PNG"))),
            row("b.png", "4", "3", size(root.join("b.png"))),
            blank_row(),
            folder_row(&sub),
            row("c.png", "7", "8", size(sub.join("c.png"))),
            blank_row(),
            folder_row(&deep),
            row("d.png", "1", "2", size(deep.join("d.png"))),
        ]
    );
}

#[test]
fn exif_artist_copyright_and_dimensions() {
    let art = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    let tiff = tiff_ifd0(640, 480, "Jane Doe", "(c) 2024 Jane Doe");
    let bytes = jpeg_with_exif((8, 8), &tiff);
    fs::write(art.path().join("portrait.jpg"), &bytes).unwrap();

    let report = out.path().join("report.csv");
    let summary = run(art.path(), &config_for(&report)).unwrap();

    assert_eq!(summary.rows.len(), 1);
    let row = &summary.rows[0];
    assert_eq!(row.file, "portrait.jpg");
    assert_eq!(row.width, "640");
    assert_eq!(row.height, "480");
    assert_eq!(row.artist, "Jane Doe");
    assert_eq!(row.copyright, "(c) 2024 Jane Doe");
    assert_eq!(row.filesize, bytes.len() as u64);

    let records = read_records(&report);
    assert_eq!(
        records[2],
        vec![
            "portrait.jpg".to_string(),
            "640".into(),
            "480".into(),
            "Jane Doe".into(),
            "(c) 2024 Jane Doe".into(),
            bytes.len().to_string(),
        ]
    );
}

#[test]
fn jpeg_without_exif_uses_frame_header() {
    let art = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    let mut jpeg = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(33, 17))
        .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
        .unwrap();
    fs::write(art.path().join("plain.JPEG"), &jpeg).unwrap();

    let summary = run(art.path(), &config_for(&out.path().join("r.csv"))).unwrap();
    let row = &summary.rows[0];
    assert_eq!((row.width.as_str(), row.height.as_str()), ("33", "17"));
    assert_eq!(row.artist, "");
    assert_eq!(row.copyright, "");
}

#[test]
fn corrupt_picture_keeps_name_and_size() {
    let art = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    fs::write(art.path().join("broken.tiff"), b"garbage bytes").unwrap();
    png(&art.path().join("ok.png"), 2, 2);

    let report = out.path().join("r.csv");
    let summary = run(art.path(), &config_for(&report)).unwrap();
    assert_eq!(summary.rows.len(), 2);
    assert_eq!(summary.unreadable, 1);

    let records = read_records(&report);
    assert_eq!(
        records[2],
        vec!["broken.tiff".to_string(), "".into(), "".into(), "".into(), "".into(), "13".into()]
    );
    assert_eq!(records[3][0], "ok.png");
    assert_eq!(records[3][1], "2");
}

#[test]
fn rerun_is_byte_identical() {
    let art = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let sub = art.path().join("sketches");
    fs::create_dir(&sub).unwrap();
    for name in ["q.png", "b.png", "m.png"] {
        png(&art.path().join(name), 3, 3);
        png(&sub.join(name), 6, 6);
    }

    let first = out.path().join("first.csv");
    let second = out.path().join("second.csv");
    run(art.path(), &config_for(&first)).unwrap();
    run(art.path(), &config_for(&second)).unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn missing_root_leaves_header_only() {
    let out = TempDir::new().unwrap();
    let report = out.path().join("r.csv");

    let summary = run(&out.path().join("nowhere"), &config_for(&report)).unwrap();
    assert!(summary.scan_failed);
    assert_eq!(
        fs::read_to_string(&report).unwrap(),
        "\"File\",\"Width\",\"Height\",\"Artist\",\"Copyright\",\"Filesize (bytes)\"\n"
    );
}

#[test]
fn png_exif_chunk_supplies_artist_and_copyright() {
    let art = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    let tiff = tiff_ifd0(320, 200, "Jane", "(c) Jane");
    let bytes = png_with_exif((4, 4), &tiff);
    fs::write(art.path().join("a.png"), &bytes).unwrap();

    let summary = run(art.path(), &config_for(&out.path().join("r.csv"))).unwrap();
    assert_eq!(summary.unreadable, 0);
    let row = &summary.rows[0];
    assert_eq!(row.file, "a.png");
    assert_eq!((row.width.as_str(), row.height.as_str()), ("320", "200"));
    assert_eq!(row.artist, "Jane");
    assert_eq!(row.copyright, "(c) Jane");
    assert_eq!(row.filesize, bytes.len() as u64);
}

#[test]
fn png_exif_chunk_with_app1_marker() {
    let art = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    let payload = [b"Exif\0\0".as_slice(), &tiff_ifd0(4, 4, "Jane", "(c) Jane")].concat();
    fs::write(art.path().join("marked.png"), png_with_exif((4, 4), &payload)).unwrap();

    let summary = run(art.path(), &config_for(&out.path().join("r.csv"))).unwrap();
    let row = &summary.rows[0];
    assert_eq!(row.artist, "Jane");
    assert_eq!(row.copyright, "(c) Jane");
    assert_eq!((row.width.as_str(), row.height.as_str()), ("4", "4"));
}

#[test]
fn gif_and_tiff_dimensions_come_from_the_file() {
    let art = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    RgbaImage::new(9, 5)
        .save_with_format(art.path().join("loop.gif"), ImageFormat::Gif)
        .unwrap();
    RgbImage::new(11, 6)
        .save_with_format(art.path().join("scan.TIFF"), ImageFormat::Tiff)
        .unwrap();

    let report = out.path().join("r.csv");
    let summary = run(art.path(), &config_for(&report)).unwrap();
    assert_eq!(summary.unreadable, 0);

    let records = read_records(&report);
    let size = |name: &str| fs::metadata(art.path().join(name)).unwrap().len().to_string();
    assert_eq!(
        records[2..],
        [
            vec!["loop.gif".to_string(), "9".into(), "5".into(), "".into(), "".into(), size("loop.gif")],
            vec!["scan.TIFF".to_string(), "11".into(), "6".into(), "".into(), "".into(), size("scan.TIFF")],
        ]
    );
}

#[test]
fn tiff_ifd0_artist_and_copyright() {
    let art = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    let tiff = tiff_ifd0(1200, 900, "A. Painter", "CC BY 4.0");
    fs::write(art.path().join("plate.tiff"), &tiff).unwrap();

    let summary = run(art.path(), &config_for(&out.path().join("r.csv"))).unwrap();
    assert_eq!(summary.unreadable, 0);
    let row = &summary.rows[0];
    assert_eq!((row.width.as_str(), row.height.as_str()), ("1200", "900"));
    assert_eq!(row.artist, "A. Painter");
    assert_eq!(row.copyright, "CC BY 4.0");
    assert_eq!(row.filesize, tiff.len() as u64);
}

#[test]
fn trailing_separator_root_is_written_like_subfolders() {
    let art = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let root = absolute(art.path());
    let sub = root.join("sub");
    fs::create_dir(&sub).unwrap();
    png(&root.join("a.png"), 2, 2);
    png(&sub.join("b.png"), 2, 2);

    let typed = format!("{}{}", root.display(), std::path::MAIN_SEPARATOR);
    let report = out.path().join("r.csv");
    run(Path::new(&typed), &config_for(&report)).unwrap();

    let records = read_records(&report);
    assert_eq!(records[1], folder_row(&root));
    assert_eq!(records[4], folder_row(&sub));
    assert!(!records[1][0].ends_with(std::path::MAIN_SEPARATOR));
    assert!(records[4][0].starts_with(&format!("{}{}", records[1][0], std::path::MAIN_SEPARATOR)));
}
