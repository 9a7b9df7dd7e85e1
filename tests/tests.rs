use imgref::ImgRef;
use imgref::ImgVec;
use rgb::ComponentMap;
use rgb::{RGB8, RGBA8};
use spritegif::progress::{AbortFlag, NoProgress, ProgressReporter};
use spritegif::*;

const CELL: usize = 8;

const COLORS: [RGBA8; 6] = [
    RGBA8::new(255, 0, 0, 255),
    RGBA8::new(0, 255, 0, 255),
    RGBA8::new(0, 0, 255, 255),
    RGBA8::new(255, 255, 0, 255),
    RGBA8::new(0, 255, 255, 255),
    RGBA8::new(40, 40, 40, 255),
];

/// Row-major sheet where every cell is filled with one color
fn solid_sheet(rows: usize, cols: usize) -> ImgVec<RGBA8> {
    let width = cols * CELL;
    let mut buf = Vec::with_capacity(width * rows * CELL);
    for y in 0..rows * CELL {
        for x in 0..width {
            buf.push(COLORS[(y / CELL) * cols + x / CELL]);
        }
    }
    ImgVec::new(buf, width, rows * CELL)
}

/// White cells with a red square in the middle
fn stamped_sheet(cols: usize) -> ImgVec<RGBA8> {
    let width = cols * CELL;
    let mut buf = Vec::with_capacity(width * CELL);
    for y in 0..CELL {
        for x in 0..width {
            let inside = (2..6).contains(&(x % CELL)) && (2..6).contains(&y);
            buf.push(if inside { RGBA8::new(255, 0, 0, 255) } else { RGBA8::new(255, 255, 255, 255) });
        }
    }
    ImgVec::new(buf, width, CELL)
}

fn encode(sheet: &ImgVec<RGBA8>, settings: &Settings) -> GifResult<(Vec<u8>, RenderReport)> {
    encode_to_vec(sheet.as_ref(), settings, &mut NoProgress {}, &AbortFlag::new())
}

fn for_each_frame(mut gif_data: &[u8], mut cb: impl FnMut(&gif::Frame, ImgRef<RGBA8>)) {
    let mut gif_opts = gif::DecodeOptions::new();
    gif_opts.set_color_output(gif::ColorOutput::Indexed);
    let mut decoder = gif_opts.read_info(&mut gif_data).unwrap();
    let mut screen = gif_dispose::Screen::new_decoder(&decoder);

    while let Some(frame) = decoder.read_next_frame().unwrap() {
        screen.blit_frame(frame).unwrap();
        cb(frame, screen.pixels_rgba());
    }
}

fn pixel(img: ImgRef<RGBA8>, x: usize, y: usize) -> RGBA8 {
    img.rows().nth(y).unwrap()[x]
}

#[track_caller]
fn assert_solid(img: ImgRef<RGBA8>, expected: RGBA8) {
    for px in img.pixels() {
        let d = px.map(|c| c as i32) - expected.map(|c| c as i32);
        assert!(d.r.abs() <= 2 && d.g.abs() <= 2 && d.b.abs() <= 2 && px.a == 255, "{px:?} != {expected:?}");
    }
}

#[test]
fn frames_follow_grid_order() {
    let sheet = solid_sheet(2, 3);
    let mut settings = Settings::grid(2, 3);
    settings.total_frames = 5;
    settings.excluded_frames.insert(2);

    let (gif, report) = encode(&sheet, &settings).unwrap();
    assert_eq!(report.frames_written, 4);
    assert_eq!((report.width, report.height), (CELL as u32, CELL as u32));

    let mut seen = vec![];
    for_each_frame(&gif, |frame, screen| {
        assert_eq!((frame.width as usize, frame.height as usize), (CELL, CELL));
        assert_eq!(frame.delay, 10);
        seen.push(pixel(screen, 0, 0));
        assert_solid(screen, pixel(screen, 0, 0));
    });
    assert_eq!(seen.len(), 4);
    for (px, expected) in seen.into_iter().zip([0, 1, 3, 4]) {
        assert_solid(ImgVec::new(vec![px], 1, 1).as_ref(), COLORS[expected]);
    }
}

#[test]
fn column_major_reading() {
    let sheet = solid_sheet(2, 3);
    let mut settings = Settings::grid(2, 3);
    settings.total_frames = 6;
    settings.read_order = grid::ReadOrder::ColumnMajor;

    let mut seen = vec![];
    let (gif, _) = encode(&sheet, &settings).unwrap();
    for_each_frame(&gif, |_, screen| seen.push(pixel(screen, 3, 3)));
    let expected: Vec<_> = [0, 3, 1, 4, 2, 5].iter().map(|&i| COLORS[i]).collect();
    assert_eq!(seen, expected);
}

#[test]
fn delay_rounds_to_centiseconds() {
    let sheet = solid_sheet(1, 2);
    let mut settings = Settings::grid(1, 2);
    settings.fps = 12.;
    let (gif, report) = encode(&sheet, &settings).unwrap();
    assert_eq!(report.delay_ms, 83);
    for_each_frame(&gif, |frame, _| assert_eq!(frame.delay, 8));
}

#[test]
fn keyed_background_is_transparent() {
    let sheet = stamped_sheet(2);
    let mut settings = Settings::grid(1, 2);
    settings.transparent = Some(RGB8::new(255, 255, 255));

    let (gif, _) = encode(&sheet, &settings).unwrap();
    let mut n = 0;
    for_each_frame(&gif, |frame, screen| {
        assert!(frame.transparent.is_some());
        assert_eq!(pixel(screen, 0, 0).a, 0);
        assert_eq!(pixel(screen, 7, 7).a, 0);
        assert_eq!(pixel(screen, 4, 4), RGBA8::new(255, 0, 0, 255));
        n += 1;
    });
    assert_eq!(n, 2);
}

#[test]
fn scaled_output() {
    let sheet = stamped_sheet(1);
    let mut settings = Settings::grid(1, 1);
    settings.scale = 3.;
    let (gif, report) = encode(&sheet, &settings).unwrap();
    assert_eq!((report.width, report.height), (24, 24));
    for_each_frame(&gif, |_, screen| {
        assert_eq!(pixel(screen, 0, 0), RGBA8::new(255, 255, 255, 255));
        assert_eq!(pixel(screen, 12, 12), RGBA8::new(255, 0, 0, 255));
    });
}

#[test]
fn output_is_deterministic() {
    let sheet = stamped_sheet(3);
    let mut settings = Settings::grid(1, 3);
    settings.transparent = Some(RGB8::new(255, 255, 255));
    settings.auto_align = true;
    let (a, _) = encode(&sheet, &settings).unwrap();
    let (b, _) = encode(&sheet, &settings).unwrap();
    assert_eq!(a, b);
}

struct StopAfter(usize);

impl ProgressReporter for StopAfter {
    fn increase(&mut self) -> bool {
        self.0 = self.0.saturating_sub(1);
        self.0 > 0
    }
}

#[test]
fn reporter_can_abort() {
    let sheet = solid_sheet(2, 3);
    let mut settings = Settings::grid(2, 3);
    settings.total_frames = 6;
    let res = encode_to_vec(sheet.as_ref(), &settings, &mut StopAfter(2), &AbortFlag::new());
    assert!(matches!(res, Err(Error::Aborted)), "{res:?}");
}

#[test]
fn abort_flag_stops_render() {
    let sheet = solid_sheet(1, 2);
    let abort = AbortFlag::new();
    abort.abort();
    let res = encode_to_vec(sheet.as_ref(), &Settings::grid(1, 2), &mut NoProgress {}, &abort);
    assert!(matches!(res, Err(Error::Aborted)), "{res:?}");
}

#[test]
fn bad_settings_write_nothing() {
    let sheet = solid_sheet(1, 2);
    let mut settings = Settings::grid(1, 2);
    settings.crop.left = 5.;
    settings.crop.right = 4.;
    assert!(matches!(encode(&sheet, &settings), Err(Error::InvalidCrop(..))));

    let mut settings = Settings::grid(1, 2);
    settings.excluded_frames.extend([0, 1]);
    assert!(matches!(encode(&sheet, &settings), Err(Error::EmptySequence)));
}

#[test]
fn decodes_png_sheets() {
    let sheet = stamped_sheet(2);
    let png = lodepng::encode32(sheet.buf(), sheet.width(), sheet.height()).unwrap();
    let decoded = decode_png_memory(&png).unwrap();
    assert_eq!(decoded.width(), 16);
    assert_eq!(decoded.buf(), sheet.buf());

    assert!(matches!(decode_png_memory(b"not a png"), Err(Error::PNG(_))));
}
