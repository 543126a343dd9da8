use std::path::PathBuf;

use trackplot::{PlotStyle, RunConfig, TrackplotError, text::find_system_font};

const HEADER: &str =
    "vehicle_id,time,location_x,location_y,rotation_yaw,velocity_x,velocity_y,velocity_z\n";

fn write_csv(path: &std::path::Path, distinct_times: usize) {
    let mut csv = String::from(HEADER);
    for i in 0..distinct_times {
        csv.push_str(&format!(
            "ego,{:.1},{}.0,{}.0,{}.0,{}.0,0.0,0.0\n",
            i as f64 * 0.1,
            i,
            i / 2,
            i * 3,
            i + 1
        ));
    }
    std::fs::write(path, csv).unwrap();
}

fn small_style() -> PlotStyle {
    PlotStyle {
        fig_width_in: 4.0,
        fig_height_in: 3.0,
        dpi: 50.0,
        ..PlotStyle::default()
    }
}

#[test]
fn run_writes_one_png_per_frame_window() {
    let Some(font) = find_system_font() else {
        eprintln!("skipping: no system font found");
        return;
    };

    let dir = PathBuf::from("target").join("pipeline_smoke");
    let out_dir = dir.join("res");
    std::fs::create_dir_all(&out_dir).unwrap();

    let input = dir.join("smoke.csv");
    // 25 distinct times with window 10 means 3 cumulative frames.
    write_csv(&input, 25);

    for i in 1..=3 {
        let _ = std::fs::remove_file(out_dir.join(format!("smoke_t_{i}.png")));
    }

    let config = RunConfig {
        input,
        out_dir: out_dir.clone(),
        font,
        style: small_style(),
    };
    trackplot::run(&config).unwrap();

    for i in 1..=3 {
        let path = out_dir.join(format!("smoke_t_{i}.png"));
        let img = image::open(&path)
            .unwrap_or_else(|e| panic!("cannot decode {}: {e}", path.display()));
        let rgba = img.to_rgba8();
        assert_eq!(rgba.dimensions(), (200, 150));
        // Transparent background survives the PNG round trip.
        assert_eq!(rgba.get_pixel(0, 0).0[3], 0);
        // Something was actually drawn.
        assert!(rgba.pixels().any(|p| p.0[3] != 0));
    }
    assert!(!out_dir.join("smoke_t_4.png").exists());
}

#[test]
fn missing_input_file_is_a_dataset_error() {
    let Some(font) = find_system_font() else {
        eprintln!("skipping: no system font found");
        return;
    };

    let dir = PathBuf::from("target").join("pipeline_smoke_missing");
    std::fs::create_dir_all(&dir).unwrap();

    let config = RunConfig {
        input: dir.join("does_not_exist.csv"),
        out_dir: dir,
        font,
        style: small_style(),
    };
    let err = trackplot::run(&config).unwrap_err();
    assert!(matches!(err, TrackplotError::Dataset(_)));
}

#[test]
fn constant_speed_dataset_is_rejected() {
    let Some(font) = find_system_font() else {
        eprintln!("skipping: no system font found");
        return;
    };

    let dir = PathBuf::from("target").join("pipeline_smoke_constant");
    std::fs::create_dir_all(&dir).unwrap();

    let input = dir.join("constant.csv");
    let csv = format!(
        "{HEADER}ego,0.0,0.0,0.0,0.0,1.0,0.0,0.0\nego,0.1,1.0,0.0,0.0,1.0,0.0,0.0\n"
    );
    std::fs::write(&input, csv).unwrap();

    let config = RunConfig {
        input,
        out_dir: dir,
        font,
        style: small_style(),
    };
    let err = trackplot::run(&config).unwrap_err();
    assert!(matches!(err, TrackplotError::Validation(_)));
}
