//! End-to-end combine tests: grid packing, pixels and UVs.
//!
//! ```bash
//! cargo test -p udimpack-tests --test e2e_combine
//! ```

use image::{ImageBuffer, Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use udimpack_cli::NothingToProcess;
use udimpack_spec::error::codes;
use udimpack_spec::{
    BitDepth, Colorspace, ResolutionPolicy, RunConfig, RunReport, Scene, TileIndex,
};
use udimpack_tests::fixtures::{
    object_on_tile, principled_material, tile_color, tiled_image, uv_center, write_udim_set,
};
use udimpack_tests::harness::{assert_color_near, load_rgba, sample_uv, TestHarness};

fn tile(udim: u32) -> TileIndex {
    TileIndex::from_udim(udim).unwrap()
}

/// One object per UDIM, all sharing one base color texture set.
fn tiled_scene(harness: &TestHarness, udims: &[u32]) -> Scene {
    let pattern = write_udim_set(&harness.textures_dir(), "albedo", udims);
    Scene {
        images: vec![tiled_image("albedo", &pattern, Colorspace::Color)],
        materials: vec![principled_material("Mat", &[("Base Color", "albedo")])],
        objects: udims
            .iter()
            .map(|&udim| object_on_tile(&format!("Obj{}", udim), udim, &["Mat"]))
            .collect(),
    }
}

fn config(target_tiles: u32, resolution: ResolutionPolicy) -> RunConfig {
    RunConfig {
        target_tiles,
        resolution,
        ..RunConfig::default()
    }
}

// ============================================================================
// Grid packing
// ============================================================================

#[test]
fn test_thirteen_tiles_into_two() {
    let harness = TestHarness::new();
    let udims: Vec<u32> = (1001..=1013).collect();
    let mut scene = tiled_scene(&harness, &udims);

    let outcome = harness
        .run(&mut scene, config(2, ResolutionPolicy::Fixed(48)))
        .unwrap();
    let report = &outcome.report;
    assert!(report.ok, "errors: {:?}", report.errors);

    let plan = report.plan.as_ref().unwrap();
    assert_eq!(plan.destinations.len(), 2);
    assert_eq!(plan.destinations[0].tile.udim(), 1001);
    assert_eq!(plan.destinations[0].cells.len(), 7);
    assert_eq!(
        (plan.destinations[0].shape.cols, plan.destinations[0].shape.rows),
        (3, 3)
    );
    assert_eq!(plan.destinations[1].tile.udim(), 1002);
    assert_eq!(plan.destinations[1].cells.len(), 6);
    assert_eq!(
        (plan.destinations[1].shape.cols, plan.destinations[1].shape.rows),
        (3, 2)
    );

    assert_eq!(report.outputs.len(), 2);
    for (output, udim) in report.outputs.iter().zip([1001, 1002]) {
        assert_eq!(output.tile.udim(), udim);
        assert_eq!((output.width, output.height), (48, 48));
        assert_eq!(
            output.path,
            outcome
                .run_dir
                .join(format!("TextureSet_1700000000000_Base_Color.{}.png", udim))
        );
        assert!(output.path.exists());
    }
    assert!(outcome.run_dir.ends_with("TextureSet_1700000000000"));
    assert!(outcome.report_path.exists());
    assert!(outcome.scene_path.exists());
}

#[test]
fn test_remapped_uvs_sample_their_source_tile() {
    let harness = TestHarness::new();
    let udims: Vec<u32> = (1001..=1013).collect();
    let mut scene = tiled_scene(&harness, &udims);

    let outcome = harness
        .run(&mut scene, config(2, ResolutionPolicy::Fixed(48)))
        .unwrap();
    let plan = outcome.report.plan.as_ref().unwrap();

    for &udim in &udims {
        let placement = plan.placement_of(tile(udim)).unwrap();
        let object = scene.object(&format!("Obj{}", udim)).unwrap();
        let center = uv_center(object);
        let image = load_rgba(&outcome.run_dir.join(format!(
            "TextureSet_1700000000000_Base_Color.{}.png",
            placement.destination.udim()
        )));

        let rect = placement.uv_rect();
        let [u0, v0] = placement.destination.origin();
        assert!(center[0] > u0 + rect.u_min && center[0] < u0 + rect.u_max);
        assert!(center[1] > v0 + rect.v_min && center[1] < v0 + rect.v_max);
        assert_color_near(
            sample_uv(&image, placement.destination, center),
            tile_color(udim),
            2,
        );
    }
}

#[test]
fn test_single_tile_is_copied_verbatim() {
    let harness = TestHarness::new();
    let dir = harness.textures_dir();
    let source = RgbaImage::from_fn(8, 8, |x, y| Rgba([(x * 30) as u8, (y * 30) as u8, 7, 255]));
    source.save(dir.join("albedo.1005.png")).unwrap();
    let pattern = dir.join("albedo.<UDIM>.png").to_string_lossy().into_owned();

    let mut scene = Scene {
        images: vec![tiled_image("albedo", &pattern, Colorspace::Color)],
        materials: vec![principled_material("Mat", &[("Base Color", "albedo")])],
        objects: vec![object_on_tile("Crate", 1005, &["Mat"])],
    };
    let outcome = harness.run(&mut scene, RunConfig::default()).unwrap();

    assert!(outcome.report.ok);
    assert!(outcome.report.plan.as_ref().unwrap().is_passthrough());
    assert_eq!(outcome.report.outputs.len(), 1);
    let written = load_rgba(&outcome.report.outputs[0].path);
    assert_eq!(written.dimensions(), (8, 8));
    assert_eq!(written.as_raw(), source.as_raw());

    let center = uv_center(scene.object("Crate").unwrap());
    assert!((center[0] - 0.5).abs() < 1e-9);
    assert!((center[1] - 0.5).abs() < 1e-9);
}

// ============================================================================
// Empty cells, bit depth and determinism
// ============================================================================

#[test]
fn test_empty_cell_fill() {
    for (fill, expected) in [(true, [128, 128, 128, 255]), (false, [0, 0, 0, 0])] {
        let harness = TestHarness::new();
        let mut scene = tiled_scene(&harness, &[1001, 1002, 1003]);
        let run_config = RunConfig {
            fill_unassigned_cells: fill,
            ..config(1, ResolutionPolicy::Fixed(32))
        };

        let outcome = harness.run(&mut scene, run_config).unwrap();
        let image = load_rgba(&outcome.report.outputs[0].path);

        // 2x2 grid; the fourth cell (bottom right) has no source.
        assert_color_near(image.get_pixel(24, 24).0, expected, 1);
        assert_color_near(image.get_pixel(8, 8).0, tile_color(1001), 1);
        assert_color_near(image.get_pixel(24, 8).0, tile_color(1002), 1);
        assert_color_near(image.get_pixel(8, 24).0, tile_color(1003), 1);
    }
}

#[test]
fn test_sixteen_bit_sources_stay_sixteen_bit() {
    let harness = TestHarness::new();
    let dir = harness.textures_dir();
    for udim in [1001u32, 1002] {
        let value = (udim - 1000) as u16 * 20_000;
        ImageBuffer::<Rgba<u16>, Vec<u16>>::from_pixel(8, 8, Rgba([value, 1000, 65535, 65535]))
            .save(dir.join(format!("height.{}.png", udim)))
            .unwrap();
    }
    let pattern = dir.join("height.<UDIM>.png").to_string_lossy().into_owned();
    let mut scene = Scene {
        images: vec![tiled_image("height", &pattern, Colorspace::NonColor)],
        materials: vec![principled_material("Mat", &[("Roughness", "height")])],
        objects: vec![
            object_on_tile("A", 1001, &["Mat"]),
            object_on_tile("B", 1002, &["Mat"]),
        ],
    };

    let outcome = harness
        .run(&mut scene, config(1, ResolutionPolicy::Fixed(16)))
        .unwrap();
    let output = &outcome.report.outputs[0];
    assert_eq!(output.bit_depth, BitDepth::U16);
    assert_eq!(output.colorspace, Colorspace::NonColor);

    let written = image::open(&output.path).unwrap().to_rgba16();
    assert_eq!(written.get_pixel(4, 4).0, [20_000, 1000, 65535, 65535]);
    assert_eq!(written.get_pixel(12, 4).0, [40_000, 1000, 65535, 65535]);
}

#[test]
fn test_runs_are_deterministic() {
    let hashes: Vec<Vec<String>> = (0..2)
        .map(|_| {
            let harness = TestHarness::new();
            let mut scene = tiled_scene(&harness, &[1001, 1002, 1003, 1011, 1012]);
            let outcome = harness
                .run(&mut scene, config(2, ResolutionPolicy::Fixed(32)))
                .unwrap();
            outcome.report.outputs.iter().map(|o| o.hash.clone()).collect()
        })
        .collect();
    assert_eq!(hashes[0].len(), 2);
    assert_eq!(hashes[0], hashes[1]);
}

// ============================================================================
// Reports and refusals
// ============================================================================

#[test]
fn test_report_written_to_run_directory() {
    let harness = TestHarness::new();
    let mut scene = tiled_scene(&harness, &[1001, 1002]);
    let outcome = harness.run(&mut scene, RunConfig::default()).unwrap();

    let json = std::fs::read_to_string(&outcome.report_path).unwrap();
    let report = RunReport::from_json(&json).unwrap();
    assert!(report.ok);
    assert_eq!(report.set_name, "TextureSet");
    assert_eq!(report.timestamp_ms, 1_700_000_000_000);
    assert_eq!(report.objects.len(), 2);
    assert_eq!(report.outputs.len(), 2);

    let written = Scene::from_json(&std::fs::read_to_string(&outcome.scene_path).unwrap()).unwrap();
    assert_eq!(written, scene);
}

#[test]
fn test_nothing_to_process_without_textures() {
    let harness = TestHarness::new();
    let mut scene = Scene {
        materials: vec![principled_material("Plain", &[])],
        objects: vec![object_on_tile("Crate", 1001, &["Plain"])],
        ..Scene::default()
    };

    let err = harness.run(&mut scene, RunConfig::default()).unwrap_err();
    let nothing = err.downcast_ref::<NothingToProcess>().unwrap();
    assert_eq!(nothing.code, codes::RUN_NO_TEXTURES);
    assert!(!harness.out_root().exists());
}

#[test]
fn test_nothing_to_process_without_uvs() {
    let harness = TestHarness::new();
    let mut scene = tiled_scene(&harness, &[1001]);
    scene.objects[0].uvs = None;

    let err = harness.run(&mut scene, RunConfig::default()).unwrap_err();
    let nothing = err.downcast_ref::<NothingToProcess>().unwrap();
    assert_eq!(nothing.code, codes::RUN_NO_OBJECTS);
}
