//! Render the Cornell box to a PPM file.
//!
//! Usage: `cargo run --release --example cornell_box -- [settings.json] [out.ppm]`
//!
//! The optional JSON file may override `camera` (a `CameraConfig`) and
//! `render` (a `RenderConfig`); missing fields keep their defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use umbra_renderer::{
    quad_box, BvhNode, Camera, CameraConfig, Color, ConstantMedium, Dielectric, DiffuseLight,
    HittableList, ImageBuffer, Lambertian, Material, NoMaterial, Quad, RenderConfig, RotateY,
    Sphere, SplitStrategy, Translate, Vec3,
};

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Settings {
    camera: CameraConfig,
    render: RenderConfig,
    /// Replace the tall box with a block of smoke.
    smoke: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                image_width: 400,
                aspect_ratio: 1.0,
                samples_per_pixel: 64,
                max_depth: 50,
                vfov: 40.0,
                look_from: Vec3::new(278.0, 278.0, -800.0),
                look_at: Vec3::new(278.0, 278.0, 0.0),
                vup: Vec3::Y,
                defocus_angle: 0.0,
                focus_dist: 10.0,
                background: Color::ZERO,
            },
            render: RenderConfig::default(),
            smoke: false,
        }
    }
}

fn load_settings(path: Option<&str>) -> Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    let file = File::open(path).with_context(|| format!("opening settings {path}"))?;
    serde_json::from_reader(file).with_context(|| format!("parsing settings {path}"))
}

/// Scene geometry plus the list of objects worth sampling directly.
fn build_scene(smoke: bool) -> (BvhNode, HittableList) {
    let red = Lambertian::new(Color::new(0.65, 0.05, 0.05));
    let white: Arc<dyn Material> = Arc::new(Lambertian::new(Color::splat(0.73)));
    let green = Lambertian::new(Color::new(0.12, 0.45, 0.15));
    let light = DiffuseLight::new(Color::splat(15.0));

    let mut world = HittableList::new();
    world.add(Quad::new(
        Vec3::new(555.0, 0.0, 0.0),
        Vec3::new(0.0, 555.0, 0.0),
        Vec3::new(0.0, 0.0, 555.0),
        green,
    ));
    world.add(Quad::new(Vec3::ZERO, Vec3::new(0.0, 555.0, 0.0), Vec3::new(0.0, 0.0, 555.0), red));
    // Facing down so the one-sided light shines into the room.
    world.add(Quad::new(
        Vec3::new(343.0, 554.0, 332.0),
        Vec3::new(-130.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -105.0),
        light,
    ));
    world.add(Quad::new(
        Vec3::ZERO,
        Vec3::new(555.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 555.0),
        white.clone(),
    ));
    world.add(Quad::new(
        Vec3::splat(555.0),
        Vec3::new(-555.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -555.0),
        white.clone(),
    ));
    world.add(Quad::new(
        Vec3::new(0.0, 0.0, 555.0),
        Vec3::new(555.0, 0.0, 0.0),
        Vec3::new(0.0, 555.0, 0.0),
        white.clone(),
    ));

    let tall = quad_box(Vec3::ZERO, Vec3::new(165.0, 330.0, 165.0), white);
    let tall = Translate::new(RotateY::new(tall, 15.0), Vec3::new(265.0, 0.0, 295.0));
    if smoke {
        world.add(ConstantMedium::new(tall, 0.01, Color::ZERO));
    } else {
        world.add(tall);
    }

    world.add(Sphere::new(Vec3::new(190.0, 90.0, 190.0), 90.0, Dielectric::new(1.5)));

    let mut lights = HittableList::new();
    lights.add(Quad::new(
        Vec3::new(343.0, 554.0, 332.0),
        Vec3::new(-130.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -105.0),
        NoMaterial,
    ));
    lights.add(Sphere::new(Vec3::new(190.0, 90.0, 190.0), 90.0, NoMaterial));

    let world = BvhNode::with_strategy(world.into_objects(), SplitStrategy::SurfaceArea);
    (world, lights)
}

fn write_ppm(image: &ImageBuffer, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "P3\n{} {}\n255", image.width, image.height)?;
    for rgba in image.to_rgba8().chunks_exact(4) {
        writeln!(out, "{} {} {}", rgba[0], rgba[1], rgba[2])?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let settings = load_settings(args.first().map(String::as_str))?;
    let output = args.get(1).map_or("cornell_box.ppm", String::as_str);

    let (world, lights) = build_scene(settings.smoke);

    let mut camera = Camera::from_config(settings.camera);
    camera.initialize()?;
    let image = camera.render(&world, Some(&lights), &settings.render)?;

    write_ppm(&image, Path::new(output))?;
    log::info!("Wrote {output}");
    Ok(())
}
