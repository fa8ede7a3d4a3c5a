#![cfg(not(target_arch = "wasm32"))]

use std::backtrace::Backtrace;
use std::fs::File;
use std::io::Write;
use std::panic;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::{error, info, warn, LevelFilter};

use svg_extrude::memory::{MemoryMonitor, SystemMemoryProbe};
use svg_extrude::renderer::Renderer;
use svg_extrude::texture_cache::FileSource;
use svg_extrude::{LoadObserver, ModelParams, SharedResources, SvgModelPipeline};

const USAGE: &str = "usage: svg_extrude <file.svg> [--params params.json] [--textures dir] [--gpu]";

struct Args {
    svg: PathBuf,
    params: Option<PathBuf>,
    textures: Option<PathBuf>,
    gpu: bool,
}

fn parse_args() -> Result<Args> {
    let mut svg = None;
    let mut params = None;
    let mut textures = None;
    let mut gpu = false;

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--params" => params = Some(PathBuf::from(it.next().context("--params needs a path")?)),
            "--textures" => textures = Some(PathBuf::from(it.next().context("--textures needs a path")?)),
            "--gpu" => gpu = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other if svg.is_none() && !other.starts_with("--") => svg = Some(PathBuf::from(other)),
            other => bail!("unexpected argument '{other}'\n{USAGE}"),
        }
    }

    Ok(Args {
        svg: svg.context(USAGE)?,
        params,
        textures,
        gpu,
    })
}

struct LogObserver;

impl LoadObserver for LogObserver {
    fn on_load_start(&self) {
        info!("Loading SVG...");
    }

    fn on_load_complete(&self) {
        info!("SVG loaded");
    }

    fn on_error(&self, message: &str) {
        error!("SVG load failed: {message}");
    }
}

fn main() {
    setup_diagnostics();

    if let Err(e) = run() {
        error!("{e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = parse_args()?;

    let params = match &args.params {
        Some(path) => ModelParams::from_path(path)?,
        None => ModelParams::default(),
    };
    let markup = std::fs::read_to_string(&args.svg)
        .with_context(|| format!("failed to read {}", args.svg.display()))?;

    let shared = SharedResources::default();
    let mut pipeline = SvgModelPipeline::new(shared.clone(), params);
    pipeline.load_svg(&markup, &LogObserver)?;

    if let (Some(dir), Some(request)) = (&args.textures, pipeline.texture_request()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?;
        let source = FileSource::new(dir);
        let loaded = runtime.block_on(request.load(&shared.textures, &source));
        if !loaded.failed.is_empty() {
            warn!("{} texture(s) missing under {}", loaded.failed.len(), dir.display());
        }
        pipeline.apply_textures(loaded);
    }

    let mut monitor = MemoryMonitor::new(Box::new(SystemMemoryProbe::new()), shared.resources.config());
    if let Some(sample) = monitor.poll(Duration::ZERO) {
        warn!("Host memory at {:.0}%, releasing caches", sample.ratio() * 100.0);
        shared.resources.handle_low_memory();
    }
    let model = match pipeline.ensure_model() {
        Some(model) => model,
        None => bail!("no model was built"),
    };

    let bounds = model.bounds();
    let triangles: usize = model.meshes().iter().map(|m| m.geometry.data().triangle_count()).sum();
    let holes = model.meshes().iter().filter(|m| m.is_hole).count();
    info!(
        "Model: {} mesh(es) ({} hole), {} triangles, {} material(s), scale {:.4}",
        model.mesh_count(),
        holes,
        triangles,
        model.materials().len(),
        model.scale()
    );
    info!("Bounds: min {:?} max {:?}", bounds.min, bounds.max);

    if args.gpu {
        let renderer = Arc::new(pollster::block_on(Renderer::headless())?);
        shared.resources.attach_context(&renderer);
        let stats = renderer.prepare(&model)?;
        info!(
            "Uploaded {} geometry buffer(s), {} material(s), {} indices",
            stats.geometries, stats.materials, stats.indices
        );
    }

    let cache = pipeline.cache_stats();
    info!(
        "Texture cache: {} entr(ies), {} / {} bytes",
        cache.entry_count, cache.total_bytes, cache.max_bytes
    );

    drop(model);
    pipeline.teardown();
    let released = shared.resources.on_unload();
    info!("Released {released} tracked resource(s)");
    Ok(())
}

/// Logger plus a panic hook that writes a crash report.
fn setup_diagnostics() {
    env_logger::Builder::new()
        .filter_level(if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .format_timestamp_millis()
        .format_target(false)
        .parse_default_env()
        .init();

    panic::set_hook(Box::new(|panic_info| {
        let backtrace = Backtrace::force_capture();

        let msg = match panic_info.payload().downcast_ref::<&'static str>() {
            Some(s) => *s,
            None => match panic_info.payload().downcast_ref::<String>() {
                Some(s) => &s[..],
                None => "Box<dyn Any>",
            },
        };

        let location = panic_info.location().map_or("Unknown location".to_string(), |loc| {
            format!("{}:{}", loc.file(), loc.line())
        });

        let crash_msg = format!(
            "=== CRASH ===\nReason: {}\nLocation: {}\n\nStack Trace:\n{}",
            msg, location, backtrace
        );

        eprintln!("\x1b[31;1m{}\x1b[0m", crash_msg);

        if let Ok(mut file) = File::create("svg_extrude_crash.log") {
            let _ = file.write_all(crash_msg.as_bytes());
            eprintln!("Crash report saved to svg_extrude_crash.log");
        }
    }));
}
