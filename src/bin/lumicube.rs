use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use lumicube::{
    default_registry, CancelToken, CaptureDriver, Conductor, Config, Diagnostic, DriverKind,
    Engine, FrameSink, Layout, LogPreviewSink, PostPipeline, PreviewDriver, Program, Resources,
    Uniforms,
};

#[derive(Parser, Debug)]
#[command(name = "lumicube", version)]
struct Cli {
    /// Configuration JSON.
    #[arg(long, default_value = "lumicube.json")]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a sequence program.
    Run(RunArgs),
    /// Show a single scene/preset.
    Scene(SceneArgs),
    /// Run a named hardware test request (SolidRed, PanelChanSweep, ...).
    Test(TestArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Program JSON (seq.v1). Falls back to the built-in demo show.
    #[arg(long)]
    program: Option<PathBuf>,

    /// Stop after this many seconds (runs forever when omitted).
    #[arg(long)]
    duration: Option<f64>,
}

#[derive(Parser, Debug)]
struct SceneArgs {
    /// Registered scene name.
    name: String,

    /// Preset to apply.
    #[arg(long, default_value = "")]
    preset: String,

    /// Stop after this many seconds (runs forever when omitted).
    #[arg(long)]
    duration: Option<f64>,
}

#[derive(Parser, Debug)]
struct TestArgs {
    /// Test request name.
    name: String,

    /// Stop after this many seconds.
    #[arg(long, default_value_t = 10.0)]
    duration: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_path(&cli.config)
        .with_context(|| format!("load config '{}'", cli.config.display()))?;

    match cli.cmd {
        Command::Run(args) => cmd_run(&config, args),
        Command::Scene(args) => cmd_scene(&config, args),
        Command::Test(args) => cmd_test(&config, args),
    }
}

fn cmd_run(config: &Config, args: RunArgs) -> anyhow::Result<()> {
    let mut conductor = build_conductor(config)?;
    let program = match &args.program {
        Some(path) => Program::from_path(path)
            .with_context(|| format!("load program '{}'", path.display()))?,
        None => lumicube::demo_program(),
    };
    conductor.load_program(program)?;
    conductor.start()?;
    run_loop(conductor, args.duration);
    Ok(())
}

fn cmd_scene(config: &Config, args: SceneArgs) -> anyhow::Result<()> {
    let mut conductor = build_conductor(config)?;
    conductor
        .engine
        .set_renderer(&args.name, &args.preset, &conductor.registry)?;
    run_loop(conductor, args.duration);
    Ok(())
}

fn cmd_test(config: &Config, args: TestArgs) -> anyhow::Result<()> {
    let mut conductor = build_conductor(config)?;
    conductor.run_test(&args.name);
    run_loop(conductor, Some(args.duration));
    Ok(())
}

fn run_loop(mut conductor: Conductor, duration: Option<f64>) {
    let cancel = CancelToken::new();
    if let Some(secs) = duration {
        let timer_cancel = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_secs_f64(secs.max(0.0)));
            timer_cancel.cancel();
        });
    }
    conductor.run(&cancel);
}

fn build_conductor(config: &Config) -> anyhow::Result<Conductor> {
    let registry = default_registry();
    let dim = config.dim;
    let (driver, hardware_path) = build_driver(config);

    let mut uniforms = Uniforms::default();
    uniforms.global_brightness = config.brightness;
    uniforms.set_param(lumicube::keys::GLOBAL_BRIGHTNESS, config.brightness);
    uniforms.set_param(lumicube::keys::OUTPUT_GAMMA, 2.2);
    uniforms.set_param(lumicube::keys::LED_CHAN_MA, config.power.led_chan_ma);
    uniforms.set_param(lumicube::keys::BUDGET_MA, config.power.budget_ma);
    uniforms.set_param(lumicube::keys::WHITE_CAP, config.power.white_cap);
    uniforms.set_param(lumicube::keys::LIMITER_KNEE, config.power.limiter_knee);
    if !hardware_path {
        uniforms.set_param(lumicube::keys::PREVIEW_MODE, 1.0);
    }

    let mut layout = Layout::new(dim, config.serpentine);
    layout.pitch_mm = config.pitch_mm;
    layout.panel_gap_mm = config.panel_gap_mm;

    let scene = registry.create("solid")?;
    let mut engine = Engine::new(
        dim,
        layout.position_lut(),
        driver,
        scene,
        uniforms,
        Resources::default(),
    )?;
    engine.set_post(if hardware_path {
        PostPipeline::hardware()
    } else {
        PostPipeline::preview()
    });
    engine.set_renderer("solid", "Red", &registry)?;

    Ok(Conductor::new(engine, registry, config.fps))
}

/// Build the configured output driver. Hardware failures fall back to the
/// preview path so frames keep rendering; the second element reports
/// whether the hardware post path should be used.
fn build_driver(config: &Config) -> (Box<dyn FrameSink>, bool) {
    match config.driver {
        DriverKind::Spi => match open_spi(config) {
            Ok(driver) => (driver, true),
            Err(e) => {
                let dev = config
                    .spi
                    .as_ref()
                    .map(|s| s.dev.clone())
                    .unwrap_or_default();
                Diagnostic::warning("driver.fallback", "spi driver unavailable")
                    .with_detail(e.to_string())
                    .with_evidence("device", dev)
                    .emit();
                (preview_driver(config), false)
            }
        },
        DriverKind::Pwm => {
            Diagnostic::warning("driver.fallback", "pwm driver is not supported in this build")
                .emit();
            (Box::new(CaptureDriver::new()), false)
        }
        DriverKind::Preview => (preview_driver(config), false),
        DriverKind::Sim => (Box::new(CaptureDriver::new()), false),
    }
}

fn preview_driver(config: &Config) -> Box<dyn FrameSink> {
    Box::new(PreviewDriver::new(
        config.dim,
        Box::new(LogPreviewSink),
    ))
}

#[cfg(target_os = "linux")]
fn open_spi(config: &Config) -> anyhow::Result<Box<dyn FrameSink>> {
    let spi = config
        .spi
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("no spi block configured"))?;
    let driver = lumicube::SpiDriver::open(
        &spi.dev,
        config.dim.count(),
        config.color_order(),
        spi.speed_hz,
        spi.reset_us,
    )?;
    Ok(Box::new(driver))
}

#[cfg(not(target_os = "linux"))]
fn open_spi(_config: &Config) -> anyhow::Result<Box<dyn FrameSink>> {
    anyhow::bail!("spi output requires linux spidev support")
}
