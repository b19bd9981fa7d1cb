//! batchrot-bench - replay and time a batched rotation call
//!
//! Accepts the command line printed by the bench logging layer:
//!
//! ```text
//! batchrot-bench -f rot_batched --a_type f32_c --b_type f32_r --c_type f32_r \
//!     -n 1000 --incx 1 --incy -2 --batch_count 64
//! ```

use anyhow::{anyhow, bail, Result};
use batchrot_blas::{rot_batched, CheckNumericsMode, Handle, HandleConfig, LayerMode, Status};
use batchrot_gpu::DeviceKind;
use batchrot_numeric::{Complex32, Complex64, Element, Precision, RotVariant, SineScalar};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Replay and time a batched rotation call
#[derive(Parser, Debug)]
#[command(name = "batchrot-bench")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Routine to run
    #[arg(short = 'f', long = "function", default_value = "rot_batched")]
    function: String,

    /// Element type of x and y (f32_r, f64_r, f32_c, f64_c)
    #[arg(long = "a_type", default_value = "f32_r")]
    a_type: Precision,

    /// Cosine type; must be the real type of `a_type`
    #[arg(long = "b_type")]
    b_type: Option<Precision>,

    /// Sine type; defaults to `a_type`
    #[arg(long = "c_type")]
    c_type: Option<Precision>,

    /// Vector length
    #[arg(short = 'n', default_value_t = 1024, allow_negative_numbers = true)]
    n: i32,

    /// Increment of x
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    incx: i32,

    /// Increment of y
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    incy: i32,

    /// Number of vector pairs
    #[arg(long = "batch_count", default_value_t = 1, allow_negative_numbers = true)]
    batch_count: i32,

    /// Timed iterations after one warm-up call
    #[arg(long, default_value_t = 10)]
    iters: u32,

    /// Numeric checking bits (1 = info, 2 = warn, 4 = fail)
    #[arg(long = "check_numerics")]
    check_numerics: Option<u32>,

    /// Logging layer bits (1 = trace, 2 = bench, 4 = profile)
    #[arg(long)]
    layer: Option<u32>,

    /// Seed for the input data
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Run on the serial device
    #[arg(long)]
    serial: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Values the bench can draw at random.
trait RandomValue: Sized {
    fn random(rng: &mut StdRng) -> Self;
}

impl RandomValue for f32 {
    fn random(rng: &mut StdRng) -> Self {
        rng.gen_range(-1.0..1.0)
    }
}

impl RandomValue for f64 {
    fn random(rng: &mut StdRng) -> Self {
        rng.gen_range(-1.0..1.0)
    }
}

impl RandomValue for Complex32 {
    fn random(rng: &mut StdRng) -> Self {
        Complex32::new(f32::random(rng), f32::random(rng))
    }
}

impl RandomValue for Complex64 {
    fn random(rng: &mut StdRng) -> Self {
        Complex64::new(f64::random(rng), f64::random(rng))
    }
}

/// Timing of one bench run.
struct Report {
    status: Status,
    elapsed: Duration,
    iters: u32,
    bytes_per_call: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if cli.function != "rot_batched" {
        bail!("unsupported function '{}', only rot_batched is available", cli.function);
    }

    let c_type = cli.c_type.unwrap_or(cli.a_type);
    let b_type = cli.b_type.unwrap_or_else(|| cli.a_type.real());
    if b_type != cli.a_type.real() {
        bail!("--b_type {b_type} does not match --a_type {}", cli.a_type);
    }
    let variant = RotVariant::from_precisions(cli.a_type, c_type)
        .ok_or_else(|| anyhow!("no routine for --a_type {} --c_type {c_type}", cli.a_type))?;

    let handle = build_handle(&cli)?;
    tracing::debug!(?handle, %variant, "starting bench");

    let report = match variant {
        RotVariant::Srot => run::<f32, f32>(&cli, &handle),
        RotVariant::Drot => run::<f64, f64>(&cli, &handle),
        RotVariant::Crot => run::<Complex32, Complex32>(&cli, &handle),
        RotVariant::Csrot => run::<Complex32, f32>(&cli, &handle),
        RotVariant::Zrot => run::<Complex64, Complex64>(&cli, &handle),
        RotVariant::Zdrot => run::<Complex64, f64>(&cli, &handle),
    };
    print_report(variant, &cli, &report);

    if !report.status.is_success() {
        bail!("{variant} returned {}", report.status);
    }
    Ok(())
}

fn build_handle(cli: &Cli) -> Result<Handle> {
    let mut config = HandleConfig::from_env()?;
    if let Some(bits) = cli.check_numerics {
        config.check_numerics = CheckNumericsMode::from_bits(bits)
            .ok_or_else(|| anyhow!("unknown --check_numerics bits {bits:#x}"))?;
    }
    if let Some(bits) = cli.layer {
        config.layer_mode =
            LayerMode::from_bits(bits).ok_or_else(|| anyhow!("unknown --layer bits {bits:#x}"))?;
    }
    if cli.serial {
        config.device = DeviceKind::Serial;
    }
    Ok(Handle::with_config(&config)?)
}

fn buffer_len(n: i32, inc: i32) -> usize {
    match usize::try_from(n) {
        Ok(0) | Err(_) => 0,
        Ok(n) => 1 + (n - 1) * inc.unsigned_abs() as usize,
    }
}

fn run<T, V>(cli: &Cli, handle: &Handle) -> Report
where
    T: Element + RandomValue,
    T::Real: RandomValue,
    V: SineScalar<T> + RandomValue,
{
    let mut rng = StdRng::seed_from_u64(cli.seed);
    let batches = usize::try_from(cli.batch_count).unwrap_or(0);

    let mut draw = |len: usize| -> Vec<Vec<T>> {
        (0..batches)
            .map(|_| (0..len).map(|_| T::random(&mut rng)).collect())
            .collect()
    };
    let mut xs = draw(buffer_len(cli.n, cli.incx));
    let mut ys = draw(buffer_len(cli.n, cli.incy));
    let c = <T::Real as RandomValue>::random(&mut rng);
    let s = V::random(&mut rng);

    let xp: Vec<*mut T> = xs.iter_mut().map(|b| b.as_mut_ptr()).collect();
    let yp: Vec<*mut T> = ys.iter_mut().map(|b| b.as_mut_ptr()).collect();
    let call = || {
        // SAFETY: `xp` and `yp` hold `batch_count` pointers to distinct
        // buffers sized for `n` and the increments; `c` and `s` are locals.
        unsafe {
            rot_batched::<T, V>(
                handle,
                cli.n,
                xp.as_ptr(),
                cli.incx,
                yp.as_ptr(),
                cli.incy,
                &c,
                &s,
                cli.batch_count,
            )
        }
    };

    let status = call();
    if !status.is_success() {
        return Report {
            status,
            elapsed: Duration::ZERO,
            iters: 0,
            bytes_per_call: 0,
        };
    }

    let start = Instant::now();
    let mut status = Status::Success;
    for _ in 0..cli.iters {
        status = call();
        if !status.is_success() {
            break;
        }
    }
    let elapsed = start.elapsed();

    let elements = usize::try_from(cli.n).unwrap_or(0) * batches;
    Report {
        status,
        elapsed,
        iters: cli.iters,
        bytes_per_call: 4 * elements * std::mem::size_of::<T>(),
    }
}

#[allow(clippy::cast_precision_loss)]
fn print_report(variant: RotVariant, cli: &Cli, report: &Report) {
    println!(
        "{variant}: n={} incx={} incy={} batch_count={}",
        cli.n, cli.incx, cli.incy, cli.batch_count
    );
    println!("status: {}", report.status);
    if report.iters == 0 {
        return;
    }

    let per_call = report.elapsed.as_secs_f64() / f64::from(report.iters);
    println!("time per call: {:.3} us", per_call * 1e6);
    if per_call > 0.0 {
        println!(
            "effective bandwidth: {:.2} GB/s",
            report.bytes_per_call as f64 / per_call / 1e9
        );
    }
}
