use castmm_core::{
    backend::Device,
    config::{load_config, DebugMask},
    validator::{cases, validate},
    Backend, CastMatmulCase, CastmmError, DType, ProblemShape, Verdict, SEED,
};
use castmm_cpu::CPUConfig;
use castmm_opencl::OpenCLConfig;
use clap::Parser;
use nanoserde::DeJson;
use std::io::Write;
use std::process::ExitCode;

/// Contents of `castmm/backend_config.json`
#[derive(Debug, Default, DeJson)]
struct BackendConfig {
    cpu: Option<CPUConfig>,
    opencl: Option<OpenCLConfig>,
    seed: Option<u64>,
}

/// Validate the fused cast + tiled matmul kernel against the reference matmul
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Execution target, cpu or opencl
    #[arg(long, default_value = "cpu")]
    device: Device,

    /// Seed of input tensors, overrides backend_config.json
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    m: Option<usize>,

    #[arg(long)]
    k: Option<usize>,

    #[arg(long)]
    n: Option<usize>,

    /// DType of A, e.g. float32
    #[arg(long)]
    a_dtype: Option<DType>,

    /// DType of B
    #[arg(long)]
    b_dtype: Option<DType>,

    /// DType of C, both inputs are cast to it
    #[arg(long)]
    out_dtype: Option<DType>,
}

impl Args {
    /// Single case from the command line, None if no case option was given
    fn case(&self) -> Result<Option<CastMatmulCase>, CastmmError> {
        match (self.m, self.k, self.n, self.a_dtype, self.b_dtype, self.out_dtype) {
            (None, None, None, None, None, None) => Ok(None),
            (Some(m), Some(k), Some(n), Some(a_dtype), Some(b_dtype), Some(out_dtype)) => {
                Ok(Some(CastMatmulCase { shape: ProblemShape::new(m, k, n)?, a_dtype, b_dtype, out_dtype }))
            }
            _ => Err(CastmmError::parse_error(
                "--m, --k, --n, --a-dtype, --b-dtype and --out-dtype must be given together".into(),
            )),
        }
    }
}

fn run_case(case: &CastMatmulCase, backend: &impl Backend, seed: u64, debug: DebugMask) -> bool {
    print!("Running cast_matmul {case} ... ");
    let _ = std::io::stdout().flush();
    let begin = std::time::Instant::now();
    let res = validate(case, backend, seed, debug);
    let elapsed = begin.elapsed().as_nanos();
    match res {
        Ok(Verdict::Pass) => {
            #[allow(clippy::cast_precision_loss)]
            let ms = elapsed as f64 / 1_000_000.;
            println!("OK, time taken: {ms:.3} ms");
            true
        }
        Ok(verdict @ Verdict::ExpectedFailure(_)) => {
            println!("{verdict}");
            true
        }
        Ok(verdict @ Verdict::Fail(_)) => {
            println!("{verdict}");
            false
        }
        Err(e) => {
            println!("ERROR {e}");
            false
        }
    }
}

fn run(args: &Args, debug: DebugMask) -> Result<bool, CastmmError> {
    let config: BackendConfig = load_config("backend_config.json", debug);
    let seed = args.seed.or(config.seed).unwrap_or(SEED);
    let cases = match args.case()? {
        Some(case) => vec![case],
        None => cases(),
    };
    let backend: Box<dyn Backend> = match args.device {
        Device::CPU => Box::new(castmm_cpu::device_with_config(&config.cpu.unwrap_or_default())?),
        Device::OpenCL => Box::new(castmm_opencl::device(&config.opencl.unwrap_or_default(), debug)?),
    };
    if debug.dev() {
        println!("Using backend {}, seed {seed}", backend.name());
    }
    println!("\nTesting cast_matmul on {}", args.device);
    let mut passed = true;
    for case in &cases {
        passed &= run_case(case, &backend, seed, debug);
    }
    Ok(passed)
}

fn main() -> ExitCode {
    let args = Args::parse();
    let debug = DebugMask::from_env();
    match run(&args, debug) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Args, BackendConfig};
    use castmm_core::{backend::Device, DType};
    use clap::Parser;
    use nanoserde::DeJson;

    #[test]
    fn single_case() {
        let args = Args::parse_from([
            "castmm-test", "--device", "cpu", "--m", "17", "--k", "33", "--n", "45", "--a-dtype",
            "float32", "--b-dtype", "f64", "--out-dtype", "float16",
        ]);
        assert_eq!(args.device, Device::CPU);
        let case = args.case().unwrap().unwrap();
        assert_eq!((case.shape.m, case.shape.k, case.shape.n), (17, 33, 45));
        assert_eq!((case.a_dtype, case.b_dtype, case.out_dtype), (DType::F32, DType::F64, DType::F16));
    }

    #[test]
    fn partial_case_is_rejected() {
        let args = Args::parse_from(["castmm-test", "--m", "17"]);
        assert!(args.case().is_err());
        let args = Args::parse_from(["castmm-test", "--device", "xpu"]);
        assert_eq!(args.device, Device::OpenCL);
        assert!(args.case().unwrap().is_none());
        assert!(Args::try_parse_from(["castmm-test", "--device", "tpu"]).is_err());
    }

    #[test]
    fn backend_config() {
        let config = BackendConfig::deserialize_json(
            r#"{ "cpu": { "num_threads": 4 }, "opencl": { "platform_ids": [0] }, "seed": 1 }"#,
        )
        .unwrap();
        assert_eq!(config.cpu.and_then(|c| c.num_threads), Some(4));
        assert_eq!(config.opencl.and_then(|c| c.platform_ids), Some(vec![0]));
        assert_eq!(config.seed, Some(1));
    }
}
