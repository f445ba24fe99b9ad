use crate::backend::Backend;
use crate::compare::{assert_close, Mismatch, Tolerance};
use crate::config::DebugMask;
use crate::dtype::DType;
use crate::error::CastmmError;
use crate::kernel::KernelConfig;
use crate::reference;
use crate::rng::Rng;
use crate::shape::ProblemShape;
use crate::tensor::Tensor;

/// Reason reported for cases with equal input dtypes
pub const SAME_DTYPE: &str = "skip same dtype";

/// One point of the cast matmul parameter grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastMatmulCase {
    /// Problem shape
    pub shape: ProblemShape,
    /// DType of A
    pub a_dtype: DType,
    /// DType of B
    pub b_dtype: DType,
    /// DType of C, both inputs are cast to it
    pub out_dtype: DType,
}

impl core::fmt::Display for CastMatmulCase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!(
            "{} a={} b={} out={}",
            self.shape,
            self.a_dtype.name(),
            self.b_dtype.name(),
            self.out_dtype.name()
        ))
    }
}

/// Outcome of one validation
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Candidate matches reference within tolerance
    Pass,
    /// Case is known not to be meaningful, nothing was run
    ExpectedFailure(String),
    /// Candidate differs from reference
    Fail(Mismatch),
}

impl Verdict {
    /// Is this a failure?
    pub const fn is_fail(&self) -> bool {
        matches!(self, Verdict::Fail(_))
    }

    /// Panic on [`Verdict::Fail`], accept anything else
    #[track_caller]
    pub fn enforce(&self) {
        if let Verdict::Fail(mismatch) = self {
            panic!("{mismatch}");
        }
    }
}

impl core::fmt::Display for Verdict {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Verdict::Pass => f.write_str("OK"),
            Verdict::ExpectedFailure(reason) => f.write_fmt(format_args!("XFAIL ({reason})")),
            Verdict::Fail(mismatch) => f.write_fmt(format_args!("FAILED\n{mismatch}")),
        }
    }
}

/// Cases of the regression grid, A takes the `x` dtype and B the `w` dtype
pub fn cases() -> Vec<CastMatmulCase> {
    let mut res = Vec::with_capacity(16);
    for (m, k, n) in [(128, 128, 128), (1280, 768, 1024)] {
        let shape = ProblemShape { m, k, n };
        for w in [DType::F32, DType::F64] {
            for x in [DType::F32, DType::F64] {
                for o in [DType::F16, DType::F32] {
                    res.push(CastMatmulCase { shape, a_dtype: x, b_dtype: w, out_dtype: o });
                }
            }
        }
    }
    res
}

/// Run one case on backend and compare it against the reference matmul.
///
/// Errors are returned only if the case could not be run at all,
/// numerical differences are reported as [`Verdict::Fail`].
pub fn validate(
    case: &CastMatmulCase,
    backend: &impl Backend,
    seed: u64,
    debug: DebugMask,
) -> Result<Verdict, CastmmError> {
    if case.a_dtype == case.b_dtype {
        return Ok(Verdict::ExpectedFailure(SAME_DTYPE.into()));
    }
    let shape = case.shape;
    let mut rng = Rng::seed_from_u64(seed);
    let a = Tensor::randn(shape.a(), case.a_dtype, &mut rng);
    let b = Tensor::randn(shape.b(), case.b_dtype, &mut rng);

    let begin = std::time::Instant::now();
    let expected = reference::cast_matmul(&a, &b, case.out_dtype)?;
    if debug.perf() {
        println!("Reference took {:?}", begin.elapsed());
    }

    let begin = std::time::Instant::now();
    let mut actual = Tensor::zeros(shape.c(), case.out_dtype);
    backend.cast_matmul(&a, &b, &mut actual, &KernelConfig::default())?;
    if debug.perf() {
        println!("{} kernel took {:?}", backend.name(), begin.elapsed());
    }

    let tolerance = Tolerance::for_cast_matmul(backend.target(), case.out_dtype, shape.k);
    Ok(match assert_close(&expected, &actual, tolerance)? {
        Ok(()) => Verdict::Pass,
        Err(mismatch) => {
            if debug.dev() {
                println!("Expected {expected}Got {actual}");
            }
            Verdict::Fail(mismatch)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{cases, validate, CastMatmulCase, Verdict, SAME_DTYPE};
    use crate::{
        backend::{Backend, Target},
        config::DebugMask,
        dtype::DType,
        error::CastmmError,
        kernel::KernelConfig,
        reference,
        shape::ProblemShape,
        tensor::Tensor,
    };
    use std::cell::Cell;

    /// Computes the reference and optionally corrupts one element
    struct Mock {
        target: Target,
        corrupt: Option<f64>,
        calls: Cell<usize>,
    }

    impl Mock {
        fn new(corrupt: Option<f64>) -> Mock {
            Mock { target: Target::Cpu, corrupt, calls: Cell::new(0) }
        }
    }

    impl Backend for Mock {
        fn target(&self) -> Target {
            self.target
        }

        fn name(&self) -> String {
            "mock".into()
        }

        fn cast_matmul(
            &self,
            a: &Tensor,
            b: &Tensor,
            c: &mut Tensor,
            _config: &KernelConfig,
        ) -> Result<(), CastmmError> {
            self.calls.set(self.calls.get() + 1);
            let res = reference::cast_matmul(a, b, c.dtype())?;
            let mut data = res.to_vec::<f64>();
            if let Some(delta) = self.corrupt {
                data[1] += delta;
            }
            *c = Tensor::from_vec(res.shape(), data)?.cast(c.dtype());
            Ok(())
        }
    }

    fn case(a_dtype: DType, b_dtype: DType) -> CastMatmulCase {
        CastMatmulCase {
            shape: ProblemShape::new(20, 40, 24).unwrap(),
            a_dtype,
            b_dtype,
            out_dtype: DType::F32,
        }
    }

    #[test]
    fn grid() {
        let cases = cases();
        assert_eq!(cases.len(), 16);
        assert_eq!(cases.iter().filter(|c| c.a_dtype == c.b_dtype).count(), 8);
        assert_eq!(cases[2].a_dtype, DType::F64);
        assert_eq!(cases[2].b_dtype, DType::F32);
        assert_eq!(cases[15].shape, ProblemShape { m: 1280, k: 768, n: 1024 });
    }

    #[test]
    fn same_dtype_is_expected_failure() -> Result<(), CastmmError> {
        let mock = Mock::new(None);
        let verdict = validate(&case(DType::F32, DType::F32), &mock, 0, DebugMask(0))?;
        assert_eq!(verdict, Verdict::ExpectedFailure(SAME_DTYPE.into()));
        assert_eq!(mock.calls.get(), 0);
        verdict.enforce();
        Ok(())
    }

    #[test]
    fn pass_and_fail() -> Result<(), CastmmError> {
        let mock = Mock::new(None);
        let verdict = validate(&case(DType::F32, DType::F64), &mock, 3, DebugMask(0))?;
        assert_eq!(verdict, Verdict::Pass);

        let mock = Mock::new(Some(1.0));
        let verdict = validate(&case(DType::F64, DType::F32), &mock, 3, DebugMask(0))?;
        let Verdict::Fail(mismatch) = &verdict else {
            panic!("expected failure, got {verdict}");
        };
        assert_eq!(mismatch.mismatched, 1);
        assert_eq!(mismatch.total, 20 * 24);
        assert_eq!(mismatch.first.0, [0, 1]);
        assert!(verdict.is_fail());
        Ok(())
    }

    #[test]
    fn accelerator_half_output_is_widened() -> Result<(), CastmmError> {
        let case = CastMatmulCase {
            shape: ProblemShape::new(16, 136, 16)?,
            a_dtype: DType::F32,
            b_dtype: DType::F64,
            out_dtype: DType::F16,
        };
        let accelerator = Mock { target: Target::Accelerator, ..Mock::new(Some(1.0)) };
        assert_eq!(validate(&case, &accelerator, 5, DebugMask(0))?, Verdict::Pass);
        let verdict = validate(&case, &Mock::new(Some(1.0)), 5, DebugMask(0))?;
        let Verdict::Fail(mismatch) = verdict else {
            panic!("expected failure, got {verdict}");
        };
        assert_eq!(mismatch.first.0, [0, 1]);

        // K = 128 is not long enough to widen
        let case = CastMatmulCase { shape: ProblemShape::new(16, 128, 16)?, ..case };
        assert!(validate(&case, &accelerator, 5, DebugMask(0))?.is_fail());
        Ok(())
    }

    #[test]
    #[should_panic(expected = "Tensor-likes are not close")]
    fn enforce_panics_on_fail() {
        let mock = Mock::new(Some(5.0));
        validate(&case(DType::F32, DType::F64), &mock, 1, DebugMask(0)).unwrap().enforce();
    }
}
