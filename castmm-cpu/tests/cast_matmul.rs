use castmm_core::{
    compare::{assert_close, Tolerance},
    config::DebugMask,
    reference,
    rng::Rng,
    validator::{cases, validate, CastMatmulCase},
    Backend, CastmmError, DType, KernelConfig, ProblemShape, Tensor, Verdict, SEED,
};

fn case(m: usize, k: usize, n: usize, a_dtype: DType, b_dtype: DType, out_dtype: DType) -> CastMatmulCase {
    CastMatmulCase { shape: ProblemShape { m, k, n }, a_dtype, b_dtype, out_dtype }
}

#[test]
fn small_half_output() -> Result<(), CastmmError> {
    let dev = castmm_cpu::device()?;
    let case = case(128, 128, 128, DType::F32, DType::F64, DType::F16);
    let verdict = validate(&case, &dev, SEED, DebugMask(0))?;
    assert_eq!(verdict, Verdict::Pass);
    Ok(())
}

#[test]
fn large_single_output() -> Result<(), CastmmError> {
    let dev = castmm_cpu::device()?;
    let case = case(1280, 768, 1024, DType::F64, DType::F32, DType::F32);
    validate(&case, &dev, SEED, DebugMask(0))?.enforce();
    Ok(())
}

#[test]
fn full_grid() -> Result<(), CastmmError> {
    let dev = castmm_cpu::device()?;
    let mut xfail = 0;
    for case in cases() {
        match validate(&case, &dev, SEED, DebugMask(0))? {
            Verdict::Pass => {}
            Verdict::ExpectedFailure(_) => xfail += 1,
            Verdict::Fail(mismatch) => panic!("{case}\n{mismatch}"),
        }
    }
    assert_eq!(xfail, 8);
    Ok(())
}

#[test]
fn boundary_tiles() -> Result<(), CastmmError> {
    let dev = castmm_cpu::device()?;
    for (m, k, n) in [(1, 1, 1), (17, 33, 45), (31, 100, 16), (16, 32, 16), (129, 65, 3)] {
        for out_dtype in DType::ALL {
            validate(&case(m, k, n, DType::F16, DType::F64, out_dtype), &dev, 7, DebugMask(0))?.enforce();
        }
    }
    Ok(())
}

#[test]
fn boundary_tiles_store_every_element() -> Result<(), CastmmError> {
    // Integer valued inputs make every kernel output exact
    let (m, k, n) = (19, 37, 23);
    let a: Vec<f32> = (0..m * k).map(|i| (i % 7) as f32 - 3.).collect();
    let b: Vec<f64> = (0..k * n).map(|i| (i % 5) as f64 - 2.).collect();
    let a = Tensor::from_vec([m, k], a)?;
    let b = Tensor::from_vec([k, n], b)?;
    let mut c = Tensor::zeros([m, n], DType::F32);
    castmm_cpu::device()?.cast_matmul(&a, &b, &mut c, &KernelConfig::default())?;
    assert_eq!(c.to_vec::<f32>(), reference::cast_matmul(&a, &b, DType::F32)?.to_vec::<f32>());
    Ok(())
}

#[test]
fn transposed_operands() -> Result<(), CastmmError> {
    let dev = castmm_cpu::device()?;
    let mut rng = Rng::seed_from_u64(SEED);
    let a = Tensor::randn([40, 70], DType::F32, &mut rng);
    let b = Tensor::randn([50, 40], DType::F64, &mut rng).t();
    let mut c = Tensor::zeros([70, 50], DType::F16);
    dev.cast_matmul(&a.t(), &b, &mut c, &KernelConfig::default())?;
    let expected = reference::cast_matmul(&a.t(), &b, DType::F16)?;
    assert_eq!(assert_close(&expected, &c, Tolerance::TIGHT)?, Ok(()));
    Ok(())
}

#[test]
fn custom_blocks() -> Result<(), CastmmError> {
    let dev = castmm_cpu::device()?;
    let mut rng = Rng::seed_from_u64(1);
    let a = Tensor::randn([45, 77], DType::F64, &mut rng);
    let b = Tensor::randn([77, 29], DType::F32, &mut rng);
    let expected = reference::cast_matmul(&a, &b, DType::F64)?;
    for config in [
        KernelConfig { block_m: 8, block_n: 4, block_k: 16, group_m: 3, allow_tf32: false },
        KernelConfig { block_m: 64, block_n: 64, block_k: 128, group_m: 1, allow_tf32: true },
    ] {
        let mut c = Tensor::zeros([45, 29], DType::F64);
        dev.cast_matmul(&a, &b, &mut c, &config)?;
        assert_eq!(assert_close(&expected, &c, Tolerance { atol: 1e-9, rtol: 1e-9 })?, Ok(()));
    }
    Ok(())
}

#[test]
fn same_dtype_is_skipped() -> Result<(), CastmmError> {
    let dev = castmm_cpu::device()?;
    let verdict = validate(&case(128, 128, 128, DType::F64, DType::F64, DType::F16), &dev, SEED, DebugMask(0))?;
    assert!(matches!(verdict, Verdict::ExpectedFailure(_)));
    Ok(())
}

#[test]
fn invalid_operands() -> Result<(), CastmmError> {
    let dev = castmm_cpu::device()?;
    let a = Tensor::zeros([4, 5], DType::F32);
    let b = Tensor::zeros([6, 4], DType::F64);
    let mut c = Tensor::zeros([4, 4], DType::F16);
    let err = dev.cast_matmul(&a, &b, &mut c, &KernelConfig::default());
    assert!(matches!(err, Err(CastmmError::ShapeError(_))));
    Ok(())
}
